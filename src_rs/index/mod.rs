// 목적:
// - 검색 엔진 인덱스 계층 모듈을 선언한다.
//
// 설명:
// - 전송 어댑터, bulk 인코딩, 문서 저장소 클라이언트를 분리해 유지보수성을 확보한다.
//
// 디자인 패턴:
// - 저장소 패턴(Repository Pattern).
//
// 참조:
// - src_rs/index/transport.rs
// - src_rs/index/bulk.rs
// - src_rs/index/store_client.rs

pub mod bulk;
pub mod store_client;
pub mod transport;
