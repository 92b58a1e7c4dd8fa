// 목적:
// - 검색 명세 조립 계층 모듈을 선언한다.
//
// 참조:
// - src_rs/query/builder.rs
// - src_rs/query/request.rs

pub mod builder;
pub mod request;
