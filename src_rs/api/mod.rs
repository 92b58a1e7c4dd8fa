// 목적:
// - 애플리케이션이 직접 쓰는 저장소 파사드 모듈을 선언한다.
//
// 참조:
// - src_rs/api/item_repository.rs

pub mod item_repository;
