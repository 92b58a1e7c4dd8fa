// 목적:
// - 문서 스키마 계층 모듈을 선언한다.
//
// 설명:
// - 범용 디스크립터와 문서 계약, 그리고 Item 문서 정의를 분리한다.
//
// 참조:
// - src_rs/schema/descriptor.rs
// - src_rs/schema/document.rs
// - src_rs/schema/item.rs

pub mod descriptor;
pub mod document;
pub mod item;
