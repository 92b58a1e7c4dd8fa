// 목적:
// - 엔진 응답 디코딩 계층 모듈을 선언한다.
//
// 참조:
// - src_rs/decode/result_page.rs

pub mod result_page;
