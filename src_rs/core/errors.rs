// 목적:
// - 클라이언트 코어 계층의 표준 오류 타입을 정의한다.
//
// 설명:
// - 요청 검증/전송/인덱스 수명주기/페이지네이션/응답 디코딩 오류를 명시적으로 구분한다.
// - 모든 오류는 호출자에게 그대로 전달되며 코어는 재시도하거나 삼키지 않는다.
//
// 디자인 패턴:
// - 도메인 오류 열거형(Domain Error Enum).
//
// 참조:
// - src_rs/index/store_client.rs
// - src_rs/decode/result_page.rs

use thiserror::Error;

/// 코어 계층에서 공통으로 사용하는 오류 열거형이다.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("지원하지 않는 필드 타입입니다: {0}")]
    InvalidFieldType(String),
    #[error("요청 검증에 실패했습니다: {0}")]
    Validation(String),
    #[error("검색 엔진 연결에 실패했습니다: {0}")]
    Connection(String),
    #[error("인덱스가 이미 존재합니다: {0}")]
    IndexAlreadyExists(String),
    #[error("인덱스를 찾을 수 없습니다: {0}")]
    IndexNotFound(String),
    #[error("필드 매핑이 기존 매핑과 충돌합니다: {0}")]
    MappingConflict(String),
    #[error("페이지네이션 값이 유효하지 않습니다: {0}")]
    InvalidPagination(String),
    #[error("엔진 응답 디코딩에 실패했습니다: {0}")]
    Decode(String),
    #[error("설정값이 유효하지 않습니다: {0}")]
    InvalidConfig(String),
    #[error("검색 엔진이 오류를 반환했습니다: status={status}, body={body}")]
    Engine { status: u16, body: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
