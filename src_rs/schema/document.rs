// 목적:
// - 색인 가능한 문서 타입이 구현해야 하는 계약을 정의한다.
//
// 설명:
// - 스키마는 리플렉션 대신 타입별 팩토리 함수로 명시적으로 만든다.
// - 문서 id는 엔진의 `_id`와 1:1로 대응한다.
//
// 참조:
// - src_rs/schema/item.rs
// - src_rs/index/store_client.rs

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::errors::CoreResult;
use crate::schema::descriptor::SchemaDescriptor;

pub type DocumentId = i64;

pub trait IndexedDocument: Serialize + DeserializeOwned + Send + Sync {
    /// `_source` 안에서 id를 담는 필드 이름.
    const ID_FIELD: &'static str = "id";

    fn schema() -> CoreResult<SchemaDescriptor>;

    fn document_id(&self) -> DocumentId;

    /// bulk 전송 전에 호출된다. 실패하면 배치 전체가 ValidationError로 거부된다.
    fn validate(&self) -> CoreResult<()> {
        Ok(())
    }
}
