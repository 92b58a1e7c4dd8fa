// 목적:
// - Item 검색 클라이언트 코어의 진입점을 제공한다.
//
// 설명:
// - Elasticsearch 호환 엔진에 스키마를 적용하고, 문서를 일괄 저장하고,
//   검색 명세를 보내 결과 페이지로 돌려받는다.
// - 색인/점수 계산/샤딩은 모두 외부 엔진의 몫이다.
//
// 디자인 패턴:
// - 계층형 모듈 구조(api/core/index/query/schema/decode).
//
// 참조:
// - src_rs/api/item_repository.rs
// - src_rs/index/store_client.rs

pub mod api;
pub mod core;
pub mod decode;
pub mod index;
pub mod query;
pub mod schema;

pub use crate::api::item_repository::ItemRepository;
pub use crate::core::config::{ClientConfigPayload, EngineAuthPayload};
pub use crate::core::errors::{CoreError, CoreResult};
pub use crate::core::telemetry::init_tracing;
pub use crate::decode::result_page::{AggregationResult, Bucket, ResultPage};
pub use crate::index::bulk::{BulkActionKind, BulkItemResult, BulkReport};
pub use crate::index::store_client::{
    ConnectionState, CreateIndexMode, DocumentStoreClient, IndexCreation, MappingOutcome,
};
pub use crate::index::transport::{
    EngineMethod, EngineRequest, EngineResponse, EngineTransport, HttpTransport, RequestBody,
};
pub use crate::query::builder::{QueryBuilder, QuerySpec, SortOrder};
pub use crate::schema::descriptor::{FieldDescriptor, FieldType, IndexingMode, SchemaDescriptor};
pub use crate::schema::document::{DocumentId, IndexedDocument};
pub use crate::schema::item::{item_schema, Item};
