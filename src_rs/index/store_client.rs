// 목적:
// - 검색 엔진의 인덱스 수명주기와 문서 쓰기/검색을 담당하는 문서 저장소 클라이언트를 제공한다.
//
// 설명:
// - 연결 상태는 Disconnected -> Connected -> Closed 순서로만 바뀌며 Closed는 종료 상태다.
// - 한 클라이언트의 요청은 비동기 Mutex로 직렬화되고, 재시도/캐시는 하지 않는다.
// - close()는 진행 중인 요청을 Connection 오류로 끊는다. 이미 반영된 쓰기는 되돌리지 않는다.
//
// 디자인 패턴:
// - 저장소 패턴(Repository Pattern) + 상태 머신(State Machine).
//
// 참조:
// - src_rs/index/transport.rs
// - src_rs/index/bulk.rs
// - src_rs/decode/result_page.rs

use serde_json::{Map, Value};
use std::future::Future;
use std::marker::PhantomData;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::core::config::ClientConfigPayload;
use crate::core::errors::{CoreError, CoreResult};
use crate::decode::result_page::{decode_search_response, decode_source, ResultPage};
use crate::index::bulk::{
    decode_bulk_response, encode_delete_actions, encode_index_actions, BulkReport,
};
use crate::index::transport::{
    EngineMethod, EngineRequest, EngineResponse, EngineTransport, HttpTransport,
};
use crate::query::builder::QuerySpec;
use crate::query::request::search_request_body;
use crate::schema::descriptor::{validate_index_name, SchemaDescriptor};
use crate::schema::document::{DocumentId, IndexedDocument};

const INDEX_NOT_FOUND: &str = "index_not_found_exception";
const INDEX_ALREADY_EXISTS: &str = "resource_already_exists_exception";
const ILLEGAL_ARGUMENT: &str = "illegal_argument_exception";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateIndexMode {
    FailIfExists,
    IfAbsent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCreation {
    Created,
    AlreadyExisted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingOutcome {
    /// 새로 추가된 필드 이름.
    Applied(Vec<String>),
    Unchanged,
}

pub struct DocumentStoreClient<D: IndexedDocument, T: EngineTransport = HttpTransport> {
    transport: T,
    schema: SchemaDescriptor,
    refresh_on_write: bool,
    state: watch::Sender<ConnectionState>,
    io_lock: Mutex<()>,
    _document: PhantomData<fn() -> D>,
}

impl<D: IndexedDocument> DocumentStoreClient<D, HttpTransport> {
    /// HTTP 전송 계층으로 클라이언트를 만든다. 연결은 connect()에서 맺는다.
    pub fn new(config: &ClientConfigPayload) -> CoreResult<Self> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(transport, config)
    }
}

impl<D: IndexedDocument, T: EngineTransport> DocumentStoreClient<D, T> {
    pub fn with_transport(transport: T, config: &ClientConfigPayload) -> CoreResult<Self> {
        config.validate()?;
        let schema = D::schema()?;
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        Ok(Self {
            transport,
            schema,
            refresh_on_write: config.refresh_on_write,
            state,
            io_lock: Mutex::new(()),
            _document: PhantomData,
        })
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// 엔진 루트를 호출해 연결을 확인한다. 이미 연결되어 있으면 아무 일도 하지 않는다.
    pub async fn connect(&self) -> CoreResult<()> {
        match self.state() {
            ConnectionState::Connected => return Ok(()),
            ConnectionState::Closed => return Err(closed_error()),
            ConnectionState::Disconnected => {}
        }

        let response = self.dispatch(EngineRequest::new(EngineMethod::Get, "/")).await?;
        if !response.is_success() {
            return Err(CoreError::Connection(format!(
                "엔진 상태 확인 실패: status={}, body={}",
                response.status, response.body
            )));
        }

        let version = response
            .json()
            .ok()
            .and_then(|value| {
                value
                    .get("version")
                    .and_then(|version| version.get("number"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "unknown".to_string());

        // close()가 먼저 끝났다면 Closed를 덮어쓰지 않는다.
        let connected = self.state.send_if_modified(|state| {
            if *state == ConnectionState::Disconnected {
                *state = ConnectionState::Connected;
                true
            } else {
                false
            }
        });
        if !connected && self.state() == ConnectionState::Closed {
            return Err(closed_error());
        }

        info!(index = self.schema.index_name(), engine_version = %version, "검색 엔진에 연결했습니다");
        Ok(())
    }

    /// 연결을 닫는다. 진행 중인 요청은 Connection 오류로 끝난다.
    pub fn close(&self) {
        let previous = self.state.send_replace(ConnectionState::Closed);
        if previous != ConnectionState::Closed {
            info!(index = self.schema.index_name(), "검색 엔진 연결을 닫았습니다");
        }
    }

    pub async fn index_exists(&self) -> CoreResult<bool> {
        let path = format!("/{}", self.schema.index_name());
        let response = self.execute(EngineRequest::new(EngineMethod::Head, path)).await?;
        match response.status {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(CoreError::Engine {
                status,
                body: response.body,
            }),
        }
    }

    /// 디스크립터의 shard/replica 설정으로 빈 인덱스를 만든다.
    pub async fn create_index(&self, mode: CreateIndexMode) -> CoreResult<IndexCreation> {
        let index_name = self.schema.index_name();
        let request = EngineRequest::new(EngineMethod::Put, format!("/{}", index_name))
            .with_json(self.schema.settings_payload());

        let response = self.execute(request).await?;
        if response.is_success() {
            info!(
                index = index_name,
                shards = self.schema.shards(),
                replicas = self.schema.replicas(),
                "인덱스를 생성했습니다"
            );
            return Ok(IndexCreation::Created);
        }

        match (response.error_type().as_deref(), mode) {
            (Some(INDEX_ALREADY_EXISTS), CreateIndexMode::IfAbsent) => {
                debug!(index = index_name, "인덱스가 이미 있어 생성을 건너뜁니다");
                Ok(IndexCreation::AlreadyExisted)
            }
            _ => Err(map_engine_error(response, index_name)),
        }
    }

    /// 필드 매핑을 적용한다. 모든 필드가 이미 같은 정의로 있으면 요청을 보내지 않는다.
    pub async fn put_mapping(&self) -> CoreResult<MappingOutcome> {
        let index_name = self.schema.index_name();
        let current = self
            .execute(EngineRequest::new(
                EngineMethod::Get,
                format!("/{}/_mapping", index_name),
            ))
            .await?;
        if !current.is_success() {
            return Err(map_engine_error(current, index_name));
        }

        let existing = existing_properties(&current.json()?, self.schema.type_name());
        let pending = self
            .schema
            .pending_fields(&existing)?
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        if pending.is_empty() {
            debug!(index = index_name, "매핑이 이미 최신이라 적용을 건너뜁니다");
            return Ok(MappingOutcome::Unchanged);
        }

        let request = EngineRequest::new(EngineMethod::Put, format!("/{}/_mapping", index_name))
            .with_json(self.schema.mapping_payload());
        let response = self.execute(request).await?;
        if !response.is_success() {
            if response.error_type().as_deref() == Some(ILLEGAL_ARGUMENT) {
                return Err(CoreError::MappingConflict(response.error_reason()));
            }
            return Err(map_engine_error(response, index_name));
        }

        info!(index = index_name, fields = ?pending, "매핑을 적용했습니다");
        Ok(MappingOutcome::Applied(pending))
    }

    /// 문서를 한 번의 bulk 요청으로 쓴다. 항목별 실패는 BulkReport로 돌려준다.
    pub async fn bulk_upsert(&self, documents: &[D]) -> CoreResult<BulkReport> {
        if documents.is_empty() {
            return Ok(BulkReport::default());
        }

        let payload = encode_index_actions(self.schema.index_name(), documents)?;
        self.execute_bulk(payload, documents.len()).await
    }

    pub async fn bulk_delete(&self, ids: &[DocumentId]) -> CoreResult<BulkReport> {
        if ids.is_empty() {
            return Ok(BulkReport::default());
        }

        let payload = encode_delete_actions(self.schema.index_name(), ids)?;
        self.execute_bulk(payload, ids.len()).await
    }

    pub async fn get_by_id(&self, id: DocumentId) -> CoreResult<Option<D>> {
        let index_name = self.schema.index_name();
        let path = format!("/{}/_doc/{}", index_name, id);
        let response = self.execute(EngineRequest::new(EngineMethod::Get, path)).await?;

        if response.status == 404 && response.error_type().is_none() {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(map_engine_error(response, index_name));
        }

        let value = response.json()?;
        if value.get("found").and_then(Value::as_bool) == Some(false) {
            return Ok(None);
        }

        let source = value
            .get("_source")
            .ok_or_else(|| CoreError::Decode(format!("문서 응답에 _source가 없습니다: id={}", id)))?;
        decode_source(&id.to_string(), source, None).map(Some)
    }

    /// 검색 명세 하나를 실행한다. 명세는 이 호출에서 소비된다.
    pub async fn search(&self, spec: QuerySpec) -> CoreResult<ResultPage<D>> {
        let index_name = self.schema.index_name();
        let request = EngineRequest::new(
            EngineMethod::Post,
            format!("/{}/_search?typed_keys=true", index_name),
        )
        .with_json(search_request_body(&spec));

        let response = self.execute(request).await?;
        if !response.is_success() {
            return Err(map_engine_error(response, index_name));
        }

        let page = decode_search_response(&response.json()?, &spec)?;
        debug!(
            index = index_name,
            total_hits = page.total_hits,
            returned = page.documents.len(),
            "검색을 완료했습니다"
        );
        Ok(page)
    }

    pub async fn refresh(&self) -> CoreResult<()> {
        let index_name = self.schema.index_name();
        let path = format!("/{}/_refresh", index_name);
        let response = self.execute(EngineRequest::new(EngineMethod::Post, path)).await?;
        if !response.is_success() {
            return Err(map_engine_error(response, index_name));
        }
        Ok(())
    }

    /// 이름으로 인덱스 하나를 삭제한다. 없으면 IndexNotFound, 이름이 규칙에 맞지 않으면
    /// 요청 없이 Validation.
    pub async fn delete_index(&self, index_name: &str) -> CoreResult<()> {
        validate_index_name(index_name)?;

        let path = format!("/{}", index_name);
        let response = self.execute(EngineRequest::new(EngineMethod::Delete, path)).await?;
        if !response.is_success() {
            return Err(map_engine_error(response, index_name));
        }

        info!(index = index_name, "인덱스를 삭제했습니다");
        Ok(())
    }

    async fn execute_bulk(&self, payload: String, expected_len: usize) -> CoreResult<BulkReport> {
        let path = if self.refresh_on_write {
            "/_bulk?refresh=true"
        } else {
            "/_bulk"
        };

        let response = self
            .execute(EngineRequest::new(EngineMethod::Post, path).with_ndjson(payload))
            .await?;
        if !response.is_success() {
            return Err(map_engine_error(response, self.schema.index_name()));
        }

        let report = decode_bulk_response(&response.json()?, expected_len)?;
        let failed = report.failed().count();
        if failed > 0 {
            warn!(
                index = self.schema.index_name(),
                total = report.items.len(),
                failed,
                "bulk 요청 일부가 실패했습니다"
            );
        } else {
            debug!(index = self.schema.index_name(), total = report.items.len(), "bulk 요청을 완료했습니다");
        }
        Ok(report)
    }

    /// 연결된 상태에서만 요청을 보낸다.
    async fn execute(&self, request: EngineRequest) -> CoreResult<EngineResponse> {
        match self.state() {
            ConnectionState::Connected => self.dispatch(request).await,
            ConnectionState::Disconnected => Err(CoreError::Connection(
                "connect()를 먼저 호출해야 합니다".to_string(),
            )),
            ConnectionState::Closed => Err(closed_error()),
        }
    }

    /// 요청을 직렬화해 보내고, close()가 먼저 오면 요청을 버린다.
    async fn dispatch(&self, request: EngineRequest) -> CoreResult<EngineResponse> {
        let _guard = tokio::select! {
            biased;
            _ = self.closed() => return Err(closed_error()),
            guard = self.io_lock.lock() => guard,
        };

        debug!(method = ?request.method, path = %request.path, "엔진 요청");
        tokio::select! {
            biased;
            _ = self.closed() => Err(closed_error()),
            response = self.transport.send(request) => response,
        }
    }

    /// 상태가 Closed가 되면 완료되는 future.
    fn closed(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut receiver = self.state.subscribe();
        async move {
            let _ = receiver
                .wait_for(|state| *state == ConnectionState::Closed)
                .await;
        }
    }
}

impl<D: IndexedDocument, T: EngineTransport> Drop for DocumentStoreClient<D, T> {
    fn drop(&mut self) {
        self.state.send_replace(ConnectionState::Closed);
    }
}

fn closed_error() -> CoreError {
    CoreError::Connection("클라이언트 연결이 닫혔습니다".to_string())
}

fn map_engine_error(response: EngineResponse, index_name: &str) -> CoreError {
    match response.error_type().as_deref() {
        Some(INDEX_NOT_FOUND) => CoreError::IndexNotFound(index_name.to_string()),
        Some(INDEX_ALREADY_EXISTS) => CoreError::IndexAlreadyExists(index_name.to_string()),
        _ => CoreError::Engine {
            status: response.status,
            body: response.body,
        },
    }
}

/// `GET /{index}/_mapping` 응답에서 properties를 꺼낸다.
/// 7.x 이후는 `mappings.properties`, 그 이전은 `mappings.{type}.properties`에 있다.
fn existing_properties(raw: &Value, type_name: &str) -> Map<String, Value> {
    let mappings = raw
        .as_object()
        .and_then(|indices| indices.values().next())
        .and_then(|index| index.get("mappings"));

    let Some(mappings) = mappings else {
        return Map::new();
    };

    mappings
        .get("properties")
        .or_else(|| mappings.get(type_name).and_then(|typed| typed.get("properties")))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}
