// 목적:
// - 상품(Item) 인덱스에 대한 저장소 파사드를 제공한다.
//
// 설명:
// - 인덱스 초기화(생성 + 매핑), 일괄 저장, 가격 범위 조회, 임의 검색을 한 객체로 묶는다.
// - 가격 범위 조회는 메서드 이름 해석 대신 QueryBuilder로 명시적으로 조립한다.
// - 클라이언트는 호출자가 명시적으로 만들고 넘기며, 저장소가 사라지면 연결도 닫힌다.
//
// 디자인 패턴:
// - 파사드(Facade).
//
// 참조:
// - src_rs/index/store_client.rs
// - src_rs/query/builder.rs

use tracing::info;

use crate::core::config::ClientConfigPayload;
use crate::core::errors::{CoreError, CoreResult};
use crate::decode::result_page::ResultPage;
use crate::index::bulk::BulkReport;
use crate::index::store_client::{CreateIndexMode, DocumentStoreClient, MappingOutcome};
use crate::index::transport::{EngineTransport, HttpTransport};
use crate::query::builder::{QueryBuilder, QuerySpec};
use crate::schema::document::DocumentId;
use crate::schema::item::Item;

pub struct ItemRepository<T: EngineTransport = HttpTransport> {
    client: DocumentStoreClient<Item, T>,
    derived_query_limit: i64,
}

impl ItemRepository<HttpTransport> {
    /// HTTP로 엔진에 연결한 저장소를 만든다.
    pub async fn connect(config: &ClientConfigPayload) -> CoreResult<Self> {
        let client = DocumentStoreClient::new(config)?;
        Self::from_client(client, config).await
    }
}

impl<T: EngineTransport> ItemRepository<T> {
    pub async fn with_transport(transport: T, config: &ClientConfigPayload) -> CoreResult<Self> {
        let client = DocumentStoreClient::with_transport(transport, config)?;
        Self::from_client(client, config).await
    }

    async fn from_client(
        client: DocumentStoreClient<Item, T>,
        config: &ClientConfigPayload,
    ) -> CoreResult<Self> {
        client.connect().await?;
        Ok(Self {
            client,
            derived_query_limit: config.derived_query_limit,
        })
    }

    pub fn client(&self) -> &DocumentStoreClient<Item, T> {
        &self.client
    }

    /// 인덱스가 없으면 만들고 매핑을 적용한다. 반복 호출해도 상태가 바뀌지 않는다.
    pub async fn initialize(&self) -> CoreResult<MappingOutcome> {
        let creation = self.client.create_index(CreateIndexMode::IfAbsent).await?;
        let mapping = self.client.put_mapping().await?;
        info!(creation = ?creation, mapping = ?mapping, "item 인덱스를 초기화했습니다");
        Ok(mapping)
    }

    pub async fn save_all(&self, items: &[Item]) -> CoreResult<BulkReport> {
        self.client.bulk_upsert(items).await
    }

    pub async fn find_by_id(&self, id: DocumentId) -> CoreResult<Option<Item>> {
        self.client.get_by_id(id).await
    }

    /// `begin <= price <= end`인 상품을 최대 derived_query_limit개까지 돌려준다.
    pub async fn find_by_price_between(&self, begin: f64, end: f64) -> CoreResult<Vec<Item>> {
        if begin > end {
            return Err(CoreError::Validation(format!(
                "가격 하한이 상한보다 큽니다: {} > {}",
                begin, end
            )));
        }

        let spec = QueryBuilder::new()
            .with_range("price", Some(begin), Some(end))
            .with_page(0, self.derived_query_limit)?
            .build()?;

        Ok(self.client.search(spec).await?.documents)
    }

    pub async fn search(&self, spec: QuerySpec) -> CoreResult<ResultPage<Item>> {
        self.client.search(spec).await
    }

    pub async fn delete_all(&self, ids: &[DocumentId]) -> CoreResult<BulkReport> {
        self.client.bulk_delete(ids).await
    }

    pub fn close(&self) {
        self.client.close();
    }
}
