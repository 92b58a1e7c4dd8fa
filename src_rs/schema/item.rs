// 목적:
// - 상품(Item) 문서와 그 인덱스 스키마를 정의한다.
//
// 설명:
// - 인덱스 `item`, 타입 `goods`, shard 1, replica 1.
// - title은 ik_max_word로 분석되는 text, category/brand는 keyword, price는 double,
//   images는 색인하지 않는 keyword다.
// - source filter로 일부 필드만 돌아오는 경우를 위해 id 외 필드는 Option이다.
//
// 참조:
// - src_rs/schema/descriptor.rs
// - src_rs/api/item_repository.rs

use serde::{Deserialize, Serialize};

use crate::core::errors::{CoreError, CoreResult};
use crate::schema::descriptor::{FieldDescriptor, SchemaDescriptor};
use crate::schema::document::{DocumentId, IndexedDocument};

pub const ITEM_INDEX: &str = "item";
pub const ITEM_TYPE: &str = "goods";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: DocumentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<String>,
}

impl Item {
    pub fn new(
        id: DocumentId,
        title: &str,
        category: &str,
        brand: &str,
        price: f64,
        images: &str,
    ) -> Self {
        Self {
            id,
            title: Some(title.to_string()),
            category: Some(category.to_string()),
            brand: Some(brand.to_string()),
            price: Some(price),
            images: Some(images.to_string()),
        }
    }
}

/// Item 인덱스 스키마를 만든다.
pub fn item_schema() -> CoreResult<SchemaDescriptor> {
    let fields = vec![
        FieldDescriptor::declare("id", "long")?,
        FieldDescriptor::declare("title", "text")?.with_analyzer("ik_max_word"),
        FieldDescriptor::declare("category", "keyword")?,
        FieldDescriptor::declare("brand", "keyword")?,
        FieldDescriptor::declare("price", "double")?,
        FieldDescriptor::declare("images", "keyword")?.not_indexed(),
    ];

    SchemaDescriptor::new(ITEM_INDEX, ITEM_TYPE, 1, 1, fields)
}

impl IndexedDocument for Item {
    fn schema() -> CoreResult<SchemaDescriptor> {
        item_schema()
    }

    fn document_id(&self) -> DocumentId {
        self.id
    }

    fn validate(&self) -> CoreResult<()> {
        if let Some(price) = self.price {
            if !price.is_finite() {
                return Err(CoreError::Validation(format!(
                    "price는 유한한 수여야 합니다: id={}, price={}",
                    self.id, price
                )));
            }
        }
        Ok(())
    }
}
