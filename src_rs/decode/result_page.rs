// 목적:
// - 엔진 검색 응답을 타입이 있는 결과 페이지(ResultPage)로 변환한다.
//
// 설명:
// - 각 hit의 `_source`는 요청한 source filter 필드로 제한한 뒤 문서 타입으로 역직렬화한다.
// - terms 집계 버킷은 엔진이 준 순서를 그대로 유지하며 다시 정렬하지 않는다.
// - 요청한 집계가 없거나 문자열 terms 집계가 아니면 Decode 오류로 거부한다.
//
// 디자인 패턴:
// - 응답 디코더(Response Decoder).
//
// 참조:
// - src_rs/query/builder.rs
// - src_rs/index/store_client.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::errors::{CoreError, CoreResult};
use crate::query::builder::{QuerySpec, TermsAggregation};
use crate::schema::document::{DocumentId, IndexedDocument};

/// typed_keys 응답에서 문자열 terms 집계를 나타내는 접두사.
const STRING_TERMS_PREFIX: &str = "sterms";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub key: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub name: String,
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage<D> {
    pub documents: Vec<D>,
    pub total_hits: u64,
    pub total_pages: u64,
    pub aggregation: Option<AggregationResult>,
}

impl<D: IndexedDocument> ResultPage<D> {
    pub fn ids(&self) -> Vec<DocumentId> {
        self.documents.iter().map(D::document_id).collect()
    }
}

/// 검색 응답을 결과 페이지로 변환한다.
pub fn decode_search_response<D: IndexedDocument>(
    raw: &Value,
    spec: &QuerySpec,
) -> CoreResult<ResultPage<D>> {
    let hits = raw
        .get("hits")
        .ok_or_else(|| CoreError::Decode("검색 응답에 hits가 없습니다".to_string()))?;

    let total_hits = decode_total(hits)?;

    let raw_hits = hits
        .get("hits")
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::Decode("검색 응답에 hits.hits 배열이 없습니다".to_string()))?;

    let documents = raw_hits
        .iter()
        .map(|hit| decode_hit::<D>(hit, spec.source_fields()))
        .collect::<CoreResult<Vec<_>>>()?;

    let aggregation = match spec.aggregation() {
        Some(requested) => Some(decode_terms_aggregation(raw, requested)?),
        None => None,
    };

    Ok(ResultPage {
        documents,
        total_hits,
        total_pages: total_hits.div_ceil(spec.effective_page_size().max(1)),
        aggregation,
    })
}

/// `_id`와 `_source` 하나를 문서로 변환한다. `source_fields`가 있으면 그 필드만 남긴다.
pub fn decode_source<D: IndexedDocument>(
    raw_id: &str,
    source: &Value,
    source_fields: Option<&[String]>,
) -> CoreResult<D> {
    let id = raw_id.parse::<DocumentId>().map_err(|error| {
        CoreError::Decode(format!("_id를 정수로 읽을 수 없습니다: {}, {}", raw_id, error))
    })?;

    let object = source.as_object().ok_or_else(|| {
        CoreError::Decode(format!("_source가 객체가 아닙니다: id={}", raw_id))
    })?;

    let mut fields = match source_fields {
        Some(allowed) => object
            .iter()
            .filter(|(name, _)| allowed.iter().any(|field| field == *name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect::<Map<_, _>>(),
        None => object.clone(),
    };

    match fields.get(D::ID_FIELD) {
        Some(source_id) if source_id.as_i64() != Some(id) => {
            return Err(CoreError::Decode(format!(
                "_id와 _source의 {}가 다릅니다: _id={}, source={}",
                D::ID_FIELD,
                id,
                source_id
            )))
        }
        Some(_) => {}
        None => {
            fields.insert(D::ID_FIELD.to_string(), Value::from(id));
        }
    }

    serde_json::from_value(Value::Object(fields)).map_err(|error| {
        CoreError::Decode(format!("_source를 문서로 변환할 수 없습니다: id={}, {}", raw_id, error))
    })
}

fn decode_total(hits: &Value) -> CoreResult<u64> {
    let total = hits
        .get("total")
        .ok_or_else(|| CoreError::Decode("검색 응답에 hits.total이 없습니다".to_string()))?;

    // 7.x 이후는 {"value": n, "relation": "eq"}, 그 이전은 숫자 하나다.
    total
        .as_u64()
        .or_else(|| total.get("value").and_then(Value::as_u64))
        .ok_or_else(|| CoreError::Decode(format!("hits.total 형식이 올바르지 않습니다: {}", total)))
}

fn decode_hit<D: IndexedDocument>(hit: &Value, source_fields: Option<&[String]>) -> CoreResult<D> {
    let raw_id = hit
        .get("_id")
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::Decode(format!("hit에 _id가 없습니다: {}", hit)))?;

    let source = hit
        .get("_source")
        .ok_or_else(|| CoreError::Decode(format!("hit에 _source가 없습니다: id={}", raw_id)))?;

    decode_source(raw_id, source, source_fields)
}

fn decode_terms_aggregation(
    raw: &Value,
    requested: &TermsAggregation,
) -> CoreResult<AggregationResult> {
    let aggregations = raw
        .get("aggregations")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            CoreError::Decode(format!(
                "요청한 집계 {}가 있는데 응답에 aggregations가 없습니다",
                requested.name
            ))
        })?;

    let aggregation = find_aggregation(aggregations, &requested.name)?;

    let buckets = aggregation
        .get("buckets")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            CoreError::Decode(format!(
                "집계 {}가 버킷 집계가 아닙니다: {}",
                requested.name, aggregation
            ))
        })?;

    let buckets = buckets
        .iter()
        .map(|bucket| decode_bucket(bucket, &requested.name))
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(AggregationResult {
        name: requested.name.clone(),
        buckets,
    })
}

/// 이름 그대로의 키, 또는 typed_keys 형식(`sterms#name`)의 키를 찾는다.
fn find_aggregation<'a>(aggregations: &'a Map<String, Value>, name: &str) -> CoreResult<&'a Value> {
    if let Some(aggregation) = aggregations.get(name) {
        return Ok(aggregation);
    }

    for (key, aggregation) in aggregations {
        let Some((kind, key_name)) = key.split_once('#') else {
            continue;
        };
        if key_name != name {
            continue;
        }
        if kind != STRING_TERMS_PREFIX {
            return Err(CoreError::Decode(format!(
                "집계 {}의 타입이 {}입니다. 문자열 terms 집계({})가 필요합니다",
                name, kind, STRING_TERMS_PREFIX
            )));
        }
        return Ok(aggregation);
    }

    Err(CoreError::Decode(format!(
        "응답에 요청한 집계 {}가 없습니다",
        name
    )))
}

fn decode_bucket(bucket: &Value, aggregation_name: &str) -> CoreResult<Bucket> {
    let key = match bucket.get("key") {
        Some(Value::String(key)) => key.clone(),
        _ => bucket
            .get("key_as_string")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                CoreError::Decode(format!(
                    "집계 {}의 버킷 키가 문자열이 아닙니다: {}",
                    aggregation_name, bucket
                ))
            })?,
    };

    let count = bucket
        .get("doc_count")
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            CoreError::Decode(format!(
                "집계 {}의 버킷에 doc_count가 없습니다: {}",
                aggregation_name, bucket
            ))
        })?;

    Ok(Bucket { key, count })
}
