// 목적:
// - QuerySpec을 엔진 검색 요청 본문(JSON)으로 변환한다.
//
// 설명:
// - match 절은 bool.must, range 절은 점수에 영향이 없는 bool.filter로 보낸다.
// - 지정되지 않은 sort/page는 본문에서 빠지며 엔진 기본값(관련도 순, 첫 페이지)을 따른다.
//
// 참조:
// - src_rs/query/builder.rs

use serde_json::{json, Map, Value};

use crate::query::builder::{QuerySpec, RangeClause};

/// 검색 요청 본문을 만든다.
pub fn search_request_body(spec: &QuerySpec) -> Value {
    let mut body = Map::new();
    body.insert("query".to_string(), query_clause(spec));
    body.insert("track_total_hits".to_string(), json!(true));

    if let Some(sort) = spec.sort() {
        body.insert(
            "sort".to_string(),
            json!([{ sort.field.as_str(): { "order": sort.order } }]),
        );
    }

    if let Some(page) = spec.page() {
        body.insert("from".to_string(), json!(page.offset));
        body.insert("size".to_string(), json!(page.limit));
    }

    if let Some(aggregation) = spec.aggregation() {
        body.insert(
            "aggs".to_string(),
            json!({ aggregation.name.as_str(): { "terms": { "field": aggregation.field } } }),
        );
    }

    if let Some(fields) = spec.source_fields() {
        body.insert("_source".to_string(), json!(fields));
    }

    Value::Object(body)
}

fn query_clause(spec: &QuerySpec) -> Value {
    if spec.match_clause().is_none() && spec.range().is_none() {
        return json!({ "match_all": {} });
    }

    let mut bool_query = Map::new();
    if let Some(clause) = spec.match_clause() {
        bool_query.insert(
            "must".to_string(),
            json!([{ "match": { clause.field.as_str(): clause.text } }]),
        );
    }
    if let Some(range) = spec.range() {
        bool_query.insert("filter".to_string(), json!([range_clause(range)]));
    }

    json!({ "bool": bool_query })
}

fn range_clause(range: &RangeClause) -> Value {
    let mut bounds = Map::new();
    if let Some(gte) = range.gte {
        bounds.insert("gte".to_string(), json!(gte));
    }
    if let Some(lte) = range.lte {
        bounds.insert("lte".to_string(), json!(lte));
    }
    json!({ "range": { range.field.as_str(): bounds } })
}
