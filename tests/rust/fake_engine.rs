// 목적:
// - 통합 테스트용 인메모리 검색 엔진을 제공한다.
//
// 설명:
// - EngineTransport를 구현해 Elasticsearch REST 응답 형식을 흉내 낸다.
// - 인덱스 생성/매핑/bulk/단건 조회/검색(match, range, sort, from/size, _source, terms 집계)만 다룬다.
// - match는 CJK 바이그램 + 영숫자 단어 토큰이 하나라도 겹치면 일치로 본다.
// - terms 버킷은 doc_count 내림차순, 같은 수면 key 오름차순이다.

use item_search::{
    CoreResult, EngineMethod, EngineRequest, EngineResponse, EngineTransport, RequestBody,
};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const DEFAULT_SIZE: usize = 10;

#[derive(Default)]
struct IndexState {
    properties: Map<String, Value>,
    documents: Vec<(String, Value)>,
}

#[derive(Default)]
struct EngineState {
    indices: BTreeMap<String, IndexState>,
    requests: Vec<String>,
    mapping_puts: usize,
    latency: Option<Duration>,
}

#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이후 요청마다 응답 전에 기다릴 시간.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.lock().latency = latency;
    }

    /// 매핑이 이미 있는 인덱스를 만든다.
    pub fn seed_index(&self, index: &str, properties: Value) {
        let properties = properties.as_object().cloned().unwrap_or_default();
        self.lock().indices.insert(
            index.to_string(),
            IndexState {
                properties,
                documents: Vec::new(),
            },
        );
    }

    pub fn mapping_puts(&self) -> usize {
        self.lock().mapping_puts
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    pub fn document_count(&self, index: &str) -> usize {
        self.lock()
            .indices
            .get(index)
            .map(|state| state.documents.len())
            .unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn handle(&self, request: EngineRequest) -> EngineResponse {
        let mut state = self.lock();
        state
            .requests
            .push(format!("{:?} {}", request.method, request.path));

        let (path, query) = request
            .path
            .split_once('?')
            .unwrap_or((request.path.as_str(), ""));
        let segments = path.trim_start_matches('/').split('/').collect::<Vec<_>>();
        let (body, ndjson) = match request.body {
            Some(RequestBody::Json(value)) => (Some(value), None),
            Some(RequestBody::NdJson(text)) => (None, Some(text)),
            None => (None, None),
        };

        match (request.method, segments.as_slice()) {
            (EngineMethod::Get, [""]) => ok(json!({"version": {"number": "7.17.0"}})),
            (EngineMethod::Head, [index]) => {
                let status = if state.indices.contains_key(*index) { 200 } else { 404 };
                EngineResponse {
                    status,
                    body: String::new(),
                }
            }
            (EngineMethod::Put, [index]) => create_index(&mut state, index),
            (EngineMethod::Delete, [index]) => match state.indices.remove(*index) {
                Some(_) => ok(json!({"acknowledged": true})),
                None => index_not_found(index),
            },
            (EngineMethod::Get, [index, "_mapping"]) => get_mapping(&state, index),
            (EngineMethod::Put, [index, "_mapping"]) => {
                put_mapping(&mut state, index, body.unwrap_or(Value::Null))
            }
            (EngineMethod::Post, ["_bulk"]) => bulk(&mut state, &ndjson.unwrap_or_default()),
            (EngineMethod::Get, [index, "_doc", id]) => get_document(&state, index, id),
            (EngineMethod::Post, [index, "_search"]) => search(
                &state,
                index,
                &body.unwrap_or_else(|| json!({})),
                query.contains("typed_keys=true"),
            ),
            (EngineMethod::Post, [index, "_refresh"]) => {
                if state.indices.contains_key(*index) {
                    ok(json!({"_shards": {"total": 2, "successful": 1, "failed": 0}}))
                } else {
                    index_not_found(index)
                }
            }
            _ => error(400, "unsupported_operation_exception", &request.path),
        }
    }
}

impl EngineTransport for FakeEngine {
    async fn send(&self, request: EngineRequest) -> CoreResult<EngineResponse> {
        let latency = self.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self.handle(request))
    }
}

fn ok(body: Value) -> EngineResponse {
    EngineResponse {
        status: 200,
        body: body.to_string(),
    }
}

fn error(status: u16, kind: &str, reason: &str) -> EngineResponse {
    EngineResponse {
        status,
        body: json!({"error": {"type": kind, "reason": reason}, "status": status}).to_string(),
    }
}

fn index_not_found(index: &str) -> EngineResponse {
    error(404, "index_not_found_exception", &format!("no such index [{}]", index))
}

fn create_index(state: &mut EngineState, index: &str) -> EngineResponse {
    if state.indices.contains_key(index) {
        return error(
            400,
            "resource_already_exists_exception",
            &format!("index [{}] already exists", index),
        );
    }
    state.indices.insert(index.to_string(), IndexState::default());
    ok(json!({"acknowledged": true, "shards_acknowledged": true, "index": index}))
}

fn get_mapping(state: &EngineState, index: &str) -> EngineResponse {
    let Some(index_state) = state.indices.get(index) else {
        return index_not_found(index);
    };
    let mappings = if index_state.properties.is_empty() {
        json!({})
    } else {
        json!({"properties": index_state.properties})
    };
    ok(json!({ index: {"mappings": mappings} }))
}

fn put_mapping(state: &mut EngineState, index: &str, body: Value) -> EngineResponse {
    let Some(index_state) = state.indices.get_mut(index) else {
        return index_not_found(index);
    };
    let incoming = body
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    for (field, definition) in &incoming {
        if let Some(existing) = index_state.properties.get(field) {
            if existing.get("type") != definition.get("type") {
                return error(
                    400,
                    "illegal_argument_exception",
                    &format!(
                        "mapper [{}] cannot be changed from type [{}] to [{}]",
                        field,
                        existing.get("type").and_then(Value::as_str).unwrap_or("object"),
                        definition.get("type").and_then(Value::as_str).unwrap_or("object")
                    ),
                );
            }
        }
    }

    index_state.properties.extend(incoming);
    state.mapping_puts += 1;
    ok(json!({"acknowledged": true}))
}

fn bulk(state: &mut EngineState, payload: &str) -> EngineResponse {
    let mut lines = payload.lines().filter(|line| !line.trim().is_empty());
    let mut items = Vec::new();
    let mut errors = false;

    while let Some(line) = lines.next() {
        let Ok(action) = serde_json::from_str::<Value>(line) else {
            return error(400, "x_content_parse_exception", line);
        };
        let Some((action_name, meta)) = action.as_object().and_then(|object| object.iter().next())
        else {
            return error(400, "illegal_argument_exception", line);
        };
        let index = meta.get("_index").and_then(Value::as_str).unwrap_or_default().to_string();
        let id = meta.get("_id").and_then(Value::as_str).unwrap_or_default().to_string();

        let item = match action_name.as_str() {
            "index" => {
                let Some(Ok(source)) = lines.next().map(serde_json::from_str::<Value>) else {
                    return error(400, "x_content_parse_exception", "missing source line");
                };
                index_document(state.indices.entry(index.clone()).or_default(), &index, &id, source)
            }
            "delete" => {
                delete_document(state.indices.entry(index.clone()).or_default(), &index, &id)
            }
            other => return error(400, "illegal_argument_exception", other),
        };

        errors |= item.get("error").is_some();
        items.push(json!({ action_name.as_str(): item }));
    }

    ok(json!({"took": 1, "errors": errors, "items": items}))
}

fn index_document(index_state: &mut IndexState, index: &str, id: &str, source: Value) -> Value {
    for (field, definition) in &index_state.properties {
        let field_type = definition.get("type").and_then(Value::as_str).unwrap_or_default();
        let numeric = matches!(field_type, "long" | "integer" | "double" | "float");
        match source.get(field) {
            Some(value) if numeric && !value.is_number() && !value.is_null() => {
                return json!({
                    "_index": index,
                    "_id": id,
                    "status": 400,
                    "error": {
                        "type": "mapper_parsing_exception",
                        "reason": format!(
                            "failed to parse field [{}] of type [{}]",
                            field, field_type
                        ),
                    }
                });
            }
            _ => {}
        }
    }

    let existing = index_state.documents.iter_mut().find(|(doc_id, _)| doc_id == id);
    let (status, result) = match existing {
        Some((_, stored)) => {
            *stored = source;
            (200, "updated")
        }
        None => {
            index_state.documents.push((id.to_string(), source));
            (201, "created")
        }
    };
    json!({"_index": index, "_id": id, "status": status, "result": result})
}

fn delete_document(index_state: &mut IndexState, index: &str, id: &str) -> Value {
    let before = index_state.documents.len();
    index_state.documents.retain(|(doc_id, _)| doc_id != id);
    if index_state.documents.len() < before {
        json!({"_index": index, "_id": id, "status": 200, "result": "deleted"})
    } else {
        json!({"_index": index, "_id": id, "status": 404, "result": "not_found"})
    }
}

fn get_document(state: &EngineState, index: &str, id: &str) -> EngineResponse {
    let Some(index_state) = state.indices.get(index) else {
        return index_not_found(index);
    };
    match index_state.documents.iter().find(|(doc_id, _)| doc_id == id) {
        Some((_, source)) => ok(json!({
            "_index": index,
            "_id": id,
            "found": true,
            "_source": source
        })),
        None => EngineResponse {
            status: 404,
            body: json!({"_index": index, "_id": id, "found": false}).to_string(),
        },
    }
}

fn search(state: &EngineState, index: &str, body: &Value, typed_keys: bool) -> EngineResponse {
    let Some(index_state) = state.indices.get(index) else {
        return index_not_found(index);
    };

    let query = body.get("query").cloned().unwrap_or_else(|| json!({"match_all": {}}));
    let mut matched = index_state
        .documents
        .iter()
        .filter(|(_, source)| matches_query(&query, source))
        .collect::<Vec<_>>();

    if let Some((field, order)) = sort_spec(body) {
        matched.sort_by(|(_, left), (_, right)| {
            let ordering = compare_field(left, right, &field);
            if order == "desc" {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }

    let from = body.get("from").and_then(Value::as_u64).unwrap_or(0) as usize;
    let size = body
        .get("size")
        .and_then(Value::as_u64)
        .map(|size| size as usize)
        .unwrap_or(DEFAULT_SIZE);
    let source_fields = body.get("_source").and_then(Value::as_array).map(|fields| {
        fields
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect::<HashSet<_>>()
    });

    let hits = matched
        .iter()
        .skip(from)
        .take(size)
        .map(|(id, source)| {
            let source = match &source_fields {
                Some(allowed) => Value::Object(
                    source
                        .as_object()
                        .map(|object| {
                            object
                                .iter()
                                .filter(|(name, _)| allowed.contains(*name))
                                .map(|(name, value)| (name.clone(), value.clone()))
                                .collect()
                        })
                        .unwrap_or_default(),
                ),
                None => source.clone(),
            };
            json!({"_index": index, "_type": "_doc", "_id": id, "_score": 1.0, "_source": source})
        })
        .collect::<Vec<_>>();

    let mut response = json!({
        "took": 1,
        "timed_out": false,
        "hits": {
            "total": {"value": matched.len(), "relation": "eq"},
            "max_score": 1.0,
            "hits": hits
        },
    });

    if let Some(aggs) = body.get("aggs").and_then(Value::as_object) {
        let sources = matched.iter().map(|(_, source)| source).collect::<Vec<_>>();
        let mut rendered = Map::new();
        for (name, definition) in aggs {
            let field = definition
                .get("terms")
                .and_then(|terms| terms.get("field"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            let kind = terms_kind(index_state, field);
            let key = if typed_keys {
                format!("{}#{}", kind, name)
            } else {
                name.clone()
            };
            rendered.insert(key, terms_buckets(&sources, field));
        }
        response["aggregations"] = Value::Object(rendered);
    }

    ok(response)
}

fn matches_query(query: &Value, source: &Value) -> bool {
    if query.get("match_all").is_some() {
        return true;
    }

    if let Some(bool_query) = query.get("bool") {
        return ["must", "filter"].iter().all(|occur| {
            bool_query
                .get(*occur)
                .and_then(Value::as_array)
                .map(|clauses| clauses.iter().all(|clause| matches_query(clause, source)))
                .unwrap_or(true)
        });
    }

    if let Some((field, text)) = query
        .get("match")
        .and_then(Value::as_object)
        .and_then(|object| object.iter().next())
    {
        let wanted = tokens(text.as_str().unwrap_or_default());
        let present = tokens(source.get(field).and_then(Value::as_str).unwrap_or_default());
        return !wanted.is_disjoint(&present);
    }

    if let Some((field, bounds)) = query
        .get("range")
        .and_then(Value::as_object)
        .and_then(|object| object.iter().next())
    {
        let Some(value) = source.get(field).and_then(Value::as_f64) else {
            return false;
        };
        let above = bounds.get("gte").and_then(Value::as_f64).map_or(true, |gte| value >= gte);
        let below = bounds.get("lte").and_then(Value::as_f64).map_or(true, |lte| value <= lte);
        return above && below;
    }

    false
}

fn tokens(text: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut cjk_run = Vec::new();
    let mut word = String::new();

    let flush_cjk = |run: &mut Vec<char>, tokens: &mut HashSet<String>| {
        if run.len() == 1 {
            tokens.insert(run[0].to_string());
        }
        for pair in run.windows(2) {
            tokens.insert(pair.iter().collect());
        }
        run.clear();
    };

    for ch in text.chars() {
        if ('\u{4E00}'..='\u{9FFF}').contains(&ch) {
            if !word.is_empty() {
                tokens.insert(std::mem::take(&mut word));
            }
            cjk_run.push(ch);
        } else if ch.is_alphanumeric() {
            flush_cjk(&mut cjk_run, &mut tokens);
            word.extend(ch.to_lowercase());
        } else {
            flush_cjk(&mut cjk_run, &mut tokens);
            if !word.is_empty() {
                tokens.insert(std::mem::take(&mut word));
            }
        }
    }
    flush_cjk(&mut cjk_run, &mut tokens);
    if !word.is_empty() {
        tokens.insert(word);
    }
    tokens
}

fn sort_spec(body: &Value) -> Option<(String, String)> {
    let first = body.get("sort")?.as_array()?.first()?.as_object()?;
    let (field, options) = first.iter().next()?;
    let order = options
        .get("order")
        .and_then(Value::as_str)
        .unwrap_or("asc")
        .to_string();
    Some((field.clone(), order))
}

fn compare_field(left: &Value, right: &Value, field: &str) -> Ordering {
    match (left.get(field), right.get(field)) {
        (Some(Value::Number(left)), Some(Value::Number(right))) => left
            .as_f64()
            .partial_cmp(&right.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(left)), Some(Value::String(right))) => left.cmp(right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn terms_kind(index_state: &IndexState, field: &str) -> &'static str {
    let field_type = index_state
        .properties
        .get(field)
        .and_then(|definition| definition.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("keyword");
    match field_type {
        "long" | "integer" | "short" | "byte" => "lterms",
        "double" | "float" | "half_float" | "scaled_float" => "dterms",
        _ => "sterms",
    }
}

fn terms_buckets(sources: &[&Value], field: &str) -> Value {
    let mut counts: Vec<(Value, u64)> = Vec::new();
    for source in sources {
        let Some(value) = source.get(field).filter(|value| !value.is_null()) else {
            continue;
        };
        match counts.iter_mut().find(|(key, _)| key == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value.clone(), 1)),
        }
    }

    counts.sort_by(|(left_key, left_count), (right_key, right_count)| {
        right_count
            .cmp(left_count)
            .then_with(|| left_key.to_string().cmp(&right_key.to_string()))
    });

    let buckets = counts
        .into_iter()
        .map(|(key, count)| json!({"key": key, "doc_count": count}))
        .collect::<Vec<_>>();

    json!({"doc_count_error_upper_bound": 0, "sum_other_doc_count": 0, "buckets": buckets})
}
