// 목적:
// - bulk 요청(NDJSON) 인코딩과 bulk 응답의 항목별 결과 디코딩을 담당한다.
//
// 설명:
// - 배치 전체를 먼저 검증하고, 하나라도 잘못되면 아무것도 보내지 않는다.
// - 엔진 응답은 원자적이지 않으므로 항목별 성공/실패 목록으로 돌려준다.
//
// 참조:
// - src_rs/index/store_client.rs

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::core::errors::{CoreError, CoreResult};
use crate::schema::document::{DocumentId, IndexedDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkActionKind {
    Index,
    Delete,
}

impl BulkActionKind {
    fn as_str(&self) -> &'static str {
        match self {
            BulkActionKind::Index => "index",
            BulkActionKind::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemResult {
    pub id: DocumentId,
    pub action: BulkActionKind,
    pub status: u16,
    pub error: Option<String>,
}

impl BulkItemResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }
}

/// 요청 순서대로 정렬된 항목별 결과.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
    pub items: Vec<BulkItemResult>,
}

impl BulkReport {
    pub fn has_failures(&self) -> bool {
        self.items.iter().any(|item| !item.is_success())
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &BulkItemResult> {
        self.items.iter().filter(|item| item.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &BulkItemResult> {
        self.items.iter().filter(|item| !item.is_success())
    }
}

pub(crate) fn encode_index_actions<D: IndexedDocument>(
    index_name: &str,
    documents: &[D],
) -> CoreResult<String> {
    ensure_unique(documents.iter().map(D::document_id))?;

    let mut payload = String::new();
    for document in documents {
        document.validate()?;

        let source = serde_json::to_string(document).map_err(|error| {
            CoreError::Validation(format!(
                "문서 직렬화 실패: id={}, {}",
                document.document_id(),
                error
            ))
        })?;

        push_action_line(&mut payload, BulkActionKind::Index, index_name, document.document_id());
        payload.push_str(&source);
        payload.push('\n');
    }
    Ok(payload)
}

pub(crate) fn encode_delete_actions(index_name: &str, ids: &[DocumentId]) -> CoreResult<String> {
    ensure_unique(ids.iter().copied())?;

    let mut payload = String::new();
    for id in ids {
        push_action_line(&mut payload, BulkActionKind::Delete, index_name, *id);
    }
    Ok(payload)
}

fn push_action_line(
    payload: &mut String,
    action: BulkActionKind,
    index_name: &str,
    id: DocumentId,
) {
    let line = json!({ action.as_str(): { "_index": index_name, "_id": id.to_string() } });
    payload.push_str(&line.to_string());
    payload.push('\n');
}

fn ensure_unique(ids: impl Iterator<Item = DocumentId>) -> CoreResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CoreError::Validation(format!(
                "한 배치 안에 같은 id가 두 번 들어 있습니다: {}",
                id
            )));
        }
    }
    Ok(())
}

/// `_bulk` 응답의 `items`를 항목별 결과로 변환한다.
pub(crate) fn decode_bulk_response(raw: &Value, expected_len: usize) -> CoreResult<BulkReport> {
    let items = raw
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::Decode("bulk 응답에 items가 없습니다".to_string()))?;

    if items.len() != expected_len {
        return Err(CoreError::Decode(format!(
            "bulk 응답 항목 수가 요청과 다릅니다: expected={}, actual={}",
            expected_len,
            items.len()
        )));
    }

    let results = items
        .iter()
        .map(decode_bulk_item)
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(BulkReport { items: results })
}

fn decode_bulk_item(item: &Value) -> CoreResult<BulkItemResult> {
    let (action_name, body) = item
        .as_object()
        .and_then(|object| object.iter().next())
        .ok_or_else(|| CoreError::Decode(format!("bulk 항목 형식이 올바르지 않습니다: {}", item)))?;

    let action = match action_name.as_str() {
        "index" | "create" | "update" => BulkActionKind::Index,
        "delete" => BulkActionKind::Delete,
        other => {
            return Err(CoreError::Decode(format!(
                "알 수 없는 bulk 동작입니다: {}",
                other
            )))
        }
    };

    let id = body
        .get("_id")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<DocumentId>().ok())
        .ok_or_else(|| CoreError::Decode(format!("bulk 항목의 _id를 읽을 수 없습니다: {}", body)))?;

    let status = body
        .get("status")
        .and_then(Value::as_u64)
        .and_then(|status| u16::try_from(status).ok())
        .ok_or_else(|| CoreError::Decode(format!("bulk 항목의 status를 읽을 수 없습니다: {}", body)))?;

    let error = body.get("error").map(|error| match error {
        Value::String(text) => text.clone(),
        other => {
            let kind = other.get("type").and_then(Value::as_str).unwrap_or("unknown");
            let reason = other.get("reason").and_then(Value::as_str).unwrap_or("");
            format!("{}: {}", kind, reason)
        }
    });

    Ok(BulkItemResult {
        id,
        action,
        status,
        error,
    })
}
