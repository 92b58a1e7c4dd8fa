// 목적:
// - 검색 엔진과 요청/응답을 주고받는 전송 계층 경계를 정의한다.
//
// 설명:
// - 클라이언트는 EngineTransport 트레이트만 알고, 실제 HTTP 호출은 HttpTransport가 담당한다.
// - 전송 실패는 Connection 오류로, HTTP 상태 해석은 상위(store_client)에서 처리한다.
//
// 디자인 패턴:
// - 어댑터(Adapter).
//
// 참조:
// - src_rs/index/store_client.rs
// - src_rs/core/config.rs

use reqwest::{header, Client, Method};
use serde_json::Value;
use std::future::Future;

use crate::core::config::{ClientConfigPayload, EngineAuthPayload};
use crate::core::errors::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMethod {
    Get,
    Head,
    Put,
    Post,
    Delete,
}

impl EngineMethod {
    fn to_reqwest(self) -> Method {
        match self {
            EngineMethod::Get => Method::GET,
            EngineMethod::Head => Method::HEAD,
            EngineMethod::Put => Method::PUT,
            EngineMethod::Post => Method::POST,
            EngineMethod::Delete => Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    /// `_bulk`용 줄 단위 JSON. 마지막 줄도 개행으로 끝나야 한다.
    NdJson(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineRequest {
    pub method: EngineMethod,
    /// 엔진 루트 기준 경로 (쿼리 문자열 포함).
    pub path: String,
    pub body: Option<RequestBody>,
}

impl EngineRequest {
    pub fn new(method: EngineMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn with_ndjson(mut self, body: String) -> Self {
        self.body = Some(RequestBody::NdJson(body));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResponse {
    pub status: u16,
    pub body: String,
}

impl EngineResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> CoreResult<Value> {
        serde_json::from_str(&self.body).map_err(|error| {
            CoreError::Decode(format!(
                "응답 JSON 파싱 실패: {}, status={}, body={}",
                error, self.status, self.body
            ))
        })
    }

    /// 엔진 오류 본문의 `error.type` (구버전은 `error` 문자열).
    pub fn error_type(&self) -> Option<String> {
        let value: Value = serde_json::from_str(&self.body).ok()?;
        let error = value.get("error")?;
        match error {
            Value::Object(_) => error.get("type").and_then(Value::as_str).map(str::to_string),
            Value::String(text) => Some(text.clone()),
            _ => None,
        }
    }

    /// 엔진 오류 본문의 `error.reason`. 없으면 본문 전체.
    pub fn error_reason(&self) -> String {
        serde_json::from_str::<Value>(&self.body)
            .ok()
            .and_then(|value| {
                value
                    .get("error")
                    .and_then(|error| error.get("reason"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| self.body.clone())
    }
}

/// 엔진으로 요청 하나를 보내고 응답 하나를 받는다.
pub trait EngineTransport: Send + Sync {
    fn send(&self, request: EngineRequest)
        -> impl Future<Output = CoreResult<EngineResponse>> + Send;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    auth: Option<EngineAuthPayload>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfigPayload) -> CoreResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|error| {
                CoreError::Connection(format!("HTTP 클라이언트 생성 실패: {}", error))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            auth: config.auth.clone(),
        })
    }
}

impl EngineTransport for HttpTransport {
    async fn send(&self, request: EngineRequest) -> CoreResult<EngineResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut request_builder = self.client.request(request.method.to_reqwest(), url.as_str());

        request_builder = match request.body {
            Some(RequestBody::Json(body)) => request_builder.json(&body),
            Some(RequestBody::NdJson(body)) => request_builder
                .header(header::CONTENT_TYPE, "application/x-ndjson")
                .body(body),
            None => request_builder,
        };

        request_builder = match self.auth.as_ref() {
            Some(EngineAuthPayload::Basic { username, password }) => {
                request_builder.basic_auth(username, Some(password))
            }
            Some(EngineAuthPayload::Bearer { token }) => request_builder.bearer_auth(token),
            None => request_builder,
        };

        let response = request_builder.send().await.map_err(|error| {
            CoreError::Connection(format!(
                "엔진 HTTP 요청 실패: {:?} {}: {}",
                request.method, url, error
            ))
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|error| {
            CoreError::Connection(format!("엔진 HTTP 본문 읽기 실패: {}: {}", url, error))
        })?;

        Ok(EngineResponse { status, body })
    }
}
