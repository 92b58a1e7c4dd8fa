// 목적:
// - 검색 엔진 클라이언트 설정 페이로드를 정의한다.
//
// 설명:
// - JSON으로 전달되는 설정을 역직렬화하고, 누락 필드는 기본값으로 채운다.
// - 연결 전에 설정값을 검증해 잘못된 URL/타임아웃을 조기에 차단한다.
//
// 디자인 패턴:
// - 설정 페이로드(Config Payload) + 실패 빠르게(Fail Fast).
//
// 참조:
// - src_rs/index/transport.rs
// - src_rs/api/item_repository.rs

use serde::{Deserialize, Serialize};

use crate::core::errors::{CoreError, CoreResult};

/// 검색 엔진 인증 방식이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineAuthPayload {
    Basic { username: String, password: String },
    Bearer { token: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfigPayload {
    /// 엔진 루트 URL (예: `http://localhost:9200`).
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub auth: Option<EngineAuthPayload>,

    /// bulk 쓰기 직후 검색에 반영되도록 `refresh=true`를 붙인다.
    #[serde(default = "default_refresh_on_write")]
    pub refresh_on_write: bool,

    /// 파생 조회(`find_by_price_between`)가 한 번에 가져오는 최대 문서 수.
    #[serde(default = "default_derived_query_limit")]
    pub derived_query_limit: i64,
}

fn default_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_refresh_on_write() -> bool {
    true
}

fn default_derived_query_limit() -> i64 {
    1_000
}

impl Default for ClientConfigPayload {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_ms: default_timeout_ms(),
            auth: None,
            refresh_on_write: default_refresh_on_write(),
            derived_query_limit: default_derived_query_limit(),
        }
    }
}

impl ClientConfigPayload {
    /// JSON 문자열에서 설정을 읽고 검증한다.
    pub fn from_json(raw: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|error| {
            CoreError::InvalidConfig(format!("설정 JSON 파싱에 실패했습니다: {}", error))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(CoreError::InvalidConfig(
                "url은 비어 있을 수 없습니다".to_string(),
            ));
        }

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::InvalidConfig(format!(
                "url은 http:// 또는 https://로 시작해야 합니다: {}",
                url
            )));
        }

        if self.timeout_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "timeout_ms는 1 이상이어야 합니다".to_string(),
            ));
        }

        if self.derived_query_limit <= 0 {
            return Err(CoreError::InvalidConfig(
                "derived_query_limit은 1 이상이어야 합니다".to_string(),
            ));
        }

        Ok(())
    }

    /// 끝의 `/`를 제거한 엔진 루트 URL.
    pub fn base_url(&self) -> &str {
        self.url.trim().trim_end_matches('/')
    }
}
