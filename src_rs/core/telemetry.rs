// 목적:
// - tracing 구독자를 초기화한다.
//
// 설명:
// - RUST_LOG가 있으면 그대로 쓰고, 없으면 전달받은 기본 필터를 사용한다.
// - 이미 전역 구독자가 설치된 경우(테스트 병렬 실행 등)는 조용히 넘어간다.
//
// 참조:
// - src_rs/index/store_client.rs

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 전역 tracing 구독자를 설치한다. 두 번째 호출부터는 아무 일도 하지 않는다.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
