// 목적:
// - tracing 구독자 초기화를 한곳에서 제공한다.
//
// 설명:
// - RUST_LOG가 있으면 그 필터를, 없으면 인자로 받은 기본 필터를 사용한다.
// - 이미 구독자가 설치된 경우(Python 호스트 재초기화 등)는 오류로 보지 않는다.
//
// 디자인 패턴:
// - 초기화 함수(Initializer).
//
// 참조:
// - src_rs/bin/worker.rs
// - src_rs/api/search_bridge.rs

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "info,sqlx=warn";

pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
