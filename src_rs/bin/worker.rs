// 목적:
// - 적재 작업 큐를 소비하는 워커 프로세스 진입점을 제공한다.
//
// 설명:
// - 설정 경로는 첫 번째 인자 또는 KC_CONFIG 환경 변수에서 읽는다.
// - Ctrl-C를 받으면 진행 중인 작업을 마친 뒤 루프를 멈추고 커넥션 풀을 닫는다.
//
// 디자인 패턴:
// - 컴포지션 루트(Composition Root).
//
// 참조:
// - src_rs/core/context.rs
// - src_rs/core/worker.rs

use std::process::ExitCode;

use knowledge_capture::core::config::AppConfig;
use knowledge_capture::core::context::AppContext;
use knowledge_capture::core::errors::{CoreError, CoreResult};
use knowledge_capture::telemetry::{init_tracing, DEFAULT_LOG_FILTER};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const CONFIG_ENV: &str = "KC_CONFIG";

fn main() -> ExitCode {
    init_tracing(DEFAULT_LOG_FILTER);

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(error = %error, "워커 비정상 종료");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CoreResult<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .ok_or_else(|| {
            CoreError::InvalidConfig(format!(
                "설정 파일 경로가 필요합니다: 첫 번째 인자 또는 {}",
                CONFIG_ENV
            ))
        })?;
    let config = AppConfig::from_path(&config_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|error| CoreError::Runtime(format!("Tokio 런타임 생성 실패: {}", error)))?;

    runtime.block_on(async move {
        let context = AppContext::connect(config).await?;
        let worker = context.worker()?;

        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            if let Err(error) = tokio::signal::ctrl_c().await {
                warn!(error = %error, "종료 신호 대기 실패");
            }
            signal_token.cancel();
        });

        info!(worker_id = worker.worker_id(), config = %config_path, "워커 프로세스 준비 완료");
        worker.run(shutdown).await;
        context.close().await;
        Ok(())
    })
}
