// 목적:
// - 작업 큐를 폴링해 작업을 claim하고 유형별 핸들러로 실행하는 워커 루프를 제공한다.
//
// 설명:
// - 큐가 비어 있으면 idle backoff만큼 쉬고, 작업 실행 외부의 오류(연결 끊김 등)는
//   error backoff만큼 쉰 뒤 무기한 재시도한다.
// - claim한 작업마다 complete를 정확히 한 번 호출한다. 핸들러 오류와 panic도 failed로 기록한다.
// - 종료 신호는 작업 사이와 대기 중에만 확인하며, 실행 중인 작업은 끝까지 처리한다.
//
// 디자인 패턴:
// - 폴링 소비자(Polling Consumer) + 명령 디스패치(Command Dispatch).
//
// 참조:
// - src_rs/core/queue.rs
// - src_rs/core/ingestion_pipeline.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::config::WorkerConfig;
use crate::core::errors::{CoreError, CoreResult};
use crate::core::model::{Task, TaskOutcome};
use crate::core::queue::TaskQueue;

/// 특정 작업 유형의 본문을 실행한다.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: &Task) -> CoreResult<()>;
}

/// 작업 하나를 처리한 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkReport {
    pub task_id: Uuid,
    pub outcome: TaskOutcome,
}

pub struct Worker {
    queue: TaskQueue,
    worker_id: String,
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
    idle_backoff: Duration,
    error_backoff: Duration,
}

impl Worker {
    pub fn new(queue: TaskQueue, config: &WorkerConfig) -> CoreResult<Self> {
        config.validate()?;
        let worker_id = config
            .worker_id
            .clone()
            .unwrap_or_else(|| format!("worker-{}", Uuid::new_v4()));

        Ok(Self {
            queue,
            worker_id,
            handlers: HashMap::new(),
            idle_backoff: config.idle_backoff(),
            error_backoff: config.error_backoff(),
        })
    }

    pub fn register(mut self, task_type: impl Into<String>, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(task_type.into(), handler);
        self
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// 종료 신호가 올 때까지 작업을 처리한다.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(worker_id = %self.worker_id, handlers = ?self.handlers.keys().collect::<Vec<_>>(), "워커 시작");

        while !shutdown.is_cancelled() {
            let pause = match self.run_once().await {
                Ok(Some(_)) => continue,
                Ok(None) => self.idle_backoff,
                Err(error) => {
                    error!(
                        worker_id = %self.worker_id,
                        external = error.is_external(),
                        error = %error,
                        "워커 루프 오류, 재시도 대기"
                    );
                    self.error_backoff
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!(worker_id = %self.worker_id, "워커 종료");
    }

    /// 작업 하나를 claim해 실행하고 종료 상태를 기록한다. 대기 작업이 없으면 `None`.
    pub async fn run_once(&self) -> CoreResult<Option<WorkReport>> {
        let Some(task) = self.queue.claim(&self.worker_id).await? else {
            return Ok(None);
        };

        let outcome = self.execute(&task).await;
        if let TaskOutcome::Failed(message) = &outcome {
            warn!(task_id = %task.id, task_type = %task.task_type, error = %message, "작업 실행 실패");
        }

        match self
            .queue
            .complete(task.id, &self.worker_id, outcome.clone())
            .await
        {
            Ok(()) => {}
            // 이미 종료되었거나 lease가 만료되어 다른 워커가 가져간 작업이다. 기록만 하고 계속한다.
            Err(CoreError::QueueConsistency(_)) => {}
            Err(other) => return Err(other),
        }

        Ok(Some(WorkReport {
            task_id: task.id,
            outcome,
        }))
    }

    async fn execute(&self, task: &Task) -> TaskOutcome {
        let Some(handler) = self.handlers.get(&task.task_type).cloned() else {
            return TaskOutcome::Failed(
                CoreError::TaskExecution(format!(
                    "등록되지 않은 작업 유형입니다: {}",
                    task.task_type
                ))
                .to_string(),
            );
        };

        // 별도 태스크에서 실행해 핸들러 panic이 워커 루프를 멈추지 않게 한다.
        let owned = task.clone();
        let joined = tokio::spawn(async move { handler.handle(&owned).await }).await;

        match joined {
            Ok(Ok(())) => TaskOutcome::Completed,
            Ok(Err(error)) => TaskOutcome::Failed(error.to_string()),
            Err(join_error) => TaskOutcome::Failed(
                CoreError::TaskExecution(format!("작업 핸들러가 비정상 종료되었습니다: {}", join_error))
                    .to_string(),
            ),
        }
    }
}
