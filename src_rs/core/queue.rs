// 목적:
// - 적재 작업을 위한 영속 작업 큐(push / claim / complete)를 제공한다.
//
// 설명:
// - claim은 저장소의 단일 원자 연산에 위임한다. 조회와 갱신을 나눠 구현하지 않는다.
// - complete는 해당 워커가 소유한 processing 작업만 종료 상태로 바꾼다.
//   그 외 호출은 QueueConsistency 오류로 거부하며, 호출자는 이를 기록만 하고 계속 진행한다.
// - lease가 설정되면 시작 후 lease가 지난 processing 작업도 claim 대상이 된다.
//
// 디자인 패턴:
// - 저장소 패턴(Repository Pattern) 위의 서비스 계층.
//
// 참조:
// - src_rs/index/task_repo.rs
// - src_rs/index/memory_queue.rs
// - src_rs/core/worker.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::errors::{CoreError, CoreResult};
use crate::core::model::{Task, TaskOutcome};
use crate::core::ports::TaskStore;

#[derive(Clone)]
pub struct TaskQueue {
    store: Arc<dyn TaskStore>,
    lease: Option<chrono::Duration>,
}

impl TaskQueue {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store, lease: None }
    }

    /// claim 후 완료 없이 `lease`가 지난 작업을 다시 claim할 수 있게 한다.
    pub fn with_lease(mut self, lease: Option<Duration>) -> CoreResult<Self> {
        self.lease = match lease {
            Some(lease) => Some(chrono::Duration::from_std(lease).map_err(|error| {
                CoreError::InvalidConfig(format!("queue lease 변환 실패: {}", error))
            })?),
            None => None,
        };
        Ok(self)
    }

    pub async fn push(&self, task_type: &str, payload: Value) -> CoreResult<Task> {
        if task_type.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "task_type은 비어 있을 수 없습니다".to_string(),
            ));
        }

        let task = Task::new_pending(task_type, payload);
        self.store.insert_task(&task).await?;
        debug!(task_id = %task.id, task_type, "작업 적재");
        Ok(task)
    }

    /// 가장 오래된 대기 작업을 원자적으로 가져온다. 대기 작업이 없으면 `None`.
    pub async fn claim(&self, worker_id: &str) -> CoreResult<Option<Task>> {
        if worker_id.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "worker_id는 비어 있을 수 없습니다".to_string(),
            ));
        }

        let now = Utc::now();
        let lease_expired_before = self.lease.map(|lease| now - lease);
        let claimed = self
            .store
            .claim_oldest_pending(worker_id, now, lease_expired_before)
            .await?;

        if let Some(task) = claimed.as_ref() {
            info!(task_id = %task.id, task_type = %task.task_type, worker_id, "작업 claim");
        }
        Ok(claimed)
    }

    pub async fn complete(
        &self,
        task_id: Uuid,
        worker_id: &str,
        outcome: TaskOutcome,
    ) -> CoreResult<()> {
        let outcome = outcome.with_message_fallback();
        let applied = self
            .store
            .finish_task(task_id, worker_id, &outcome, Utc::now())
            .await?;

        if !applied {
            let error = CoreError::QueueConsistency(format!(
                "processing 상태가 아니거나 다른 워커가 소유한 작업입니다: task_id={}, worker_id={}",
                task_id, worker_id
            ));
            warn!(error = %error, "작업 종료 요청 거부");
            return Err(error);
        }

        info!(
            %task_id,
            worker_id,
            status = outcome.status().as_str(),
            "작업 종료"
        );
        Ok(())
    }

    pub async fn get(&self, task_id: Uuid) -> CoreResult<Option<Task>> {
        self.store.get_task(task_id).await
    }
}
