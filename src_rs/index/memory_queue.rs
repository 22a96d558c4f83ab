// 목적:
// - 프로세스 내부 작업 큐 저장소를 제공한다.
//
// 설명:
// - 단일 뮤텍스 안에서 선택과 상태 전이를 함께 수행하므로 claim이 원자적이다.
// - 적재 순번으로 FIFO를 보장한다. 테스트와 단일 프로세스 배포에서 사용한다.
//
// 디자인 패턴:
// - 저장소 패턴(Repository Pattern).
//
// 참조:
// - src_rs/index/task_repo.rs

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::errors::{CoreError, CoreResult};
use crate::core::model::{Task, TaskOutcome, TaskStatus};
use crate::core::ports::TaskStore;

#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CoreResult<MutexGuard<'_, Vec<Task>>> {
        self.tasks
            .lock()
            .map_err(|_| CoreError::Runtime("작업 저장소 잠금 획득 실패".to_string()))
    }
}

fn is_claimable(task: &Task, lease_expired_before: Option<DateTime<Utc>>) -> bool {
    match task.status {
        TaskStatus::Pending => true,
        TaskStatus::Processing => match (lease_expired_before, task.started_at) {
            (Some(cutoff), Some(started_at)) => started_at < cutoff,
            _ => false,
        },
        _ => false,
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert_task(&self, task: &Task) -> CoreResult<()> {
        let mut tasks = self.lock()?;
        if tasks.iter().any(|existing| existing.id == task.id) {
            return Err(CoreError::QueueConsistency(format!(
                "이미 존재하는 작업 id입니다: {}",
                task.id
            )));
        }
        tasks.push(task.clone());
        Ok(())
    }

    async fn claim_oldest_pending(
        &self,
        worker_id: &str,
        now: DateTime<Utc>,
        lease_expired_before: Option<DateTime<Utc>>,
    ) -> CoreResult<Option<Task>> {
        let mut tasks = self.lock()?;

        // Vec 위치가 적재 순번이므로 min_by_key는 created_at 동률에서 먼저 적재된 작업을 고른다.
        let oldest = tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| is_claimable(task, lease_expired_before))
            .min_by_key(|(position, task)| (task.created_at, *position))
            .map(|(position, _)| position);

        let Some(position) = oldest else {
            return Ok(None);
        };

        let task = &mut tasks[position];
        task.status = TaskStatus::Processing;
        task.worker_id = Some(worker_id.to_string());
        task.started_at = Some(now);
        Ok(Some(task.clone()))
    }

    async fn finish_task(
        &self,
        task_id: Uuid,
        worker_id: &str,
        outcome: &TaskOutcome,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let mut tasks = self.lock()?;
        let Some(task) = tasks.iter_mut().find(|task| {
            task.id == task_id
                && task.status == TaskStatus::Processing
                && task.worker_id.as_deref() == Some(worker_id)
        }) else {
            return Ok(false);
        };

        task.status = outcome.status();
        task.completed_at = Some(now);
        task.error_message = outcome.error_message().map(str::to_string);
        Ok(true)
    }

    async fn get_task(&self, task_id: Uuid) -> CoreResult<Option<Task>> {
        Ok(self.lock()?.iter().find(|task| task.id == task_id).cloned())
    }
}
