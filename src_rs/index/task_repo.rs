// 목적:
// - PostgreSQL 기반 작업 큐 저장소를 제공한다.
//
// 설명:
// - claim은 `FOR UPDATE SKIP LOCKED` 하위 질의와 UPDATE ... RETURNING을 한 문장으로 실행한다.
//   같은 작업을 두 워커가 동시에 가져갈 수 없다.
// - 동일 created_at의 작업은 적재 순번(seq)으로 FIFO를 보장한다.
// - 종료 전이는 worker_id와 processing 상태를 모두 만족할 때만 적용한다.
//
// 디자인 패턴:
// - 저장소 패턴(Repository Pattern).
//
// 참조:
// - src_rs/core/queue.rs
// - src_rs/index/sql.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::core::config::PostgresConfig;
use crate::core::errors::{CoreError, CoreResult};
use crate::core::model::{Task, TaskOutcome, TaskStatus};
use crate::core::ports::TaskStore;

const TASK_COLUMNS: &str =
    "id, task_type, payload, status, worker_id, created_at, started_at, completed_at, error_message";

#[derive(Clone)]
pub struct PostgresTaskStore {
    pool: PgPool,
    task_table: String,
}

impl PostgresTaskStore {
    pub fn from_pool(pool: PgPool, config: &PostgresConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            pool,
            task_table: config.task_table.clone(),
        })
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    async fn insert_task(&self, task: &Task) -> CoreResult<()> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            self.task_table, TASK_COLUMNS
        );

        sqlx::query(&sql)
            .bind(task.id)
            .bind(&task.task_type)
            .bind(&task.payload)
            .bind(task.status.as_str())
            .bind(&task.worker_id)
            .bind(task.created_at)
            .bind(task.started_at)
            .bind(task.completed_at)
            .bind(&task.error_message)
            .execute(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("작업 적재 실패: {}", error)))?;

        Ok(())
    }

    async fn claim_oldest_pending(
        &self,
        worker_id: &str,
        now: DateTime<Utc>,
        lease_expired_before: Option<DateTime<Utc>>,
    ) -> CoreResult<Option<Task>> {
        let sql = format!(
            "UPDATE {table} SET status = 'processing', worker_id = $1, started_at = $2 \
             WHERE id = ( \
                 SELECT id FROM {table} \
                 WHERE status = 'pending' \
                    OR ($3::timestamptz IS NOT NULL AND status = 'processing' AND started_at < $3) \
                 ORDER BY created_at, seq \
                 FOR UPDATE SKIP LOCKED \
                 LIMIT 1 \
             ) \
             RETURNING {columns}",
            table = self.task_table,
            columns = TASK_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(worker_id)
            .bind(now)
            .bind(lease_expired_before)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("작업 claim 실패: {}", error)))?;

        row.map(map_task_row).transpose()
    }

    async fn finish_task(
        &self,
        task_id: Uuid,
        worker_id: &str,
        outcome: &TaskOutcome,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let sql = format!(
            "UPDATE {} SET status = $3, completed_at = $4, error_message = $5 \
             WHERE id = $1 AND worker_id = $2 AND status = 'processing'",
            self.task_table
        );

        let result = sqlx::query(&sql)
            .bind(task_id)
            .bind(worker_id)
            .bind(outcome.status().as_str())
            .bind(now)
            .bind(outcome.error_message())
            .execute(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("작업 종료 갱신 실패: {}", error)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_task(&self, task_id: Uuid) -> CoreResult<Option<Task>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            TASK_COLUMNS, self.task_table
        );

        let row = sqlx::query(&sql)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("작업 조회 실패: {}", error)))?;

        row.map(map_task_row).transpose()
    }
}

fn map_task_row(row: PgRow) -> CoreResult<Task> {
    let status = row
        .try_get::<String, _>("status")
        .map_err(|error| CoreError::Db(format!("task.status 파싱 실패: {}", error)))?;

    Ok(Task {
        id: row
            .try_get::<Uuid, _>("id")
            .map_err(|error| CoreError::Db(format!("task.id 파싱 실패: {}", error)))?,
        task_type: row
            .try_get::<String, _>("task_type")
            .map_err(|error| CoreError::Db(format!("task.task_type 파싱 실패: {}", error)))?,
        payload: row
            .try_get::<Value, _>("payload")
            .map_err(|error| CoreError::Db(format!("task.payload 파싱 실패: {}", error)))?,
        status: TaskStatus::parse(&status)?,
        worker_id: row
            .try_get::<Option<String>, _>("worker_id")
            .map_err(|error| CoreError::Db(format!("task.worker_id 파싱 실패: {}", error)))?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|error| CoreError::Db(format!("task.created_at 파싱 실패: {}", error)))?,
        started_at: row
            .try_get::<Option<DateTime<Utc>>, _>("started_at")
            .map_err(|error| CoreError::Db(format!("task.started_at 파싱 실패: {}", error)))?,
        completed_at: row
            .try_get::<Option<DateTime<Utc>>, _>("completed_at")
            .map_err(|error| CoreError::Db(format!("task.completed_at 파싱 실패: {}", error)))?,
        error_message: row
            .try_get::<Option<String>, _>("error_message")
            .map_err(|error| CoreError::Db(format!("task.error_message 파싱 실패: {}", error)))?,
    })
}
