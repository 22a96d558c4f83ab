// 목적:
// - 검색 결과 항목, 코퍼스 범위, 작업(Task) 레코드 등 코어 데이터 모델을 정의한다.
//
// 설명:
// - RetrievalItem의 relevance_score는 전략별 척도이며 융합/재정렬 단계에서만 갱신된다.
// - Task 상태는 pending -> processing -> {completed, failed} 순으로만 이동한다.
//
// 디자인 패턴:
// - 값 객체(Value Object).
//
// 참조:
// - src_rs/core/fusion.rs
// - src_rs/core/queue.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::errors::{CoreError, CoreResult};

/// 검색기가 반환하는 단일 항목이다. 동일성은 `id`로 판단한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalItem {
    pub id: String,
    pub source_document_id: String,
    pub content: String,
    pub relevance_score: f64,
    #[serde(default)]
    pub attributes: Value,
}

/// 0부터 시작하는 순위를 가진 정렬 목록이다.
pub type RankedList = Vec<RetrievalItem>;

/// 검색 대상 코퍼스의 범위.
///
/// 테넌트 간 검색은 `AllTenants`로 명시해야 하며 기본값은 존재하지 않는다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "owner", rename_all = "snake_case")]
pub enum CorpusScope {
    Tenant(String),
    AllTenants,
}

impl CorpusScope {
    pub fn tenant(owner: impl Into<String>) -> Self {
        CorpusScope::Tenant(owner.into())
    }

    /// 저장소 필터에 바인딩할 소유자 값. 전체 검색이면 `None`이다.
    pub fn owner(&self) -> Option<&str> {
        match self {
            CorpusScope::Tenant(owner) => Some(owner.as_str()),
            CorpusScope::AllTenants => None,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if let CorpusScope::Tenant(owner) = self {
            if owner.trim().is_empty() {
                return Err(CoreError::InvalidInput(
                    "corpus scope 소유자는 비어 있을 수 없습니다".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> CoreResult<Self> {
        match value {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(CoreError::Serialization(format!(
                "알 수 없는 작업 상태입니다: {}",
                other
            ))),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// 작업 큐에 적재되는 작업 레코드다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub task_type: String,
    pub payload: Value,
    pub status: TaskStatus,
    pub worker_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl Task {
    pub fn new_pending(task_type: impl Into<String>, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_type: task_type.into(),
            payload,
            status: TaskStatus::Pending,
            worker_id: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }
}

pub const UNSPECIFIED_FAILURE_MESSAGE: &str = "작업이 실패했습니다 (오류 메시지 없음)";

/// 작업의 종료 결과. 실패는 항상 오류 메시지를 동반한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Failed(String),
}

impl TaskOutcome {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskOutcome::Completed => TaskStatus::Completed,
            TaskOutcome::Failed(_) => TaskStatus::Failed,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            TaskOutcome::Completed => None,
            TaskOutcome::Failed(message) => Some(message.as_str()),
        }
    }

    /// 빈 실패 메시지를 기본 메시지로 바꾼다. failed 작업은 항상 원인을 남겨야 한다.
    pub fn with_message_fallback(self) -> Self {
        match self {
            TaskOutcome::Failed(message) if message.trim().is_empty() => {
                TaskOutcome::Failed(UNSPECIFIED_FAILURE_MESSAGE.to_string())
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> CoreResult<Self> {
        match value {
            "pending" => Ok(DocumentStatus::Pending),
            "completed" => Ok(DocumentStatus::Completed),
            "failed" => Ok(DocumentStatus::Failed),
            other => Err(CoreError::Serialization(format!(
                "알 수 없는 문서 상태입니다: {}",
                other
            ))),
        }
    }
}

/// 업로드된 원본 문서의 카탈로그 레코드다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub owner: String,
    pub filename: String,
    pub blob_handle: String,
    pub file_size: i64,
    pub content_type: String,
    pub status: DocumentStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 적재 시 코퍼스에 삽입되는 청크 레코드다.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    pub chunk_id: Uuid,
    pub document_id: String,
    pub owner: String,
    pub chunk_index: i32,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: Value,
}
