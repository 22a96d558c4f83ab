// 목적:
// - 런타임 전체 설정 구조체와 검증 로직을 정의한다.
//
// 설명:
// - 전역 설정 싱글턴 대신 AppConfig 값을 생성 시점에 주입한다.
// - JSON 문서에서 읽으며, 생략 가능한 값은 serde 기본값으로 채운다.
// - 0/빈 값은 InvalidConfig로 거부한다.
//
// 디자인 패턴:
// - 설정 객체(Configuration Object) + 실패 빠르게(Fail Fast).
//
// 참조:
// - src_rs/core/context.rs
// - src_rs/index/sql.rs

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{CoreError, CoreResult};
use crate::core::fusion::DEFAULT_RRF_K;
use crate::index::sql::validate_identifier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub dsn: String,
    #[serde(default = "default_chunk_table")]
    pub chunk_table: String,
    #[serde(default = "default_document_table")]
    pub document_table: String,
    #[serde(default = "default_task_table")]
    pub task_table: String,
    #[serde(default = "default_blob_table")]
    pub blob_table: String,
    #[serde(default = "default_pool_min")]
    pub pool_min: u32,
    #[serde(default = "default_pool_max")]
    pub pool_max: u32,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
    /// 전문 검색에 사용할 PostgreSQL text search configuration 이름.
    #[serde(default = "default_text_search_config")]
    pub text_search_config: String,
    /// 시작 시 IF NOT EXISTS DDL을 실행할지 여부.
    #[serde(default)]
    pub ensure_schema: bool,
}

/// 외부 HTTP 제공자(임베딩/재정렬/생성) 공통 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHttpConfig {
    pub url: String,
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
    pub auth_token: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_rrf_k")]
    pub rrf_k: u32,
    /// 분기 하나가 저장소에 요청하는 후보 수.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
    /// 재정렬 전에 확보하는 후보 수. 최종 limit보다 작으면 limit을 사용한다.
    #[serde(default = "default_rerank_candidates")]
    pub rerank_candidates: usize,
    #[serde(default = "default_result_limit")]
    pub default_limit: usize,
    /// 답변 생성 시 문맥으로 넣는 상위 항목 수.
    #[serde(default = "default_answer_context_items")]
    pub answer_context_items: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rrf_k: default_rrf_k(),
            candidate_limit: default_candidate_limit(),
            rerank_candidates: default_rerank_candidates(),
            default_limit: default_result_limit(),
            answer_context_items: default_answer_context_items(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueConfig {
    /// 설정하면 시작 후 이 시간이 지난 processing 작업을 다시 claim할 수 있다.
    pub lease_ms: Option<u64>,
}

impl QueueConfig {
    pub fn lease(&self) -> Option<Duration> {
        self.lease_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub worker_id: Option<String>,
    #[serde(default = "default_idle_backoff_ms")]
    pub idle_backoff_ms: u64,
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: None,
            idle_backoff_ms: default_idle_backoff_ms(),
            error_backoff_ms: default_error_backoff_ms(),
        }
    }
}

impl WorkerConfig {
    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub postgres: PostgresConfig,
    pub embedding: ProviderHttpConfig,
    pub rerank: Option<ProviderHttpConfig>,
    pub generation: ProviderHttpConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
}

impl AppConfig {
    pub fn from_json_str(raw: &str) -> CoreResult<Self> {
        let config: AppConfig = serde_json::from_str(raw).map_err(|error| {
            CoreError::Serialization(format!("설정 JSON 파싱 실패: {}", error))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|error| {
            CoreError::InvalidConfig(format!(
                "설정 파일을 읽을 수 없습니다: path={}, error={}",
                path.display(),
                error
            ))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.postgres.validate()?;
        self.embedding.validate("embedding")?;
        if let Some(rerank) = self.rerank.as_ref() {
            rerank.validate("rerank")?;
        }
        self.generation.validate("generation")?;
        self.search.validate()?;
        self.queue.validate()?;
        self.worker.validate()?;
        self.ingestion.validate()
    }
}

impl PostgresConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.dsn.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "postgres.dsn은 비어 있을 수 없습니다".to_string(),
            ));
        }
        validate_identifier(&self.chunk_table, "postgres.chunk_table")?;
        validate_identifier(&self.document_table, "postgres.document_table")?;
        validate_identifier(&self.task_table, "postgres.task_table")?;
        validate_identifier(&self.blob_table, "postgres.blob_table")?;
        validate_identifier(&self.text_search_config, "postgres.text_search_config")?;

        if self.pool_max == 0 {
            return Err(CoreError::InvalidConfig(
                "postgres.pool_max는 1 이상이어야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

impl ProviderHttpConfig {
    pub fn validate(&self, section: &str) -> CoreResult<()> {
        if self.url.trim().is_empty() {
            return Err(CoreError::InvalidConfig(format!(
                "{}.url은 비어 있을 수 없습니다",
                section
            )));
        }
        if self.timeout_ms == 0 {
            return Err(CoreError::InvalidConfig(format!(
                "{}.timeout_ms는 1 이상이어야 합니다",
                section
            )));
        }
        Ok(())
    }
}

impl SearchConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.rrf_k == 0 {
            return Err(CoreError::InvalidConfig(
                "search.rrf_k는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.candidate_limit == 0 {
            return Err(CoreError::InvalidConfig(
                "search.candidate_limit은 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.default_limit == 0 {
            return Err(CoreError::InvalidConfig(
                "search.default_limit은 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.answer_context_items == 0 {
            return Err(CoreError::InvalidConfig(
                "search.answer_context_items는 1 이상이어야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

impl QueueConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.lease_ms == Some(0) {
            return Err(CoreError::InvalidConfig(
                "queue.lease_ms는 1 이상이어야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(worker_id) = self.worker_id.as_ref() {
            if worker_id.trim().is_empty() {
                return Err(CoreError::InvalidConfig(
                    "worker.worker_id는 비어 있을 수 없습니다".to_string(),
                ));
            }
        }
        if self.idle_backoff_ms == 0 || self.error_backoff_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "worker backoff 값은 1 이상이어야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

impl IngestionConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.chunk_size == 0 {
            return Err(CoreError::InvalidConfig(
                "ingestion.chunk_size는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(CoreError::InvalidConfig(format!(
                "ingestion.chunk_overlap은 chunk_size보다 작아야 합니다: overlap={}, size={}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

fn default_chunk_table() -> String {
    "chunks".to_string()
}

fn default_document_table() -> String {
    "documents".to_string()
}

fn default_task_table() -> String {
    "tasks".to_string()
}

fn default_blob_table() -> String {
    "blobs".to_string()
}

fn default_pool_min() -> u32 {
    1
}

fn default_pool_max() -> u32 {
    10
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_statement_timeout_ms() -> u64 {
    30_000
}

fn default_text_search_config() -> String {
    "simple".to_string()
}

fn default_provider_timeout_ms() -> u64 {
    30_000
}

fn default_rrf_k() -> u32 {
    DEFAULT_RRF_K
}

fn default_candidate_limit() -> usize {
    20
}

fn default_rerank_candidates() -> usize {
    50
}

fn default_result_limit() -> usize {
    20
}

fn default_answer_context_items() -> usize {
    5
}

fn default_idle_backoff_ms() -> u64 {
    1_000
}

fn default_error_backoff_ms() -> u64 {
    5_000
}

fn default_chunk_size() -> usize {
    1_000
}

fn default_chunk_overlap() -> usize {
    200
}
