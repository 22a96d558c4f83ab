// 목적:
// - 코어 파이프라인이 의존하는 외부 협력자 경계를 트레이트로 정의한다.
//
// 설명:
// - 코퍼스 저장소, 문서 카탈로그, 작업 저장소, 블롭 저장소, 임베딩/재정렬/생성 제공자를 분리한다.
// - 실제 구현은 index/ 및 providers/ 계층에 있고, 테스트는 가짜 구현을 주입한다.
//
// 디자인 패턴:
// - 어댑터(Adapter) + 의존성 주입(Dependency Injection).
//
// 참조:
// - src_rs/index/postgres_repo.rs
// - src_rs/index/task_repo.rs
// - src_rs/providers/mod.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::CoreResult;
use crate::core::model::{
    ChunkRecord, CorpusScope, DocumentRecord, DocumentStatus, RankedList, Task, TaskOutcome,
};

/// 유사도 검색과 전문 검색을 제공하는 코퍼스 저장소.
///
/// `scope`가 테넌트이면 두 검색 모두 소유자 동등 필터를 반드시 적용해야 한다.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    async fn similarity_search(
        &self,
        embedding: &[f32],
        scope: &CorpusScope,
        limit: usize,
    ) -> CoreResult<RankedList>;

    async fn text_search(
        &self,
        query: &str,
        scope: &CorpusScope,
        limit: usize,
    ) -> CoreResult<RankedList>;

    async fn insert_chunks(&self, chunks: &[ChunkRecord]) -> CoreResult<u64>;

    async fn delete_chunks_by_document(&self, document_id: &str) -> CoreResult<u64>;
}

#[async_trait]
pub trait DocumentCatalog: Send + Sync {
    async fn insert_document(&self, document: &DocumentRecord) -> CoreResult<()>;

    async fn get_document(&self, document_id: Uuid) -> CoreResult<Option<DocumentRecord>>;

    async fn update_document_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
        error_message: Option<&str>,
    ) -> CoreResult<()>;

    /// 소유자의 문서를 최신순으로 반환한다.
    async fn list_documents(&self, owner: &str) -> CoreResult<Vec<DocumentRecord>>;

    async fn delete_document(&self, document_id: Uuid) -> CoreResult<u64>;
}

/// 작업 큐의 영속 계층.
///
/// `claim_oldest_pending`은 선택과 상태 변경이 분리되지 않는 단일 원자 연산이어야 한다.
/// 조회 후 갱신으로 흉내 내면 두 워커가 같은 작업을 pending으로 관측할 수 있다.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: &Task) -> CoreResult<()>;

    /// 가장 오래된 pending 작업(또는 `lease_expired_before` 이전에 시작된 processing 작업)을
    /// processing으로 전이하고 반환한다. 대상이 없으면 `None`.
    async fn claim_oldest_pending(
        &self,
        worker_id: &str,
        now: DateTime<Utc>,
        lease_expired_before: Option<DateTime<Utc>>,
    ) -> CoreResult<Option<Task>>;

    /// `worker_id`가 소유한 processing 작업만 종료 상태로 전이한다. 전이 여부를 반환한다.
    async fn finish_task(
        &self,
        task_id: Uuid,
        worker_id: &str,
        outcome: &TaskOutcome,
        now: DateTime<Utc>,
    ) -> CoreResult<bool>;

    async fn get_task(&self, task_id: Uuid) -> CoreResult<Option<Task>>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, filename: &str, content: &[u8]) -> CoreResult<String>;

    async fn download(&self, handle: &str) -> CoreResult<Vec<u8>>;

    async fn delete(&self, handle: &str) -> CoreResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingMode {
    Document,
    Query,
}

impl EmbeddingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EmbeddingMode::Document => "document",
            EmbeddingMode::Query => "query",
        }
    }
}

/// 입력 텍스트마다 고정 차원 벡터 하나를 반환한다.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String], mode: EmbeddingMode) -> CoreResult<Vec<Vec<f32>>>;
}

/// 재정렬 제공자. 반환값은 (원본 인덱스, 관련도) 쌍을 관련도 내림차순으로 담는다.
#[async_trait]
pub trait RerankProvider: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> CoreResult<Vec<(usize, f64)>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> CoreResult<String>;
}
