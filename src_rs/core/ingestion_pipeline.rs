// 목적:
// - 문서 적재 요청 접수와 비동기 적재 작업 실행을 담당한다.
//
// 설명:
// - 접수: 블롭 업로드 -> 문서 카탈로그 등록(pending) -> "ingestion" 작업 적재.
//   중간 단계가 실패하면 업로드한 블롭을 회수하고, 등록된 문서는 failed로 남긴다.
// - 실행: 블롭 다운로드 -> 청킹 -> document 모드 임베딩 -> 청크 일괄 삽입 -> 문서 completed.
//   실패 시 문서를 failed로 표시하고 오류를 워커에 돌려준다.
// - 같은 작업이 다시 실행되어도 청크가 중복되지 않도록 삽입 전에 기존 청크를 지운다.
//
// 디자인 패턴:
// - 명령 패턴(Command) 기반 작업 핸들러.
//
// 참조:
// - src_rs/core/worker.rs
// - src_rs/core/queue.rs
// - src_rs/index/postgres_repo.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::chunker::DocumentChunker;
use crate::core::errors::{CoreError, CoreResult};
use crate::core::model::{ChunkRecord, DocumentRecord, DocumentStatus, Task};
use crate::core::ports::{BlobStore, CorpusStore, DocumentCatalog, Embedder, EmbeddingMode};
use crate::core::queue::TaskQueue;
use crate::core::worker::TaskHandler;

pub const INGESTION_TASK_TYPE: &str = "ingestion";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionTaskPayload {
    pub document_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedIngestion {
    pub document_id: Uuid,
    pub task_id: Uuid,
}

/// 적재 요청을 접수하고 문서 수명주기를 관리한다.
#[derive(Clone)]
pub struct IngestionService {
    blobs: Arc<dyn BlobStore>,
    catalog: Arc<dyn DocumentCatalog>,
    corpus: Arc<dyn CorpusStore>,
    queue: TaskQueue,
}

impl IngestionService {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        catalog: Arc<dyn DocumentCatalog>,
        corpus: Arc<dyn CorpusStore>,
        queue: TaskQueue,
    ) -> Self {
        Self {
            blobs,
            catalog,
            corpus,
            queue,
        }
    }

    pub async fn submit_file(
        &self,
        owner: &str,
        filename: &str,
        content_type: &str,
        content: &[u8],
    ) -> CoreResult<SubmittedIngestion> {
        if owner.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "owner는 비어 있을 수 없습니다".to_string(),
            ));
        }
        if filename.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "filename은 비어 있을 수 없습니다".to_string(),
            ));
        }

        let blob_handle = self.blobs.upload(filename, content).await?;
        let document = DocumentRecord {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            filename: filename.to_string(),
            blob_handle,
            file_size: content.len() as i64,
            content_type: content_type.to_string(),
            status: DocumentStatus::Pending,
            error_message: None,
            created_at: Utc::now(),
        };
        if let Err(error) = self.catalog.insert_document(&document).await {
            self.discard_blob(&document.blob_handle).await;
            return Err(error);
        }

        let task = match self.enqueue(document.id).await {
            Ok(task) => task,
            Err(error) => {
                // 작업이 없으면 문서는 영원히 pending이므로 실패로 남기고 블롭을 회수한다.
                self.discard_blob(&document.blob_handle).await;
                let message = error.to_string();
                if let Err(mark_error) = self
                    .catalog
                    .update_document_status(document.id, DocumentStatus::Failed, Some(&message))
                    .await
                {
                    warn!(document_id = %document.id, error = %mark_error, "문서 실패 상태 기록 실패");
                }
                return Err(error);
            }
        };

        info!(document_id = %document.id, task_id = %task.id, owner, filename, "적재 요청 접수");
        Ok(SubmittedIngestion {
            document_id: document.id,
            task_id: task.id,
        })
    }

    /// Q&A 쌍을 마크다운 문서로 만들어 적재 요청한다.
    pub async fn submit_qa_pairs(
        &self,
        owner: &str,
        heading: &str,
        pairs: &[QaPair],
    ) -> CoreResult<SubmittedIngestion> {
        if pairs.is_empty() {
            return Err(CoreError::InvalidInput(
                "qa_pairs는 최소 1개 이상이어야 합니다".to_string(),
            ));
        }

        let markdown = render_qa_markdown(heading, pairs);
        let filename = format!(
            "qa_session_{}.md",
            heading.to_lowercase().replace(' ', "_")
        );
        self.submit_file(owner, &filename, "text/markdown", markdown.as_bytes())
            .await
    }

    async fn enqueue(&self, document_id: Uuid) -> CoreResult<Task> {
        let payload = serde_json::to_value(IngestionTaskPayload { document_id }).map_err(|error| {
            CoreError::Serialization(format!("작업 페이로드 직렬화 실패: {}", error))
        })?;
        self.queue.push(INGESTION_TASK_TYPE, payload).await
    }

    async fn discard_blob(&self, blob_handle: &str) {
        if let Err(error) = self.blobs.delete(blob_handle).await {
            warn!(blob_handle, error = %error, "접수 실패 후 블롭 회수 실패");
        }
    }

    pub async fn list_documents(&self, owner: &str) -> CoreResult<Vec<DocumentRecord>> {
        self.catalog.list_documents(owner).await
    }

    /// 소유자 확인 후 블롭, 청크, 카탈로그 레코드를 삭제한다. 블롭 삭제 실패는 기록만 한다.
    pub async fn delete_document(&self, document_id: Uuid, owner: &str) -> CoreResult<u64> {
        let document = self
            .catalog
            .get_document(document_id)
            .await?
            .ok_or_else(|| {
                CoreError::InvalidInput(format!("문서를 찾을 수 없습니다: {}", document_id))
            })?;

        if document.owner != owner {
            return Err(CoreError::InvalidInput(format!(
                "문서 소유자가 아닙니다: document_id={}",
                document_id
            )));
        }

        if let Err(error) = self.blobs.delete(&document.blob_handle).await {
            warn!(%document_id, error = %error, "블롭 삭제 실패, 계속 진행합니다");
        }

        let removed_chunks = self
            .corpus
            .delete_chunks_by_document(&document_id.to_string())
            .await?;
        self.catalog.delete_document(document_id).await?;

        info!(%document_id, removed_chunks, "문서 삭제 완료");
        Ok(removed_chunks)
    }
}

pub fn render_qa_markdown(heading: &str, pairs: &[QaPair]) -> String {
    let mut markdown = format!("# {}\n\n", heading);
    for pair in pairs {
        markdown.push_str(&format!("## Q: {}\n{}\n\n", pair.question, pair.answer));
    }
    markdown
}

/// "ingestion" 작업 본문을 실행하는 핸들러.
pub struct IngestionTaskHandler {
    blobs: Arc<dyn BlobStore>,
    catalog: Arc<dyn DocumentCatalog>,
    corpus: Arc<dyn CorpusStore>,
    embedder: Arc<dyn Embedder>,
    chunker: Arc<dyn DocumentChunker>,
}

impl IngestionTaskHandler {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        catalog: Arc<dyn DocumentCatalog>,
        corpus: Arc<dyn CorpusStore>,
        embedder: Arc<dyn Embedder>,
        chunker: Arc<dyn DocumentChunker>,
    ) -> Self {
        Self {
            blobs,
            catalog,
            corpus,
            embedder,
            chunker,
        }
    }

    async fn ingest(&self, document: &DocumentRecord) -> CoreResult<u64> {
        let raw = self.blobs.download(&document.blob_handle).await?;
        let text = String::from_utf8_lossy(&raw);
        let chunks = self.chunker.chunk(&text);

        let document_id = document.id.to_string();
        self.corpus.delete_chunks_by_document(&document_id).await?;
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embedder.embed(&chunks, EmbeddingMode::Document).await?;
        if embeddings.len() != chunks.len() {
            return Err(CoreError::Http(format!(
                "임베딩 개수가 청크 수와 다릅니다: chunks={}, embeddings={}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let records = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (content, embedding))| ChunkRecord {
                chunk_id: Uuid::new_v4(),
                document_id: document_id.clone(),
                owner: document.owner.clone(),
                chunk_index: index as i32,
                content,
                embedding,
                metadata: json!({ "source": document.filename }),
            })
            .collect::<Vec<_>>();

        self.corpus.insert_chunks(&records).await
    }
}

#[async_trait]
impl TaskHandler for IngestionTaskHandler {
    async fn handle(&self, task: &Task) -> CoreResult<()> {
        let payload = parse_payload(&task.payload)?;
        let document = self
            .catalog
            .get_document(payload.document_id)
            .await?
            .ok_or_else(|| {
                CoreError::TaskExecution(format!(
                    "문서 메타데이터를 찾을 수 없습니다: {}",
                    payload.document_id
                ))
            })?;

        match self.ingest(&document).await {
            Ok(inserted) => {
                self.catalog
                    .update_document_status(document.id, DocumentStatus::Completed, None)
                    .await?;
                info!(document_id = %document.id, filename = %document.filename, inserted, "문서 적재 완료");
                Ok(())
            }
            Err(error) => {
                let message = error.to_string();
                if let Err(mark_error) = self
                    .catalog
                    .update_document_status(document.id, DocumentStatus::Failed, Some(&message))
                    .await
                {
                    warn!(document_id = %document.id, error = %mark_error, "문서 실패 상태 기록 실패");
                }
                Err(error)
            }
        }
    }
}

fn parse_payload(payload: &Value) -> CoreResult<IngestionTaskPayload> {
    serde_json::from_value(payload.clone()).map_err(|error| {
        CoreError::TaskExecution(format!("ingestion 작업 페이로드가 올바르지 않습니다: {}", error))
    })
}
