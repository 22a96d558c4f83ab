use std::sync::atomic::Ordering;
use std::sync::Arc;

use knowledge_capture::core::chunker::FixedWindowChunker;
use knowledge_capture::core::config::WorkerConfig;
use knowledge_capture::core::errors::CoreError;
use knowledge_capture::core::ingestion_pipeline::{
    IngestionService, IngestionTaskHandler, QaPair, INGESTION_TASK_TYPE,
};
use knowledge_capture::core::model::{DocumentStatus, TaskOutcome, TaskStatus};
use knowledge_capture::core::ports::EmbeddingMode;
use knowledge_capture::core::queue::TaskQueue;
use knowledge_capture::core::worker::{TaskHandler, Worker};
use knowledge_capture::index::memory_queue::MemoryTaskStore;
use serde_json::json;
use uuid::Uuid;

use crate::support::{
    EchoEmbedder, MemoryBlobs, MemoryCatalog, RejectingTaskStore, ScriptedCorpus,
};

struct Fixture {
    blobs: Arc<MemoryBlobs>,
    catalog: Arc<MemoryCatalog>,
    corpus: Arc<ScriptedCorpus>,
    embedder: Arc<EchoEmbedder>,
    queue: TaskQueue,
    service: IngestionService,
    handler: Arc<IngestionTaskHandler>,
}

impl Fixture {
    fn new() -> Self {
        let blobs = Arc::new(MemoryBlobs::default());
        let catalog = Arc::new(MemoryCatalog::default());
        let corpus = Arc::new(ScriptedCorpus::new());
        let embedder = Arc::new(EchoEmbedder::default());
        let queue = TaskQueue::new(Arc::new(MemoryTaskStore::new()));
        let service = IngestionService::new(
            blobs.clone(),
            catalog.clone(),
            corpus.clone(),
            queue.clone(),
        );
        let handler = Arc::new(IngestionTaskHandler::new(
            blobs.clone(),
            catalog.clone(),
            corpus.clone(),
            embedder.clone(),
            Arc::new(FixedWindowChunker::new(4, 1)),
        ));
        Self {
            blobs,
            catalog,
            corpus,
            embedder,
            queue,
            service,
            handler,
        }
    }

    fn worker(&self) -> Worker {
        Worker::new(
            self.queue.clone(),
            &WorkerConfig {
                worker_id: Some("ingest-worker".to_string()),
                ..WorkerConfig::default()
            },
        )
        .expect("worker")
        .register(INGESTION_TASK_TYPE, self.handler.clone())
    }
}

#[tokio::test]
async fn submitted_file_is_chunked_embedded_and_stored() {
    let fixture = Fixture::new();
    let submitted = fixture
        .service
        .submit_file("acme", "notes.txt", "text/plain", b"abcdefghij")
        .await
        .expect("submit");

    let pending = fixture.catalog.document(submitted.document_id).expect("document");
    assert_eq!(pending.status, DocumentStatus::Pending);
    assert_eq!(pending.file_size, 10);
    assert!(fixture.blobs.contains(&pending.blob_handle));

    let report = fixture.worker().run_once().await.expect("run").expect("report");
    assert_eq!(report.task_id, submitted.task_id);
    assert_eq!(report.outcome, TaskOutcome::Completed);

    let chunks = fixture.corpus.stored_chunks();
    let contents = chunks.iter().map(|chunk| chunk.content.as_str()).collect::<Vec<_>>();
    assert_eq!(contents, vec!["abcd", "defg", "ghij", "j"]);
    for (index, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, index as i32);
        assert_eq!(chunk.owner, "acme");
        assert_eq!(chunk.document_id, submitted.document_id.to_string());
        assert_eq!(chunk.metadata, json!({ "source": "notes.txt" }));
        assert_eq!(chunk.embedding.len(), chunk.content.chars().count());
    }
    assert_eq!(
        *fixture.embedder.modes.lock().expect("modes lock"),
        vec![EmbeddingMode::Document]
    );

    let done = fixture.catalog.document(submitted.document_id).expect("document");
    assert_eq!(done.status, DocumentStatus::Completed);
    assert_eq!(
        fixture.queue.get(submitted.task_id).await.expect("get").expect("task").status,
        TaskStatus::Completed
    );
}

#[tokio::test]
async fn embedding_failure_marks_document_and_task_failed() {
    let fixture = Fixture::new();
    fixture.embedder.fail.store(true, Ordering::SeqCst);
    let submitted = fixture
        .service
        .submit_file("acme", "notes.txt", "text/plain", b"some text")
        .await
        .expect("submit");

    let report = fixture.worker().run_once().await.expect("run").expect("report");
    assert!(matches!(report.outcome, TaskOutcome::Failed(_)));

    let document = fixture.catalog.document(submitted.document_id).expect("document");
    assert_eq!(document.status, DocumentStatus::Failed);
    assert!(document
        .error_message
        .as_deref()
        .is_some_and(|message| message.contains("embedding provider unavailable")));
    assert!(fixture.corpus.stored_chunks().is_empty());

    let task = fixture.queue.get(submitted.task_id).await.expect("get").expect("task");
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.error_message.is_some());
}

#[tokio::test]
async fn task_for_missing_document_fails() {
    let fixture = Fixture::new();
    let task = fixture
        .queue
        .push(INGESTION_TASK_TYPE, json!({ "document_id": Uuid::new_v4() }))
        .await
        .expect("push");

    let report = fixture.worker().run_once().await.expect("run").expect("report");
    assert_eq!(report.task_id, task.id);
    assert!(matches!(report.outcome, TaskOutcome::Failed(_)));
}

#[tokio::test]
async fn rerunning_a_task_replaces_previous_chunks() {
    let fixture = Fixture::new();
    fixture
        .service
        .submit_file("acme", "notes.txt", "text/plain", b"abcdefghij")
        .await
        .expect("submit");
    let task = fixture.queue.claim("manual").await.expect("claim").expect("task");

    fixture.handler.handle(&task).await.expect("first run");
    fixture.handler.handle(&task).await.expect("second run");

    assert_eq!(fixture.corpus.stored_chunks().len(), 4);
}

#[tokio::test]
async fn qa_pairs_become_markdown_document() {
    let fixture = Fixture::new();
    let pairs = vec![QaPair {
        question: "Where is the runbook?".to_string(),
        answer: "In the ops wiki.".to_string(),
    }];

    let submitted = fixture
        .service
        .submit_qa_pairs("acme", "Team FAQ", &pairs)
        .await
        .expect("submit");

    let document = fixture.catalog.document(submitted.document_id).expect("document");
    assert_eq!(document.filename, "qa_session_team_faq.md");
    assert_eq!(document.content_type, "text/markdown");

    let empty = fixture.service.submit_qa_pairs("acme", "Team FAQ", &[]).await;
    assert!(matches!(empty, Err(CoreError::InvalidInput(_))));
}

#[tokio::test]
async fn delete_checks_owner_and_tolerates_blob_failure() {
    let fixture = Fixture::new();
    let submitted = fixture
        .service
        .submit_file("acme", "notes.txt", "text/plain", b"abcdefghij")
        .await
        .expect("submit");
    fixture.worker().run_once().await.expect("run");

    let foreign = fixture
        .service
        .delete_document(submitted.document_id, "globex")
        .await;
    assert!(matches!(foreign, Err(CoreError::InvalidInput(_))));
    assert_eq!(fixture.corpus.stored_chunks().len(), 4);

    fixture.blobs.fail_delete.store(true, Ordering::SeqCst);
    let removed = fixture
        .service
        .delete_document(submitted.document_id, "acme")
        .await
        .expect("delete");

    assert_eq!(removed, 4);
    assert!(fixture.corpus.stored_chunks().is_empty());
    assert!(fixture.catalog.document(submitted.document_id).is_none());
    assert!(fixture
        .service
        .list_documents("acme")
        .await
        .expect("list")
        .is_empty());
}

#[tokio::test]
async fn blank_owner_is_rejected_before_upload() {
    let fixture = Fixture::new();
    let result = fixture
        .service
        .submit_file(" ", "notes.txt", "text/plain", b"abc")
        .await;

    assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    assert!(fixture.queue.claim("w").await.expect("claim").is_none());
}

#[tokio::test]
async fn catalog_failure_removes_uploaded_blob() {
    let fixture = Fixture::new();
    fixture.catalog.fail_insert.store(true, Ordering::SeqCst);

    let result = fixture
        .service
        .submit_file("acme", "notes.txt", "text/plain", b"abcdefghij")
        .await;

    assert!(matches!(result, Err(CoreError::Db(_))));
    assert_eq!(fixture.blobs.len(), 0);
    assert!(fixture.queue.claim("w").await.expect("claim").is_none());
}

#[tokio::test]
async fn enqueue_failure_marks_document_failed_and_removes_blob() {
    let blobs = Arc::new(MemoryBlobs::default());
    let catalog = Arc::new(MemoryCatalog::default());
    let service = IngestionService::new(
        blobs.clone(),
        catalog.clone(),
        Arc::new(ScriptedCorpus::new()),
        TaskQueue::new(Arc::new(RejectingTaskStore)),
    );

    let result = service
        .submit_file("acme", "notes.txt", "text/plain", b"abcdefghij")
        .await;

    assert!(matches!(result, Err(CoreError::Db(_))));
    assert_eq!(blobs.len(), 0);

    let documents = service.list_documents("acme").await.expect("list");
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].status, DocumentStatus::Failed);
    assert!(documents[0]
        .error_message
        .as_deref()
        .is_some_and(|message| !message.trim().is_empty()));
}
