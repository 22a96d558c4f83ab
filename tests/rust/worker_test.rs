use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use knowledge_capture::core::config::WorkerConfig;
use knowledge_capture::core::errors::{CoreError, CoreResult};
use knowledge_capture::core::model::{Task, TaskOutcome, TaskStatus};
use knowledge_capture::core::queue::TaskQueue;
use knowledge_capture::core::worker::{TaskHandler, Worker};
use knowledge_capture::index::memory_queue::MemoryTaskStore;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Default)]
struct RecordingHandler {
    handled: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl TaskHandler for RecordingHandler {
    async fn handle(&self, task: &Task) -> CoreResult<()> {
        self.handled.lock().expect("handled lock").push(task.id);
        Ok(())
    }
}

struct FailingHandler;

#[async_trait]
impl TaskHandler for FailingHandler {
    async fn handle(&self, _task: &Task) -> CoreResult<()> {
        Err(CoreError::TaskExecution("boom".to_string()))
    }
}

struct PanickingHandler;

#[async_trait]
impl TaskHandler for PanickingHandler {
    async fn handle(&self, _task: &Task) -> CoreResult<()> {
        panic!("handler exploded");
    }
}

fn worker_config() -> WorkerConfig {
    WorkerConfig {
        worker_id: Some("worker-test".to_string()),
        idle_backoff_ms: 5,
        error_backoff_ms: 5,
    }
}

fn setup() -> (TaskQueue, Worker, Arc<RecordingHandler>) {
    let queue = TaskQueue::new(Arc::new(MemoryTaskStore::new()));
    let recorder = Arc::new(RecordingHandler::default());
    let worker = Worker::new(queue.clone(), &worker_config())
        .expect("worker")
        .register("record", recorder.clone())
        .register("explode", Arc::new(FailingHandler))
        .register("panic", Arc::new(PanickingHandler));
    (queue, worker, recorder)
}

#[tokio::test]
async fn failed_task_is_recorded_and_next_task_runs() {
    let (queue, worker, recorder) = setup();
    let failing = queue.push("explode", json!({})).await.expect("push");
    let healthy = queue.push("record", json!({})).await.expect("push");

    let first = worker.run_once().await.expect("run").expect("report");
    assert_eq!(first.task_id, failing.id);
    assert!(matches!(&first.outcome, TaskOutcome::Failed(message) if message.contains("boom")));

    let stored = queue.get(failing.id).await.expect("get").expect("task");
    assert_eq!(stored.status, TaskStatus::Failed);
    assert!(stored.error_message.as_deref().is_some_and(|message| message.contains("boom")));

    let second = worker.run_once().await.expect("run").expect("report");
    assert_eq!(second.task_id, healthy.id);
    assert_eq!(second.outcome, TaskOutcome::Completed);
    assert_eq!(*recorder.handled.lock().expect("handled lock"), vec![healthy.id]);

    assert!(worker.run_once().await.expect("run").is_none());
}

#[tokio::test]
async fn panicking_handler_ends_task_as_failed() {
    let (queue, worker, _) = setup();
    let task = queue.push("panic", json!({})).await.expect("push");

    let report = worker.run_once().await.expect("run").expect("report");
    assert!(matches!(report.outcome, TaskOutcome::Failed(_)));

    let stored = queue.get(task.id).await.expect("get").expect("task");
    assert_eq!(stored.status, TaskStatus::Failed);
    assert!(stored.error_message.is_some());
}

#[tokio::test]
async fn unregistered_task_type_fails_without_stopping() {
    let (queue, worker, _) = setup();
    let task = queue.push("unknown", json!({})).await.expect("push");

    let report = worker.run_once().await.expect("run").expect("report");
    assert!(matches!(&report.outcome, TaskOutcome::Failed(message) if message.contains("unknown")));
    assert_eq!(
        queue.get(task.id).await.expect("get").expect("task").status,
        TaskStatus::Failed
    );
}

#[tokio::test]
async fn default_worker_id_is_generated() {
    let queue = TaskQueue::new(Arc::new(MemoryTaskStore::new()));
    let worker = Worker::new(queue, &WorkerConfig::default()).expect("worker");
    assert!(worker.worker_id().starts_with("worker-"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_drains_queue_until_cancelled() {
    let (queue, worker, recorder) = setup();
    let mut pushed = Vec::new();
    for task_type in ["record", "explode", "record"] {
        pushed.push(queue.push(task_type, json!({})).await.expect("push").id);
    }

    let shutdown = CancellationToken::new();
    let loop_token = shutdown.clone();
    let handle = tokio::spawn(async move { worker.run(loop_token).await });

    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let mut terminal = 0;
            for id in &pushed {
                let task = queue.get(*id).await.expect("get").expect("task");
                if task.status.is_terminal() {
                    terminal += 1;
                }
            }
            if terminal == pushed.len() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(drained.is_ok(), "worker did not drain the queue");

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker stops after cancel")
        .expect("join");

    assert_eq!(recorder.handled.lock().expect("handled lock").len(), 2);
}
