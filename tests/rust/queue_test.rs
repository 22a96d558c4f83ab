use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use knowledge_capture::core::errors::CoreError;
use knowledge_capture::core::model::{TaskOutcome, TaskStatus, UNSPECIFIED_FAILURE_MESSAGE};
use knowledge_capture::core::queue::TaskQueue;
use knowledge_capture::index::memory_queue::MemoryTaskStore;
use rstest::rstest;
use serde_json::json;

fn memory_queue() -> TaskQueue {
    TaskQueue::new(Arc::new(MemoryTaskStore::new()))
}

#[rstest]
#[case(20, 8)]
#[case(5, 5)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claimants_never_share_a_task(#[case] tasks: usize, #[case] claimants: usize) {
    let queue = memory_queue();
    let mut pushed = HashSet::new();
    for n in 0..tasks {
        pushed.insert(queue.push("ingestion", json!({ "n": n })).await.expect("push").id);
    }

    let mut handles = Vec::new();
    for claimant in 0..claimants {
        let queue = queue.clone();
        handles.push(tokio::spawn(async move {
            let worker_id = format!("worker-{}", claimant);
            let mut claimed = Vec::new();
            while let Some(task) = queue.claim(&worker_id).await.expect("claim") {
                assert_eq!(task.worker_id.as_deref(), Some(worker_id.as_str()));
                claimed.push(task.id);
                tokio::task::yield_now().await;
            }
            claimed
        }));
    }

    let mut seen = HashSet::new();
    let mut total = 0;
    for handle in handles {
        for id in handle.await.expect("join") {
            total += 1;
            assert!(seen.insert(id), "task {} claimed twice", id);
        }
    }

    assert_eq!(total, tasks);
    assert_eq!(seen, pushed);
    assert!(queue.claim("late").await.expect("claim").is_none());
}

#[tokio::test]
async fn sequential_claims_follow_push_order() {
    let queue = memory_queue();
    let first = queue.push("ingestion", json!({ "n": 1 })).await.expect("push");
    let second = queue.push("ingestion", json!({ "n": 2 })).await.expect("push");
    let third = queue.push("ingestion", json!({ "n": 3 })).await.expect("push");

    let mut order = Vec::new();
    while let Some(task) = queue.claim("w").await.expect("claim") {
        order.push(task.id);
    }

    assert_eq!(order, vec![first.id, second.id, third.id]);
}

#[tokio::test]
async fn claim_on_empty_queue_is_none() {
    assert!(memory_queue().claim("w").await.expect("claim").is_none());
}

#[tokio::test]
async fn complete_records_terminal_state_once() {
    let queue = memory_queue();
    let pushed = queue.push("ingestion", json!({})).await.expect("push");
    let claimed = queue.claim("w").await.expect("claim").expect("task");
    assert_eq!(claimed.status, TaskStatus::Processing);
    assert!(claimed.started_at.is_some());

    queue
        .complete(pushed.id, "w", TaskOutcome::Failed("parse error".to_string()))
        .await
        .expect("complete");

    let stored = queue.get(pushed.id).await.expect("get").expect("task");
    assert_eq!(stored.status, TaskStatus::Failed);
    assert_eq!(stored.error_message.as_deref(), Some("parse error"));
    assert!(stored.completed_at.is_some());

    let again = queue.complete(pushed.id, "w", TaskOutcome::Completed).await;
    assert!(matches!(again, Err(CoreError::QueueConsistency(_))));
    let unchanged = queue.get(pushed.id).await.expect("get").expect("task");
    assert_eq!(unchanged.status, TaskStatus::Failed);
}

#[rstest]
#[case("")]
#[case("  \n ")]
#[tokio::test]
async fn blank_failure_message_is_replaced(#[case] message: &str) {
    let queue = memory_queue();
    let pushed = queue.push("ingestion", json!({})).await.expect("push");
    queue.claim("w").await.expect("claim").expect("task");

    queue
        .complete(pushed.id, "w", TaskOutcome::Failed(message.to_string()))
        .await
        .expect("complete");

    let stored = queue.get(pushed.id).await.expect("get").expect("task");
    assert_eq!(stored.status, TaskStatus::Failed);
    assert_eq!(stored.error_message.as_deref(), Some(UNSPECIFIED_FAILURE_MESSAGE));
}

#[tokio::test]
async fn complete_rejects_pending_and_foreign_tasks() {
    let queue = memory_queue();
    let task = queue.push("ingestion", json!({})).await.expect("push");

    let pending = queue.complete(task.id, "w", TaskOutcome::Completed).await;
    assert!(matches!(pending, Err(CoreError::QueueConsistency(_))));

    queue.claim("owner").await.expect("claim");
    let foreign = queue.complete(task.id, "intruder", TaskOutcome::Completed).await;
    assert!(matches!(foreign, Err(CoreError::QueueConsistency(_))));

    queue
        .complete(task.id, "owner", TaskOutcome::Completed)
        .await
        .expect("owner completes");
}

#[tokio::test]
async fn expired_lease_makes_task_reclaimable() {
    let queue = memory_queue()
        .with_lease(Some(Duration::from_millis(20)))
        .expect("lease");
    let task = queue.push("ingestion", json!({})).await.expect("push");

    queue.claim("crashed").await.expect("claim").expect("task");
    assert!(queue.claim("rescuer").await.expect("claim").is_none());

    tokio::time::sleep(Duration::from_millis(60)).await;
    let reclaimed = queue.claim("rescuer").await.expect("claim").expect("task");
    assert_eq!(reclaimed.id, task.id);
    assert_eq!(reclaimed.worker_id.as_deref(), Some("rescuer"));

    let stale = queue.complete(task.id, "crashed", TaskOutcome::Completed).await;
    assert!(matches!(stale, Err(CoreError::QueueConsistency(_))));
    queue
        .complete(task.id, "rescuer", TaskOutcome::Completed)
        .await
        .expect("rescuer completes");
}

#[tokio::test]
async fn processing_task_is_not_reclaimed_without_lease() {
    let queue = memory_queue();
    queue.push("ingestion", json!({})).await.expect("push");
    queue.claim("first").await.expect("claim").expect("task");

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(queue.claim("second").await.expect("claim").is_none());
}

#[rstest]
#[case("", "w")]
#[case("ingestion", "  ")]
#[tokio::test]
async fn blank_identifiers_are_rejected(#[case] task_type: &str, #[case] worker_id: &str) {
    let queue = memory_queue();
    let pushed = queue.push(task_type, json!({})).await;
    let claimed = queue.claim(worker_id).await;

    assert!(matches!(pushed, Err(CoreError::InvalidInput(_))) || matches!(claimed, Err(CoreError::InvalidInput(_))));
}
