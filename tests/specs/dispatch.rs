// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch-order and at-most-once leasing specs.

use crate::prelude::*;

/// A single worker drains a mixed-source backlog strictly by priority:
/// CHAT (90) before MANUAL_RUN (70) before TRIGGER (30).
#[tokio::test]
async fn priority_order_over_a_mixed_backlog() {
    let engine = memory_engine().await;

    let trigger = engine.enqueue_execution(execution_from(JobSource::Trigger)).await.unwrap();
    let chat = engine.enqueue_execution(execution_from(JobSource::Chat)).await.unwrap();
    let manual = engine.enqueue_execution(execution_from(JobSource::ManualRun)).await.unwrap();

    let (executor, seen) = RecordingExecutor::new();
    let shutdown = CancellationToken::new();
    let worker = AgentWorker::new(
        engine.clone(),
        Arc::new(executor),
        Arc::new(StaticConfigLoader::default()),
    );
    let handle = tokio::spawn(worker.run(shutdown.clone()));

    for id in [&trigger, &chat, &manual] {
        wait_for_execution_status(&engine, id, JobStatus::Completed).await;
    }
    shutdown.cancel();
    handle.await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![chat, manual, trigger]);
}

/// Enqueue → GET roundtrip: the row is PENDING with the effective
/// priority before any worker touches it.
#[tokio::test]
async fn enqueue_get_roundtrip() {
    let engine = memory_engine().await;
    let id = engine.enqueue_execution(manual_run("agent-x", json!({"k": 1}))).await.unwrap();

    let row = engine.store().execution(&id).await.unwrap().unwrap();
    assert_eq!(row.status, JobStatus::Pending);
    assert_eq!(row.priority, 70);
    assert_eq!(row.base_priority, 70);
    assert!(row.lease_id.is_none());
    assert!(row.started_at_ms.is_none());
}

/// Two inference workers share a file-backed queue of twenty
/// equal-priority tasks: every task is finalized exactly once, and no
/// request is served by both workers.
#[tokio::test]
async fn two_workers_twenty_tasks_no_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let engine = file_engine(&dir.path().join("queue.db")).await;

    let mut task_ids = Vec::new();
    for i in 0..20 {
        let id = engine.enqueue_inference(chat(&format!("task-{i}"))).await.unwrap();
        task_ids.push(id);
    }

    let shutdown = CancellationToken::new();
    let (runner_a, served_a) = RecordingRunner::new();
    let (runner_b, served_b) = RecordingRunner::new();
    let worker_a = InferenceWorker::new(engine.clone(), Arc::new(runner_a))
        .with_poll_interval(Duration::from_millis(10));
    let worker_b = InferenceWorker::new(engine.clone(), Arc::new(runner_b))
        .with_poll_interval(Duration::from_millis(10));
    let handle_a = tokio::spawn(worker_a.run(shutdown.clone()));
    let handle_b = tokio::spawn(worker_b.run(shutdown.clone()));

    for id in &task_ids {
        let row = wait_for_task_status(&engine, id, JobStatus::Completed).await;
        assert!(row.lease_id.is_none());
    }
    shutdown.cancel();
    handle_a.await.unwrap();
    handle_b.await.unwrap();

    let served_a = served_a.lock().unwrap().clone();
    let served_b = served_b.lock().unwrap().clone();
    assert_eq!(served_a.len() + served_b.len(), 20, "each task served exactly once");
    for request in &served_a {
        assert!(!served_b.contains(request), "{request} served by both workers");
    }
}
