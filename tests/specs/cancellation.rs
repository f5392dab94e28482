// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative-cancellation specs.

use crate::prelude::*;

/// Cancel a RUNNING execution: the executor observes the token at its
/// next checkpoint, the row finalizes CANCELED, and nothing further is
/// published on the execution's channel.
#[tokio::test]
async fn running_execution_cancels_cooperatively() {
    let engine = memory_engine().await;
    let id = engine.enqueue_execution(manual_run("agent-x", json!({}))).await.unwrap();
    let mut rx = engine.hub().subscribe(&execution_channel(&id));

    let shutdown = CancellationToken::new();
    let worker = AgentWorker::new(
        engine.clone(),
        Arc::new(BlockingExecutor),
        Arc::new(StaticConfigLoader::default()),
    );
    let handle = tokio::spawn(worker.run(shutdown.clone()));

    wait_for_execution_status(&engine, &id, JobStatus::Running).await;
    engine.cancel_execution(&id).await.unwrap();

    let row = wait_for_execution_status(&engine, &id, JobStatus::Canceled).await;
    assert!(row.error_log.is_none());
    assert!(row.lease_id.is_none());

    match rx.recv().await.unwrap() {
        StreamEvent::Finished { data, .. } => assert_eq!(data.status, JobStatus::Canceled),
        other => panic!("expected FINISHED, got {other:?}"),
    }
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));

    shutdown.cancel();
    handle.await.unwrap();
}

/// Cancel a PENDING job: it reaches CANCELED without ever being leased
/// (the worker reaps it between jobs).
#[tokio::test]
async fn pending_job_cancels_without_dispatch() {
    let engine = memory_engine().await;

    // The blocking job occupies the single worker…
    let blocked = engine.enqueue_execution(manual_run("agent-x", json!({}))).await.unwrap();
    let shutdown = CancellationToken::new();
    let worker = AgentWorker::new(
        engine.clone(),
        Arc::new(BlockingExecutor),
        Arc::new(StaticConfigLoader::default()),
    );
    let handle = tokio::spawn(worker.run(shutdown.clone()));
    wait_for_execution_status(&engine, &blocked, JobStatus::Running).await;

    // …so this one stays PENDING until its cancel is reaped.
    let waiting = engine.enqueue_execution(manual_run("agent-y", json!({}))).await.unwrap();
    engine.cancel_execution(&waiting).await.unwrap();
    engine.cancel_execution(&blocked).await.unwrap();

    let waiting_row = wait_for_execution_status(&engine, &waiting, JobStatus::Canceled).await;
    assert!(waiting_row.started_at_ms.is_none(), "never dispatched");
    wait_for_execution_status(&engine, &blocked, JobStatus::Canceled).await;

    shutdown.cancel();
    handle.await.unwrap();
}

/// Cancelling an already-terminal job is a successful no-op, and the
/// terminal state is untouched.
#[tokio::test]
async fn cancel_after_terminal_is_a_noop() {
    let engine = memory_engine().await;
    let id = engine.enqueue_execution(manual_run("agent-x", json!({}))).await.unwrap();
    engine.cancel_execution(&id).await.unwrap();
    engine.reap_canceled_executions().await.unwrap();

    let disposition = engine.cancel_execution(&id).await.unwrap();
    assert_eq!(disposition, hub_store::CancelDisposition::AlreadyTerminal);
    let row = engine.store().execution(&id).await.unwrap().unwrap();
    assert_eq!(row.status, JobStatus::Canceled);
}

/// A cancel that lands after the executor's last checkpoint loses the
/// race: the job completes successfully. Best-effort by design.
#[tokio::test]
async fn late_cancel_loses_to_completion() {
    let engine = memory_engine().await;
    let id = engine.enqueue_execution(manual_run("agent-x", json!({}))).await.unwrap();

    let (executor, _seen) = RecordingExecutor::new();
    let shutdown = CancellationToken::new();
    let worker = AgentWorker::new(
        engine.clone(),
        Arc::new(executor),
        Arc::new(StaticConfigLoader::default()),
    );
    let handle = tokio::spawn(worker.run(shutdown.clone()));

    let row = wait_for_execution_status(&engine, &id, JobStatus::Completed).await;
    // The cancel request arrives after finalization.
    engine.cancel_execution(&id).await.unwrap();
    let after = engine.store().execution(&id).await.unwrap().unwrap();
    assert_eq!(after.status, JobStatus::Completed);
    assert_eq!(after.completed_at_ms, row.completed_at_ms);

    shutdown.cancel();
    handle.await.unwrap();
}
