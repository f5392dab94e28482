// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-recovery specs: in-flight rows survive a restart as PENDING.

use crate::prelude::*;

/// A worker leases an execution, then the process "dies" (the store is
/// dropped without finalization). After reopening the same database,
/// recovery returns the row to PENDING with its lease cleared — before
/// any worker is allowed to lease again.
#[tokio::test]
async fn leased_execution_is_pending_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("queue.db");

    let id = {
        let engine = file_engine(&db).await;
        let id = engine.enqueue_execution(manual_run("agent-x", json!({}))).await.unwrap();
        let leased = engine
            .store()
            .lease_next_execution(engine.now_ms(), 600_000)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(leased.execution_id, id);
        assert_eq!(leased.status, JobStatus::Running);
        engine.store().close().await;
        id
    };

    let engine = file_engine(&db).await;
    let report = engine.recover().await.unwrap();
    assert_eq!(report.executions, 1);

    let row = engine.store().execution(&id).await.unwrap().unwrap();
    assert_eq!(row.status, JobStatus::Pending);
    assert!(row.lease_id.is_none());
    assert!(row.lease_expires_at_ms.is_none());
    // The aborted attempt's start timestamp is kept as history.
    assert!(row.started_at_ms.is_some());
}

/// Recovery also repairs CANCEL_REQUESTED rows, and running it twice
/// is a no-op.
#[tokio::test]
async fn recovery_is_idempotent() {
    let engine = memory_engine().await;
    let id = engine.enqueue_execution(manual_run("agent-x", json!({}))).await.unwrap();
    engine.store().lease_next_execution(engine.now_ms(), 600_000).await.unwrap().unwrap();
    engine.cancel_execution(&id).await.unwrap();

    let first = engine.recover().await.unwrap();
    assert_eq!(first.executions, 1);
    let second = engine.recover().await.unwrap();
    assert_eq!(second.executions, 0);
    assert_eq!(second.tasks, 0);

    let row = engine.store().execution(&id).await.unwrap().unwrap();
    assert_eq!(row.status, JobStatus::Pending);
}

/// Node events written before the crash survive as history for the
/// replayed job.
#[tokio::test]
async fn partial_node_events_survive_recovery() {
    let engine = memory_engine().await;
    let id = engine.enqueue_execution(manual_run("agent-x", json!({}))).await.unwrap();
    engine.store().lease_next_execution(engine.now_ms(), 600_000).await.unwrap().unwrap();
    engine.node_emitter(id.clone()).started("n1").await.unwrap();

    engine.recover().await.unwrap();

    let events = engine.store().node_events(&id).await.unwrap();
    assert_eq!(events.len(), 2, "input + partial n1 event are kept");
}
