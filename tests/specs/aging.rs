// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Anti-starvation aging specs.

use crate::prelude::*;
use hub_core::{AGING_CAP, AGING_THRESHOLD_MS};

/// A held TRIGGER job gains +10 per tick once past the threshold and
/// stops exactly at the cap (30 → 40 → 50 → 60 → 65).
#[tokio::test]
async fn trigger_job_ages_up_to_the_cap() {
    let (engine, clock) = memory_engine_with_clock().await;
    let id = engine.enqueue_execution(execution_from(JobSource::Trigger)).await.unwrap();

    clock.advance_ms(AGING_THRESHOLD_MS + 1);
    for expected in [40, 50, 60, 65, 65, 65] {
        engine.store().age_pending_executions(engine.now_ms()).await.unwrap();
        let row = engine.store().execution(&id).await.unwrap().unwrap();
        assert_eq!(row.priority, expected);
        assert_eq!(row.base_priority, 30);
    }
}

/// The background loop does the same lifting on its own.
#[tokio::test]
async fn aging_loop_lifts_a_starving_job() {
    let (engine, clock) = memory_engine_with_clock().await;
    let id = engine.enqueue_execution(execution_from(JobSource::Trigger)).await.unwrap();
    clock.advance_ms(AGING_THRESHOLD_MS + 1);

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(hub_engine::run_aging(
        engine.clone(),
        Duration::from_millis(10),
        shutdown.clone(),
    ));

    tokio::time::timeout(SPEC_WAIT_MAX, async {
        loop {
            let row = engine.store().execution(&id).await.unwrap().unwrap();
            if row.priority == AGING_CAP {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    // Extra ticks never push past the cap.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let row = engine.store().execution(&id).await.unwrap().unwrap();
    assert_eq!(row.priority, AGING_CAP);

    shutdown.cancel();
    handle.await.unwrap();
}

/// An aged job overtakes fresher INTERNAL_NODE work but still yields to
/// MANUAL_RUN: the cap sits strictly between the two bases.
#[tokio::test]
async fn aged_trigger_outranks_internal_but_not_manual() {
    let (engine, clock) = memory_engine_with_clock().await;
    let old_trigger = engine.enqueue_execution(execution_from(JobSource::Trigger)).await.unwrap();

    clock.advance_ms(AGING_THRESHOLD_MS + 1);
    for _ in 0..4 {
        engine.store().age_pending_executions(engine.now_ms()).await.unwrap();
    }
    let internal = engine.enqueue_execution(execution_from(JobSource::InternalNode)).await.unwrap();
    let manual = engine.enqueue_execution(execution_from(JobSource::ManualRun)).await.unwrap();

    let mut order = Vec::new();
    while let Some(row) =
        engine.store().lease_next_execution(engine.now_ms(), 600_000).await.unwrap()
    {
        order.push(row.execution_id);
    }
    assert_eq!(order, vec![manual, old_trigger, internal]);
}
