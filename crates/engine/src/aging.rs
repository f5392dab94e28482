// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Anti-starvation aging loop.
//!
//! A single actor that periodically lifts long-waiting PENDING rows in
//! both queues. It only touches PENDING rows, so it races safely with
//! lease selection: a row leased between ticks simply stops matching.

use crate::runtime::Engine;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run aging passes every `period` until shutdown.
pub async fn run_aging(engine: Arc<Engine>, period: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // interval fires immediately; skip that first tick so a restart
    // does not double-boost a queue that was just aged.
    ticker.tick().await;

    tracing::info!(period_s = period.as_secs_f64(), "aging loop started");
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let now = engine.now_ms();
                match engine.store().age_pending_executions(now).await {
                    Ok(0) => {}
                    Ok(boosted) => tracing::debug!(boosted, "aged pending executions"),
                    Err(error) => tracing::error!(%error, "execution aging pass failed"),
                }
                match engine.store().age_pending_tasks(now).await {
                    Ok(0) => {}
                    Ok(boosted) => tracing::debug!(boosted, "aged pending tasks"),
                    Err(error) => tracing::error!(%error, "task aging pass failed"),
                }
            }
        }
    }
    tracing::info!("aging loop stopped");
}

#[cfg(test)]
#[path = "aging_tests.rs"]
mod tests;
