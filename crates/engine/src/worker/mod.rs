// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker loops: lease one job, run it through the external
//! collaborator, finalize exactly once.

mod agent;
mod inference;

pub use agent::AgentWorker;
pub use inference::InferenceWorker;

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default sleep between polls of an empty queue. Overridable per
/// worker via `with_poll_interval`.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sleep after a store error before retrying the loop.
pub(crate) const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Execution lease TTL. Sized past any expected single run; the worker
/// holds the lease for the whole run, and only crash recovery reclaims
/// it.
pub const EXECUTION_LEASE_TTL_MS: i64 = 600_000;

/// Inference lease TTL. Tighter than executions so recovery after a
/// crash is more responsive.
pub const INFERENCE_LEASE_TTL_MS: i64 = 300_000;

/// Wait out `duration` unless shutdown fires first. Returns false on
/// shutdown.
pub(crate) async fn idle(shutdown: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
