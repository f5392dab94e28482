// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent worker: leases executions and dispatches them to the external
//! agent executor.

use super::{idle, DEFAULT_POLL_INTERVAL, ERROR_BACKOFF, EXECUTION_LEASE_TTL_MS};
use crate::contract::{AgentExecutor, ConfigLoader, GraphContext, RunError};
use crate::runtime::Engine;
use hub_core::{execution_channel, Execution, FinishedData, JobOutcome, JobStatus, StreamEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Long-lived worker over the executions queue.
pub struct AgentWorker {
    engine: Arc<Engine>,
    executor: Arc<dyn AgentExecutor>,
    configs: Arc<dyn ConfigLoader>,
    poll_interval: Duration,
}

impl AgentWorker {
    pub fn new(
        engine: Arc<Engine>,
        executor: Arc<dyn AgentExecutor>,
        configs: Arc<dyn ConfigLoader>,
    ) -> Self {
        Self { engine, executor, configs, poll_interval: DEFAULT_POLL_INTERVAL }
    }

    /// Override the idle poll sleep (`HUB_POLL_INTERVAL_MS` in the daemon).
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run until shutdown. Executor failures never break the loop; they
    /// finalize the job FAILED and the worker moves on.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!("agent worker started");
        while !shutdown.is_cancelled() {
            if let Err(error) = self.engine.reap_canceled_executions().await {
                tracing::error!(%error, "reap of canceled executions failed");
            }
            let now = self.engine.now_ms();
            match self.engine.store().lease_next_execution(now, EXECUTION_LEASE_TTL_MS).await {
                Ok(Some(execution)) => self.run_one(execution).await,
                Ok(None) => {
                    if !idle(&shutdown, self.poll_interval).await {
                        break;
                    }
                }
                Err(error) => {
                    tracing::error!(%error, "execution lease failed");
                    if !idle(&shutdown, ERROR_BACKOFF).await {
                        break;
                    }
                }
            }
        }
        tracing::info!("agent worker stopped");
    }

    async fn run_one(&self, execution: Execution) {
        let id = execution.execution_id.clone();
        let Some(lease) = execution.lease_id.clone() else {
            tracing::error!(execution_id = %id, "leased row is missing its lease id");
            return;
        };
        tracing::info!(
            execution_id = %id,
            agent_id = %execution.agent_id,
            priority = execution.priority,
            "execution started"
        );

        let cancel = self.engine.cancels().register(id.as_str());
        // A cancel arriving between the lease and the registration above
        // signals no token; the durable flag is written before the
        // signal, so one re-check here observes it.
        match self.engine.store().execution(&id).await {
            Ok(Some(row)) if row.status == JobStatus::CancelRequested => cancel.cancel(),
            _ => {}
        }
        let outcome = self.execute(&execution, cancel).await;

        let now = self.engine.now_ms();
        match self.engine.store().finalize_execution(&id, &lease, &outcome, now).await {
            Ok(true) => {
                self.engine.hub().publish(
                    &execution_channel(&id),
                    StreamEvent::Finished {
                        execution_id: id.clone(),
                        data: FinishedData {
                            status: outcome.status(),
                            final_result: outcome.result().cloned(),
                            error: outcome.error_log().map(str::to_string),
                        },
                        ts: now,
                    },
                );
                tracing::info!(execution_id = %id, status = %outcome.status(), "execution finalized");
            }
            // The lease guard did not match: recovery or a competing
            // finalization got there first. The row is not ours to write.
            Ok(false) => tracing::warn!(execution_id = %id, "lease lost before finalization"),
            Err(error) => tracing::error!(execution_id = %id, %error, "finalization failed"),
        }
        self.engine.cancels().unregister(id.as_str());
    }

    async fn execute(&self, execution: &Execution, cancel: CancellationToken) -> JobOutcome {
        let config = match self.configs.load_config(&execution.agent_id).await {
            Ok(config) => config,
            Err(error) => {
                return JobOutcome::Failed {
                    error: format!("agent config load failed: {}", error.error_log()),
                }
            }
        };

        let ctx = GraphContext {
            execution: execution.clone(),
            config,
            store: self.engine.store().clone(),
            nodes: self.engine.node_emitter(execution.execution_id.clone()),
            cancel,
        };
        match self.executor.run_graph(ctx).await {
            Ok(result) => JobOutcome::Completed { result },
            Err(RunError::Canceled) => JobOutcome::Canceled,
            Err(error) => JobOutcome::Failed { error: error.error_log() },
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
