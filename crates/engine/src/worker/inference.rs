// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inference worker: leases tasks, streams tokens through the hub,
//! finalizes with the measured throughput.

use super::{idle, DEFAULT_POLL_INTERVAL, ERROR_BACKOFF, INFERENCE_LEASE_TTL_MS};
use crate::contract::{ChatOutcome, ModelRunner, RunError};
use crate::runtime::Engine;
use hub_core::{
    inference_channel, DoneData, ErrorData, InferenceTask, JobOutcome, JobStatus, StreamEvent,
    TokenData,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Long-lived worker over the inference queue.
pub struct InferenceWorker {
    engine: Arc<Engine>,
    runner: Arc<dyn ModelRunner>,
    poll_interval: Duration,
}

/// Worker-internal disposition of one inference run, kept structured so
/// the terminal event can carry the trace separately from the row's
/// flattened `error_log`.
enum InferOutcome {
    Done { result: Value, tokens_per_second: f64 },
    Canceled,
    Failed { message: String, trace: Option<String> },
}

impl InferOutcome {
    fn from_error(error: RunError) -> Self {
        match error {
            RunError::Canceled => InferOutcome::Canceled,
            RunError::Failed { message, trace } => InferOutcome::Failed { message, trace },
        }
    }
}

impl InferenceWorker {
    pub fn new(engine: Arc<Engine>, runner: Arc<dyn ModelRunner>) -> Self {
        Self { engine, runner, poll_interval: DEFAULT_POLL_INTERVAL }
    }

    /// Override the idle poll sleep (`HUB_POLL_INTERVAL_MS` in the daemon).
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run until shutdown. Runner failures finalize the task FAILED and
    /// the worker moves on.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!("inference worker started");
        while !shutdown.is_cancelled() {
            if let Err(error) = self.engine.reap_canceled_tasks().await {
                tracing::error!(%error, "reap of canceled tasks failed");
            }
            let now = self.engine.now_ms();
            match self.engine.store().lease_next_task(now, INFERENCE_LEASE_TTL_MS).await {
                Ok(Some(task)) => self.run_one(task).await,
                Ok(None) => {
                    if !idle(&shutdown, self.poll_interval).await {
                        break;
                    }
                }
                Err(error) => {
                    tracing::error!(%error, "task lease failed");
                    if !idle(&shutdown, ERROR_BACKOFF).await {
                        break;
                    }
                }
            }
        }
        tracing::info!("inference worker stopped");
    }

    async fn run_one(&self, task: InferenceTask) {
        let id = task.task_id.clone();
        let Some(lease) = task.lease_id.clone() else {
            tracing::error!(task_id = %id, "leased row is missing its lease id");
            return;
        };
        tracing::info!(task_id = %id, model_id = %task.model_id, priority = task.priority, "inference started");

        let cancel = self.engine.cancels().register(id.as_str());
        // A cancel arriving between the lease and the registration above
        // signals no token; the durable flag is written before the
        // signal, so one re-check here observes it.
        match self.engine.store().task(&id).await {
            Ok(Some(row)) if row.status == JobStatus::CancelRequested => cancel.cancel(),
            _ => {}
        }
        let outcome = self.infer(&task, cancel).await;

        let (job_outcome, tokens_per_second) = match &outcome {
            InferOutcome::Done { result, tokens_per_second } => (
                JobOutcome::Completed { result: result.clone() },
                Some(*tokens_per_second),
            ),
            InferOutcome::Canceled => (JobOutcome::Canceled, None),
            InferOutcome::Failed { message, trace } => {
                let error = match trace {
                    Some(trace) => format!("{message}\n{trace}"),
                    None => message.clone(),
                };
                (JobOutcome::Failed { error }, None)
            }
        };

        let now = self.engine.now_ms();
        let finalized = self
            .engine
            .store()
            .finalize_task(&id, &lease, &job_outcome, tokens_per_second, now)
            .await;
        match finalized {
            Ok(true) => {
                let channel = inference_channel(&id);
                let event = match outcome {
                    InferOutcome::Done { result, tokens_per_second } => StreamEvent::Done {
                        task_id: id.clone(),
                        data: DoneData { result, tokens_per_second },
                        ts: now,
                    },
                    InferOutcome::Canceled => {
                        StreamEvent::Canceled { task_id: id.clone(), ts: now }
                    }
                    InferOutcome::Failed { message, trace } => StreamEvent::Error {
                        task_id: id.clone(),
                        data: ErrorData { message, trace },
                        ts: now,
                    },
                };
                self.engine.hub().publish(&channel, event);
                tracing::info!(task_id = %id, status = %job_outcome.status(), "inference finalized");
            }
            Ok(false) => tracing::warn!(task_id = %id, "lease lost before finalization"),
            Err(error) => tracing::error!(task_id = %id, %error, "finalization failed"),
        }
        self.engine.cancels().unregister(id.as_str());
    }

    async fn infer(&self, task: &InferenceTask, cancel: CancellationToken) -> InferOutcome {
        if let Err(error) = self.runner.ensure_loaded(&task.model_id).await {
            return InferOutcome::from_error(error);
        }

        let hub = self.engine.hub().clone();
        let clock = self.engine.clock().clone();
        let channel = inference_channel(&task.task_id);
        let task_id = task.task_id.clone();
        let on_token = move |text: &str| {
            hub.publish(
                &channel,
                StreamEvent::Token {
                    task_id: task_id.clone(),
                    data: TokenData { text: text.to_string() },
                    ts: clock.epoch_ms(),
                },
            );
        };

        match self.runner.run_chat(&task.prompt, &task.parameters, &on_token, &cancel).await {
            Ok(ChatOutcome { result, tokens_per_second }) => {
                InferOutcome::Done { result, tokens_per_second }
            }
            Err(error) => InferOutcome::from_error(error),
        }
    }
}

#[cfg(test)]
#[path = "inference_tests.rs"]
mod tests;
