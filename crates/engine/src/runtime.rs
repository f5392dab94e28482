// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine: durable store plus the in-process event hub and
//! cancellation registry.

use crate::cancel::CancelRegistry;
use crate::emit::NodeEmitter;
use crate::error::EngineError;
use crate::hub::EventHub;
use hub_core::{
    execution_channel, inference_channel, Clock, ExecutionId, FinishedData, JobStatus,
    StreamEvent, TaskId,
};
use hub_store::{CancelDisposition, Store};
use std::sync::Arc;

/// Rows repaired by startup recovery, per queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryReport {
    pub executions: u64,
    pub tasks: u64,
}

/// Shared engine state. Workers, the aging loop, and the API layer all
/// hold an `Arc<Engine>`; the only cross-worker coordination is the
/// store's atomic lease.
pub struct Engine {
    store: Store,
    hub: Arc<EventHub>,
    cancels: CancelRegistry,
    clock: Arc<dyn Clock>,
}

impl Engine {
    pub fn new(store: Store, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            hub: Arc::new(EventHub::new()),
            cancels: CancelRegistry::new(),
            clock,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    pub fn cancels(&self) -> &CancelRegistry {
        &self.cancels
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.epoch_ms()
    }

    /// Node-event emitter bound to one execution.
    pub fn node_emitter(&self, execution_id: ExecutionId) -> NodeEmitter {
        NodeEmitter::new(self.store.clone(), self.hub.clone(), self.clock.clone(), execution_id)
    }

    /// Startup recovery: return all in-flight rows in both queues to
    /// PENDING. Must complete before any worker is allowed to lease.
    /// Node events written by aborted runs are kept; a replayed job may
    /// produce duplicates and consumers must tolerate that.
    pub async fn recover(&self) -> Result<RecoveryReport, EngineError> {
        let executions = self.store.recover_executions().await?;
        let tasks = self.store.recover_tasks().await?;
        if executions + tasks > 0 {
            tracing::info!(executions, tasks, "recovery returned in-flight jobs to pending");
        }
        Ok(RecoveryReport { executions, tasks })
    }

    /// Request cancellation of an execution: durable CANCEL_REQUESTED
    /// flip plus a signal to the local token when the job runs here.
    pub async fn cancel_execution(
        &self,
        id: &ExecutionId,
    ) -> Result<CancelDisposition, EngineError> {
        let disposition = self.store.request_cancel_execution(id).await?;
        if disposition == CancelDisposition::Requested {
            let signaled = self.cancels.signal(id.as_str());
            tracing::info!(execution_id = %id, signaled, "execution cancel requested");
        }
        Ok(disposition)
    }

    /// Request cancellation of an inference task.
    pub async fn cancel_task(&self, id: &TaskId) -> Result<CancelDisposition, EngineError> {
        let disposition = self.store.request_cancel_task(id).await?;
        if disposition == CancelDisposition::Requested {
            let signaled = self.cancels.signal(id.as_str());
            tracing::info!(task_id = %id, signaled, "inference cancel requested");
        }
        Ok(disposition)
    }

    /// Finalize cancel-requested executions that no worker ever leased,
    /// publishing their terminal events.
    pub async fn reap_canceled_executions(&self) -> Result<usize, EngineError> {
        let now = self.now_ms();
        let reaped = self.store.reap_canceled_executions(now).await?;
        for id in &reaped {
            self.hub.publish(
                &execution_channel(id),
                StreamEvent::Finished {
                    execution_id: id.clone(),
                    data: FinishedData {
                        status: JobStatus::Canceled,
                        final_result: None,
                        error: None,
                    },
                    ts: now,
                },
            );
            tracing::info!(execution_id = %id, "canceled before dispatch");
        }
        Ok(reaped.len())
    }

    /// Finalize cancel-requested inference tasks that were never leased.
    pub async fn reap_canceled_tasks(&self) -> Result<usize, EngineError> {
        let now = self.now_ms();
        let reaped = self.store.reap_canceled_tasks(now).await?;
        for id in &reaped {
            self.hub.publish(
                &inference_channel(id),
                StreamEvent::Canceled { task_id: id.clone(), ts: now },
            );
            tracing::info!(task_id = %id, "canceled before dispatch");
        }
        Ok(reaped.len())
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
