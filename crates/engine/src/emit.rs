// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node-event emitter handed to agent executors.
//!
//! Every node transition is written twice: appended to the durable
//! `node_events` log and published on the execution's channel. The log
//! is authoritative; the channel is best-effort fan-out.

use crate::contract::RunError;
use crate::hub::EventHub;
use hub_core::{
    execution_channel, Clock, ExecutionId, NodeData, NodeEventDraft, StreamEvent,
};
use hub_store::Store;
use serde_json::Value;
use std::sync::Arc;

/// Emitter bound to one execution's node-event log and channel.
#[derive(Clone)]
pub struct NodeEmitter {
    store: Store,
    hub: Arc<EventHub>,
    clock: Arc<dyn Clock>,
    execution_id: ExecutionId,
}

impl NodeEmitter {
    pub(crate) fn new(
        store: Store,
        hub: Arc<EventHub>,
        clock: Arc<dyn Clock>,
        execution_id: ExecutionId,
    ) -> Self {
        Self { store, hub, clock, execution_id }
    }

    /// Record that a node began executing.
    pub async fn started(&self, node_id: &str) -> Result<(), RunError> {
        let now = self.clock.epoch_ms();
        self.record(NodeEventDraft::started(node_id, now), now).await
    }

    /// Record that a node finished, with its intermediate output.
    pub async fn completed(&self, node_id: &str, output: Option<Value>) -> Result<(), RunError> {
        let now = self.clock.epoch_ms();
        self.record(NodeEventDraft::completed(node_id, output, now), now).await
    }

    /// Record that a node failed.
    pub async fn failed(&self, node_id: &str, error: &str) -> Result<(), RunError> {
        let now = self.clock.epoch_ms();
        self.record(NodeEventDraft::failed(node_id, error, now), now).await
    }

    async fn record(&self, draft: NodeEventDraft, now_ms: i64) -> Result<(), RunError> {
        self.store
            .append_node_event(&self.execution_id, &draft)
            .await
            .map_err(|e| RunError::failed(format!("node event write failed: {e}")))?;
        self.hub.publish(
            &execution_channel(&self.execution_id),
            StreamEvent::Node {
                execution_id: self.execution_id.clone(),
                data: NodeData {
                    node_id: draft.node_id,
                    status: draft.status,
                    output: draft.intermediate_output,
                },
                ts: now_ms,
            },
        );
        Ok(())
    }
}
