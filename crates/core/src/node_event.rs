// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only node event log entries for executions.

use crate::id::ExecutionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Synthetic node id used for the event written when an execution's
/// input is accepted at enqueue time.
pub const INPUT_NODE_ID: &str = "input";

/// Status of a node event within an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeEventStatus {
    /// Input accepted (enqueue-time event on the `input` node).
    Received,
    Started,
    Completed,
    Failed,
}

impl NodeEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeEventStatus::Received => "RECEIVED",
            NodeEventStatus::Started => "STARTED",
            NodeEventStatus::Completed => "COMPLETED",
            NodeEventStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RECEIVED" => Some(NodeEventStatus::Received),
            "STARTED" => Some(NodeEventStatus::Started),
            "COMPLETED" => Some(NodeEventStatus::Completed),
            "FAILED" => Some(NodeEventStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for NodeEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted node event row. `event_id` is assigned by the store and
/// totally orders events within an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEvent {
    pub event_id: i64,
    pub execution_id: ExecutionId,
    pub node_id: String,
    pub status: NodeEventStatus,
    pub intermediate_output: Option<Value>,
    pub started_at_ms: Option<i64>,
    pub completed_at_ms: Option<i64>,
    pub error_log: Option<String>,
}

/// A node event about to be appended (no `event_id` yet).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEventDraft {
    pub node_id: String,
    pub status: NodeEventStatus,
    pub intermediate_output: Option<Value>,
    pub started_at_ms: Option<i64>,
    pub completed_at_ms: Option<i64>,
    pub error_log: Option<String>,
}

impl NodeEventDraft {
    /// Enqueue-time event recording the accepted input payload.
    pub fn received(payload: &Value, now_ms: i64) -> Self {
        Self {
            node_id: INPUT_NODE_ID.to_string(),
            status: NodeEventStatus::Received,
            intermediate_output: Some(payload.clone()),
            started_at_ms: Some(now_ms),
            completed_at_ms: Some(now_ms),
            error_log: None,
        }
    }

    pub fn started(node_id: impl Into<String>, now_ms: i64) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeEventStatus::Started,
            intermediate_output: None,
            started_at_ms: Some(now_ms),
            completed_at_ms: None,
            error_log: None,
        }
    }

    pub fn completed(node_id: impl Into<String>, output: Option<Value>, now_ms: i64) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeEventStatus::Completed,
            intermediate_output: output,
            started_at_ms: None,
            completed_at_ms: Some(now_ms),
            error_log: None,
        }
    }

    pub fn failed(node_id: impl Into<String>, error: impl Into<String>, now_ms: i64) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeEventStatus::Failed,
            intermediate_output: None,
            started_at_ms: None,
            completed_at_ms: Some(now_ms),
            error_log: Some(error.into()),
        }
    }
}

#[cfg(test)]
#[path = "node_event_tests.rs"]
mod tests;
