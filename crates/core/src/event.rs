// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream events published on per-job channels.
//!
//! Inference channels (`inference:{task_id}`) carry the wire schema the
//! streaming endpoint forwards verbatim: TOKEN* then exactly one of
//! DONE / ERROR / CANCELED. Execution channels (`execution:{id}`) carry
//! NODE transitions and a single FINISHED terminal event.

use crate::id::{ExecutionId, TaskId};
use crate::node_event::NodeEventStatus;
use crate::status::JobStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channel name for an execution's event stream.
pub fn execution_channel(id: &ExecutionId) -> String {
    format!("execution:{id}")
}

/// Channel name for an inference task's event stream.
pub fn inference_channel(id: &TaskId) -> String {
    format!("inference:{id}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenData {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoneData {
    pub result: Value,
    pub tokens_per_second: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorData {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub node_id: String,
    pub status: NodeEventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedData {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One event on a job channel. Serializes with a `type` tag matching
/// the external protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "TOKEN")]
    Token { task_id: TaskId, data: TokenData, ts: i64 },

    #[serde(rename = "DONE")]
    Done { task_id: TaskId, data: DoneData, ts: i64 },

    #[serde(rename = "CANCELED")]
    Canceled { task_id: TaskId, ts: i64 },

    #[serde(rename = "ERROR")]
    Error { task_id: TaskId, data: ErrorData, ts: i64 },

    #[serde(rename = "NODE")]
    Node { execution_id: ExecutionId, data: NodeData, ts: i64 },

    #[serde(rename = "FINISHED")]
    Finished { execution_id: ExecutionId, data: FinishedData, ts: i64 },
}

impl StreamEvent {
    /// True for the events that end a channel's stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Done { .. }
                | StreamEvent::Canceled { .. }
                | StreamEvent::Error { .. }
                | StreamEvent::Finished { .. }
        )
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
