// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Model-inference queue entity.

use crate::id::{LeaseId, TaskId};
use crate::priority::{effective_priority, JobSource};
use crate::status::JobStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One model request, as persisted in the `inference_queue` table.
///
/// `prompt` holds the chat messages and `parameters` the sampling
/// options; both are opaque blobs interpreted only by the model runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceTask {
    pub task_id: TaskId,
    pub model_id: String,
    pub status: JobStatus,
    pub prompt: Value,
    pub parameters: Value,
    pub result: Option<Value>,
    pub base_priority: i64,
    pub priority: i64,
    pub enqueue_ts_ms: i64,
    pub lease_id: Option<LeaseId>,
    pub lease_expires_at_ms: Option<i64>,
    pub created_at_ms: i64,
    pub started_at_ms: Option<i64>,
    pub completed_at_ms: Option<i64>,
    pub tokens_per_second: Option<f64>,
    pub error_log: Option<String>,
}

impl InferenceTask {
    /// Build a fresh PENDING task with its priority assigned.
    pub fn new(
        model_id: impl Into<String>,
        prompt: Value,
        parameters: Value,
        source: JobSource,
        parent_priority: Option<i64>,
        now_ms: i64,
    ) -> Self {
        let priority = effective_priority(source, parent_priority);
        Self {
            task_id: TaskId::generate(),
            model_id: model_id.into(),
            status: JobStatus::Pending,
            prompt,
            parameters,
            result: None,
            base_priority: source.base_priority(),
            priority,
            enqueue_ts_ms: now_ms,
            lease_id: None,
            lease_expires_at_ms: None,
            created_at_ms: now_ms,
            started_at_ms: None,
            completed_at_ms: None,
            tokens_per_second: None,
            error_log: None,
        }
    }
}
