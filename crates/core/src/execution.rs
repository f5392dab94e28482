// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent execution queue entity.

use crate::id::{ExecutionId, LeaseId};
use crate::priority::{effective_priority, JobSource};
use crate::status::JobStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One agent run, as persisted in the `executions` table.
///
/// The payload is an opaque blob at the engine boundary; its shape
/// belongs to the agent executor contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub execution_id: ExecutionId,
    pub agent_id: String,
    pub status: JobStatus,
    pub parent_execution_id: Option<ExecutionId>,
    pub payload: Value,
    pub final_result: Option<Value>,
    pub base_priority: i64,
    pub priority: i64,
    pub enqueue_ts_ms: i64,
    pub lease_id: Option<LeaseId>,
    pub lease_expires_at_ms: Option<i64>,
    pub created_at_ms: i64,
    pub started_at_ms: Option<i64>,
    pub completed_at_ms: Option<i64>,
    pub error_log: Option<String>,
}

impl Execution {
    /// Build a fresh PENDING execution with its priority assigned.
    pub fn new(
        agent_id: impl Into<String>,
        payload: Value,
        source: JobSource,
        parent_execution_id: Option<ExecutionId>,
        parent_priority: Option<i64>,
        now_ms: i64,
    ) -> Self {
        let priority = effective_priority(source, parent_priority);
        Self {
            execution_id: ExecutionId::generate(),
            agent_id: agent_id.into(),
            status: JobStatus::Pending,
            parent_execution_id,
            payload,
            final_result: None,
            base_priority: source.base_priority(),
            priority,
            enqueue_ts_ms: now_ms,
            lease_id: None,
            lease_expires_at_ms: None,
            created_at_ms: now_ms,
            started_at_ms: None,
            completed_at_ms: None,
            error_log: None,
        }
    }
}
