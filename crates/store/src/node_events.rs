// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only node-event log persistence.

use crate::db::Store;
use crate::error::StoreError;
use hub_core::{ExecutionId, NodeEvent, NodeEventDraft, NodeEventStatus};

impl Store {
    /// Append one node event; returns the assigned `event_id`.
    pub async fn append_node_event(
        &self,
        execution_id: &ExecutionId,
        draft: &NodeEventDraft,
    ) -> Result<i64, StoreError> {
        let event_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO node_events (
                execution_id, node_id, status, intermediate_output,
                started_at_ms, completed_at_ms, error_log
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING event_id
            "#,
        )
        .bind(execution_id.as_str())
        .bind(&draft.node_id)
        .bind(draft.status.as_str())
        .bind(draft.intermediate_output.as_ref().map(|v| v.to_string()))
        .bind(draft.started_at_ms)
        .bind(draft.completed_at_ms)
        .bind(draft.error_log.as_deref())
        .fetch_one(self.pool())
        .await?;
        Ok(event_id)
    }

    /// All node events for an execution, in log order.
    pub async fn node_events(
        &self,
        execution_id: &ExecutionId,
    ) -> Result<Vec<NodeEvent>, StoreError> {
        let rows: Vec<NodeEventRow> = sqlx::query_as(
            "SELECT * FROM node_events WHERE execution_id = ? ORDER BY event_id ASC",
        )
        .bind(execution_id.as_str())
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(NodeEventRow::into_event).collect()
    }
}

#[derive(sqlx::FromRow)]
struct NodeEventRow {
    event_id: i64,
    execution_id: String,
    node_id: String,
    status: String,
    intermediate_output: Option<String>,
    started_at_ms: Option<i64>,
    completed_at_ms: Option<i64>,
    error_log: Option<String>,
}

impl NodeEventRow {
    fn into_event(self) -> Result<NodeEvent, StoreError> {
        let status = NodeEventStatus::parse(&self.status).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "node event {} has unknown status {:?}",
                self.event_id, self.status
            ))
        })?;
        Ok(NodeEvent {
            event_id: self.event_id,
            execution_id: ExecutionId::new(self.execution_id),
            node_id: self.node_id,
            status,
            intermediate_output: self
                .intermediate_output
                .as_deref()
                .and_then(|s| serde_json::from_str(s).ok()),
            started_at_ms: self.started_at_ms,
            completed_at_ms: self.completed_at_ms,
            error_log: self.error_log,
        })
    }
}

#[cfg(test)]
#[path = "node_events_tests.rs"]
mod tests;
