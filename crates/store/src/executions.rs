// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution queue persistence: enqueue, lease, finalize, cancel,
//! aging, and recovery.

use crate::db::Store;
use crate::error::StoreError;
use crate::CancelDisposition;
use hub_core::{
    Execution, ExecutionId, JobOutcome, JobStatus, LeaseId, NodeEventDraft, AGING_BOOST,
    AGING_CAP, AGING_THRESHOLD_MS,
};
use serde_json::Value;

impl Store {
    /// Insert a fresh execution and its enqueue-time `input` node event
    /// in one transaction. Either both rows exist afterwards or neither.
    pub async fn insert_execution(&self, exec: &Execution) -> Result<(), StoreError> {
        let mut tx = self.pool().begin().await?;
        sqlx::query(
            r#"
            INSERT INTO executions (
                execution_id, agent_id, status, parent_execution_id, payload,
                final_result, base_priority, priority, enqueue_ts_ms,
                lease_id, lease_expires_at_ms, created_at_ms, started_at_ms,
                completed_at_ms, error_log
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(exec.execution_id.as_str())
        .bind(&exec.agent_id)
        .bind(exec.status.as_str())
        .bind(exec.parent_execution_id.as_ref().map(|id| id.as_str().to_string()))
        .bind(exec.payload.to_string())
        .bind(exec.final_result.as_ref().map(|v| v.to_string()))
        .bind(exec.base_priority)
        .bind(exec.priority)
        .bind(exec.enqueue_ts_ms)
        .bind(exec.lease_id.as_ref().map(|id| id.as_str().to_string()))
        .bind(exec.lease_expires_at_ms)
        .bind(exec.created_at_ms)
        .bind(exec.started_at_ms)
        .bind(exec.completed_at_ms)
        .bind(exec.error_log.as_deref())
        .execute(&mut *tx)
        .await?;

        let input = NodeEventDraft::received(&exec.payload, exec.created_at_ms);
        sqlx::query(
            r#"
            INSERT INTO node_events (
                execution_id, node_id, status, intermediate_output,
                started_at_ms, completed_at_ms, error_log
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(exec.execution_id.as_str())
        .bind(&input.node_id)
        .bind(input.status.as_str())
        .bind(input.intermediate_output.as_ref().map(|v| v.to_string()))
        .bind(input.started_at_ms)
        .bind(input.completed_at_ms)
        .bind(input.error_log.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Fetch one execution by id.
    pub async fn execution(&self, id: &ExecutionId) -> Result<Option<Execution>, StoreError> {
        let row: Option<ExecutionRow> =
            sqlx::query_as("SELECT * FROM executions WHERE execution_id = ?")
                .bind(id.as_str())
                .fetch_optional(self.pool())
                .await?;
        row.map(ExecutionRow::into_execution).transpose()
    }

    /// Atomically claim the best pending execution, if any.
    ///
    /// One conditional update picks the highest-priority PENDING row
    /// (FIFO by `enqueue_ts_ms`, then id, among equals), flips it to
    /// RUNNING, stamps the lease, and returns it. Two racing workers
    /// can never both see the same row: the second update matches zero
    /// rows and returns nothing.
    pub async fn lease_next_execution(
        &self,
        now_ms: i64,
        ttl_ms: i64,
    ) -> Result<Option<Execution>, StoreError> {
        let lease = LeaseId::generate();
        let row: Option<ExecutionRow> = sqlx::query_as(
            r#"
            UPDATE executions SET
                status = 'RUNNING',
                lease_id = ?,
                lease_expires_at_ms = ?,
                started_at_ms = COALESCE(started_at_ms, ?)
            WHERE execution_id = (
                SELECT execution_id FROM executions
                WHERE status = 'PENDING'
                ORDER BY priority DESC, enqueue_ts_ms ASC, execution_id ASC
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(lease.as_str())
        .bind(now_ms + ttl_ms)
        .bind(now_ms)
        .fetch_optional(self.pool())
        .await?;
        row.map(ExecutionRow::into_execution).transpose()
    }

    /// Write the terminal state for a leased execution. Guarded by the
    /// lease id so a worker that lost its claim (crash + recovery +
    /// re-lease) cannot clobber the new owner's row. Returns false when
    /// the guard did not match.
    pub async fn finalize_execution(
        &self,
        id: &ExecutionId,
        lease: &LeaseId,
        outcome: &JobOutcome,
        now_ms: i64,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE executions SET
                status = ?,
                final_result = ?,
                error_log = ?,
                completed_at_ms = ?,
                lease_id = NULL,
                lease_expires_at_ms = NULL
            WHERE execution_id = ?
              AND lease_id = ?
              AND status IN ('RUNNING', 'CANCEL_REQUESTED')
            "#,
        )
        .bind(outcome.status().as_str())
        .bind(outcome.result().map(|v| v.to_string()))
        .bind(outcome.error_log())
        .bind(now_ms)
        .bind(id.as_str())
        .bind(lease.as_str())
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip a live execution to CANCEL_REQUESTED.
    pub async fn request_cancel_execution(
        &self,
        id: &ExecutionId,
    ) -> Result<CancelDisposition, StoreError> {
        let updated = sqlx::query(
            "UPDATE executions SET status = 'CANCEL_REQUESTED' \
             WHERE execution_id = ? AND status IN ('PENDING', 'RUNNING')",
        )
        .bind(id.as_str())
        .execute(self.pool())
        .await?;
        if updated.rows_affected() > 0 {
            return Ok(CancelDisposition::Requested);
        }

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM executions WHERE execution_id = ?")
                .bind(id.as_str())
                .fetch_optional(self.pool())
                .await?;
        Ok(match status.as_deref().and_then(JobStatus::parse) {
            None => CancelDisposition::NotFound,
            // Already requested: cancelling twice is the same request.
            Some(JobStatus::CancelRequested) => CancelDisposition::Requested,
            Some(_) => CancelDisposition::AlreadyTerminal,
        })
    }

    /// Finalize cancel-requested executions that were never leased.
    /// Returns the ids so the caller can publish their terminal events.
    pub async fn reap_canceled_executions(
        &self,
        now_ms: i64,
    ) -> Result<Vec<ExecutionId>, StoreError> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            UPDATE executions SET
                status = 'CANCELED',
                completed_at_ms = ?,
                lease_id = NULL,
                lease_expires_at_ms = NULL
            WHERE status = 'CANCEL_REQUESTED' AND lease_id IS NULL
            RETURNING execution_id
            "#,
        )
        .bind(now_ms)
        .fetch_all(self.pool())
        .await?;
        Ok(ids.into_iter().map(ExecutionId::new).collect())
    }

    /// One aging pass: lift long-waiting PENDING rows by the boost,
    /// bounded by the cap. RUNNING rows are immune by the status filter,
    /// so this races safely against lease selection.
    pub async fn age_pending_executions(&self, now_ms: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE executions SET priority = MIN(priority + ?, ?)
            WHERE status = 'PENDING' AND enqueue_ts_ms <= ? AND priority < ?
            "#,
        )
        .bind(AGING_BOOST)
        .bind(AGING_CAP)
        .bind(now_ms - AGING_THRESHOLD_MS)
        .bind(AGING_CAP)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected())
    }

    /// Return all in-flight executions to PENDING and clear their
    /// leases. Runs exactly once at boot, before any worker leases;
    /// idempotent, so a crash during recovery just reruns it.
    pub async fn recover_executions(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE executions SET
                status = 'PENDING',
                lease_id = NULL,
                lease_expires_at_ms = NULL
            WHERE status IN ('RUNNING', 'CANCEL_REQUESTED')
            "#,
        )
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected())
    }

    /// Status → row count for the executions queue.
    pub async fn execution_status_counts(&self) -> Result<Vec<(String, i64)>, StoreError> {
        let counts = sqlx::query_as(
            "SELECT status, COUNT(*) FROM executions GROUP BY status ORDER BY status",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(counts)
    }
}

#[derive(sqlx::FromRow)]
struct ExecutionRow {
    execution_id: String,
    agent_id: String,
    status: String,
    parent_execution_id: Option<String>,
    payload: String,
    final_result: Option<String>,
    base_priority: i64,
    priority: i64,
    enqueue_ts_ms: i64,
    lease_id: Option<String>,
    lease_expires_at_ms: Option<i64>,
    created_at_ms: i64,
    started_at_ms: Option<i64>,
    completed_at_ms: Option<i64>,
    error_log: Option<String>,
}

impl ExecutionRow {
    fn into_execution(self) -> Result<Execution, StoreError> {
        let status = JobStatus::parse(&self.status).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "execution {} has unknown status {:?}",
                self.execution_id, self.status
            ))
        })?;
        Ok(Execution {
            execution_id: ExecutionId::new(self.execution_id),
            agent_id: self.agent_id,
            status,
            parent_execution_id: self.parent_execution_id.map(ExecutionId::new),
            payload: serde_json::from_str(&self.payload).unwrap_or(Value::Null),
            final_result: self.final_result.as_deref().and_then(|s| serde_json::from_str(s).ok()),
            base_priority: self.base_priority,
            priority: self.priority,
            enqueue_ts_ms: self.enqueue_ts_ms,
            lease_id: self.lease_id.map(LeaseId::new),
            lease_expires_at_ms: self.lease_expires_at_ms,
            created_at_ms: self.created_at_ms,
            started_at_ms: self.started_at_ms,
            completed_at_ms: self.completed_at_ms,
            error_log: self.error_log,
        })
    }
}

#[cfg(test)]
#[path = "executions_tests.rs"]
mod tests;
