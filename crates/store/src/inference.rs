// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inference queue persistence. Mirrors the execution queue, with a
//! throughput column and no node-event side table.

use crate::db::Store;
use crate::error::StoreError;
use crate::CancelDisposition;
use hub_core::{
    InferenceTask, JobOutcome, JobStatus, LeaseId, TaskId, AGING_BOOST, AGING_CAP,
    AGING_THRESHOLD_MS,
};
use serde_json::Value;

impl Store {
    /// Insert a fresh inference task.
    pub async fn insert_task(&self, task: &InferenceTask) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO inference_queue (
                task_id, model_id, status, prompt, parameters, result,
                base_priority, priority, enqueue_ts_ms, lease_id,
                lease_expires_at_ms, created_at_ms, started_at_ms,
                completed_at_ms, tokens_per_second, error_log
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(task.task_id.as_str())
        .bind(&task.model_id)
        .bind(task.status.as_str())
        .bind(task.prompt.to_string())
        .bind(task.parameters.to_string())
        .bind(task.result.as_ref().map(|v| v.to_string()))
        .bind(task.base_priority)
        .bind(task.priority)
        .bind(task.enqueue_ts_ms)
        .bind(task.lease_id.as_ref().map(|id| id.as_str().to_string()))
        .bind(task.lease_expires_at_ms)
        .bind(task.created_at_ms)
        .bind(task.started_at_ms)
        .bind(task.completed_at_ms)
        .bind(task.tokens_per_second)
        .bind(task.error_log.as_deref())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Fetch one task by id.
    pub async fn task(&self, id: &TaskId) -> Result<Option<InferenceTask>, StoreError> {
        let row: Option<TaskRow> =
            sqlx::query_as("SELECT * FROM inference_queue WHERE task_id = ?")
                .bind(id.as_str())
                .fetch_optional(self.pool())
                .await?;
        row.map(TaskRow::into_task).transpose()
    }

    /// Atomically claim the best pending task, if any. Same contract as
    /// the execution lease: at-most-once under worker contention.
    pub async fn lease_next_task(
        &self,
        now_ms: i64,
        ttl_ms: i64,
    ) -> Result<Option<InferenceTask>, StoreError> {
        let lease = LeaseId::generate();
        let row: Option<TaskRow> = sqlx::query_as(
            r#"
            UPDATE inference_queue SET
                status = 'RUNNING',
                lease_id = ?,
                lease_expires_at_ms = ?,
                started_at_ms = COALESCE(started_at_ms, ?)
            WHERE task_id = (
                SELECT task_id FROM inference_queue
                WHERE status = 'PENDING'
                ORDER BY priority DESC, enqueue_ts_ms ASC, task_id ASC
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
        row.map(TaskRow::into_task).transpose()
    }

    /// Write the terminal state for a leased task. Returns false when
    /// the lease guard did not match.
    pub async fn finalize_task(
        &self,
        id: &TaskId,
        lease: &LeaseId,
        outcome: &JobOutcome,
        tokens_per_second: Option<f64>,
        now_ms: i64,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE inference_queue SET
                status = ?,
                result = ?,
                error_log = ?,
                tokens_per_second = ?,
                completed_at_ms = ?,
                lease_id = NULL,
                lease_expires_at_ms = NULL
            WHERE task_id = ?
              AND lease_id = ?
              AND status IN ('RUNNING', 'CANCEL_REQUESTED')
            "#,
        )
        .bind(outcome.status().as_str())
        .bind(outcome.result().map(|v| v.to_string()))
        .bind(outcome.error_log())
        .bind(tokens_per_second)
        .bind(now_ms)
        .bind(id.as_str())
        .bind(lease.as_str())
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip a live task to CANCEL_REQUESTED.
    pub async fn request_cancel_task(
        &self,
        id: &TaskId,
    ) -> Result<CancelDisposition, StoreError> {
        let updated = sqlx::query(
            "UPDATE inference_queue SET status = 'CANCEL_REQUESTED' \
             WHERE task_id = ? AND status IN ('PENDING', 'RUNNING')",
        )
        .bind(id.as_str())
        .execute(self.pool())
        .await?;
        if updated.rows_affected() > 0 {
            return Ok(CancelDisposition::Requested);
        }

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM inference_queue WHERE task_id = ?")
                .bind(id.as_str())
                .fetch_optional(self.pool())
                .await?;
        Ok(match status.as_deref().and_then(JobStatus::parse) {
            None => CancelDisposition::NotFound,
            Some(JobStatus::CancelRequested) => CancelDisposition::Requested,
            Some(_) => CancelDisposition::AlreadyTerminal,
        })
    }

    /// Finalize cancel-requested tasks that were never leased.
    pub async fn reap_canceled_tasks(&self, now_ms: i64) -> Result<Vec<TaskId>, StoreError> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            UPDATE inference_queue SET
                status = 'CANCELED',
                completed_at_ms = ?,
                lease_id = NULL,
                lease_expires_at_ms = NULL
            WHERE status = 'CANCEL_REQUESTED' AND lease_id IS NULL
            RETURNING task_id
            "#,
        )
        .bind(now_ms)
        .fetch_all(self.pool())
        .await?;
        Ok(ids.into_iter().map(TaskId::new).collect())
    }

    /// One aging pass over the inference queue.
    pub async fn age_pending_tasks(&self, now_ms: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE inference_queue SET priority = MIN(priority + ?, ?)
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

    /// Return all in-flight tasks to PENDING and clear their leases.
    pub async fn recover_tasks(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE inference_queue SET
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

    /// Status → row count for the inference queue.
    pub async fn task_status_counts(&self) -> Result<Vec<(String, i64)>, StoreError> {
        let counts = sqlx::query_as(
            "SELECT status, COUNT(*) FROM inference_queue GROUP BY status ORDER BY status",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(counts)
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    task_id: String,
    model_id: String,
    status: String,
    prompt: String,
    parameters: String,
    result: Option<String>,
    base_priority: i64,
    priority: i64,
    enqueue_ts_ms: i64,
    lease_id: Option<String>,
    lease_expires_at_ms: Option<i64>,
    created_at_ms: i64,
    started_at_ms: Option<i64>,
    completed_at_ms: Option<i64>,
    tokens_per_second: Option<f64>,
    error_log: Option<String>,
}

impl TaskRow {
    fn into_task(self) -> Result<InferenceTask, StoreError> {
        let status = JobStatus::parse(&self.status).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "task {} has unknown status {:?}",
                self.task_id, self.status
            ))
        })?;
        Ok(InferenceTask {
            task_id: TaskId::new(self.task_id),
            model_id: self.model_id,
            status,
            prompt: serde_json::from_str(&self.prompt).unwrap_or(Value::Null),
            parameters: serde_json::from_str(&self.parameters).unwrap_or(Value::Null),
            result: self.result.as_deref().and_then(|s| serde_json::from_str(s).ok()),
            base_priority: self.base_priority,
            priority: self.priority,
            enqueue_ts_ms: self.enqueue_ts_ms,
            lease_id: self.lease_id.map(LeaseId::new),
            lease_expires_at_ms: self.lease_expires_at_ms,
            created_at_ms: self.created_at_ms,
            started_at_ms: self.started_at_ms,
            completed_at_ms: self.completed_at_ms,
            tokens_per_second: self.tokens_per_second,
            error_log: self.error_log,
        })
    }
}

#[cfg(test)]
#[path = "inference_tests.rs"]
mod tests;
