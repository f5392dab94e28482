// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Enqueue service: validate, assign id and priority, insert.

use crate::error::EngineError;
use crate::runtime::Engine;
use hub_core::{Execution, ExecutionId, InferenceTask, JobSource, TaskId};
use serde_json::Value;

/// Request to enqueue an agent execution.
#[derive(Debug, Clone)]
pub struct EnqueueExecution {
    pub agent_id: String,
    pub payload: Value,
    pub source: JobSource,
    pub parent_execution_id: Option<ExecutionId>,
    pub parent_priority: Option<i64>,
}

/// Request to enqueue a model-inference task.
#[derive(Debug, Clone)]
pub struct EnqueueInference {
    pub model_id: String,
    pub messages: Value,
    pub parameters: Value,
    pub source: JobSource,
    pub parent_priority: Option<i64>,
}

impl Engine {
    /// Enqueue an execution. The row and its enqueue-time node event
    /// are written in one transaction; on failure no row exists.
    pub async fn enqueue_execution(
        &self,
        req: EnqueueExecution,
    ) -> Result<ExecutionId, EngineError> {
        if req.agent_id.trim().is_empty() {
            return Err(EngineError::InvalidInput("agent_id must not be empty".into()));
        }

        let execution = Execution::new(
            req.agent_id,
            req.payload,
            req.source,
            req.parent_execution_id,
            req.parent_priority,
            self.now_ms(),
        );
        self.store().insert_execution(&execution).await?;
        tracing::info!(
            execution_id = %execution.execution_id,
            agent_id = %execution.agent_id,
            source = %req.source,
            priority = execution.priority,
            "execution enqueued"
        );
        Ok(execution.execution_id)
    }

    /// Enqueue an inference task.
    pub async fn enqueue_inference(&self, req: EnqueueInference) -> Result<TaskId, EngineError> {
        if req.model_id.trim().is_empty() {
            return Err(EngineError::InvalidInput("model_id must not be empty".into()));
        }
        match req.messages.as_array() {
            Some(messages) if !messages.is_empty() => {}
            _ => {
                return Err(EngineError::InvalidInput(
                    "messages must be a non-empty array".into(),
                ))
            }
        }

        let task = InferenceTask::new(
            req.model_id,
            req.messages,
            req.parameters,
            req.source,
            req.parent_priority,
            self.now_ms(),
        );
        self.store().insert_task(&task).await?;
        tracing::info!(
            task_id = %task.task_id,
            model_id = %task.model_id,
            source = %req.source,
            priority = task.priority,
            "inference task enqueued"
        );
        Ok(task.task_id)
    }
}

#[cfg(test)]
#[path = "enqueue_tests.rs"]
mod tests;
