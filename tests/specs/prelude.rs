// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the scenario specs.

#![allow(dead_code)]

pub use hub_core::{
    execution_channel, inference_channel, Execution, ExecutionId, FakeClock, InferenceTask,
    JobSource, JobStatus, StreamEvent, TaskId,
};
pub use hub_engine::{
    AgentExecutor, AgentWorker, ChatOutcome, Engine, EnqueueExecution, EnqueueInference,
    GraphContext, InferenceWorker, ModelRunner, RunError, StaticConfigLoader,
};
pub use hub_store::Store;
pub use serde_json::{json, Value};
pub use std::sync::{Arc, Mutex};
pub use std::time::Duration;
pub use tokio_util::sync::CancellationToken;

use async_trait::async_trait;
use std::path::Path;

/// How long a spec waits for an asynchronous state change.
pub const SPEC_WAIT_MAX: Duration = Duration::from_secs(10);

pub async fn memory_engine() -> Arc<Engine> {
    let store = Store::memory().await.unwrap();
    Arc::new(Engine::new(store, Arc::new(hub_core::SystemClock)))
}

pub async fn memory_engine_with_clock() -> (Arc<Engine>, Arc<FakeClock>) {
    let store = Store::memory().await.unwrap();
    let clock = Arc::new(FakeClock::new());
    (Arc::new(Engine::new(store, clock.clone())), clock)
}

/// File-backed engine, for specs that exercise real multi-connection
/// contention or restart semantics.
pub async fn file_engine(path: &Path) -> Arc<Engine> {
    let store = Store::open(path).await.unwrap();
    Arc::new(Engine::new(store, Arc::new(hub_core::SystemClock)))
}

pub fn manual_run(agent_id: &str, payload: Value) -> EnqueueExecution {
    EnqueueExecution {
        agent_id: agent_id.into(),
        payload,
        source: JobSource::ManualRun,
        parent_execution_id: None,
        parent_priority: None,
    }
}

pub fn execution_from(source: JobSource) -> EnqueueExecution {
    EnqueueExecution {
        agent_id: "agent-1".into(),
        payload: json!({}),
        source,
        parent_execution_id: None,
        parent_priority: None,
    }
}

pub fn chat(content: &str) -> EnqueueInference {
    EnqueueInference {
        model_id: "llama-3".into(),
        messages: json!([{"role": "user", "content": content}]),
        parameters: json!({}),
        source: JobSource::Chat,
        parent_priority: None,
    }
}

pub async fn wait_for_execution_status(
    engine: &Engine,
    id: &ExecutionId,
    status: JobStatus,
) -> Execution {
    tokio::time::timeout(SPEC_WAIT_MAX, async {
        loop {
            if let Some(row) = engine.store().execution(id).await.unwrap() {
                if row.status == status {
                    return row;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("execution {id} never reached {status}"))
}

pub async fn wait_for_task_status(engine: &Engine, id: &TaskId, status: JobStatus) -> InferenceTask {
    tokio::time::timeout(SPEC_WAIT_MAX, async {
        loop {
            if let Some(row) = engine.store().task(id).await.unwrap() {
                if row.status == status {
                    return row;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("task {id} never reached {status}"))
}

/// Executor that records the order it saw executions in, then succeeds.
pub struct RecordingExecutor {
    pub seen: Arc<Mutex<Vec<ExecutionId>>>,
}

impl RecordingExecutor {
    pub fn new() -> (Self, Arc<Mutex<Vec<ExecutionId>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (Self { seen: seen.clone() }, seen)
    }
}

#[async_trait]
impl AgentExecutor for RecordingExecutor {
    async fn run_graph(&self, ctx: GraphContext) -> Result<Value, RunError> {
        self.seen.lock().unwrap().push(ctx.execution.execution_id.clone());
        Ok(json!(null))
    }
}

/// Executor that parks on the cancellation token, like a long agent run.
pub struct BlockingExecutor;

#[async_trait]
impl AgentExecutor for BlockingExecutor {
    async fn run_graph(&self, ctx: GraphContext) -> Result<Value, RunError> {
        ctx.cancel.cancelled().await;
        Err(RunError::Canceled)
    }
}

/// Runner that records the requests it served. The runner contract has
/// no task id, so specs identify tasks by unique message content.
pub struct RecordingRunner {
    pub served: Arc<Mutex<Vec<String>>>,
}

impl RecordingRunner {
    pub fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let served = Arc::new(Mutex::new(Vec::new()));
        (Self { served: served.clone() }, served)
    }
}

/// Last `content` string in a chat message array.
pub fn last_content(messages: &Value) -> String {
    messages
        .as_array()
        .and_then(|msgs| msgs.last())
        .and_then(|msg| msg.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl ModelRunner for RecordingRunner {
    async fn ensure_loaded(&self, _model_id: &str) -> Result<(), RunError> {
        Ok(())
    }

    async fn run_chat(
        &self,
        messages: &Value,
        _parameters: &Value,
        _on_token: &(dyn for<'a> Fn(&'a str) + Send + Sync),
        _cancel: &CancellationToken,
    ) -> Result<ChatOutcome, RunError> {
        // A short pause keeps both workers busy at once, so the
        // at-most-once lease guarantee is actually contended.
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.served.lock().unwrap().push(last_content(messages));
        Ok(ChatOutcome {
            result: json!({"role": "assistant", "content": "ok"}),
            tokens_per_second: 10.0,
        })
    }
}
