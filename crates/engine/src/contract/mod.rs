// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contracts for the external collaborators the workers dispatch to.
//!
//! The engine does not interpret agent graphs or load model weights; it
//! hands a leased job to an [`AgentExecutor`] or [`ModelRunner`] and
//! records whatever comes back. If the process dies after an executor
//! returns but before finalization is written, recovery re-queues the
//! job and the executor runs again — implementations must be idempotent
//! or tolerate duplicate side effects.

mod loopback;

pub use loopback::{LoopbackExecutor, LoopbackRunner};

use crate::emit::NodeEmitter;
use async_trait::async_trait;
use hub_core::Execution;
use hub_store::Store;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Failure modes of an executor or runner invocation.
#[derive(Debug, Error)]
pub enum RunError {
    /// The cancellation token was observed at a cooperative checkpoint.
    #[error("canceled")]
    Canceled,

    #[error("{message}")]
    Failed {
        message: String,
        /// Collaborator-provided traceback, when one exists.
        trace: Option<String>,
    },
}

impl RunError {
    pub fn failed(message: impl Into<String>) -> Self {
        RunError::Failed { message: message.into(), trace: None }
    }

    /// Formatted error text for the job row's `error_log` column.
    pub fn error_log(&self) -> String {
        match self {
            RunError::Canceled => "canceled".to_string(),
            RunError::Failed { message, trace: Some(trace) } => format!("{message}\n{trace}"),
            RunError::Failed { message, trace: None } => message.clone(),
        }
    }
}

/// Everything an executor gets for one run: the leased row, the loaded
/// agent config, a durable-store handle, a node-event emitter bound to
/// this execution's channel, and the cooperative cancellation token.
/// Node-type registries and similar interpreter state belong to the
/// executor implementation itself.
pub struct GraphContext {
    pub execution: Execution,
    pub config: Value,
    pub store: Store,
    pub nodes: NodeEmitter,
    pub cancel: CancellationToken,
}

/// Runs an agent graph to completion.
#[async_trait]
pub trait AgentExecutor: Send + Sync + 'static {
    /// Run the graph for the given execution. May emit node events at
    /// any point via `ctx.nodes`; should observe `ctx.cancel` at
    /// cooperative checkpoints and return [`RunError::Canceled`].
    async fn run_graph(&self, ctx: GraphContext) -> Result<Value, RunError>;
}

/// Successful chat inference: the final message plus measured
/// generation throughput.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    pub result: Value,
    pub tokens_per_second: f64,
}

/// Serves model-inference requests, streaming tokens as they decode.
#[async_trait]
pub trait ModelRunner: Send + Sync + 'static {
    /// Make sure the model is resident before the first token.
    async fn ensure_loaded(&self, model_id: &str) -> Result<(), RunError>;

    /// Run one chat request. `on_token` is called once per streamed
    /// token; `cancel` should be checked between tokens.
    async fn run_chat(
        &self,
        messages: &Value,
        parameters: &Value,
        on_token: &(dyn for<'a> Fn(&'a str) + Send + Sync),
        cancel: &CancellationToken,
    ) -> Result<ChatOutcome, RunError>;
}

/// Resolves an agent id to its config blob. The blob is opaque to the
/// engine; it is passed through to the executor untouched.
#[async_trait]
pub trait ConfigLoader: Send + Sync + 'static {
    async fn load_config(&self, agent_id: &str) -> Result<Value, RunError>;
}

/// Config loader that returns the same blob for every agent.
pub struct StaticConfigLoader {
    config: Value,
}

impl StaticConfigLoader {
    pub fn new(config: Value) -> Self {
        Self { config }
    }
}

impl Default for StaticConfigLoader {
    fn default() -> Self {
        Self::new(Value::Object(serde_json::Map::new()))
    }
}

#[async_trait]
impl ConfigLoader for StaticConfigLoader {
    async fn load_config(&self, _agent_id: &str) -> Result<Value, RunError> {
        Ok(self.config.clone())
    }
}
