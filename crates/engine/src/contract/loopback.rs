// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in echo collaborators.
//!
//! Wired by the shipped binary so a fresh install can exercise the full
//! queue machinery (leases, node events, token streaming, cancellation)
//! without a real graph interpreter or model backend.

use super::{AgentExecutor, ChatOutcome, GraphContext, ModelRunner, RunError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Executor that echoes the execution payload through a single node.
pub struct LoopbackExecutor;

#[async_trait]
impl AgentExecutor for LoopbackExecutor {
    async fn run_graph(&self, ctx: GraphContext) -> Result<Value, RunError> {
        ctx.nodes.started("loopback").await?;
        if ctx.cancel.is_cancelled() {
            return Err(RunError::Canceled);
        }
        let result = json!({ "echo": ctx.execution.payload });
        ctx.nodes.completed("loopback", Some(result.clone())).await?;
        Ok(result)
    }
}

/// Runner that streams the last user message back word by word.
pub struct LoopbackRunner;

/// Last `content` string in a chat message array, or the raw JSON text.
fn last_content(messages: &Value) -> String {
    messages
        .as_array()
        .and_then(|msgs| msgs.last())
        .and_then(|msg| msg.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| messages.to_string())
}

#[async_trait]
impl ModelRunner for LoopbackRunner {
    async fn ensure_loaded(&self, _model_id: &str) -> Result<(), RunError> {
        Ok(())
    }

    async fn run_chat(
        &self,
        messages: &Value,
        _parameters: &Value,
        on_token: &(dyn for<'a> Fn(&'a str) + Send + Sync),
        cancel: &CancellationToken,
    ) -> Result<ChatOutcome, RunError> {
        let content = last_content(messages);
        let started = Instant::now();
        let mut streamed = 0usize;
        for (i, word) in content.split_whitespace().enumerate() {
            if cancel.is_cancelled() {
                return Err(RunError::Canceled);
            }
            if i > 0 {
                on_token(" ");
                streamed += 1;
            }
            on_token(word);
            streamed += 1;
        }

        let elapsed = started.elapsed().as_secs_f64().max(0.001);
        Ok(ChatOutcome {
            result: json!({ "role": "assistant", "content": content }),
            tokens_per_second: streamed as f64 / elapsed,
        })
    }
}

#[cfg(test)]
#[path = "loopback_tests.rs"]
mod tests;
