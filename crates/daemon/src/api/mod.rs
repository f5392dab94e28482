// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP/WebSocket surface over the engine.

mod admin;
mod error;
mod executions;
mod inference;
mod stream;

pub use error::ApiError;

use axum::routing::{get, post};
use axum::Router;
use hub_engine::Engine;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub started_at: Instant,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/executions/run", post(executions::run))
        .route("/executions/:id", get(executions::show))
        .route("/executions/:id/events", get(executions::events))
        .route("/executions/:id/cancel", post(executions::cancel))
        .route("/executions/:id/stream", get(stream::execution_stream))
        .route("/inference/chat", post(inference::chat))
        .route("/inference/:id", get(inference::show))
        .route("/inference/:id/cancel", post(inference::cancel))
        .route("/inference/:id/stream", get(stream::inference_stream))
        .route("/admin/health", get(admin::health))
        .route("/admin/queues", get(admin::queues))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
