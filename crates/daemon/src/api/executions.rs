// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution endpoints: enqueue, inspect, node events, cancel.

use super::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::Json;
use hub_core::{Execution, ExecutionId, JobSource, NodeEvent};
use hub_engine::EnqueueExecution;
use hub_store::CancelDisposition;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub agent_id: String,
    #[serde(default)]
    pub input: Value,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub execution_id: ExecutionId,
    pub status: &'static str,
}

/// POST /executions/run — enqueue with source MANUAL_RUN.
pub async fn run(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    let execution_id = state
        .engine
        .enqueue_execution(EnqueueExecution {
            agent_id: req.agent_id,
            payload: req.input,
            source: JobSource::ManualRun,
            parent_execution_id: None,
            parent_priority: None,
        })
        .await?;
    Ok(Json(RunResponse { execution_id, status: "QUEUED" }))
}

/// GET /executions/{id} — the full row.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Execution>, ApiError> {
    let execution = state.engine.store().execution(&ExecutionId::new(id)).await?;
    execution.map(Json).ok_or(ApiError::NotFound)
}

/// GET /executions/{id}/events — the durable node-event log.
pub async fn events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<NodeEvent>>, ApiError> {
    let id = ExecutionId::new(id);
    if state.engine.store().execution(&id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let events = state.engine.store().node_events(&id).await?;
    Ok(Json(events))
}

/// POST /executions/{id}/cancel — request cooperative cancellation.
/// Cancelling an already-terminal execution is a successful no-op.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.engine.cancel_execution(&ExecutionId::new(id)).await? {
        CancelDisposition::NotFound => Err(ApiError::NotFound),
        CancelDisposition::Requested | CancelDisposition::AlreadyTerminal => {
            Ok(Json(json!({ "status": "cancel_requested" })))
        }
    }
}
