// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inference endpoints: enqueue chat, inspect, cancel.

use super::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::Json;
use hub_core::{InferenceTask, JobSource, TaskId};
use hub_engine::EnqueueInference;
use hub_store::CancelDisposition;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub model_id: String,
    pub messages: Value,
    #[serde(default)]
    pub parameters: Value,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub task_id: TaskId,
    pub status: &'static str,
}

/// POST /inference/chat — enqueue with source CHAT.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let task_id = state
        .engine
        .enqueue_inference(EnqueueInference {
            model_id: req.model_id,
            messages: req.messages,
            parameters: req.parameters,
            source: JobSource::Chat,
            parent_priority: None,
        })
        .await?;
    Ok(Json(ChatResponse { task_id, status: "QUEUED" }))
}

/// GET /inference/{id} — the full row.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InferenceTask>, ApiError> {
    let task = state.engine.store().task(&TaskId::new(id)).await?;
    task.map(Json).ok_or(ApiError::NotFound)
}

/// POST /inference/{id}/cancel — request cooperative cancellation.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.engine.cancel_task(&TaskId::new(id)).await? {
        CancelDisposition::NotFound => Err(ApiError::NotFound),
        CancelDisposition::Requested | CancelDisposition::AlreadyTerminal => {
            Ok(Json(json!({ "status": "cancel_requested" })))
        }
    }
}
