// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin endpoints: liveness and queue statistics.

use super::{ApiError, AppState};
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sqlite_version: String,
    pub uptime_sec: u64,
}

/// GET /admin/health — probes the database live; a failed probe
/// surfaces as a 500 rather than a degraded body.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let sqlite_version = state.engine.store().sqlite_version().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        sqlite_version,
        uptime_sec: state.started_at.elapsed().as_secs(),
    }))
}

#[derive(Debug, Serialize)]
pub struct QueuesResponse {
    pub executions: BTreeMap<String, i64>,
    pub inference: BTreeMap<String, i64>,
}

/// GET /admin/queues — status → row count per queue.
pub async fn queues(State(state): State<AppState>) -> Result<Json<QueuesResponse>, ApiError> {
    let executions = state.engine.store().execution_status_counts().await?;
    let inference = state.engine.store().task_status_counts().await?;
    Ok(Json(QueuesResponse {
        executions: executions.into_iter().collect(),
        inference: inference.into_iter().collect(),
    }))
}
