// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket bridges from the event hub to external subscribers.
//!
//! Subscribe-then-snapshot ordering: the handler subscribes to the
//! channel before reading the row, so a terminal event landing between
//! the two is seen either in the snapshot or on the channel, never
//! neither. A client connecting after the job finished gets one
//! synthesized terminal event built from the row, preserving the
//! exactly-one-terminal-event guarantee.

use super::{ApiError, AppState};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use hub_core::{
    execution_channel, inference_channel, DoneData, ErrorData, Execution, ExecutionId,
    FinishedData, InferenceTask, JobStatus, StreamEvent, TaskId,
};
use serde_json::Value;
use tokio::sync::broadcast;

/// GET /inference/{id}/stream — push TOKEN events until the terminal
/// DONE/ERROR/CANCELED, then close.
pub async fn inference_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let id = TaskId::new(id);
    if state.engine.store().task(&id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    Ok(ws.on_upgrade(move |socket| stream_task(state, id, socket)))
}

/// GET /executions/{id}/stream — push NODE events until FINISHED.
pub async fn execution_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let id = ExecutionId::new(id);
    if state.engine.store().execution(&id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    Ok(ws.on_upgrade(move |socket| stream_execution(state, id, socket)))
}

async fn stream_task(state: AppState, id: TaskId, mut socket: WebSocket) {
    let mut rx = state.engine.hub().subscribe(&inference_channel(&id));
    let snapshot = match state.engine.store().task(&id).await {
        Ok(Some(task)) => task,
        Ok(None) => {
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
        Err(error) => {
            tracing::error!(task_id = %id, %error, "stream snapshot read failed");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    if snapshot.status.is_terminal() {
        let event = terminal_task_event(&snapshot, state.engine.now_ms());
        let _ = send_event(&mut socket, &event).await;
    } else {
        forward_until_terminal(&mut socket, &mut rx).await;
    }
    let _ = socket.send(Message::Close(None)).await;
}

async fn stream_execution(state: AppState, id: ExecutionId, mut socket: WebSocket) {
    let mut rx = state.engine.hub().subscribe(&execution_channel(&id));
    let snapshot = match state.engine.store().execution(&id).await {
        Ok(Some(execution)) => execution,
        Ok(None) => {
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
        Err(error) => {
            tracing::error!(execution_id = %id, %error, "stream snapshot read failed");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    if snapshot.status.is_terminal() {
        let event = terminal_execution_event(&snapshot, state.engine.now_ms());
        let _ = send_event(&mut socket, &event).await;
    } else {
        forward_until_terminal(&mut socket, &mut rx).await;
    }
    let _ = socket.send(Message::Close(None)).await;
}

/// Pump channel events to the socket until a terminal event, the
/// channel closes, or the client goes away.
async fn forward_until_terminal(
    socket: &mut WebSocket,
    rx: &mut broadcast::Receiver<StreamEvent>,
) {
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    if !send_event(socket, &event).await || terminal {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "stream subscriber lagged; events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &StreamEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(text) => socket.send(Message::Text(text)).await.is_ok(),
        Err(error) => {
            tracing::error!(%error, "stream event serialization failed");
            false
        }
    }
}

fn terminal_task_event(task: &InferenceTask, ts: i64) -> StreamEvent {
    match task.status {
        JobStatus::Completed => StreamEvent::Done {
            task_id: task.task_id.clone(),
            data: DoneData {
                result: task.result.clone().unwrap_or(Value::Null),
                tokens_per_second: task.tokens_per_second.unwrap_or(0.0),
            },
            ts,
        },
        JobStatus::Canceled => StreamEvent::Canceled { task_id: task.task_id.clone(), ts },
        _ => StreamEvent::Error {
            task_id: task.task_id.clone(),
            data: ErrorData {
                message: task.error_log.clone().unwrap_or_else(|| "inference failed".into()),
                trace: None,
            },
            ts,
        },
    }
}

fn terminal_execution_event(execution: &Execution, ts: i64) -> StreamEvent {
    StreamEvent::Finished {
        execution_id: execution.execution_id.clone(),
        data: FinishedData {
            status: execution.status,
            final_result: execution.final_result.clone(),
            error: execution.error_log.clone(),
        },
        ts,
    }
}
