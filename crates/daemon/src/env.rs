// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use crate::lifecycle::LifecycleError;
use hub_core::AGING_INTERVAL;
use hub_engine::DEFAULT_POLL_INTERVAL;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default HTTP listen address.
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8160";

/// Resolve state directory: HUB_STATE_DIR > XDG_STATE_HOME/hub > ~/.local/state/hub
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("HUB_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("hub"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/hub"))
}

/// HTTP listen address (`HUB_HTTP_ADDR`).
pub fn http_addr() -> Result<SocketAddr, LifecycleError> {
    let raw = std::env::var("HUB_HTTP_ADDR").unwrap_or_else(|_| DEFAULT_HTTP_ADDR.to_string());
    raw.parse().map_err(|_| LifecycleError::InvalidAddr(raw))
}

/// Number of agent workers (`HUB_AGENT_WORKERS`, default 1).
pub fn agent_workers() -> usize {
    worker_count("HUB_AGENT_WORKERS")
}

/// Number of inference workers (`HUB_INFERENCE_WORKERS`, default 1).
pub fn inference_workers() -> usize {
    worker_count("HUB_INFERENCE_WORKERS")
}

fn worker_count(var: &str) -> usize {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

/// Worker idle poll sleep override (`HUB_POLL_INTERVAL_MS`).
pub fn poll_interval() -> Duration {
    std::env::var("HUB_POLL_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_POLL_INTERVAL)
}

/// Aging loop period override (`HUB_AGING_INTERVAL_MS`).
pub fn aging_interval() -> Duration {
    std::env::var("HUB_AGING_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(AGING_INTERVAL)
}
