// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, worker supervision, graceful shutdown.

use crate::api::{self, AppState};
use crate::env;
use hub_core::SystemClock;
use hub_engine::{
    run_aging, AgentExecutor, AgentWorker, ConfigLoader, Engine, EngineError, InferenceWorker,
    LoopbackExecutor, LoopbackRunner, ModelRunner, StaticConfigLoader,
};
use hub_store::{Store, StoreError};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/hub)
    pub state_dir: PathBuf,
    /// Path to the queue database file
    pub db_path: PathBuf,
    /// HTTP/WebSocket listen address
    pub http_addr: SocketAddr,
    /// Parallel agent workers
    pub agent_workers: usize,
    /// Parallel inference workers
    pub inference_workers: usize,
    /// Worker idle poll sleep
    pub poll_interval: Duration,
    /// Aging loop period
    pub aging_interval: Duration,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        Ok(Self {
            db_path: state_dir.join("hub.db"),
            http_addr: env::http_addr()?,
            agent_workers: env::agent_workers(),
            inference_workers: env::inference_workers(),
            poll_interval: env::poll_interval(),
            aging_interval: env::aging_interval(),
            state_dir,
        })
    }
}

/// Errors from daemon startup and shutdown.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("cannot determine state directory (set HUB_STATE_DIR or HOME)")]
    NoStateDir,

    #[error("invalid listen address: {0:?}")]
    InvalidAddr(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// The external collaborators the workers dispatch to.
pub struct Collaborators {
    pub executor: Arc<dyn AgentExecutor>,
    pub runner: Arc<dyn ModelRunner>,
    pub configs: Arc<dyn ConfigLoader>,
}

impl Collaborators {
    /// Built-in echo collaborators, used by the shipped binary so a
    /// fresh install is exercisable end to end.
    pub fn loopback() -> Self {
        Self {
            executor: Arc::new(LoopbackExecutor),
            runner: Arc::new(LoopbackRunner),
            configs: Arc::new(StaticConfigLoader::default()),
        }
    }
}

/// Run the daemon until a shutdown signal arrives.
pub async fn run(config: Config, collaborators: Collaborators) -> Result<(), LifecycleError> {
    // 1. State directory (holds the database and log file)
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Open the store
    let store = Store::open(&config.db_path).await?;
    let engine = Arc::new(Engine::new(store.clone(), Arc::new(SystemClock)));

    // 3. Recovery MUST complete before any worker is allowed to lease:
    // after it, no row is RUNNING or CANCEL_REQUESTED.
    let report = engine.recover().await?;
    info!(
        executions = report.executions,
        tasks = report.tasks,
        "startup recovery complete"
    );

    // 4. Shutdown signal plumbing
    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone());

    // 5. Workers
    let mut tasks = Vec::new();
    for _ in 0..config.agent_workers {
        let worker = AgentWorker::new(
            engine.clone(),
            collaborators.executor.clone(),
            collaborators.configs.clone(),
        )
        .with_poll_interval(config.poll_interval);
        tasks.push(tokio::spawn(worker.run(shutdown.clone())));
    }
    for _ in 0..config.inference_workers {
        let worker = InferenceWorker::new(engine.clone(), collaborators.runner.clone())
            .with_poll_interval(config.poll_interval);
        tasks.push(tokio::spawn(worker.run(shutdown.clone())));
    }
    info!(
        agent_workers = config.agent_workers,
        inference_workers = config.inference_workers,
        "workers started"
    );

    // 6. Aging loop
    tasks.push(tokio::spawn(run_aging(
        engine.clone(),
        config.aging_interval,
        shutdown.clone(),
    )));

    // 7. HTTP listener
    let state = AppState { engine: engine.clone(), started_at: Instant::now() };
    let router = api::router(state);
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await?;

    // 8. Drain: workers finish their current job, then the WAL is
    // checkpointed. A hard kill instead of this path is repaired by
    // recovery on the next boot.
    for task in tasks {
        if let Err(error) = task.await {
            error!(%error, "background task panicked");
        }
    }
    store.checkpoint().await?;
    store.close().await;
    info!("daemon stopped");
    Ok(())
}

fn spawn_signal_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(error) => {
            error!(%error, "failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
        _ = terminate.recv() => info!("received SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received interrupt");
}
