// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! hubd: the hub orchestration daemon.

use hub_daemon::lifecycle::{run, Collaborators, Config};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log to stderr and, when the state directory is writable, to
/// `hubd.log` inside it. The returned guard must live for the whole
/// process so buffered lines get flushed.
fn init_tracing(state_dir: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_env("HUB_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match std::fs::create_dir_all(state_dir) {
        Ok(()) => {
            let file = tracing_appender::rolling::never(state_dir, "hubd.log");
            let (writer, guard) = tracing_appender::non_blocking(file);
            let file_layer =
                tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::registry().with(filter).with(stderr_layer).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("hubd: {error}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = init_tracing(&config.state_dir);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        db = %config.db_path.display(),
        addr = %config.http_addr,
        "hubd starting"
    );

    match run(config, Collaborators::loopback()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "daemon failed");
            ExitCode::FAILURE
        }
    }
}
