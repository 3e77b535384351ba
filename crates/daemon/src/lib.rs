// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! avian-daemon (aviand)
//!
//! The orchestrator process: hosts the HTTP RPC surface and runs the
//! queue loop, the liveness monitor and the log janitor.

pub mod env;
pub mod privilege;
pub mod protocol;
pub mod router;
pub mod services;

use avian_core::{Clock, SystemClock};
use avian_engine::{Monitor, Queue, RunnerLogs};
use avian_remote::PowerShell;
use avian_store::Store;
use router::AppState;
use services::{HostService, LicenceService, RunnerService};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("{0}")]
    Startup(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the orchestrator until the process exits.
pub async fn run() -> Result<(), DaemonError> {
    privilege::ensure_admin().map_err(|e| DaemonError::Startup(e.to_string()))?;

    let config = env::Config::from_env();
    let _log_guard = setup_logging(&config)?;
    info!(address = %config.address, port = config.port, "starting avian service");

    let store = Store::open(&config.state_dir).map_err(|e| DaemonError::Startup(e.to_string()))?;
    let shell = PowerShell::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let logs = Arc::new(RunnerLogs::new(&config.log_dir, Arc::clone(&clock)));
    let service_url = config.service_url();

    // The three background loops. Shutdown is by process exit.
    tokio::spawn(
        Queue::new(
            store.clone(),
            shell.clone(),
            Arc::clone(&logs),
            service_url.clone(),
        )
        .run(),
    );
    tokio::spawn(
        Monitor::new(
            store.clone(),
            shell.clone(),
            Arc::clone(&logs),
            Arc::clone(&clock),
        )
        .run(),
    );
    tokio::spawn(Arc::clone(&logs).janitor());

    let state = Arc::new(AppState {
        runners: RunnerService::new(
            store.clone(),
            shell.clone(),
            Arc::clone(&logs),
            service_url,
            config.data_dir.clone(),
        ),
        hosts: HostService::new(store.clone(), shell),
        licences: LicenceService::new(store),
    });

    let app = router::router(state);
    let listener = tokio::net::TcpListener::bind((config.address.as_str(), config.port)).await?;
    info!(address = %config.address, port = config.port, "http-service listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn setup_logging(
    config: &env::Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, DaemonError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(&config.log_dir)?;

    let file_appender = tracing_appender::rolling::never(&config.log_dir, "service.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
