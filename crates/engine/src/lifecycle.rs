// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal lifecycle transitions.
//!
//! Finish, Failed and Timeout all funnel through the same sequence:
//! release capacity in one store transaction, persist the audit line,
//! then best-effort removal of the host-side script files. Cleanup
//! failures never mask the terminal transition.

use crate::failure::remote_err;
use crate::runlog::{MessageRecord, RunnerLogs};
use avian_core::{Result, RunStatus, Runner};
use avian_remote::{Session, Shell};
use avian_store::Store;
use tracing::{info, warn};

/// Clean completion reported by the script.
pub async fn finish_runner<S: Shell>(store: &Store, shell: &S, runner_id: u64) -> Result<Runner> {
    let runner = store.release_capacity(runner_id, RunStatus::Finished)?;
    info!(runner = %runner.name, "FINISHED RUNNER");
    remove_script(store, shell, &runner).await;
    Ok(runner)
}

/// Failure reported by the script or hit during launch.
pub async fn fail_runner<S: Shell>(
    store: &Store,
    shell: &S,
    logs: &RunnerLogs,
    runner_id: u64,
    exception: &str,
) -> Result<Runner> {
    let runner = store.release_capacity(runner_id, RunStatus::Failed)?;
    info!(runner = %runner.name, exception, "FAILED RUNNER");
    logs.message(
        "error",
        &MessageRecord {
            runner: runner.name.clone(),
            message: "runner failed".to_string(),
            exception: exception.to_string(),
            ..MessageRecord::default()
        },
    );
    remove_script(store, shell, &runner).await;
    Ok(runner)
}

/// Silent death detected by the liveness monitor.
pub async fn timeout_runner<S: Shell>(
    store: &Store,
    shell: &S,
    logs: &RunnerLogs,
    runner_id: u64,
) -> Result<Runner> {
    let runner = store.release_capacity(runner_id, RunStatus::Timeout)?;
    info!(runner = %runner.name, "runner timed out");
    logs.message(
        "error",
        &MessageRecord {
            runner: runner.name.clone(),
            message: "no heartbeat received, runner timed out".to_string(),
            ..MessageRecord::default()
        },
    );
    remove_script(store, shell, &runner).await;
    Ok(runner)
}

/// Remove the generated script and any copied scripts tree from the
/// runner's host. Best-effort: failures are logged and swallowed.
pub async fn remove_script<S: Shell>(store: &Store, shell: &S, runner: &Runner) {
    if let Err(e) = try_remove_script(store, shell, runner).await {
        warn!(
            runner = %runner.name,
            server = %runner.hostname,
            error = %e,
            "failed to remove script from host",
        );
    }
}

async fn try_remove_script<S: Shell>(store: &Store, shell: &S, runner: &Runner) -> Result<()> {
    let host = store.get_host(&runner.hostname)?;
    let session = shell
        .open_delegated(&host.hostname, &host.username, &host.password)
        .await
        .map_err(remote_err)?;

    let script = format!("{}\\{}.gen.rb", host.install_path, runner.name);
    let result = async {
        session.remove_item(&script).await.map_err(remote_err)?;
        if let Some(scripts_dir) = host.remote_scripts_dir() {
            if session.check_path(&scripts_dir).await.is_ok() {
                session.remove_item(&scripts_dir).await.map_err(remote_err)?;
            }
        }
        Ok(())
    }
    .await;

    let _ = session.close().await;
    result
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
