// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch protocol for an admitted runner.
//!
//! The queue loop hands each admitted runner to [`drive`], which blocks
//! in [`Session::run`] for the whole script lifetime. A clean exit needs
//! no action here: the script has already reported Finish through the
//! RPC surface. Every launch error and every non-zero exit takes the
//! failure path instead.

use crate::failure::{caused_by, remote_err};
use crate::lifecycle;
use crate::runlog::RunnerLogs;
use crate::script;
use avian_core::{CaseSettings, Error, Host, LicenceServer, Result, Runner};
use avian_remote::{Session, Shell};
use avian_store::Store;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Drive one admitted runner to completion.
pub async fn drive<S: Shell>(
    store: Store,
    shell: S,
    logs: Arc<RunnerLogs>,
    service_url: String,
    runner: Runner,
    host: Host,
    server: LicenceServer,
) {
    match launch(&shell, &service_url, &runner, &host, &server).await {
        Ok(()) => debug!(runner = %runner.name, "runner process exited cleanly"),
        Err(e) => {
            let exception = caused_by(&e.to_string());
            error!(runner = %runner.name, server = %host.hostname, exception, "runner failed");
            if let Err(e) =
                lifecycle::fail_runner(&store, &shell, &logs, runner.meta.id, &exception).await
            {
                error!(runner = %runner.name, error = %e, "failed to run failure path");
            }
        }
    }
}

/// Execute the launch protocol and block until the remote process exits.
pub async fn launch<S: Shell>(
    shell: &S,
    service_url: &str,
    runner: &Runner,
    host: &Host,
    server: &LicenceServer,
) -> Result<()> {
    info!(runner = %runner.name, server = %host.hostname, "generating script for runner");
    let script_text = script::generate(service_url, host.remote_scripts_dir().as_deref(), runner);

    let session = shell
        .open_delegated(&host.hostname, &host.username, &host.password)
        .await
        .map_err(remote_err)?;

    let result = launch_in_session(&session, runner, host, server, &script_text).await;
    let _ = session.close().await;
    result
}

async fn launch_in_session<S: Session>(
    session: &S,
    runner: &Runner,
    host: &Host,
    server: &LicenceServer,
    script_text: &str,
) -> Result<()> {
    remove_case_locks(session, &runner.case_settings).await?;

    // The console tool reads its licence credentials from the environment.
    session
        .set_env("NUIX_USERNAME", &server.username)
        .await
        .map_err(remote_err)?;
    session
        .set_env("NUIX_PASSWORD", &server.password)
        .await
        .map_err(remote_err)?;

    if runner.has_pending_inapp() {
        if host.scripts_path.is_empty() {
            return Err(Error::Validation(format!(
                "runner {} has in-app stages but host {} declares no scripts-path",
                runner.name, host.hostname
            )));
        }
        session
            .copy_tree(&host.scripts_path, &host.install_path)
            .await
            .map_err(remote_err)?;
    }

    let script_name = format!("{}.gen.rb", runner.name);
    info!(
        runner = %runner.name,
        server = %host.hostname,
        script = %script_name,
        "creating runner-script on server",
    );
    session
        .create_file(&host.install_path, &script_name, script_text.as_bytes())
        .await
        .map_err(remote_err)?;

    session
        .set_working_dir(&host.install_path)
        .await
        .map_err(remote_err)?;

    info!(
        runner = %runner.name,
        server = %host.hostname,
        nms = %server.address,
        licence = %runner.licence,
        workers = runner.workers,
        "STARTING RUNNER",
    );
    session
        .run("nuix_console.exe", &argv(runner, server, &script_name))
        .await
        .map_err(remote_err)
}

/// The console-tool argument vector, in its required order.
pub fn argv(runner: &Runner, server: &LicenceServer, script_name: &str) -> Vec<String> {
    let mut args = vec![
        format!("-Xmx{}", runner.xmx),
        format!("-Dnuix.registry.servers={}", server.address),
        "-licencesourcetype server".to_string(),
        format!("-licencesourcelocation {}:{}", server.address, server.port),
        format!("-licencetype {}", runner.licence),
        format!("-licenceworkers {}", runner.workers),
        "-signout".to_string(),
    ];
    args.extend(runner.switches.iter().cloned());
    args.push(script_name.to_string());
    args
}

/// Delete stale `case.lock` files left by a crashed console tool in any
/// of the runner's case directories. Absence is not an error; any actual
/// removal failure aborts the launch.
async fn remove_case_locks<S: Session>(session: &S, settings: &CaseSettings) -> Result<()> {
    for dir in settings.case_dirs() {
        for lock in ["case.lock", "case.lock.properties"] {
            let path = format!("{dir}/{lock}");
            if session.check_path(&path).await.is_ok() {
                debug!(path, "deleting stale case lock");
                session.remove_item(&path).await.map_err(remote_err)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
