// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RunnerService: admin CRUD plus the surface the running script calls.

use crate::protocol::{LogItemRequest, LogRequest};
use avian_core::{Error, Result, RunStatus, Runner, RunnerSpec, Stage};
use avian_engine::{lifecycle, script, ItemRecord, MessageRecord, RunnerLogs};
use avian_remote::{Session, Shell};
use avian_store::Store;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub struct RunnerService<S: Shell> {
    store: Store,
    shell: S,
    logs: Arc<RunnerLogs>,
    service_url: String,
    data_dir: PathBuf,
}

impl<S: Shell> RunnerService<S> {
    pub fn new(
        store: Store,
        shell: S,
        logs: Arc<RunnerLogs>,
        service_url: String,
        data_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            shell,
            logs,
            service_url,
            data_dir,
        }
    }

    /// Apply a runner configuration: validate, verify every declared
    /// path on the target host, then persist as Waiting.
    pub async fn apply(&self, spec: RunnerSpec) -> Result<Runner> {
        let update = spec.update;
        let runner = spec.into_runner()?;

        info!(runner = %runner.name, hostname = %runner.hostname, "validating runner");
        runner.validate()?;

        let host = self.store.get_host(&runner.hostname).map_err(|_| {
            Error::not_found(format!(
                "server: {} doesn't exist in the backend, list existing servers by command: 'avian servers list'",
                runner.hostname
            ))
        })?;
        self.store.get_licence_server(&runner.nms).map_err(|_| {
            Error::not_found(format!(
                "nms: {} doesn't exist in the backend, list existing nm-servers by command: 'avian nms list'",
                runner.nms
            ))
        })?;

        info!(runner = %runner.name, "validating paths for runner");
        let session = self
            .shell
            .open_delegated(&host.hostname, &host.username, &host.password)
            .await
            .map_err(avian_engine::failure::remote_err)?;
        let checked = check_paths(&session, &runner).await;
        let _ = session.close().await;
        checked?;

        let runner = self.store.apply_runner(runner, update)?;
        info!(runner = %runner.name, "runner has been created");
        Ok(runner)
    }

    pub fn list(&self) -> Result<Vec<Runner>> {
        Ok(self.store.list_runners())
    }

    pub fn get(&self, name: &str) -> Result<Runner> {
        self.store.get_runner(name)
    }

    pub fn delete(&self, name: &str, force: bool) -> Result<Runner> {
        self.store.delete_runner(name, force)
    }

    /// Regenerate the host-side script for inspection.
    pub fn script(&self, name: &str) -> Result<String> {
        let runner = self.store.get_runner(name)?;
        let scripts_dir = self
            .store
            .get_host(&runner.hostname)
            .ok()
            .and_then(|host| host.remote_scripts_dir());
        Ok(script::generate(
            &self.service_url,
            scripts_dir.as_deref(),
            &runner,
        ))
    }

    // --- script-facing lifecycle ---

    pub fn start(&self, id: u64, case_id: Option<String>) -> Result<Runner> {
        let runner = self.store.start_runner(id, case_id)?;
        info!(runner = %runner.name, runner_id = id, "STARTING RUNNER");
        Ok(runner)
    }

    pub fn heartbeat(&self, id: u64) -> Result<()> {
        debug!(runner_id = id, "retrieved heartbeat from runner");
        self.store.set_runner_heartbeat(id)
    }

    pub async fn finish(&self, id: u64) -> Result<Runner> {
        lifecycle::finish_runner(&self.store, &self.shell, id).await
    }

    pub async fn failed(&self, id: u64, exception: &str) -> Result<Runner> {
        lifecycle::fail_runner(&self.store, &self.shell, &self.logs, id, exception).await
    }

    // --- stage lifecycle ---

    pub fn start_stage(&self, stage_id: u64) -> Result<Stage> {
        let stage = self.store.update_stage_status(stage_id, RunStatus::Running)?;
        info!(stage = %stage.name(), stage_id, "STARTING STAGE");
        Ok(stage)
    }

    pub fn finish_stage(&self, stage_id: u64) -> Result<Stage> {
        let stage = self
            .store
            .update_stage_status(stage_id, RunStatus::Finished)?;
        info!(stage = %stage.name(), stage_id, "FINISHED STAGE");
        Ok(stage)
    }

    pub fn failed_stage(&self, stage_id: u64) -> Result<Stage> {
        let stage = self.store.update_stage_status(stage_id, RunStatus::Failed)?;
        info!(stage = %stage.name(), stage_id, "FAILED STAGE");
        Ok(stage)
    }

    // --- logging ---

    pub fn log_item(&self, req: LogItemRequest) -> Result<()> {
        self.logs.item(&ItemRecord {
            runner: req.runner,
            stage: req.stage,
            stage_id: req.stage_id,
            message: req.message,
            count: req.count,
            mime_type: req.mime_type,
            guid: req.guid,
            process_stage: req.process_stage,
            is_corrupted: req.is_corrupted,
            is_deleted: req.is_deleted,
            is_encrypted: req.is_encrypted,
        });
        Ok(())
    }

    pub fn log_message(&self, level: &str, req: LogRequest) -> Result<()> {
        self.logs.message(
            level,
            &MessageRecord {
                runner: req.runner,
                stage: req.stage,
                stage_id: req.stage_id,
                message: req.message,
                exception: req.exception,
            },
        );
        Ok(())
    }

    /// Write uploaded bytes under the data path; a partial write leaves
    /// no file behind.
    pub async fn upload_file(&self, name: &str, content: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;
        let path = self.data_dir.join(name);
        if let Err(e) = tokio::fs::write(&path, content).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(Error::Internal(e.to_string()));
        }
        Ok(path.to_string_lossy().into_owned())
    }
}

async fn check_paths<S: Session>(session: &S, runner: &Runner) -> Result<()> {
    for path in runner.paths() {
        session
            .check_path(path)
            .await
            .map_err(|e| Error::Validation(format!("path: {path} - err : {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "runners_tests.rs"]
mod tests;
