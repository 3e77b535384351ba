// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission-control loop.
//!
//! One tick walks the waiting runners in FIFO order and tries to admit
//! each. The store transaction in `reserve_capacity` is what prevents
//! double-admission; the host pre-check here only avoids pointless work.
//! Admission misses are retried next tick, never escalated.

use crate::runlog::RunnerLogs;
use crate::spawn;
use crate::LOOP_PERIOD;
use avian_core::{Error, Result, Runner, StageKind};
use avian_remote::Shell;
use avian_store::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// The queue loop. Owns no state beyond its dependencies; all runner
/// state lives in the store.
pub struct Queue<S: Shell> {
    store: Store,
    shell: S,
    logs: Arc<RunnerLogs>,
    service_url: String,
    period: Duration,
}

impl<S: Shell> Queue<S> {
    pub fn new(store: Store, shell: S, logs: Arc<RunnerLogs>, service_url: String) -> Self {
        Self {
            store,
            shell,
            logs,
            service_url,
            period: LOOP_PERIOD,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Run forever. Ticks immediately on start, then every period.
    pub async fn run(self) {
        info!("queue started");
        let mut interval = tokio::time::interval(self.period);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// One admission pass over the waiting runners.
    pub async fn tick(&self) {
        let runners = self.store.find_waiting_runners();
        debug!(amount = runners.len(), "found runners in queue");

        for mut runner in runners {
            debug!(runner = %runner.name, "trying to start runner");

            // Cheap pre-check; the reservation re-verifies under the lock.
            match self.store.get_host(&runner.hostname) {
                Ok(host) if host.active => {
                    debug!(runner = %runner.name, server = %runner.hostname, "server is already active");
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    error!(runner = %runner.name, error = %e, "cannot get server for runner");
                    continue;
                }
            }

            // In-app settings files live on the orchestrator and may be
            // fixed up by the operator between ticks; an unreadable file
            // skips the runner rather than failing it.
            if let Err(e) = parse_inapp_settings(&mut runner) {
                warn!(runner = %runner.name, error = %e, "in-app settings unreadable, skipping this tick");
                continue;
            }

            let (host, server) = match self.store.reserve_capacity(runner.meta.id) {
                Ok(pair) => pair,
                Err(e) if e.is_capacity() => {
                    debug!(runner = %runner.name, reason = %e, "no capacity, retrying next tick");
                    continue;
                }
                Err(e) => {
                    error!(runner = %runner.name, error = %e, "cannot admit runner");
                    continue;
                }
            };

            info!(
                runner = %runner.name,
                server = %host.hostname,
                nms = %server.address,
                licence = %runner.licence,
                workers = runner.workers,
                "starting runner",
            );

            // Mirror the reservation onto the preloaded copy handed to
            // the launch task.
            runner.active = true;
            runner.status = avian_core::RunStatus::Running;

            tokio::spawn(spawn::drive(
                self.store.clone(),
                self.shell.clone(),
                Arc::clone(&self.logs),
                self.service_url.clone(),
                runner,
                host,
                server,
            ));
        }
    }
}

/// Decode every pending InApp stage's settings file into the in-memory
/// stage so the generated script carries the settings inline.
fn parse_inapp_settings(runner: &mut Runner) -> Result<()> {
    for stage in &mut runner.stages {
        if stage.is_finished() {
            continue;
        }
        if let StageKind::InApp(inapp) = &mut stage.kind {
            let text = std::fs::read_to_string(&inapp.config).map_err(|e| {
                Error::Validation(format!("cannot read in-app config {}: {e}", inapp.config))
            })?;
            let settings = serde_yaml::from_str(&text).map_err(|e| {
                Error::Validation(format!("cannot parse in-app config {}: {e}", inapp.config))
            })?;
            inapp.settings = Some(settings);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
