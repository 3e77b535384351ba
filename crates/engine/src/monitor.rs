// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness monitor.
//!
//! Sweeps active runners whose last heartbeat is older than the loop
//! period and times them out. Not a cancellation: the remote process is
//! not killed, only the capacity is reclaimed. Late RPCs from a script
//! that turns out to be alive still land on the runner record.

use crate::lifecycle;
use crate::runlog::RunnerLogs;
use crate::LOOP_PERIOD;
use avian_core::Clock;
use avian_remote::Shell;
use avian_store::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

pub struct Monitor<S: Shell> {
    store: Store,
    shell: S,
    logs: Arc<RunnerLogs>,
    clock: Arc<dyn Clock>,
    period: Duration,
}

impl<S: Shell> Monitor<S> {
    pub fn new(store: Store, shell: S, logs: Arc<RunnerLogs>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            shell,
            logs,
            clock,
            period: LOOP_PERIOD,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Run forever, sweeping once per period.
    pub async fn run(self) {
        info!("heartbeat monitor started");
        let mut interval = tokio::time::interval(self.period);
        // The first tick fires immediately; skip it so a freshly started
        // orchestrator does not time out runners loaded from the snapshot
        // before they had one period to report in.
        interval.tick().await;
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// One sweep over expired runners. Errors are logged per runner and
    /// never stop the sweep.
    pub async fn tick(&self) {
        let threshold = self
            .clock
            .epoch_ms()
            .saturating_sub(self.period.as_millis() as u64);
        let expired = self.store.find_expired_runners(threshold);
        if expired.is_empty() {
            debug!("no unhealthy runners");
            return;
        }
        info!(amount = expired.len(), "got unhealthy runners from store");

        for runner in expired {
            if let Err(e) =
                lifecycle::timeout_runner(&self.store, &self.shell, &self.logs, runner.meta.id)
                    .await
            {
                error!(runner = %runner.name, error = %e, "cannot time out runner");
            }
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
