// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use crate::runlog::RunnerLogs;
use avian_core::{test_support, FakeClock, Runner};
use avian_remote::FakeShell;
use avian_store::Store;
use std::sync::Arc;

pub struct Fixture {
    pub store: Store,
    pub shell: FakeShell,
    pub logs: Arc<RunnerLogs>,
    pub clock: FakeClock,
    pub log_dir: tempfile::TempDir,
}

/// Store + fake shell + logs, with one host `h1` and one licence server
/// `nms1` (4 workers, 2 enterprise licences) applied.
pub fn fixture() -> Fixture {
    let clock = FakeClock::at(1_000);
    let store = Store::in_memory().with_clock(Arc::new(clock.clone()));
    store.apply_host(test_support::host_spec("h1")).unwrap();
    store
        .apply_licence_server(test_support::nms_spec("nms1", 4, "enterprise", 2))
        .unwrap();
    let log_dir = tempfile::tempdir().unwrap();
    let logs = Arc::new(RunnerLogs::new(log_dir.path(), Arc::new(clock.clone())));
    Fixture {
        store,
        shell: FakeShell::new(),
        logs,
        clock,
        log_dir,
    }
}

impl Fixture {
    pub fn apply_runner(&self, name: &str) -> Runner {
        self.store
            .apply_runner(test_support::runner(name, "h1", "nms1"), false)
            .unwrap()
    }

    pub fn admit_runner(&self, name: &str) -> Runner {
        let runner = self.apply_runner(name);
        self.store.reserve_capacity(runner.meta.id).unwrap();
        self.store.get_runner(name).unwrap()
    }
}
