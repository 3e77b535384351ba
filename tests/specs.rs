// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scheduling scenarios over the store, the engine loops and
//! the fake remote shell.

use avian_core::{test_support, FakeClock, RunStatus};
use avian_engine::{lifecycle, Monitor, Queue, RunnerLogs};
use avian_remote::FakeShell;
use avian_store::Store;
use std::sync::Arc;
use std::time::Duration;

struct Orchestrator {
    store: Store,
    shell: FakeShell,
    clock: FakeClock,
    queue: Queue<FakeShell>,
    monitor: Monitor<FakeShell>,
    _log_dir: tempfile::TempDir,
}

fn orchestrator() -> Orchestrator {
    let clock = FakeClock::at(1_000);
    let store = Store::in_memory().with_clock(Arc::new(clock.clone()));
    let shell = FakeShell::new();
    let log_dir = tempfile::tempdir().unwrap();
    let logs = Arc::new(RunnerLogs::new(log_dir.path(), Arc::new(clock.clone())));

    let queue = Queue::new(
        store.clone(),
        shell.clone(),
        Arc::clone(&logs),
        "http://localhost:8080/api/".to_string(),
    );
    let monitor = Monitor::new(
        store.clone(),
        shell.clone(),
        Arc::clone(&logs),
        Arc::new(clock.clone()),
    );
    Orchestrator {
        store,
        shell,
        clock,
        queue,
        monitor,
        _log_dir: log_dir,
    }
}

async fn wait_for_run(shell: &FakeShell, host: &str, runs: usize) {
    for _ in 0..500 {
        if shell.runs(host).len() >= runs {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("expected {runs} runs on {host}");
}

/// Scenario 1: apply host, nms and runner; one tick admits; the script's
/// lifecycle RPCs drive it to Finished with all capacity released.
#[tokio::test]
async fn happy_path_releases_everything() {
    let orch = orchestrator();
    orch.store.apply_host(test_support::host_spec("h1")).unwrap();
    orch.store
        .apply_licence_server(test_support::nms_spec("nms1", 4, "enterprise", 2))
        .unwrap();
    let runner = orch
        .store
        .apply_runner(test_support::runner("r1", "h1", "nms1"), false)
        .unwrap();
    assert_eq!(runner.status, RunStatus::Waiting);

    orch.queue.tick().await;

    let admitted = orch.store.get_runner("r1").unwrap();
    assert!(admitted.active);
    assert_eq!(admitted.status, RunStatus::Running);
    let server = orch.store.get_licence_server("nms1").unwrap();
    assert_eq!(server.in_use, 2);
    assert_eq!(server.licence("enterprise").unwrap().in_use, 1);
    assert!(orch.store.get_host("h1").unwrap().active);
    wait_for_run(&orch.shell, "h1", 1).await;

    // The script walks its lifecycle: Start, stages, Finish.
    let id = admitted.meta.id;
    orch.store.start_runner(id, Some("case-guid".to_string())).unwrap();
    for _ in 0..3 {
        orch.store.set_runner_heartbeat(id).unwrap();
    }
    for stage in &admitted.stages {
        orch.store
            .update_stage_status(stage.meta.id, RunStatus::Running)
            .unwrap();
        orch.store
            .update_stage_status(stage.meta.id, RunStatus::Finished)
            .unwrap();
    }
    lifecycle::finish_runner(&orch.store, &orch.shell, id)
        .await
        .unwrap();

    let finished = orch.store.get_runner("r1").unwrap();
    assert_eq!(finished.status, RunStatus::Finished);
    assert!(!finished.active);
    assert!(finished.stages.iter().all(|s| s.is_finished()));
    let server = orch.store.get_licence_server("nms1").unwrap();
    assert_eq!(server.in_use, 0);
    assert_eq!(server.licence("enterprise").unwrap().in_use, 0);
    assert!(!orch.store.get_host("h1").unwrap().active);
    // Host-side script removed on the terminal transition.
    assert!(orch
        .shell
        .removed_items("h1")
        .contains(&"C:/nuix\\r1.gen.rb".to_string()));
}

/// Scenario 2: a second runner for a busy host stays Waiting across
/// ticks and is admitted once the first finishes.
#[tokio::test]
async fn busy_host_defers_the_second_runner() {
    let orch = orchestrator();
    orch.store.apply_host(test_support::host_spec("h1")).unwrap();
    orch.store
        .apply_licence_server(test_support::nms_spec("nms1", 8, "enterprise", 4))
        .unwrap();
    let r1 = orch
        .store
        .apply_runner(test_support::runner("r1", "h1", "nms1"), false)
        .unwrap();
    orch.clock.advance(10);
    orch.store
        .apply_runner(test_support::runner("r2", "h1", "nms1"), false)
        .unwrap();

    for _ in 0..3 {
        orch.queue.tick().await;
        assert_eq!(orch.store.get_runner("r2").unwrap().status, RunStatus::Waiting);
    }

    lifecycle::finish_runner(&orch.store, &orch.shell, r1.meta.id)
        .await
        .unwrap();
    orch.queue.tick().await;
    assert_eq!(orch.store.get_runner("r2").unwrap().status, RunStatus::Running);
}

/// Scenario 3: two 2-worker runners against a 3-worker pool; the second
/// is starved until the first releases.
#[tokio::test]
async fn licence_exhaustion_defers_admission() {
    let orch = orchestrator();
    orch.store.apply_host(test_support::host_spec("h1")).unwrap();
    orch.store.apply_host(test_support::host_spec("h2")).unwrap();
    orch.store
        .apply_licence_server(test_support::nms_spec("nms1", 3, "enterprise", 2))
        .unwrap();
    let r1 = orch
        .store
        .apply_runner(test_support::runner("r1", "h1", "nms1"), false)
        .unwrap();
    orch.clock.advance(10);
    orch.store
        .apply_runner(test_support::runner("r2", "h2", "nms1"), false)
        .unwrap();

    orch.queue.tick().await;
    assert_eq!(orch.store.get_runner("r1").unwrap().status, RunStatus::Running);
    assert_eq!(orch.store.get_runner("r2").unwrap().status, RunStatus::Waiting);
    assert_eq!(orch.store.get_licence_server("nms1").unwrap().in_use, 2);

    orch.queue.tick().await;
    assert_eq!(orch.store.get_runner("r2").unwrap().status, RunStatus::Waiting);

    lifecycle::finish_runner(&orch.store, &orch.shell, r1.meta.id)
        .await
        .unwrap();
    orch.queue.tick().await;
    assert_eq!(orch.store.get_runner("r2").unwrap().status, RunStatus::Running);
}

/// Scenario 4: a silently dead script stops heartbeating; the monitor
/// times it out, releases capacity and attempts script removal.
#[tokio::test]
async fn silent_death_ends_in_timeout() {
    let orch = orchestrator();
    orch.store.apply_host(test_support::host_spec("h1")).unwrap();
    orch.store
        .apply_licence_server(test_support::nms_spec("nms1", 4, "enterprise", 2))
        .unwrap();
    orch.store
        .apply_runner(test_support::runner("r1", "h1", "nms1"), false)
        .unwrap();

    orch.queue.tick().await;
    wait_for_run(&orch.shell, "h1", 1).await;

    // No heartbeat for more than two minutes.
    orch.clock.advance(3 * 60 * 1000);
    orch.monitor.tick().await;

    let runner = orch.store.get_runner("r1").unwrap();
    assert_eq!(runner.status, RunStatus::Timeout);
    assert!(!runner.active);
    assert!(!orch.store.get_host("h1").unwrap().active);
    assert_eq!(orch.store.get_licence_server("nms1").unwrap().in_use, 0);
    assert!(orch
        .shell
        .removed_items("h1")
        .contains(&"C:/nuix\\r1.gen.rb".to_string()));

    // The host is free again: the queue can admit the next runner.
    orch.store
        .apply_runner(test_support::runner("r2", "h1", "nms1"), false)
        .unwrap();
    orch.queue.tick().await;
    assert_eq!(orch.store.get_runner("r2").unwrap().status, RunStatus::Running);
}

/// Scenario 5: re-apply after a partial failure keeps the finished
/// Process stage and replaces the failed SearchAndTag stage, leaving the
/// runner admittable again.
#[tokio::test]
async fn reapply_after_partial_failure_preserves_completed_work() {
    let orch = orchestrator();
    orch.store.apply_host(test_support::host_spec("h1")).unwrap();
    orch.store
        .apply_licence_server(test_support::nms_spec("nms1", 4, "enterprise", 2))
        .unwrap();
    let runner = orch
        .store
        .apply_runner(test_support::runner("r1", "h1", "nms1"), false)
        .unwrap();

    orch.queue.tick().await;
    let process_id = runner.stages[0].meta.id;
    let sat_id = runner.stages[1].meta.id;
    orch.store
        .update_stage_status(process_id, RunStatus::Finished)
        .unwrap();
    orch.store
        .update_stage_status(sat_id, RunStatus::Failed)
        .unwrap();
    avian_engine::lifecycle::fail_runner(
        &orch.store,
        &orch.shell,
        &RunnerLogs::new(orch._log_dir.path(), Arc::new(orch.clock.clone())),
        runner.meta.id,
        "search failed",
    )
    .await
    .unwrap();

    let mut spec = test_support::runner_spec("r1", "h1", "nms1");
    spec.update = true;
    let updated = orch
        .store
        .apply_runner(spec.into_runner().unwrap(), true)
        .unwrap();

    assert_eq!(updated.status, RunStatus::Waiting);
    assert_eq!(updated.stages[0].meta.id, process_id);
    assert_eq!(updated.stages[0].status(), RunStatus::Finished);
    assert_ne!(updated.stages[1].meta.id, sat_id);
    assert_eq!(updated.stages[1].status(), RunStatus::Waiting);

    orch.queue.tick().await;
    assert_eq!(orch.store.get_runner("r1").unwrap().status, RunStatus::Running);

    // The regenerated script skips the finished Process stage.
    let script = avian_engine::script::generate(
        "http://localhost:8080/api/",
        None,
        &orch.store.get_runner("r1").unwrap(),
    );
    assert!(script.contains("Skipping finished stage: Process"));
}
