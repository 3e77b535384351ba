// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::fixture;
use avian_core::RunStatus;

fn monitor(fx: &crate::test_helpers::Fixture) -> Monitor<avian_remote::FakeShell> {
    Monitor::new(
        fx.store.clone(),
        fx.shell.clone(),
        Arc::clone(&fx.logs),
        Arc::new(fx.clock.clone()),
    )
}

#[tokio::test]
async fn expired_runner_is_timed_out_and_released() {
    let fx = fixture();
    let runner = fx.admit_runner("r1");

    fx.clock.advance(3 * 60 * 1000);
    monitor(&fx).tick().await;

    let runner = fx.store.get_runner_by_id(runner.meta.id).unwrap();
    assert_eq!(runner.status, RunStatus::Timeout);
    assert!(!runner.active);
    assert!(!fx.store.get_host("h1").unwrap().active);
    let server = fx.store.get_licence_server("nms1").unwrap();
    assert_eq!(server.in_use, 0);
    assert_eq!(server.licence("enterprise").unwrap().in_use, 0);

    // Best-effort script removal was attempted.
    assert!(fx
        .shell
        .removed_items("h1")
        .contains(&"C:/nuix\\r1.gen.rb".to_string()));
}

#[tokio::test]
async fn heartbeating_runner_survives_the_sweep() {
    let fx = fixture();
    let runner = fx.admit_runner("r1");

    fx.clock.advance(90_000);
    fx.store.set_runner_heartbeat(runner.meta.id).unwrap();
    fx.clock.advance(90_000);
    monitor(&fx).tick().await;

    let runner = fx.store.get_runner("r1").unwrap();
    assert_eq!(runner.status, RunStatus::Running);
    assert!(runner.active);
}

#[tokio::test]
async fn sweep_continues_past_cleanup_failures() {
    let fx = fixture();
    fx.store
        .apply_host(avian_core::test_support::host_spec("h2"))
        .unwrap();
    fx.admit_runner("r1");
    let r2 = fx
        .store
        .apply_runner(avian_core::test_support::runner("r2", "h2", "nms1"), false)
        .unwrap();
    fx.store.reserve_capacity(r2.meta.id).unwrap();

    // Script cleanup cannot even open a session; the transitions must
    // still land.
    fx.shell.set_open_error("winrm refused");
    fx.clock.advance(3 * 60 * 1000);
    monitor(&fx).tick().await;

    assert_eq!(fx.store.get_runner("r1").unwrap().status, RunStatus::Timeout);
    assert_eq!(fx.store.get_runner("r2").unwrap().status, RunStatus::Timeout);
    assert_eq!(fx.store.get_licence_server("nms1").unwrap().in_use, 0);
}

#[tokio::test]
async fn waiting_runners_are_never_swept() {
    let fx = fixture();
    fx.apply_runner("r1");
    fx.clock.advance(10 * 60 * 1000);
    monitor(&fx).tick().await;
    assert_eq!(fx.store.get_runner("r1").unwrap().status, RunStatus::Waiting);
}
