// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol;
use avian_core::{test_support, FakeClock, RunStatus};
use avian_engine::RunnerLogs;
use avian_remote::FakeShell;
use avian_store::Store;

struct Fixture {
    app: Arc<AppState<FakeShell>>,
    store: Store,
    _dirs: (tempfile::TempDir, tempfile::TempDir),
}

fn fixture() -> Fixture {
    let clock = FakeClock::at(1_000);
    let store = Store::in_memory().with_clock(Arc::new(clock.clone()));
    let shell = FakeShell::new();
    let log_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();
    let logs = Arc::new(RunnerLogs::new(log_dir.path(), Arc::new(clock)));

    let app = Arc::new(AppState {
        runners: RunnerService::new(
            store.clone(),
            shell.clone(),
            logs,
            "http://localhost:8080/api/".to_string(),
            data_dir.path().to_path_buf(),
        ),
        hosts: HostService::new(store.clone(), shell.clone()),
        licences: LicenceService::new(store.clone()),
    });
    Fixture {
        app,
        store,
        _dirs: (log_dir, data_dir),
    }
}

async fn seed_running_runner(fx: &Fixture) -> u64 {
    host_apply(
        State(Arc::clone(&fx.app)),
        Json(test_support::host_spec("h1")),
    )
    .await
    .0
    .into_result()
    .unwrap();
    nms_apply(
        State(Arc::clone(&fx.app)),
        Json(LicenceServerBatch {
            nms: vec![test_support::nms_spec("nms1", 4, "enterprise", 2)],
        }),
    )
    .await
    .0
    .into_result()
    .unwrap();
    let reply = runner_apply(
        State(Arc::clone(&fx.app)),
        Json(test_support::runner_spec("r1", "h1", "nms1")),
    )
    .await;
    let runner = reply.0.into_result().unwrap().runner;
    fx.store.reserve_capacity(runner.meta.id).unwrap();
    runner.meta.id
}

#[tokio::test]
async fn unknown_ids_return_error_strings_not_http_failures() {
    let fx = fixture();
    let reply = runner_heartbeat(
        State(Arc::clone(&fx.app)),
        Json(protocol::RunnerStartRequest {
            id: 42,
            runner: "ghost".to_string(),
            case_id: None,
        }),
    )
    .await;
    assert_eq!(reply.0.check().unwrap_err(), "runner 42 not found");
}

#[tokio::test]
async fn start_heartbeat_finish_round_trip() {
    let fx = fixture();
    let id = seed_running_runner(&fx).await;

    for _ in 0..3 {
        runner_start(
            State(Arc::clone(&fx.app)),
            Json(protocol::RunnerStartRequest {
                id,
                runner: "r1".to_string(),
                case_id: Some("case-guid".to_string()),
            }),
        )
        .await
        .0
        .check()
        .unwrap();
        runner_heartbeat(
            State(Arc::clone(&fx.app)),
            Json(protocol::RunnerStartRequest {
                id,
                runner: "r1".to_string(),
                case_id: None,
            }),
        )
        .await
        .0
        .check()
        .unwrap();
    }

    // Finish is idempotent: the second call is a no-op that succeeds.
    for _ in 0..2 {
        runner_finish(
            State(Arc::clone(&fx.app)),
            Json(protocol::RunnerFinishRequest {
                id,
                runner: "r1".to_string(),
            }),
        )
        .await
        .0
        .check()
        .unwrap();
    }

    let runner = fx.store.get_runner("r1").unwrap();
    assert_eq!(runner.status, RunStatus::Finished);
    assert!(!runner.active);
    assert_eq!(runner.case_id.as_deref(), Some("case-guid"));
    assert_eq!(fx.store.get_licence_server("nms1").unwrap().in_use, 0);
    assert!(!fx.store.get_host("h1").unwrap().active);
}

#[tokio::test]
async fn failed_rpc_releases_and_reports_ok() {
    let fx = fixture();
    let id = seed_running_runner(&fx).await;

    runner_failed(
        State(Arc::clone(&fx.app)),
        Json(protocol::RunnerFailedRequest {
            id,
            runner: "r1".to_string(),
            exception: "java.io.IOException: boom".to_string(),
        }),
    )
    .await
    .0
    .check()
    .unwrap();

    let runner = fx.store.get_runner("r1").unwrap();
    assert_eq!(runner.status, RunStatus::Failed);
    assert_eq!(fx.store.get_licence_server("nms1").unwrap().in_use, 0);
}

#[tokio::test]
async fn stage_endpoints_return_the_updated_stage() {
    let fx = fixture();
    seed_running_runner(&fx).await;
    let runner = fx.store.get_runner("r1").unwrap();
    let stage_id = runner.stages[0].meta.id;

    let reply = start_stage(
        State(Arc::clone(&fx.app)),
        Json(protocol::StageRequest {
            runner: "r1".to_string(),
            stage_id,
        }),
    )
    .await;
    let stage = reply.0.into_result().unwrap().stage;
    assert_eq!(stage.status(), RunStatus::Running);

    let reply = finish_stage(
        State(Arc::clone(&fx.app)),
        Json(protocol::StageRequest {
            runner: "r1".to_string(),
            stage_id,
        }),
    )
    .await;
    assert_eq!(reply.0.into_result().unwrap().stage.status(), RunStatus::Finished);
}

#[tokio::test]
async fn script_endpoint_returns_generated_ruby() {
    let fx = fixture();
    seed_running_runner(&fx).await;

    let reply = runner_script(
        State(Arc::clone(&fx.app)),
        Json(protocol::RunnerGetRequest {
            name: "r1".to_string(),
        }),
    )
    .await;
    let script = reply.0.into_result().unwrap().script;
    assert!(script.contains("STARTING RUNNER"));
}

#[tokio::test]
async fn list_endpoints_reflect_applied_records() {
    let fx = fixture();
    seed_running_runner(&fx).await;

    let hosts = host_list(State(Arc::clone(&fx.app))).await.0.into_result().unwrap();
    assert_eq!(hosts.servers.len(), 1);

    let nms = nms_list(State(Arc::clone(&fx.app))).await.0.into_result().unwrap();
    assert_eq!(nms.nms.len(), 1);

    let runners = runner_list(State(Arc::clone(&fx.app))).await.0.into_result().unwrap();
    assert_eq!(runners.runners.len(), 1);

    let licences = nms_licences(
        State(Arc::clone(&fx.app)),
        Json(protocol::LicenceListRequest {
            nms_id: nms.nms[0].meta.id,
        }),
    )
    .await
    .0
    .into_result()
    .unwrap();
    assert_eq!(licences.licences[0].kind, "enterprise");
}
