// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::fixture;
use avian_core::{test_support, InApp, RunStatus, StageKind};
use avian_remote::SessionCall;

#[tokio::test]
async fn launch_runs_the_full_protocol() {
    let fx = fixture();
    let runner = fx.admit_runner("r1");
    let host = fx.store.get_host("h1").unwrap();
    let server = fx.store.get_licence_server("nms1").unwrap();

    launch(&fx.shell, "http://localhost:8080/api/", &runner, &host, &server)
        .await
        .unwrap();

    // Stale case locks removed from all three case directories.
    let removed = fx.shell.removed_items("h1");
    assert!(removed.contains(&"D:/cases/r1-single/case.lock".to_string()));
    assert!(removed.contains(&"D:/cases/r1-review/case.lock.properties".to_string()));

    // Licence credentials exported before the run.
    let calls = fx.shell.calls_for("h1");
    assert!(calls.contains(&SessionCall::SetEnv {
        key: "NUIX_USERNAME".to_string(),
        value: "nms-admin".to_string(),
    }));
    assert!(calls.contains(&SessionCall::SetWorkingDir("C:/nuix".to_string())));

    // Script created in the install path, then executed.
    assert_eq!(fx.shell.created_files("h1"), vec!["C:/nuix\\r1.gen.rb"]);
    let runs = fx.shell.runs("h1");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].0, "nuix_console.exe");
    assert_eq!(runs[0].1.last().map(String::as_str), Some("r1.gen.rb"));

    // Session is closed on the way out.
    assert!(matches!(calls.last(), Some(SessionCall::Close)));
}

#[test]
fn argv_is_ordered_per_console_contract() {
    let runner = {
        let mut spec = test_support::runner_spec("r1", "h1", "nms1");
        spec.switches = vec!["-Dnuix.export.spoolDir=D:/spool".to_string()];
        spec.into_runner().unwrap()
    };
    let server = test_support::nms_spec("nms1", 4, "enterprise", 2).into_server();

    let args = argv(&runner, &server, "r1.gen.rb");
    assert_eq!(
        args,
        vec![
            "-Xmx4g",
            "-Dnuix.registry.servers=nms1",
            "-licencesourcetype server",
            "-licencesourcelocation nms1:27443",
            "-licencetype enterprise",
            "-licenceworkers 2",
            "-signout",
            "-Dnuix.export.spoolDir=D:/spool",
            "r1.gen.rb",
        ]
    );
}

#[tokio::test]
async fn launch_requires_scripts_path_for_inapp_stages() {
    let fx = fixture();
    let mut spec = test_support::runner_spec("r2", "h1", "nms1");
    spec.stages = vec![avian_core::Stage::new(
        0,
        StageKind::InApp(InApp {
            name: "dedupe".to_string(),
            config: "C:/configs/dedupe.yml".to_string(),
            ..InApp::default()
        }),
    )];
    let runner = fx
        .store
        .apply_runner(spec.into_runner().unwrap(), false)
        .unwrap();
    fx.store.reserve_capacity(runner.meta.id).unwrap();
    let host = fx.store.get_host("h1").unwrap();
    let server = fx.store.get_licence_server("nms1").unwrap();

    // Host declares no scripts path: launch refuses.
    let err = launch(&fx.shell, "http://localhost:8080/api/", &runner, &host, &server)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    // With a scripts path the tree is copied onto the host.
    let mut host_spec = test_support::host_spec("h1");
    host_spec.scripts_path = "C:/avian/scripts".to_string();
    let host = fx.store.apply_host(host_spec).unwrap();
    launch(&fx.shell, "http://localhost:8080/api/", &runner, &host, &server)
        .await
        .unwrap();
    assert!(fx.shell.calls_for("h1").contains(&SessionCall::CopyTree {
        src: "C:/avian/scripts".to_string(),
        dst: "C:/nuix".to_string(),
    }));
}

#[tokio::test]
async fn drive_fails_runner_on_nonzero_exit() {
    let fx = fixture();
    let runner = fx.admit_runner("r1");
    let host = fx.store.get_host("h1").unwrap();
    let server = fx.store.get_licence_server("nms1").unwrap();
    fx.shell.set_run_error(
        "java.lang.RuntimeException: boom\nCaused by: java.io.IOException: evidence offline\n\tat X",
    );

    drive(
        fx.store.clone(),
        fx.shell.clone(),
        Arc::clone(&fx.logs),
        "http://localhost:8080/api/".to_string(),
        runner.clone(),
        host,
        server,
    )
    .await;

    let failed = fx.store.get_runner("r1").unwrap();
    assert_eq!(failed.status, RunStatus::Failed);
    assert!(!failed.active);
    assert_eq!(fx.store.get_licence_server("nms1").unwrap().in_use, 0);
    assert!(!fx.store.get_host("h1").unwrap().active);

    // The audit line carries the extracted root cause.
    let log = std::fs::read_to_string(fx.log_dir.path().join("r1-runner.log")).unwrap();
    assert!(log.contains("java.io.IOException: evidence offline"));
    assert!(!log.contains("at X"));
}

#[tokio::test]
async fn drive_leaves_store_alone_on_clean_exit() {
    let fx = fixture();
    let runner = fx.admit_runner("r1");
    let host = fx.store.get_host("h1").unwrap();
    let server = fx.store.get_licence_server("nms1").unwrap();

    drive(
        fx.store.clone(),
        fx.shell.clone(),
        Arc::clone(&fx.logs),
        "http://localhost:8080/api/".to_string(),
        runner,
        host,
        server,
    )
    .await;

    // Clean exit: the script reports Finish itself, drive does nothing.
    let runner = fx.store.get_runner("r1").unwrap();
    assert_eq!(runner.status, RunStatus::Running);
    assert!(runner.active);
}
