// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use avian_core::FakeClock;

fn logs(dir: &std::path::Path, clock: &FakeClock) -> RunnerLogs {
    RunnerLogs::new(dir, Arc::new(clock.clone()))
}

fn read_lines(path: PathBuf) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn item_log_carries_flags_and_counts() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::at(5_000);
    let logs = logs(dir.path(), &clock);

    logs.item(&ItemRecord {
        runner: "r1".to_string(),
        stage: "Process".to_string(),
        stage_id: 7,
        message: "item done".to_string(),
        count: 42,
        mime_type: "application/pdf".to_string(),
        guid: "abc-123".to_string(),
        is_corrupted: true,
        is_encrypted: true,
        ..ItemRecord::default()
    });

    let lines = read_lines(dir.path().join("r1-item.log"));
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["stageID"], 7);
    assert_eq!(lines[0]["count"], 42);
    assert_eq!(lines[0]["ts"], 5_000);
    assert_eq!(lines[0]["flags"], serde_json::json!(["CORRUPTED", "ENCRYPTED"]));
    // Empty optional fields are omitted entirely.
    assert!(lines[0].get("processStage").is_none());
}

#[test]
fn message_log_separates_runners() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::at(1_000);
    let logs = logs(dir.path(), &clock);

    logs.message(
        "error",
        &MessageRecord {
            runner: "r1".to_string(),
            message: "stage blew up".to_string(),
            exception: "java.io.IOException".to_string(),
            ..MessageRecord::default()
        },
    );
    logs.message(
        "info",
        &MessageRecord {
            runner: "r2".to_string(),
            message: "starting".to_string(),
            ..MessageRecord::default()
        },
    );

    let r1 = read_lines(dir.path().join("r1-runner.log"));
    assert_eq!(r1[0]["level"], "error");
    assert_eq!(r1[0]["exception"], "java.io.IOException");
    let r2 = read_lines(dir.path().join("r2-runner.log"));
    assert_eq!(r2[0]["level"], "info");
    assert_eq!(logs.open_handles(), 2);
}

#[test]
fn clean_evicts_idle_handles_only() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::at(1_000);
    let logs = logs(dir.path(), &clock);

    logs.message("info", &MessageRecord {
        runner: "old".to_string(),
        message: "hello".to_string(),
        ..MessageRecord::default()
    });

    clock.advance(JANITOR_PERIOD.as_millis() as u64 + 1);
    logs.message("info", &MessageRecord {
        runner: "fresh".to_string(),
        message: "hello".to_string(),
        ..MessageRecord::default()
    });

    let cutoff = clock.epoch_ms() - JANITOR_PERIOD.as_millis() as u64;
    logs.clean(cutoff);
    assert_eq!(logs.open_handles(), 1);

    // A new write to the evicted runner re-opens and appends.
    logs.message("info", &MessageRecord {
        runner: "old".to_string(),
        message: "again".to_string(),
        ..MessageRecord::default()
    });
    assert_eq!(read_lines(dir.path().join("old-runner.log")).len(), 2);
}
