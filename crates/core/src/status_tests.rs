// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn terminal_statuses() {
    assert!(!RunStatus::Waiting.is_terminal());
    assert!(!RunStatus::Running.is_terminal());
    assert!(RunStatus::Failed.is_terminal());
    assert!(RunStatus::Finished.is_terminal());
    assert!(RunStatus::Timeout.is_terminal());
}

#[test]
fn default_is_waiting() {
    assert_eq!(RunStatus::default(), RunStatus::Waiting);
}

#[test]
fn serializes_lowercase() {
    let json = serde_json::to_string(&RunStatus::Finished).unwrap();
    assert_eq!(json, "\"finished\"");
    let back: RunStatus = serde_json::from_str("\"timeout\"").unwrap();
    assert_eq!(back, RunStatus::Timeout);
}
