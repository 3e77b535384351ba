// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use avian_core::Error;

#[test]
fn reply_success_has_empty_error() {
    let reply = Reply::from_result(Ok(ScriptBody {
        script: "puts 'hi'".to_string(),
    }));
    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["script"], "puts 'hi'");
    assert!(json.get("error").is_none());
}

#[test]
fn reply_failure_carries_error_string() {
    let reply: Reply<ScriptBody> = Reply::from_result(Err(Error::not_found("runner r1")));
    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["error"], "runner r1 not found");
    assert!(json.get("script").is_none());
}

#[test]
fn reply_round_trips_into_result() {
    let reply: Reply<Ack> = serde_json::from_str("{}").unwrap();
    assert!(reply.check().is_ok());

    let reply: Reply<Ack> = serde_json::from_str(r#"{"error": "boom"}"#).unwrap();
    assert_eq!(reply.check().unwrap_err(), "boom");
}

#[test]
fn stage_request_uses_wire_field_names() {
    let req: StageRequest = serde_json::from_str(r#"{"runner": "r1", "stageID": 7}"#).unwrap();
    assert_eq!(req.stage_id, 7);

    let req: RunnerStartRequest =
        serde_json::from_str(r#"{"id": 3, "runner": "r1", "caseID": "abc"}"#).unwrap();
    assert_eq!(req.case_id.as_deref(), Some("abc"));
}
