// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn keys(value: &serde_json::Value) -> Vec<&str> {
    value
        .as_object()
        .map(|m| m.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

#[test]
fn sent_envelope_shape() {
    let envelope = serde_json::to_value(CommandEnvelope::sent(Command::Start, 42)).unwrap();

    assert_eq!(
        keys(&envelope),
        vec!["status", "command", "target-process", "time"]
    );
    assert_eq!(envelope["status"], json!("SENT"));
    assert_eq!(envelope["command"], json!("START"));
    assert_eq!(envelope["target-process"], json!(42));
}

#[test]
fn error_envelope_carries_the_reason() {
    let envelope =
        serde_json::to_value(CommandEnvelope::error(Command::Heartbeat, 42, "Launched process is not alive"))
            .unwrap();

    assert_eq!(envelope["status"], json!("ERROR"));
    assert_eq!(envelope["error"], json!("Launched process is not alive"));
}

#[test]
fn status_envelope_shape() {
    let envelope = serde_json::to_value(StatusEnvelope::new(json!({"ii": 3}), 42)).unwrap();

    assert_eq!(
        keys(&envelope),
        vec!["process-status", "target-process", "time"]
    );
    assert_eq!(envelope["process-status"], json!({"ii": 3}));
}

#[test]
fn heartbeat_envelope_shape() {
    let snapshot = ProcessSnapshot {
        pid: 42,
        name: "job".into(),
        status: "Run".into(),
        cpu_pct: 1.5,
        mem_rss_mb: 10.0,
        threads: 2,
        open_files: 5,
        created: 1_700_000_000,
    };
    let envelope = serde_json::to_value(HeartbeatEnvelope::new(snapshot)).unwrap();

    assert_eq!(keys(&envelope), vec!["status", "time", "service", "process"]);
    assert_eq!(envelope["status"], json!(true));
    assert_eq!(envelope["service"], json!({}));
    assert_eq!(
        keys(&envelope["process"]),
        vec![
            "pid",
            "name",
            "status",
            "cpu-pct",
            "mem-rss-mb",
            "threads",
            "open-files",
            "created"
        ]
    );
}

#[test]
fn failure_bodies() {
    let not_found = serde_json::to_value(ErrorBody::not_found("/nope")).unwrap();
    assert_eq!(not_found, json!({"detail": "Route not found: /nope"}));

    let internal = serde_json::to_value(ErrorBody::internal("boom")).unwrap();
    assert_eq!(internal, json!({"detail": "An internal error occurred: boom"}));
}

#[test]
fn timestamps_use_the_documented_format() {
    let time = timestamp();
    assert!(chrono::NaiveDateTime::parse_from_str(&time, TIME_FORMAT).is_ok());
}
