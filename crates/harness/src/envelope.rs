// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response envelopes of the control surface.
//!
//! The command envelope is stable and bit-exact: kebab-case keys,
//! microsecond local timestamps, `status` of `"SENT"` or `"ERROR"`.

use serde::Serialize;
use serde_json::Value;

use crib_core::Command;

use crate::heartbeat::ProcessSnapshot;

/// Timestamp format used in every envelope.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub(crate) fn timestamp() -> String {
    chrono::Local::now().format(TIME_FORMAT).to_string()
}

/// Envelope returned by the command verbs and `/kill`.
#[derive(Debug, Serialize)]
pub struct CommandEnvelope {
    pub status: &'static str,
    pub command: Command,
    #[serde(rename = "target-process")]
    pub target_process: i32,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandEnvelope {
    pub fn sent(command: Command, target_process: i32) -> Self {
        Self {
            status: "SENT",
            command,
            target_process,
            time: timestamp(),
            error: None,
        }
    }

    pub fn error(command: Command, target_process: i32, error: impl Into<String>) -> Self {
        Self {
            status: "ERROR",
            command,
            target_process,
            time: timestamp(),
            error: Some(error.into()),
        }
    }
}

/// Envelope returned by `/status`.
#[derive(Debug, Serialize)]
pub struct StatusEnvelope {
    #[serde(rename = "process-status")]
    pub process_status: Value,
    #[serde(rename = "target-process")]
    pub target_process: i32,
    pub time: String,
}

impl StatusEnvelope {
    pub fn new(process_status: Value, target_process: i32) -> Self {
        Self {
            process_status,
            target_process,
            time: timestamp(),
        }
    }
}

/// Envelope returned by `/hb` while the child is alive.
#[derive(Debug, Serialize)]
pub struct HeartbeatEnvelope {
    pub status: bool,
    pub time: String,
    /// Reserved for service-level health; currently always empty.
    pub service: Value,
    pub process: ProcessSnapshot,
}

impl HeartbeatEnvelope {
    pub fn new(process: ProcessSnapshot) -> Self {
        Self {
            status: true,
            time: timestamp(),
            service: Value::Object(serde_json::Map::new()),
            process,
        }
    }
}

/// Uniform failure body for 404s and internal errors.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn not_found(path: &str) -> Self {
        Self {
            detail: format!("Route not found: {path}"),
        }
    }

    pub fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            detail: format!("An internal error occurred: {error}"),
        }
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
