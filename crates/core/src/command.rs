// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control verbs delivered from the harness to a supervised child.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of verbs an operator can send through the control plane.
///
/// `Kill` is part of the vocabulary for completeness, but `/kill` bypasses
/// the command channel entirely — it is never enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Heartbeat,
    Start,
    Stop,
    Pause,
    Resume,
    Config,
    Kill,
}

impl Command {
    /// Wire name of the verb.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Heartbeat => "HEARTBEAT",
            Command::Start => "START",
            Command::Stop => "STOP",
            Command::Pause => "PAUSE",
            Command::Resume => "RESUME",
            Command::Config => "CONFIG",
            Command::Kill => "KILL",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record on the command channel: a verb plus an opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMsg {
    pub cmd: Command,
    #[serde(default = "empty_object")]
    pub data: Value,
}

impl CommandMsg {
    /// A bare verb with an empty payload.
    pub fn new(cmd: Command) -> Self {
        Self {
            cmd,
            data: empty_object(),
        }
    }

    /// A verb carrying a payload (the `/data` endpoint's CONFIG records).
    pub fn with_data(cmd: Command, data: Value) -> Self {
        Self { cmd, data }
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
