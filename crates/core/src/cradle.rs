// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The cradle contract: what a supervised unit of work implements.
//!
//! The harness injects a [`CradleHandle`] before `run` starts. The contract
//! is cooperative — the harness never interrupts the child to deliver a
//! command, so verbs other than KILL only take effect when the cradle polls.

use std::os::fd::{AsFd, BorrowedFd};

use serde_json::Value;

use crate::channel::{ChannelError, CommandReceiver, StatusSender};
use crate::command::CommandMsg;

/// The child's end of both channels plus its slice of the configuration.
///
/// `target-config` is the only subtree the child ever sees; the harness and
/// logging sections stay on the supervisor side.
#[derive(Debug)]
pub struct CradleHandle {
    commands: CommandReceiver,
    status: StatusSender,
    target_config: Value,
}

impl CradleHandle {
    pub fn new(commands: CommandReceiver, status: StatusSender, target_config: Value) -> Self {
        Self {
            commands,
            status,
            target_config,
        }
    }

    /// Attach from channel fds inherited across exec (compiled entry points).
    pub fn from_env() -> Result<Self, ChannelError> {
        let commands = CommandReceiver::from_env()?;
        let status = StatusSender::from_env()?;
        let target_config = match std::env::var(crate::channel::TARGET_CONFIG_ENV) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(_) => Value::Object(serde_json::Map::new()),
        };
        Ok(Self::new(commands, status, target_config))
    }

    /// Non-blocking: at most one pending command record, or nothing.
    ///
    /// An undecodable record is dropped with a warning rather than surfaced;
    /// a cradle loop has no sensible recovery for it.
    pub fn poll_command(&mut self) -> Option<CommandMsg> {
        match self.commands.poll() {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable command record");
                None
            }
        }
    }

    /// Non-blocking publish; overwrites any unread prior status from the
    /// supervisor's point of view.
    pub fn publish_status(&self, status: Value) {
        if let Err(e) = self.status.publish(&status) {
            tracing::warn!(error = %e, "failed to publish status");
        }
    }

    /// The opaque configuration subtree owned by the child.
    pub fn target_config(&self) -> &Value {
        &self.target_config
    }

    /// The channel endpoints as borrowed fds, for handing to an exec'd entry
    /// (command receiver first, status sender second).
    pub fn channel_fds(&self) -> (BorrowedFd<'_>, BorrowedFd<'_>) {
        (self.commands.as_fd(), self.status.as_fd())
    }
}

/// A unit of work the harness can supervise.
pub trait Cradle: Send {
    /// Perform the work. The returned integer becomes the child process's
    /// exit code.
    fn run(&mut self, handle: &mut CradleHandle) -> i32;
}

/// Conversion of a job's return value into an exit code.
///
/// `()` means success; an `Err` is logged and reported as 1.
pub trait IntoExitCode {
    fn into_code(self) -> i32;
}

impl IntoExitCode for () {
    fn into_code(self) -> i32 {
        0
    }
}

impl IntoExitCode for i32 {
    fn into_code(self) -> i32 {
        self
    }
}

impl IntoExitCode for u8 {
    fn into_code(self) -> i32 {
        i32::from(self)
    }
}

impl<T, E> IntoExitCode for Result<T, E>
where
    T: IntoExitCode,
    E: std::fmt::Display,
{
    fn into_code(self) -> i32 {
        match self {
            Ok(v) => v.into_code(),
            Err(e) => {
                tracing::error!(error = %e, "job failed");
                1
            }
        }
    }
}

/// An anonymous cradle synthesized from a plain callable.
///
/// This is how the launcher accepts a bare function or closure as a job.
pub struct CradleFn<F>(F);

impl<F> CradleFn<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F, R> Cradle for CradleFn<F>
where
    F: FnMut(&mut CradleHandle) -> R + Send,
    R: IntoExitCode,
{
    fn run(&mut self, handle: &mut CradleHandle) -> i32 {
        (self.0)(handle).into_code()
    }
}

#[cfg(test)]
#[path = "cradle_tests.rs"]
mod tests;
