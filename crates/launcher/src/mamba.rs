// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-manager adapter.
//!
//! The core consumes exactly one capability of the manager: run an argv
//! inside a named isolated runtime. Everything else (recipes, env
//! materialization) belongs to the collaborator.

use std::ffi::{OsStr, OsString};

use tracing::info;

use crate::error::LaunchError;
use crate::subprocess::exit_code_of;

/// Runs commands inside named environments via `mamba run`.
#[derive(Debug, Clone)]
pub struct EnvManager {
    program: OsString,
}

impl Default for EnvManager {
    fn default() -> Self {
        Self {
            program: OsString::from("mamba"),
        }
    }
}

impl EnvManager {
    /// Use a different manager binary (micromamba, conda, a test stub).
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run `argv` inside the named environment and wait for it.
    ///
    /// No timeout: the argv is a full harness run and lasts as long as the
    /// job does. Returns the child's exit code.
    pub fn run_in_env(&self, env: &str, argv: &[&OsStr]) -> Result<i32, LaunchError> {
        info!(env, ?argv, "delegating into isolated runtime");

        let status = std::process::Command::new(&self.program)
            .args(["run", "-n", env, "--"])
            .args(argv)
            .status()
            .map_err(|e| {
                LaunchError::EnvManager(format!(
                    "failed to launch {}: {e}",
                    self.program.to_string_lossy()
                ))
            })?;

        Ok(exit_code_of(status))
    }
}

#[cfg(test)]
#[path = "mamba_tests.rs"]
mod tests;
