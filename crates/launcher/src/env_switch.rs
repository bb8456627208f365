// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The outermost façade: switch into a named isolated runtime when the
//! config asks for one, then run the repo launcher there.
//!
//! The switch re-invokes this same binary (`launch-file` subcommand) inside
//! the environment, handing the already-resolved config over through a
//! short-lived temp file that is removed once the child exits.

use std::ffi::OsStr;
use std::io::Write;

use tempfile::NamedTempFile;
use tracing::info;

use crib_config::ConfigSource;

use crate::error::LaunchError;
use crate::mamba::EnvManager;
use crate::repo::RepoLauncher;

pub struct EnvSwitchingLauncher;

impl EnvSwitchingLauncher {
    pub fn launch(config: impl Into<ConfigSource>) -> Result<i32, LaunchError> {
        Self::launch_with(config, &EnvManager::default())
    }

    /// Launch with an explicit environment manager (tests use a stub).
    pub fn launch_with(
        config: impl Into<ConfigSource>,
        env_manager: &EnvManager,
    ) -> Result<i32, LaunchError> {
        let resolved = config.into().resolve()?;

        let Some(env) = resolved.env_name()? else {
            // No env section: same environment, straight to the repo
            // launcher. Hand over the resolved tree so the store is not
            // consulted twice.
            return RepoLauncher::launch(ConfigSource::Inline(resolved.root().clone()));
        };

        let config_file = write_config_file(resolved.root())?;
        let current_exe = std::env::current_exe()?;

        info!(env, config_file = %config_file.path().display(), "switching runtime environment");

        let argv: Vec<&OsStr> = vec![
            current_exe.as_os_str(),
            OsStr::new("launch-file"),
            OsStr::new("--config"),
            config_file.path().as_os_str(),
        ];
        let code = env_manager.run_in_env(env, &argv)?;

        // Dropping the handle removes the temp file now that the child has
        // exited.
        drop(config_file);
        Ok(code)
    }
}

/// Serialize the resolved config for the re-invocation. The file lives
/// exactly as long as the delegated launch.
fn write_config_file(root: &serde_json::Value) -> Result<NamedTempFile, LaunchError> {
    let mut file = tempfile::Builder::new()
        .prefix("crib-config-")
        .suffix(".json")
        .tempfile()?;
    file.write_all(root.to_string().as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
#[path = "env_switch_tests.rs"]
mod tests;
