// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The innermost launch façade: job in hand, drive a harness around it.

use tracing::info;

use crib_config::ConfigSource;
use crib_core::{Cradle, CradleFn, CradleHandle, IntoExitCode};
use crib_harness::ProcessHarness;

use crate::error::LaunchError;
use crate::logging;

/// Knobs of a launch.
#[derive(Debug, Clone, Copy, Default)]
pub struct LaunchOptions {
    /// Exit the supervising process with the child's code instead of
    /// returning it.
    pub exit_on_completion: bool,
}

/// Entry façade: resolve config, set up logging, build and drive a harness,
/// surface the child's exit code.
pub struct Launcher;

impl Launcher {
    /// Launch a cradle under a fresh harness.
    ///
    /// Must be called outside any async runtime; the harness forks.
    pub fn launch(
        job: Box<dyn Cradle>,
        config: impl Into<ConfigSource>,
        options: LaunchOptions,
    ) -> Result<i32, LaunchError> {
        let resolved = config.into().resolve()?;

        match resolved.logging() {
            Some(fragment) => logging::init(fragment),
            None => logging::init_default(),
        }

        let harness = ProcessHarness::new(resolved)?;
        let exit_code = harness.run(job)?;

        if options.exit_on_completion {
            std::process::exit(exit_code);
        }

        info!(exit_code, "harness finished");
        Ok(exit_code)
    }

    /// Launch a plain callable by synthesizing an anonymous cradle for it.
    pub fn launch_fn<F, R>(
        job: F,
        config: impl Into<ConfigSource>,
        options: LaunchOptions,
    ) -> Result<i32, LaunchError>
    where
        F: FnMut(&mut CradleHandle) -> R + Send + 'static,
        R: IntoExitCode,
    {
        Self::launch(Box::new(CradleFn::new(job)), config, options)
    }
}
