// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-global logging, initialized once at launcher startup.
//!
//! The `logging` config fragment is opaque to the rest of the system; this
//! module gives it shape. Unknown keys are ignored so operator configs can
//! carry extra annotations without breaking a launch.

use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Deserialize;
use serde_json::Value;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Recognized keys of the logging fragment.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct LoggingFragment {
    /// Env-filter directive, e.g. `"info"` or `"crib=debug,axum=warn"`.
    pub level: Option<String>,
    /// Log to this file instead of the console.
    pub file: Option<PathBuf>,
    /// ANSI colors on console output.
    pub ansi: Option<bool>,
}

impl LoggingFragment {
    pub(crate) fn parse(fragment: &Value) -> Self {
        match serde_json::from_value(fragment.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Logging may not be up yet; eprint is the best we have.
                eprintln!("warning: unusable logging fragment ({e}), using defaults");
                Self::default()
            }
        }
    }
}

/// The appender guard must outlive the process; parked here after init.
static LOG_GUARD: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// Initialize logging from the config fragment. First caller wins; later
/// calls are no-ops, so the global subscriber is never reconfigured
/// mid-flight.
pub(crate) fn init(fragment: &Value) {
    init_with(LoggingFragment::parse(fragment));
}

/// Console logging at `info` when the config has no logging fragment.
pub(crate) fn init_default() {
    init_with(LoggingFragment::default());
}

fn init_with(fragment: LoggingFragment) {
    LOG_GUARD.get_or_init(|| {
        // RUST_LOG from the environment outranks the config fragment.
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(fragment.level.as_deref().unwrap_or("info"))
        });

        match fragment.file {
            Some(path) => {
                let directory = path.parent().unwrap_or_else(|| std::path::Path::new("."));
                let file_name = path.file_name().unwrap_or_else(|| "crib.log".as_ref());
                if let Some(parent) = path.parent() {
                    let _ = std::fs::create_dir_all(parent);
                }

                let appender = tracing_appender::rolling::never(directory, file_name);
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                let _ = tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .try_init();
                Some(guard)
            }
            None => {
                let _ = tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().with_ansi(fragment.ansi.unwrap_or(true)))
                    .try_init();
                None
            }
        }
    });
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
