// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use thiserror::Error;

use crib_config::ConfigError;
use crib_harness::HarnessError;
use crib_scan::ScanError;

/// Launch pipeline failures. All fatal variants short-circuit before any
/// child process is spawned; harness errors carry their own semantics.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error("Source checkout failed: {0}")]
    Checkout(String),

    #[error("Resolved source path does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("Failed to compile entry point {entry}: {reason}")]
    Compile { entry: String, reason: String },

    #[error("Entry point {entry} ({kind}) cannot be adapted by the wrapper")]
    Unwrappable { entry: String, kind: String },

    #[error("Environment manager failed: {0}")]
    EnvManager(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
