// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The repo launcher: checkout, scan, select, compile, launch.

use std::path::PathBuf;

use tempfile::TempDir;
use tracing::info;

use crib_config::{ConfigSource, SourceSpec};
use crib_scan::{scan, select};

use crate::error::LaunchError;
use crate::git::GitSource;
use crate::launcher::{LaunchOptions, Launcher};
use crate::logging;
use crate::wrapper::{self, ExecCradle};

/// A compiled entry binary plus the build directory keeping it alive.
#[derive(Debug)]
struct PreparedJob {
    binary: PathBuf,
    _build_dir: TempDir,
}

/// Outer façade that turns a `source` config section into a running child.
pub struct RepoLauncher;

impl RepoLauncher {
    pub fn launch(config: impl Into<ConfigSource>) -> Result<i32, LaunchError> {
        Self::launch_with_options(config, LaunchOptions::default())
    }

    pub fn launch_with_options(
        config: impl Into<ConfigSource>,
        options: LaunchOptions,
    ) -> Result<i32, LaunchError> {
        let resolved = config.into().resolve()?;

        match resolved.logging() {
            Some(fragment) => logging::init(fragment),
            None => logging::init_default(),
        }

        let spec = resolved.source()?;

        // Checkout and compile run on their own short-lived runtime; it is
        // gone again before the harness forks.
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let prepared = runtime.block_on(prepare_job(&spec));
        drop(runtime);
        let prepared = prepared?;

        info!("starting target process");
        let code = Launcher::launch(
            Box::new(ExecCradle::new(prepared.binary.clone())),
            ConfigSource::Inline(resolved.root().clone()),
            options,
        )?;
        info!("finished target process");

        drop(prepared);
        Ok(code)
    }
}

async fn prepare_job(spec: &SourceSpec) -> Result<PreparedJob, LaunchError> {
    let checkout = GitSource::from_spec(spec).checkout().await?;
    let src_root = locate_source_root(&checkout, spec);
    let src_path = src_root.join(&spec.file_to_run);

    if !src_path.exists() {
        return Err(LaunchError::SourceMissing(src_path));
    }

    let report = scan(&src_path)?;
    for ep in &report.entry_points {
        info!(name = %ep.name, priority = ep.priority, "found viable entry point: {}", ep.description);
    }

    let entry = select(&report.entry_points, spec.entry_point.as_deref())?;
    info!(name = %entry.name, "selected entry point");

    let build_dir = tempfile::Builder::new().prefix("crib-build-").tempdir()?;
    let binary = wrapper::compile_entry(&src_path, entry, &report, build_dir.path(), &src_root).await?;

    Ok(PreparedJob {
        binary,
        _build_dir: build_dir,
    })
}

fn locate_source_root(checkout: &std::path::Path, spec: &SourceSpec) -> PathBuf {
    match spec.src_subfolder.as_deref() {
        Some(sub) => checkout.join(sub),
        None => checkout.to_path_buf(),
    }
}

#[cfg(test)]
#[path = "repo_tests.rs"]
mod tests;
