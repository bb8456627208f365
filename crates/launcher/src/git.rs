// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source-control checkout adapter, driven through the `git` CLI.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::info;

use crib_config::SourceSpec;

use crate::error::LaunchError;
use crate::subprocess::{run_with_timeout, GIT_TIMEOUT};

/// A clone-or-update view of one remote repository inside a workdir.
#[derive(Debug, Clone)]
pub struct GitSource {
    repo: String,
    branch: String,
    workdir: PathBuf,
    use_local: bool,
}

impl GitSource {
    pub fn from_spec(spec: &SourceSpec) -> Self {
        Self {
            repo: spec.repo.clone(),
            branch: spec.branch.clone(),
            workdir: spec.workdir.clone(),
            use_local: spec.use_local,
        }
    }

    /// Directory name the repo checks out under: last URL segment, `.git`
    /// stripped.
    pub fn repo_name(&self) -> String {
        self.repo
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.repo)
            .trim_end_matches(".git")
            .to_string()
    }

    /// Where the checkout lives.
    pub fn local_dir(&self) -> PathBuf {
        self.workdir.join(self.repo_name())
    }

    /// Clone the repo, or bring an existing checkout onto the configured
    /// branch. With `use-local` set, an existing checkout is trusted as-is
    /// and the network is never touched.
    pub async fn checkout(&self) -> Result<PathBuf, LaunchError> {
        std::fs::create_dir_all(&self.workdir)?;
        let dir = self.local_dir();

        if dir.join(".git").exists() {
            self.verify_remote(&dir).await?;

            if self.use_local {
                info!(dir = %dir.display(), "using existing local checkout");
                return Ok(dir);
            }

            info!(repo = %self.repo, branch = %self.branch, "updating existing checkout");
            self.git(&dir, &["fetch", "origin"]).await?;
            self.git(&dir, &["checkout", &self.branch]).await?;
            self.git(&dir, &["pull", "--ff-only", "origin", &self.branch])
                .await?;
            return Ok(dir);
        }

        if self.use_local {
            return Err(LaunchError::Checkout(format!(
                "use-local is set but no checkout exists at {}",
                dir.display()
            )));
        }

        info!(repo = %self.repo, branch = %self.branch, dir = %dir.display(), "cloning");
        let mut cmd = Command::new("git");
        cmd.args(["clone", "--branch", &self.branch, &self.repo])
            .arg(&dir);
        run_checked(cmd, "git clone").await?;
        Ok(dir)
    }

    /// An existing directory pointing at a different remote is someone
    /// else's checkout; refuse rather than clobber.
    async fn verify_remote(&self, dir: &Path) -> Result<(), LaunchError> {
        let output = self.git(dir, &["remote", "get-url", "origin"]).await?;
        let local_url = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if normalize_url(&local_url) != normalize_url(&self.repo) {
            return Err(LaunchError::Checkout(format!(
                "{} holds a checkout of {} but config expects {}",
                dir.display(),
                local_url,
                self.repo
            )));
        }
        Ok(())
    }

    async fn git(&self, dir: &Path, args: &[&str]) -> Result<std::process::Output, LaunchError> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(dir).args(args);
        run_checked(cmd, &format!("git {}", args.join(" "))).await
    }
}

async fn run_checked(cmd: Command, description: &str) -> Result<std::process::Output, LaunchError> {
    let output = run_with_timeout(cmd, GIT_TIMEOUT, description)
        .await
        .map_err(LaunchError::Checkout)?;

    if !output.status.success() {
        return Err(LaunchError::Checkout(format!(
            "{} failed: {}",
            description,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(output)
}

fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').trim_end_matches(".git").to_string()
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
