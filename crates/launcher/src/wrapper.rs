// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entry-point adaptation: turn a selected entry into something the harness
//! can fork.
//!
//! `fn main` entries compile as-is. Function and callable-type entries get
//! a generated driver that includes the target file and forwards the return
//! value as an exit code. The compiled binary then runs as [`ExecCradle`],
//! which execs it with the channel fds inherited so a cradle-aware target
//! can still attach via the `CRIB_*` environment variables.

use std::ffi::CString;
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::unistd::execve;
use tokio::process::Command;
use tracing::{error, info};

use crib_core::{Cradle, CradleHandle, COMMAND_FD_ENV, STATUS_FD_ENV, TARGET_CONFIG_ENV};
use crib_scan::{EntryKind, EntryPoint, ScanReport};

use crate::error::LaunchError;
use crate::subprocess::{run_with_timeout, COMPILE_TIMEOUT};

/// Compile the selected entry of `src` into a standalone binary.
///
/// `work_root` becomes the compiler's working directory, standing in for
/// the checkout root on the include path.
pub(crate) async fn compile_entry(
    src: &Path,
    entry: &EntryPoint,
    report: &ScanReport,
    build_dir: &Path,
    work_root: &Path,
) -> Result<PathBuf, LaunchError> {
    let driver = match entry.kind {
        EntryKind::Main => src.to_path_buf(),
        EntryKind::MainLike | EntryKind::Function | EntryKind::CallableType => {
            let driver = build_dir.join("driver.rs");
            std::fs::write(&driver, driver_source(entry, report, src))?;
            driver
        }
        EntryKind::CradleImpl | EntryKind::TopLevelCall => {
            // Cradle-shaped entries need a build linked against the harness
            // crates; top-level invocations are not callable definitions.
            return Err(LaunchError::Unwrappable {
                entry: entry.name.clone(),
                kind: format!("{:?}", entry.kind),
            });
        }
    };

    let binary = build_dir.join("entry");
    let mut cmd = Command::new("rustc");
    cmd.current_dir(work_root)
        .arg("--edition")
        .arg("2021")
        .arg(&driver)
        .arg("-o")
        .arg(&binary);

    let output = run_with_timeout(cmd, COMPILE_TIMEOUT, "rustc")
        .await
        .map_err(|reason| LaunchError::Compile {
            entry: entry.name.clone(),
            reason,
        })?;

    if !output.status.success() {
        return Err(LaunchError::Compile {
            entry: entry.name.clone(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    info!(entry = %entry.name, binary = %binary.display(), "compiled entry point");
    Ok(binary)
}

/// Generated main that calls the entry and exits with its return value.
///
/// The target is included at the crate root so non-`pub` entries stay
/// reachable; only a file with its own `fn main` gets wrapped in a module
/// to keep the two mains apart.
fn driver_source(entry: &EntryPoint, report: &ScanReport, src: &Path) -> String {
    let (include, prefix) = if report.has_main {
        (
            format!("mod job {{\n    include!({src:?});\n}}"),
            "job::",
        )
    } else {
        (format!("include!({src:?});"), "")
    };

    let invocation = match entry.kind {
        EntryKind::CallableType => {
            let has_new = report
                .types
                .iter()
                .any(|t| t.name == entry.name && t.has_new);
            if has_new {
                format!("{prefix}{}::new().call()", entry.name)
            } else {
                format!("{prefix}{}::default().call()", entry.name)
            }
        }
        _ => format!("{prefix}{}()", entry.name),
    };

    format!(
        r#"// Generated by the crib launcher; drives the selected entry point.
#![allow(dead_code, unused_imports)]

{include}

trait IntoCode {{
    fn into_code(self) -> i32;
}}

impl IntoCode for () {{
    fn into_code(self) -> i32 {{
        0
    }}
}}

impl IntoCode for i32 {{
    fn into_code(self) -> i32 {{
        self
    }}
}}

fn main() {{
    std::process::exit(IntoCode::into_code({invocation}));
}}
"#
    )
}

/// A cradle that execs a compiled entry binary.
///
/// `run` replaces the forked child's process image via `execve(2)`, so the
/// pid the harness supervises IS the entry binary: its exit code flows back
/// through the ordinary reap, and `/kill` reaches the real job. The channel
/// fds stay inherited (CLOEXEC cleared just before the exec) and their
/// numbers travel in the environment, so a target built against the cradle
/// contract can pick them up with `CradleHandle::from_env`.
pub struct ExecCradle {
    binary: PathBuf,
}

impl ExecCradle {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }
}

impl Cradle for ExecCradle {
    fn run(&mut self, handle: &mut CradleHandle) -> i32 {
        let (command_fd, status_fd) = handle.channel_fds();

        // Clear FD_CLOEXEC so the channel fds survive the execve.
        for fd in [command_fd, status_fd] {
            if let Err(e) = fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty())) {
                error!(error = %e, "failed to prepare channel fd for exec");
                return 1;
            }
        }

        let Ok(program) = CString::new(self.binary.as_os_str().as_bytes()) else {
            error!(binary = %self.binary.display(), "entry binary path contains a NUL byte");
            return 127;
        };
        let args = [program.clone()];
        let env = child_env(raw(command_fd), raw(status_fd), handle.target_config());

        // On success this never returns: the child becomes the entry binary.
        match execve(&program, &args, &env) {
            Ok(never) => match never {},
            Err(e) => {
                error!(binary = %self.binary.display(), error = %e, "failed to exec entry binary");
                127
            }
        }
    }
}

/// The inherited environment plus the three channel-handoff variables.
fn child_env(command_fd: RawFd, status_fd: RawFd, target_config: &serde_json::Value) -> Vec<CString> {
    let handoff = [COMMAND_FD_ENV, STATUS_FD_ENV, TARGET_CONFIG_ENV];

    let mut env: Vec<CString> = std::env::vars_os()
        .filter(|(key, _)| !handoff.iter().any(|h| key == h))
        .filter_map(|(key, value)| {
            let mut bytes = key.into_vec();
            bytes.push(b'=');
            bytes.extend(value.into_vec());
            CString::new(bytes).ok()
        })
        .collect();

    for (key, value) in [
        (COMMAND_FD_ENV, command_fd.to_string()),
        (STATUS_FD_ENV, status_fd.to_string()),
        (TARGET_CONFIG_ENV, target_config.to_string()),
    ] {
        if let Ok(entry) = CString::new(format!("{key}={value}")) {
            env.push(entry);
        }
    }

    env
}

fn raw(fd: BorrowedFd<'_>) -> RawFd {
    fd.as_raw_fd()
}

#[cfg(test)]
#[path = "wrapper_tests.rs"]
mod tests;
