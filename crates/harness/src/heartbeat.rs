// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness snapshot of the child process for `/hb`.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use sysinfo::{Pid, ProcessRefreshKind, System};

/// CPU usage is a delta; sample over a short window.
const CPU_SAMPLE_INTERVAL: Duration = Duration::from_millis(250);

/// Point-in-time view of the child process.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSnapshot {
    pub pid: i32,
    pub name: String,
    pub status: String,
    #[serde(rename = "cpu-pct")]
    pub cpu_pct: f32,
    #[serde(rename = "mem-rss-mb")]
    pub mem_rss_mb: f64,
    pub threads: usize,
    #[serde(rename = "open-files")]
    pub open_files: usize,
    /// Process creation time, seconds since the epoch.
    pub created: u64,
}

/// Sample the child. `None` when the process has vanished mid-sample.
pub(crate) async fn snapshot(pid: i32) -> Option<ProcessSnapshot> {
    let spid = Pid::from_u32(u32::try_from(pid).ok()?);
    let refresh = ProcessRefreshKind::everything();

    let mut system = System::new();
    system.refresh_process_specifics(spid, refresh);
    tokio::time::sleep(CPU_SAMPLE_INTERVAL).await;
    system.refresh_process_specifics(spid, refresh);

    let process = system.process(spid)?;

    Some(ProcessSnapshot {
        pid,
        name: process.name().to_string(),
        status: process.status().to_string(),
        cpu_pct: process.cpu_usage(),
        mem_rss_mb: process.memory() as f64 / (1024.0 * 1024.0),
        threads: count_entries(&format!("/proc/{pid}/task")),
        open_files: count_entries(&format!("/proc/{pid}/fd")),
        created: process.start_time(),
    })
}

/// Entry count of a /proc subdirectory. Zero when the directory is gone or
/// unreadable.
fn count_entries(path: &str) -> usize {
    std::fs::read_dir(Path::new(path))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
