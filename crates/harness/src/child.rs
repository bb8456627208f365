// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The supervised child process: spawn, liveness, kill, reap.

use std::panic::AssertUnwindSafe;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use parking_lot::Mutex;

use crib_core::{Cradle, CradleHandle};

use crate::harness::HarnessError;

/// Exit code reported when the cradle panics out of `run`.
const PANIC_EXIT_CODE: i32 = 101;

/// Handle to the one child process a harness supervises.
///
/// Created when the child is forked, destroyed when the harness returns.
/// The exit code is recorded exactly once, by whoever reaps first.
#[derive(Debug)]
pub struct ChildProcess {
    pid: Pid,
    exit_code: Mutex<Option<i32>>,
}

impl ChildProcess {
    pub fn from_pid(pid: Pid) -> Self {
        Self {
            pid,
            exit_code: Mutex::new(None),
        }
    }

    /// OS pid of the child.
    pub fn pid(&self) -> i32 {
        self.pid.as_raw()
    }

    /// Whether the child is still running. False once reaped.
    pub fn alive(&self) -> bool {
        if self.exit_code.lock().is_some() {
            return false;
        }
        kill(self.pid, None).is_ok()
    }

    /// SIGKILL the child. Already-gone children are not an error.
    pub fn kill(&self) -> Result<(), Errno> {
        match kill(self.pid, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Block until the child exits; record and return its exit code.
    ///
    /// A termination by signal maps to `128 + signo`, the shell convention
    /// for killed processes. The lock is never held across the blocking
    /// syscall, so liveness probes keep answering while the reap is pending;
    /// a code already recorded by a concurrent reaper wins.
    pub fn wait(&self) -> i32 {
        if let Some(code) = *self.exit_code.lock() {
            return code;
        }

        let code = loop {
            match waitpid(self.pid, None) {
                Ok(WaitStatus::Exited(_, code)) => break code,
                Ok(WaitStatus::Signaled(_, signal, _)) => break 128 + signal as i32,
                Ok(_) => continue,
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    // ECHILD: someone else reaped it; fall back to whatever
                    // was recorded, or report failure.
                    tracing::warn!(pid = self.pid(), error = %e, "waitpid failed");
                    break self.exit_code.lock().unwrap_or(1);
                }
            }
        };

        *self.exit_code.lock().get_or_insert(code)
    }

    /// The recorded exit code, if the child has been reaped.
    pub fn exit_code(&self) -> Option<i32> {
        *self.exit_code.lock()
    }
}

/// Fork the child that runs the cradle.
///
/// Must happen before the tokio runtime exists: a fork with live runtime
/// threads inherits locks in unknown states. The child never returns from
/// here; the parent gets the handle.
pub(crate) fn spawn_child(
    job: Box<dyn Cradle>,
    handle: CradleHandle,
) -> Result<ChildProcess, HarnessError> {
    // The one place the process tree is rewritten by hand.
    #[allow(unsafe_code)]
    let fork_result = unsafe { fork() };

    match fork_result {
        Ok(ForkResult::Parent { child }) => Ok(ChildProcess::from_pid(child)),
        Ok(ForkResult::Child) => child_main(job, handle),
        Err(e) => Err(HarnessError::Spawn(e)),
    }
}

/// Child side: run the cradle synchronously and exit with its code.
fn child_main(mut job: Box<dyn Cradle>, mut handle: CradleHandle) -> ! {
    let code = match std::panic::catch_unwind(AssertUnwindSafe(|| job.run(&mut handle))) {
        Ok(code) => code,
        Err(_) => {
            tracing::error!("job panicked out of run");
            PANIC_EXIT_CODE
        }
    };
    std::process::exit(code);
}

#[cfg(test)]
#[path = "child_tests.rs"]
mod tests;
