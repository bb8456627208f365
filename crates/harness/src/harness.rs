// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Harness construction and the supervise/teardown protocol.

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{error, info};

use crib_config::ResolvedConfig;
use crib_core::{
    command_channel, status_channel, Cradle, CradleHandle, CommandReceiver, CommandSender,
    StatusReceiver, StatusSender,
};

use crate::child::{spawn_child, ChildProcess};
use crate::http::{control_router, ControlCtx, StatusCache};

/// Harness failures. Everything here precedes or replaces a clean exit code;
/// child faults are not errors, they are exit codes.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Failed to bind control server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("OS refused to create the child process: {0}")]
    Spawn(nix::Error),

    #[error("Channel setup failed: {0}")]
    Channel(std::io::Error),

    #[error("Failed to build supervising runtime: {0}")]
    Runtime(std::io::Error),

    #[error("Control server failed: {0}")]
    Server(std::io::Error),
}

/// The supervisor: owns the control server, both channels, and the child.
///
/// Consumed by [`ProcessHarness::run`]; one harness supervises exactly one
/// child process.
pub struct ProcessHarness {
    config: ResolvedConfig,
    command_tx: CommandSender,
    command_rx: CommandReceiver,
    status_tx: StatusSender,
    status_rx: StatusReceiver,
}

impl ProcessHarness {
    /// Create the harness and its two cross-process channels.
    pub fn new(config: ResolvedConfig) -> Result<Self, HarnessError> {
        let (command_tx, command_rx) = command_channel().map_err(HarnessError::Channel)?;
        let (status_tx, status_rx) = status_channel().map_err(HarnessError::Channel)?;

        Ok(Self {
            config,
            command_tx,
            command_rx,
            status_tx,
            status_rx,
        })
    }

    /// Launch the job and supervise it to completion.
    ///
    /// Binds the control socket, forks the child with its channel ends and
    /// `target-config` attached, then serves the control surface until the
    /// child exits. Returns the child's exit code.
    ///
    /// Must be called outside any async runtime: the fork happens here.
    pub fn run(self, job: Box<dyn Cradle>) -> Result<i32, HarnessError> {
        let addr = SocketAddr::from((self.config.interface(), self.config.port()));
        let listener = bind(addr)?;

        // Child ends travel into the fork; parent keeps the other two.
        let handle = CradleHandle::new(
            self.command_rx,
            self.status_tx,
            self.config.target_config(),
        );
        let child = Arc::new(spawn_child(job, handle)?);

        info!(pid = child.pid(), %addr, "launched target process");

        let ctx = Arc::new(ControlCtx {
            child: Arc::clone(&child),
            commands: self.command_tx,
            status: Mutex::new(StatusCache {
                rx: self.status_rx,
                last: None,
            }),
        });

        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                // No supervisor will ever exist; the fork must not outlive us.
                let _ = child.kill();
                child.wait();
                return Err(HarnessError::Runtime(e));
            }
        };

        runtime.block_on(supervise(listener, Arc::clone(&child), ctx))
    }
}

fn bind(addr: SocketAddr) -> Result<TcpListener, HarnessError> {
    let make_err = |source| HarnessError::Bind { addr, source };
    let listener = TcpListener::bind(addr).map_err(make_err)?;
    // Tokio's listener wrapper requires the fd in non-blocking mode.
    listener.set_nonblocking(true).map_err(make_err)?;
    Ok(listener)
}

/// Serve the control surface until the child exits or the server dies.
///
/// The blocking reap runs on the runtime's blocking pool so the event loop
/// keeps answering requests for the child's whole lifetime. Whichever way
/// this returns, the child has been reaped: a server fault force-kills the
/// job first (it has no supervisor anymore), then the reap is awaited.
async fn supervise(
    listener: TcpListener,
    child: Arc<ChildProcess>,
    ctx: Arc<ControlCtx>,
) -> Result<i32, HarnessError> {
    let shutdown = Arc::new(Notify::new());

    let reaper = {
        let child = Arc::clone(&child);
        let shutdown = Arc::clone(&shutdown);
        tokio::task::spawn_blocking(move || {
            let code = child.wait();
            info!(pid = child.pid(), code, "target process exited");
            shutdown.notify_one();
            code
        })
    };

    let serve_result = match tokio::net::TcpListener::from_std(listener) {
        Ok(tokio_listener) => {
            axum::serve(tokio_listener, control_router(ctx))
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
        }
        Err(e) => Err(e),
    };

    if serve_result.is_err() && child.alive() {
        error!(
            pid = child.pid(),
            "server stopped while job still alive, killing launched job"
        );
        let _ = child.kill();
    }

    let code = match reaper.await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "reaper task failed");
            child.wait()
        }
    };

    serve_result.map_err(HarnessError::Server)?;
    Ok(code)
}

#[cfg(test)]
#[path = "harness_tests.rs"]
mod tests;
