// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The process harness: the supervising runtime of crib.
//!
//! A harness owns the HTTP control server, the command and status channels,
//! and exactly one child process running a cradle. Operators talk to the
//! control surface; the child polls commands and publishes status at its own
//! pace; the harness reports liveness and last-known status and returns the
//! child's exit code when it is done.
//!
//! Architecture:
//! - Child process: forked before the runtime exists, runs the cradle
//!   synchronously.
//! - Supervising loop: axum server on a tokio runtime in the parent, with
//!   the blocking child reap offloaded to a background worker.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod child;
mod envelope;
mod harness;
mod heartbeat;
mod http;

pub use child::ChildProcess;
pub use envelope::{CommandEnvelope, ErrorBody, HeartbeatEnvelope, StatusEnvelope, TIME_FORMAT};
pub use harness::{HarnessError, ProcessHarness};
pub use heartbeat::ProcessSnapshot;
