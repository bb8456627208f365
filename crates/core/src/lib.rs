// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared vocabulary of the crib harness.
//!
//! This crate defines the command set, the cross-process command/status
//! channels, and the cradle contract a supervised unit of work implements.
//! Both sides of the process boundary depend on it: the supervisor through
//! the sender/drain endpoints, the child through [`CradleHandle`].

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod channel;
pub mod command;
pub mod cradle;

pub use channel::{
    command_channel, status_channel, ChannelError, CommandReceiver, CommandSender, StatusReceiver,
    StatusSender, COMMAND_FD_ENV, MAX_MESSAGE_SIZE, STATUS_FD_ENV, TARGET_CONFIG_ENV,
};
pub use command::{Command, CommandMsg};
pub use cradle::{Cradle, CradleFn, CradleHandle, IntoExitCode};
