// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process command and status channels.
//!
//! One JSON datagram per message. SOCK_DGRAM over AF_UNIX preserves message
//! boundaries and ordering, so the FIFO guarantee comes from the OS and no
//! length-prefix framing is needed. Both endpoints are non-blocking: the
//! child polls commands without waiting, and a full status buffer drops the
//! update instead of stalling the producer.

use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, RawFd};
use std::os::unix::net::UnixDatagram;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::command::CommandMsg;

/// Channel errors
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Missing or malformed {0} in environment")]
    Env(&'static str),
}

/// Maximum message size (64 KiB). A datagram either fits or is rejected whole.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Environment variable carrying the child end of the command channel.
pub const COMMAND_FD_ENV: &str = "CRIB_COMMAND_FD";

/// Environment variable carrying the child end of the status channel.
pub const STATUS_FD_ENV: &str = "CRIB_STATUS_FD";

/// Environment variable carrying the serialized `target-config` subtree.
pub const TARGET_CONFIG_ENV: &str = "CRIB_TARGET_CONFIG";

/// Encode a message to JSON bytes, enforcing the size cap.
fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ChannelError> {
    let json = serde_json::to_vec(msg)?;

    if json.len() > MAX_MESSAGE_SIZE {
        return Err(ChannelError::MessageTooLarge {
            size: json.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    Ok(json)
}

/// Decode a message from a received datagram.
fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ChannelError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Create the command channel: supervisor writes, child polls.
pub fn command_channel() -> io::Result<(CommandSender, CommandReceiver)> {
    let (tx, rx) = pair()?;
    Ok((CommandSender { sock: tx }, CommandReceiver { sock: rx }))
}

/// Create the status channel: child publishes, supervisor drains.
pub fn status_channel() -> io::Result<(StatusSender, StatusReceiver)> {
    let (tx, rx) = pair()?;
    Ok((StatusSender { sock: tx }, StatusReceiver { sock: rx }))
}

fn pair() -> io::Result<(UnixDatagram, UnixDatagram)> {
    let (a, b) = UnixDatagram::pair()?;
    a.set_nonblocking(true)?;
    b.set_nonblocking(true)?;
    Ok((a, b))
}

/// Producer end of the command channel. Held by the HTTP handlers only.
#[derive(Debug)]
pub struct CommandSender {
    sock: UnixDatagram,
}

impl CommandSender {
    /// Enqueue one command record.
    pub fn send(&self, msg: &CommandMsg) -> Result<(), ChannelError> {
        let bytes = encode(msg)?;
        self.sock.send(&bytes)?;
        Ok(())
    }
}

impl AsRawFd for CommandSender {
    fn as_raw_fd(&self) -> RawFd {
        self.sock.as_raw_fd()
    }
}

impl AsFd for CommandSender {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.sock.as_fd()
    }
}

/// Consumer end of the command channel. Held by the child only.
#[derive(Debug)]
pub struct CommandReceiver {
    sock: UnixDatagram,
}

impl CommandReceiver {
    /// Non-blocking poll: at most one pending record, or nothing.
    pub fn poll(&self) -> Result<Option<CommandMsg>, ChannelError> {
        match recv_one(&self.sock)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Attach to a channel fd inherited across exec.
    pub fn from_env() -> Result<Self, ChannelError> {
        Ok(Self {
            sock: socket_from_env(COMMAND_FD_ENV)?,
        })
    }
}

impl AsRawFd for CommandReceiver {
    fn as_raw_fd(&self) -> RawFd {
        self.sock.as_raw_fd()
    }
}

impl AsFd for CommandReceiver {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.sock.as_fd()
    }
}

/// Producer end of the status channel. Held by the child only.
#[derive(Debug)]
pub struct StatusSender {
    sock: UnixDatagram,
}

impl StatusSender {
    /// Best-effort publish. A full socket buffer drops the update; the
    /// supervisor only ever keeps the newest value anyway.
    pub fn publish(&self, status: &Value) -> Result<(), ChannelError> {
        let bytes = encode(status)?;
        match self.sock.send(&bytes) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Attach to a channel fd inherited across exec.
    pub fn from_env() -> Result<Self, ChannelError> {
        Ok(Self {
            sock: socket_from_env(STATUS_FD_ENV)?,
        })
    }
}

impl AsRawFd for StatusSender {
    fn as_raw_fd(&self) -> RawFd {
        self.sock.as_raw_fd()
    }
}

impl AsFd for StatusSender {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.sock.as_fd()
    }
}

/// Consumer end of the status channel. Held by the supervisor only.
#[derive(Debug)]
pub struct StatusReceiver {
    sock: UnixDatagram,
}

impl StatusReceiver {
    /// Drain everything pending and return the newest value, if any.
    pub fn drain(&self) -> Result<Option<Value>, ChannelError> {
        let mut latest = None;
        while let Some(bytes) = recv_one(&self.sock)? {
            latest = Some(decode(&bytes)?);
        }
        Ok(latest)
    }
}

impl AsRawFd for StatusReceiver {
    fn as_raw_fd(&self) -> RawFd {
        self.sock.as_raw_fd()
    }
}

impl AsFd for StatusReceiver {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.sock.as_fd()
    }
}

fn recv_one(sock: &UnixDatagram) -> Result<Option<Vec<u8>>, ChannelError> {
    let mut buf = vec![0u8; MAX_MESSAGE_SIZE];
    match sock.recv(&mut buf) {
        Ok(n) => {
            buf.truncate(n);
            Ok(Some(buf))
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Rebuild a datagram socket from an fd number published in the environment.
///
/// The fd was inherited across exec with CLOEXEC cleared by the spawning
/// side; ownership transfers to the returned socket.
fn socket_from_env(var: &'static str) -> Result<UnixDatagram, ChannelError> {
    let fd: RawFd = std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .ok_or(ChannelError::Env(var))?;

    // Taking ownership of an inherited raw fd is the one place the type
    // system cannot vouch for us.
    #[allow(unsafe_code)]
    let sock = unsafe { UnixDatagram::from_raw_fd(fd) };
    sock.set_nonblocking(true)?;
    Ok(sock)
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
