// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The resolved configuration tree and its accessors.
//!
//! The tree is immutable once constructed. Only two rules are enforced
//! structurally: `harness.interface` must be a dotted IPv4 literal and
//! `harness.port` an integer >= 1024. Every other section is optional and
//! opaque until a consumer asks for it.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Interface the control server binds when none is configured.
pub const DEFAULT_INTERFACE: Ipv4Addr = Ipv4Addr::UNSPECIFIED;

/// Port the control server binds when none is configured.
pub const DEFAULT_PORT: u16 = 2222;

/// Lowest port the harness will accept; everything below is privileged.
pub const MIN_PORT: u16 = 1024;

/// A validated, immutable configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    root: Value,
}

impl ResolvedConfig {
    /// Validate and wrap a resolved tree.
    pub fn new(root: Value) -> Result<Self, ConfigError> {
        validate(&root)?;
        Ok(Self { root })
    }

    /// Interface to bind the control server to.
    pub fn interface(&self) -> Ipv4Addr {
        self.root
            .pointer("/harness/interface")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_INTERFACE)
    }

    /// Port to bind the control server on.
    pub fn port(&self) -> u16 {
        self.root
            .pointer("/harness/port")
            .and_then(Value::as_u64)
            .and_then(|p| u16::try_from(p).ok())
            .unwrap_or(DEFAULT_PORT)
    }

    /// The opaque subtree handed to the child, and nothing else.
    pub fn target_config(&self) -> Value {
        self.root
            .get("target-config")
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
    }

    /// The opaque logging fragment, if present.
    pub fn logging(&self) -> Option<&Value> {
        self.root.get("logging")
    }

    /// The `source` section, required by the repo launcher.
    pub fn source(&self) -> Result<SourceSpec, ConfigError> {
        let section = self.root.get("source").ok_or(ConfigError::MissingSource)?;
        serde_json::from_value(section.clone()).map_err(ConfigError::BadSource)
    }

    /// The isolated runtime named by the env-switching launcher, if any.
    ///
    /// An `env` section without a `name` string is an error; a missing
    /// section means "stay in the current environment".
    pub fn env_name(&self) -> Result<Option<&str>, ConfigError> {
        match self.root.get("env") {
            None => Ok(None),
            Some(env) => env
                .get("name")
                .and_then(Value::as_str)
                .map(Some)
                .ok_or(ConfigError::MissingEnvName),
        }
    }

    /// The tree with the harness-owned sections removed.
    pub fn stripped(&self) -> Value {
        let mut stripped = self.root.clone();
        if let Some(map) = stripped.as_object_mut() {
            map.remove("harness");
            map.remove("logging");
        }
        stripped
    }

    /// The full resolved tree, for re-serialization by the env switcher.
    pub fn root(&self) -> &Value {
        &self.root
    }
}

/// The `source` descriptor consumed by the repo launcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceSpec {
    pub repo: String,
    pub branch: String,
    pub workdir: PathBuf,
    #[serde(default)]
    pub src_subfolder: Option<String>,
    pub file_to_run: String,
    #[serde(default)]
    pub entry_point: Option<String>,
    #[serde(default)]
    pub use_local: bool,
}

fn validate(root: &Value) -> Result<(), ConfigError> {
    if !root.is_object() {
        return Err(ConfigError::NotAnObject(root.to_string()));
    }

    let Some(harness) = root.get("harness") else {
        return Ok(());
    };

    if let Some(iface) = harness.get("interface") {
        let ok = iface
            .as_str()
            .is_some_and(|s| s.parse::<Ipv4Addr>().is_ok());
        if !ok {
            return Err(ConfigError::BadInterface(iface.to_string()));
        }
    }

    if let Some(port) = harness.get("port") {
        let ok = port
            .as_u64()
            .and_then(|p| u16::try_from(p).ok())
            .is_some_and(|p| p >= MIN_PORT);
        if !ok {
            return Err(ConfigError::BadPort(port.to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "resolved_tests.rs"]
mod tests;
