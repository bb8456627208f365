// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Normalization of the four accepted config shapes into one resolved tree.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::consul;
use crate::error::ConfigError;
use crate::resolved::ResolvedConfig;

/// Where a configuration value comes from.
///
/// A bare string is deliberately ambiguous: it is treated as a file path
/// when something exists at that path, and parsed as a JSON literal
/// otherwise.
#[derive(Debug, Clone, Default)]
pub enum ConfigSource {
    /// No config supplied; resolve to defaults.
    #[default]
    None,
    /// An already-parsed JSON object.
    Inline(Value),
    /// A path to a file holding a JSON object.
    File(PathBuf),
    /// A string holding either a path or a serialized JSON object.
    Text(String),
}

impl From<Value> for ConfigSource {
    fn from(value: Value) -> Self {
        ConfigSource::Inline(value)
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        ConfigSource::File(path)
    }
}

impl From<&Path> for ConfigSource {
    fn from(path: &Path) -> Self {
        ConfigSource::File(path.to_path_buf())
    }
}

impl From<&str> for ConfigSource {
    fn from(text: &str) -> Self {
        ConfigSource::Text(text.to_string())
    }
}

impl From<String> for ConfigSource {
    fn from(text: String) -> Self {
        ConfigSource::Text(text)
    }
}

impl ConfigSource {
    /// Resolve into a validated configuration.
    ///
    /// When the normalized object carries a `consul` key, the object is a
    /// pointer: the real config is the union of the three fragments fetched
    /// from the store under its `service-config` prefix.
    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        let value = self.into_value()?;

        let value = if value.get("consul").is_some() {
            consul::load_from_descriptor(&value)?
        } else {
            value
        };

        ResolvedConfig::new(value)
    }

    fn into_value(self) -> Result<Value, ConfigError> {
        match self {
            ConfigSource::None => {
                tracing::warn!("no config supplied, using defaults; not suitable for production");
                Ok(Value::Object(serde_json::Map::new()))
            }
            ConfigSource::Inline(value) => Ok(value),
            ConfigSource::File(path) => read_config_file(&path),
            ConfigSource::Text(text) => {
                let path = Path::new(&text);
                if path.exists() {
                    read_config_file(path)
                } else {
                    serde_json::from_str(&text).map_err(|source| ConfigError::TextInvalid {
                        text,
                        source,
                    })
                }
            }
        }
    }
}

fn read_config_file(path: &Path) -> Result<Value, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| ConfigError::FileInvalid {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
