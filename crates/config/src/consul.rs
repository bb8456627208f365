// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin client for the consul KV HTTP API.
//!
//! Resolution happens before the harness (and its runtime) exist, so the
//! blocking reqwest client is the right tool. `?raw` returns the stored
//! bytes directly, sidestepping the base64 envelope of the default listing
//! form.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::ConfigError;

/// The three sibling keys a service prefix must hold.
const FRAGMENT_KEYS: [&str; 3] = ["harness", "target-config", "logging"];

/// Client for a consul KV endpoint.
#[derive(Debug)]
pub struct ConsulKv {
    endpoint: String,
    client: Client,
}

impl ConsulKv {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            endpoint: format!("{host}:{port}"),
            client: Client::new(),
        }
    }

    /// Fetch a single value. `None` when the key does not exist.
    pub fn get_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let url = format!("http://{}/v1/kv/{}?raw", self.endpoint, key);

        let fetch_err = |reason: String| ConfigError::Fetch {
            key: key.to_string(),
            endpoint: self.endpoint.clone(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| fetch_err(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.text().map_err(|e| fetch_err(e.to_string()))?;
                Ok(Some(body))
            }
            status => Err(fetch_err(format!("unexpected status {status}"))),
        }
    }

    /// Fetch a value that must exist and must parse as JSON.
    pub fn get_json(&self, key: &str) -> Result<Value, ConfigError> {
        let raw = self
            .get_value(key)?
            .ok_or_else(|| ConfigError::MissingFragment {
                key: key.to_string(),
            })?;

        serde_json::from_str(&raw).map_err(|source| ConfigError::FragmentInvalid {
            key: key.to_string(),
            source,
        })
    }
}

/// Replace a descriptor config with the union of its three store fragments.
pub(crate) fn load_from_descriptor(config: &Value) -> Result<Value, ConfigError> {
    let (host, port, prefix) = parse_descriptor(config)?;
    let kv = ConsulKv::new(host, port);

    let mut resolved = serde_json::Map::new();
    for fragment in FRAGMENT_KEYS {
        let key = format!("{prefix}/{fragment}");
        resolved.insert(fragment.to_string(), kv.get_json(&key)?);
    }

    tracing::info!(endpoint = %format!("{host}:{port}"), prefix, "config loaded from consul");
    Ok(Value::Object(resolved))
}

fn parse_descriptor(config: &Value) -> Result<(&str, u16, &str), ConfigError> {
    let descriptor = config
        .get("consul")
        .ok_or_else(|| ConfigError::BadDescriptor("missing 'consul' key".to_string()))?;

    let host = descriptor
        .get("host")
        .and_then(Value::as_str)
        .ok_or_else(|| ConfigError::BadDescriptor("'host' must be a string".to_string()))?;

    let port = descriptor
        .get("port")
        .and_then(Value::as_u64)
        .and_then(|p| u16::try_from(p).ok())
        .ok_or_else(|| ConfigError::BadDescriptor("'port' must be a valid port number".to_string()))?;

    let prefix = descriptor
        .get("service-config")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ConfigError::BadDescriptor("'service-config' must be a string".to_string())
        })?;

    Ok((host, port, prefix))
}

#[cfg(test)]
#[path = "consul_tests.rs"]
mod tests;
