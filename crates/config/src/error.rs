// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors. All of these are fatal to a launch and are raised
/// before any process is spawned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file does not exist: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file {path} exists but does not contain valid JSON: {source}")]
    FileInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "Config string is neither an existing file path nor a parsable JSON object: {text}: {source}"
    )]
    TextInvalid {
        text: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config must resolve to a JSON object, got: {0}")]
    NotAnObject(String),

    #[error("Malformed consul descriptor: {0}")]
    BadDescriptor(String),

    #[error("Failed to fetch {key} from consul at {endpoint}: {reason}")]
    Fetch {
        key: String,
        endpoint: String,
        reason: String,
    },

    #[error("Config fragment missing from store: {key}")]
    MissingFragment { key: String },

    #[error("Config fragment {key} is not valid JSON: {source}")]
    FragmentInvalid {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("harness.interface is not a dotted IPv4 literal: {0}")]
    BadInterface(String),

    #[error("harness.port must be an integer >= 1024, got: {0}")]
    BadPort(String),

    #[error("Expecting 'source' section in config")]
    MissingSource,

    #[error("Malformed 'source' section: {0}")]
    BadSource(#[source] serde_json::Error),

    #[error("Expecting environment name key (env.name) in config")]
    MissingEnvName,
}
