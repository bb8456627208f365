// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static entry-point discovery for a target source file.
//!
//! The scanner parses a Rust source file to its AST and ranks everything
//! that could serve as an entry point — cradle implementations, `fn main`,
//! main-like functions, callable types, top-level macro invocations, plain
//! parameterless functions. It never executes or compiles the target.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod scanner;
mod select;

pub use scanner::{scan, scan_source, EntryKind, EntryPoint, FnInfo, MacroCall, ScanReport, TypeInfo};
pub use select::select;

use thiserror::Error;

/// Scanner and selection errors. All fatal to a launch.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to read source file {path}: {source}")]
    Unreadable {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Syntax error in {context}: {source}")]
    Parse {
        context: String,
        #[source]
        source: syn::Error,
    },

    #[error("Entry point not found: {name}")]
    NotFound { name: String },

    #[error("Expected exactly one entry point, got {count}")]
    Ambiguous { count: usize },
}
