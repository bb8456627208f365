// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The entry-point selection rule.

use crate::scanner::{EntryKind, EntryPoint};
use crate::ScanError;

/// Pick the entry point to run.
///
/// 1. A requested name that matches wins.
/// 2. Otherwise `fn main` wins when present.
/// 3. Otherwise a single candidate wins by default.
/// 4. Anything else is ambiguous.
///
/// Top-level invocations are never selectable — they name identifiers, not
/// callable definitions.
pub fn select<'a>(
    entry_points: &'a [EntryPoint],
    requested: Option<&str>,
) -> Result<&'a EntryPoint, ScanError> {
    if let Some(name) = requested {
        return entry_points
            .iter()
            .find(|ep| ep.kind.selectable() && ep.name == name)
            .ok_or_else(|| ScanError::NotFound {
                name: name.to_string(),
            });
    }

    if let Some(main) = entry_points.iter().find(|ep| ep.kind == EntryKind::Main) {
        return Ok(main);
    }

    let selectable: Vec<&EntryPoint> = entry_points
        .iter()
        .filter(|ep| ep.kind.selectable())
        .collect();
    match selectable.as_slice() {
        [only] => Ok(only),
        other => Err(ScanError::Ambiguous { count: other.len() }),
    }
}

#[cfg(test)]
#[path = "select_tests.rs"]
mod tests;
