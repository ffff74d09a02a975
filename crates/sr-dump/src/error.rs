// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use thiserror::Error;

/// Convenient result alias for dump operations.
pub type Result<T> = std::result::Result<T, DumpError>;

/// Errors surfaced when loading a dump.
///
/// Individual malformed lines are never reported here; they are dropped by
/// the parser.
#[derive(Debug, Error)]
pub enum DumpError {
    /// Underlying IO error while reading the dump file.
    #[error("Dump IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The dump contained no line that mapped to a stream event.
    #[error("No valid events found in dump")]
    NoEvents,
}
