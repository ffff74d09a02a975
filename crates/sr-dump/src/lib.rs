// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Recorded stream dumps: the event model and a tolerant JSONL parser.
//!
//! A dump holds one JSON record per line. Lines that are blank, malformed or
//! unrecognised are dropped, so a partially corrupted recording still replays
//! its valid subset in the original order.

mod error;
mod event;
mod loader;
mod parser;
mod stats;

pub use error::{DumpError, Result};
pub use event::{EventKind, StreamEvent};
pub use loader::{load_file, load_report_file, load_report_str, load_str};
pub use parser::{ParseReport, parse, parse_with_report};
pub use stats::DumpStats;
