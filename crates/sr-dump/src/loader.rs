// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::{DumpError, ParseReport, Result, StreamEvent, parse_with_report};
use std::fs;
use std::path::Path;
use tracing::info;

/// Parse dump text, treating an empty result as a load failure.
pub fn load_str(raw: &str) -> Result<Vec<StreamEvent>> {
    Ok(load_report_str(raw)?.events)
}

/// Like [`load_str`], keeping the full parse report.
pub fn load_report_str(raw: &str) -> Result<ParseReport> {
    let report = parse_with_report(raw);
    if report.events.is_empty() {
        return Err(DumpError::NoEvents);
    }
    Ok(report)
}

/// Read and parse a dump file.
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<StreamEvent>> {
    Ok(load_report_file(path)?.events)
}

/// Read and parse a dump file, keeping the full parse report.
pub fn load_report_file(path: impl AsRef<Path>) -> Result<ParseReport> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let report = load_report_str(&contents)?;
    info!(
        path = %path.display(),
        events = report.events.len(),
        skipped = report.skipped_lines.len(),
        "Loaded stream dump"
    );
    Ok(report)
}
