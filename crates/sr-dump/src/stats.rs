// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::event::{EventKind, StreamEvent};
use crate::parser::ParseReport;
use serde::Serialize;

/// Summary of a parsed dump, used by `inspect`-style tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DumpStats {
    pub total_lines: usize,
    pub blank_lines: usize,
    pub skipped_lines: usize,
    pub deltas: usize,
    pub dones: usize,
    pub errors: usize,
    /// Sum of delta payload lengths in bytes.
    pub delta_bytes: usize,
    /// Distance between the first and last recorded timestamps, if any were present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_span_ms: Option<u64>,
    /// Whether the dump ends with an explicit done/error marker.
    pub terminated: bool,
}

impl DumpStats {
    pub fn from_report(report: &ParseReport) -> Self {
        let mut stats = Self::from_events(&report.events);
        stats.total_lines = report.total_lines;
        stats.blank_lines = report.blank_lines;
        stats.skipped_lines = report.skipped_lines.len();
        stats
    }

    pub fn from_events(events: &[StreamEvent]) -> Self {
        let mut stats = Self::default();
        for event in events {
            match event.kind {
                EventKind::Delta => {
                    stats.deltas += 1;
                    stats.delta_bytes += event.text.len();
                }
                EventKind::Done => stats.dones += 1,
                EventKind::Error => stats.errors += 1,
            }
        }

        let mut timestamps = events.iter().filter_map(|e| e.timestamp_ms);
        if let Some(first) = timestamps.next() {
            let last = timestamps.last().unwrap_or(first);
            stats.recorded_span_ms = Some(last.saturating_sub(first));
        }

        stats.terminated = events.last().is_some_and(|e| e.kind.is_terminal());
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_with_report;
    use pretty_assertions::assert_eq;

    #[test]
    fn counts_kinds_and_span() {
        let report = parse_with_report(
            r#"{"type":"delta","text":"ab","ts":10}
oops
{"type":"delta","text":"cde","ts":40}

{"type":"done","ts":55}"#,
        );
        let stats = DumpStats::from_report(&report);
        assert_eq!(
            stats,
            DumpStats {
                total_lines: 5,
                blank_lines: 1,
                skipped_lines: 1,
                deltas: 2,
                dones: 1,
                errors: 0,
                delta_bytes: 5,
                recorded_span_ms: Some(45),
                terminated: true,
            }
        );
    }

    #[test]
    fn unterminated_dump_without_timestamps() {
        let stats = DumpStats::from_events(&[StreamEvent::delta(0, "x")]);
        assert!(!stats.terminated);
        assert_eq!(stats.recorded_span_ms, None);
    }
}
