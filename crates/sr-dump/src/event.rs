// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use serde::{Deserialize, Serialize};

/// Category of a replayable stream event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Incremental text chunk.
    Delta,
    /// Terminal marker; the recorded stream finished normally.
    Done,
    /// The recorded stream reported a failure.
    Error,
}

impl EventKind {
    /// Whether consuming this event ends a replay run.
    pub fn is_terminal(self) -> bool {
        matches!(self, EventKind::Done | EventKind::Error)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Delta => write!(f, "delta"),
            EventKind::Done => write!(f, "done"),
            EventKind::Error => write!(f, "error"),
        }
    }
}

/// One unit of replay, immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub kind: EventKind,
    /// Delta payload, or the error message for error events. Empty for `done`.
    pub text: String,
    /// Dense ordinal among accepted events; equals the position in the parsed sequence.
    pub sequence_index: usize,
    /// 1-based physical line in the dump the event came from.
    pub line_number: usize,
    /// Recorded time hint in milliseconds. Only differences between events are meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
}

impl StreamEvent {
    pub fn delta(sequence_index: usize, text: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Delta,
            text: text.into(),
            sequence_index,
            line_number: sequence_index + 1,
            timestamp_ms: None,
        }
    }

    pub fn done(sequence_index: usize) -> Self {
        Self {
            kind: EventKind::Done,
            text: String::new(),
            sequence_index,
            line_number: sequence_index + 1,
            timestamp_ms: None,
        }
    }

    pub fn error(sequence_index: usize, message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Error,
            text: message.into(),
            sequence_index,
            line_number: sequence_index + 1,
            timestamp_ms: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    pub fn is_delta(&self) -> bool {
        self.kind == EventKind::Delta
    }
}
