// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::event::{EventKind, StreamEvent};
use serde_json::{Map, Value};
use tracing::debug;

/// Sentinel some providers emit instead of a JSON terminal record.
const DONE_SENTINEL: &str = "[DONE]";
const SSE_DATA_PREFIX: &str = "data:";

const KIND_KEYS: &[&str] = &["type", "event", "kind"];
const TEXT_KEYS: &[&str] = &["text", "delta", "content"];
const ERROR_KEYS: &[&str] = &["message", "error"];
const TIMESTAMP_KEYS: &[&str] = &["ts", "timestamp_ms", "t"];

/// Outcome of parsing a dump, including the lines that were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub events: Vec<StreamEvent>,
    /// 1-based line numbers of non-blank lines that did not map to an event.
    pub skipped_lines: Vec<usize>,
    pub blank_lines: usize,
    pub total_lines: usize,
}

/// Parse raw dump text into an ordered event sequence.
///
/// Malformed or unrecognised lines are skipped. An empty result is a normal
/// outcome; callers decide whether that is a load failure.
pub fn parse(raw: &str) -> Vec<StreamEvent> {
    parse_with_report(raw).events
}

/// Same as [`parse`], keeping track of which lines were skipped.
pub fn parse_with_report(raw: &str) -> ParseReport {
    let mut report = ParseReport::default();

    for (index, line) in raw.lines().enumerate() {
        let line_number = index + 1;
        report.total_lines = line_number;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            report.blank_lines += 1;
            continue;
        }

        match parse_line(trimmed) {
            Some(record) => {
                let sequence_index = report.events.len();
                report.events.push(StreamEvent {
                    kind: record.kind,
                    text: record.text,
                    sequence_index,
                    line_number,
                    timestamp_ms: record.timestamp_ms,
                });
            }
            None => {
                debug!(line = line_number, "Skipping unparseable dump line");
                report.skipped_lines.push(line_number);
            }
        }
    }

    report
}

struct Record {
    kind: EventKind,
    text: String,
    timestamp_ms: Option<u64>,
}

impl Record {
    fn new(kind: EventKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            timestamp_ms: None,
        }
    }
}

fn parse_line(line: &str) -> Option<Record> {
    let payload = line.strip_prefix(SSE_DATA_PREFIX).map(str::trim_start).unwrap_or(line);
    if payload == DONE_SENTINEL {
        return Some(Record::new(EventKind::Done, ""));
    }

    let value: Value = serde_json::from_str(payload).ok()?;
    let object = value.as_object()?;

    let mut record = if let Some(choices) = object.get("choices").and_then(Value::as_array) {
        record_from_completion_chunk(choices)?
    } else {
        record_from_tagged(object)?
    };
    record.timestamp_ms = first_value(object, TIMESTAMP_KEYS).and_then(value_to_u64);
    Some(record)
}

/// `{"type": "delta", "text": "..."}` and friends, including Anthropic-style
/// `content_block_delta` / `message_stop` records.
fn record_from_tagged(object: &Map<String, Value>) -> Option<Record> {
    let tag = first_str(object, KIND_KEYS)?;

    let kind = match tag.to_ascii_lowercase().as_str() {
        "delta" | "text" | "chunk" | "token" | "content_block_delta" => EventKind::Delta,
        "done" | "end" | "finish" | "message_stop" | "[done]" => EventKind::Done,
        "error" => EventKind::Error,
        _ => return None,
    };

    let text = match kind {
        EventKind::Delta => delta_text(object).unwrap_or_default(),
        EventKind::Error => error_message(object).unwrap_or_default(),
        EventKind::Done => String::new(),
    };

    Some(Record::new(kind, text))
}

fn delta_text(object: &Map<String, Value>) -> Option<String> {
    for key in TEXT_KEYS {
        match object.get(*key) {
            Some(Value::String(text)) => return Some(text.clone()),
            // content_block_delta nests the text one level down
            Some(Value::Object(inner)) => {
                if let Some(text) = first_str(inner, &["text"]) {
                    return Some(text.to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn error_message(object: &Map<String, Value>) -> Option<String> {
    match first_value(object, ERROR_KEYS)? {
        Value::String(message) => Some(message.clone()),
        Value::Object(inner) => first_str(inner, &["message"]).map(str::to_string),
        other => Some(other.to_string()),
    }
}

/// Chat-completion chunk: content becomes a delta, a bare finish reason a terminal marker.
fn record_from_completion_chunk(choices: &[Value]) -> Option<Record> {
    let choice = choices.first()?.as_object()?;
    let content = choice
        .get("delta")
        .and_then(Value::as_object)
        .and_then(|delta| delta.get("content"))
        .and_then(Value::as_str);
    let finished = choice.get("finish_reason").is_some_and(|reason| !reason.is_null());

    match content {
        Some(text) => Some(Record::new(EventKind::Delta, text)),
        None if finished => Some(Record::new(EventKind::Done, "")),
        None => Some(Record::new(EventKind::Delta, "")),
    }
}

fn first_value<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

fn first_str<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| object.get(*key).and_then(Value::as_str))
}

fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(num) => num
            .as_u64()
            .or_else(|| num.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
