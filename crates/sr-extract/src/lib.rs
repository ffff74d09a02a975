// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Incremental content extraction over a growing LLM output buffer.
//!
//! [`extract`] is a pure function of the text snapshot: it is recomputed on
//! every tick instead of being updated incrementally, and it never fails.
//! Truncated input (mid-tag, mid-fence, mid-JSON) simply yields less until
//! more text arrives.

pub mod chart;
pub mod fence;
pub mod reasoning;

pub use chart::{ChartSpec, DataProvenance, VEGA_LITE_SCHEMA, extract_chart, prepare_chart};
pub use reasoning::{REASONING_TAGS, ReasoningBlock, ReasoningTag, find_reasoning_block};

use serde::Serialize;
use serde_json::Value;

/// Derived view of a text snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedContent {
    pub has_thought: bool,
    /// Reasoning content, trimmed. Empty when there is no block.
    pub thought_text: String,
    /// False both for an open block and when there is no block at all.
    pub thought_closed: bool,
    /// Text outside the reasoning block. Empty while the block is open.
    pub main_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSpec>,
}

impl ExtractedContent {
    /// Reasoning block exists and has not closed yet.
    pub fn is_thinking(&self) -> bool {
        self.has_thought && !self.thought_closed
    }

    pub fn chart_spec(&self) -> Option<&Value> {
        self.chart.as_ref().map(|chart| &chart.spec)
    }

    pub fn data_provenance(&self) -> Option<DataProvenance> {
        self.chart.as_ref().map(|chart| chart.provenance)
    }
}

/// Split a snapshot into reasoning and answer text and pick out a chart spec.
pub fn extract(text: &str) -> ExtractedContent {
    let (has_thought, thought_text, thought_closed, main_text) = match find_reasoning_block(text) {
        Some(block) => {
            let mut main = String::with_capacity(text.len() - block.span.len());
            main.push_str(&text[..block.span.start]);
            main.push_str(&text[block.span.end..]);
            (true, block.content.trim().to_string(), block.closed, main)
        }
        None => (false, String::new(), false, text.to_string()),
    };

    let chart = extract_chart(&main_text);

    ExtractedContent {
        has_thought,
        thought_text,
        thought_closed,
        main_text,
        chart,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn open_reasoning_hides_main_text() {
        let out = extract("<think>abc");
        assert!(out.has_thought);
        assert!(!out.thought_closed);
        assert!(out.is_thinking());
        assert_eq!(out.thought_text, "abc");
        assert_eq!(out.main_text, "");
    }

    #[test]
    fn closed_reasoning_splits_text() {
        let out = extract("<think>abc</think>XYZ");
        assert!(out.has_thought);
        assert!(out.thought_closed);
        assert_eq!(out.thought_text, "abc");
        assert_eq!(out.main_text, "XYZ");
    }

    #[test]
    fn text_before_the_block_stays_in_main() {
        let out = extract("Intro <thinking>\n  plan  \n</thinking> outro");
        assert_eq!(out.thought_text, "plan");
        assert_eq!(out.main_text, "Intro  outro");
    }

    #[test]
    fn no_block_passes_text_through() {
        let out = extract("just an answer");
        assert_eq!(
            out,
            ExtractedContent {
                main_text: "just an answer".into(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn chart_inside_reasoning_is_ignored() {
        let out = extract("<think>```json\n{\"mark\":\"bar\",\"encoding\":{}}\n```\n</think>done");
        assert!(out.chart.is_none());
        assert_eq!(out.main_text, "done");
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "<think>x</think>```json\n{\"mark\":\"bar\",\"encoding\":{}}\n```";
        assert_eq!(extract(text), extract(text));
    }
}
