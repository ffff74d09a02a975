// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Reasoning block scan.
//!
//! Two phases: locate the earliest opening tag, then look for the matching
//! closing tag after it. A missing closing tag is the normal state while the
//! model is still thinking, so it is reported as an open block instead of a
//! non-match.

use std::ops::Range;

/// Literal open/close delimiter pair for a reasoning block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReasoningTag {
    pub open: &'static str,
    pub close: &'static str,
}

/// Accepted spellings, in no particular priority; the earliest match in the text wins.
pub const REASONING_TAGS: &[ReasoningTag] = &[
    ReasoningTag {
        open: "<think>",
        close: "</think>",
    },
    ReasoningTag {
        open: "<thinking>",
        close: "</thinking>",
    },
];

/// Reasoning block located in a text snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningBlock<'a> {
    /// Content between the tags, untrimmed.
    pub content: &'a str,
    pub closed: bool,
    /// Byte span covering the opening tag through the closing tag, or through
    /// end-of-text when the block is still open.
    pub span: Range<usize>,
}

/// Find the first reasoning block in `text`.
pub fn find_reasoning_block(text: &str) -> Option<ReasoningBlock<'_>> {
    let (open_at, tag) = REASONING_TAGS
        .iter()
        .filter_map(|tag| text.find(tag.open).map(|pos| (pos, tag)))
        .min_by_key(|(pos, _)| *pos)?;

    let body_start = open_at + tag.open.len();
    let body = &text[body_start..];

    match body.find(tag.close) {
        Some(rel_close) => Some(ReasoningBlock {
            content: &body[..rel_close],
            closed: true,
            span: open_at..body_start + rel_close + tag.close.len(),
        }),
        None => Some(ReasoningBlock {
            content: strip_partial_suffix(body, tag.close),
            closed: false,
            span: open_at..text.len(),
        }),
    }
}

/// Drop a trailing proper prefix of `delimiter` (e.g. `"</thi"`) that is still arriving.
fn strip_partial_suffix<'a>(body: &'a str, delimiter: &str) -> &'a str {
    for len in (1..delimiter.len()).rev() {
        let prefix = &delimiter[..len];
        if let Some(stripped) = body.strip_suffix(prefix) {
            return stripped;
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn closed_block_span_covers_both_tags() {
        let text = "pre<think>abc</think>post";
        let block = find_reasoning_block(text).unwrap();
        assert_eq!(block.content, "abc");
        assert!(block.closed);
        assert_eq!(&text[block.span.clone()], "<think>abc</think>");
    }

    #[test]
    fn open_block_runs_to_end_of_text() {
        let text = "<thinking>still going";
        let block = find_reasoning_block(text).unwrap();
        assert_eq!(block.content, "still going");
        assert!(!block.closed);
        assert_eq!(block.span, 0..text.len());
    }

    #[test]
    fn closing_tag_must_match_opening_spelling() {
        let block = find_reasoning_block("<thinking>a</think>b").unwrap();
        assert!(!block.closed);
        assert_eq!(block.content, "a</think>b");
    }

    #[test]
    fn earliest_opening_tag_wins() {
        let block = find_reasoning_block("x<thinking>one</thinking><think>two</think>").unwrap();
        assert_eq!(block.content, "one");
    }

    #[test]
    fn partial_closing_tag_is_held_back() {
        let block = find_reasoning_block("<think>abc</thi").unwrap();
        assert!(!block.closed);
        assert_eq!(block.content, "abc");

        let block = find_reasoning_block("<think>a<").unwrap();
        assert_eq!(block.content, "a");

        let block = find_reasoning_block("<think>a<b").unwrap();
        assert_eq!(block.content, "a<b");
    }

    #[test]
    fn no_tag_is_none() {
        assert_eq!(find_reasoning_block("plain answer <thin"), None);
    }
}
