// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Fenced code block scanning over a possibly truncated markdown snapshot.

const FENCE: &str = "```";

/// A fenced block found in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// Info string after the opening fence, trimmed (may be empty).
    pub info: &'a str,
    pub body: &'a str,
    /// False when the text ended before the closing fence arrived.
    pub terminated: bool,
}

impl<'a> FencedBlock<'a> {
    /// Body with any half-received closing fence and trailing whitespace removed.
    pub fn settled_body(&self) -> &'a str {
        if self.terminated {
            return self.body.trim();
        }
        self.body.trim_end().trim_end_matches('`').trim()
    }
}

/// Collect fenced blocks in document order.
///
/// An opening fence only counts once its line is complete, because the info
/// string may still be streaming in. A block with no closing fence runs to
/// end-of-text.
pub fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut open: Option<(&str, usize)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix(FENCE) else {
            continue;
        };

        match open {
            None => {
                if line.ends_with('\n') {
                    open = Some((rest.trim_start_matches('`').trim(), offset));
                }
            }
            Some((info, body_start)) => {
                // Only a bare fence closes; "```lang" inside a block is content.
                if rest.trim_start_matches('`').trim().is_empty() {
                    blocks.push(FencedBlock {
                        info,
                        body: &text[body_start..line_start],
                        terminated: true,
                    });
                    open = None;
                }
            }
        }
    }

    if let Some((info, body_start)) = open {
        blocks.push(FencedBlock {
            info,
            body: &text[body_start..],
            terminated: false,
        });
    }

    blocks
}
