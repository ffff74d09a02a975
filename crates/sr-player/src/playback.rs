// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::config::PlayerConfig;
use serde::Serialize;
use sr_dump::{EventKind, StreamEvent};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Playback status as seen by controls and observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Streaming,
    Done,
    Error,
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Idle => write!(f, "idle"),
            PlaybackStatus::Streaming => write!(f, "streaming"),
            PlaybackStatus::Done => write!(f, "done"),
            PlaybackStatus::Error => write!(f, "error"),
        }
    }
}

/// Read-only copy of the playback state handed to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub cursor: usize,
    pub total_events: usize,
    pub text: String,
    pub speed_multiplier: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Result of consuming one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// More events remain.
    Continue,
    /// The run ended with the given terminal status.
    Finished(PlaybackStatus),
    /// Nothing was consumed because playback is not streaming.
    Inactive,
}

/// Synchronous replay state machine.
///
/// Owns the accumulated text; the event sequence is shared read-only and is
/// only ever consumed positionally. Timing lives outside: a driver asks for
/// [`Playback::next_delay`], waits, then calls [`Playback::advance`].
#[derive(Debug, Clone)]
pub struct Playback {
    events: Arc<[StreamEvent]>,
    config: PlayerConfig,
    status: PlaybackStatus,
    cursor: usize,
    text: String,
    speed_multiplier: f64,
    last_error: Option<String>,
}

impl Playback {
    pub fn new(events: impl Into<Arc<[StreamEvent]>>, config: PlayerConfig) -> Self {
        let speed_multiplier = config
            .clamp_speed(config.initial_speed)
            .filter(|speed| *speed > 0.0)
            .unwrap_or(1.0);
        Self {
            events: events.into(),
            config,
            status: PlaybackStatus::Idle,
            cursor: 0,
            text: String::new(),
            speed_multiplier,
            last_error: None,
        }
    }

    pub fn events(&self) -> &Arc<[StreamEvent]> {
        &self.events
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            status: self.status,
            cursor: self.cursor,
            total_events: self.events.len(),
            text: self.text.clone(),
            speed_multiplier: self.speed_multiplier,
            last_error: self.last_error.clone(),
        }
    }

    /// Swap in a freshly loaded event sequence; state starts over at idle.
    pub fn replace_events(&mut self, events: impl Into<Arc<[StreamEvent]>>) {
        self.events = events.into();
        self.reset();
    }

    /// Enter `streaming`. Returns whether the transition happened.
    ///
    /// From `idle` this resumes at the cursor, so a stopped run continues where
    /// it paused. From `done`/`error` the run restarts from scratch.
    pub fn play(&mut self) -> bool {
        match self.status {
            PlaybackStatus::Streaming => return false,
            PlaybackStatus::Done | PlaybackStatus::Error => self.reset(),
            PlaybackStatus::Idle => {
                if self.cursor >= self.events.len() {
                    self.reset();
                }
            }
        }
        if self.events.is_empty() {
            debug!("Ignoring play request without events");
            return false;
        }
        debug!(cursor = self.cursor, "Playback streaming");
        self.status = PlaybackStatus::Streaming;
        true
    }

    /// Pause a streaming run. Accumulated text is kept.
    pub fn stop(&mut self) -> bool {
        if self.status != PlaybackStatus::Streaming {
            return false;
        }
        debug!(cursor = self.cursor, "Playback stopped");
        self.status = PlaybackStatus::Idle;
        true
    }

    /// Back to idle with no text and the cursor at the first event.
    pub fn reset(&mut self) {
        self.status = PlaybackStatus::Idle;
        self.cursor = 0;
        self.text.clear();
        self.last_error = None;
    }

    /// Set the multiplier, clamped to the configured range. Returns the value in effect.
    pub fn set_speed_multiplier(&mut self, requested: f64) -> f64 {
        if let Some(speed) = self.config.clamp_speed(requested) {
            self.speed_multiplier = speed;
        }
        self.speed_multiplier
    }

    /// Delay to wait before the next [`advance`](Self::advance), or `None` if not streaming.
    pub fn next_delay(&self) -> Option<Duration> {
        if self.status != PlaybackStatus::Streaming {
            return None;
        }
        let event = self.events.get(self.cursor)?;
        let recorded_gap = self
            .cursor
            .checked_sub(1)
            .and_then(|prev| self.events.get(prev))
            .and_then(|prev| Some(event.timestamp_ms?.saturating_sub(prev.timestamp_ms?)));
        Some(self.config.scaled_delay(recorded_gap, self.speed_multiplier))
    }

    /// Consume exactly one event.
    pub fn advance(&mut self) -> Step {
        if self.status != PlaybackStatus::Streaming {
            return Step::Inactive;
        }

        let Some(event) = self.events.get(self.cursor) else {
            return self.fail("playback cursor ran past the end of the event sequence".into());
        };
        self.cursor += 1;

        match event.kind {
            EventKind::Delta => {
                self.text.push_str(&event.text);
                if self.cursor == self.events.len() {
                    self.finish()
                } else {
                    Step::Continue
                }
            }
            EventKind::Done => self.finish(),
            EventKind::Error => {
                let message = if event.text.is_empty() {
                    format!("stream reported an error at line {}", event.line_number)
                } else {
                    event.text.clone()
                };
                self.fail(message)
            }
        }
    }

    /// Consume every remaining event without waiting.
    pub fn fast_forward(&mut self) -> PlaybackStatus {
        if self.status != PlaybackStatus::Streaming && !self.play() {
            return self.status;
        }
        while self.advance() == Step::Continue {}
        self.status
    }

    fn finish(&mut self) -> Step {
        debug!(cursor = self.cursor, bytes = self.text.len(), "Playback done");
        self.status = PlaybackStatus::Done;
        Step::Finished(PlaybackStatus::Done)
    }

    fn fail(&mut self, message: String) -> Step {
        warn!(cursor = self.cursor, error = %message, "Playback halted on error");
        self.last_error = Some(message);
        self.status = PlaybackStatus::Error;
        Step::Finished(PlaybackStatus::Error)
    }
}
