// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Replay scheduler for recorded stream dumps.
//!
//! [`Playback`] is the synchronous state machine (`idle`, `streaming`, `done`,
//! `error`) that consumes one event per step. [`ReplayPlayer`] drives it on a
//! Tokio timer, pacing deltas by the recorded gaps scaled by a clamped speed
//! multiplier.

mod config;
mod playback;
mod player;

pub use config::{ConfigError, ConfigResult, PlayerConfig};
pub use playback::{Playback, PlaybackSnapshot, PlaybackStatus, Step};
pub use player::ReplayPlayer;
