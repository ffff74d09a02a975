// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! `stream-replay play`: timed replay of a dump to stdout.

use anyhow::{Context, Result, bail};
use clap::Args;
use sr_extract::ExtractedContent;
use sr_player::{Playback, PlaybackSnapshot, PlaybackStatus, PlayerConfig, ReplayPlayer};
use std::fs;
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Dump file (one JSON record per line)
    #[arg(value_name = "DUMP")]
    pub dump: PathBuf,

    /// Speed multiplier, clamped to the configured range
    #[arg(long, value_name = "X")]
    pub speed: Option<f64>,

    /// Print the extracted reasoning and chart as JSON to stderr at the end
    #[arg(long)]
    pub summary: bool,

    /// Write the chart spec found in the final text to this file
    #[arg(long, value_name = "PATH")]
    pub chart_out: Option<PathBuf>,

    /// Skip pacing and print the final text at once
    #[arg(long, conflicts_with = "speed")]
    pub fast: bool,
}

impl PlayArgs {
    pub async fn run(self, config_path: Option<&Path>) -> Result<()> {
        let config = PlayerConfig::load(config_path).context("Failed to load player config")?;
        let events = sr_dump::load_file(&self.dump)
            .with_context(|| format!("Failed to load dump {}", self.dump.display()))?;

        let snapshot = if self.fast {
            let mut playback = Playback::new(events, config);
            playback.fast_forward();
            let snapshot = playback.snapshot();
            let mut stdout = io::stdout().lock();
            stdout.write_all(snapshot.text.as_bytes())?;
            stdout.flush()?;
            snapshot
        } else {
            let player = ReplayPlayer::new(events, config);
            if let Some(requested) = self.speed {
                let applied = player.set_speed_multiplier(requested);
                if applied != requested {
                    warn!(requested, applied, "Speed multiplier clamped");
                }
            }
            player.play();
            stream_to(&player, io::stdout(), interrupted()).await?
        };

        self.finish(&snapshot)
    }

    fn finish(&self, snapshot: &PlaybackSnapshot) -> Result<()> {
        if !snapshot.text.is_empty() && !snapshot.text.ends_with('\n') {
            println!();
        }

        if self.summary || self.chart_out.is_some() {
            let content = sr_extract::extract(&snapshot.text);
            if self.summary {
                eprintln!("{}", serde_json::to_string_pretty(&content)?);
            }
            if let Some(path) = &self.chart_out {
                write_chart(&content, path)?;
            }
        }

        match snapshot.status {
            PlaybackStatus::Error => bail!(
                "Stream ended with an error: {}",
                snapshot.last_error.as_deref().unwrap_or("unknown error")
            ),
            PlaybackStatus::Idle => {
                info!(
                    cursor = snapshot.cursor,
                    total = snapshot.total_events,
                    "Replay stopped before the end"
                );
                Ok(())
            }
            PlaybackStatus::Done | PlaybackStatus::Streaming => Ok(()),
        }
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Copy newly appended text to `out` until the player settles.
///
/// When `interrupt` resolves first the player is stopped and whatever text
/// had been appended by then is the final output.
pub async fn stream_to<W: Write>(
    player: &ReplayPlayer,
    mut out: W,
    interrupt: impl Future<Output = ()>,
) -> Result<PlaybackSnapshot> {
    let mut updates = player.subscribe();
    let mut written = 0;
    tokio::pin!(interrupt);

    loop {
        let snapshot = updates.borrow_and_update().clone();
        if let Some(fresh) = snapshot.text.get(written..).filter(|fresh| !fresh.is_empty()) {
            out.write_all(fresh.as_bytes())?;
            out.flush()?;
        }
        written = snapshot.text.len();

        if snapshot.status != PlaybackStatus::Streaming {
            return Ok(snapshot);
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(player.snapshot());
                }
            }
            () = &mut interrupt => {
                info!("Interrupted, stopping replay");
                player.stop();
            }
        }
    }
}

/// Write the chart spec of `content` as pretty JSON. Without a chart nothing is written.
pub fn write_chart(content: &ExtractedContent, path: &Path) -> Result<bool> {
    let Some(chart) = &content.chart else {
        warn!(path = %path.display(), "No chart spec in replayed text; nothing written");
        return Ok(false);
    };
    let json = serde_json::to_string_pretty(&chart.spec)?;
    fs::write(path, json).with_context(|| format!("Failed to write chart to {}", path.display()))?;
    info!(path = %path.display(), provenance = %chart.provenance, "Wrote chart spec");
    Ok(true)
}
