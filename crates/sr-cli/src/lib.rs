// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use clap::Subcommand;
use sr_logging::CliLoggingArgs;
use std::path::PathBuf;

pub use clap::Parser;

pub mod extract;
pub mod inspect;
pub mod play;

#[derive(clap::Parser, Debug)]
#[command(
    name = "stream-replay",
    about = "Replay recorded LLM response streams",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Player configuration file (TOML)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub logging: CliLoggingArgs,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a dump with its original pacing, writing text to stdout
    Play(play::PlayArgs),
    /// Print statistics about a dump
    Inspect(inspect::InspectArgs),
    /// Split reasoning and chart spec out of a response text
    Extract(extract::ExtractArgs),
}
