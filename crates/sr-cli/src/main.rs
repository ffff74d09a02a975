// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use sr_cli::{Cli, Commands, Parser};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.logging.init("stream-replay")?;

    match cli.command {
        Commands::Play(args) => args.run(cli.config.as_deref()).await,
        Commands::Inspect(args) => args.run(),
        Commands::Extract(args) => args.run(),
    }
}
