// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use clap::Args;
use sr_dump::{DumpStats, parse_with_report};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Dump file (one JSON record per line)
    #[arg(value_name = "DUMP")]
    pub dump: PathBuf,
}

impl InspectArgs {
    pub fn run(self) -> Result<()> {
        let stats = self.stats()?;
        println!("{}", serde_json::to_string_pretty(&stats)?);
        Ok(())
    }

    /// A dump with nothing replayable still gets stats, so corrupt files can be diagnosed.
    pub fn stats(&self) -> Result<DumpStats> {
        let raw = fs::read_to_string(&self.dump)
            .with_context(|| format!("Failed to read dump {}", self.dump.display()))?;
        Ok(DumpStats::from_report(&parse_with_report(&raw)))
    }
}
