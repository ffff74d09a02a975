// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use clap::Args;
use sr_extract::ExtractedContent;
use std::io::Read;
use std::path::PathBuf;
use std::{fs, io};

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Response text to analyse; reads stdin when omitted or `-`
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Print the chart spec only, or nothing if there is none
    #[arg(long)]
    pub chart_only: bool,
}

impl ExtractArgs {
    pub fn run(self) -> Result<()> {
        let text = self.read_input()?;
        let content = sr_extract::extract(&text);
        if let Some(json) = render(&content, self.chart_only)? {
            println!("{json}");
        }
        Ok(())
    }

    fn read_input(&self) -> Result<String> {
        match self.input.as_deref() {
            Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display())),
            _ => {
                let mut text = String::new();
                io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
                Ok(text)
            }
        }
    }
}

pub fn render(content: &ExtractedContent, chart_only: bool) -> Result<Option<String>> {
    if chart_only {
        return content
            .chart_spec()
            .map(serde_json::to_string_pretty)
            .transpose()
            .context("Failed to serialize chart spec");
    }
    Ok(Some(serde_json::to_string_pretty(content)?))
}
