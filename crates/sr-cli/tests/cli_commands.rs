// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use pretty_assertions::assert_eq;
use sr_cli::inspect::InspectArgs;
use sr_cli::play::{stream_to, write_chart};
use sr_cli::{Cli, Commands, Parser};
use sr_dump::StreamEvent;
use sr_player::{PlaybackStatus, PlayerConfig, ReplayPlayer};
use std::io::Write;
use std::time::Duration;

fn deltas(parts: &[&str]) -> Vec<StreamEvent> {
    parts
        .iter()
        .enumerate()
        .map(|(i, text)| StreamEvent::delta(i, *text))
        .collect()
}

#[test]
fn parses_play_with_options() {
    let cli = Cli::try_parse_from([
        "stream-replay",
        "--config",
        "player.toml",
        "play",
        "dump.jsonl",
        "--speed",
        "2.5",
        "--summary",
        "--chart-out",
        "chart.json",
        "--log-level",
        "debug",
    ])
    .unwrap();

    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("player.toml")));
    assert_eq!(cli.logging.log_level, Some(sr_logging::CliLogLevel::Debug));
    let Commands::Play(args) = cli.command else {
        panic!("expected play command");
    };
    assert_eq!(args.dump, std::path::PathBuf::from("dump.jsonl"));
    assert_eq!(args.speed, Some(2.5));
    assert!(args.summary);
    assert!(!args.fast);
    assert_eq!(args.chart_out, Some(std::path::PathBuf::from("chart.json")));
}

#[test]
fn fast_and_speed_are_mutually_exclusive() {
    let err = Cli::try_parse_from([
        "stream-replay",
        "play",
        "dump.jsonl",
        "--fast",
        "--speed",
        "2.0",
    ])
    .unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

    let cli = Cli::try_parse_from(["stream-replay", "play", "dump.jsonl", "--fast"]).unwrap();
    assert!(matches!(cli.command, Commands::Play(ref args) if args.fast && args.speed.is_none()));
}

#[test]
fn extract_input_is_optional() {
    let cli = Cli::try_parse_from(["stream-replay", "extract"]).unwrap();
    assert!(matches!(cli.command, Commands::Extract(ref args) if args.input.is_none()));
}

#[test]
fn play_requires_a_dump() {
    assert!(Cli::try_parse_from(["stream-replay", "play"]).is_err());
}

#[test]
fn inspect_reports_corrupt_dump_without_failing() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{{\"type\":\"delta\",\"text\":\"hi\",\"ts\":10}}").unwrap();
    writeln!(file, "not json").unwrap();
    writeln!(file, "{{\"type\":\"done\",\"ts\":40}}").unwrap();

    let stats = InspectArgs {
        dump: file.path().to_path_buf(),
    }
    .stats()
    .unwrap();
    assert_eq!(stats.deltas, 1);
    assert_eq!(stats.dones, 1);
    assert_eq!(stats.skipped_lines, 1);
    assert_eq!(stats.delta_bytes, 2);
    assert!(stats.terminated);
}

#[test]
fn inspect_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let args = InspectArgs {
        dump: dir.path().join("absent.jsonl"),
    };
    let err = args.stats().unwrap_err();
    assert!(err.to_string().contains("Failed to read dump"));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn stream_to_writes_every_delta_once() {
    let player = ReplayPlayer::new(deltas(&["Hello", ", ", "wörld", "!"]), PlayerConfig::default());
    player.play();

    let mut out = Vec::new();
    let snapshot = stream_to(&player, &mut out, std::future::pending()).await.unwrap();
    assert_eq!(snapshot.status, PlaybackStatus::Done);
    assert_eq!(String::from_utf8(out).unwrap(), "Hello, wörld!");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn interrupt_stops_and_keeps_partial_output() {
    let player = ReplayPlayer::new(deltas(&["a", "b", "c", "d"]), PlayerConfig::default());
    player.play();

    let mut out = Vec::new();
    let interrupt = tokio::time::sleep(Duration::from_millis(45));
    let snapshot = stream_to(&player, &mut out, interrupt).await.unwrap();
    assert_eq!(snapshot.status, PlaybackStatus::Idle);
    assert_eq!(String::from_utf8(out).unwrap(), "a");

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(player.current_text(), "a");
}

#[test]
fn chart_out_writes_prepared_spec() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chart.json");
    let content = sr_extract::extract(
        "Here:\n```json\n{\"mark\":\"bar\",\"encoding\":{\"x\":{\"field\":\"region\"}}}\n```\n",
    );

    assert!(write_chart(&content, &path).unwrap());
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["mark"], "bar");
    assert_eq!(written["width"], "container");
    assert_eq!(written["data"]["values"][0]["region"], "Almaty");
}

#[test]
fn chart_out_without_chart_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chart.json");
    let content = sr_extract::extract("no chart here");
    assert!(!write_chart(&content, &path).unwrap());
    assert!(!path.exists());
}

#[test]
fn extract_render_chart_only() {
    let content = sr_extract::extract("plain text");
    assert_eq!(sr_cli::extract::render(&content, true).unwrap(), None);

    let json = sr_cli::extract::render(&content, false).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["main_text"], "plain text");
    assert_eq!(value["has_thought"], false);
}
