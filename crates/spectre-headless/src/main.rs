//! Headless runner.
//!
//! Loads a level (and optionally a config and an input script), runs the
//! frame loop without any presentation, and prints every non-empty frame
//! report as one JSON line on stdout. Stops when the session releases its
//! transition payload or the frame limit is reached, then prints a summary
//! line with the final HUD.
//!
//! ```text
//! spectre-headless --level demos/levels/lever_room.json \
//!     --script demos/scripts/lever_room.json --level-index 1
//! ```

mod script;

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use spectre_core::prelude::*;

use crate::script::InputScript;

#[derive(Parser, Debug)]
#[command(version, about = "Runs a Spectre level headless and prints JSON-line frame reports")]
struct Cli {
    /// Level descriptor (JSON).
    #[arg(long, value_name = "PATH")]
    level: PathBuf,

    /// Gameplay config (JSON). Omitted fields keep their defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Scripted input (JSON). Without one the player stands still.
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Index of the level being played.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    level_index: i32,

    /// Lives carried over from the previous level.
    #[arg(long)]
    lives: Option<u32>,

    /// Frame limit.
    #[arg(long, default_value_t = 3600)]
    ticks: u64,

    /// Also print reports for frames where nothing happened.
    #[arg(long)]
    all_frames: bool,
}

#[derive(Serialize)]
struct Summary<'a> {
    ticks: u64,
    sim_time: f64,
    hud: Hud,
    transition: Option<&'a TransitionPayload>,
}

fn read(path: &Path, what: &str) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {what} {}", path.display()))
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let level = LevelDescriptor::from_json_str(&read(&cli.level, "level")?)
        .with_context(|| format!("parsing level {}", cli.level.display()))?;
    let config = match &cli.config {
        Some(path) => GameConfig::from_json_str(&read(path, "config")?)
            .with_context(|| format!("parsing config {}", path.display()))?,
        None => GameConfig::default(),
    };
    let mut script = match &cli.script {
        Some(path) => InputScript::from_json_str(&read(path, "script")?)
            .with_context(|| format!("parsing script {}", path.display()))?,
        None => InputScript::default(),
    };

    let entry = SessionEntry {
        level: cli.level_index,
        remaining_life: cli.lives,
    };
    let session = Session::build(&level, config, entry).context("building level session")?;
    let mut frames = FrameLoop::new(session);
    tracing::info!(level = cli.level_index, limit = cli.ticks, "running headless");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut transition = None;
    while frames.tick_count() < cli.ticks {
        let input = script.next_frame();
        let report = frames.tick(input.as_ref());
        if cli.all_frames || !report.is_empty() {
            serde_json::to_writer(&mut out, &report)?;
            writeln!(out)?;
        }
        if report.transition.is_some() {
            transition = report.transition;
            break;
        }
    }
    if transition.is_none() {
        tracing::warn!(ticks = frames.tick_count(), "frame limit reached without a transition");
    }

    let summary = Summary {
        ticks: frames.tick_count(),
        sim_time: frames.sim_time(),
        hud: frames.session().hud(),
        transition: transition.as_ref(),
    };
    serde_json::to_writer(&mut out, &serde_json::json!({ "summary": summary }))?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_all_options() {
        let cli = Cli::try_parse_from([
            "spectre-headless",
            "--level",
            "l.json",
            "--script",
            "s.json",
            "--level-index",
            "-1",
            "--lives",
            "2",
            "--ticks",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.level, PathBuf::from("l.json"));
        assert_eq!(cli.level_index, -1);
        assert_eq!(cli.lives, Some(2));
        assert_eq!(cli.ticks, 10);
        assert!(cli.config.is_none());
        assert!(!cli.all_frames);
    }

    #[test]
    fn level_is_required() {
        assert!(Cli::try_parse_from(["spectre-headless"]).is_err());
    }
}
