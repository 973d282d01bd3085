//! pointex - speeded reaching task with reward occlusion.
//!
//! Runs a full session headless against a simulated participant and writes
//! one JSON result row per trial.

mod app;
mod participant;


use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pointex_core::Condition;
use pointex_experiment::{ExperimentConfig, NoDevice, OcclusionDevice, SerialTrigger};
use pointex_timing::HighPrecisionTimer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use participant::{Behaviour, SimulatedParticipant};

#[derive(Parser, Debug)]
#[command(name = "pointex", about = "Speeded reaching task with reward occlusion")]
struct Cli {
    /// JSON experiment configuration; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Result file (JSON lines); stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Character device driving the occlusion goggles, e.g. /dev/ttyUSB0
    #[arg(long)]
    device: Option<PathBuf>,

    /// Seed for target placement and the simulated participant
    #[arg(long)]
    seed: Option<u64>,

    /// First scored condition: vision or reward
    #[arg(long)]
    starting_condition: Option<Condition>,

    /// Skip the practice blocks
    #[arg(long)]
    no_practice: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pointex=info")),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => ExperimentConfig::from_json_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ExperimentConfig::default(),
    };
    if let Some(condition) = cli.starting_condition {
        config.starting_condition = condition;
    }
    if cli.no_practice {
        config.run_practice_blocks = false;
    }

    let seed = cli.seed.unwrap_or_else(rand::random);
    info!(seed, version = env!("CARGO_PKG_VERSION"), "pointex starting");

    let sink: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    match &cli.device {
        Some(path) => {
            let link = OpenOptions::new()
                .write(true)
                .open(path)
                .with_context(|| format!("opening occlusion device {}", path.display()))?;
            info!(device = %path.display(), "occlusion goggles attached");
            let device = SerialTrigger::new(link, config.occlusion.clone());
            run(config, device, sink, seed)
        }
        None => {
            info!("no occlusion device, commands are dropped");
            run(config, NoDevice, sink, seed)
        }
    }
}

fn run<D: OcclusionDevice, W: Write>(
    config: ExperimentConfig,
    device: D,
    sink: W,
    seed: u64,
) -> Result<()> {
    let participant =
        SimulatedParticipant::new(Behaviour::default(), StdRng::seed_from_u64(seed ^ 0x5eed));
    let mut app = App::new(
        config,
        HighPrecisionTimer::new(),
        device,
        participant,
        StdRng::seed_from_u64(seed),
        sink,
    )?;
    let summary = app.run()?;
    if summary.quit {
        info!(rows = summary.rows, "stopped early");
    }
    Ok(())
}
