//! Reference driver: ticks a run to completion and reports the comparison.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use pipeline_simulator::config::SimConfig;
use pipeline_simulator::registry::parse_identifier_list;
use pipeline_simulator::{CycleSnapshot, ItemId, Run, RunOptions};

#[derive(Parser)]
#[command(
    name = "pipeline-simulator",
    version = env!("CARGO_PKG_VERSION"),
    about = "Compare pipelined and single-cycle execution, one cycle at a time"
)]
struct Cli {
    /// Comma-separated item identifiers. Generated when omitted.
    #[arg(long)]
    ids: Option<String>,

    /// Number of items in the run.
    #[arg(long)]
    count: Option<usize>,

    /// Number of stages.
    #[arg(long)]
    stages: Option<usize>,

    /// Milliseconds between cycles (100..=2000).
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Advance without waiting between cycles.
    #[arg(long)]
    no_delay: bool,

    /// Print the final metrics as JSON.
    #[arg(long)]
    json: bool,

    /// Log at info level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,

    /// Read configuration from this file instead of the default locations.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a sample configuration file and exit.
    #[arg(long)]
    sample_config: bool,
}

fn item_label(run: &Run, id: ItemId) -> &str {
    run.item(id).map_or("?", |item| item.id.as_str())
}

fn describe(run: &Run, snap: &CycleSnapshot) -> String {
    let stages = run.stages();
    let slots: Vec<String> = snap
        .pipeline
        .iter()
        .enumerate()
        .map(|(stage, slot)| match slot {
            Some(id) => format!("{}:{}", stages.label(stage), item_label(run, *id)),
            None => format!("{}:-", stages.label(stage)),
        })
        .collect();
    let single = match snap.single_cycle {
        Some(c) => format!("{} in {}", item_label(run, c.item), stages.label(c.stage)),
        None => "idle".to_string(),
    };
    format!("cycle {:>3} | pipeline [{}] | single-cycle {}", snap.cycle, slots.join(" "), single)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if cli.sample_config {
        print!("{}", SimConfig::sample());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => SimConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SimConfig::load(),
    };
    if let Some(stages) = cli.stages {
        config.stage_count = stages;
        config.stage_labels.clear();
    }
    if let Some(tick) = cli.tick_ms {
        config.tick_ms = tick;
    }
    let count = cli.count.unwrap_or(config.default_count);

    let stages = config.stage_set().context("invalid stage configuration")?;
    let identifiers = cli.ids.as_deref().map(parse_identifier_list).unwrap_or_default();
    let mut run = Run::start(identifiers, count, stages, &RunOptions::from(&config))
        .context("cannot start run")?;

    let tick = Duration::from_millis(config.tick_ms_clamped());
    info!("Ticking every {:?}", tick);

    while !run.is_complete() {
        let snap = run.advance_cycle()?;
        println!("{}", describe(&run, &snap));
        if let Some(id) = snap.pipelined_exited {
            println!("          pipelined: {} done", item_label(&run, id));
        }
        if let Some(id) = snap.single_cycle_completed {
            println!("          single-cycle: {} done", item_label(&run, id));
        }
        if !cli.no_delay && !run.is_complete() {
            thread::sleep(tick);
        }
    }

    let metrics = run.metrics()?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!();
        println!("{metrics}");
    }
    Ok(())
}
