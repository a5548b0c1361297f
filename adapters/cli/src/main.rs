#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Emberfall simulation headless.

use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use clap::Parser;
use emberfall_cli::{load_blueprint, load_config, RunSummary, Session, DEMO_LEVEL};
use emberfall_core::config::WorldConfig;
use emberfall_world::LevelBlueprint;

#[derive(Debug, Parser)]
#[command(
    name = "emberfall-sim",
    about = "Runs the Emberfall dungeon simulation without a renderer",
    version
)]
struct Args {
    /// TOML file overriding the default tuning.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for every random choice in the run.
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// Number of frames to simulate.
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    /// Simulated milliseconds per frame.
    #[arg(long, default_value_t = 33)]
    dt_ms: u64,

    /// Level blueprint file; the built-in demo level is used when omitted.
    #[arg(short, long)]
    map: Option<PathBuf>,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

/// Entry point for the Emberfall command-line interface.
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => WorldConfig::default(),
    };
    let blueprint = match &args.map {
        Some(path) => load_blueprint(path)?,
        None => LevelBlueprint::parse(DEMO_LEVEL).context("built-in level is invalid")?,
    };

    let mut session = Session::new(&blueprint, config, args.seed);
    let dt = Duration::from_millis(args.dt_ms);
    let mut last = session.tick(dt);
    for _ in 1..args.frames {
        last = session.tick(dt);
    }
    log::info!("simulated {} frames", last.frame);

    let summary = RunSummary {
        seed: args.seed,
        frames: last.frame,
        totals: session.totals(),
        last,
    };
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to encode summary")?
        );
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let last = &summary.last;
    println!(
        "seed {} | {} frames | {:.1}s simulated",
        summary.seed, summary.frames, last.elapsed
    );
    println!(
        "director: {} (wave {:.2}), player health {:.0}%",
        last.regime,
        last.wave,
        last.player_health * 100.0
    );
    println!(
        "creatures {} | items {} | corpses {} | visible cells {}",
        last.creatures, last.items, last.corpses, last.visible_cells
    );
    println!(
        "water zones active {} | fire zones {} | lit sub-cells {} | water sub-cells {}",
        last.active_water_zones, last.fire_zones, last.lit_sub_cells, last.water_sub_cells
    );
    let totals = &summary.totals;
    println!(
        "spawned {} (failed {}) | kills {} | drops {} | potions {}",
        totals.spawned,
        totals.failed_spawns,
        totals.kills,
        totals.items_dropped,
        totals.potions_used
    );
}
