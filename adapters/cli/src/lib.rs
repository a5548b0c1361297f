#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless frame harness that wires the dungeon and every simulation
//! system into one deterministic tick loop.

use std::{fs, path::Path};

use anyhow::Context;
use emberfall_core::config::WorldConfig;
use emberfall_world::LevelBlueprint;
use serde::Serialize;

mod session;

pub use session::{FrameSnapshot, Session, Totals};

/// Level used when no map file is given.
pub const DEMO_LEVEL: &str = "\
##############################
#S.......,,,,,,,......#.....S#
#........,,T,,,,......#......#
#...~~~~~~~..,,,,,,...#......#
#...~~~~~~~~..,,O,,.........>#
#...~~~==~~~..,,,,,..........#
#...~~~~~~~~.......##...A....#
#....~~~~~~..@.....##........#
#..................##........#
#.......T.....,,,,,..........#
#S............,,,,,,.......S.#
##############################

light 12 6
light 25 2
creature:rat 6 8
creature:boss 26 8
item:torch 14 8
";

/// Result of a full headless run.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    /// Seed the session RNG was created from.
    pub seed: u64,
    /// Frames simulated.
    pub frames: u64,
    /// State after the last frame.
    pub last: FrameSnapshot,
    /// Counters accumulated over the run.
    pub totals: Totals,
}

/// Reads a TOML configuration file; omitted keys keep their defaults.
pub fn load_config(path: &Path) -> anyhow::Result<WorldConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
}

/// Reads and parses a level blueprint file.
pub fn load_blueprint(path: &Path) -> anyhow::Result<LevelBlueprint> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read map file {}", path.display()))?;
    LevelBlueprint::parse(&text).with_context(|| format!("invalid map file {}", path.display()))
}
