use std::{fs, time::Duration};

use emberfall_cli::{load_config, RunSummary, Session, DEMO_LEVEL};
use emberfall_core::{config::WorldConfig, CellCoord, Position, Rect, TerrainKind};
use emberfall_system_director::DirectorState;
use emberfall_world::LevelBlueprint;

const FRAME: Duration = Duration::from_millis(33);

fn demo(seed: u64) -> Session {
    let blueprint = LevelBlueprint::parse(DEMO_LEVEL).expect("demo level parses");
    Session::new(&blueprint, WorldConfig::default(), seed)
}

#[test]
fn same_seed_replays_identically() {
    let mut first = demo(7);
    let mut second = demo(7);
    for _ in 0..300 {
        assert_eq!(first.tick(FRAME), second.tick(FRAME));
    }
    assert_eq!(first.totals(), second.totals());
}

#[test]
fn first_frame_sees_and_lights_the_room() {
    let mut session = demo(1);
    let snapshot = session.tick(FRAME);
    assert_eq!(snapshot.frame, 1);
    assert!(snapshot.visible_cells > 0);
    assert!(snapshot.lit_sub_cells > 0);
    assert_eq!(snapshot.regime, "Calm");
    assert!(session.dungeon().is_in_fov(session.player().cell()));
}

#[test]
fn splashing_the_pool_wakes_its_zone() {
    let mut session = demo(2);
    for _ in 0..5 {
        let _ = session.tick(FRAME);
    }
    assert!(session.ripples().is_initialized());
    assert!(session.splash(Position::cell_center(CellCoord::new(6, 4)), 1.0));
    assert!(!session.splash(Position::cell_center(CellCoord::new(15, 8)), 1.0));

    let snapshot = session.tick(FRAME);
    assert_eq!(snapshot.active_water_zones, 1);
    assert!(snapshot.water_sub_cells > 0);
}

#[test]
fn fires_burn_out_or_can_be_put_out() {
    let mut session = demo(3);
    let lasting = session.ignite(Rect::new(14, 8, 2, 2), Duration::from_secs(600));
    let _ = session.ignite(Rect::new(2, 8, 2, 2), Duration::from_secs(1));
    assert_eq!(session.tick(FRAME).fire_zones, 2);

    assert!(session.extinguish(lasting));
    assert!(!session.extinguish(lasting));
    let remaining = (0..600).map(|_| session.tick(FRAME).fire_zones).last();
    assert_eq!(remaining, Some(0));
}

#[test]
fn planting_a_tree_grows_a_canopy() {
    let mut session = demo(4);
    let cell = CellCoord::new(16, 9);
    let trunk = cell.first_sub_cell();
    assert!(session
        .dungeon()
        .canopy(trunk)
        .is_some_and(|color| color.is_black()));

    assert!(session.set_terrain(cell, TerrainKind::OakTree));
    assert!(session
        .dungeon()
        .canopy(trunk)
        .is_some_and(|color| !color.is_black()));
    assert!(!session.set_terrain(CellCoord::new(99, 99), TerrainKind::Floor));
}

#[test]
fn boss_encounter_drives_the_director() {
    let blueprint = LevelBlueprint::parse("#######\n#@...S#\n#######\n\ncreature:boss 4 1\n")
        .expect("corridor parses");
    let mut session = Session::new(&blueprint, WorldConfig::default(), 5);
    let _ = session.tick(FRAME);
    assert_eq!(session.director().state(), DirectorState::NoRespite);

    for _ in 0..400 {
        let _ = session.tick(Duration::from_millis(100));
    }
    assert_eq!(session.director().state(), DirectorState::Cleared);
    assert!(session.totals().kills >= 1);
}

#[test]
fn partial_config_files_keep_defaults() {
    let path = std::env::temp_dir().join(format!("emberfall-config-{}.toml", std::process::id()));
    fs::write(&path, "[director]\ncreature_cap = 4\n").expect("temp dir is writable");
    let config = load_config(&path).expect("config parses");
    fs::remove_file(&path).expect("temp file is removable");

    assert_eq!(config.director.creature_cap, 4);
    assert_eq!(config.lighting, WorldConfig::default().lighting);
}

#[test]
fn summary_serializes_to_json() {
    let mut session = demo(6);
    let last = session.tick(FRAME);
    let summary = RunSummary {
        seed: 6,
        frames: last.frame,
        totals: session.totals(),
        last,
    };
    let json = serde_json::to_value(&summary).expect("summary encodes");
    assert_eq!(json["frames"], 1);
    assert_eq!(json["last"]["regime"], "Calm");
    assert!(json["totals"]["spawned"].is_number());
}
