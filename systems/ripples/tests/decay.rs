use std::time::Duration;

use emberfall_core::{
    config::{DungeonConfig, RippleConfig},
    seeded_rng, CellCoord, Color, FrameContext, Position, Rect, SubCellCoord, TerrainKind,
};
use emberfall_system_ripples::RippleManager;
use emberfall_world::{Dungeon, Grid};

const FRAME: Duration = Duration::from_millis(34);

fn lake() -> Dungeon {
    let mut dungeon = Dungeon::new(12, 12, DungeonConfig::default());
    for (x, y) in Rect::new(1, 1, 10, 10).iter() {
        let _ = dungeon.set_terrain(CellCoord::new(x, y), TerrainKind::DeepWater);
    }
    dungeon
}

fn run(manager: &mut RippleManager, dungeon: &Dungeon, frames: u32, viewport: Rect) {
    let mut rng = seeded_rng(5);
    let mut elapsed = Duration::ZERO;
    for _ in 0..frames {
        elapsed += FRAME;
        let mut ctx = FrameContext::new(FRAME, elapsed, viewport, &mut rng);
        manager.update(&mut ctx, dungeon);
    }
}

#[test]
fn single_impulse_decays_to_dormancy() {
    let dungeon = lake();
    let config = RippleConfig::default();
    let threshold = config.activity_threshold;
    let mut manager = RippleManager::new(config);
    let mut rng = seeded_rng(1);
    assert!(manager.start_ripple(&dungeon, &mut rng, Position::new(6.2, 5.8), 1.0));

    run(&mut manager, &dungeon, 3, dungeon.bounds());
    assert_eq!(manager.active_zone_count(), 1);
    assert!(manager.zones()[0].peak() > threshold);

    run(&mut manager, &dungeon, 1800, dungeon.bounds());
    assert_eq!(manager.active_zone_count(), 0);
    let zone = &manager.zones()[0];
    for (x, y) in zone.window().iter() {
        let height = zone.height(SubCellCoord::new(x, y)).unwrap_or(0.0);
        assert!(height.abs() <= threshold);
    }
}

#[test]
fn impulse_on_the_shore_row_still_decays() {
    let dungeon = lake();
    let mut manager = RippleManager::new(RippleConfig::default());
    let mut rng = seeded_rng(1);
    let shore = Position::new(1.2, 5.8);
    assert!(manager.start_ripple(&dungeon, &mut rng, shore, 1.0));
    assert_eq!(manager.zones()[0].window().x(), shore.sub_cell().x());

    run(&mut manager, &dungeon, 1800, dungeon.bounds());
    assert_eq!(manager.active_zone_count(), 0);
    assert_eq!(manager.zones()[0].peak(), 0.0);
}

#[test]
fn zones_off_screen_are_frozen() {
    let dungeon = lake();
    let mut manager = RippleManager::new(RippleConfig::default());
    let mut rng = seeded_rng(1);
    assert!(manager.start_ripple(&dungeon, &mut rng, Position::new(6.5, 6.5), 1.0));
    let before = manager.zones()[0].clone();

    run(&mut manager, &dungeon, 30, Rect::new(40, 40, 5, 5));
    assert_eq!(manager.zones()[0], before);
}

#[test]
fn rendering_covers_visible_water() {
    let dungeon = lake();
    let mut manager = RippleManager::new(RippleConfig::default());
    let mut rng = seeded_rng(1);
    assert!(manager.start_ripple(&dungeon, &mut rng, Position::new(6.5, 6.5), 1.0));
    run(&mut manager, &dungeon, 4, dungeon.bounds());

    let bounds = dungeon.sub_cell_bounds();
    let mut image = Grid::new(bounds.width(), bounds.height(), Color::BLACK);
    let written = manager.render_ground(&dungeon, 0.5, dungeon.bounds(), &mut image);
    assert_eq!(written, 10 * 10 * 4);
    assert_eq!(image[(0, 0)], Color::BLACK);

    let half = manager.render_ground(&dungeon, 0.5, Rect::new(0, 0, 6, 12), &mut image);
    assert_eq!(half, 5 * 10 * 4);
}
