#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Water ripple engine.
//!
//! The dungeon's rippling terrain is flood-filled into disjoint rectangular
//! zones the first time the engine is used. Each zone runs its own wave
//! simulation at a fixed rate while it is active and on screen, and may host
//! a shoal of fish that flees from fresh ripples.

use std::{collections::VecDeque, time::Duration};

use emberfall_core::{
    config::RippleConfig, CellCoord, Color, FrameContext, Position, Rect, SimRng, SubCellCoord,
    SUB_CELLS_PER_CELL,
};
use emberfall_world::{Dungeon, Grid};
use glam::Vec2;
use noise::{NoiseFn, Perlin};

mod shoal;
mod zone;

pub use shoal::{Fish, Shoal};
pub use zone::WaterZone;

/// Separates the two shimmer noise channels in the noise field.
const SHIMMER_CHANNEL_OFFSET: f64 = 97.0;
/// Brightness change per unit of surface height when rendering.
const CREST_BRIGHTNESS: f32 = 0.25;

/// Owns every water zone of the current level.
pub struct RippleManager {
    config: RippleConfig,
    noise: Perlin,
    zones: Option<Vec<WaterZone>>,
    accumulator: Duration,
}

impl std::fmt::Debug for RippleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RippleManager")
            .field("config", &self.config)
            .field("zones", &self.zones)
            .field("accumulator", &self.accumulator)
            .finish_non_exhaustive()
    }
}

impl RippleManager {
    /// Creates a manager; zones are built on first use.
    #[must_use]
    pub fn new(config: RippleConfig) -> Self {
        Self {
            noise: Perlin::new(config.noise_seed),
            config,
            zones: None,
            accumulator: Duration::ZERO,
        }
    }

    /// Tuning the manager was built with.
    #[must_use]
    pub const fn config(&self) -> &RippleConfig {
        &self.config
    }

    /// Reports whether the water zones have been built.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.zones.is_some()
    }

    /// Drops every zone so the next use rebuilds them, e.g. after a level change.
    pub fn invalidate(&mut self) {
        self.zones = None;
        self.accumulator = Duration::ZERO;
    }

    /// Zones built so far; empty before first use.
    #[must_use]
    pub fn zones(&self) -> &[WaterZone] {
        self.zones.as_deref().unwrap_or(&[])
    }

    /// Number of zones currently simulated.
    #[must_use]
    pub fn active_zone_count(&self) -> usize {
        self.zones().iter().filter(|zone| zone.is_active()).count()
    }

    /// Disturbs the water at `at` with an impulse of `height`.
    ///
    /// Returns `false` when the position is not on simulated water.
    pub fn start_ripple(
        &mut self,
        dungeon: &Dungeon,
        rng: &mut SimRng,
        at: Position,
        height: f32,
    ) -> bool {
        let sub_cell = at.sub_cell();
        self.ensure_zones(dungeon, rng)
            .iter_mut()
            .find(|zone| zone.window().contains(sub_cell.x(), sub_cell.y()))
            .is_some_and(|zone| zone.impulse(sub_cell, height))
    }

    /// Advances the zones intersecting the viewport by as many fixed steps
    /// as the elapsed time allows.
    pub fn update(&mut self, ctx: &mut FrameContext<'_>, dungeon: &Dungeon) {
        if self.config.frequency <= 0.0 {
            return;
        }
        let interval = Duration::from_secs_f32(1.0 / self.config.frequency);
        self.accumulator = self.accumulator.saturating_add(ctx.dt);

        let mut steps = 0;
        while self.accumulator >= interval && steps < self.config.max_steps_per_frame {
            self.accumulator -= interval;
            steps += 1;
        }
        if steps == self.config.max_steps_per_frame {
            self.accumulator = self.accumulator.min(interval);
        }
        if steps == 0 {
            return;
        }

        let damping = self.config.damping;
        let threshold = self.config.activity_threshold;
        let viewport = ctx.viewport;
        for zone in self.ensure_zones(dungeon, &mut *ctx.rng) {
            if zone.bounds().intersects(&viewport) {
                zone.advance(steps, interval.as_secs_f32(), damping, threshold);
            }
        }
    }

    /// Writes the refracted ground colour of every wet sub-cell in the
    /// viewport into `image`, a sub-cell resolution image of the dungeon.
    ///
    /// Returns the number of sub-cells written.
    pub fn render_ground(
        &self,
        dungeon: &Dungeon,
        elapsed: f32,
        viewport: Rect,
        image: &mut Grid<Color>,
    ) -> usize {
        let window = viewport.scaled(SUB_CELLS_PER_CELL);
        let time = f64::from(elapsed * self.config.shimmer_speed);
        let mut written = 0;

        for zone in self.zones() {
            let Some(visible) = zone.window().intersection(&window) else {
                continue;
            };
            for (x, y) in visible.iter() {
                let sub_cell = SubCellCoord::new(x, y);
                if !zone.is_wet(sub_cell) {
                    continue;
                }
                let Some(slot) = image.get_mut(x, y) else {
                    continue;
                };

                let scale = f64::from(self.config.shimmer_scale);
                let point = [f64::from(x) * scale, f64::from(y) * scale, time];
                let shimmer = Vec2::new(
                    self.noise.get(point) as f32,
                    self.noise
                        .get([point[0] + SHIMMER_CHANNEL_OFFSET, point[1], point[2]])
                        as f32,
                );
                let mut offset = zone.gradient(sub_cell) * self.config.refraction
                    + shimmer * self.config.shimmer_amplitude;
                if offset.length() > self.config.max_offset {
                    offset = Vec2::ZERO;
                }

                let source = sub_cell.offset(offset.x.round() as i32, offset.y.round() as i32);
                let ground = dungeon
                    .sub_cell(source)
                    .filter(|sample| sample.is_wet())
                    .or_else(|| dungeon.sub_cell(sub_cell))
                    .map_or(Color::BLACK, |sample| sample.ground);
                let crest = zone.height(sub_cell).unwrap_or(0.0);
                *slot = ground.scale(1.0 + crest * CREST_BRIGHTNESS);
                written += 1;
            }
        }
        written
    }

    fn ensure_zones(&mut self, dungeon: &Dungeon, rng: &mut SimRng) -> &mut Vec<WaterZone> {
        let config = &self.config;
        self.zones.get_or_insert_with(|| {
            let zones = build_zones(dungeon, config, rng);
            log::info!(
                "created {} water zones ({} fish)",
                zones.len(),
                zones.iter().map(|zone| zone.fish().count()).sum::<usize>()
            );
            zones
        })
    }
}

fn build_zones(dungeon: &Dungeon, config: &RippleConfig, rng: &mut SimRng) -> Vec<WaterZone> {
    find_water_rects(dungeon)
        .into_iter()
        .filter(|rect| {
            rect.width() >= config.min_zone_size && rect.height() >= config.min_zone_size
        })
        .map(|rect| {
            let mut zone = WaterZone::new(rect, dungeon);
            if config.cells_per_fish > 0 {
                let wet = zone.wet_sub_cells();
                let wet_cells = wet.len() / (SUB_CELLS_PER_CELL * SUB_CELLS_PER_CELL) as usize;
                let count = wet_cells / config.cells_per_fish as usize;
                if count > 0 {
                    zone.set_shoal(Shoal::populate(config.shoal.clone(), count, &wet, rng));
                }
            }
            zone
        })
        .collect()
}

/// Bounding rectangles of the 4-connected rippling regions, with
/// overlapping rectangles merged until all are disjoint.
fn find_water_rects(dungeon: &Dungeon) -> Vec<Rect> {
    let ripples = |cell: CellCoord| dungeon.terrain(cell).is_some_and(|terrain| terrain.ripples());
    let mut visited = Grid::new(dungeon.width(), dungeon.height(), false);
    let mut rects: Vec<Rect> = Vec::new();
    let mut queue = VecDeque::new();

    for (x, y) in dungeon.bounds().iter() {
        let start = CellCoord::new(x, y);
        if visited[(x, y)] || !ripples(start) {
            continue;
        }
        visited[(x, y)] = true;
        queue.push_back(start);
        let mut region = Rect::new(x, y, 1, 1);
        while let Some(cell) = queue.pop_front() {
            region = region.merge(&Rect::new(cell.x(), cell.y(), 1, 1));
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let next = cell.offset(dx, dy);
                if ripples(next) && !visited[(next.x(), next.y())] {
                    visited[(next.x(), next.y())] = true;
                    queue.push_back(next);
                }
            }
        }
        rects.push(region);
    }

    let mut merged = true;
    while merged {
        merged = false;
        'outer: for i in 0..rects.len() {
            for j in i + 1..rects.len() {
                if rects[i].intersects(&rects[j]) {
                    let other = rects.swap_remove(j);
                    rects[i] = rects[i].merge(&other);
                    merged = true;
                    break 'outer;
                }
            }
        }
    }
    rects
}

#[cfg(test)]
mod tests {
    use emberfall_core::{config::DungeonConfig, TerrainKind};

    use super::*;

    fn flood(dungeon: &mut Dungeon, rect: Rect) {
        for (x, y) in rect.iter() {
            let _ = dungeon.set_terrain(CellCoord::new(x, y), TerrainKind::DeepWater);
        }
    }

    #[test]
    fn separate_pools_become_separate_zones() {
        let mut dungeon = Dungeon::new(20, 10, DungeonConfig::default());
        flood(&mut dungeon, Rect::new(1, 1, 5, 5));
        flood(&mut dungeon, Rect::new(10, 2, 6, 7));
        flood(&mut dungeon, Rect::new(17, 1, 2, 2));

        let mut rects = find_water_rects(&dungeon);
        rects.sort_by_key(|rect| rect.x());
        assert_eq!(
            rects,
            vec![
                Rect::new(1, 1, 5, 5),
                Rect::new(10, 2, 6, 7),
                Rect::new(17, 1, 2, 2)
            ]
        );
    }

    #[test]
    fn overlapping_bounds_are_merged() {
        let mut dungeon = Dungeon::new(12, 12, DungeonConfig::default());
        // An L-shaped pool whose bounding box swallows a separate puddle.
        flood(&mut dungeon, Rect::new(1, 1, 8, 1));
        flood(&mut dungeon, Rect::new(1, 1, 1, 8));
        flood(&mut dungeon, Rect::new(5, 5, 2, 2));

        assert_eq!(find_water_rects(&dungeon), vec![Rect::new(1, 1, 8, 8)]);
    }

    #[test]
    fn small_pools_are_not_simulated() {
        let mut dungeon = Dungeon::new(20, 10, DungeonConfig::default());
        flood(&mut dungeon, Rect::new(1, 1, 5, 5));
        flood(&mut dungeon, Rect::new(10, 1, 4, 8));

        let mut manager = RippleManager::new(RippleConfig::default());
        let mut rng = emberfall_core::seeded_rng(3);
        assert!(!manager.start_ripple(&dungeon, &mut rng, Position::new(11.5, 3.5), 1.0));
        assert!(manager.start_ripple(&dungeon, &mut rng, Position::new(3.5, 3.5), 1.0));
        assert_eq!(manager.zones().len(), 1);
        assert_eq!(manager.active_zone_count(), 1);
    }
}
