//! Cellular-automaton fire zones.

use std::time::Duration;

use emberfall_core::{
    config::FireConfig, FireZoneId, FrameContext, Rect, SimRng, SubCellCoord, SUB_CELLS_PER_CELL,
};
use emberfall_world::Grid;
use rand::Rng;

#[derive(Clone, Debug)]
struct FireZone {
    id: FireZoneId,
    window: Rect,
    intensity: Grid<f32>,
    scratch: Grid<f32>,
    lifetime: Duration,
    age: Duration,
}

impl FireZone {
    fn is_sparking(&self) -> bool {
        self.age < self.lifetime
    }

    fn peak(&self) -> f32 {
        self.intensity
            .as_slice()
            .iter()
            .fold(0.0_f32, |peak, value| peak.max(*value))
    }

    fn step(&mut self, config: &FireConfig, interval: Duration, rng: &mut SimRng) {
        self.age = self.age.saturating_add(interval);
        let sparking = self.is_sparking();
        let spark = config.spark_chance;
        let antispark = spark + config.antispark_chance;
        let soft_spark = antispark + config.soft_spark_chance;

        if sparking {
            for value in self.intensity.as_mut_slice() {
                let roll: f64 = rng.gen();
                if roll < spark {
                    *value = 1.0;
                } else if roll < antispark {
                    *value = 0.0;
                } else if roll < soft_spark {
                    *value = (*value + config.soft_spark_amount).min(1.0);
                }
            }
        }

        let width = self.intensity.width();
        let height = self.intensity.height();
        for y in 0..height {
            for x in 0..width {
                let mut sum = self.intensity[(x, y)];
                for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                    sum += self.intensity.get(x + dx, y + dy).copied().unwrap_or(0.0);
                }
                let smoothed = sum / 5.0 * config.cooling;
                self.scratch[(x, y)] = if smoothed < config.extinguish_threshold {
                    0.0
                } else {
                    smoothed.min(1.0)
                };
            }
        }
        std::mem::swap(&mut self.intensity, &mut self.scratch);
    }
}

/// Owns every burning zone and steps them at a fixed rate.
#[derive(Clone, Debug)]
pub struct FireManager {
    config: FireConfig,
    zones: Vec<FireZone>,
    next_id: u32,
    accumulator: Duration,
}

impl FireManager {
    /// Creates a manager with no fires.
    #[must_use]
    pub fn new(config: FireConfig) -> Self {
        Self {
            config,
            zones: Vec::new(),
            next_id: 0,
            accumulator: Duration::ZERO,
        }
    }

    /// Starts a fire over a cell rectangle that keeps sparking for `lifetime`.
    ///
    /// Once the lifetime has elapsed the fire cools down and the zone is
    /// dropped as soon as every sub-cell is extinguished.
    pub fn start_fire_zone(&mut self, cells: Rect, lifetime: Duration) -> FireZoneId {
        let id = FireZoneId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let window = cells.scaled(SUB_CELLS_PER_CELL);
        let width = window.width().max(0);
        let height = window.height().max(0);
        self.zones.push(FireZone {
            id,
            window,
            intensity: Grid::new(width, height, 0.0),
            scratch: Grid::new(width, height, 0.0),
            lifetime,
            age: Duration::ZERO,
        });
        log::debug!("fire zone {} started over {:?}", id.get(), cells);
        id
    }

    /// Removes a fire immediately. Returns `false` for unknown zones.
    pub fn remove_fire_zone(&mut self, id: FireZoneId) -> bool {
        let before = self.zones.len();
        self.zones.retain(|zone| zone.id != id);
        before != self.zones.len()
    }

    /// Number of zones still burning or cooling.
    #[must_use]
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Fire intensity in `0..=1` at a sub-cell; overlapping zones take the maximum.
    #[must_use]
    pub fn intensity(&self, sub_cell: SubCellCoord) -> f32 {
        self.zones
            .iter()
            .filter_map(|zone| {
                zone.intensity
                    .get(
                        sub_cell.x() - zone.window.x(),
                        sub_cell.y() - zone.window.y(),
                    )
                    .copied()
            })
            .fold(0.0, f32::max)
    }

    /// Runs as many automaton steps as the frame time allows and prunes
    /// extinguished zones.
    pub fn update(&mut self, ctx: &mut FrameContext<'_>) {
        if self.config.frequency <= 0.0 || self.zones.is_empty() {
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

        for _ in 0..steps {
            for zone in &mut self.zones {
                zone.step(&self.config, interval, &mut *ctx.rng);
            }
        }

        self.zones.retain(|zone| {
            let alive = zone.is_sparking() || zone.peak() > 0.0;
            if !alive {
                log::debug!("fire zone {} burnt out", zone.id.get());
            }
            alive
        });
    }
}

#[cfg(test)]
mod tests {
    use emberfall_core::seeded_rng;

    use super::*;

    fn run(manager: &mut FireManager, rng: &mut SimRng, frames: u32) {
        let dt = Duration::from_millis(50);
        for frame in 0..frames {
            let mut ctx = FrameContext::new(dt, dt * frame, Rect::new(0, 0, 32, 32), rng);
            manager.update(&mut ctx);
        }
    }

    #[test]
    fn fire_burns_within_bounds_then_dies_out() {
        let mut manager = FireManager::new(FireConfig::default());
        let mut rng = seeded_rng(11);
        let id = manager.start_fire_zone(Rect::new(2, 2, 3, 3), Duration::from_secs(2));
        assert_eq!(id, FireZoneId::new(0));

        run(&mut manager, &mut rng, 20);
        let lit = Rect::new(4, 4, 6, 6)
            .iter()
            .filter(|(x, y)| manager.intensity(SubCellCoord::new(*x, *y)) > 0.0)
            .count();
        assert!(lit > 0);
        for (x, y) in Rect::new(0, 0, 16, 16).iter() {
            let value = manager.intensity(SubCellCoord::new(x, y));
            assert!((0.0..=1.0).contains(&value));
            if !Rect::new(4, 4, 6, 6).contains(x, y) {
                assert_eq!(value, 0.0);
            }
        }

        run(&mut manager, &mut rng, 400);
        assert_eq!(manager.zone_count(), 0);
    }

    #[test]
    fn zones_can_be_removed_early() {
        let mut manager = FireManager::new(FireConfig::default());
        let first = manager.start_fire_zone(Rect::new(0, 0, 2, 2), Duration::from_secs(60));
        let second = manager.start_fire_zone(Rect::new(5, 5, 2, 2), Duration::from_secs(60));
        assert_ne!(first, second);

        assert!(manager.remove_fire_zone(first));
        assert!(!manager.remove_fire_zone(first));
        assert_eq!(manager.zone_count(), 1);
    }

    #[test]
    fn calm_fire_never_ignites() {
        let config = FireConfig {
            spark_chance: 0.0,
            antispark_chance: 0.0,
            soft_spark_chance: 0.0,
            ..FireConfig::default()
        };
        let mut manager = FireManager::new(config);
        let mut rng = seeded_rng(2);
        let _ = manager.start_fire_zone(Rect::new(0, 0, 4, 4), Duration::from_millis(200));
        run(&mut manager, &mut rng, 2);
        assert_eq!(manager.intensity(SubCellCoord::new(3, 3)), 0.0);
        run(&mut manager, &mut rng, 10);
        assert_eq!(manager.zone_count(), 0);
    }
}
