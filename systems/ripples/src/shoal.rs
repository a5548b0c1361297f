//! Schooling fish living inside a water zone.

use std::f32::consts::TAU;

use emberfall_core::{config::ShoalConfig, Position, SimRng, SubCellCoord, SUB_CELLS_PER_CELL};
use glam::Vec2;
use rand::{seq::SliceRandom, Rng};
use rand_distr::StandardNormal;

/// Distances below this are treated as this for the inverse-square terms.
const MIN_DISTANCE: f32 = 0.25;
/// Standard deviation of the placement jitter around a wet sub-cell centre.
const PLACEMENT_JITTER: f32 = 0.3;

/// One fish. Coordinates are in sub-cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fish {
    position: Vec2,
    velocity: Vec2,
}

impl Fish {
    /// Location in cell units.
    #[must_use]
    pub fn position(&self) -> Position {
        Position::from_vec(self.position / SUB_CELLS_PER_CELL as f32)
    }

    /// Velocity in sub-cells per second.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ScarePoint {
    position: Vec2,
    age: f32,
}

/// Fish population of one zone plus the scare points currently repelling it.
#[derive(Clone, Debug, PartialEq)]
pub struct Shoal {
    config: ShoalConfig,
    fish: Vec<Fish>,
    scares: Vec<ScarePoint>,
}

impl Shoal {
    /// Scatters `count` fish over the wet sub-cells.
    pub(crate) fn populate(
        config: ShoalConfig,
        count: usize,
        wet: &[SubCellCoord],
        rng: &mut SimRng,
    ) -> Self {
        let mut fish = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(home) = wet.choose(rng) else {
                break;
            };
            let centre = Vec2::new(home.x() as f32 + 0.5, home.y() as f32 + 0.5);
            let jitter = Vec2::new(rng.sample(StandardNormal), rng.sample(StandardNormal));
            let jittered = centre + jitter * PLACEMENT_JITTER;
            let position = if sub_cell_of(jittered) == *home {
                jittered
            } else {
                centre
            };
            let heading = Vec2::from_angle(rng.gen_range(0.0..TAU));
            fish.push(Fish {
                position,
                velocity: heading * config.min_speed,
            });
        }
        Self {
            config,
            fish,
            scares: Vec::new(),
        }
    }

    /// Fish in the shoal.
    #[must_use]
    pub fn fish(&self) -> &[Fish] {
        &self.fish
    }

    /// Number of scare points still influencing the shoal.
    #[must_use]
    pub fn scare_count(&self) -> usize {
        self.scares.len()
    }

    /// Adds a scare point at a sub-cell position.
    pub(crate) fn scare(&mut self, position: Vec2) {
        self.scares.push(ScarePoint { position, age: 0.0 });
    }

    /// Advances the shoal by `dt` seconds. Fish never leave wet sub-cells.
    pub(crate) fn step(&mut self, dt: f32, is_wet: impl Fn(SubCellCoord) -> bool) {
        let config = &self.config;
        let forces: Vec<(Vec2, bool)> = self
            .fish
            .iter()
            .enumerate()
            .map(|(index, fish)| {
                let mut force = Vec2::ZERO;
                for (other_index, other) in self.fish.iter().enumerate() {
                    if other_index == index {
                        continue;
                    }
                    let offset = other.position - fish.position;
                    let distance = offset.length().max(MIN_DISTANCE);
                    let direction = offset.normalize_or_zero();
                    if distance < config.repel_distance {
                        force -= direction * config.repel_strength / (distance * distance);
                    } else if distance < config.attract_distance {
                        force += direction * config.attract_strength / (distance * distance);
                    }
                }

                let mut scared = false;
                for scare in &self.scares {
                    let offset = fish.position - scare.position;
                    let distance = offset.length();
                    if distance >= config.scare_radius {
                        continue;
                    }
                    let freshness = (1.0 - scare.age / config.scare_lifetime).max(0.0);
                    let proximity = 1.0 - distance / config.scare_radius;
                    force += offset.normalize_or_zero()
                        * config.scare_strength
                        * freshness
                        * proximity;
                    scared = true;
                }
                (force, scared)
            })
            .collect();

        for (fish, (force, scared)) in self.fish.iter_mut().zip(forces) {
            let (min_speed, max_speed) = if scared {
                (config.scared_min_speed, config.scared_max_speed)
            } else {
                (config.min_speed, config.max_speed)
            };
            let velocity = fish.velocity + force * dt;
            fish.velocity = if velocity == Vec2::ZERO {
                velocity
            } else {
                velocity.clamp_length(min_speed, max_speed)
            };

            let next = fish.position + fish.velocity * dt;
            if is_wet(sub_cell_of(next)) {
                fish.position = next;
            } else {
                fish.velocity = -fish.velocity;
            }
        }

        for scare in &mut self.scares {
            scare.age += dt;
        }
        let lifetime = self.config.scare_lifetime;
        self.scares.retain(|scare| scare.age < lifetime);
    }
}

fn sub_cell_of(position: Vec2) -> SubCellCoord {
    SubCellCoord::new(position.x.floor() as i32, position.y.floor() as i32)
}

#[cfg(test)]
mod tests {
    use emberfall_core::seeded_rng;

    use super::*;

    fn open_water(_: SubCellCoord) -> bool {
        true
    }

    fn pair(distance: f32) -> Shoal {
        Shoal {
            config: ShoalConfig::default(),
            fish: vec![
                Fish {
                    position: Vec2::new(10.0, 10.0),
                    velocity: Vec2::ZERO,
                },
                Fish {
                    position: Vec2::new(10.0 + distance, 10.0),
                    velocity: Vec2::ZERO,
                },
            ],
            scares: Vec::new(),
        }
    }

    fn gap(shoal: &Shoal) -> f32 {
        shoal.fish[0].position.distance(shoal.fish[1].position)
    }

    #[test]
    fn close_fish_push_apart_and_distant_fish_gather() {
        let mut close = pair(1.0);
        close.step(0.1, open_water);
        assert!(gap(&close) > 1.0);

        let mut apart = pair(4.0);
        apart.step(0.1, open_water);
        assert!(gap(&apart) < 4.0);
    }

    #[test]
    fn scared_fish_flee_faster_and_scares_expire() {
        let config = ShoalConfig::default();
        let mut shoal = Shoal {
            config: config.clone(),
            fish: vec![Fish {
                position: Vec2::new(5.0, 5.0),
                velocity: Vec2::new(0.5, 0.0),
            }],
            scares: Vec::new(),
        };
        shoal.scare(Vec2::new(4.0, 5.0));
        shoal.step(0.05, open_water);

        let fish = shoal.fish[0];
        assert!(fish.velocity.x > 0.0);
        assert!(fish.velocity.length() >= config.scared_min_speed - 1e-4);
        assert!(fish.velocity.length() <= config.scared_max_speed + 1e-4);

        let steps = (config.scare_lifetime / 0.05).ceil() as usize + 1;
        for _ in 0..steps {
            shoal.step(0.05, open_water);
        }
        assert_eq!(shoal.scare_count(), 0);
    }

    #[test]
    fn fish_bounce_off_dry_ground() {
        let mut shoal = Shoal {
            config: ShoalConfig::default(),
            fish: vec![Fish {
                position: Vec2::new(3.9, 3.5),
                velocity: Vec2::new(1.0, 0.0),
            }],
            scares: Vec::new(),
        };
        shoal.step(0.2, |sub_cell| sub_cell.x() < 4);
        assert_eq!(shoal.fish[0].position, Vec2::new(3.9, 3.5));
        assert!(shoal.fish[0].velocity.x < 0.0);
    }

    #[test]
    fn population_stays_on_wet_sub_cells() {
        let wet = [SubCellCoord::new(2, 2), SubCellCoord::new(7, 3)];
        let mut rng = seeded_rng(9);
        let shoal = Shoal::populate(ShoalConfig::default(), 12, &wet, &mut rng);
        assert_eq!(shoal.fish().len(), 12);
        for fish in shoal.fish() {
            assert!(wet.contains(&sub_cell_of(fish.position)));
        }
    }
}
