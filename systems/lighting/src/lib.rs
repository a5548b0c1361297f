#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Light accumulation engine.
//!
//! Every frame the light buffer is cleared to the ambient colour and each
//! light adds its contribution over the sub-cells it can see. Lights never
//! subtract, so overlapping lights accumulate.

use std::{collections::HashMap, f32::consts::PI, fmt};

use emberfall_core::{
    config::LightingConfig, FrameContext, HdrColor, Light, Rect, SubCellCoord, SUB_CELLS_PER_CELL,
};
use emberfall_world::{Dungeon, VisibilityMap};
use noise::{NoiseFn, Perlin};

mod buffer;
mod pattern;

pub use buffer::LightBuffer;
pub use pattern::{LightPattern, PatternError};

/// Accumulates dungeon lights into a [`LightBuffer`].
pub struct LightingEngine {
    config: LightingConfig,
    noise: Perlin,
    scratch: VisibilityMap,
    patterns: HashMap<String, Option<LightPattern>>,
}

impl fmt::Debug for LightingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LightingEngine")
            .field("config", &self.config)
            .field("patterns", &self.patterns.len())
            .finish_non_exhaustive()
    }
}

impl LightingEngine {
    /// Creates an engine with its own noise field.
    #[must_use]
    pub fn new(config: LightingConfig) -> Self {
        Self {
            noise: Perlin::new(config.noise_seed),
            config,
            scratch: VisibilityMap::new(0, 0),
            patterns: HashMap::new(),
        }
    }

    /// Tuning the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &LightingConfig {
        &self.config
    }

    /// Colour the buffer is cleared to before accumulation.
    #[must_use]
    pub fn ambient(&self) -> HdrColor {
        HdrColor::from_array(self.config.ambient)
    }

    /// Recomputes the buffer for the frame.
    ///
    /// The buffer is moved onto the viewport (clipped to the dungeon),
    /// cleared to ambient and every registered light is accumulated into it.
    pub fn update(&mut self, ctx: &FrameContext<'_>, dungeon: &Dungeon, buffer: &mut LightBuffer) {
        let window = ctx
            .viewport
            .scaled(SUB_CELLS_PER_CELL)
            .intersection(&dungeon.sub_cell_bounds())
            .unwrap_or_default();
        buffer.set_window(window);
        buffer.clear(self.ambient());

        let elapsed = ctx.elapsed_secs();
        for (_, light) in dungeon.lights() {
            let _ = self.accumulate(light, elapsed, dungeon, buffer);
        }
    }

    /// Adds one light's contribution to the buffer and returns how many
    /// sub-cells received light.
    ///
    /// Only sub-cells inside the light's own field of view, inside the
    /// dungeon's current field of view and strictly closer than the light's
    /// range are touched.
    pub fn accumulate(
        &mut self,
        light: &Light,
        elapsed: f32,
        dungeon: &Dungeon,
        buffer: &mut LightBuffer,
    ) -> usize {
        if light.range <= 0.0 {
            return 0;
        }
        let emission = self.emission(light, elapsed);
        if emission.max_channel() <= 0.0 {
            return 0;
        }

        let origin = light.position.sub_cell();
        let reach = (light.range * SUB_CELLS_PER_CELL as f32).ceil() as i32;
        let Some(region) =
            Rect::around(origin.x(), origin.y(), reach).intersection(&dungeon.sub_cell_bounds())
        else {
            return 0;
        };
        if !region.contains(origin.x(), origin.y()) {
            return 0;
        }
        let Some(lit) = region.intersection(&buffer.window()) else {
            return 0;
        };

        let map = dungeon.sub_cell_map();
        self.scratch.reset(region.width(), region.height());
        for (x, y) in region.iter() {
            self.scratch.set_properties(
                x - region.x(),
                y - region.y(),
                map.is_transparent(x, y),
                map.is_walkable(x, y),
            );
        }
        let local_bounds = self.scratch.bounds();
        self.scratch.compute_fov(
            origin.x() - region.x(),
            origin.y() - region.y(),
            reach,
            true,
            local_bounds,
        );

        let range_squared = light.range * light.range;
        let mut touched = 0;
        for (x, y) in lit.iter() {
            if !self.scratch.is_in_fov(x - region.x(), y - region.y()) || !map.is_in_fov(x, y) {
                continue;
            }
            let point = SubCellCoord::new(x, y);
            let sample = point.corner();
            let distance_squared = sample.distance_squared(light.position);
            if distance_squared >= range_squared {
                continue;
            }
            let radius_squared = if light.randomized_radius {
                let radius = self.flicker_radius(
                    light,
                    sample.x() - light.position.x(),
                    sample.y() - light.position.y(),
                    elapsed,
                );
                radius * radius
            } else {
                range_squared
            };
            let coefficient = 1.0 - (distance_squared / radius_squared).clamp(0.0, 1.0);
            if coefficient <= 0.0 {
                continue;
            }
            buffer.add(point, emission * coefficient);
            touched += 1;
        }
        touched
    }

    /// Colour at full falloff, after intensity and pattern.
    fn emission(&mut self, light: &Light, elapsed: f32) -> HdrColor {
        let Some(extended) = &light.extended else {
            return light.color * light.intensity;
        };
        let offset = position_offset(light);
        let Self {
            noise, patterns, ..
        } = self;
        let pattern = patterns
            .entry(extended.pattern.clone())
            .or_insert_with(|| match LightPattern::parse(&extended.pattern) {
                Ok(pattern) => Some(pattern),
                Err(error) => {
                    log::warn!("light pattern {:?} ignored: {error}", extended.pattern);
                    None
                }
            });
        let level = pattern
            .as_ref()
            .map_or(1.0, |pattern| pattern.level(elapsed, extended.period, noise, offset));
        light.color.lerp(extended.peak_color, level) * (light.intensity * level)
    }

    /// Falloff radius in the direction `(dx, dy)`, never above the range.
    fn flicker_radius(&self, light: &Light, dx: f32, dy: f32, elapsed: f32) -> f32 {
        let angle = dy.atan2(dx);
        let time = f64::from(elapsed * self.config.flicker_speed) + position_offset(light);
        let sample = |theta: f32| -> f32 {
            self.noise
                .get([f64::from(theta * self.config.flicker_frequency), time]) as f32
        };

        let blend = self.config.wrap_blend.max(f32::EPSILON);
        let mut value = sample(angle);
        if angle > PI - blend {
            let weight = 0.5 * (angle - (PI - blend)) / blend;
            value += (sample(angle - 2.0 * PI) - value) * weight;
        } else if angle < -PI + blend {
            let weight = 0.5 * ((-PI + blend) - angle) / blend;
            value += (sample(angle + 2.0 * PI) - value) * weight;
        }

        let shrink = self.config.flicker_amplitude * (0.5 + 0.5 * value.clamp(-1.0, 1.0));
        light.range * (1.0 - shrink).max(0.0)
    }
}

/// Noise-field offset derived from where the light sits, so identical
/// lights flicker identically and distinct lights decorrelate.
fn position_offset(light: &Light) -> f64 {
    f64::from(light.position.x()) * 7.13 + f64::from(light.position.y()) * 3.37
}
