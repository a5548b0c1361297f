//! Tuning surface resolved once per level and threaded through every engine.
//!
//! Each section implements [`Default`] with the shipped tuning and derives
//! [`Deserialize`] with `#[serde(default)]`, so a partial configuration file
//! only overrides the keys it names.

use serde::{Deserialize, Serialize};

/// Aggregated tuning knobs for the whole simulation core.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Dungeon aggregate tuning (searches, shadows).
    pub world: DungeonConfig,
    /// Light accumulation tuning.
    pub lighting: LightingConfig,
    /// Water ripple and shoal tuning.
    pub ripples: RippleConfig,
    /// Tree canopy painter tuning.
    pub canopy: CanopyConfig,
    /// Fire automaton tuning.
    pub fire: FireConfig,
    /// Spawn director tuning.
    pub director: DirectorConfig,
}

/// Dungeon aggregate parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    /// Number of nearest eligible spawn sources among which one is picked at random.
    pub spawn_source_candidates: usize,
    /// Direction pointing from the ground towards the sun, in sub-cells per step.
    pub sun_direction: [f32; 2],
    /// Height lost per sub-cell travelled by a shadow ray; lower values cast longer shadows.
    pub shadow_slope: f32,
    /// Shadow intensity gained per unit of shadow height.
    pub shadow_strength: f32,
    /// Upper clamp on per-sub-cell shadow intensity.
    pub max_shadow: f32,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            spawn_source_candidates: 3,
            sun_direction: [-1.0, -0.5],
            shadow_slope: 0.25,
            shadow_strength: 0.4,
            max_shadow: 0.8,
        }
    }
}

/// Light accumulation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Colour every light buffer is cleared to before accumulation.
    pub ambient: [f32; 3],
    /// Relative radius perturbation applied to randomized-radius lights.
    pub flicker_amplitude: f32,
    /// Noise samples per radian around a flickering light.
    pub flicker_frequency: f32,
    /// Speed at which the flicker pattern scrolls over time.
    pub flicker_speed: f32,
    /// Angular width (radians) blended on each side of the -π/π seam.
    pub wrap_blend: f32,
    /// Seed of the coherent noise generator.
    pub noise_seed: u32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient: [0.04, 0.04, 0.07],
            flicker_amplitude: 0.15,
            flicker_frequency: 3.0,
            flicker_speed: 4.0,
            wrap_blend: 0.35,
            noise_seed: 0x5eed,
        }
    }
}

/// Water ripple and shoal parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RippleConfig {
    /// Simulation steps per second, independent of the render frame rate.
    pub frequency: f32,
    /// Upper bound on simulation steps taken in a single frame.
    pub max_steps_per_frame: u32,
    /// Multiplicative damping applied to every height after each step.
    pub damping: f32,
    /// Height magnitude above which a zone stays active.
    pub activity_threshold: f32,
    /// Minimum zone edge length in cells worth simulating.
    pub min_zone_size: i32,
    /// Ground image displacement per unit of height gradient.
    pub refraction: f32,
    /// Amplitude of the noise shimmer added to the displacement.
    pub shimmer_amplitude: f32,
    /// Spatial frequency of the shimmer noise.
    pub shimmer_scale: f32,
    /// Temporal frequency of the shimmer noise.
    pub shimmer_speed: f32,
    /// Displacements larger than this (in sub-cells) are rejected as unstable.
    pub max_offset: f32,
    /// Seed of the shimmer noise generator.
    pub noise_seed: u32,
    /// Wet cells per fish when populating a shoal; zero disables shoals.
    pub cells_per_fish: u32,
    /// Shoal tuning.
    pub shoal: ShoalConfig,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            frequency: 30.0,
            max_steps_per_frame: 4,
            damping: 0.96,
            activity_threshold: 0.02,
            min_zone_size: 5,
            refraction: 0.6,
            shimmer_amplitude: 0.35,
            shimmer_scale: 0.2,
            shimmer_speed: 1.5,
            max_offset: 3.0,
            noise_seed: 0xbeef,
            cells_per_fish: 24,
            shoal: ShoalConfig::default(),
        }
    }
}

/// Schooling-fish parameters. Distances are in sub-cells, speeds in sub-cells per second.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoalConfig {
    /// Below this distance shoal members push each other apart.
    pub repel_distance: f32,
    /// Below this distance (and above `repel_distance`) members pull together.
    pub attract_distance: f32,
    /// Strength of the close-range repulsion.
    pub repel_strength: f32,
    /// Strength of the mid-range attraction.
    pub attract_strength: f32,
    /// Radius of influence of a scare point.
    pub scare_radius: f32,
    /// Repulsion strength of a fresh scare point.
    pub scare_strength: f32,
    /// Seconds before a scare point expires.
    pub scare_lifetime: f32,
    /// Calm speed envelope lower bound.
    pub min_speed: f32,
    /// Calm speed envelope upper bound.
    pub max_speed: f32,
    /// Scared speed envelope lower bound.
    pub scared_min_speed: f32,
    /// Scared speed envelope upper bound.
    pub scared_max_speed: f32,
}

impl Default for ShoalConfig {
    fn default() -> Self {
        Self {
            repel_distance: 1.5,
            attract_distance: 6.0,
            repel_strength: 3.0,
            attract_strength: 0.6,
            scare_radius: 8.0,
            scare_strength: 24.0,
            scare_lifetime: 2.0,
            min_speed: 0.3,
            max_speed: 3.0,
            scared_min_speed: 2.0,
            scared_max_speed: 4.0,
        }
    }
}

/// Tree canopy painter parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanopyConfig {
    /// Seed mixed with each tree position to derive its private RNG stream.
    pub seed: u64,
    /// Height over width of a display glyph; stretches canopies on non-square fonts.
    pub font_aspect: f32,
    /// Standard deviation of the per-pixel colour jitter.
    pub jitter: f32,
    /// Probability that a foliage pixel takes the species outlier colour.
    pub outlier_chance: f64,
    /// Distance (sub-cells) the canopy shadow is cast westward.
    pub shadow_offset: i32,
    /// Shadow height cast at the trunk.
    pub shadow_height: f32,
    /// Per-sub-cell decay of the cast shadow away from the trunk.
    pub shadow_decay: f32,
}

impl Default for CanopyConfig {
    fn default() -> Self {
        Self {
            seed: 0x7a11_5eed,
            font_aspect: 1.0,
            jitter: 10.0,
            outlier_chance: 0.04,
            shadow_offset: 2,
            shadow_height: 1.5,
            shadow_decay: 0.95,
        }
    }
}

/// Fire automaton parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireConfig {
    /// Automaton steps per second.
    pub frequency: f32,
    /// Upper bound on automaton steps taken in a single frame.
    pub max_steps_per_frame: u32,
    /// Per-sub-cell chance of a full-intensity spark each step.
    pub spark_chance: f64,
    /// Per-sub-cell chance of an antispark extinguishing a sub-cell each step.
    pub antispark_chance: f64,
    /// Per-sub-cell chance of a soft spark each step.
    pub soft_spark_chance: f64,
    /// Intensity added by a soft spark.
    pub soft_spark_amount: f32,
    /// Multiplier applied after smoothing; lower values cool faster.
    pub cooling: f32,
    /// Intensity below which a sub-cell counts as extinguished.
    pub extinguish_threshold: f32,
}

impl Default for FireConfig {
    fn default() -> Self {
        Self {
            frequency: 20.0,
            max_steps_per_frame: 4,
            spark_chance: 0.06,
            antispark_chance: 0.03,
            soft_spark_chance: 0.1,
            soft_spark_amount: 0.3,
            cooling: 0.9,
            extinguish_threshold: 0.01,
        }
    }
}

/// Spawn director parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Seconds for one full period of the tension wave.
    pub wave_length: f32,
    /// Wave position below which spawning is suppressed (calm).
    pub low_threshold: f32,
    /// Wave position separating medium from high pacing.
    pub medium_threshold: f32,
    /// Wave position above which a horde may start.
    pub horde_threshold: f32,
    /// Minimum seconds between two hordes.
    pub horde_delay: f32,
    /// Seconds between two spawns during a horde burst.
    pub horde_spawn_interval: f32,
    /// Live creature count at which spawning stops.
    pub creature_cap: usize,
    /// Spawns per minute at full wave position in the medium regime.
    pub medium_rate: f32,
    /// Spawns per minute at full wave position in the high regime.
    pub high_rate: f32,
    /// Low threshold once the boss has been seen.
    pub no_respite_low_threshold: f32,
    /// Medium threshold once the boss has been seen.
    pub no_respite_medium_threshold: f32,
    /// Smallest kill count between two health drops.
    pub item_drop_min: u32,
    /// Largest kill count between two health drops.
    pub item_drop_max: u32,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            wave_length: 180.0,
            low_threshold: 0.3,
            medium_threshold: 0.6,
            horde_threshold: 0.9,
            horde_delay: 120.0,
            horde_spawn_interval: 0.4,
            creature_cap: 30,
            medium_rate: 6.0,
            high_rate: 14.0,
            no_respite_low_threshold: 0.0,
            no_respite_medium_threshold: 0.35,
            item_drop_min: 6,
            item_drop_max: 12,
        }
    }
}
