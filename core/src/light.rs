//! Light source descriptors stored by the dungeon and consumed by the lighting engine.

use serde::{Deserialize, Serialize};

use crate::{HdrColor, Position};

/// Point light contributing additively to the light buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// Location of the light in cell units.
    pub position: Position,
    /// Radius of influence in cells; contribution is zero at and beyond it.
    pub range: f32,
    /// Extended-range colour at full intensity.
    pub color: HdrColor,
    /// Constant intensity multiplier.
    pub intensity: f32,
    /// Perturbs the falloff radius per angle with coherent noise (torch flicker).
    pub randomized_radius: bool,
    /// Time-varying behaviour for extended lights.
    pub extended: Option<ExtendedLight>,
}

impl Light {
    /// Creates a steady point light with unit intensity.
    #[must_use]
    pub fn point(position: Position, range: f32, color: HdrColor) -> Self {
        Self {
            position,
            range,
            color,
            intensity: 1.0,
            randomized_radius: false,
            extended: None,
        }
    }

    /// Enables per-angle radius flicker.
    #[must_use]
    pub fn with_randomized_radius(mut self) -> Self {
        self.randomized_radius = true;
        self
    }

    /// Overrides the constant intensity multiplier.
    #[must_use]
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Attaches a time-varying pattern.
    #[must_use]
    pub fn with_pattern(mut self, extended: ExtendedLight) -> Self {
        self.extended = Some(extended);
        self
    }
}

/// Time-varying intensity and colour for extended lights such as a heal glow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtendedLight {
    /// Pattern string: digits `0`-`9` form a repeating intensity sequence,
    /// a leading `~` selects noise-driven intensity.
    pub pattern: String,
    /// Seconds for one full loop of the pattern.
    pub period: f32,
    /// Colour reached at full pattern intensity.
    pub peak_color: HdrColor,
}
