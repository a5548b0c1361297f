//! Display colours and extended-range light colours.

use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

/// 8-bit RGB colour used for ground, canopy and tone-mapped images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl Color {
    /// Pure black; also the "no canopy" marker in canopy images.
    pub const BLACK: Color = Color::from_rgb(0, 0, 0);
    /// Pure white.
    pub const WHITE: Color = Color::from_rgb(255, 255, 255);

    /// Creates a new colour from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the colour.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the colour.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the colour.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Reports whether every channel is zero.
    #[must_use]
    pub const fn is_black(&self) -> bool {
        self.red == 0 && self.green == 0 && self.blue == 0
    }

    /// Linear interpolation between two colours, `t` clamped to `0..=1`.
    #[must_use]
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| channel(f32::from(a) + (f32::from(b) - f32::from(a)) * t);
        Color::from_rgb(
            mix(self.red, other.red),
            mix(self.green, other.green),
            mix(self.blue, other.blue),
        )
    }

    /// Multiplies every channel by `factor`, saturating at the display range.
    #[must_use]
    pub fn scale(self, factor: f32) -> Color {
        Color::from_rgb(
            channel(f32::from(self.red) * factor),
            channel(f32::from(self.green) * factor),
            channel(f32::from(self.blue) * factor),
        )
    }

    /// Adds signed per-channel offsets, saturating at the display range.
    #[must_use]
    pub fn offset(self, red: f32, green: f32, blue: f32) -> Color {
        Color::from_rgb(
            channel(f32::from(self.red) + red),
            channel(f32::from(self.green) + green),
            channel(f32::from(self.blue) + blue),
        )
    }

    /// Modulates the colour by an extended-range light value.
    #[must_use]
    pub fn lit_by(self, light: HdrColor) -> Color {
        Color::from_rgb(
            channel(f32::from(self.red) * light.red),
            channel(f32::from(self.green) * light.green),
            channel(f32::from(self.blue) * light.blue),
        )
    }
}

fn channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Extended-range RGB colour used for light accumulation.
///
/// Channels are expressed relative to display white (`1.0`) and may exceed it
/// before tone mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HdrColor {
    /// Red channel.
    pub red: f32,
    /// Green channel.
    pub green: f32,
    /// Blue channel.
    pub blue: f32,
}

impl HdrColor {
    /// Zero light.
    pub const BLACK: HdrColor = HdrColor::new(0.0, 0.0, 0.0);

    /// Creates a new extended-range colour.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32) -> Self {
        Self { red, green, blue }
    }

    /// Builds an extended-range colour from a `[r, g, b]` triple.
    #[must_use]
    pub const fn from_array(rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }

    /// Returns the colour multiplied by a scalar.
    #[must_use]
    pub fn scaled(self, factor: f32) -> HdrColor {
        HdrColor::new(self.red * factor, self.green * factor, self.blue * factor)
    }

    /// Linear interpolation between two colours, `t` clamped to `0..=1`.
    #[must_use]
    pub fn lerp(self, other: HdrColor, t: f32) -> HdrColor {
        let t = t.clamp(0.0, 1.0);
        HdrColor::new(
            self.red + (other.red - self.red) * t,
            self.green + (other.green - self.green) * t,
            self.blue + (other.blue - self.blue) * t,
        )
    }

    /// Largest channel value.
    #[must_use]
    pub fn max_channel(&self) -> f32 {
        self.red.max(self.green).max(self.blue)
    }

    /// Clamps the colour into the display range.
    #[must_use]
    pub fn tone_map(self) -> Color {
        Color::from_rgb(
            channel(self.red * 255.0),
            channel(self.green * 255.0),
            channel(self.blue * 255.0),
        )
    }
}

impl From<Color> for HdrColor {
    fn from(color: Color) -> Self {
        HdrColor::new(
            f32::from(color.red) / 255.0,
            f32::from(color.green) / 255.0,
            f32::from(color.blue) / 255.0,
        )
    }
}

impl Add for HdrColor {
    type Output = HdrColor;

    fn add(self, rhs: HdrColor) -> HdrColor {
        HdrColor::new(
            self.red + rhs.red,
            self.green + rhs.green,
            self.blue + rhs.blue,
        )
    }
}

impl AddAssign for HdrColor {
    fn add_assign(&mut self, rhs: HdrColor) {
        self.red += rhs.red;
        self.green += rhs.green;
        self.blue += rhs.blue;
    }
}

impl Mul<f32> for HdrColor {
    type Output = HdrColor;

    fn mul(self, rhs: f32) -> HdrColor {
        self.scaled(rhs)
    }
}
