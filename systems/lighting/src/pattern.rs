//! Time-varying intensity patterns for extended lights.

use noise::{NoiseFn, Perlin};
use thiserror::Error;

/// Rate at which noise-driven patterns scroll through the noise field, per period.
const NOISE_STEPS_PER_PERIOD: f64 = 4.0;

/// Failure to interpret a pattern string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    /// The pattern contains no levels.
    #[error("light pattern is empty")]
    Empty,
    /// A character other than a digit appeared where a level was expected.
    #[error("unexpected {found:?} at offset {offset} in light pattern")]
    InvalidCharacter {
        /// Offending character.
        found: char,
        /// Byte offset of the character.
        offset: usize,
    },
    /// A noise pattern carried something other than zero or two bound digits.
    #[error("noise pattern bounds must be two digits, found {0} characters")]
    NoiseBounds(usize),
}

/// Parsed pattern string.
///
/// `"0369"` ramps through the levels 0, 1/3, 2/3 and 1 and loops. A leading
/// `~` selects noise: `"~"` spans the full range, `"~48"` keeps the level
/// between 0.4 and 0.8.
#[derive(Clone, Debug, PartialEq)]
pub enum LightPattern {
    /// Repeating sequence of levels in `0.0..=1.0`, linearly interpolated.
    Sequence(Vec<f32>),
    /// Coherent noise remapped into `low..=high`.
    Noise {
        /// Level at the noise minimum.
        low: f32,
        /// Level at the noise maximum.
        high: f32,
    },
}

impl LightPattern {
    /// Parses a pattern string.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        if let Some(bounds) = text.strip_prefix('~') {
            let levels = digits(bounds, 1)?;
            return match levels.as_slice() {
                [] => Ok(Self::Noise {
                    low: 0.0,
                    high: 1.0,
                }),
                [low, high] => Ok(Self::Noise {
                    low: *low,
                    high: *high,
                }),
                other => Err(PatternError::NoiseBounds(other.len())),
            };
        }

        let levels = digits(text, 0)?;
        if levels.is_empty() {
            return Err(PatternError::Empty);
        }
        Ok(Self::Sequence(levels))
    }

    /// Level of the pattern `elapsed` seconds into a loop of `period` seconds.
    ///
    /// A non-positive period freezes the pattern at its starting level.
    /// `offset` decorrelates noise patterns of different lights.
    #[must_use]
    pub fn level(&self, elapsed: f32, period: f32, noise: &Perlin, offset: f64) -> f32 {
        let cycles = if period > 0.0 { elapsed / period } else { 0.0 };
        match self {
            Self::Sequence(levels) if levels.is_empty() => 1.0,
            Self::Sequence(levels) => {
                let position = cycles.rem_euclid(1.0) * levels.len() as f32;
                let index = (position.floor() as usize).min(levels.len() - 1);
                let next = levels[(index + 1) % levels.len()];
                let t = position - index as f32;
                levels[index] + (next - levels[index]) * t
            }
            Self::Noise { low, high } => {
                let sample = noise.get([f64::from(cycles) * NOISE_STEPS_PER_PERIOD, offset]);
                let t = (0.5 + 0.5 * sample as f32).clamp(0.0, 1.0);
                low + (high - low) * t
            }
        }
    }
}

fn digits(text: &str, base_offset: usize) -> Result<Vec<f32>, PatternError> {
    text.char_indices()
        .map(|(offset, found)| {
            found
                .to_digit(10)
                .map(|digit| digit as f32 / 9.0)
                .ok_or(PatternError::InvalidCharacter {
                    found,
                    offset: base_offset + offset,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_map_onto_unit_levels() {
        assert_eq!(
            LightPattern::parse("09"),
            Ok(LightPattern::Sequence(vec![0.0, 1.0]))
        );
        assert_eq!(
            LightPattern::parse("~36"),
            Ok(LightPattern::Noise {
                low: 3.0 / 9.0,
                high: 6.0 / 9.0
            })
        );
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        assert_eq!(LightPattern::parse(""), Err(PatternError::Empty));
        assert_eq!(
            LightPattern::parse("12x"),
            Err(PatternError::InvalidCharacter {
                found: 'x',
                offset: 2
            })
        );
        assert_eq!(
            LightPattern::parse("~5"),
            Err(PatternError::NoiseBounds(1))
        );
    }

    #[test]
    fn sequence_interpolates_and_loops() {
        let noise = Perlin::new(1);
        let pattern = LightPattern::Sequence(vec![0.0, 1.0]);
        assert_eq!(pattern.level(0.0, 2.0, &noise, 0.0), 0.0);
        assert!((pattern.level(0.5, 2.0, &noise, 0.0) - 0.5).abs() < 1e-6);
        assert!((pattern.level(1.0, 2.0, &noise, 0.0) - 1.0).abs() < 1e-6);
        assert!((pattern.level(2.5, 2.0, &noise, 0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn frozen_period_holds_first_level() {
        let noise = Perlin::new(1);
        let pattern = LightPattern::Sequence(vec![0.4, 0.9]);
        assert_eq!(pattern.level(17.0, 0.0, &noise, 0.0), 0.4);
    }

    #[test]
    fn noise_stays_within_bounds() {
        let noise = Perlin::new(7);
        let pattern = LightPattern::Noise {
            low: 0.25,
            high: 0.75,
        };
        for step in 0..200 {
            let level = pattern.level(step as f32 * 0.05, 1.0, &noise, 3.5);
            assert!((0.25..=0.75).contains(&level), "level {level} out of bounds");
        }
    }
}
