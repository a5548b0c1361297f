#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Emberfall simulation.
//!
//! This crate defines the primitives every other layer speaks: positions and
//! grid coordinates at both resolutions, rectangles, colours, the static
//! content tables and the tuning surface. It also defines the narrow message
//! surface between the spawn director and the dungeon: the director emits
//! [`Command`] values, the dungeon executes them through its `apply` entry
//! point and reports back with [`Event`] values.

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

mod color;
pub mod config;
mod content;
mod geometry;
mod light;

pub use color::{Color, HdrColor};
pub use content::{
    ContentCategory, ContentError, CreatureKind, ItemKind, TerrainKind, TreeSpecies, WalkPattern,
};
pub use geometry::{CellCoord, Position, Rect, SubCellCoord, SUB_CELLS_PER_CELL};
pub use light::{ExtendedLight, Light};

/// Random number generator threaded through every update call.
pub type SimRng = ChaCha8Rng;

/// Creates a deterministic simulation RNG from a seed.
#[must_use]
pub fn seeded_rng(seed: u64) -> SimRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Per-frame context passed into every engine update.
#[derive(Debug)]
pub struct FrameContext<'a> {
    /// Simulated time elapsed since the previous frame.
    pub dt: Duration,
    /// Simulated time elapsed since the level started.
    pub elapsed: Duration,
    /// Cells currently visible on screen; windowed work is restricted to it.
    pub viewport: Rect,
    /// Random number source for this frame.
    pub rng: &'a mut SimRng,
}

impl<'a> FrameContext<'a> {
    /// Creates a new frame context.
    #[must_use]
    pub fn new(dt: Duration, elapsed: Duration, viewport: Rect, rng: &'a mut SimRng) -> Self {
        Self {
            dt,
            elapsed,
            viewport,
            rng,
        }
    }

    /// Frame delta in seconds.
    #[must_use]
    pub fn dt_secs(&self) -> f32 {
        self.dt.as_secs_f32()
    }

    /// Level time in seconds.
    #[must_use]
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

/// Unique identifier assigned to a creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CreatureId(u32);

impl CreatureId {
    /// Creates a new creature identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a light.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LightId(u32);

impl LightId {
    /// Creates a new light identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a fire zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FireZoneId(u32);

impl FireZoneId {
    /// Creates a new fire zone identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Mutations requested by the director and executed by the dungeon.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Introduces a creature through the spawn source closest to `near`.
    SpawnCreature {
        /// Type of creature to introduce.
        kind: CreatureKind,
        /// Point the spawn source is ranked against, usually the player.
        near: CellCoord,
    },
    /// Drops an item on the closest free walkable cell to `cell`.
    DropItem {
        /// Type of item to drop.
        kind: ItemKind,
        /// Requested drop location.
        cell: CellCoord,
    },
}

/// Outcomes reported by the dungeon after executing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a creature entered the dungeon.
    CreatureSpawned {
        /// Identifier assigned to the new creature.
        creature: CreatureId,
        /// Type of the new creature.
        kind: CreatureKind,
        /// Cell the creature occupies.
        cell: CellCoord,
    },
    /// Reports that no eligible spawn source or free cell was found.
    SpawnFailed {
        /// Type of creature that could not be introduced.
        kind: CreatureKind,
    },
    /// Confirms that an item was dropped.
    ItemDropped {
        /// Identifier assigned to the item.
        item: ItemId,
        /// Type of the dropped item.
        kind: ItemKind,
        /// Cell the item landed on.
        cell: CellCoord,
    },
}

#[cfg(test)]
mod tests {
    use super::{seeded_rng, CreatureId, ItemId};
    use rand::Rng;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn identifiers_round_trip_through_bincode() {
        assert_round_trip(&CreatureId::new(42));
        assert_round_trip(&ItemId::new(7));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let mut first = seeded_rng(0x1234);
        let mut second = seeded_rng(0x1234);
        let a: [u32; 4] = first.gen();
        let b: [u32; 4] = second.gen();
        assert_eq!(a, b);
    }
}
