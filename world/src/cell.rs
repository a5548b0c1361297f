//! Per-cell and per-sub-cell records stored by the dungeon.

use emberfall_core::{Color, ItemId, ItemKind, TerrainKind};
use serde::{Deserialize, Serialize};

/// Coarse-resolution terrain record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    terrain: TerrainKind,
    creatures: u16,
    items: Vec<StackedItem>,
    has_corpse: bool,
    remembered: bool,
}

impl Cell {
    pub(crate) fn with_terrain(terrain: TerrainKind) -> Self {
        Self {
            terrain,
            ..Self::default()
        }
    }

    /// Terrain classification of the cell.
    #[must_use]
    pub const fn terrain(&self) -> TerrainKind {
        self.terrain
    }

    /// Number of creatures standing on the cell.
    #[must_use]
    pub const fn creature_count(&self) -> u16 {
        self.creatures
    }

    /// Items lying on the cell, bottom of the stack first.
    #[must_use]
    pub fn items(&self) -> &[StackedItem] {
        &self.items
    }

    /// Reports whether a corpse lies on the cell.
    #[must_use]
    pub const fn has_corpse(&self) -> bool {
        self.has_corpse
    }

    /// Reports whether the player has seen the cell.
    #[must_use]
    pub const fn is_remembered(&self) -> bool {
        self.remembered
    }

    /// Walkability as the conjunction of the terrain and every stacked item.
    #[must_use]
    pub fn walkable(&self) -> bool {
        self.terrain.walkable() && self.items.iter().all(|item| item.kind.walkable())
    }

    /// Transparency as the conjunction of the terrain and every stacked item.
    #[must_use]
    pub fn transparent(&self) -> bool {
        self.terrain.transparent() && self.items.iter().all(|item| item.kind.transparent())
    }

    pub(crate) fn set_terrain(&mut self, terrain: TerrainKind) {
        self.terrain = terrain;
    }

    pub(crate) fn occupy(&mut self) {
        self.creatures = self.creatures.saturating_add(1);
    }

    pub(crate) fn vacate(&mut self) {
        debug_assert!(self.creatures > 0, "creature occupancy underflow");
        self.creatures = self.creatures.saturating_sub(1);
    }

    pub(crate) fn push_item(&mut self, item: StackedItem) {
        self.items.push(item);
    }

    pub(crate) fn take_item(&mut self, id: ItemId) -> Option<StackedItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    pub(crate) fn set_corpse(&mut self, present: bool) {
        self.has_corpse = present;
    }

    pub(crate) fn set_remembered(&mut self, remembered: bool) {
        self.remembered = remembered;
    }
}

/// Entry of a cell's item stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackedItem {
    /// Identifier of the item.
    pub id: ItemId,
    /// Type of the item.
    pub kind: ItemKind,
}

/// Fine-resolution visual and physical attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubCell {
    /// Ground colour shown when nothing covers the sub-cell.
    pub ground: Color,
    /// Smoothed shadow intensity in `0..=1`.
    pub shadow: f32,
    /// Water depth indicator; zero means dry.
    pub water: f32,
}

impl SubCell {
    pub(crate) fn for_terrain(terrain: TerrainKind) -> Self {
        Self {
            ground: terrain.ground_color(),
            shadow: 0.0,
            water: terrain.water_coefficient(),
        }
    }

    /// Reports whether the sub-cell takes part in the ripple simulation.
    #[must_use]
    pub fn is_wet(&self) -> bool {
        self.water > 0.0
    }
}
