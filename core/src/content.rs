//! Static content tables: terrain, items, creatures and tree species.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Color;

/// Table that a content name is resolved against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentCategory {
    /// Terrain types.
    Terrain,
    /// Item types.
    Item,
    /// Creature types.
    Creature,
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Terrain => "terrain",
            Self::Item => "item",
            Self::Creature => "creature",
        };
        f.write_str(label)
    }
}

/// Failure to resolve a content name.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ContentError {
    /// No entry in the table carries the requested name.
    #[error("unknown {category} type `{name}`")]
    Unknown {
        /// Table that was searched.
        category: ContentCategory,
        /// Name that failed to resolve.
        name: String,
    },
}

impl ContentError {
    fn unknown(category: ContentCategory, name: &str) -> Self {
        Self::Unknown {
            category,
            name: name.to_owned(),
        }
    }
}

/// Terrain classification of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Bare dungeon floor.
    #[default]
    Floor,
    /// Grass-covered ground.
    Grass,
    /// Solid rock wall.
    Wall,
    /// Wadeable water that ripples.
    ShallowWater,
    /// Deep water; only swimmers may enter.
    DeepWater,
    /// Stairs leading to the next level.
    Stairs,
    /// Pine tree trunk.
    PineTree,
    /// Oak tree trunk.
    OakTree,
    /// Apple tree trunk.
    AppleTree,
}

impl TerrainKind {
    /// Every terrain type in declaration order.
    pub const ALL: [TerrainKind; 9] = [
        Self::Floor,
        Self::Grass,
        Self::Wall,
        Self::ShallowWater,
        Self::DeepWater,
        Self::Stairs,
        Self::PineTree,
        Self::OakTree,
        Self::AppleTree,
    ];

    /// Reports whether land creatures may stand on the terrain.
    #[must_use]
    pub const fn walkable(self) -> bool {
        matches!(
            self,
            Self::Floor | Self::Grass | Self::ShallowWater | Self::Stairs
        )
    }

    /// Reports whether light and sight pass through the terrain.
    #[must_use]
    pub const fn transparent(self) -> bool {
        !matches!(
            self,
            Self::Wall | Self::PineTree | Self::OakTree | Self::AppleTree
        )
    }

    /// Reports whether the terrain takes part in the ripple simulation.
    #[must_use]
    pub const fn ripples(self) -> bool {
        matches!(self, Self::ShallowWater | Self::DeepWater)
    }

    /// Base movement cost of entering the terrain.
    #[must_use]
    pub const fn walk_cost(self) -> f32 {
        match self {
            Self::ShallowWater => 2.0,
            Self::DeepWater => 3.0,
            _ => 1.0,
        }
    }

    /// Standing height used when ray-marching terrain shadows.
    #[must_use]
    pub const fn height(self) -> f32 {
        match self {
            Self::Wall => 2.0,
            Self::ShallowWater => -0.1,
            Self::DeepWater => -0.3,
            _ => 0.0,
        }
    }

    /// Water depth indicator written into each sub-cell; zero means dry.
    #[must_use]
    pub const fn water_coefficient(self) -> f32 {
        match self {
            Self::ShallowWater => 0.5,
            Self::DeepWater => 1.0,
            _ => 0.0,
        }
    }

    /// Base ground colour painted under the terrain.
    #[must_use]
    pub const fn ground_color(self) -> Color {
        match self {
            Self::Floor => Color::from_rgb(86, 74, 62),
            Self::Grass => Color::from_rgb(48, 92, 36),
            Self::Wall => Color::from_rgb(64, 64, 72),
            Self::ShallowWater => Color::from_rgb(44, 78, 122),
            Self::DeepWater => Color::from_rgb(22, 42, 98),
            Self::Stairs => Color::from_rgb(140, 118, 92),
            Self::PineTree | Self::OakTree | Self::AppleTree => Color::from_rgb(58, 64, 34),
        }
    }

    /// Tree species growing on the cell, if the terrain is a tree.
    #[must_use]
    pub const fn tree_species(self) -> Option<TreeSpecies> {
        match self {
            Self::PineTree => Some(TreeSpecies::Pine),
            Self::OakTree => Some(TreeSpecies::Oak),
            Self::AppleTree => Some(TreeSpecies::Apple),
            _ => None,
        }
    }

    /// Glyph used by ASCII level blueprints.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Floor => '.',
            Self::Grass => ',',
            Self::Wall => '#',
            Self::ShallowWater => '~',
            Self::DeepWater => '=',
            Self::Stairs => '>',
            Self::PineTree => 'T',
            Self::OakTree => 'O',
            Self::AppleTree => 'A',
        }
    }

    /// Resolves a blueprint glyph.
    #[must_use]
    pub fn from_glyph(glyph: char) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.glyph() == glyph)
    }

    /// Stable name used in content data and save files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Grass => "grass",
            Self::Wall => "wall",
            Self::ShallowWater => "shallow_water",
            Self::DeepWater => "deep_water",
            Self::Stairs => "stairs",
            Self::PineTree => "pine_tree",
            Self::OakTree => "oak_tree",
            Self::AppleTree => "apple_tree",
        }
    }

    /// Resolves a terrain name.
    pub fn from_name(name: &str) -> Result<Self, ContentError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ContentError::unknown(ContentCategory::Terrain, name))
    }
}

/// Tree species painted into the canopy overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeSpecies {
    /// Narrow dark conifer.
    Pine,
    /// Broad deciduous tree.
    Oak,
    /// Fruit tree with the occasional apple showing through the leaves.
    Apple,
}

impl TreeSpecies {
    /// Base foliage colour.
    #[must_use]
    pub const fn foliage(self) -> Color {
        match self {
            Self::Pine => Color::from_rgb(24, 72, 40),
            Self::Oak => Color::from_rgb(52, 104, 30),
            Self::Apple => Color::from_rgb(64, 116, 38),
        }
    }

    /// Per-species `[r, g, b]` bias added on top of the random jitter.
    #[must_use]
    pub const fn color_bias(self) -> [f32; 3] {
        match self {
            Self::Pine => [-4.0, 0.0, 6.0],
            Self::Oak => [6.0, 4.0, -4.0],
            Self::Apple => [0.0, 8.0, 0.0],
        }
    }

    /// Rare outlier colour, such as a ripe apple.
    #[must_use]
    pub const fn outlier(self) -> Option<Color> {
        match self {
            Self::Apple => Some(Color::from_rgb(214, 112, 24)),
            Self::Oak => Some(Color::from_rgb(120, 104, 36)),
            Self::Pine => None,
        }
    }

    /// Canopy radius in sub-cells.
    #[must_use]
    pub const fn radius(self) -> i32 {
        match self {
            Self::Pine => 2,
            Self::Oak => 4,
            Self::Apple => 3,
        }
    }
}

/// Item types that may lie on the ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Restores player health; dropped by the director.
    HealthPotion,
    /// Readable scroll.
    Scroll,
    /// Portable light source.
    Torch,
    /// Barrel; blocks movement but not sight.
    Barrel,
    /// Crate; blocks movement and sight.
    Crate,
}

impl ItemKind {
    /// Every item type in declaration order.
    pub const ALL: [ItemKind; 5] = [
        Self::HealthPotion,
        Self::Scroll,
        Self::Torch,
        Self::Barrel,
        Self::Crate,
    ];

    /// Reports whether creatures may share the cell with the item.
    #[must_use]
    pub const fn walkable(self) -> bool {
        !matches!(self, Self::Barrel | Self::Crate)
    }

    /// Reports whether sight passes through the item.
    #[must_use]
    pub const fn transparent(self) -> bool {
        !matches!(self, Self::Crate)
    }

    /// Stable name used in content data and save files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HealthPotion => "health_potion",
            Self::Scroll => "scroll",
            Self::Torch => "torch",
            Self::Barrel => "barrel",
            Self::Crate => "crate",
        }
    }

    /// Resolves an item name.
    pub fn from_name(name: &str) -> Result<Self, ContentError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ContentError::unknown(ContentCategory::Item, name))
    }
}

/// Creature types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreatureKind {
    /// Small fast vermin.
    Rat,
    /// Slow shambler that avoids water.
    Zombie,
    /// Standard melee creature.
    Ghoul,
    /// Aquatic creature confined to water.
    Eel,
    /// Level boss.
    Boss,
}

impl CreatureKind {
    /// Every creature type in declaration order.
    pub const ALL: [CreatureKind; 5] = [
        Self::Rat,
        Self::Zombie,
        Self::Ghoul,
        Self::Eel,
        Self::Boss,
    ];

    /// Movement strategy used by the creature's AI.
    #[must_use]
    pub const fn walk_pattern(self) -> WalkPattern {
        match self {
            Self::Rat | Self::Ghoul => WalkPattern::Default,
            Self::Zombie | Self::Boss => WalkPattern::AvoidWater,
            Self::Eel => WalkPattern::WaterOnly,
        }
    }

    /// Reports whether the creature is the level boss.
    #[must_use]
    pub const fn is_boss(self) -> bool {
        matches!(self, Self::Boss)
    }

    /// Stable name used in content data and save files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rat => "rat",
            Self::Zombie => "zombie",
            Self::Ghoul => "ghoul",
            Self::Eel => "eel",
            Self::Boss => "boss",
        }
    }

    /// Resolves a creature name.
    pub fn from_name(name: &str) -> Result<Self, ContentError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ContentError::unknown(ContentCategory::Creature, name))
    }
}

/// Closed set of walk-cost strategies used by creature AI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WalkPattern {
    /// Any walkable terrain at its base cost.
    Default,
    /// Walkable terrain that does not ripple.
    AvoidWater,
    /// Rippling terrain only.
    WaterOnly,
}

impl WalkPattern {
    /// Cost of entering a cell with the given terrain, or `None` when forbidden.
    #[must_use]
    pub fn walk_cost(self, terrain: TerrainKind) -> Option<f32> {
        let allowed = match self {
            Self::Default => terrain.walkable(),
            Self::AvoidWater => terrain.walkable() && !terrain.ripples(),
            Self::WaterOnly => terrain.ripples(),
        };
        allowed.then(|| terrain.walk_cost())
    }
}
