//! ASCII level blueprints used to build dungeons.

use emberfall_core::{
    config::DungeonConfig, CellCoord, CreatureKind, HdrColor, ItemKind, Light, Position,
    TerrainKind,
};
use thiserror::Error;

use crate::Dungeon;

const SPAWN_GLYPH: char = 'S';
const PLAYER_GLYPH: char = '@';
const TORCH_RANGE: f32 = 6.0;
const TORCH_COLOR: HdrColor = HdrColor::new(1.4, 0.9, 0.45);

/// Failure to parse a level blueprint.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BlueprintError {
    /// The blueprint contains no terrain rows.
    #[error("blueprint contains no terrain rows")]
    Empty,
    /// A terrain row differs in width from the first row.
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A terrain row contains a glyph no terrain uses.
    #[error("unknown terrain glyph `{glyph}` at ({x}, {y})")]
    UnknownGlyph {
        /// Offending glyph.
        glyph: char,
        /// Column of the glyph.
        x: i32,
        /// Row of the glyph.
        y: i32,
    },
    /// A placement line is not of the form `name x y`.
    #[error("malformed placement line `{0}`")]
    MalformedPlacement(String),
}

/// Named object placed on a blueprint cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Placement name: `creature:<kind>`, `item:<kind>`, `light` or `spawn`.
    pub name: String,
    /// Target cell.
    pub cell: CellCoord,
}

/// Parsed level layout ready to be built into a [`Dungeon`].
///
/// The text format is a rectangle of terrain glyphs, optionally followed by
/// a blank line and one placement per line (`creature:zombie 4 7`). The glyph
/// `S` marks floor carrying a spawn source and `@` marks the player start.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelBlueprint {
    width: i32,
    height: i32,
    terrain: Vec<TerrainKind>,
    spawn_sources: Vec<CellCoord>,
    player_start: Option<CellCoord>,
    placements: Vec<Placement>,
}

impl LevelBlueprint {
    /// Parses a blueprint from its text form.
    pub fn parse(text: &str) -> Result<Self, BlueprintError> {
        let mut lines = text.lines().map(str::trim_end);
        let rows: Vec<&str> = lines
            .by_ref()
            .skip_while(|line| line.is_empty())
            .take_while(|line| !line.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(BlueprintError::Empty);
        };
        let expected = first.chars().count();

        let mut terrain = Vec::with_capacity(expected * rows.len());
        let mut spawn_sources = Vec::new();
        let mut player_start = None;
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != expected {
                return Err(BlueprintError::Ragged {
                    row,
                    expected,
                    found,
                });
            }
            for (column, glyph) in line.chars().enumerate() {
                let cell = CellCoord::new(column as i32, row as i32);
                let kind = match glyph {
                    SPAWN_GLYPH => {
                        spawn_sources.push(cell);
                        TerrainKind::Floor
                    }
                    PLAYER_GLYPH => {
                        player_start = Some(cell);
                        TerrainKind::Floor
                    }
                    other => TerrainKind::from_glyph(other).ok_or(
                        BlueprintError::UnknownGlyph {
                            glyph: other,
                            x: cell.x(),
                            y: cell.y(),
                        },
                    )?,
                };
                terrain.push(kind);
            }
        }

        let mut placements = Vec::new();
        for line in lines.filter(|line| !line.trim().is_empty()) {
            placements.push(parse_placement(line)?);
        }

        Ok(Self {
            width: expected as i32,
            height: rows.len() as i32,
            terrain,
            spawn_sources,
            player_start,
            placements,
        })
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Cell marked with `@`, if any.
    #[must_use]
    pub const fn player_start(&self) -> Option<CellCoord> {
        self.player_start
    }

    /// Placements in declaration order.
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Appends a placement.
    #[must_use]
    pub fn with_placement(mut self, name: impl Into<String>, cell: CellCoord) -> Self {
        self.placements.push(Placement {
            name: name.into(),
            cell,
        });
        self
    }

    /// Builds the dungeon: terrain, spawn sources, terrain shadows, then placements.
    ///
    /// Placements naming unknown content or cells outside the map are logged
    /// and skipped.
    #[must_use]
    pub fn build(&self, config: DungeonConfig) -> Dungeon {
        let mut dungeon = Dungeon::new(self.width, self.height, config);
        for (index, terrain) in self.terrain.iter().enumerate() {
            let index = index as i32;
            let cell = CellCoord::new(index % self.width, index / self.width);
            if *terrain != TerrainKind::Floor {
                let _ = dungeon.set_terrain(cell, *terrain);
            }
        }
        for source in &self.spawn_sources {
            let _ = dungeon.add_spawn_source(*source);
        }

        dungeon.compute_shadow_heights();
        dungeon.snapshot_pre_tree_shadow();
        dungeon.apply_shadow_map(None);

        for placement in &self.placements {
            place(&mut dungeon, placement);
        }

        log::info!(
            "built {}x{} level with {} spawn sources, {} creatures, {} items, {} lights",
            self.width,
            self.height,
            dungeon.spawn_sources().len(),
            dungeon.creature_count(),
            dungeon.items().count(),
            dungeon.lights().count()
        );
        dungeon
    }
}

fn parse_placement(line: &str) -> Result<Placement, BlueprintError> {
    let malformed = || BlueprintError::MalformedPlacement(line.trim().to_owned());
    let mut parts = line.split_whitespace();
    let name = parts.next().ok_or_else(malformed)?;
    let x = parts
        .next()
        .and_then(|value| value.parse::<i32>().ok())
        .ok_or_else(malformed)?;
    let y = parts
        .next()
        .and_then(|value| value.parse::<i32>().ok())
        .ok_or_else(malformed)?;
    if parts.next().is_some() {
        return Err(malformed());
    }
    Ok(Placement {
        name: name.to_owned(),
        cell: CellCoord::new(x, y),
    })
}

fn place(dungeon: &mut Dungeon, placement: &Placement) {
    let cell = placement.cell;
    if !dungeon.contains(cell) {
        log::warn!(
            "skipping placement `{}` outside the map at ({}, {})",
            placement.name,
            cell.x(),
            cell.y()
        );
        return;
    }

    let placed = match placement.name.split_once(':') {
        Some(("creature", kind)) => CreatureKind::from_name(kind).map(|kind| {
            let _ = dungeon.add_creature(kind, Position::cell_center(cell));
        }),
        Some(("item", kind)) => ItemKind::from_name(kind).map(|kind| {
            let _ = dungeon.add_item(kind, cell);
        }),
        None if placement.name == "light" => {
            let torch = Light::point(Position::cell_center(cell), TORCH_RANGE, TORCH_COLOR)
                .with_randomized_radius();
            let _ = dungeon.add_light(torch);
            Ok(())
        }
        None if placement.name == "spawn" => {
            let _ = dungeon.add_spawn_source(cell);
            Ok(())
        }
        _ => {
            log::warn!("skipping unknown placement `{}`", placement.name);
            return;
        }
    };

    if let Err(error) = placed {
        log::warn!("skipping placement `{}`: {error}", placement.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: &str = "\
#######
#@..~S#
#.T.~~#
#######

creature:zombie 3 1
item:barrel 1 2
creature:dragon 2 1
light 3 2
";

    #[test]
    fn parses_terrain_markers_and_placements() {
        let blueprint = LevelBlueprint::parse(LEVEL).expect("valid blueprint");
        assert_eq!((blueprint.width(), blueprint.height()), (7, 4));
        assert_eq!(blueprint.player_start(), Some(CellCoord::new(1, 1)));
        assert_eq!(blueprint.placements().len(), 4);
        assert_eq!(blueprint.placements()[1].name, "item:barrel");
    }

    #[test]
    fn build_places_known_content_and_skips_unknown() {
        let dungeon = LevelBlueprint::parse(LEVEL)
            .expect("valid blueprint")
            .build(DungeonConfig::default());

        assert_eq!(dungeon.terrain(CellCoord::new(2, 2)), Some(TerrainKind::PineTree));
        assert_eq!(dungeon.terrain(CellCoord::new(5, 1)), Some(TerrainKind::Floor));
        assert_eq!(dungeon.spawn_sources(), &[CellCoord::new(5, 1)]);
        assert_eq!(dungeon.creature_count(), 1);
        assert_eq!(dungeon.creatures_at(CellCoord::new(3, 1)), 1);
        assert!(!dungeon.is_walkable(CellCoord::new(1, 2)));
        assert_eq!(dungeon.lights().count(), 1);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let error = LevelBlueprint::parse("###\n##\n").expect_err("ragged");
        assert_eq!(
            error,
            BlueprintError::Ragged {
                row: 1,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn unknown_glyph_is_rejected() {
        let error = LevelBlueprint::parse("#?#\n").expect_err("unknown glyph");
        assert_eq!(
            error,
            BlueprintError::UnknownGlyph {
                glyph: '?',
                x: 1,
                y: 0
            }
        );
        assert_eq!(LevelBlueprint::parse("\n\n"), Err(BlueprintError::Empty));
    }

    #[test]
    fn malformed_placement_is_rejected() {
        let error = LevelBlueprint::parse("..\n\nlight 1\n").expect_err("malformed");
        assert_eq!(error, BlueprintError::MalformedPlacement("light 1".into()));
    }
}
