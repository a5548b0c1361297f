#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative dungeon state for Emberfall.
//!
//! The [`Dungeon`] aggregate owns the terrain store at both resolutions, the
//! walkability/visibility maps, the height and shadow maps, the canopy image
//! and every dynamic collection (creatures, corpses, items, lights, spawn
//! sources). Every other engine mutates the world through its public API.

use emberfall_core::{
    config::DungeonConfig, CellCoord, Color, Command, Event, Light, LightId, Position, Rect,
    SimRng, SubCellCoord, TerrainKind, WalkPattern, SUB_CELLS_PER_CELL,
};

mod blueprint;
mod cell;
mod creatures;
mod grid;
mod items;
mod memory;
mod persistence;
mod registry;
mod search;
mod shadow;
mod visibility;

pub use blueprint::{BlueprintError, LevelBlueprint, Placement};
pub use cell::{Cell, StackedItem, SubCell};
pub use creatures::{Corpse, Creature};
pub use grid::Grid;
pub use items::Item;
pub use persistence::{load, save, PersistenceError, SAVE_VERSION};
pub use search::WalkableQuery;
pub use visibility::VisibilityMap;

use creatures::CreatureStore;
use items::ItemStore;

/// Dungeon level: terrain, overlays and dynamic collections.
#[derive(Clone, Debug)]
pub struct Dungeon {
    width: i32,
    height: i32,
    config: DungeonConfig,
    cells: Grid<Cell>,
    sub_cells: Grid<SubCell>,
    cell_map: VisibilityMap,
    sub_cell_map: VisibilityMap,
    height_map: Grid<f32>,
    shadow_height: Grid<f32>,
    pre_tree_shadow_height: Grid<f32>,
    canopy: Grid<Color>,
    fov_window: Option<Rect>,
    stairs: Option<CellCoord>,
    spawn_sources: Vec<CellCoord>,
    creatures: CreatureStore,
    corpses: Vec<Corpse>,
    items: ItemStore,
    lights: Vec<(LightId, Light)>,
    next_light_id: u32,
}

impl Dungeon {
    /// Creates a dungeon of plain floor with the given dimensions in cells.
    #[must_use]
    pub fn new(width: i32, height: i32, config: DungeonConfig) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let sub_width = width * SUB_CELLS_PER_CELL;
        let sub_height = height * SUB_CELLS_PER_CELL;
        let floor = TerrainKind::Floor;

        let mut dungeon = Self {
            width,
            height,
            config,
            cells: Grid::new(width, height, Cell::with_terrain(floor)),
            sub_cells: Grid::new(sub_width, sub_height, SubCell::for_terrain(floor)),
            cell_map: VisibilityMap::new(width, height),
            sub_cell_map: VisibilityMap::new(sub_width, sub_height),
            height_map: Grid::new(sub_width, sub_height, floor.height()),
            shadow_height: Grid::new(sub_width, sub_height, 0.0),
            pre_tree_shadow_height: Grid::new(sub_width, sub_height, 0.0),
            canopy: Grid::new(sub_width, sub_height, Color::BLACK),
            fov_window: None,
            stairs: None,
            spawn_sources: Vec::new(),
            creatures: CreatureStore::default(),
            corpses: Vec::new(),
            items: ItemStore::default(),
            lights: Vec::new(),
            next_light_id: 0,
        };
        for (x, y) in dungeon.bounds().iter() {
            dungeon.refresh_cell_properties(CellCoord::new(x, y));
        }
        dungeon
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

    /// Rectangle covering every cell.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Rectangle covering every sub-cell.
    #[must_use]
    pub const fn sub_cell_bounds(&self) -> Rect {
        self.bounds().scaled(SUB_CELLS_PER_CELL)
    }

    /// Tuning the dungeon was created with.
    #[must_use]
    pub const fn config(&self) -> &DungeonConfig {
        &self.config
    }

    /// Reports whether the cell lies inside the map.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        self.cells.in_bounds(cell.x(), cell.y())
    }

    /// Cell record, or `None` when out of range.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<&Cell> {
        self.cells.get(cell.x(), cell.y())
    }

    /// Terrain of the cell, or `None` when out of range.
    #[must_use]
    pub fn terrain(&self, cell: CellCoord) -> Option<TerrainKind> {
        self.cell(cell).map(Cell::terrain)
    }

    /// Sub-cell record, or `None` when out of range.
    #[must_use]
    pub fn sub_cell(&self, sub_cell: SubCellCoord) -> Option<&SubCell> {
        self.sub_cells.get(sub_cell.x(), sub_cell.y())
    }

    /// Every sub-cell record in row-major order.
    #[must_use]
    pub fn sub_cells(&self) -> &Grid<SubCell> {
        &self.sub_cells
    }

    /// Changes the terrain of a cell and refreshes every derived attribute.
    ///
    /// Shadows are not recomputed; call [`Dungeon::compute_shadow_heights`]
    /// once all terrain edits are done. Returns `false` when out of range.
    pub fn set_terrain(&mut self, cell: CellCoord, terrain: TerrainKind) -> bool {
        let Some(slot) = self.cells.get_mut(cell.x(), cell.y()) else {
            return false;
        };
        let previous = slot.terrain();
        slot.set_terrain(terrain);

        for sub_cell in cell.sub_cells() {
            let (x, y) = (sub_cell.x(), sub_cell.y());
            let shadow = self.sub_cells[(x, y)].shadow;
            self.sub_cells[(x, y)] = SubCell {
                shadow,
                ..SubCell::for_terrain(terrain)
            };
            self.height_map[(x, y)] = terrain.height();
        }

        if terrain == TerrainKind::Stairs {
            self.stairs = Some(cell);
        } else if previous == TerrainKind::Stairs && self.stairs == Some(cell) {
            self.stairs = None;
        }
        self.refresh_cell_properties(cell);
        true
    }

    /// Location of the stairs, if the level has any.
    #[must_use]
    pub const fn stairs(&self) -> Option<CellCoord> {
        self.stairs
    }

    /// Registers a candidate creature entry point. Returns `false` when out of range.
    pub fn add_spawn_source(&mut self, cell: CellCoord) -> bool {
        if !self.contains(cell) || self.spawn_sources.contains(&cell) {
            return false;
        }
        self.spawn_sources.push(cell);
        true
    }

    /// Candidate creature entry points in registration order.
    #[must_use]
    pub fn spawn_sources(&self) -> &[CellCoord] {
        &self.spawn_sources
    }

    /// Walkability of the cell including stacked items; `false` when out of range.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.cell_map.is_walkable(cell.x(), cell.y())
    }

    /// Transparency of the cell including stacked items; `false` when out of range.
    #[must_use]
    pub fn is_transparent(&self, cell: CellCoord) -> bool {
        self.cell_map.is_transparent(cell.x(), cell.y())
    }

    /// Reports whether any sub-cell of the cell is in the player's field of view.
    #[must_use]
    pub fn is_in_fov(&self, cell: CellCoord) -> bool {
        self.cell_map.is_in_fov(cell.x(), cell.y())
    }

    /// Reports whether the sub-cell is in the player's field of view.
    #[must_use]
    pub fn is_sub_cell_in_fov(&self, sub_cell: SubCellCoord) -> bool {
        self.sub_cell_map.is_in_fov(sub_cell.x(), sub_cell.y())
    }

    /// Coarse walkability/transparency/field-of-view map.
    #[must_use]
    pub const fn cell_map(&self) -> &VisibilityMap {
        &self.cell_map
    }

    /// Fine walkability/transparency/field-of-view map.
    #[must_use]
    pub const fn sub_cell_map(&self) -> &VisibilityMap {
        &self.sub_cell_map
    }

    /// Computes the player's field of view inside the viewport.
    ///
    /// Visibility is computed at sub-cell resolution and OR-reduced into the
    /// coarse map: a cell is visible when any of its four sub-cells is.
    pub fn compute_fov(&mut self, origin: Position, viewport: Rect) {
        if let Some(previous) = self.fov_window.take() {
            self.cell_map.clear_fov(previous);
            self.sub_cell_map.clear_fov(previous.scaled(SUB_CELLS_PER_CELL));
        }

        let Some(window) = viewport.intersection(&self.bounds()) else {
            return;
        };
        if !window.contains(origin.cell().x(), origin.cell().y()) {
            return;
        }
        self.fov_window = Some(window);

        let eye = origin.sub_cell();
        self.sub_cell_map.compute_fov(
            eye.x(),
            eye.y(),
            0,
            true,
            window.scaled(SUB_CELLS_PER_CELL),
        );

        for (x, y) in window.iter() {
            let visible = CellCoord::new(x, y)
                .sub_cells()
                .iter()
                .any(|sub_cell| self.sub_cell_map.is_in_fov(sub_cell.x(), sub_cell.y()));
            self.cell_map.set_in_fov(x, y, visible);
        }
    }

    /// Window covered by the last field-of-view computation.
    #[must_use]
    pub const fn fov_window(&self) -> Option<Rect> {
        self.fov_window
    }

    /// Registers a light source.
    pub fn add_light(&mut self, light: Light) -> LightId {
        let id = LightId::new(self.next_light_id);
        self.next_light_id = self.next_light_id.wrapping_add(1);
        self.lights.push((id, light));
        id
    }

    /// Unregisters a light source.
    pub fn remove_light(&mut self, id: LightId) -> Option<Light> {
        let index = self.lights.iter().position(|(light_id, _)| *light_id == id)?;
        Some(self.lights.remove(index).1)
    }

    /// Light source by identifier.
    #[must_use]
    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights
            .iter()
            .find(|(light_id, _)| *light_id == id)
            .map(|(_, light)| light)
    }

    /// Mutable light source by identifier.
    #[must_use]
    pub fn light_mut(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights
            .iter_mut()
            .find(|(light_id, _)| *light_id == id)
            .map(|(_, light)| light)
    }

    /// Every light source in registration order.
    pub fn lights(&self) -> impl Iterator<Item = (LightId, &Light)> {
        self.lights.iter().map(|(id, light)| (*id, light))
    }

    fn refresh_cell_properties(&mut self, cell: CellCoord) {
        let Some(slot) = self.cells.get(cell.x(), cell.y()) else {
            return;
        };
        let walkable = slot.walkable();
        let transparent = slot.transparent();
        self.cell_map
            .set_properties(cell.x(), cell.y(), transparent, walkable);
        for sub_cell in cell.sub_cells() {
            self.sub_cell_map
                .set_properties(sub_cell.x(), sub_cell.y(), transparent, walkable);
        }
    }
}

/// Applies the provided command to the dungeon, reporting outcomes as events.
pub fn apply(
    dungeon: &mut Dungeon,
    command: Command,
    rng: &mut SimRng,
    out_events: &mut Vec<Event>,
) {
    match command {
        Command::SpawnCreature { kind, near } => {
            let pattern = kind.walk_pattern();
            let query = WalkableQuery {
                allow_stairs: false,
                allow_creatures: false,
                allow_water: pattern != WalkPattern::AvoidWater,
                pattern: Some(pattern),
            };
            let cell = dungeon
                .closest_spawn_source(near, rng)
                .and_then(|source| dungeon.closest_walkable(source, query));
            let spawned = cell.and_then(|cell| {
                dungeon
                    .add_creature(kind, Position::cell_center(cell))
                    .map(|creature| (creature, cell))
            });
            match spawned {
                Some((creature, cell)) => {
                    log::debug!(
                        "spawned {} at ({}, {})",
                        kind.name(),
                        cell.x(),
                        cell.y()
                    );
                    out_events.push(Event::CreatureSpawned {
                        creature,
                        kind,
                        cell,
                    });
                }
                None => {
                    log::warn!("no spawn location available for {}", kind.name());
                    out_events.push(Event::SpawnFailed { kind });
                }
            }
        }
        Command::DropItem { kind, cell } => {
            let query = WalkableQuery {
                allow_stairs: false,
                allow_creatures: true,
                allow_water: false,
                pattern: None,
            };
            let dropped = dungeon.closest_walkable(cell, query).and_then(|target| {
                dungeon
                    .add_item(kind, target)
                    .map(|item| (item, target))
            });
            match dropped {
                Some((item, cell)) => out_events.push(Event::ItemDropped { item, kind, cell }),
                None => log::warn!(
                    "no free cell near ({}, {}) to drop {}",
                    cell.x(),
                    cell.y(),
                    kind.name()
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use emberfall_core::{seeded_rng, CreatureKind, HdrColor, ItemKind};

    use super::*;

    #[test]
    fn set_terrain_updates_maps_and_sub_cells() {
        let mut dungeon = Dungeon::new(4, 4, DungeonConfig::default());
        let cell = CellCoord::new(1, 1);
        assert!(dungeon.set_terrain(cell, TerrainKind::DeepWater));
        assert!(!dungeon.is_walkable(cell));
        assert!(dungeon.is_transparent(cell));
        for sub_cell in cell.sub_cells() {
            assert!(dungeon.sub_cell(sub_cell).is_some_and(SubCell::is_wet));
            assert!(!dungeon.sub_cell_map().is_walkable(sub_cell.x(), sub_cell.y()));
        }
        assert!(!dungeon.set_terrain(CellCoord::new(4, 0), TerrainKind::Wall));
    }

    #[test]
    fn stairs_follow_terrain_edits() {
        let mut dungeon = Dungeon::new(4, 4, DungeonConfig::default());
        let cell = CellCoord::new(3, 2);
        let _ = dungeon.set_terrain(cell, TerrainKind::Stairs);
        assert_eq!(dungeon.stairs(), Some(cell));
        let _ = dungeon.set_terrain(cell, TerrainKind::Floor);
        assert_eq!(dungeon.stairs(), None);
    }

    #[test]
    fn fov_reduces_sub_cells_into_cells() {
        let mut dungeon = Dungeon::new(10, 3, DungeonConfig::default());
        for y in 0..3 {
            let _ = dungeon.set_terrain(CellCoord::new(5, y), TerrainKind::Wall);
        }
        dungeon.compute_fov(Position::new(1.5, 1.5), dungeon.bounds());
        assert!(dungeon.is_in_fov(CellCoord::new(4, 1)));
        assert!(dungeon.is_in_fov(CellCoord::new(5, 1)));
        assert!(!dungeon.is_in_fov(CellCoord::new(8, 1)));
        assert_eq!(dungeon.fov_window(), Some(dungeon.bounds()));
    }

    #[test]
    fn fov_outside_viewport_is_cleared_on_recompute() {
        let mut dungeon = Dungeon::new(20, 5, DungeonConfig::default());
        dungeon.compute_fov(Position::new(2.5, 2.5), dungeon.bounds());
        assert!(dungeon.is_in_fov(CellCoord::new(15, 2)));
        dungeon.compute_fov(Position::new(2.5, 2.5), Rect::new(0, 0, 8, 5));
        assert!(!dungeon.is_in_fov(CellCoord::new(15, 2)));
        assert!(dungeon.is_in_fov(CellCoord::new(7, 2)));
    }

    #[test]
    fn lights_can_be_added_and_removed() {
        let mut dungeon = Dungeon::new(4, 4, DungeonConfig::default());
        let light = Light::point(Position::new(1.0, 1.0), 3.0, HdrColor::new(1.0, 0.5, 0.2));
        let id = dungeon.add_light(light.clone());
        assert_eq!(dungeon.light(id), Some(&light));
        if let Some(stored) = dungeon.light_mut(id) {
            stored.intensity = 2.0;
        }
        assert_eq!(dungeon.lights().count(), 1);
        assert_eq!(dungeon.remove_light(id).map(|light| light.intensity), Some(2.0));
        assert!(dungeon.light(id).is_none());
    }

    #[test]
    fn spawn_command_uses_a_hidden_spawn_source() {
        let mut dungeon = Dungeon::new(12, 12, DungeonConfig::default());
        let source = CellCoord::new(10, 10);
        assert!(dungeon.add_spawn_source(source));
        let mut rng = seeded_rng(3);
        let mut events = Vec::new();
        apply(
            &mut dungeon,
            Command::SpawnCreature {
                kind: CreatureKind::Zombie,
                near: CellCoord::new(1, 1),
            },
            &mut rng,
            &mut events,
        );
        match events.as_slice() {
            [Event::CreatureSpawned { cell, kind, .. }] => {
                assert_eq!(*cell, source);
                assert_eq!(*kind, CreatureKind::Zombie);
            }
            other => panic!("unexpected events: {other:?}"),
        }
        assert_eq!(dungeon.creatures_at(source), 1);
    }

    #[test]
    fn spawn_command_without_sources_fails() {
        let mut dungeon = Dungeon::new(6, 6, DungeonConfig::default());
        let mut rng = seeded_rng(3);
        let mut events = Vec::new();
        apply(
            &mut dungeon,
            Command::SpawnCreature {
                kind: CreatureKind::Rat,
                near: CellCoord::new(1, 1),
            },
            &mut rng,
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::SpawnFailed {
                kind: CreatureKind::Rat
            }]
        );
    }

    #[test]
    fn eels_spawn_in_the_water_beside_a_source() {
        let mut dungeon = Dungeon::new(8, 8, DungeonConfig::default());
        let source = CellCoord::new(5, 5);
        let pond = CellCoord::new(6, 5);
        assert!(dungeon.add_spawn_source(source));
        assert!(dungeon.set_terrain(pond, TerrainKind::ShallowWater));
        let mut rng = seeded_rng(3);
        let mut events = Vec::new();
        apply(
            &mut dungeon,
            Command::SpawnCreature {
                kind: CreatureKind::Eel,
                near: CellCoord::new(1, 1),
            },
            &mut rng,
            &mut events,
        );
        match events.as_slice() {
            [Event::CreatureSpawned { cell, kind, .. }] => {
                assert_eq!(*cell, pond);
                assert_eq!(*kind, CreatureKind::Eel);
            }
            other => panic!("unexpected events: {other:?}"),
        }
        assert_eq!(dungeon.creatures_at(source), 0);
        assert_eq!(dungeon.creatures_at(pond), 1);
    }

    #[test]
    fn drop_command_avoids_blocked_cells() {
        let mut dungeon = Dungeon::new(6, 6, DungeonConfig::default());
        let wall = CellCoord::new(2, 2);
        let _ = dungeon.set_terrain(wall, TerrainKind::Wall);
        let mut rng = seeded_rng(9);
        let mut events = Vec::new();
        apply(
            &mut dungeon,
            Command::DropItem {
                kind: ItemKind::HealthPotion,
                cell: wall,
            },
            &mut rng,
            &mut events,
        );
        match events.as_slice() {
            [Event::ItemDropped { cell, .. }] => {
                assert_ne!(*cell, wall);
                assert!(dungeon.is_walkable(*cell));
                assert_eq!(cell.distance_squared(wall), 1);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }
}
