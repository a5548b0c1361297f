//! Double-buffered height field over one rectangular water zone.

use emberfall_core::{Rect, SubCellCoord, SUB_CELLS_PER_CELL};
use emberfall_world::{Dungeon, Grid};
use glam::Vec2;

use crate::shoal::{Fish, Shoal};

const NEIGHBOURS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Independent wave system covering a rectangle of the dungeon.
///
/// Heights are stored at sub-cell resolution. Dry sub-cells inside the
/// rectangle never move and do not feed their neighbours.
#[derive(Clone, Debug, PartialEq)]
pub struct WaterZone {
    bounds: Rect,
    window: Rect,
    wet: Grid<bool>,
    current: Grid<f32>,
    previous: Grid<f32>,
    active: bool,
    shoal: Option<Shoal>,
}

impl WaterZone {
    pub(crate) fn new(bounds: Rect, dungeon: &Dungeon) -> Self {
        let window = bounds.scaled(SUB_CELLS_PER_CELL);
        let mut wet = Grid::new(window.width(), window.height(), false);
        for (x, y) in window.iter() {
            let is_wet = dungeon
                .sub_cell(SubCellCoord::new(x, y))
                .is_some_and(|sub_cell| sub_cell.is_wet());
            wet[(x - window.x(), y - window.y())] = is_wet;
        }
        Self {
            bounds,
            window,
            wet,
            current: Grid::new(window.width(), window.height(), 0.0),
            previous: Grid::new(window.width(), window.height(), 0.0),
            active: false,
            shoal: None,
        }
    }

    /// Cells covered by the zone.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Sub-cells covered by the zone.
    #[must_use]
    pub const fn window(&self) -> Rect {
        self.window
    }

    /// Reports whether the zone is currently simulated.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Latest height at a sub-cell; `None` outside the zone.
    #[must_use]
    pub fn height(&self, sub_cell: SubCellCoord) -> Option<f32> {
        let (x, y) = self.local(sub_cell);
        self.current.get(x, y).copied()
    }

    /// Reports whether a sub-cell of the zone holds water.
    #[must_use]
    pub fn is_wet(&self, sub_cell: SubCellCoord) -> bool {
        let (x, y) = self.local(sub_cell);
        self.wet.get(x, y).copied().unwrap_or(false)
    }

    /// Largest height magnitude in the zone.
    #[must_use]
    pub fn peak(&self) -> f32 {
        self.current
            .as_slice()
            .iter()
            .fold(0.0_f32, |peak, height| peak.max(height.abs()))
    }

    /// Fish swimming in the zone.
    pub fn fish(&self) -> impl Iterator<Item = &Fish> {
        self.shoal.iter().flat_map(|shoal| shoal.fish().iter())
    }

    /// The zone's shoal, if it has one.
    #[must_use]
    pub const fn shoal(&self) -> Option<&Shoal> {
        self.shoal.as_ref()
    }

    pub(crate) fn wet_sub_cells(&self) -> Vec<SubCellCoord> {
        self.window
            .iter()
            .map(|(x, y)| SubCellCoord::new(x, y))
            .filter(|sub_cell| self.is_wet(*sub_cell))
            .collect()
    }

    pub(crate) fn set_shoal(&mut self, shoal: Shoal) {
        self.shoal = Some(shoal);
    }

    /// Pushes the surface down at a wet sub-cell and wakes the zone.
    pub(crate) fn impulse(&mut self, sub_cell: SubCellCoord, height: f32) -> bool {
        if !self.is_wet(sub_cell) {
            return false;
        }
        let (x, y) = self.local(sub_cell);
        self.current[(x, y)] = -height;
        self.active = true;
        if let Some(shoal) = &mut self.shoal {
            shoal.scare(Vec2::new(sub_cell.x() as f32 + 0.5, sub_cell.y() as f32 + 0.5));
        }
        true
    }

    /// Runs `steps` simulation steps of `interval` seconds each.
    pub(crate) fn advance(&mut self, steps: u32, interval: f32, damping: f32, threshold: f32) {
        for _ in 0..steps {
            if self.active {
                self.step(damping, threshold);
            }
            if let Some(shoal) = &mut self.shoal {
                let window = self.window;
                let wet = &self.wet;
                shoal.step(interval, |sub_cell| {
                    wet.get(sub_cell.x() - window.x(), sub_cell.y() - window.y())
                        .copied()
                        .unwrap_or(false)
                });
            }
        }
    }

    /// One step of the discrete wave equation followed by damping.
    fn step(&mut self, damping: f32, threshold: f32) {
        std::mem::swap(&mut self.current, &mut self.previous);
        let width = self.window.width();
        let height = self.window.height();
        let mut peak = 0.0_f32;

        // Edge sub-cells are stepped too; neighbours outside the window
        // count as dry.
        for y in 0..height {
            for x in 0..width {
                if !self.wet[(x, y)] {
                    continue;
                }
                let mut sum = 0.0;
                let mut count = 0;
                for (dx, dy) in NEIGHBOURS {
                    if self.wet.get(x + dx, y + dy).copied().unwrap_or(false) {
                        sum += self.previous[(x + dx, y + dy)];
                        count += 1;
                    }
                }
                let next = if count == 0 {
                    0.0
                } else {
                    (sum / count as f32 * 2.0 - self.current[(x, y)]) * damping
                };
                self.current[(x, y)] = next;
                peak = peak.max(next.abs());
            }
        }

        if peak <= threshold {
            self.current.fill(0.0);
            self.previous.fill(0.0);
            self.active = false;
            log::debug!(
                "water zone at ({}, {}) went dormant",
                self.bounds.x(),
                self.bounds.y()
            );
        }
    }

    /// Height slope at a sub-cell by central differences over wet neighbours.
    pub(crate) fn gradient(&self, sub_cell: SubCellCoord) -> Vec2 {
        let sample = |dx: i32, dy: i32| {
            let neighbour = sub_cell.offset(dx, dy);
            if self.is_wet(neighbour) {
                self.height(neighbour).unwrap_or(0.0)
            } else {
                0.0
            }
        };
        Vec2::new(sample(1, 0) - sample(-1, 0), sample(0, 1) - sample(0, -1))
    }

    fn local(&self, sub_cell: SubCellCoord) -> (i32, i32) {
        (sub_cell.x() - self.window.x(), sub_cell.y() - self.window.y())
    }
}

#[cfg(test)]
mod tests {
    use emberfall_core::{config::DungeonConfig, CellCoord, TerrainKind};

    use super::*;

    fn pond() -> WaterZone {
        let mut dungeon = Dungeon::new(8, 8, DungeonConfig::default());
        for (x, y) in Rect::new(1, 1, 6, 6).iter() {
            let _ = dungeon.set_terrain(CellCoord::new(x, y), TerrainKind::ShallowWater);
        }
        WaterZone::new(Rect::new(1, 1, 6, 6), &dungeon)
    }

    #[test]
    fn impulse_spreads_to_neighbours() {
        let mut zone = pond();
        let centre = SubCellCoord::new(6, 6);
        assert!(zone.impulse(centre, 1.0));
        assert!(zone.is_active());

        zone.advance(1, 1.0 / 30.0, 0.96, 0.001);
        assert!(zone.height(centre.offset(1, 0)).is_some_and(|h| h < 0.0));
        assert!(zone.height(centre.offset(0, -1)).is_some_and(|h| h < 0.0));
    }

    #[test]
    fn dry_sub_cells_reject_impulses() {
        let mut dungeon = Dungeon::new(8, 8, DungeonConfig::default());
        let _ = dungeon.set_terrain(CellCoord::new(2, 2), TerrainKind::DeepWater);
        let mut zone = WaterZone::new(Rect::new(1, 1, 3, 3), &dungeon);
        assert!(!zone.impulse(SubCellCoord::new(2, 2), 1.0));
        assert!(zone.impulse(SubCellCoord::new(4, 4), 1.0));
    }

    #[test]
    fn quiet_zone_goes_dormant() {
        let mut zone = pond();
        assert!(zone.impulse(SubCellCoord::new(6, 6), 0.01));
        zone.advance(1, 1.0 / 30.0, 0.96, 0.02);
        assert!(!zone.is_active());
        assert_eq!(zone.peak(), 0.0);
    }
}
