//! Player memory of explored cells.

use emberfall_core::CellCoord;

use crate::Dungeon;

const DIAGONALS: [(i32, i32); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

impl Dungeon {
    /// Permanently marks a cell as remembered.
    ///
    /// When the cell is opaque, each already-remembered opaque diagonal
    /// neighbour links back through the two cells sharing that corner: those
    /// that are opaque become remembered too, so wall outlines close up.
    pub fn set_memory(&mut self, cell: CellCoord) {
        let Some(slot) = self.cells.get_mut(cell.x(), cell.y()) else {
            return;
        };
        slot.set_remembered(true);
        if self.is_transparent(cell) {
            return;
        }

        for (dx, dy) in DIAGONALS {
            let diagonal = cell.offset(dx, dy);
            if self.is_transparent(diagonal) || !self.is_remembered(diagonal) {
                continue;
            }
            for corner in [cell.offset(dx, 0), cell.offset(0, dy)] {
                if self.contains(corner) && !self.is_transparent(corner) {
                    self.cells[(corner.x(), corner.y())].set_remembered(true);
                }
            }
        }
    }

    /// Reports whether the player remembers the cell; `false` when out of range.
    #[must_use]
    pub fn is_remembered(&self, cell: CellCoord) -> bool {
        self.cell(cell).is_some_and(|slot| slot.is_remembered())
    }

    /// Remembers every cell in the current field of view.
    pub fn remember_fov(&mut self) {
        let Some(window) = self.fov_window else {
            return;
        };
        for (x, y) in window.iter() {
            let cell = CellCoord::new(x, y);
            if self.is_in_fov(cell) {
                self.set_memory(cell);
            }
        }
    }
}
