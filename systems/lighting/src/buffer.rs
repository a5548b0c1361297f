//! Sub-cell light accumulation buffer.

use emberfall_core::{Color, HdrColor, Rect, SubCellCoord};
use emberfall_world::Grid;

/// Extended-range light accumulated over a window of the dungeon.
///
/// The window is expressed in sub-cells. Lights only ever add into the
/// buffer; [`LightBuffer::clear`] resets it to the ambient colour.
#[derive(Clone, Debug, PartialEq)]
pub struct LightBuffer {
    window: Rect,
    pixels: Grid<HdrColor>,
}

impl LightBuffer {
    /// Allocates a black buffer covering the sub-cell window.
    #[must_use]
    pub fn new(window: Rect) -> Self {
        Self {
            window,
            pixels: Grid::new(window.width(), window.height(), HdrColor::BLACK),
        }
    }

    /// Sub-cell window covered by the buffer.
    #[must_use]
    pub const fn window(&self) -> Rect {
        self.window
    }

    /// Moves the buffer to a new window, reallocating only when the size changes.
    pub fn set_window(&mut self, window: Rect) {
        if window.width() != self.window.width() || window.height() != self.window.height() {
            self.pixels = Grid::new(window.width(), window.height(), HdrColor::BLACK);
        }
        self.window = window;
    }

    /// Resets every pixel to `ambient`.
    pub fn clear(&mut self, ambient: HdrColor) {
        self.pixels.fill(ambient);
    }

    /// Accumulated light at a sub-cell, or `None` outside the window.
    #[must_use]
    pub fn get(&self, sub_cell: SubCellCoord) -> Option<HdrColor> {
        self.pixels
            .get(
                sub_cell.x() - self.window.x(),
                sub_cell.y() - self.window.y(),
            )
            .copied()
    }

    /// Adds light to a sub-cell; ignored outside the window.
    pub fn add(&mut self, sub_cell: SubCellCoord, light: HdrColor) {
        if let Some(pixel) = self.pixels.get_mut(
            sub_cell.x() - self.window.x(),
            sub_cell.y() - self.window.y(),
        ) {
            *pixel += light;
        }
    }

    /// Display-range image of the buffer in row-major window order.
    #[must_use]
    pub fn tone_mapped(&self) -> Vec<Color> {
        self.pixels
            .as_slice()
            .iter()
            .map(|pixel| pixel.tone_map())
            .collect()
    }
}
