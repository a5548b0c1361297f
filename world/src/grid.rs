//! Dense, exclusively-owned 2-D buffers.

use std::ops::{Index, IndexMut};

use emberfall_core::Rect;
use serde::{Deserialize, Serialize};

/// Fixed-size row-major buffer owned by a single aggregate.
///
/// Checked accessors ([`Grid::get`], [`Grid::get_mut`]) return `None` for
/// out-of-range coordinates. Indexing with `grid[(x, y)]` is the hot-path
/// accessor: callers are expected to respect the bounds, which are only
/// asserted in debug builds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: i32,
    height: i32,
    cells: Box<[T]>,
}

impl<T: Clone> Grid<T> {
    /// Allocates a grid with every cell set to `fill`.
    #[must_use]
    pub fn new(width: i32, height: i32, fill: T) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let len = usize::try_from(i64::from(width) * i64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![fill; len].into_boxed_slice(),
        }
    }

    /// Overwrites every cell with `value`.
    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }

    /// Copies the cells inside `region` from `source`, which must share the dimensions.
    pub fn copy_region_from(&mut self, source: &Grid<T>, region: Rect) {
        debug_assert_eq!(
            (self.width, self.height),
            (source.width, source.height),
            "copy_region_from requires matching dimensions"
        );
        let Some(region) = region.intersection(&self.bounds()) else {
            return;
        };
        for (x, y) in region.iter() {
            let index = self.raw_index(x, y);
            self.cells[index] = source.cells[index].clone();
        }
    }
}

impl<T> Grid<T> {
    /// Wraps an existing row-major buffer, rejecting mismatched lengths.
    #[must_use]
    pub fn from_vec(width: i32, height: i32, cells: Vec<T>) -> Option<Self> {
        if width < 0 || height < 0 {
            return None;
        }
        let expected = usize::try_from(i64::from(width) * i64::from(height)).ok()?;
        (cells.len() == expected).then(|| Self {
            width,
            height,
            cells: cells.into_boxed_slice(),
        })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Rectangle covering the whole grid.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Reports whether the coordinate addresses a cell of the grid.
    #[must_use]
    pub const fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Row-major index of the coordinate, or `None` when out of range.
    #[must_use]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y).then(|| self.raw_index(x, y))
    }

    /// Borrows the cell at the coordinate.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        self.index(x, y).map(|index| &self.cells[index])
    }

    /// Mutably borrows the cell at the coordinate.
    #[must_use]
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut T> {
        self.index(x, y).map(move |index| &mut self.cells[index])
    }

    /// Row-major view of every cell.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    /// Mutable row-major view of every cell.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.cells
    }

    fn raw_index(&self, x: i32, y: i32) -> usize {
        debug_assert!(self.in_bounds(x, y), "grid access out of range: ({x}, {y})");
        (y as usize) * (self.width as usize) + (x as usize)
    }
}

impl<T> Index<(i32, i32)> for Grid<T> {
    type Output = T;

    fn index(&self, (x, y): (i32, i32)) -> &T {
        &self.cells[self.raw_index(x, y)]
    }
}

impl<T> IndexMut<(i32, i32)> for Grid<T> {
    fn index_mut(&mut self, (x, y): (i32, i32)) -> &mut T {
        let index = self.raw_index(x, y);
        &mut self.cells[index]
    }
}
