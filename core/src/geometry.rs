//! Positions, grid coordinates and rectangles shared by every layer.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Number of sub-cells along each edge of a cell.
pub const SUB_CELLS_PER_CELL: i32 = 2;

/// Floating-point location measured in cell units.
///
/// Every dynamic entity (creatures, items, lights, fish) is placed through a
/// `Position`. The owning cell is `floor(coord)` and the owning sub-cell is
/// `floor(coord * 2)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(Vec2);

impl Position {
    /// Creates a position from cell-unit coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    /// Wraps an existing vector expressed in cell units.
    #[must_use]
    pub const fn from_vec(vec: Vec2) -> Self {
        Self(vec)
    }

    /// Position at the centre of the provided cell.
    #[must_use]
    pub fn cell_center(cell: CellCoord) -> Self {
        Self::new(cell.x() as f32 + 0.5, cell.y() as f32 + 0.5)
    }

    /// Horizontal coordinate in cell units.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.0.x
    }

    /// Vertical coordinate in cell units.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.0.y
    }

    /// Underlying vector in cell units.
    #[must_use]
    pub const fn vec(&self) -> Vec2 {
        self.0
    }

    /// Cell containing the position.
    #[must_use]
    pub fn cell(&self) -> CellCoord {
        CellCoord::new(self.0.x.floor() as i32, self.0.y.floor() as i32)
    }

    /// Sub-cell containing the position.
    #[must_use]
    pub fn sub_cell(&self) -> SubCellCoord {
        let scale = SUB_CELLS_PER_CELL as f32;
        SubCellCoord::new(
            (self.0.x * scale).floor() as i32,
            (self.0.y * scale).floor() as i32,
        )
    }

    /// Squared straight-line distance to another position.
    #[must_use]
    pub fn distance_squared(&self, other: Position) -> f32 {
        self.0.distance_squared(other.0)
    }
}

/// Location of a single coarse cell.
///
/// Coordinates are signed so that callers may describe points outside a grid;
/// every grid rejects such coordinates instead of wrapping them.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the coordinate translated by the provided deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Squared straight-line distance between two cells.
    #[must_use]
    pub fn distance_squared(self, other: CellCoord) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }

    /// Upper-left sub-cell of this cell.
    #[must_use]
    pub const fn first_sub_cell(self) -> SubCellCoord {
        SubCellCoord::new(self.x * SUB_CELLS_PER_CELL, self.y * SUB_CELLS_PER_CELL)
    }

    /// The four sub-cells composing this cell in raster order.
    #[must_use]
    pub const fn sub_cells(self) -> [SubCellCoord; 4] {
        let origin = self.first_sub_cell();
        [
            origin,
            origin.offset(1, 0),
            origin.offset(0, 1),
            origin.offset(1, 1),
        ]
    }
}

/// Location of a single fine-resolution sub-cell (four per cell).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SubCellCoord {
    x: i32,
    y: i32,
}

impl SubCellCoord {
    /// Creates a new sub-cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based sub-cell column.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based sub-cell row.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the coordinate translated by the provided deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Coarse cell that contains this sub-cell.
    #[must_use]
    pub const fn cell(self) -> CellCoord {
        CellCoord::new(
            self.x.div_euclid(SUB_CELLS_PER_CELL),
            self.y.div_euclid(SUB_CELLS_PER_CELL),
        )
    }

    /// Upper-left corner of the sub-cell expressed in cell units.
    #[must_use]
    pub fn corner(self) -> Position {
        let scale = SUB_CELLS_PER_CELL as f32;
        Position::new(self.x as f32 / scale, self.y as f32 / scale)
    }
}

/// Axis-aligned rectangle over integer grid coordinates.
///
/// The rectangle is half-open: it covers `x..x + width` and `y..y + height`.
/// The same type is used for cell and sub-cell rectangles; [`Rect::scaled`]
/// converts between the two.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl Rect {
    /// Creates a rectangle from its upper-left corner and size.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle spanning `(min_x, min_y)` to `(max_x, max_y)` inclusive.
    #[must_use]
    pub const fn from_inclusive(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }

    /// Square rectangle of the given radius centred on a point.
    #[must_use]
    pub const fn around(x: i32, y: i32, radius: i32) -> Self {
        Self::from_inclusive(x - radius, y - radius, x + radius, y + radius)
    }

    /// Left edge.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Top edge.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Width in grid units.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in grid units.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Exclusive right edge.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Reports whether the rectangle covers no point.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Number of grid points covered by the rectangle.
    #[must_use]
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            i64::from(self.width) * i64::from(self.height)
        }
    }

    /// Reports whether the point lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    /// Reports whether `other` lies entirely inside this rectangle.
    #[must_use]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        !other.is_empty()
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Overlapping region of two rectangles, or `None` when they are disjoint.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        let rect = Rect::new(x, y, right - x, bottom - y);
        (!rect.is_empty()).then_some(rect)
    }

    /// Reports whether the rectangles share at least one point.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    /// Smallest rectangle covering both inputs. Empty inputs are ignored.
    #[must_use]
    pub fn merge(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Rectangle grown by `margin` on every side.
    #[must_use]
    pub const fn expand(&self, margin: i32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2 * margin,
            self.height + 2 * margin,
        )
    }

    /// Rectangle with every coordinate multiplied by `factor`.
    #[must_use]
    pub const fn scaled(&self, factor: i32) -> Rect {
        Rect::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Iterates the covered points in raster order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> {
        let rect = *self;
        let rows = if rect.is_empty() { 0..0 } else { rect.y..rect.bottom() };
        rows.flat_map(move |y| (rect.x..rect.right()).map(move |x| (x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_maps_to_cell_and_sub_cell() {
        let position = Position::new(3.75, 1.2);
        assert_eq!(position.cell(), CellCoord::new(3, 1));
        assert_eq!(position.sub_cell(), SubCellCoord::new(7, 2));
    }

    #[test]
    fn sub_cells_round_trip_to_parent_cell() {
        let cell = CellCoord::new(4, 9);
        for sub_cell in cell.sub_cells() {
            assert_eq!(sub_cell.cell(), cell);
        }
        assert_eq!(SubCellCoord::new(-1, -1).cell(), CellCoord::new(-1, -1));
    }

    #[test]
    fn intersection_of_disjoint_rects_is_none() {
        let left = Rect::new(0, 0, 4, 4);
        let right = Rect::new(4, 0, 4, 4);
        assert_eq!(left.intersection(&right), None);
        assert!(!left.intersects(&right));
    }

    #[test]
    fn intersection_clips_to_overlap() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, -3, 10, 6);
        assert_eq!(a.intersection(&b), Some(Rect::new(5, 0, 5, 3)));
    }

    #[test]
    fn merge_covers_both_and_ignores_empty() {
        let a = Rect::new(0, 0, 2, 2);
        let b = Rect::new(5, 6, 1, 1);
        assert_eq!(a.merge(&b), Rect::new(0, 0, 6, 7));
        assert_eq!(a.merge(&Rect::default()), a);
    }

    #[test]
    fn iter_visits_points_in_raster_order() {
        let points: Vec<_> = Rect::new(1, 2, 2, 2).iter().collect();
        assert_eq!(points, vec![(1, 2), (2, 2), (1, 3), (2, 3)]);
        assert_eq!(Rect::new(0, 0, -1, 4).iter().count(), 0);
    }

    #[test]
    fn contains_rect_requires_full_overlap() {
        let outer = Rect::new(0, 0, 10, 10);
        assert!(outer.contains_rect(&Rect::new(2, 2, 8, 8)));
        assert!(!outer.contains_rect(&Rect::new(2, 2, 9, 8)));
    }
}
