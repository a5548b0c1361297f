//! Walkability, transparency and field-of-view flags for one grid resolution.

use emberfall_core::Rect;

use crate::grid::Grid;

const TRANSPARENT: u8 = 0b001;
const WALKABLE: u8 = 0b010;
const IN_FOV: u8 = 0b100;

/// Octant transforms `(xx, xy, yx, yy)` used by the shadowcaster.
const OCTANTS: [[i32; 4]; 8] = [
    [1, 0, 0, 1],
    [0, 1, 1, 0],
    [0, -1, 1, 0],
    [-1, 0, 0, 1],
    [-1, 0, 0, -1],
    [0, -1, -1, 0],
    [0, 1, -1, 0],
    [1, 0, 0, -1],
];

/// Per-cell walkability/transparency map with a field-of-view layer.
///
/// The dungeon keeps two of these: one at cell resolution for gameplay and
/// pathing queries, one at sub-cell resolution for accurate visibility. The
/// lighting engine builds small scratch maps of the same type for each light.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityMap {
    flags: Grid<u8>,
}

impl VisibilityMap {
    /// Creates a map where every cell is opaque, blocked and out of view.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            flags: Grid::new(width, height, 0),
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.flags.width()
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.flags.height()
    }

    /// Rectangle covering the whole map.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.flags.bounds()
    }

    /// Resizes the map if needed and resets every flag.
    pub fn reset(&mut self, width: i32, height: i32) {
        if self.flags.width() == width && self.flags.height() == height {
            self.flags.fill(0);
        } else {
            self.flags = Grid::new(width, height, 0);
        }
    }

    /// Sets the static properties of a cell. Out-of-range coordinates are ignored.
    pub fn set_properties(&mut self, x: i32, y: i32, transparent: bool, walkable: bool) {
        if let Some(flags) = self.flags.get_mut(x, y) {
            let mut value = *flags & IN_FOV;
            if transparent {
                value |= TRANSPARENT;
            }
            if walkable {
                value |= WALKABLE;
            }
            *flags = value;
        }
    }

    /// Reports whether sight passes through the cell; `false` when out of range.
    #[must_use]
    pub fn is_transparent(&self, x: i32, y: i32) -> bool {
        self.has(x, y, TRANSPARENT)
    }

    /// Reports whether the cell may be walked on; `false` when out of range.
    #[must_use]
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.has(x, y, WALKABLE)
    }

    /// Reports whether the cell is in the last computed field of view.
    #[must_use]
    pub fn is_in_fov(&self, x: i32, y: i32) -> bool {
        self.has(x, y, IN_FOV)
    }

    /// Marks or clears a cell as visible.
    pub fn set_in_fov(&mut self, x: i32, y: i32, visible: bool) {
        if let Some(flags) = self.flags.get_mut(x, y) {
            if visible {
                *flags |= IN_FOV;
            } else {
                *flags &= !IN_FOV;
            }
        }
    }

    /// Clears the field-of-view layer inside `window`.
    pub fn clear_fov(&mut self, window: Rect) {
        for (x, y) in window.iter() {
            self.set_in_fov(x, y, false);
        }
    }

    /// Computes the field of view from `(origin_x, origin_y)`.
    ///
    /// Only cells inside `window` are considered; everything outside it is
    /// treated as opaque and left untouched. A `max_radius` of zero means the
    /// view is limited by the window alone. With `light_walls`, opaque cells
    /// bordering the visible area are marked visible as well. The previous
    /// field of view is not cleared.
    pub fn compute_fov(
        &mut self,
        origin_x: i32,
        origin_y: i32,
        max_radius: i32,
        light_walls: bool,
        window: Rect,
    ) {
        let Some(window) = window.intersection(&self.bounds()) else {
            return;
        };
        if !window.contains(origin_x, origin_y) {
            return;
        }

        let radius = if max_radius > 0 {
            max_radius
        } else {
            window.width() + window.height()
        };

        self.set_in_fov(origin_x, origin_y, true);
        for [xx, xy, yx, yy] in OCTANTS {
            let octant = Octant {
                origin_x,
                origin_y,
                radius,
                xx,
                xy,
                yx,
                yy,
                light_walls,
                window,
            };
            self.cast_light(&octant, 1, 1.0, 0.0);
        }
    }

    fn has(&self, x: i32, y: i32, bit: u8) -> bool {
        self.flags.get(x, y).is_some_and(|flags| flags & bit != 0)
    }

    fn cast_light(&mut self, octant: &Octant, row: i32, mut start: f32, end: f32) {
        if start < end {
            return;
        }
        let radius_squared = octant.radius * octant.radius;
        let mut next_start = start;

        for distance in row..=octant.radius {
            let dy = -distance;
            let mut dx = -distance - 1;
            let mut blocked = false;

            while dx <= 0 {
                dx += 1;
                let x = octant.origin_x + dx * octant.xx + dy * octant.xy;
                let y = octant.origin_y + dx * octant.yx + dy * octant.yy;
                let left_slope = (dx as f32 - 0.5) / (dy as f32 + 0.5);
                let right_slope = (dx as f32 + 0.5) / (dy as f32 - 0.5);

                if start < right_slope {
                    continue;
                }
                if end > left_slope {
                    break;
                }

                let inside = octant.window.contains(x, y);
                let opaque = !inside || !self.is_transparent(x, y);
                if inside && dx * dx + dy * dy <= radius_squared && (octant.light_walls || !opaque)
                {
                    self.set_in_fov(x, y, true);
                }

                if blocked {
                    if opaque {
                        next_start = right_slope;
                    } else {
                        blocked = false;
                        start = next_start;
                    }
                } else if opaque && distance < octant.radius {
                    blocked = true;
                    self.cast_light(octant, distance + 1, start, left_slope);
                    next_start = right_slope;
                }
            }

            if blocked {
                break;
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Octant {
    origin_x: i32,
    origin_y: i32,
    radius: i32,
    xx: i32,
    xy: i32,
    yx: i32,
    yy: i32,
    light_walls: bool,
    window: Rect,
}
