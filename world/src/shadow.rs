//! Directional terrain shadows and the canopy image.

use emberfall_core::{Color, Rect, SubCellCoord};

use crate::{grid::Grid, Dungeon};

impl Dungeon {
    /// Ray-marches the ground height map towards the sun into the shadow-height map.
    ///
    /// A sub-cell's shadow height is how far the tallest terrain along the
    /// ray, lowered by the shadow slope per unit travelled, rises above the
    /// sub-cell's own ground.
    pub fn compute_shadow_heights(&mut self) {
        let [sun_x, sun_y] = self.config.sun_direction;
        let step_length = (sun_x * sun_x + sun_y * sun_y).sqrt();
        let drop_per_step = self.config.shadow_slope * step_length;
        if step_length <= f32::EPSILON || drop_per_step <= 0.0 {
            self.shadow_height.fill(0.0);
            return;
        }

        let peak = self
            .height_map
            .as_slice()
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);

        for (x, y) in self.height_map.bounds().iter() {
            let ground = self.height_map[(x, y)];
            let mut shadow = 0.0_f32;
            let mut step = 1;
            loop {
                let drop = drop_per_step * step as f32;
                if peak - drop <= ground + shadow {
                    break;
                }
                let sample_x = (x as f32 + 0.5 + sun_x * step as f32).floor() as i32;
                let sample_y = (y as f32 + 0.5 + sun_y * step as f32).floor() as i32;
                let Some(&blocker) = self.height_map.get(sample_x, sample_y) else {
                    break;
                };
                shadow = shadow.max(blocker - drop - ground);
                step += 1;
            }
            self.shadow_height[(x, y)] = shadow;
        }
    }

    /// Stores the current shadow heights as the state before any tree shadow.
    pub fn snapshot_pre_tree_shadow(&mut self) {
        self.pre_tree_shadow_height
            .as_mut_slice()
            .clone_from_slice(self.shadow_height.as_slice());
    }

    /// Restores shadow heights from the pre-tree snapshot.
    ///
    /// `region` is a sub-cell rectangle; `None` restores the whole map.
    pub fn restore_pre_tree_shadow(&mut self, region: Option<Rect>) {
        let region = region.unwrap_or_else(|| self.sub_cell_bounds());
        self.shadow_height
            .copy_region_from(&self.pre_tree_shadow_height, region);
    }

    /// Shadow height of a sub-cell, or `None` when out of range.
    #[must_use]
    pub fn shadow_height(&self, sub_cell: SubCellCoord) -> Option<f32> {
        self.shadow_height.get(sub_cell.x(), sub_cell.y()).copied()
    }

    /// Raises the shadow height of a sub-cell to at least `height`.
    pub fn raise_shadow_height(&mut self, sub_cell: SubCellCoord, height: f32) {
        if let Some(current) = self.shadow_height.get_mut(sub_cell.x(), sub_cell.y()) {
            *current = current.max(height);
        }
    }

    /// Ground altitude of a sub-cell, or `None` when out of range.
    #[must_use]
    pub fn ground_height(&self, sub_cell: SubCellCoord) -> Option<f32> {
        self.height_map.get(sub_cell.x(), sub_cell.y()).copied()
    }

    /// Converts shadow heights into smoothed per-sub-cell shadow intensity.
    ///
    /// Each sub-cell takes the mean of the clamped intensities of the 2×2
    /// block it anchors, which anti-aliases shadow edges. `region` is a
    /// sub-cell rectangle; `None` processes the whole map.
    pub fn apply_shadow_map(&mut self, region: Option<Rect>) {
        let bounds = self.sub_cell_bounds();
        let Some(region) = region.unwrap_or(bounds).intersection(&bounds) else {
            return;
        };
        let strength = self.config.shadow_strength;
        let max_shadow = self.config.max_shadow.max(0.0);
        let intensity = |heights: &Grid<f32>, x: i32, y: i32| {
            heights
                .get(x, y)
                .map(|height| (height * strength).clamp(0.0, max_shadow))
        };

        for (x, y) in region.iter() {
            let mut sum = 0.0;
            let mut count = 0.0;
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                if let Some(value) = intensity(&self.shadow_height, x + dx, y + dy) {
                    sum += value;
                    count += 1.0;
                }
            }
            self.sub_cells[(x, y)].shadow = if count > 0.0 { sum / count } else { 0.0 };
        }
    }

    /// Canopy colour of a sub-cell; black means no canopy. `None` when out of range.
    #[must_use]
    pub fn canopy(&self, sub_cell: SubCellCoord) -> Option<Color> {
        self.canopy.get(sub_cell.x(), sub_cell.y()).copied()
    }

    /// Paints a canopy pixel. Returns `false` when out of range.
    pub fn set_canopy(&mut self, sub_cell: SubCellCoord, color: Color) -> bool {
        match self.canopy.get_mut(sub_cell.x(), sub_cell.y()) {
            Some(pixel) => {
                *pixel = color;
                true
            }
            None => false,
        }
    }

    /// Erases the canopy inside a sub-cell rectangle; `None` erases everything.
    pub fn clear_canopy(&mut self, region: Option<Rect>) {
        match region {
            None => self.canopy.fill(Color::BLACK),
            Some(region) => {
                let Some(region) = region.intersection(&self.canopy.bounds()) else {
                    return;
                };
                for (x, y) in region.iter() {
                    self.canopy[(x, y)] = Color::BLACK;
                }
            }
        }
    }

    /// Canopy image at sub-cell resolution.
    #[must_use]
    pub fn canopy_image(&self) -> &Grid<Color> {
        &self.canopy
    }
}

#[cfg(test)]
mod tests {
    use emberfall_core::{config::DungeonConfig, CellCoord, TerrainKind};

    use super::*;

    fn eastward_sun() -> DungeonConfig {
        DungeonConfig {
            sun_direction: [1.0, 0.0],
            shadow_slope: 0.5,
            shadow_strength: 0.5,
            max_shadow: 0.8,
            ..DungeonConfig::default()
        }
    }

    #[test]
    fn wall_casts_shadow_away_from_the_sun() {
        let mut dungeon = Dungeon::new(8, 1, eastward_sun());
        let _ = dungeon.set_terrain(CellCoord::new(4, 0), TerrainKind::Wall);
        dungeon.compute_shadow_heights();

        let west = dungeon
            .shadow_height(SubCellCoord::new(7, 0))
            .expect("in range");
        let east = dungeon
            .shadow_height(SubCellCoord::new(10, 0))
            .expect("in range");
        assert!((west - 1.5).abs() < 1e-5, "adjacent sub-cell: {west}");
        assert_eq!(east, 0.0);
        assert_eq!(dungeon.shadow_height(SubCellCoord::new(0, 0)), Some(0.0));
    }

    #[test]
    fn flat_map_has_no_shadow() {
        let mut dungeon = Dungeon::new(4, 4, DungeonConfig::default());
        dungeon.compute_shadow_heights();
        dungeon.apply_shadow_map(None);
        assert!(dungeon
            .sub_cells()
            .as_slice()
            .iter()
            .all(|sub_cell| sub_cell.shadow == 0.0));
    }

    #[test]
    fn shadow_map_is_box_blurred_and_clamped() {
        let mut dungeon = Dungeon::new(2, 2, eastward_sun());
        dungeon.raise_shadow_height(SubCellCoord::new(1, 1), 10.0);
        dungeon.apply_shadow_map(None);

        let anchor = dungeon.sub_cell(SubCellCoord::new(1, 1)).expect("in range");
        assert!((anchor.shadow - 0.2).abs() < 1e-6);
        let upper_left = dungeon.sub_cell(SubCellCoord::new(0, 0)).expect("in range");
        assert!((upper_left.shadow - 0.2).abs() < 1e-6);
        let far = dungeon.sub_cell(SubCellCoord::new(3, 3)).expect("in range");
        assert_eq!(far.shadow, 0.0);
    }

    #[test]
    fn restore_only_touches_the_region() {
        let mut dungeon = Dungeon::new(4, 4, DungeonConfig::default());
        dungeon.snapshot_pre_tree_shadow();
        dungeon.raise_shadow_height(SubCellCoord::new(1, 1), 1.0);
        dungeon.raise_shadow_height(SubCellCoord::new(6, 6), 1.0);
        dungeon.restore_pre_tree_shadow(Some(Rect::new(0, 0, 4, 4)));
        assert_eq!(dungeon.shadow_height(SubCellCoord::new(1, 1)), Some(0.0));
        assert_eq!(dungeon.shadow_height(SubCellCoord::new(6, 6)), Some(1.0));
        dungeon.restore_pre_tree_shadow(None);
        assert_eq!(dungeon.shadow_height(SubCellCoord::new(6, 6)), Some(0.0));
    }

    #[test]
    fn canopy_can_be_painted_and_cleared() {
        let mut dungeon = Dungeon::new(2, 2, DungeonConfig::default());
        let pixel = SubCellCoord::new(3, 0);
        assert!(dungeon.set_canopy(pixel, Color::from_rgb(10, 80, 20)));
        assert!(!dungeon.set_canopy(SubCellCoord::new(4, 0), Color::WHITE));
        dungeon.clear_canopy(Some(Rect::new(0, 0, 2, 2)));
        assert_eq!(dungeon.canopy(pixel), Some(Color::from_rgb(10, 80, 20)));
        dungeon.clear_canopy(None);
        assert_eq!(dungeon.canopy(pixel), Some(Color::BLACK));
    }
}
