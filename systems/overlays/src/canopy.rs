//! Tree canopies and the shadows they cast.

use emberfall_core::{
    config::CanopyConfig, CellCoord, Color, Rect, SubCellCoord, TreeSpecies, SUB_CELLS_PER_CELL,
};
use emberfall_world::Dungeon;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

const SPECIES: [TreeSpecies; 3] = [TreeSpecies::Pine, TreeSpecies::Oak, TreeSpecies::Apple];

/// One painted canopy pixel and the shadow it casts.
struct Leaf {
    at: SubCellCoord,
    color: Color,
    shadow: f32,
}

/// Paints foliage into the dungeon's canopy image and casts tree shadows
/// into its shadow-height map.
///
/// Every tree draws from its own RNG stream seeded by its position, so
/// repainting a tree always produces the same pixels.
#[derive(Clone, Debug)]
pub struct CanopyPainter {
    config: CanopyConfig,
}

impl CanopyPainter {
    /// Creates a painter.
    #[must_use]
    pub fn new(config: CanopyConfig) -> Self {
        Self { config }
    }

    /// Tuning the painter was built with.
    #[must_use]
    pub const fn config(&self) -> &CanopyConfig {
        &self.config
    }

    /// Repaints every tree on the map and returns how many were painted.
    ///
    /// Shadows are restored from the pre-tree snapshot first, so repeated
    /// calls never compound.
    pub fn recompute_all(&self, dungeon: &mut Dungeon) -> usize {
        dungeon.restore_pre_tree_shadow(None);
        dungeon.clear_canopy(None);
        let cells = dungeon.bounds();
        let sub_cells = dungeon.sub_cell_bounds();
        let trees = self.trees_in(dungeon, cells);
        self.paint(dungeon, &trees, sub_cells);
        dungeon.apply_shadow_map(None);
        log::debug!("painted {} tree canopies", trees.len());
        trees.len()
    }

    /// Repaints the area a tree at `cell` could cover, e.g. after the tree
    /// was planted or cut down.
    ///
    /// Returns `false` when the cell is outside the map.
    pub fn recompute_tree(&self, dungeon: &mut Dungeon, cell: CellCoord) -> bool {
        if !dungeon.contains(cell) {
            return false;
        }
        let widest = SPECIES.iter().map(|species| species.radius()).max().unwrap_or(0);
        let Some(region) = self
            .influence(cell, widest)
            .intersection(&dungeon.sub_cell_bounds())
        else {
            return false;
        };

        dungeon.restore_pre_tree_shadow(Some(region));
        dungeon.clear_canopy(Some(region));
        let reach = self.influence(CellCoord::new(0, 0), widest);
        let search = Rect::from_inclusive(
            (region.x() - reach.right()).div_euclid(SUB_CELLS_PER_CELL),
            (region.y() - reach.bottom()).div_euclid(SUB_CELLS_PER_CELL),
            (region.right() - reach.x()).div_euclid(SUB_CELLS_PER_CELL),
            (region.bottom() - reach.y()).div_euclid(SUB_CELLS_PER_CELL),
        );
        let trees: Vec<_> = self
            .trees_in(dungeon, search)
            .into_iter()
            .filter(|(tree, species)| self.influence(*tree, species.radius()).intersects(&region))
            .collect();
        self.paint(dungeon, &trees, region);
        dungeon.apply_shadow_map(Some(region.expand(1)));
        true
    }

    fn trees_in(&self, dungeon: &Dungeon, cells: Rect) -> Vec<(CellCoord, TreeSpecies)> {
        let Some(cells) = cells.intersection(&dungeon.bounds()) else {
            return Vec::new();
        };
        cells
            .iter()
            .filter_map(|(x, y)| {
                let cell = CellCoord::new(x, y);
                let species = dungeon.terrain(cell)?.tree_species()?;
                Some((cell, species))
            })
            .collect()
    }

    /// Paints all canopies first, then casts shadows, both clipped to `clip`.
    fn paint(&self, dungeon: &mut Dungeon, trees: &[(CellCoord, TreeSpecies)], clip: Rect) {
        let foliage: Vec<Vec<Leaf>> = trees
            .iter()
            .map(|(cell, species)| self.leaves(*cell, *species))
            .collect();

        for leaf in foliage.iter().flatten() {
            if clip.contains(leaf.at.x(), leaf.at.y()) {
                let _ = dungeon.set_canopy(leaf.at, leaf.color);
            }
        }

        for leaf in foliage.iter().flatten() {
            let target = leaf.at.offset(-self.config.shadow_offset, 0);
            if !clip.contains(target.x(), target.y()) {
                continue;
            }
            let covered = dungeon
                .canopy(target)
                .map_or(true, |color| !color.is_black());
            if !covered {
                dungeon.raise_shadow_height(target, leaf.shadow);
            }
        }
    }

    /// Pixels of one canopy in raster order.
    fn leaves(&self, cell: CellCoord, species: TreeSpecies) -> Vec<Leaf> {
        let mut rng = self.tree_rng(cell);
        let (centre_x, centre_y, radius_x, radius_y) = self.ellipse(cell, species.radius());
        let bias = species.color_bias();
        let mut leaves = Vec::new();

        for (x, y) in self.influence(cell, species.radius()).iter() {
            let dx = x as f32 + 0.5 - centre_x;
            let dy = y as f32 + 0.5 - centre_y;
            let normalized = (dx / radius_x).powi(2) + (dy / radius_y).powi(2);
            if normalized > 1.0 {
                continue;
            }

            let jitter: [f32; 3] = [
                rng.sample(StandardNormal),
                rng.sample(StandardNormal),
                rng.sample(StandardNormal),
            ];
            let outlier = rng.gen_bool(self.config.outlier_chance.clamp(0.0, 1.0));
            let color = match species.outlier() {
                Some(outlier_color) if outlier => outlier_color,
                _ => species.foliage().offset(
                    bias[0] + jitter[0] * self.config.jitter,
                    bias[1] + jitter[1] * self.config.jitter,
                    bias[2] + jitter[2] * self.config.jitter,
                ),
            };
            let distance = (dx * dx + dy * dy).sqrt();
            leaves.push(Leaf {
                at: SubCellCoord::new(x, y),
                color: if color.is_black() {
                    Color::from_rgb(1, 1, 1)
                } else {
                    color
                },
                shadow: self.config.shadow_height * self.config.shadow_decay.powf(distance),
            });
        }
        leaves
    }

    /// Trunk centre and radii (sub-cells), stretched horizontally by the font aspect.
    fn ellipse(&self, cell: CellCoord, radius: i32) -> (f32, f32, f32, f32) {
        let scale = SUB_CELLS_PER_CELL as f32;
        let radius = radius.max(0) as f32 + 0.5;
        (
            (cell.x() as f32 + 0.5) * scale,
            (cell.y() as f32 + 0.5) * scale,
            radius * self.config.font_aspect.max(0.1),
            radius,
        )
    }

    /// Sub-cells a tree can paint or shadow.
    fn influence(&self, cell: CellCoord, radius: i32) -> Rect {
        let (centre_x, centre_y, radius_x, radius_y) = self.ellipse(cell, radius);
        Rect::from_inclusive(
            (centre_x - radius_x).floor() as i32 - self.config.shadow_offset.max(0),
            (centre_y - radius_y).floor() as i32,
            (centre_x + radius_x).ceil() as i32,
            (centre_y + radius_y).ceil() as i32,
        )
    }

    fn tree_rng(&self, cell: CellCoord) -> ChaCha8Rng {
        let position = (u64::from(cell.x() as u32) << 32) | u64::from(cell.y() as u32);
        ChaCha8Rng::seed_from_u64(self.config.seed ^ position.wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }
}

#[cfg(test)]
mod tests {
    use emberfall_core::{config::DungeonConfig, TerrainKind};

    use super::*;

    fn grove() -> Dungeon {
        let mut dungeon = Dungeon::new(12, 10, DungeonConfig::default());
        let _ = dungeon.set_terrain(CellCoord::new(3, 4), TerrainKind::OakTree);
        let _ = dungeon.set_terrain(CellCoord::new(8, 5), TerrainKind::PineTree);
        dungeon.compute_shadow_heights();
        dungeon.snapshot_pre_tree_shadow();
        dungeon
    }

    #[test]
    fn trees_paint_around_their_trunk() {
        let mut dungeon = grove();
        let painter = CanopyPainter::new(CanopyConfig::default());
        assert_eq!(painter.recompute_all(&mut dungeon), 2);

        let trunk = CellCoord::new(3, 4).first_sub_cell().offset(1, 1);
        assert!(dungeon.canopy(trunk).is_some_and(|color| !color.is_black()));
        assert!(dungeon
            .canopy(SubCellCoord::new(23, 0))
            .is_some_and(|color| color.is_black()));
    }

    #[test]
    fn canopy_casts_shadow_west_of_its_edge() {
        let mut dungeon = grove();
        let painter = CanopyPainter::new(CanopyConfig::default());
        let _ = painter.recompute_all(&mut dungeon);

        let leftmost = (0..dungeon.sub_cell_bounds().width())
            .find(|x| {
                dungeon
                    .canopy(SubCellCoord::new(*x, 11))
                    .is_some_and(|color| !color.is_black())
            })
            .expect("oak canopy crosses row 11");
        let shadowed = SubCellCoord::new(leftmost - 1, 11);
        assert!(dungeon.shadow_height(shadowed).is_some_and(|height| height > 0.5));
    }

    #[test]
    fn same_position_paints_the_same_pixels() {
        let painter = CanopyPainter::new(CanopyConfig::default());
        let first: Vec<Color> = painter
            .leaves(CellCoord::new(4, 4), TreeSpecies::Apple)
            .iter()
            .map(|leaf| leaf.color)
            .collect();
        let second: Vec<Color> = painter
            .leaves(CellCoord::new(4, 4), TreeSpecies::Apple)
            .iter()
            .map(|leaf| leaf.color)
            .collect();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
