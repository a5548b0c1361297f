//! Nearest-cell searches over the dungeon.

use emberfall_core::{CellCoord, Rect, SimRng, TerrainKind, WalkPattern};
use rand::Rng;

use crate::Dungeon;

/// Exclusions applied by [`Dungeon::closest_walkable`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkableQuery {
    /// Accept the stairs cell.
    pub allow_stairs: bool,
    /// Accept cells that already hold a creature.
    pub allow_creatures: bool,
    /// Accept rippling water cells.
    pub allow_water: bool,
    /// Terrain rule of the creature being placed. When set it replaces the
    /// plain walkability test, so water-bound creatures find water.
    pub pattern: Option<WalkPattern>,
}

impl Dungeon {
    /// Nearest cell to `from` that is walkable and satisfies the query.
    ///
    /// `from` itself is returned unchanged when it already qualifies. The
    /// search scans square rings around `from` whose radius doubles each
    /// round; within a ring the first cell with the smallest squared
    /// distance in raster order wins. Returns `None` when `from` is outside
    /// the map or once a ring covering the whole map found nothing.
    #[must_use]
    pub fn closest_walkable(&self, from: CellCoord, query: WalkableQuery) -> Option<CellCoord> {
        if !self.contains(from) {
            return None;
        }
        if self.accepts(from, query) {
            return Some(from);
        }

        let limit = self.width.max(self.height);
        let mut inner = 0;
        let mut radius = 1;
        loop {
            let ring = Rect::around(from.x(), from.y(), radius).intersection(&self.bounds());
            let mut best: Option<(i64, CellCoord)> = None;
            for (x, y) in ring.iter().flat_map(|ring| ring.iter()) {
                let chebyshev = (x - from.x()).abs().max((y - from.y()).abs());
                if chebyshev <= inner {
                    continue;
                }
                let cell = CellCoord::new(x, y);
                if !self.accepts(cell, query) {
                    continue;
                }
                let distance = cell.distance_squared(from);
                if best.map_or(true, |(closest, _)| distance < closest) {
                    best = Some((distance, cell));
                }
            }
            if let Some((_, cell)) = best {
                return Some(cell);
            }
            if radius >= limit {
                return None;
            }
            inner = radius;
            radius = radius.saturating_mul(2);
        }
    }

    /// Picks a spawn source the player can neither see nor remember.
    ///
    /// Eligible sources are ranked by squared straight-line distance to
    /// `near`; one of the closest `spawn_source_candidates` is chosen
    /// uniformly at random.
    pub fn closest_spawn_source(&self, near: CellCoord, rng: &mut SimRng) -> Option<CellCoord> {
        let mut eligible: Vec<(i64, CellCoord)> = self
            .spawn_sources
            .iter()
            .copied()
            .filter(|source| !self.is_in_fov(*source) && !self.is_remembered(*source))
            .map(|source| (source.distance_squared(near), source))
            .collect();
        if eligible.is_empty() {
            return None;
        }
        eligible.sort_by_key(|(distance, _)| *distance);
        let candidates = self
            .config
            .spawn_source_candidates
            .clamp(1, eligible.len());
        let pick = rng.gen_range(0..candidates);
        Some(eligible[pick].1)
    }

    fn accepts(&self, cell: CellCoord, query: WalkableQuery) -> bool {
        let Some(slot) = self.cell(cell) else {
            return false;
        };
        let passable = match query.pattern {
            Some(pattern) => {
                pattern.walk_cost(slot.terrain()).is_some()
                    && slot.items().iter().all(|item| item.kind.walkable())
            }
            None => self.is_walkable(cell),
        };
        passable
            && (query.allow_stairs || slot.terrain() != TerrainKind::Stairs)
            && (query.allow_creatures || slot.creature_count() == 0)
            && (query.allow_water || !slot.terrain().ripples())
    }
}
