//! Item stacks on the dungeon.

use emberfall_core::{CellCoord, ItemId, ItemKind};

use crate::{
    cell::StackedItem,
    registry::{Registry, Tracked},
    Dungeon,
};

/// Item lying on a dungeon cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Item {
    id: ItemId,
    kind: ItemKind,
    cell: CellCoord,
}

impl Item {
    /// Identifier of the item.
    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    /// Type of the item.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Cell the item lies on.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }
}

impl Tracked for Item {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ItemStore {
    pub(crate) registry: Registry<Item>,
    pub(crate) next_id: u32,
}

impl Dungeon {
    /// Drops an item on top of the cell's stack and refreshes its properties.
    ///
    /// Returns `None` when the cell lies outside the map.
    pub fn add_item(&mut self, kind: ItemKind, cell: CellCoord) -> Option<ItemId> {
        let id = ItemId::new(self.items.next_id);
        self.cells
            .get_mut(cell.x(), cell.y())?
            .push_item(StackedItem { id, kind });
        self.items.next_id = self.items.next_id.wrapping_add(1);
        self.items.registry.insert(Item { id, kind, cell });
        self.refresh_cell_properties(cell);
        Some(id)
    }

    pub(crate) fn restore_item(&mut self, id: ItemId, kind: ItemKind, cell: CellCoord) -> bool {
        let Some(slot) = self.cells.get_mut(cell.x(), cell.y()) else {
            return false;
        };
        slot.push_item(StackedItem { id, kind });
        self.items.registry.insert(Item { id, kind, cell });
        self.refresh_cell_properties(cell);
        true
    }

    /// Takes an item off its cell and refreshes the cell's properties.
    pub fn remove_item(&mut self, id: ItemId) -> Option<Item> {
        let item = self.items.registry.remove(id)?;
        if let Some(slot) = self.cells.get_mut(item.cell.x(), item.cell.y()) {
            let _ = slot.take_item(id);
        }
        self.refresh_cell_properties(item.cell);
        Some(item)
    }

    /// Looks up an item, including ones queued during the current pass.
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.registry.get(id)
    }

    /// Every item present, including ones queued during the current pass.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.registry.iter()
    }

    /// Item stack of a cell, bottom first; empty when out of range.
    #[must_use]
    pub fn items_at(&self, cell: CellCoord) -> &[StackedItem] {
        self.cells
            .get(cell.x(), cell.y())
            .map(|slot| slot.items())
            .unwrap_or(&[])
    }

    /// Reports whether an item update pass is running.
    #[must_use]
    pub fn is_updating_items(&self) -> bool {
        self.items.registry.is_updating()
    }

    /// Runs `visit` once for every item present when the pass starts.
    pub fn update_items<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut Dungeon, ItemId),
    {
        let snapshot = self.items.registry.begin_pass();
        for id in snapshot {
            if self.items.registry.is_live(id) {
                visit(self, id);
            }
        }
        self.items.registry.end_pass();
    }
}

#[cfg(test)]
mod tests {
    use emberfall_core::{config::DungeonConfig, TerrainKind};

    use super::*;

    #[test]
    fn stacking_blocks_and_unblocks_the_cell() {
        let mut dungeon = Dungeon::new(4, 4, DungeonConfig::default());
        let cell = CellCoord::new(1, 2);
        let potion = dungeon
            .add_item(ItemKind::HealthPotion, cell)
            .expect("in bounds");
        let crate_id = dungeon.add_item(ItemKind::Crate, cell).expect("in bounds");

        assert_eq!(dungeon.items_at(cell).len(), 2);
        assert_eq!(dungeon.items_at(cell)[0].id, potion);
        assert!(!dungeon.is_walkable(cell));
        assert!(!dungeon.is_transparent(cell));

        let _ = dungeon.remove_item(crate_id);
        assert!(dungeon.is_walkable(cell));
        assert!(dungeon.is_transparent(cell));
        assert_eq!(dungeon.terrain(cell), Some(TerrainKind::Floor));
    }

    #[test]
    fn items_dropped_during_a_pass_wait_for_the_next() {
        let mut dungeon = Dungeon::new(4, 4, DungeonConfig::default());
        let first = dungeon
            .add_item(ItemKind::Torch, CellCoord::new(0, 0))
            .expect("in bounds");

        let mut visited = Vec::new();
        dungeon.update_items(|dungeon, id| {
            visited.push(id);
            let _ = dungeon.add_item(ItemKind::Scroll, CellCoord::new(1, 0));
        });
        assert_eq!(visited, vec![first]);

        let mut next = Vec::new();
        dungeon.update_items(|_, id| next.push(id));
        assert_eq!(next.len(), 2);
    }
}
