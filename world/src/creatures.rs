//! Creature and corpse bookkeeping on the dungeon.

use emberfall_core::{CellCoord, CreatureId, CreatureKind, Position};

use crate::{
    registry::{Registry, Tracked},
    Dungeon,
};

/// Creature physically present in the dungeon.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Creature {
    id: CreatureId,
    kind: CreatureKind,
    position: Position,
}

impl Creature {
    /// Identifier of the creature.
    #[must_use]
    pub const fn id(&self) -> CreatureId {
        self.id
    }

    /// Type of the creature.
    #[must_use]
    pub const fn kind(&self) -> CreatureKind {
        self.kind
    }

    /// Current location in cell units.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Cell whose occupancy counter accounts for the creature.
    #[must_use]
    pub fn cell(&self) -> CellCoord {
        self.position.cell()
    }
}

impl Tracked for Creature {
    type Id = CreatureId;

    fn id(&self) -> CreatureId {
        self.id
    }
}

/// Remains left behind by a killed creature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corpse {
    /// Type of the creature that died.
    pub kind: CreatureKind,
    /// Location where it died.
    pub position: Position,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct CreatureStore {
    pub(crate) registry: Registry<Creature>,
    pub(crate) next_id: u32,
}

impl CreatureStore {
    fn allocate(&mut self) -> CreatureId {
        let id = CreatureId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }
}

impl Dungeon {
    /// Places a creature and accounts for it in the occupancy of its cell.
    ///
    /// During an update pass the creature is queued and only becomes part of
    /// the iterated collection on the next pass; its occupancy is recorded
    /// immediately. Returns `None` when the position lies outside the map.
    pub fn add_creature(&mut self, kind: CreatureKind, position: Position) -> Option<CreatureId> {
        let cell = position.cell();
        self.cells.get_mut(cell.x(), cell.y())?.occupy();
        let id = self.creatures.allocate();
        self.creatures.registry.insert(Creature { id, kind, position });
        Some(id)
    }

    /// Removes a creature, optionally leaving a corpse behind.
    ///
    /// Only the first corpse on a cell is kept; later ones are discarded.
    pub fn remove_creature(&mut self, id: CreatureId, kill: bool) -> Option<Creature> {
        let creature = self.creatures.registry.remove(id)?;
        let cell = creature.cell();
        if let Some(slot) = self.cells.get_mut(cell.x(), cell.y()) {
            slot.vacate();
            if kill {
                if slot.has_corpse() {
                    log::debug!(
                        "discarding corpse of {} at ({}, {}): cell already holds one",
                        creature.kind.name(),
                        cell.x(),
                        cell.y()
                    );
                } else {
                    slot.set_corpse(true);
                    self.corpses.push(Corpse {
                        kind: creature.kind,
                        position: creature.position,
                    });
                }
            }
        }
        Some(creature)
    }

    /// Moves a creature, transferring its occupancy between cells.
    ///
    /// Returns `false` when the creature is unknown or the target lies outside the map.
    pub fn move_creature(&mut self, id: CreatureId, to: Position) -> bool {
        let target = to.cell();
        if !self.cells.in_bounds(target.x(), target.y()) {
            return false;
        }
        let Some(creature) = self.creatures.registry.get_mut(id) else {
            return false;
        };
        let from = creature.cell();
        creature.position = to;
        if from != target {
            self.cells[(from.x(), from.y())].vacate();
            self.cells[(target.x(), target.y())].occupy();
        }
        true
    }

    /// Looks up a creature, including ones queued during the current pass.
    #[must_use]
    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.registry.get(id)
    }

    /// Every creature present, including ones queued during the current pass.
    pub fn creatures(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.registry.iter()
    }

    /// Number of creatures present.
    #[must_use]
    pub fn creature_count(&self) -> usize {
        self.creatures.registry.len()
    }

    /// Reports whether a creature update pass is running.
    #[must_use]
    pub fn is_updating_creatures(&self) -> bool {
        self.creatures.registry.is_updating()
    }

    /// Runs `visit` once for every creature present when the pass starts.
    ///
    /// Creatures removed earlier in the pass are skipped. Creatures added
    /// during the pass are merged in once it completes.
    pub fn update_creatures<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut Dungeon, CreatureId),
    {
        let snapshot = self.creatures.registry.begin_pass();
        for id in snapshot {
            if self.creatures.registry.is_live(id) {
                visit(self, id);
            }
        }
        self.creatures.registry.end_pass();
    }

    /// Corpses in the order they were left.
    #[must_use]
    pub fn corpses(&self) -> &[Corpse] {
        &self.corpses
    }

    /// Reports whether a corpse lies on the cell; `false` when out of range.
    #[must_use]
    pub fn has_corpse(&self, cell: CellCoord) -> bool {
        self.cells
            .get(cell.x(), cell.y())
            .is_some_and(|slot| slot.has_corpse())
    }

    /// Number of creatures standing on the cell; zero when out of range.
    #[must_use]
    pub fn creatures_at(&self, cell: CellCoord) -> u16 {
        self.cells
            .get(cell.x(), cell.y())
            .map_or(0, |slot| slot.creature_count())
    }

    pub(crate) fn restore_creature(
        &mut self,
        id: CreatureId,
        kind: CreatureKind,
        position: Position,
    ) -> bool {
        let cell = position.cell();
        let Some(slot) = self.cells.get_mut(cell.x(), cell.y()) else {
            return false;
        };
        slot.occupy();
        self.creatures.registry.insert(Creature { id, kind, position });
        true
    }

    pub(crate) fn insert_corpse(&mut self, corpse: Corpse) {
        let cell = corpse.position.cell();
        if let Some(slot) = self.cells.get_mut(cell.x(), cell.y()) {
            if !slot.has_corpse() {
                slot.set_corpse(true);
                self.corpses.push(corpse);
            }
        }
    }
}
