//! Entity collections that defer additions made while they are being iterated.

/// Entity stored in a [`Registry`].
pub(crate) trait Tracked {
    /// Identifier type.
    type Id: Copy + Eq;

    /// Identifier of the entity.
    fn id(&self) -> Self::Id;
}

/// Live entities plus a side buffer of additions queued during an update pass.
#[derive(Clone, Debug)]
pub(crate) struct Registry<T> {
    live: Vec<T>,
    pending: Vec<T>,
    updating: bool,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            live: Vec::new(),
            pending: Vec::new(),
            updating: false,
        }
    }
}

impl<T: Tracked> Registry<T> {
    pub(crate) fn is_updating(&self) -> bool {
        self.updating
    }

    /// Inserts an entity, queueing it when a pass is in progress.
    pub(crate) fn insert(&mut self, entity: T) {
        if self.updating {
            self.pending.push(entity);
        } else {
            self.live.push(entity);
        }
    }

    pub(crate) fn remove(&mut self, id: T::Id) -> Option<T> {
        if let Some(index) = self.live.iter().position(|entity| entity.id() == id) {
            return Some(self.live.remove(index));
        }
        let index = self.pending.iter().position(|entity| entity.id() == id)?;
        Some(self.pending.remove(index))
    }

    pub(crate) fn get(&self, id: T::Id) -> Option<&T> {
        self.iter().find(|entity| entity.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        self.live
            .iter_mut()
            .chain(self.pending.iter_mut())
            .find(|entity| entity.id() == id)
    }

    /// Every entity present, queued ones last.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.live.iter().chain(self.pending.iter())
    }

    pub(crate) fn len(&self) -> usize {
        self.live.len() + self.pending.len()
    }

    pub(crate) fn is_live(&self, id: T::Id) -> bool {
        self.live.iter().any(|entity| entity.id() == id)
    }

    /// Starts a pass and returns the identifiers it will visit.
    pub(crate) fn begin_pass(&mut self) -> Vec<T::Id> {
        debug_assert!(!self.updating, "nested update pass");
        self.updating = true;
        self.live.iter().map(Tracked::id).collect()
    }

    /// Ends a pass, making queued additions visible to the next one.
    pub(crate) fn end_pass(&mut self) {
        self.updating = false;
        self.live.append(&mut self.pending);
    }
}
