//! Per-component-type columnar storage
//!
//! A column is a dense vector of `(entity, value)` slots. Removing a component
//! leaves a tombstone (`value == None`) so slot indices held by entity
//! component tables stay valid until the next compaction.

use std::any::Any;

use super::index::EntityId;

struct Slot<C> {
    id: EntityId,
    value: Option<C>,
}

/// Typed storage for one component type
pub(crate) struct Column<C> {
    slots: Vec<Slot<C>>,
    live: usize,
}

impl<C: 'static> Column<C> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }

    /// Append a new live slot and return its index
    pub fn push(&mut self, id: EntityId, value: C) -> usize {
        self.slots.push(Slot {
            id,
            value: Some(value),
        });
        self.live += 1;
        self.slots.len() - 1
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Option<&C> {
        self.slots.get(slot)?.value.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut C> {
        self.slots.get_mut(slot)?.value.as_mut()
    }

    /// Live values in slot order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &C)> {
        self.slots
            .iter()
            .filter_map(|s| s.value.as_ref().map(|v| (s.id, v)))
    }
}

/// Type-erased column operations used by the index
pub(crate) trait AnyColumn {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Turn a slot into a tombstone (no-op if already one)
    fn clear_slot(&mut self, slot: usize);

    /// Drop tombstones, preserving the relative order of live slots. Returns
    /// the new slot of every survivor.
    fn compact(&mut self) -> Vec<(EntityId, usize)>;

    /// Total slots including tombstones
    fn len(&self) -> usize;

    /// Live slots
    fn live(&self) -> usize;

    /// Owner of a live slot; `None` for tombstones and out-of-range slots
    fn entity_at(&self, slot: usize) -> Option<EntityId>;
}

impl<C: 'static> AnyColumn for Column<C> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clear_slot(&mut self, slot: usize) {
        if let Some(s) = self.slots.get_mut(slot) {
            if s.value.take().is_some() {
                self.live -= 1;
            }
        }
    }

    fn compact(&mut self) -> Vec<(EntityId, usize)> {
        if self.live == self.slots.len() {
            return Vec::new();
        }
        self.slots.retain(|s| s.value.is_some());
        self.slots
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, i))
            .collect()
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn live(&self) -> usize {
        self.live
    }

    fn entity_at(&self, slot: usize) -> Option<EntityId> {
        self.slots
            .get(slot)
            .filter(|s| s.value.is_some())
            .map(|s| s.id)
    }
}
