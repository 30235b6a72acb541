//! Entity index: entity ids, per-entity component tables and typed columns
//!
//! - Ids are handed out in increasing order starting at 1 and are never reused
//!   by the same index, so a stale id simply fails lookup
//! - Each component type gets a column on first use; columns are kept in
//!   registration order so type-erased passes are deterministic
//! - Removal leaves a tombstone; `compact()` squeezes them out and is deferred
//!   while any iteration is running
//! - Add/remove observers run synchronously and may mutate the index

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::column::{AnyColumn, Column};

/// Opaque entity identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u32);

impl EntityId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Observer invoked when a component is added to or removed from an entity
pub type ComponentCallback = Rc<dyn Fn(EntityHandle<'_>)>;

#[derive(Default)]
struct Observers {
    on_add: Vec<ComponentCallback>,
    on_remove: Vec<ComponentCallback>,
}

/// Type index -> slot in that type's column
#[derive(Default)]
struct ComponentTable {
    slots: Vec<Option<usize>>,
}

impl ComponentTable {
    fn get(&self, type_index: usize) -> Option<usize> {
        self.slots.get(type_index).copied().flatten()
    }

    fn set(&mut self, type_index: usize, slot: usize) {
        if self.slots.len() <= type_index {
            self.slots.resize(type_index + 1, None);
        }
        self.slots[type_index] = Some(slot);
    }

    fn take(&mut self, type_index: usize) -> Option<usize> {
        self.slots.get_mut(type_index)?.take()
    }

    fn present(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|_| i))
            .collect()
    }
}

/// Position within one column's iteration pass.
///
/// Obtained from [`EntityIndex::cursor`] and handed back through
/// [`EntityIndex::end_iteration`]; while it is outstanding, compaction is
/// deferred.
#[derive(Debug)]
#[must_use = "a cursor must be handed back through EntityIndex::end_iteration"]
pub struct Cursor {
    type_index: usize,
    next: usize,
    end: Option<usize>,
}

/// Sparse typed component storage keyed by [`EntityId`]
pub struct EntityIndex {
    next_id: u32,
    entities: HashMap<EntityId, ComponentTable>,
    type_ids: HashMap<TypeId, usize>,
    columns: Vec<Box<dyn AnyColumn>>,
    observers: Vec<Observers>,
    iterating: u32,
    compact_pending: bool,
    removing: Vec<(EntityId, usize)>,
    /// Entities inside `destroy`; a nested destroy of the same id returns
    dying: Vec<EntityId>,
    /// Destroyed while an outer removal still held one of their components
    retire_pending: Vec<EntityId>,
}

impl Default for EntityIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityIndex {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entities: HashMap::new(),
            type_ids: HashMap::new(),
            columns: Vec::new(),
            observers: Vec::new(),
            iterating: 0,
            compact_pending: false,
            removing: Vec::new(),
            dying: Vec::new(),
            retire_pending: Vec::new(),
        }
    }

    /// Allocate a fresh entity with no components
    pub fn create(&mut self) -> EntityHandle<'_> {
        let id = EntityId(self.next_id);
        // Wraps only after 2^32 creations
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.entities.insert(id, ComponentTable::default());
        EntityHandle { index: self, id }
    }

    /// Allocate an entity and emplace each component of `bundle` in order
    pub fn create_with<B: Bundle>(&mut self, bundle: B) -> EntityHandle<'_> {
        let mut handle = self.create();
        bundle.emplace_into(&mut handle);
        handle
    }

    /// Remove every component (observers fire) and retire the id. Unknown ids
    /// are ignored, as is a destroy issued from an observer while the same
    /// entity is already being destroyed.
    pub fn destroy(&mut self, id: EntityId) {
        if !self.entities.contains_key(&id) || self.dying.contains(&id) {
            return;
        }
        self.dying.push(id);
        // Remove observers may add components back; keep clearing until only
        // components held by an outer removal remain
        loop {
            let Some(table) = self.entities.get(&id) else {
                break;
            };
            let present: Vec<usize> = table
                .present()
                .into_iter()
                .filter(|&ti| !self.removing.contains(&(id, ti)))
                .collect();
            if present.is_empty() {
                break;
            }
            for type_index in present {
                self.remove_at(id, type_index);
            }
        }
        self.dying.retain(|&d| d != id);
        if self.is_removing(id) {
            // The outer removal retires the id once its slot is taken
            self.retire_pending.push(id);
        } else {
            self.entities.remove(&id);
        }
    }

    fn is_removing(&self, id: EntityId) -> bool {
        self.removing.iter().any(|&(e, _)| e == id)
    }

    pub fn get(&mut self, id: EntityId) -> Option<EntityHandle<'_>> {
        if self.entities.contains_key(&id) {
            Some(EntityHandle { index: self, id })
        } else {
            None
        }
    }

    pub fn get_ref(&self, id: EntityId) -> Option<EntityRef<'_>> {
        self.entities
            .contains_key(&id)
            .then_some(EntityRef { index: self, id })
    }

    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of live components of type `C`
    pub fn count<C: 'static>(&self) -> usize {
        self.existing_type_index::<C>()
            .map_or(0, |ti| self.columns[ti].live())
    }

    /// Owners of live `C` components, in storage order
    pub fn ids<C: 'static>(&self) -> Vec<EntityId> {
        self.components::<C>().map(|(id, _)| id).collect()
    }

    /// Live `C` components in storage order
    pub fn components<C: 'static>(&self) -> impl Iterator<Item = (EntityId, &C)> {
        self.existing_type_index::<C>()
            .and_then(|ti| self.column::<C>(ti))
            .into_iter()
            .flat_map(|column| column.iter())
    }

    pub fn on_component_add<C: 'static>(&mut self, callback: impl Fn(EntityHandle<'_>) + 'static) {
        let ti = self.type_index::<C>();
        self.observers[ti].on_add.push(Rc::new(callback));
    }

    pub fn on_component_remove<C: 'static>(
        &mut self,
        callback: impl Fn(EntityHandle<'_>) + 'static,
    ) {
        let ti = self.type_index::<C>();
        self.observers[ti].on_remove.push(Rc::new(callback));
    }

    /// Squeeze tombstones out of every column. Relative order of live
    /// components is preserved; references into columns are invalidated.
    pub fn compact(&mut self) {
        if self.iterating > 0 {
            self.compact_pending = true;
            return;
        }
        self.compact_pending = false;
        let mut moved_total = 0;
        for (ti, column) in self.columns.iter_mut().enumerate() {
            let moved = column.compact();
            moved_total += moved.len();
            for (id, slot) in moved {
                if let Some(table) = self.entities.get_mut(&id) {
                    table.set(ti, slot);
                }
            }
        }
        if moved_total > 0 {
            log::debug!("ECS compacted, {moved_total} components re-slotted");
        }
    }

    /// Visit every live `C` component.
    ///
    /// With `include_new == false`, components added after the pass starts are
    /// not visited. Removing or destroying anything (including the entity
    /// being visited) is allowed; tombstoned slots are skipped.
    pub fn iterate<C: 'static>(&mut self, include_new: bool, mut f: impl FnMut(EntityHandle<'_>)) {
        let mut cursor = self.cursor::<C>(include_new);
        while let Some(id) = self.advance(&mut cursor) {
            f(EntityHandle { index: self, id });
        }
        self.end_iteration(cursor);
    }

    /// Read-only pass over `C` in storage order
    pub fn iterate_ref<C: 'static>(&self, mut f: impl FnMut(EntityRef<'_>, &C)) {
        for (id, component) in self.components::<C>() {
            f(EntityRef { index: self, id }, component);
        }
    }

    /// Start a non-borrowing pass over `C`
    pub fn cursor<C: 'static>(&mut self, include_new: bool) -> Cursor {
        let type_index = self.type_index::<C>();
        self.iterating += 1;
        Cursor {
            type_index,
            next: 0,
            end: (!include_new).then(|| self.columns[type_index].len()),
        }
    }

    /// Next live entity in the cursor's column, or `None` at the end
    pub fn advance(&self, cursor: &mut Cursor) -> Option<EntityId> {
        let column = &self.columns[cursor.type_index];
        let limit = cursor.end.unwrap_or_else(|| column.len());
        while cursor.next < limit {
            let slot = cursor.next;
            cursor.next += 1;
            if let Some(id) = column.entity_at(slot) {
                return Some(id);
            }
        }
        None
    }

    /// Finish a pass; runs a deferred compaction once the outermost pass ends
    pub fn end_iteration(&mut self, _cursor: Cursor) {
        self.iterating = self.iterating.saturating_sub(1);
        if self.iterating == 0 && self.compact_pending {
            self.compact();
        }
    }

    fn type_index<C: 'static>(&mut self) -> usize {
        if let Some(&ti) = self.type_ids.get(&TypeId::of::<C>()) {
            return ti;
        }
        let ti = self.columns.len();
        self.columns.push(Box::new(Column::<C>::new()));
        self.observers.push(Observers::default());
        self.type_ids.insert(TypeId::of::<C>(), ti);
        ti
    }

    fn existing_type_index<C: 'static>(&self) -> Option<usize> {
        self.type_ids.get(&TypeId::of::<C>()).copied()
    }

    fn column<C: 'static>(&self, ti: usize) -> Option<&Column<C>> {
        self.columns.get(ti)?.as_any().downcast_ref()
    }

    fn column_mut<C: 'static>(&mut self, ti: usize) -> Option<&mut Column<C>> {
        self.columns.get_mut(ti)?.as_any_mut().downcast_mut()
    }

    fn slot_of(&self, id: EntityId, ti: usize) -> Option<usize> {
        self.entities.get(&id)?.get(ti)
    }

    /// `C` of entity `id`, if both exist
    pub fn component<C: 'static>(&self, id: EntityId) -> Option<&C> {
        let ti = self.existing_type_index::<C>()?;
        let slot = self.slot_of(id, ti)?;
        self.column::<C>(ti)?.get(slot)
    }

    pub fn component_mut<C: 'static>(&mut self, id: EntityId) -> Option<&mut C> {
        let ti = self.existing_type_index::<C>()?;
        let slot = self.slot_of(id, ti)?;
        self.column_mut::<C>(ti)?.get_mut(slot)
    }

    fn emplace_component<C: 'static>(&mut self, id: EntityId, value: C) {
        let ti = self.type_index::<C>();
        if !self.entities.contains_key(&id) {
            log::warn!("emplace on missing entity {id} ignored");
            return;
        }
        if let Some(slot) = self.slot_of(id, ti) {
            // Overwrite in place; observers only see absent -> present
            if let Some(existing) = self.column_mut::<C>(ti).and_then(|c| c.get_mut(slot)) {
                *existing = value;
            }
            return;
        }
        let Some(column) = self.column_mut::<C>(ti) else {
            return;
        };
        let slot = column.push(id, value);
        if let Some(table) = self.entities.get_mut(&id) {
            table.set(ti, slot);
        }

        let callbacks = self.observers[ti].on_add.clone();
        for callback in callbacks {
            if !self.contains(id) {
                break;
            }
            callback(EntityHandle { index: self, id });
        }
    }

    fn remove_at(&mut self, id: EntityId, ti: usize) {
        // Linked entities may ask to remove a component already on its way out
        if self.slot_of(id, ti).is_none() || self.removing.contains(&(id, ti)) {
            return;
        }
        self.removing.push((id, ti));
        // Observers see the component before it is cleared
        let callbacks = self.observers[ti].on_remove.clone();
        for callback in callbacks {
            if self.slot_of(id, ti).is_none() {
                break;
            }
            callback(EntityHandle { index: self, id });
        }
        self.removing.retain(|&key| key != (id, ti));
        if let Some(slot) = self.entities.get_mut(&id).and_then(|t| t.take(ti)) {
            self.columns[ti].clear_slot(slot);
        }
        if self.retire_pending.contains(&id) && !self.is_removing(id) {
            self.retire_pending.retain(|&d| d != id);
            self.destroy(id);
        }
    }
}

/// Mutable view of one entity
pub struct EntityHandle<'a> {
    index: &'a mut EntityIndex,
    id: EntityId,
}

impl<'a> EntityHandle<'a> {
    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// False once the entity has been destroyed (e.g. by an observer)
    pub fn is_alive(&self) -> bool {
        self.index.contains(self.id)
    }

    pub fn has<C: 'static>(&self) -> bool {
        self.index
            .existing_type_index::<C>()
            .and_then(|ti| self.index.slot_of(self.id, ti))
            .is_some()
    }

    pub fn get<C: 'static>(&self) -> Option<&C> {
        self.index.component(self.id)
    }

    pub fn get_mut<C: 'static>(&mut self) -> Option<&mut C> {
        self.index.component_mut(self.id)
    }

    /// Insert or overwrite `C`. Add observers fire only on first insertion.
    pub fn emplace<C: 'static>(&mut self, value: C) -> &mut Self {
        self.index.emplace_component(self.id, value);
        self
    }

    /// Insert or overwrite `C` and return it. `None` when an add observer
    /// removed it again or the entity is gone.
    pub fn emplace_get<C: 'static>(&mut self, value: C) -> Option<&mut C> {
        self.index.emplace_component(self.id, value);
        self.index.component_mut(self.id)
    }

    /// Remove `C` if present, firing remove observers first
    pub fn remove<C: 'static>(&mut self) -> &mut Self {
        if let Some(ti) = self.index.existing_type_index::<C>() {
            self.index.remove_at(self.id, ti);
        }
        self
    }

    /// Remove every component; the entity itself stays alive
    pub fn clear(&mut self) {
        let present = self
            .index
            .entities
            .get(&self.id)
            .map(ComponentTable::present)
            .unwrap_or_default();
        for ti in present {
            self.index.remove_at(self.id, ti);
        }
    }

    /// The owning index, for creating or looking up other entities
    pub fn index(&mut self) -> &mut EntityIndex {
        self.index
    }

    pub fn reborrow(&mut self) -> EntityHandle<'_> {
        EntityHandle {
            index: self.index,
            id: self.id,
        }
    }

    pub fn as_ref(&self) -> EntityRef<'_> {
        EntityRef {
            index: self.index,
            id: self.id,
        }
    }
}

/// Read-only view of one entity
#[derive(Clone, Copy)]
pub struct EntityRef<'a> {
    index: &'a EntityIndex,
    id: EntityId,
}

impl<'a> EntityRef<'a> {
    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn has<C: 'static>(&self) -> bool {
        self.get::<C>().is_some()
    }

    pub fn get<C: 'static>(&self) -> Option<&'a C> {
        self.index.component(self.id)
    }

    pub fn index(&self) -> &'a EntityIndex {
        self.index
    }
}

/// Component tuples accepted by [`EntityIndex::create_with`]
pub trait Bundle {
    fn emplace_into(self, handle: &mut EntityHandle<'_>);
}

macro_rules! impl_bundle {
    ($($name:ident),+) => {
        impl<$($name: 'static),+> Bundle for ($($name,)+) {
            #[allow(non_snake_case)]
            fn emplace_into(self, handle: &mut EntityHandle<'_>) {
                let ($($name,)+) = self;
                $(handle.emplace($name);)+
            }
        }
    };
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);
