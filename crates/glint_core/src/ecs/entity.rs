//! # Entity Management
//!
//! Entities are dense `u32` slot indices. The [`EntityRegistry`] owns the
//! ordered sequence of slots; a slot is either free or holds the bitset of
//! component types attached to the live entity occupying it.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use super::bitset::ComponentBitset;

/// Default ceiling on simultaneously live entity slots.
pub const MAX_NUM_ENTITIES: usize = 10_000;

/// Unique identifier for a live entity within one manager.
///
/// Identifiers are reused after deletion: the lowest freed index is handed
/// out again before the registry grows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates an ID from a slot index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for EntityId {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Slot table of live entities and their attached-component bitsets.
///
/// Free indices are kept in a min-heap so slot reuse always picks the
/// smallest one.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    /// `None` = free, `Some(bits)` = live.
    slots: Vec<Option<ComponentBitset>>,
    /// Exactly the indices of `None` slots.
    free_indices: BinaryHeap<Reverse<u32>>,
    /// Number of `Some` slots.
    live_count: usize,
    /// Hard ceiling on `slots.len()`.
    max_entities: usize,
}

impl EntityRegistry {
    /// Creates an empty registry with the given slot ceiling.
    ///
    /// # Panics
    ///
    /// Panics if `max_entities` is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn new(max_entities: usize) -> Self {
        Self::with_reserve(max_entities, 0)
    }

    /// Creates an empty registry and pre-allocates `reserve` slots.
    ///
    /// # Panics
    ///
    /// Panics if `max_entities` is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn with_reserve(max_entities: usize, reserve: usize) -> Self {
        assert!(max_entities > 0, "Capacity must be greater than zero");
        assert!(
            u32::try_from(max_entities).is_ok(),
            "Capacity cannot exceed u32::MAX"
        );

        Self {
            slots: Vec::with_capacity(reserve.min(max_entities)),
            free_indices: BinaryHeap::new(),
            live_count: 0,
            max_entities,
        }
    }

    /// Claims a slot for a new entity with no components.
    ///
    /// Returns the smallest free index if there is one, otherwise appends a
    /// slot. Returns `None` without mutating anything once the ceiling is
    /// reached.
    pub fn new_entity_slot(&mut self) -> Option<EntityId> {
        if let Some(Reverse(index)) = self.free_indices.pop() {
            self.slots[index as usize] = Some(ComponentBitset::EMPTY);
            self.live_count += 1;
            return Some(EntityId(index));
        }

        if self.slots.len() >= self.max_entities {
            return None;
        }

        // Bounded by max_entities, which fits in u32.
        let index = u32::try_from(self.slots.len()).ok()?;
        self.slots.push(Some(ComponentBitset::EMPTY));
        self.live_count += 1;
        Some(EntityId(index))
    }

    /// Returns `true` if `id` is in range and its slot is live.
    #[inline]
    #[must_use]
    pub fn is_valid(&self, id: EntityId) -> bool {
        matches!(self.slots.get(id.slot()), Some(Some(_)))
    }

    /// Returns the live bitset for `id`.
    #[inline]
    #[must_use]
    pub fn bits(&self, id: EntityId) -> Option<ComponentBitset> {
        self.slots.get(id.slot()).copied().flatten()
    }

    /// Sets `type_index` on a live entity. No-op on free slots.
    #[inline]
    pub fn set_bit(&mut self, id: EntityId, type_index: usize) {
        if let Some(Some(bits)) = self.slots.get_mut(id.slot()) {
            bits.set(type_index);
        } else {
            debug_assert!(false, "set_bit on invalid {id}");
        }
    }

    /// Clears `type_index` on a live entity. No-op on free slots.
    #[inline]
    pub fn clear_bit(&mut self, id: EntityId, type_index: usize) {
        if let Some(Some(bits)) = self.slots.get_mut(id.slot()) {
            bits.clear(type_index);
        } else {
            debug_assert!(false, "clear_bit on invalid {id}");
        }
    }

    /// Frees the slot regardless of its bitset.
    ///
    /// The caller must already have removed the backing component data.
    /// Returns `false` if the slot was not live.
    pub fn free_slot(&mut self, id: EntityId) -> bool {
        match self.slots.get_mut(id.slot()) {
            Some(slot @ Some(_)) => {
                *slot = None;
                self.free_indices.push(Reverse(id.0));
                self.live_count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Returns `true` iff `id` is live and its bitset is a superset of `mask`.
    #[inline]
    #[must_use]
    pub fn has_all(&self, id: EntityId, mask: ComponentBitset) -> bool {
        self.bits(id).is_some_and(|bits| bits.contains_all(mask))
    }

    /// Number of slots ever allocated (live and free).
    #[inline]
    #[must_use]
    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live_count
    }

    /// The slot ceiling.
    #[inline]
    #[must_use]
    pub const fn max_entities(&self) -> usize {
        self.max_entities
    }

    /// Raw slot table, indexed by entity ID.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[Option<ComponentBitset>] {
        &self.slots
    }

    /// Iterates live entities and their bitsets in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, ComponentBitset)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let bits = (*slot)?;
            // Slot count is bounded by max_entities, which fits in u32.
            let index = u32::try_from(index).ok()?;
            Some((EntityId(index), bits))
        })
    }

    /// Drops every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_indices.clear();
        self.live_count = 0;
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new(MAX_NUM_ENTITIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId::new(7).to_string(), "Entity(7)");
        assert_eq!(EntityId::from(3).index(), 3);
    }

    #[test]
    fn test_new_slots_are_dense() {
        let mut registry = EntityRegistry::new(100);
        for expected in 0..10 {
            assert_eq!(registry.new_entity_slot(), Some(EntityId::new(expected)));
        }
        assert_eq!(registry.num_slots(), 10);
        assert_eq!(registry.live_count(), 10);
    }

    #[test]
    fn test_reuses_lowest_free_slot() {
        let mut registry = EntityRegistry::new(100);
        for _ in 0..10 {
            registry.new_entity_slot();
        }

        assert!(registry.free_slot(EntityId::new(7)));
        assert!(registry.free_slot(EntityId::new(2)));
        assert!(registry.free_slot(EntityId::new(5)));

        assert_eq!(registry.new_entity_slot(), Some(EntityId::new(2)));
        assert_eq!(registry.new_entity_slot(), Some(EntityId::new(5)));
        assert_eq!(registry.new_entity_slot(), Some(EntityId::new(7)));
        assert_eq!(registry.new_entity_slot(), Some(EntityId::new(10)));
    }

    #[test]
    fn test_capacity_ceiling() {
        let mut registry = EntityRegistry::new(3);
        assert!(registry.new_entity_slot().is_some());
        assert!(registry.new_entity_slot().is_some());
        assert!(registry.new_entity_slot().is_some());
        assert_eq!(registry.new_entity_slot(), None);
        assert_eq!(registry.num_slots(), 3);

        registry.free_slot(EntityId::new(1));
        assert_eq!(registry.new_entity_slot(), Some(EntityId::new(1)));
        assert_eq!(registry.new_entity_slot(), None);
    }

    #[test]
    fn test_validity() {
        let mut registry = EntityRegistry::new(10);
        assert!(!registry.is_valid(EntityId::new(0)));

        let id = registry.new_entity_slot().unwrap();
        assert!(registry.is_valid(id));
        assert!(!registry.is_valid(EntityId::new(5)));

        assert!(registry.free_slot(id));
        assert!(!registry.is_valid(id));
        assert!(!registry.free_slot(id));
    }

    #[test]
    fn test_bits_and_has_all() {
        let mut registry = EntityRegistry::new(10);
        let id = registry.new_entity_slot().unwrap();
        assert_eq!(registry.bits(id), Some(ComponentBitset::EMPTY));

        registry.set_bit(id, 0);
        registry.set_bit(id, 2);
        assert!(registry.has_all(id, ComponentBitset::from_bits(0b101)));
        assert!(!registry.has_all(id, ComponentBitset::from_bits(0b111)));

        registry.clear_bit(id, 0);
        assert!(!registry.has_all(id, ComponentBitset::single(0)));
        assert!(registry.has_all(id, ComponentBitset::single(2)));
    }

    #[test]
    fn test_freed_slot_comes_back_empty() {
        let mut registry = EntityRegistry::new(10);
        let id = registry.new_entity_slot().unwrap();
        registry.set_bit(id, 3);
        registry.free_slot(id);

        assert!(!registry.has_all(id, ComponentBitset::EMPTY));
        let reused = registry.new_entity_slot().unwrap();
        assert_eq!(reused, id);
        assert_eq!(registry.bits(reused), Some(ComponentBitset::EMPTY));
    }

    #[test]
    fn test_iter_skips_free_slots() {
        let mut registry = EntityRegistry::new(10);
        for _ in 0..5 {
            registry.new_entity_slot();
        }
        registry.free_slot(EntityId::new(1));
        registry.free_slot(EntityId::new(3));

        let ids: Vec<u32> = registry.iter().map(|(id, _)| id.index()).collect();
        assert_eq!(ids, vec![0, 2, 4]);
    }
}
