//! # ECS Manager
//!
//! The central container for all entities and components. The set of
//! component types is fixed at compile time by the [`ComponentSet`] the
//! manager is instantiated over; every typed operation resolves its
//! storage and bit index statically.

use std::any::type_name;
use std::fmt;

use super::bitset::ComponentBitset;
use super::component::{ComponentSet, Contains, OwnedComponent};
use super::entity::{EntityId, EntityRegistry, MAX_NUM_ENTITIES};
use super::query::{GetAll, GetAllMut, Query, ReadOnlyQuery};
use super::storage::ComponentStorage;
use crate::config::EcsConfig;
use crate::error::{ConfigError, EcsError, EcsResult};

/// Owns the entity registry and one storage per component type in `C`.
///
/// An entity's bitset and the storages are kept in lockstep: bit `i` is set
/// exactly when the storage at slot `i` has an entry for the entity.
///
/// # Example
///
/// ```
/// use glint_core::{component_set, DenseStorage, EcsManager};
///
/// component_set! {
///     struct Numbers {
///         ints: i32 => DenseStorage<i32>,
///         doubles: f64 => DenseStorage<f64>,
///     }
/// }
///
/// let mut ecs = EcsManager::<Numbers>::new();
/// let id = ecs.new_entity().unwrap();
/// *ecs.new_component::<i32>(id, 650).unwrap() += 4;
///
/// assert_eq!(ecs.get_component::<i32>(id), Ok(&654));
/// assert!(ecs.get_component::<f64>(id).is_err());
/// ```
///
/// # Borrowing
///
/// References into the manager borrow it, so structural changes cannot
/// happen while one is alive:
///
/// ```compile_fail
/// use glint_core::{component_set, DenseStorage, EcsManager};
///
/// component_set! {
///     struct Numbers {
///         ints: i32 => DenseStorage<i32>,
///     }
/// }
///
/// let mut ecs = EcsManager::<Numbers>::new();
/// let id = ecs.new_entity().unwrap();
/// let value = ecs.new_component::<i32>(id, 1).unwrap();
/// let _other = ecs.new_entity();
/// *value += 1;
/// ```
///
/// An exclusive query may not name a component type twice:
///
/// ```compile_fail
/// use glint_core::{component_set, DenseStorage, EcsManager};
///
/// component_set! {
///     struct Numbers {
///         ints: i32 => DenseStorage<i32>,
///     }
/// }
///
/// let mut ecs = EcsManager::<Numbers>::new();
/// let _ = ecs.get_all_mut::<(&mut i32, &mut i32)>().count();
/// ```
pub struct EcsManager<C: ComponentSet> {
    registry: EntityRegistry,
    components: C,
}

impl<C: ComponentSet> EcsManager<C> {
    /// Creates an empty manager with the default entity ceiling.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_NUM_ENTITIES)
    }

    /// Creates an empty manager with the given entity ceiling.
    ///
    /// # Panics
    ///
    /// Panics if `max_entities` is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn with_capacity(max_entities: usize) -> Self {
        Self {
            registry: EntityRegistry::new(max_entities),
            components: C::default(),
        }
    }

    /// Creates an empty manager from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration is out of range.
    pub fn with_config(config: &EcsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::debug!(
            max_entities = config.max_entities,
            reserve = config.reserve_entities,
            components = C::COUNT,
            "creating ECS manager"
        );
        Ok(Self {
            registry: EntityRegistry::with_reserve(config.max_entities, config.reserve_entities),
            components: C::default(),
        })
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Creates an entity with no components.
    ///
    /// Reuses the smallest free ID if any, otherwise appends a slot. Returns
    /// `None` once the entity ceiling is reached.
    pub fn new_entity(&mut self) -> Option<EntityId> {
        let id = self.registry.new_entity_slot();
        match id {
            Some(id) => tracing::debug!(entity = %id, "created entity"),
            None => tracing::warn!(
                max_entities = self.registry.max_entities(),
                "entity capacity reached"
            ),
        }
        id
    }

    /// Deletes an entity and every component attached to it.
    ///
    /// Components are removed in ascending slot order. The ID becomes free
    /// for reuse.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidEntity`] if `id` is not live; nothing changes
    /// - [`EcsError::StorageDivergence`] if a set bit had no storage entry;
    ///   the entity is still deleted
    pub fn delete_entity(&mut self, id: EntityId) -> EcsResult<()> {
        let bits = self.registry.bits(id).ok_or(EcsError::InvalidEntity(id))?;

        let mut diverged = None;
        for index in bits {
            if !self.components.delete_at(index, id) {
                tracing::error!(
                    entity = %id,
                    component = C::component_name(index),
                    "component bit set without backing storage entry"
                );
                diverged.get_or_insert(index);
            }
        }
        self.registry.free_slot(id);
        tracing::debug!(entity = %id, components = bits.len(), "deleted entity");

        match diverged {
            Some(index) => Err(EcsError::StorageDivergence {
                entity: id,
                component: C::component_name(index),
            }),
            None => Ok(()),
        }
    }

    /// Returns `true` if `id` is in range and live.
    #[inline]
    #[must_use]
    pub fn is_valid_entity(&self, id: EntityId) -> bool {
        self.registry.is_valid(id)
    }

    /// Iterates live entity IDs in ascending order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.registry.iter().map(|(id, _)| id)
    }

    /// Attached-component bitset of a live entity.
    #[must_use]
    pub fn entity_bitset(&self, id: EntityId) -> Option<ComponentBitset> {
        self.registry.bits(id)
    }

    /// Deletes every entity through [`delete_entity`](Self::delete_entity)
    /// and releases all slots, so IDs start again from zero.
    ///
    /// Divergences found on the way do not stop the teardown. Returns the
    /// number of entities whose deletion reported one.
    pub fn clear(&mut self) -> usize {
        tracing::debug!(live = self.registry.live_count(), "clearing ECS manager");
        let ids: Vec<EntityId> = self.entities().collect();
        let diverged = ids
            .into_iter()
            .filter(|&id| self.delete_entity(id).is_err())
            .count();
        if diverged > 0 {
            tracing::error!(entities = diverged, "storage divergence during teardown");
        }
        self.components.clear_all();
        self.registry.clear();
        diverged
    }

    // =========================================================================
    // Component lifecycle
    // =========================================================================

    /// Attaches `value` as the `T` component of `id` and returns it.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidEntity`] if `id` is not live
    /// - [`EcsError::ComponentAlreadyAttached`] if `id` already has a `T`
    /// - [`EcsError::StorageDivergence`] if the storage has an entry the
    ///   bitset does not record
    pub fn new_component<T>(&mut self, id: EntityId, value: OwnedComponent<C, T>) -> EcsResult<&mut T>
    where
        T: ?Sized + 'static,
        C: Contains<T>,
    {
        let bits = self.registry.bits(id).ok_or(EcsError::InvalidEntity(id))?;
        let index = <C as Contains<T>>::INDEX;
        if bits.test(index) {
            tracing::warn!(entity = %id, component = type_name::<T>(), "component already attached");
            return Err(EcsError::ComponentAlreadyAttached {
                entity: id,
                component: type_name::<T>(),
            });
        }

        let storage = <C as Contains<T>>::storage_mut(&mut self.components);
        if storage.contains(id) {
            tracing::error!(entity = %id, component = type_name::<T>(), "storage entry without bit");
            return Err(EcsError::StorageDivergence {
                entity: id,
                component: type_name::<T>(),
            });
        }

        self.registry.set_bit(id, index);
        tracing::debug!(entity = %id, component = type_name::<T>(), "attached component");
        Ok(storage.insert(id, value))
    }

    /// Attaches a default-constructed `T` component.
    ///
    /// # Errors
    ///
    /// As [`new_component`](Self::new_component).
    pub fn new_default_component<T>(&mut self, id: EntityId) -> EcsResult<&mut T>
    where
        T: ?Sized + 'static,
        C: Contains<T>,
        OwnedComponent<C, T>: Default,
    {
        self.new_component::<T>(id, OwnedComponent::<C, T>::default())
    }

    /// Detaches the `T` component of `id`.
    ///
    /// Returns `false` if `id` is not live or has no `T`.
    pub fn delete_component<T>(&mut self, id: EntityId) -> bool
    where
        T: ?Sized + 'static,
        C: Contains<T>,
    {
        self.take_component::<T>(id).is_ok()
    }

    /// Detaches the `T` component of `id` and returns it by value.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidEntity`] if `id` is not live
    /// - [`EcsError::MissingComponent`] if `id` has no `T`
    /// - [`EcsError::StorageDivergence`] if the bit was set without a
    ///   storage entry; the bit is cleared
    pub fn take_component<T>(&mut self, id: EntityId) -> EcsResult<OwnedComponent<C, T>>
    where
        T: ?Sized + 'static,
        C: Contains<T>,
    {
        let index = <C as Contains<T>>::INDEX;
        self.check_attached::<T>(id)?;
        self.registry.clear_bit(id, index);
        tracing::debug!(entity = %id, component = type_name::<T>(), "detached component");
        <C as Contains<T>>::storage_mut(&mut self.components)
            .remove(id)
            .ok_or_else(|| Self::divergence::<T>(id))
    }

    /// Borrows the `T` component of `id`.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidEntity`] if `id` is not live
    /// - [`EcsError::MissingComponent`] if `id` has no `T`
    pub fn get_component<T>(&self, id: EntityId) -> EcsResult<&T>
    where
        T: ?Sized + 'static,
        C: Contains<T>,
    {
        self.check_attached::<T>(id)?;
        <C as Contains<T>>::storage(&self.components)
            .get(id)
            .ok_or_else(|| Self::divergence::<T>(id))
    }

    /// Mutably borrows the `T` component of `id`.
    ///
    /// # Errors
    ///
    /// As [`get_component`](Self::get_component).
    pub fn get_component_mut<T>(&mut self, id: EntityId) -> EcsResult<&mut T>
    where
        T: ?Sized + 'static,
        C: Contains<T>,
    {
        self.check_attached::<T>(id)?;
        <C as Contains<T>>::storage_mut(&mut self.components)
            .get_mut(id)
            .ok_or_else(|| Self::divergence::<T>(id))
    }

    /// Returns `true` if `id` is live and has every component named by `Q`.
    ///
    /// `Q` uses the query syntax: `&T` or a tuple such as `(&A, &B)`.
    #[inline]
    #[must_use]
    pub fn has_components<Q: Query<C>>(&self, id: EntityId) -> bool {
        self.registry.has_all(id, Q::MASK)
    }

    fn check_attached<T>(&self, id: EntityId) -> EcsResult<()>
    where
        T: ?Sized + 'static,
        C: Contains<T>,
    {
        let bits = self.registry.bits(id).ok_or(EcsError::InvalidEntity(id))?;
        if bits.test(<C as Contains<T>>::INDEX) {
            Ok(())
        } else {
            Err(EcsError::MissingComponent {
                entity: id,
                component: type_name::<T>(),
            })
        }
    }

    #[cold]
    fn divergence<T: ?Sized>(id: EntityId) -> EcsError {
        tracing::error!(entity = %id, component = type_name::<T>(), "bit set without storage entry");
        EcsError::StorageDivergence {
            entity: id,
            component: type_name::<T>(),
        }
    }

    // =========================================================================
    // Storage access and static resolution
    // =========================================================================

    /// Borrows the storage of component type `T`.
    #[inline]
    #[must_use]
    pub fn component_manager<T>(&self) -> &<C as Contains<T>>::Storage
    where
        T: ?Sized + 'static,
        C: Contains<T>,
    {
        <C as Contains<T>>::storage(&self.components)
    }

    /// Mutably borrows the storage of component type `T`.
    ///
    /// Writes through this handle bypass the bitset; use it for in-place
    /// value updates, not for attaching or detaching.
    #[inline]
    #[must_use]
    pub fn component_manager_mut<T>(&mut self) -> &mut <C as Contains<T>>::Storage
    where
        T: ?Sized + 'static,
        C: Contains<T>,
    {
        <C as Contains<T>>::storage_mut(&mut self.components)
    }

    /// Bitset of the components named by query `Q`.
    #[inline]
    #[must_use]
    pub const fn make_component_bitset<Q: Query<C>>() -> ComponentBitset {
        Q::MASK
    }

    /// Slot index of component type `T`.
    #[inline]
    #[must_use]
    pub const fn component_index<T>() -> usize
    where
        T: ?Sized + 'static,
        C: Contains<T>,
    {
        <C as Contains<T>>::INDEX
    }

    /// Returns `true` if `T` is one of the configured component types.
    #[must_use]
    pub fn supports_component<T: ?Sized + 'static>() -> bool {
        C::supports::<T>()
    }

    /// Number of configured component types.
    #[inline]
    #[must_use]
    pub const fn num_component_slots() -> usize {
        C::COUNT
    }

    /// Number of entity slots ever allocated, live or free.
    #[inline]
    #[must_use]
    pub fn num_entity_slots(&self) -> usize {
        self.registry.num_slots()
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub const fn live_entities(&self) -> usize {
        self.registry.live_count()
    }

    /// The entity ceiling.
    #[inline]
    #[must_use]
    pub const fn max_entities(&self) -> usize {
        self.registry.max_entities()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Iterates `(id, &A, &B, ..)` for every live entity that has all the
    /// components named by `Q`, in ascending ID order.
    #[must_use]
    pub fn get_all<Q: ReadOnlyQuery<C>>(&self) -> GetAll<'_, C, Q> {
        GetAll::new(&self.components, self.registry.slots())
    }

    /// Exclusive form of [`get_all`](Self::get_all); terms may be `&mut T`.
    #[must_use]
    pub fn get_all_mut<Q: Query<C>>(&mut self) -> GetAllMut<'_, C, Q> {
        GetAllMut::new(&mut self.components, self.registry.slots())
    }
}

impl<C: ComponentSet> Default for EcsManager<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ComponentSet> fmt::Debug for EcsManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcsManager")
            .field("components", &C::COUNT)
            .field("live_entities", &self.registry.live_count())
            .field("entity_slots", &self.registry.num_slots())
            .field("max_entities", &self.registry.max_entities())
            .finish()
    }
}
