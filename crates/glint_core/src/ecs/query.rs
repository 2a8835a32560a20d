//! # Filtered Multi-Component Queries
//!
//! A query names the components it wants as reference terms: `&T` for
//! shared access and `&mut T` for exclusive access. A single term or a
//! tuple of up to eight terms may be used:
//!
//! ```ignore
//! for (id, mesh, transform) in ecs.get_all::<(&MeshComponent, &TransformComponent)>() { .. }
//! for (id, input, transform) in ecs.get_all_mut::<(&mut dyn InputHandler, &mut TransformComponent)>() { .. }
//! ```
//!
//! Iteration walks the entity registry in ascending ID order, keeps slots
//! whose bitset is a superset of the query mask, and zips in one reference
//! per term.
//!
//! Exclusive iteration hands out `&mut` references into several storages
//! at once. That needs raw pointers; the invariants that make it sound are:
//!
//! 1. Every term of an exclusive query names a different component type,
//!    checked at compile time through [`Query::ASSERT_DISTINCT`]
//! 2. Distinct component types live in distinct storage fields (the
//!    `Contains` contract)
//! 3. Each entity ID is yielded at most once, and `&mut T` terms require a
//!    [`DisjointStorage`], so references for different IDs never overlap.
//!    Exclusive terms reach their entry through a raw accessor and never
//!    borrow the storage as a whole
//! 4. The iterator holds the manager's exclusive borrow for its lifetime

// SAFETY: This module requires unsafe for exclusive multi-storage iteration.
// All unsafe blocks are documented against the invariants above.
#![allow(unsafe_code)]

use std::iter::Enumerate;
use std::marker::PhantomData;
use std::slice;

use super::bitset::ComponentBitset;
use super::component::{ComponentSet, Contains};
use super::entity::EntityId;
use super::storage::{ComponentStorage, DisjointStorage};

mod sealed {
    pub trait Sealed {}
}

/// One element of a query: `&T` or `&mut T` for a component `T` of set `C`.
pub trait QueryTerm<C: ComponentSet>: sealed::Sealed {
    /// Slot index of the component.
    const INDEX: usize;

    /// Reference handed out for this term.
    type Item<'a>;

    /// Fetches the term for `id`.
    ///
    /// # Safety
    ///
    /// `set` must be valid for `'a`, and the caller must uphold the module
    /// invariants: no other live reference may overlap the returned one.
    unsafe fn fetch_raw<'a>(set: *mut C, id: EntityId) -> Option<Self::Item<'a>>;
}

/// A query term that only reads.
pub trait ReadOnlyTerm<C: ComponentSet>: QueryTerm<C> {
    /// Fetches the term for `id` through a shared borrow.
    fn fetch_shared(set: &C, id: EntityId) -> Option<Self::Item<'_>>;
}

impl<T: ?Sized + 'static> sealed::Sealed for &T {}
impl<T: ?Sized + 'static> sealed::Sealed for &mut T {}

impl<C, T> QueryTerm<C> for &T
where
    C: Contains<T>,
    T: ?Sized + 'static,
{
    const INDEX: usize = <C as Contains<T>>::INDEX;
    type Item<'a> = &'a T;

    #[inline]
    unsafe fn fetch_raw<'a>(set: *mut C, id: EntityId) -> Option<&'a T> {
        // SAFETY: `set` is valid for 'a; only a shared borrow of this
        // storage is created, and no exclusive term targets it.
        let storage: &'a <C as Contains<T>>::Storage =
            unsafe { &*<C as Contains<T>>::storage_raw(set) };
        storage.get(id)
    }
}

impl<C, T> ReadOnlyTerm<C> for &T
where
    C: Contains<T>,
    T: ?Sized + 'static,
{
    #[inline]
    fn fetch_shared(set: &C, id: EntityId) -> Option<&T> {
        <C as Contains<T>>::storage(set).get(id)
    }
}

impl<C, T> QueryTerm<C> for &mut T
where
    C: Contains<T>,
    T: ?Sized + 'static,
    <C as Contains<T>>::Storage: DisjointStorage,
{
    const INDEX: usize = <C as Contains<T>>::INDEX;
    type Item<'a> = &'a mut T;

    #[inline]
    unsafe fn fetch_raw<'a>(set: *mut C, id: EntityId) -> Option<&'a mut T> {
        // SAFETY: `set` is valid for 'a and no reference to this storage is
        // alive, since no other term targets it. The returned element is
        // disjoint from elements handed out for other IDs (DisjointStorage).
        unsafe {
            let storage = <C as Contains<T>>::storage_raw(set);
            <<C as Contains<T>>::Storage as DisjointStorage>::get_mut_raw(storage, id)
                .map(|component| &mut *component)
        }
    }
}

/// A set of components fetched together for one entity.
pub trait Query<C: ComponentSet>: sealed::Sealed {
    /// Union of the single-bit masks of every term.
    const MASK: ComponentBitset;

    /// Number of terms.
    const ARITY: usize;

    /// Compile-time check that no component type appears twice.
    const ASSERT_DISTINCT: () = assert!(
        Self::MASK.len() == Self::ARITY,
        "an exclusive query may name each component type only once"
    );

    /// `(EntityId, term items...)`.
    type Item<'a>;

    /// Fetches every term for `id`.
    ///
    /// # Safety
    ///
    /// Same contract as [`QueryTerm::fetch_raw`] for every term.
    unsafe fn fetch_raw<'a>(set: *mut C, id: EntityId) -> Option<Self::Item<'a>>;
}

/// A query whose terms are all shared.
pub trait ReadOnlyQuery<C: ComponentSet>: Query<C> {
    /// Fetches every term for `id` through a shared borrow.
    fn fetch_shared(set: &C, id: EntityId) -> Option<Self::Item<'_>>;
}

impl<C, T> Query<C> for &T
where
    C: Contains<T>,
    T: ?Sized + 'static,
{
    const MASK: ComponentBitset = ComponentBitset::single(<C as Contains<T>>::INDEX);
    const ARITY: usize = 1;
    type Item<'a> = (EntityId, &'a T);

    #[inline]
    unsafe fn fetch_raw<'a>(set: *mut C, id: EntityId) -> Option<Self::Item<'a>> {
        // SAFETY: forwarded from the caller.
        Some((id, unsafe { <&T as QueryTerm<C>>::fetch_raw(set, id) }?))
    }
}

impl<C, T> ReadOnlyQuery<C> for &T
where
    C: Contains<T>,
    T: ?Sized + 'static,
{
    #[inline]
    fn fetch_shared(set: &C, id: EntityId) -> Option<Self::Item<'_>> {
        Some((id, <&T as ReadOnlyTerm<C>>::fetch_shared(set, id)?))
    }
}

impl<C, T> Query<C> for &mut T
where
    C: Contains<T>,
    T: ?Sized + 'static,
    <C as Contains<T>>::Storage: DisjointStorage,
{
    const MASK: ComponentBitset = ComponentBitset::single(<C as Contains<T>>::INDEX);
    const ARITY: usize = 1;
    type Item<'a> = (EntityId, &'a mut T);

    #[inline]
    unsafe fn fetch_raw<'a>(set: *mut C, id: EntityId) -> Option<Self::Item<'a>> {
        // SAFETY: forwarded from the caller.
        Some((id, unsafe { <&mut T as QueryTerm<C>>::fetch_raw(set, id) }?))
    }
}

macro_rules! impl_query_tuple {
    ($($term:ident),+) => {
        impl<$($term: sealed::Sealed),+> sealed::Sealed for ($($term,)+) {}

        impl<Set, $($term),+> Query<Set> for ($($term,)+)
        where
            Set: ComponentSet,
            $($term: QueryTerm<Set>,)+
        {
            const MASK: ComponentBitset =
                ComponentBitset::EMPTY $(.with(<$term as QueryTerm<Set>>::INDEX))+;
            const ARITY: usize = [$(<$term as QueryTerm<Set>>::INDEX),+].len();
            type Item<'a> = (EntityId, $(<$term as QueryTerm<Set>>::Item<'a>,)+);

            #[inline]
            unsafe fn fetch_raw<'a>(set: *mut Set, id: EntityId) -> Option<Self::Item<'a>> {
                // SAFETY: forwarded from the caller, term by term.
                Some((id, $(unsafe { <$term as QueryTerm<Set>>::fetch_raw(set, id) }?,)+))
            }
        }

        impl<Set, $($term),+> ReadOnlyQuery<Set> for ($($term,)+)
        where
            Set: ComponentSet,
            $($term: ReadOnlyTerm<Set>,)+
        {
            #[inline]
            fn fetch_shared(set: &Set, id: EntityId) -> Option<Self::Item<'_>> {
                Some((id, $(<$term as ReadOnlyTerm<Set>>::fetch_shared(set, id)?,)+))
            }
        }
    };
}

impl_query_tuple!(A);
impl_query_tuple!(A, B);
impl_query_tuple!(A, B, Cc);
impl_query_tuple!(A, B, Cc, D);
impl_query_tuple!(A, B, Cc, D, E);
impl_query_tuple!(A, B, Cc, D, E, F);
impl_query_tuple!(A, B, Cc, D, E, F, G);
impl_query_tuple!(A, B, Cc, D, E, F, G, H);

#[inline]
fn slot_id(index: usize) -> Option<EntityId> {
    // Slot count is bounded by the entity ceiling, which fits in u32.
    u32::try_from(index).ok().map(EntityId::new)
}

/// Logs a bitset/storage mismatch. Debug builds panic so tests catch it;
/// release builds skip the entity.
#[cold]
fn report_divergence<C: ComponentSet>(id: EntityId, mask: ComponentBitset) {
    let queried: Vec<&'static str> = mask.iter().map(C::component_name).collect();
    tracing::error!(
        entity = %id,
        ?queried,
        "component bit set without backing storage entry, skipping entity"
    );
    if cfg!(debug_assertions) {
        panic!("component bit set without backing storage entry for {id}: {queried:?}");
    }
}

/// Shared iterator over entities matching query `Q`.
///
/// Produced by [`EcsManager::get_all`](crate::EcsManager::get_all).
pub struct GetAll<'a, C: ComponentSet, Q: ReadOnlyQuery<C>> {
    set: &'a C,
    slots: Enumerate<slice::Iter<'a, Option<ComponentBitset>>>,
    _query: PhantomData<fn() -> Q>,
}

impl<'a, C: ComponentSet, Q: ReadOnlyQuery<C>> GetAll<'a, C, Q> {
    pub(crate) fn new(set: &'a C, slots: &'a [Option<ComponentBitset>]) -> Self {
        Self {
            set,
            slots: slots.iter().enumerate(),
            _query: PhantomData,
        }
    }
}

impl<C: ComponentSet, Q: ReadOnlyQuery<C>> Clone for GetAll<'_, C, Q> {
    fn clone(&self) -> Self {
        Self {
            set: self.set,
            slots: self.slots.clone(),
            _query: PhantomData,
        }
    }
}

impl<'a, C: ComponentSet, Q: ReadOnlyQuery<C>> Iterator for GetAll<'a, C, Q> {
    type Item = Q::Item<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, slot) in self.slots.by_ref() {
            let Some(bits) = slot else { continue };
            if !bits.contains_all(Q::MASK) {
                continue;
            }
            let id = slot_id(index)?;
            match Q::fetch_shared(self.set, id) {
                Some(item) => return Some(item),
                None => report_divergence::<C>(id, Q::MASK),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.slots.size_hint().1)
    }
}

/// Exclusive iterator over entities matching query `Q`.
///
/// Produced by [`EcsManager::get_all_mut`](crate::EcsManager::get_all_mut).
pub struct GetAllMut<'a, C: ComponentSet, Q: Query<C>> {
    set: *mut C,
    slots: Enumerate<slice::Iter<'a, Option<ComponentBitset>>>,
    _borrow: PhantomData<&'a mut C>,
    _query: PhantomData<fn() -> Q>,
}

impl<'a, C: ComponentSet, Q: Query<C>> GetAllMut<'a, C, Q> {
    pub(crate) fn new(set: &'a mut C, slots: &'a [Option<ComponentBitset>]) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Q::ASSERT_DISTINCT;
        Self {
            set: set as *mut C,
            slots: slots.iter().enumerate(),
            _borrow: PhantomData,
            _query: PhantomData,
        }
    }
}

impl<'a, C: ComponentSet, Q: Query<C>> Iterator for GetAllMut<'a, C, Q> {
    type Item = Q::Item<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, slot) in self.slots.by_ref() {
            let Some(bits) = slot else { continue };
            if !bits.contains_all(Q::MASK) {
                continue;
            }
            let id = slot_id(index)?;
            // SAFETY: `set` comes from a `&'a mut C` held by this iterator,
            // `id` is visited exactly once, and terms are distinct
            // (ASSERT_DISTINCT) with disjoint per-ID storage.
            if let Some(item) = unsafe { Q::fetch_raw(self.set, id) } {
                return Some(item);
            }
            report_divergence::<C>(id, Q::MASK);
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.slots.size_hint().1)
    }
}
