//! # Static Component Resolution
//!
//! A component set is the ordered, compile-time list of storages a manager
//! is built over. It is declared with [`component_set!`](crate::component_set),
//! which generates a struct with one storage field per component type and
//! implements:
//!
//! - [`ComponentSet`] for the struct (count, index-dispatched deletion)
//! - [`Contains<T>`] once per component type, carrying the type's slot index
//!
//! Looking up a type that is not in the set is a missing `Contains<T>` impl,
//! so it fails to compile. Listing a type twice produces conflicting impls.

use std::any::TypeId;

use super::entity::EntityId;
use super::storage::ComponentStorage;

/// A fixed, ordered collection of component storages.
///
/// # Safety
///
/// `COUNT` must equal the number of [`Contains`] impls for the type, and
/// `delete_at(i, ..)` must act on the storage whose `Contains::INDEX` is `i`.
/// Use [`component_set!`](crate::component_set) rather than implementing
/// this by hand.
#[allow(unsafe_code)]
pub unsafe trait ComponentSet: Default + 'static {
    /// Number of component types.
    const COUNT: usize;

    /// Deletes `id` from the storage at slot `index`.
    ///
    /// Returns `false` if that storage had no entry or `index` is out of
    /// range.
    fn delete_at(&mut self, index: usize, id: EntityId) -> bool;

    /// Returns `true` if the storage at slot `index` has an entry for `id`.
    fn contains_at(&self, index: usize, id: EntityId) -> bool;

    /// Type name of the component at slot `index`, for diagnostics.
    fn component_name(index: usize) -> &'static str;

    /// `TypeId` of every component type, in slot order.
    fn component_type_ids() -> Vec<TypeId>;

    /// Empties every storage.
    fn clear_all(&mut self);

    /// Runtime membership check, mainly for introspection and tests.
    ///
    /// Typed operations never need it: membership is enforced by the
    /// [`Contains`] bound.
    #[must_use]
    fn supports<T: ?Sized + 'static>() -> bool {
        Self::component_type_ids().contains(&TypeId::of::<T>())
    }
}

/// Resolves component type `T` to its storage and slot index.
///
/// # Safety
///
/// Each impl on a given set must have a distinct `INDEX` below
/// `ComponentSet::COUNT`, and `storage_raw` must return a pointer to a field
/// that no other `Contains` impl on the same set returns.
#[allow(unsafe_code)]
pub unsafe trait Contains<T: ?Sized + 'static>: ComponentSet {
    /// Slot index of `T`: its bit position and storage position.
    const INDEX: usize;

    /// Storage backing `T`.
    type Storage: ComponentStorage<Component = T>;

    /// Borrows the storage.
    fn storage(&self) -> &Self::Storage;

    /// Mutably borrows the storage.
    fn storage_mut(&mut self) -> &mut Self::Storage;

    /// Projects a set pointer to its storage field without creating a
    /// reference to the whole set.
    ///
    /// # Safety
    ///
    /// `set` must point to a live, properly aligned instance.
    unsafe fn storage_raw(set: *mut Self) -> *mut Self::Storage;
}

/// The by-value form of component `T` in set `C`.
pub type OwnedComponent<C, T> = <<C as Contains<T>>::Storage as ComponentStorage>::Owned;

/// Declares a component set: the ordered list of storages an
/// [`EcsManager`](crate::EcsManager) is instantiated over.
///
/// Each entry names the component type and the storage backing it, as
/// `field: Component => Storage`. Slot indices follow declaration order.
///
/// ```
/// use glint_core::{component_set, ComponentSet, Contains, DenseStorage, EcsManager};
///
/// component_set! {
///     /// Numeric test components.
///     pub struct Numbers {
///         ints: i32 => DenseStorage<i32>,
///         doubles: f64 => DenseStorage<f64>,
///         floats: f32 => DenseStorage<f32>,
///     }
/// }
///
/// assert_eq!(Numbers::COUNT, 3);
/// assert_eq!(<Numbers as Contains<f32>>::INDEX, 2);
/// assert_eq!(EcsManager::<Numbers>::make_component_bitset::<(&i32, &f32)>().bits(), 0b101);
/// ```
///
/// Types outside the set are rejected at compile time:
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
/// ecs.new_component::<String>(id, String::new());
/// ```
///
/// So is listing the same component type twice:
///
/// ```compile_fail
/// use glint_core::{component_set, DenseStorage};
///
/// component_set! {
///     struct Twice {
///         first: i32 => DenseStorage<i32>,
///         second: i32 => DenseStorage<i32>,
///     }
/// }
/// ```
///
/// And a storage that holds a different type than the one named:
///
/// ```compile_fail
/// use glint_core::{component_set, DenseStorage};
///
/// component_set! {
///     struct Mismatched {
///         ints: i32 => DenseStorage<f64>,
///     }
/// }
/// ```
#[macro_export]
macro_rules! component_set {
    (@count) => { 0usize };
    (@count $head:ident $($tail:ident)*) => {
        1usize + $crate::component_set!(@count $($tail)*)
    };

    (@contains $set:ident; $index:expr;) => {};
    (
        @contains $set:ident; $index:expr;
        $field:ident : $component:ty => $storage:ty
        $(, $rest_field:ident : $rest_component:ty => $rest_storage:ty)*
    ) => {
        #[allow(unsafe_code)]
        unsafe impl $crate::ecs::Contains<$component> for $set {
            const INDEX: usize = $index;
            type Storage = $storage;

            #[inline]
            fn storage(&self) -> &$storage {
                &self.$field
            }

            #[inline]
            fn storage_mut(&mut self) -> &mut $storage {
                &mut self.$field
            }

            #[inline]
            unsafe fn storage_raw(set: *mut Self) -> *mut $storage {
                // SAFETY: caller guarantees `set` points to a live instance.
                unsafe { ::core::ptr::addr_of_mut!((*set).$field) }
            }
        }

        $crate::component_set!(
            @contains $set; $index + 1usize;
            $($rest_field : $rest_component => $rest_storage),*
        );
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $set:ident {
            $( $(#[$field_meta:meta])* $field:ident : $component:ty => $storage:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Default)]
        $vis struct $set {
            $( $(#[$field_meta])* $field: $storage, )+
        }

        const _: () = assert!(
            $crate::component_set!(@count $($field)+) <= $crate::ecs::MAX_COMPONENTS,
            "a component set holds at most 64 component types"
        );

        #[allow(unsafe_code)]
        unsafe impl $crate::ecs::ComponentSet for $set {
            const COUNT: usize = $crate::component_set!(@count $($field)+);

            fn delete_at(&mut self, index: usize, id: $crate::ecs::EntityId) -> bool {
                let mut slot = 0usize;
                $(
                    if slot == index {
                        return $crate::ecs::ComponentStorage::delete(&mut self.$field, id);
                    }
                    slot += 1;
                )+
                let _ = slot;
                false
            }

            fn contains_at(&self, index: usize, id: $crate::ecs::EntityId) -> bool {
                let mut slot = 0usize;
                $(
                    if slot == index {
                        return $crate::ecs::ComponentStorage::contains(&self.$field, id);
                    }
                    slot += 1;
                )+
                let _ = slot;
                false
            }

            fn component_name(index: usize) -> &'static str {
                let names = [$( ::core::any::type_name::<$component>() ),+];
                names.get(index).copied().unwrap_or("<unknown component>")
            }

            fn component_type_ids() -> ::std::vec::Vec<::core::any::TypeId> {
                ::std::vec![$( ::core::any::TypeId::of::<$component>() ),+]
            }

            fn clear_all(&mut self) {
                $( $crate::ecs::ComponentStorage::clear(&mut self.$field); )+
            }
        }

        $crate::component_set!(@contains $set; 0usize; $($field : $component => $storage),+);
    };
}
