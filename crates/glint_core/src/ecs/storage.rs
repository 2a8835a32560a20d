//! # Component Storage
//!
//! One storage per component type, keyed by [`EntityId`]. Storages know
//! nothing about each other or about entity bitsets; keeping the two in
//! lockstep is the manager's job.
//!
//! Two flavors share the same contract:
//! - [`DenseStorage`] holds values inline in a sparse set
//! - [`BoxedStorage`] holds `Box<T>`, so `T` may be a trait object

use std::ptr;

use super::entity::EntityId;

/// Storage contract shared by every component storage.
///
/// `Owned` is what goes in on [`insert`](Self::insert) and comes back out
/// of [`remove`](Self::remove); `Component` is what callers borrow. For
/// flat storage both are `T`; for boxed storage `Owned` is `Box<T>`.
pub trait ComponentStorage: Default + 'static {
    /// The borrowed component type.
    type Component: ?Sized + 'static;
    /// The by-value form moved in and out of the storage.
    type Owned;

    /// Stores `value` for `id` and returns a reference to it.
    ///
    /// Inserting for an `id` that already has an entry is a logic error;
    /// the manager's bitset check prevents it.
    fn insert(&mut self, id: EntityId, value: Self::Owned) -> &mut Self::Component;

    /// Borrows the component of `id`.
    fn get(&self, id: EntityId) -> Option<&Self::Component>;

    /// Mutably borrows the component of `id`.
    fn get_mut(&mut self, id: EntityId) -> Option<&mut Self::Component>;

    /// Moves the component of `id` out of the storage.
    fn remove(&mut self, id: EntityId) -> Option<Self::Owned>;

    /// Returns `true` if `id` has an entry.
    fn contains(&self, id: EntityId) -> bool;

    /// Number of stored components.
    fn len(&self) -> usize;

    /// Drops every entry.
    fn clear(&mut self);

    /// Removes the entry for `id`, reporting whether one existed.
    fn delete(&mut self, id: EntityId) -> bool {
        self.remove(id).is_some()
    }

    /// Returns `true` if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storages whose mutable lookups never alias.
///
/// Exclusive multi-component iteration hands out `&mut` references for
/// many entities at once. It reaches each entry through
/// [`get_mut_raw`](Self::get_mut_raw), which must not create a reference
/// covering any other entry.
///
/// # Safety
///
/// For any two distinct IDs `a` and `b`, the pointers returned by
/// `get_mut_raw(this, a)` and `get_mut_raw(this, b)` must not overlap, and
/// obtaining one must not move, invalidate or retag the other.
#[allow(unsafe_code)]
pub unsafe trait DisjointStorage: ComponentStorage {
    /// Raw pointer to the component of `id`.
    ///
    /// # Safety
    ///
    /// `this` must point to a live storage, and no `&mut` reference to the
    /// storage itself may be alive.
    unsafe fn get_mut_raw(this: *mut Self, id: EntityId) -> Option<*mut Self::Component>;
}

/// Sparse-set storage for plain component values.
///
/// - `sparse[entity]` points into `dense`
/// - `dense` and `owners` are packed in insertion order
///   (perturbed by swap-removal)
pub struct DenseStorage<T> {
    sparse: Vec<Option<u32>>,
    dense: Vec<T>,
    owners: Vec<EntityId>,
}

impl<T> DenseStorage<T> {
    /// Creates empty storage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            owners: Vec::new(),
        }
    }

    #[inline]
    fn dense_index(&self, id: EntityId) -> Option<usize> {
        self.sparse
            .get(id.slot())
            .copied()
            .flatten()
            .map(|index| index as usize)
    }
}

impl<T> Default for DenseStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> ComponentStorage for DenseStorage<T> {
    type Component = T;
    type Owned = T;

    fn insert(&mut self, id: EntityId, value: T) -> &mut T {
        let slot = id.slot();
        let index = if let Some(index) = self.dense_index(id) {
            self.dense[index] = value;
            index
        } else {
            if slot >= self.sparse.len() {
                self.sparse.resize(slot + 1, None);
            }
            let index = self.dense.len();
            self.dense.push(value);
            self.owners.push(id);
            // Dense length never exceeds the entity ceiling, which fits in u32.
            self.sparse[slot] = u32::try_from(index).ok();
            index
        };
        &mut self.dense[index]
    }

    #[inline]
    fn get(&self, id: EntityId) -> Option<&T> {
        self.dense_index(id).map(|index| &self.dense[index])
    }

    #[inline]
    fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        let index = self.dense_index(id)?;
        Some(&mut self.dense[index])
    }

    fn remove(&mut self, id: EntityId) -> Option<T> {
        let index = self.dense_index(id)?;
        self.sparse[id.slot()] = None;

        let value = self.dense.swap_remove(index);
        self.owners.swap_remove(index);

        // Re-point whichever entity was moved into the hole
        if let Some(moved) = self.owners.get(index) {
            self.sparse[moved.slot()] = u32::try_from(index).ok();
        }
        Some(value)
    }

    #[inline]
    fn contains(&self, id: EntityId) -> bool {
        self.dense_index(id).is_some()
    }

    #[inline]
    fn len(&self) -> usize {
        self.dense.len()
    }

    fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.owners.clear();
    }
}

// SAFETY: distinct IDs map to distinct dense indices. The element pointer
// is derived from the buffer without borrowing the slice, so other
// elements keep their tags.
#[allow(unsafe_code)]
unsafe impl<T: 'static> DisjointStorage for DenseStorage<T> {
    #[inline]
    unsafe fn get_mut_raw(this: *mut Self, id: EntityId) -> Option<*mut T> {
        // SAFETY: `this` is live and not mutably borrowed (caller contract);
        // the shared borrow only reads `sparse` and ends here.
        let index = unsafe { (*this).dense_index(id) }?;
        // SAFETY: the `&mut` is to the `Vec` header only, not its elements,
        // and `index` is in bounds.
        Some(unsafe { (*ptr::addr_of_mut!((*this).dense)).as_mut_ptr().add(index) })
    }
}

/// Storage for heap-indirected, possibly unsized components.
///
/// ```
/// use glint_core::{BoxedStorage, ComponentStorage, EntityId};
///
/// trait Shape {
///     fn sides(&self) -> u32;
/// }
/// struct Triangle;
/// impl Shape for Triangle {
///     fn sides(&self) -> u32 { 3 }
/// }
///
/// let mut shapes: BoxedStorage<dyn Shape> = BoxedStorage::new();
/// shapes.insert(EntityId::new(4), Box::new(Triangle));
/// assert_eq!(shapes.get(EntityId::new(4)).map(|s| s.sides()), Some(3));
/// ```
pub struct BoxedStorage<T: ?Sized> {
    inner: DenseStorage<Box<T>>,
}

impl<T: ?Sized> BoxedStorage<T> {
    /// Creates empty storage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: DenseStorage::new(),
        }
    }
}

impl<T: ?Sized> Default for BoxedStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> ComponentStorage for BoxedStorage<T> {
    type Component = T;
    type Owned = Box<T>;

    fn insert(&mut self, id: EntityId, value: Box<T>) -> &mut T {
        &mut **self.inner.insert(id, value)
    }

    #[inline]
    fn get(&self, id: EntityId) -> Option<&T> {
        self.inner.get(id).map(|value| &**value)
    }

    #[inline]
    fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.inner.get_mut(id).map(|value| &mut **value)
    }

    fn remove(&mut self, id: EntityId) -> Option<Box<T>> {
        self.inner.remove(id)
    }

    #[inline]
    fn contains(&self, id: EntityId) -> bool {
        self.inner.contains(id)
    }

    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn clear(&mut self) {
        self.inner.clear();
    }
}

// SAFETY: each entry is its own heap allocation and the inner dense storage
// is disjoint.
#[allow(unsafe_code)]
unsafe impl<T: ?Sized + 'static> DisjointStorage for BoxedStorage<T> {
    #[inline]
    unsafe fn get_mut_raw(this: *mut Self, id: EntityId) -> Option<*mut T> {
        // SAFETY: forwarded from the caller; `inner` is a field of `*this`.
        let boxed = unsafe { DenseStorage::get_mut_raw(ptr::addr_of_mut!((*this).inner), id) }?;
        // SAFETY: `boxed` points to a live box; the place is projected
        // without creating a reference.
        Some(unsafe { ptr::addr_of_mut!(**boxed) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u32) -> EntityId {
        EntityId::new(index)
    }

    fn check_creation<S>(mut storage: S)
    where
        S: ComponentStorage<Component = i32, Owned = i32>,
    {
        let component = storage.insert(id(8), 154);
        *component = 133;
        assert_eq!(storage.get(id(8)), Some(&133));

        *storage.get_mut(id(8)).unwrap() = 67;
        assert_eq!(storage.get(id(8)), Some(&67));
    }

    fn check_deletion<S>(mut storage: S)
    where
        S: ComponentStorage<Component = i32, Owned = i32>,
    {
        storage.insert(id(8), 154);
        storage.insert(id(10), 114);
        assert!(storage.contains(id(8)));
        assert!(storage.contains(id(10)));

        assert!(storage.delete(id(8)));
        assert!(!storage.contains(id(8)));
        assert!(storage.contains(id(10)));
        assert_eq!(storage.get(id(10)), Some(&114));

        assert!(!storage.delete(id(8)), "failed deletion should return false");
        assert!(storage.contains(id(10)));

        assert!(storage.delete(id(10)));
        assert!(!storage.delete(id(10)));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_dense_creation() {
        check_creation(DenseStorage::<i32>::new());
    }

    #[test]
    fn test_dense_deletion() {
        check_deletion(DenseStorage::<i32>::new());
    }

    #[test]
    fn test_dense_swap_remove_keeps_lookup() {
        let mut storage = DenseStorage::new();
        for i in 0..5 {
            storage.insert(id(i), i * 10);
        }

        assert_eq!(storage.remove(id(1)), Some(10));
        for i in [0, 2, 3, 4] {
            assert_eq!(storage.get(id(i)), Some(&(i * 10)));
        }
        assert_eq!(storage.len(), 4);
    }

    #[test]
    fn test_dense_sparse_ids() {
        let mut storage = DenseStorage::new();
        storage.insert(id(9_999), "far");
        storage.insert(id(3), "near");

        assert_eq!(storage.get(id(9_999)), Some(&"far"));
        assert_eq!(storage.get(id(3)), Some(&"near"));
        assert_eq!(storage.get(id(4)), None);
        assert_eq!(storage.get(id(20_000)), None);
    }

    #[test]
    #[allow(unsafe_code)]
    fn test_raw_pointers_stay_valid() {
        let mut storage = DenseStorage::new();
        for i in 0..4 {
            storage.insert(id(i), i * 10);
        }
        let this: *mut DenseStorage<u32> = &mut storage;

        // SAFETY: `storage` is live and only reached through `this` here.
        let ptrs: Vec<*mut u32> = (0..4)
            .map(|i| unsafe { DenseStorage::get_mut_raw(this, id(i)) }.unwrap())
            .collect();
        assert!(unsafe { DenseStorage::get_mut_raw(this, id(7)) }.is_none());
        for ptr in ptrs {
            // SAFETY: pointers for distinct IDs are disjoint and still valid.
            unsafe { *ptr += 1 };
        }

        assert_eq!(storage.get(id(0)), Some(&1));
        assert_eq!(storage.get(id(3)), Some(&31));
    }

    #[test]
    #[allow(unsafe_code)]
    fn test_boxed_raw_pointers_stay_valid() {
        let mut storage: BoxedStorage<[u8]> = BoxedStorage::new();
        storage.insert(id(1), vec![1, 2].into_boxed_slice());
        storage.insert(id(2), vec![3].into_boxed_slice());
        let this: *mut BoxedStorage<[u8]> = &mut storage;

        // SAFETY: `storage` is live and only reached through `this` here.
        let first = unsafe { BoxedStorage::get_mut_raw(this, id(1)) }.unwrap();
        let second = unsafe { BoxedStorage::get_mut_raw(this, id(2)) }.unwrap();
        // SAFETY: both pointers target distinct live boxes.
        unsafe {
            (*first)[1] = 20;
            (*second)[0] = 30;
        }

        assert_eq!(storage.get(id(1)), Some(&[1, 20][..]));
        assert_eq!(storage.get(id(2)), Some(&[30][..]));
    }

    #[test]
    fn test_boxed_creation() {
        let mut storage: BoxedStorage<i32> = BoxedStorage::new();
        let component = storage.insert(id(8), Box::new(154));
        *component = 133;
        assert_eq!(storage.get(id(8)), Some(&133));
        assert_eq!(storage.remove(id(8)).map(|b| *b), Some(133));
        assert!(!storage.delete(id(8)));
    }

    #[test]
    fn test_boxed_polymorphism() {
        trait Base {
            fn is_base(&self) -> bool {
                true
            }
        }
        struct Plain;
        struct Derived;
        impl Base for Plain {}
        impl Base for Derived {
            fn is_base(&self) -> bool {
                false
            }
        }

        let mut storage: BoxedStorage<dyn Base> = BoxedStorage::new();
        storage.insert(id(5), Box::new(Plain));
        storage.insert(id(9), Box::new(Derived));

        assert!(storage.get(id(5)).unwrap().is_base());
        assert!(!storage.get(id(9)).unwrap().is_base());
    }
}
