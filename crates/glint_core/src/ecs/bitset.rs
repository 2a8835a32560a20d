//! # Component Bitsets
//!
//! One bit per configured component type, indexed by the type's static
//! slot index. Backed by a single `u64`, so a component set holds at most
//! [`MAX_COMPONENTS`] types; `component_set!` rejects larger sets at
//! compile time.

use std::fmt;

/// Upper bound on the number of component types in one component set.
pub const MAX_COMPONENTS: usize = 64;

/// Fixed-width bit vector recording which component types are attached.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ComponentBitset(u64);

impl ComponentBitset {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Creates a bitset from its raw representation.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw representation.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// A bitset with only `index` set.
    ///
    /// # Panics
    ///
    /// Panics (at compile time when used in a const) if `index` is not
    /// below [`MAX_COMPONENTS`].
    #[inline]
    #[must_use]
    pub const fn single(index: usize) -> Self {
        assert!(index < MAX_COMPONENTS, "component index out of range");
        Self(1 << index)
    }

    /// Returns `self` with `index` set.
    #[inline]
    #[must_use]
    pub const fn with(self, index: usize) -> Self {
        self.union(Self::single(index))
    }

    /// Bitwise OR.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns `true` if every bit of `mask` is also set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains_all(self, mask: Self) -> bool {
        self.0 & mask.0 == mask.0
    }

    /// Returns `true` if `index` is set.
    #[inline]
    #[must_use]
    pub const fn test(self, index: usize) -> bool {
        index < MAX_COMPONENTS && (self.0 >> index) & 1 == 1
    }

    /// Number of set bits.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` if no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Sets `index`.
    #[inline]
    pub fn set(&mut self, index: usize) {
        *self = self.with(index);
    }

    /// Clears `index`.
    #[inline]
    pub fn clear(&mut self, index: usize) {
        if index < MAX_COMPONENTS {
            self.0 &= !(1 << index);
        }
    }

    /// Iterates set indices in ascending order.
    #[inline]
    pub fn iter(self) -> Ones {
        Ones(self.0)
    }
}

impl fmt::Debug for ComponentBitset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentBitset({:#b})", self.0)
    }
}

impl IntoIterator for ComponentBitset {
    type Item = usize;
    type IntoIter = Ones;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the set indices of a [`ComponentBitset`].
#[derive(Clone, Debug)]
pub struct Ones(u64);

impl Iterator for Ones {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 == 0 {
            return None;
        }
        // Find lowest set bit, then drop it
        let index = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Ones {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_of_singles() {
        let mask = ComponentBitset::single(0).union(ComponentBitset::single(2));
        assert_eq!(mask.bits(), 0b101);
        assert_eq!(ComponentBitset::EMPTY.with(0).with(1).bits(), 0b011);
    }

    #[test]
    fn test_contains_all() {
        let bits = ComponentBitset::from_bits(0b1101);
        assert!(bits.contains_all(ComponentBitset::from_bits(0b0101)));
        assert!(bits.contains_all(ComponentBitset::EMPTY));
        assert!(!bits.contains_all(ComponentBitset::from_bits(0b0010)));
    }

    #[test]
    fn test_set_clear() {
        let mut bits = ComponentBitset::EMPTY;
        bits.set(5);
        assert!(bits.test(5));
        assert_eq!(bits.len(), 1);

        bits.clear(5);
        assert!(!bits.test(5));
        assert!(bits.is_empty());
    }

    #[test]
    fn test_iter_ascending() {
        let bits = ComponentBitset::from_bits(0b1010_0110);
        let indices: Vec<usize> = bits.iter().collect();
        assert_eq!(indices, vec![1, 2, 5, 7]);
        assert_eq!(bits.iter().len(), 4);
    }

    #[test]
    fn test_highest_index() {
        let bits = ComponentBitset::single(MAX_COMPONENTS - 1);
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![63]);
        assert!(!bits.test(MAX_COMPONENTS));
    }
}
