//! Positions into a sequence's buffer.
//!
//! A [`Cursor`] is the address of a slot: the buffer it was taken from plus
//! a slot index. It is a plain `Copy` value with no borrow attached, so
//! nothing stops it from outliving the buffer it points into.
//!
//! Every buffer a sequence installs is stamped with a process-unique
//! generation, and cursors carry the generation they were taken under. This
//! allows O(1) staleness checks in [`Sequence::index_of`] that do not depend
//! on the allocator handing out fresh addresses. Generation 0 is reserved
//! for sequences that have never owned a buffer; those are always empty.
//!
//! Operations that shift elements without reallocating (`erase`, and
//! `emplace` with spare capacity) keep the generation, so cursors at or
//! after the affected position are not detected as stale.
//!
//! [`Sequence::index_of`]: crate::Sequence::index_of

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// A fresh buffer generation, never 0 and never handed out twice.
pub(crate) fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, AtomicOrdering::Relaxed)
}

/// A slot position within a particular buffer generation.
#[must_use]
pub struct Cursor<T> {
    /// Generation of the buffer this cursor was taken from.
    generation: u64,
    base: *const T,
    index: usize,
}

impl<T> Cursor<T> {
    pub(crate) fn new(generation: u64, base: *const T, index: usize) -> Self {
        Self {
            generation,
            base,
            index,
        }
    }

    /// The buffer generation this cursor belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Slot index relative to the start of the buffer.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Raw address of the slot. Reading through it is only valid while the
    /// cursor is valid and the slot is live.
    pub fn address(&self) -> *const T {
        self.base.wrapping_add(self.index)
    }

    /// Base address of the buffer this cursor was taken from.
    pub fn base(&self) -> *const T {
        self.base
    }

    /// The cursor `n` slots further along the same buffer.
    ///
    /// # Panics
    ///
    /// Panics if the resulting index would be negative or overflow.
    pub fn offset(self, n: isize) -> Self {
        let index = self
            .index
            .checked_add_signed(n)
            .expect("cursor offset out of range");
        Self::new(self.generation, self.base, index)
    }

    /// Number of slots from `origin` to `self`, if both share a buffer.
    pub fn distance_from(&self, origin: &Self) -> Option<isize> {
        if self.generation != origin.generation {
            return None;
        }
        Some(self.index as isize - origin.index as isize)
    }
}

impl<T> Clone for Cursor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<T> {}

impl<T> PartialEq for Cursor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation && self.index == other.index
    }
}

impl<T> Eq for Cursor<T> {}

impl<T> PartialOrd for Cursor<T> {
    /// Cursors into different buffers are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.generation != other.generation {
            return None;
        }
        Some(self.index.cmp(&other.index))
    }
}

impl<T> fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("generation", &self.generation)
            .field("base", &self.base)
            .field("index", &self.index)
            .finish()
    }
}

impl<T> fmt::Display for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cursor(gen={}, {:p}+{})",
            self.generation, self.base, self.index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_are_unique_and_nonzero() {
        let a = next_generation();
        let b = next_generation();
        assert_ne!(a, 0);
        assert!(b > a);
    }

    #[test]
    fn address_follows_index() {
        let data = [1u32, 2, 3];
        let cursor = Cursor::new(1, data.as_ptr(), 2);
        assert_eq!(cursor.address(), &data[2] as *const u32);
        assert_eq!(cursor.index(), 2);
        assert_eq!(cursor.generation(), 1);
    }

    #[test]
    fn offset_moves_both_ways() {
        let data = [0u8; 4];
        let cursor = Cursor::new(1, data.as_ptr(), 1);
        assert_eq!(cursor.offset(2).index(), 3);
        assert_eq!(cursor.offset(-1).index(), 0);
        assert_eq!(cursor.offset(2).generation(), 1);
    }

    #[test]
    #[should_panic(expected = "cursor offset out of range")]
    fn offset_before_start_panics() {
        let data = [0u8; 1];
        let _ = Cursor::new(1, data.as_ptr(), 0).offset(-1);
    }

    #[test]
    fn cursors_from_different_generations_are_unrelated() {
        // Same address, different generations: a reused buffer.
        let data = [0u16; 2];
        let old = Cursor::new(1, data.as_ptr(), 1);
        let new = Cursor::new(2, data.as_ptr(), 1);
        assert_ne!(old, new);
        assert_eq!(old.partial_cmp(&new), None);
        assert_eq!(old.distance_from(&new), None);
    }

    #[test]
    fn ordering_within_a_buffer() {
        let data = [0u64; 5];
        let start = Cursor::new(3, data.as_ptr(), 0);
        let later = start.offset(3);
        assert!(start < later);
        assert_eq!(later.distance_from(&start), Some(3));
        assert_eq!(start.distance_from(&later), Some(-3));
    }

    #[test]
    fn display_names_generation() {
        let data = [0u8; 1];
        let cursor = Cursor::new(7, data.as_ptr(), 0);
        assert!(cursor.to_string().starts_with("Cursor(gen=7, "));
    }
}
