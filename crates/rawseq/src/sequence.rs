//! The growable sequence container.
//!
//! [`Sequence`] pairs a [`RawStorage`] with a live length. Slots `[0, len)`
//! hold constructed values; everything past `len` is raw memory. All growth
//! goes through a fresh `RawStorage`: the new buffer is filled completely
//! (new element first, then the relocated old ones) before it is swapped
//! in, so a panic at any point leaves the original buffer untouched and the
//! half-built one is torn down by its guards.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr;
use std::slice;

use crate::config::GrowthPolicy;
use crate::cursor::{next_generation, Cursor};
use crate::error::SequenceError;
use crate::guard::InitGuard;
use crate::raw::RawStorage;
use crate::relocate::{clone_into, retire, ByMove, Relocate, Strategy};

/// A contiguous, growable sequence of `T`.
///
/// `R` selects how elements are relocated when the buffer grows; see
/// [`relocate`](crate::relocate). The default, [`ByMove`], is a bitwise
/// move and can never fail.
///
/// # Panic safety
///
/// Every operation that reallocates (`reserve`, `push_back`,
/// `emplace_back`, `emplace`, `insert`, and `clone_from` when the source
/// does not fit) leaves the sequence unchanged if an element constructor or
/// clone panics. Element destructors are assumed not to panic.
pub struct Sequence<T, R = ByMove> {
    data: RawStorage<T>,
    len: usize,
    /// Stamp of the current buffer; 0 until a buffer is first installed.
    generation: u64,
    _policy: PhantomData<fn() -> R>,
}

impl<T, R> Sequence<T, R> {
    /// An empty sequence. Does not allocate.
    pub const fn new() -> Self {
        Self {
            data: RawStorage::new(),
            len: 0,
            generation: 0,
            _policy: PhantomData,
        }
    }

    fn from_parts(data: RawStorage<T>, len: usize) -> Self {
        debug_assert!(len <= data.capacity());
        Self {
            data,
            len,
            generation: next_generation(),
            _policy: PhantomData,
        }
    }

    /// `n` default-constructed elements in a buffer of exactly `n` slots.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow or if `T::default` panics; in the latter
    /// case every element built so far is dropped first.
    pub fn with_len(n: usize) -> Self
    where
        T: Default,
    {
        Self::try_with_len(n).unwrap_or_else(|err| err.escalate())
    }

    /// Fallible form of [`with_len`](Self::with_len).
    pub fn try_with_len(n: usize) -> Result<Self, SequenceError>
    where
        T: Default,
    {
        let mut data = RawStorage::try_with_capacity(n)?;
        // SAFETY: a fresh buffer of `n` uninitialized slots.
        let mut built = unsafe { InitGuard::new(data.as_mut_ptr()) };
        for _ in 0..n {
            built.push(T::default());
        }
        let len = built.finish();
        Ok(Self::from_parts(data, len))
    }

    /// An empty sequence with room for exactly `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_parts(RawStorage::with_capacity(capacity), 0)
    }

    /// Fallible form of [`with_capacity`](Self::with_capacity).
    pub fn try_with_capacity(capacity: usize) -> Result<Self, SequenceError> {
        Ok(Self::from_parts(RawStorage::try_with_capacity(capacity)?, 0))
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the sequence holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the backing buffer.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Slots available before the next reallocation.
    pub fn spare_capacity(&self) -> usize {
        self.data.capacity() - self.len
    }

    /// Size of the backing buffer in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.data.memory_bytes()
    }

    /// The live elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: slots `[0, len)` are live and the pointer is non-null and
        // aligned even when nothing is allocated.
        unsafe { slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    /// The live elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as for `as_slice`, with unique access through `&mut self`.
        unsafe { slice::from_raw_parts_mut(self.data.as_mut_ptr(), self.len) }
    }

    /// Address of the first slot.
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    /// Mutable address of the first slot.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }

    /// Cursor at the first element.
    pub fn begin(&self) -> Cursor<T> {
        self.cursor_at(0)
    }

    /// Cursor one past the last element.
    pub fn end(&self) -> Cursor<T> {
        self.cursor_at(self.len)
    }

    /// Cursor at slot `index`. `index == len()` is the end cursor.
    pub fn cursor_at(&self, index: usize) -> Cursor<T> {
        debug_assert!(index <= self.len, "cursor index {index} past end {}", self.len);
        Cursor::new(self.generation, self.data.as_ptr(), index)
    }

    /// Generation stamp of the current buffer.
    ///
    /// Changes whenever the sequence reallocates or receives another
    /// sequence's buffer. Two sequences never share a non-zero generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolve a cursor against the current buffer.
    ///
    /// Returns `None` for cursors taken from another sequence, before a
    /// reallocation, or before the buffer was released by
    /// [`take`](Self::take), and for cursors past the end. Cursors into a
    /// buffer whose elements were shifted in place by `erase` or `emplace`
    /// still resolve.
    pub fn index_of(&self, cursor: Cursor<T>) -> Option<usize> {
        (cursor.generation() == self.generation && cursor.index() <= self.len)
            .then_some(cursor.index())
    }

    /// The element a cursor points at, if the cursor is valid and not at
    /// the end.
    pub fn at(&self, cursor: Cursor<T>) -> Option<&T> {
        self.index_of(cursor)
            .and_then(|index| self.as_slice().get(index))
    }

    /// Slot index for a cursor argument. Stale, foreign and out-of-range
    /// cursors panic.
    fn position(&self, pos: Cursor<T>, allow_end: bool) -> usize {
        assert!(
            pos.generation() == self.generation,
            "{pos} does not belong to this sequence (generation {})",
            self.generation
        );
        let index = pos.index();
        assert!(
            index < self.len || (allow_end && index == self.len),
            "cursor index {index} out of range for length {}",
            self.len
        );
        index
    }

    /// Drop the last element.
    ///
    /// Calling this on an empty sequence is a logic error: it trips a debug
    /// assertion and is otherwise a no-op.
    pub fn pop_back(&mut self) {
        debug_assert!(self.len > 0, "pop_back on an empty sequence");
        if self.len == 0 {
            return;
        }
        self.len -= 1;
        // SAFETY: slot `len` was live and is now outside the live range.
        unsafe { ptr::drop_in_place(self.data.slot_mut(self.len)) };
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot `len` was live and is now outside the live range.
        Some(unsafe { self.data.slot(self.len).read() })
    }

    /// Drop every element at or after `new_len`.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }
        let tail = ptr::slice_from_raw_parts_mut(self.data.slot_mut(new_len), self.len - new_len);
        self.len = new_len;
        // SAFETY: the tail was live; `len` already excludes it, so a
        // panicking destructor cannot cause a second drop.
        unsafe { ptr::drop_in_place(tail) };
    }

    /// Drop every element. Capacity is kept.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Remove the element at `pos`, shifting the tail left.
    ///
    /// Returns a cursor at the same index, which now addresses the removed
    /// element's successor (or the end).
    ///
    /// # Panics
    ///
    /// Panics if `pos` is not before the end.
    pub fn erase(&mut self, pos: Cursor<T>) -> Cursor<T> {
        let dist = self.position(pos, false);
        let tail = self.len - dist - 1;
        let hole = self.data.slot_mut(dist);
        // SAFETY: `dist < len`, so the hole is live and the tail `[dist + 1,
        // len)` is live. After the read the hole is logically empty and the
        // overlapping copy closes it.
        let removed = unsafe {
            let removed = hole.read();
            ptr::copy(hole.add(1), hole, tail);
            removed
        };
        self.len -= 1;
        drop(removed);
        self.cursor_at(dist)
    }

    /// Exchange contents with `other` without touching any element.
    ///
    /// Generations travel with their buffers, so existing cursors keep
    /// resolving against whichever sequence now owns their elements.
    pub fn swap(&mut self, other: &mut Self) {
        self.data.swap(&mut other.data);
        mem::swap(&mut self.len, &mut other.len);
        mem::swap(&mut self.generation, &mut other.generation);
    }

    /// Move the contents out, leaving this sequence empty.
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::new())
    }

    /// Move-assign from `other` by swapping. `other` receives the previous
    /// contents and drops them when it goes out of scope.
    pub fn move_assign(&mut self, other: &mut Self) {
        self.swap(other);
    }
}

impl<T, R: Relocate<T>> Sequence<T, R> {
    /// Relocation strategy this sequence uses when it grows.
    pub const RELOCATION: Strategy = R::STRATEGY;

    const GROWTH: GrowthPolicy = GrowthPolicy::DOUBLING;

    /// Ensure room for at least `new_capacity` elements.
    ///
    /// Grows to exactly `new_capacity` when the current buffer is smaller;
    /// otherwise does nothing.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow. If relocation panics (only possible when
    /// the strategy copies) the sequence is unchanged.
    pub fn reserve(&mut self, new_capacity: usize) {
        self.try_reserve(new_capacity)
            .unwrap_or_else(|err| err.escalate());
    }

    /// Fallible form of [`reserve`](Self::reserve).
    pub fn try_reserve(&mut self, new_capacity: usize) -> Result<(), SequenceError> {
        if new_capacity <= self.capacity() {
            return Ok(());
        }
        let mut fresh = RawStorage::try_with_capacity(new_capacity)?;
        // SAFETY: `[0, len)` is live in the old buffer and the fresh buffer
        // has at least `len` uninitialized slots.
        unsafe { R::transfer(self.data.as_ptr(), fresh.as_mut_ptr(), self.len) };
        self.commit(fresh, self.len);
        Ok(())
    }

    /// Install a fully populated buffer and retire the old one.
    fn commit(&mut self, mut fresh: RawStorage<T>, relocated: usize) {
        let generation = next_generation();
        tracing::trace!(
            old_capacity = self.data.capacity(),
            new_capacity = fresh.capacity(),
            relocated,
            strategy = ?R::STRATEGY,
            generation,
            "sequence storage relocated"
        );
        self.data.swap(&mut fresh);
        self.generation = generation;
        // SAFETY: `fresh` now holds the old buffer, whose first `relocated`
        // slots were the source of the transfer that just succeeded.
        unsafe { retire::<T, R>(fresh.as_mut_ptr(), relocated) };
    }

    fn grown_capacity(&self) -> Result<usize, SequenceError> {
        Self::GROWTH.next_capacity(self.capacity())
    }

    /// Append `value`.
    pub fn push_back(&mut self, value: T) {
        self.emplace_back(|| value);
    }

    /// Fallible form of [`push_back`](Self::push_back). On error `value` is
    /// dropped and the sequence is unchanged.
    pub fn try_push_back(&mut self, value: T) -> Result<(), SequenceError> {
        self.try_emplace_back(|| value).map(|_| ())
    }

    /// Append the value produced by `make` and return a reference to it.
    ///
    /// When the buffer is full, the new element is constructed in the new
    /// buffer before anything is relocated. A panic in `make` or during
    /// relocation leaves the sequence unchanged.
    pub fn emplace_back<F>(&mut self, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        match self.try_emplace_back(make) {
            Ok(slot) => slot,
            Err(err) => err.escalate(),
        }
    }

    /// Fallible form of [`emplace_back`](Self::emplace_back).
    pub fn try_emplace_back<F>(&mut self, make: F) -> Result<&mut T, SequenceError>
    where
        F: FnOnce() -> T,
    {
        let len = self.len;
        if len == self.capacity() {
            let mut fresh = RawStorage::try_with_capacity(self.grown_capacity()?)?;
            // SAFETY: `len < fresh.capacity()`, and the slot is uninitialized.
            let mut placed = unsafe { InitGuard::new(fresh.slot_mut(len)) };
            placed.push(make());
            // SAFETY: the old buffer has `len` live slots; the fresh buffer's
            // `[0, len)` is uninitialized and disjoint from it.
            unsafe { R::transfer(self.data.as_ptr(), fresh.as_mut_ptr(), len) };
            placed.finish();
            self.commit(fresh, len);
        } else {
            let value = make();
            // SAFETY: `len < capacity`, so the slot exists and is raw.
            unsafe { self.data.slot_mut(len).write(value) };
        }
        self.len = len + 1;
        // SAFETY: slot `len` was just constructed.
        Ok(unsafe { &mut *self.data.slot_mut(len) })
    }

    /// Insert `value` before `pos`. See [`emplace`](Self::emplace).
    pub fn insert(&mut self, pos: Cursor<T>, value: T) -> Cursor<T> {
        self.emplace(pos, || value)
    }

    /// Insert the value produced by `make` before `pos`, shifting the tail
    /// right. Returns a cursor to the new element, which addresses the new
    /// buffer if the sequence reallocated.
    ///
    /// In both branches `make` runs before any slot is touched, so a
    /// panicking constructor leaves the sequence unchanged. When the buffer
    /// is full, a panic while relocating the tail also leaves it unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is past the end, or on capacity overflow.
    pub fn emplace<F>(&mut self, pos: Cursor<T>, make: F) -> Cursor<T>
    where
        F: FnOnce() -> T,
    {
        self.try_emplace(pos, make)
            .unwrap_or_else(|err| err.escalate())
    }

    /// Fallible form of [`emplace`](Self::emplace).
    pub fn try_emplace<F>(&mut self, pos: Cursor<T>, make: F) -> Result<Cursor<T>, SequenceError>
    where
        F: FnOnce() -> T,
    {
        let dist = self.position(pos, true);
        if dist == self.len {
            self.try_emplace_back(make)?;
            return Ok(self.cursor_at(dist));
        }

        let len = self.len;
        if len == self.capacity() {
            let mut fresh = RawStorage::try_with_capacity(self.grown_capacity()?)?;
            // SAFETY: `dist < len < fresh.capacity()`; the slot is raw.
            let mut placed = unsafe { InitGuard::new(fresh.slot_mut(dist)) };
            placed.push(make());
            let src = self.data.as_ptr();
            let dst = fresh.as_mut_ptr();
            // SAFETY: the old buffer's `[0, len)` is live; the fresh buffer's
            // `[0, dist)` and `[dist + 1, len + 1)` are raw and disjoint from
            // it. If the tail transfer panics, `prefix` drops the relocated
            // head, then `placed` drops the new element, then `fresh` is
            // released.
            unsafe {
                R::transfer(src, dst, dist);
                let prefix = InitGuard::with_initialized(dst, dist);
                R::transfer(src.add(dist), dst.add(dist + 1), len - dist);
                prefix.finish();
            }
            placed.finish();
            self.commit(fresh, len);
        } else {
            let value = make();
            let hole = self.data.slot_mut(dist);
            // SAFETY: `len < capacity`, so `[dist + 1, len + 1)` is in bounds.
            // The overlapping copy shifts the live tail up by one, leaving the
            // hole logically raw for the write.
            unsafe {
                ptr::copy(hole, hole.add(1), len - dist);
                hole.write(value);
            }
        }
        self.len = len + 1;
        Ok(self.cursor_at(dist))
    }

    /// Resize to `new_len`, filling new slots with `T::default()`.
    pub fn resize(&mut self, new_len: usize)
    where
        T: Default,
    {
        self.resize_with(new_len, T::default);
    }

    /// Fallible form of [`resize`](Self::resize).
    pub fn try_resize(&mut self, new_len: usize) -> Result<(), SequenceError>
    where
        T: Default,
    {
        self.try_resize_with(new_len, T::default)
    }

    /// Resize to `new_len`, filling new slots with values from `fill`.
    ///
    /// Growth reserves exactly `new_len`. If `fill` panics, the elements it
    /// already produced are dropped and the length is unchanged.
    pub fn resize_with<F>(&mut self, new_len: usize, fill: F)
    where
        F: FnMut() -> T,
    {
        self.try_resize_with(new_len, fill)
            .unwrap_or_else(|err| err.escalate());
    }

    /// Fallible form of [`resize_with`](Self::resize_with).
    pub fn try_resize_with<F>(&mut self, new_len: usize, mut fill: F) -> Result<(), SequenceError>
    where
        F: FnMut() -> T,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }
        self.try_reserve(new_len)?;
        // SAFETY: `[len, new_len)` is raw and within capacity after reserve.
        let mut built = unsafe { InitGuard::new(self.data.slot_mut(self.len)) };
        for _ in self.len..new_len {
            built.push(fill());
        }
        self.len += built.finish();
        Ok(())
    }
}

impl<T, R> Drop for Sequence<T, R> {
    fn drop(&mut self) {
        // SAFETY: the live range is dropped exactly once; `data` then
        // releases the buffer without touching slots.
        unsafe { ptr::drop_in_place(self.as_mut_slice()) }
    }
}

impl<T, R> Default for Sequence<T, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, R> Clone for Sequence<T, R> {
    /// Element-wise clone into a buffer of exactly `len` slots.
    fn clone(&self) -> Self {
        let mut data = RawStorage::with_capacity(self.len);
        // SAFETY: `[0, len)` is live here and raw in the fresh buffer.
        unsafe { clone_into(self.data.as_ptr(), data.as_mut_ptr(), self.len) };
        Self::from_parts(data, self.len)
    }

    /// Copy-assignment.
    ///
    /// A source longer than this sequence's capacity is cloned into a
    /// temporary and swapped in, so a panicking clone leaves `self`
    /// unchanged. Otherwise elements are assigned in place and capacity is
    /// kept.
    fn clone_from(&mut self, source: &Self) {
        if source.len > self.capacity() {
            let mut copy = source.clone();
            self.swap(&mut copy);
            return;
        }
        if source.len > self.len {
            let (head, tail) = source.as_slice().split_at(self.len);
            self.as_mut_slice().clone_from_slice(head);
            // SAFETY: `[len, source.len)` is raw and within capacity.
            unsafe { clone_into(tail.as_ptr(), self.data.slot_mut(self.len), tail.len()) };
            self.len = source.len;
        } else {
            self.as_mut_slice()[..source.len].clone_from_slice(source.as_slice());
            self.truncate(source.len);
        }
    }
}

impl<T, R> Deref for Sequence<T, R> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, R> DerefMut for Sequence<T, R> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: fmt::Debug, R> fmt::Debug for Sequence<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: PartialEq, R, S> PartialEq<Sequence<T, S>> for Sequence<T, R> {
    fn eq(&self, other: &Sequence<T, S>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, R> Eq for Sequence<T, R> {}

impl<T: PartialEq, R> PartialEq<[T]> for Sequence<T, R> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, R, const N: usize> PartialEq<[T; N]> for Sequence<T, R> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, R: Relocate<T>> Extend<T> for Sequence<T, R> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        if lower > self.spare_capacity() {
            let wanted = self
                .len
                .checked_add(lower)
                .unwrap_or_else(|| SequenceError::CapacityOverflow { requested: lower }.escalate());
            self.reserve(wanted);
        }
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T, R: Relocate<T>> FromIterator<T> for Sequence<T, R> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut seq = Self::new();
        seq.extend(iter);
        seq
    }
}

impl<'a, T, R> IntoIterator for &'a Sequence<T, R> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T, R> IntoIterator for &'a mut Sequence<T, R> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}
