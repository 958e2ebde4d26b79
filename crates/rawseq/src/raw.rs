//! Uninitialized, aligned backing storage.
//!
//! [`RawStorage`] owns a heap buffer of `capacity` slots for `T` and nothing
//! else. It never constructs or drops a `T`: which slots are live is the
//! business of the owner (see [`Sequence`](crate::Sequence)). Dropping a
//! `RawStorage` returns the memory to the allocator and leaves any values
//! still sitting in its slots untouched.

use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use crate::error::SequenceError;

/// An owned, uninitialized buffer of `capacity` slots for `T`.
///
/// When nothing is allocated (zero capacity, or a zero-sized `T`) the
/// pointer is dangling but well aligned, so slot arithmetic stays valid.
pub struct RawStorage<T> {
    ptr: NonNull<T>,
    capacity: usize,
    _owns: PhantomData<T>,
}

// SAFETY: RawStorage owns its buffer exclusively; sending or sharing it is
// sound whenever the values that may be stored in it are.
unsafe impl<T: Send> Send for RawStorage<T> {}
// SAFETY: see above; `&RawStorage` only exposes raw pointers.
unsafe impl<T: Sync> Sync for RawStorage<T> {}

impl<T> RawStorage<T> {
    /// Empty storage: no buffer, zero capacity.
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
            _owns: PhantomData,
        }
    }

    /// Acquire storage for `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow. Allocator failure is routed to
    /// [`std::alloc::handle_alloc_error`].
    pub fn with_capacity(capacity: usize) -> Self {
        Self::try_with_capacity(capacity).unwrap_or_else(|err| err.escalate())
    }

    /// Acquire storage for `capacity` slots, reporting failure as an error.
    ///
    /// A zero `capacity` never touches the allocator.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, SequenceError> {
        let ptr = Self::allocate(capacity)?;
        Ok(Self {
            ptr,
            capacity,
            _owns: PhantomData,
        })
    }

    fn layout_for(capacity: usize) -> Result<Layout, SequenceError> {
        Layout::array::<T>(capacity).map_err(|_| SequenceError::CapacityOverflow {
            requested: capacity,
        })
    }

    fn allocate(capacity: usize) -> Result<NonNull<T>, SequenceError> {
        let layout = Self::layout_for(capacity)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        // SAFETY: the layout has a non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw.cast::<T>())
            .ok_or_else(|| SequenceError::allocation_failed(layout))?;
        tracing::trace!(capacity, bytes = layout.size(), "raw storage acquired");
        Ok(ptr)
    }

    /// Number of slots in the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether this storage holds memory obtained from the allocator.
    pub fn is_allocated(&self) -> bool {
        self.capacity != 0 && mem::size_of::<T>() != 0
    }

    /// Address of slot 0.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Mutable address of slot 0.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Address of slot `offset`.
    ///
    /// `offset == capacity` yields the one-past-the-end address. Computing an
    /// address is always safe; reading or writing through it is the caller's
    /// responsibility.
    pub fn slot(&self, offset: usize) -> *const T {
        debug_assert!(
            offset <= self.capacity,
            "slot {offset} out of range for capacity {}",
            self.capacity
        );
        self.ptr.as_ptr().wrapping_add(offset)
    }

    /// Mutable address of slot `offset`. Same contract as [`slot`](Self::slot).
    pub fn slot_mut(&mut self, offset: usize) -> *mut T {
        debug_assert!(
            offset <= self.capacity,
            "slot {offset} out of range for capacity {}",
            self.capacity
        );
        self.ptr.as_ptr().wrapping_add(offset)
    }

    /// Exchange buffers and capacities with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Move the buffer out, leaving this storage empty.
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::new())
    }

    /// Install `other`'s buffer and hand back the previous one.
    ///
    /// The returned storage still owns the old buffer; dropping it releases
    /// the memory without dropping any values left in its slots.
    pub fn replace(&mut self, other: Self) -> Self {
        mem::replace(self, other)
    }

    /// Size of the buffer in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.capacity * mem::size_of::<T>()
    }
}

impl<T> Default for RawStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for RawStorage<T> {
    fn drop(&mut self) {
        if !self.is_allocated() {
            return;
        }
        if let Ok(layout) = Self::layout_for(self.capacity) {
            tracing::trace!(capacity = self.capacity, "raw storage released");
            // SAFETY: `ptr` came from `alloc::alloc` with exactly this layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr().cast(), layout) }
        }
    }
}

impl<T> fmt::Debug for RawStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawStorage")
            .field("ptr", &self.ptr)
            .field("capacity", &self.capacity)
            .finish()
    }
}
