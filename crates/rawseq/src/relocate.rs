//! Relocation strategies used when a sequence moves to a larger buffer.
//!
//! Relocation either *moves* the live elements (a bitwise copy after which
//! the old slots are dead) or *copies* them (clones, after which the old
//! elements are still live and are dropped only once the whole relocation
//! has committed). Moving is cheaper, but copying is the only way to keep
//! the old buffer intact until nothing can fail any more.
//!
//! The choice is made per element type at compile time through a
//! [`Relocate`] policy:
//!
//! | Policy | Strategy | Applies to |
//! |---|---|---|
//! | [`ByMove`] | always move | every `T` (default) |
//! | [`ByClone`] | always copy | `T: Clone` |
//! | [`ByTraits`] | move if [`MoveTraits::NOTHROW_MOVE`], else copy | `T: MoveTraits` |
//!
//! A type that is not `Clone` cannot implement [`MoveTraits`], so under
//! every policy it is relocated by move.

use std::ptr;

use crate::guard::InitGuard;

/// How a relocation transfers elements to the new buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Bitwise move; the source slots become uninitialized.
    Move,
    /// Element-wise clone; the source elements stay live until committed.
    Copy,
}

/// Compile-time relocation policy for elements of type `T`.
///
/// # Safety
///
/// Implementations of [`transfer`](Self::transfer) must honour the
/// post-conditions documented there for their declared
/// [`STRATEGY`](Self::STRATEGY); the container relies on them to decide
/// which slots to drop.
pub unsafe trait Relocate<T> {
    /// The strategy this policy uses for `T`.
    const STRATEGY: Strategy;

    /// Transfer `count` live elements from `src` into the uninitialized
    /// slots at `dst`.
    ///
    /// On return `dst[..count]` is live. Under [`Strategy::Move`] the source
    /// slots are logically uninitialized and must not be dropped; under
    /// [`Strategy::Copy`] they are still live. If a clone panics, the
    /// elements already written to `dst` are dropped (newest first) before
    /// the panic resumes and `src` is left untouched.
    ///
    /// # Safety
    ///
    /// `src` must be valid for reads of `count` live elements, `dst` valid
    /// for writes of `count` elements, and the two regions must not overlap.
    unsafe fn transfer(src: *const T, dst: *mut T, count: usize);
}

/// Declared relocation properties of an element type.
///
/// The `Clone` supertrait is the "copy constructible" predicate; the
/// constant declares whether moving a value may be relied upon to leave
/// both sides consistent if something fails mid-relocation. Types with
/// `NOTHROW_MOVE = false` are relocated by cloning under [`ByTraits`].
pub trait MoveTraits: Clone {
    /// Whether relocation by move is safe for this type.
    const NOTHROW_MOVE: bool;
}

/// Relocate by bitwise move. Never panics.
#[derive(Debug)]
pub enum ByMove {}

/// Relocate by cloning, keeping the old buffer intact until commit.
#[derive(Debug)]
pub enum ByClone {}

/// Relocate according to the element type's [`MoveTraits`].
///
/// Only types implementing [`MoveTraits`], and therefore `Clone`, can use
/// this policy; `Sequence<T, ByTraits>` with a non-`Clone` `T` does not
/// compile. Such types can only be relocated by move, so they use the
/// default [`ByMove`] policy instead.
///
/// ```compile_fail
/// use rawseq::{ByTraits, Sequence};
///
/// struct NotClone;
///
/// let mut seq: Sequence<NotClone, ByTraits> = Sequence::new();
/// seq.push_back(NotClone);
/// ```
#[derive(Debug)]
pub enum ByTraits {}

// SAFETY: a non-overlapping bitwise copy transfers ownership of every
// element; the source slots are treated as uninitialized afterwards.
unsafe impl<T> Relocate<T> for ByMove {
    const STRATEGY: Strategy = Strategy::Move;

    unsafe fn transfer(src: *const T, dst: *mut T, count: usize) {
        // SAFETY: forwarded from the caller.
        unsafe { ptr::copy_nonoverlapping(src, dst, count) }
    }
}

// SAFETY: `clone_into` leaves the source untouched and rolls back the
// destination on panic.
unsafe impl<T: Clone> Relocate<T> for ByClone {
    const STRATEGY: Strategy = Strategy::Copy;

    unsafe fn transfer(src: *const T, dst: *mut T, count: usize) {
        // SAFETY: forwarded from the caller.
        unsafe { clone_into(src, dst, count) }
    }
}

// SAFETY: delegates to one of the two policies above and reports that
// policy's strategy.
unsafe impl<T: MoveTraits> Relocate<T> for ByTraits {
    const STRATEGY: Strategy = if T::NOTHROW_MOVE {
        Strategy::Move
    } else {
        Strategy::Copy
    };

    unsafe fn transfer(src: *const T, dst: *mut T, count: usize) {
        // SAFETY: forwarded from the caller.
        unsafe {
            match <Self as Relocate<T>>::STRATEGY {
                Strategy::Move => <ByMove as Relocate<T>>::transfer(src, dst, count),
                Strategy::Copy => <ByClone as Relocate<T>>::transfer(src, dst, count),
            }
        }
    }
}

/// Clone `count` elements from `src` into uninitialized `dst`.
///
/// # Safety
///
/// Same contract as [`Relocate::transfer`].
pub(crate) unsafe fn clone_into<T: Clone>(src: *const T, dst: *mut T, count: usize) {
    // SAFETY: `dst` is valid for `count` uninitialized writes.
    let mut guard = unsafe { InitGuard::new(dst) };
    for i in 0..count {
        // SAFETY: `src[i]` is live for every `i < count`.
        let item = unsafe { &*src.add(i) };
        guard.push(item.clone());
    }
    guard.finish();
}

/// Retire the source range of a committed relocation.
///
/// Copied sources are still live and are dropped here; moved sources are
/// already dead and are left alone.
///
/// # Safety
///
/// `src[..count]` must be the source range of a successful
/// `R::transfer` that has not been retired yet.
pub(crate) unsafe fn retire<T, R: Relocate<T>>(src: *mut T, count: usize) {
    if R::STRATEGY == Strategy::Copy {
        // SAFETY: under the copy strategy the sources are still live.
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(src, count)) }
    }
}
