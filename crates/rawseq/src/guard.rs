//! Rollback guard for partially constructed regions.
//!
//! A panicking constructor unwinds out of the middle of a fill loop.
//! [`InitGuard`] records how far construction got so that its `Drop` can
//! undo exactly that much work, newest value first. Successful paths
//! disarm it with `finish`.

use std::mem;
use std::ptr;

/// Tracks values written into consecutive uninitialized slots.
///
/// On drop, every value written through [`push`](Self::push) is dropped in
/// reverse order of construction. Call [`finish`](Self::finish) once the
/// region is committed to hand ownership to the caller instead.
pub(crate) struct InitGuard<T> {
    base: *mut T,
    initialized: usize,
}

impl<T> InitGuard<T> {
    /// Start tracking a region beginning at `base`.
    ///
    /// # Safety
    ///
    /// Every slot this guard will write to, `base..base + n` for the number
    /// of pushes `n`, must be valid for writes and uninitialized, and must
    /// stay allocated until the guard is finished or dropped.
    pub(crate) unsafe fn new(base: *mut T) -> Self {
        Self {
            base,
            initialized: 0,
        }
    }

    /// Take over a region whose first `initialized` slots are already live.
    ///
    /// # Safety
    ///
    /// As for [`new`](Self::new), and `base..base + initialized` must hold
    /// live values owned by nobody else.
    pub(crate) unsafe fn with_initialized(base: *mut T, initialized: usize) -> Self {
        Self { base, initialized }
    }

    /// Construct the next slot from `value`.
    pub(crate) fn push(&mut self, value: T) {
        // SAFETY: the slot is in range and uninitialized per `new`'s contract.
        unsafe { self.base.add(self.initialized).write(value) };
        self.initialized += 1;
    }

    /// Number of slots constructed so far.
    #[cfg(test)]
    pub(crate) fn initialized(&self) -> usize {
        self.initialized
    }

    /// Disarm the guard, returning how many slots it constructed.
    pub(crate) fn finish(self) -> usize {
        let initialized = self.initialized;
        mem::forget(self);
        initialized
    }
}

impl<T> Drop for InitGuard<T> {
    fn drop(&mut self) {
        while self.initialized > 0 {
            self.initialized -= 1;
            // SAFETY: this slot was written by `push` and not yet dropped.
            unsafe { ptr::drop_in_place(self.base.add(self.initialized)) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::mem::MaybeUninit;

    struct Noisy<'a> {
        id: u32,
        log: &'a RefCell<Vec<u32>>,
    }

    impl Drop for Noisy<'_> {
        fn drop(&mut self) {
            self.log.borrow_mut().push(self.id);
        }
    }

    #[test]
    fn dropped_guard_unwinds_newest_first() {
        let log = RefCell::new(Vec::new());
        let mut slots: [MaybeUninit<Noisy<'_>>; 3] = [const { MaybeUninit::uninit() }; 3];
        {
            // SAFETY: three uninitialized slots outlive the guard.
            let mut guard = unsafe { InitGuard::new(slots.as_mut_ptr().cast::<Noisy<'_>>()) };
            for id in 0..3 {
                guard.push(Noisy { id, log: &log });
            }
            assert_eq!(guard.initialized(), 3);
        }
        assert_eq!(*log.borrow(), vec![2, 1, 0]);
    }

    #[test]
    fn finished_guard_leaves_values_alive() {
        let mut slots: [MaybeUninit<String>; 2] = [const { MaybeUninit::uninit() }; 2];
        // SAFETY: two uninitialized slots outlive the guard.
        let mut guard = unsafe { InitGuard::new(slots.as_mut_ptr().cast::<String>()) };
        guard.push("a".to_owned());
        guard.push("b".to_owned());
        assert_eq!(guard.finish(), 2);
        // SAFETY: the guard committed both slots.
        let [a, b] = unsafe { slots.map(|slot| slot.assume_init()) };
        assert_eq!((a.as_str(), b.as_str()), ("a", "b"));
    }

    #[test]
    fn adopted_region_is_dropped_with_new_values() {
        let log = RefCell::new(Vec::new());
        let mut slots: [MaybeUninit<Noisy<'_>>; 3] = [const { MaybeUninit::uninit() }; 3];
        slots[0].write(Noisy { id: 10, log: &log });
        {
            // SAFETY: slot 0 is live and slots 1..3 are uninitialized.
            let mut guard =
                unsafe { InitGuard::with_initialized(slots.as_mut_ptr().cast::<Noisy<'_>>(), 1) };
            guard.push(Noisy { id: 11, log: &log });
        }
        assert_eq!(*log.borrow(), vec![11, 10]);
    }
}
