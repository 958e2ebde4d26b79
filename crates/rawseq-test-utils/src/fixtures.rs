//! Element types with declared relocation properties.
//!
//! Each fixture wraps a [`Tracked`] so tests can count clones and drops:
//!
//! - [`CopyOnGrow`]: moves are declared unsafe to rely on; relocated by
//!   cloning under [`ByTraits`](rawseq::ByTraits).
//! - [`MoveOnGrow`]: moves are declared infallible; relocated by move.
//! - [`MoveOnly`]: not `Clone`, so it can only ever be moved.

use rawseq::MoveTraits;

use crate::{Ledger, Tracked};

/// Clonable element whose moves must not be relied upon mid-relocation.
#[derive(Clone, Debug, PartialEq)]
pub struct CopyOnGrow(pub Tracked);

impl MoveTraits for CopyOnGrow {
    const NOTHROW_MOVE: bool = false;
}

/// Clonable element with a no-fail move.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveOnGrow(pub Tracked);

impl MoveTraits for MoveOnGrow {
    const NOTHROW_MOVE: bool = true;
}

/// Element that cannot be cloned.
#[derive(Debug, PartialEq)]
pub struct MoveOnly(pub Tracked);

impl Ledger {
    pub fn copy_on_grow(&self, value: i64) -> CopyOnGrow {
        CopyOnGrow(self.make(value))
    }

    pub fn move_on_grow(&self, value: i64) -> MoveOnGrow {
        MoveOnGrow(self.make(value))
    }

    pub fn move_only(&self, value: i64) -> MoveOnly {
        MoveOnly(self.make(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawseq::{ByTraits, Relocate, Strategy};

    #[test]
    fn declared_traits_pick_the_strategy() {
        assert_eq!(<ByTraits as Relocate<CopyOnGrow>>::STRATEGY, Strategy::Copy);
        assert_eq!(<ByTraits as Relocate<MoveOnGrow>>::STRATEGY, Strategy::Move);
    }

    #[test]
    fn fixtures_share_the_ledger() {
        let ledger = Ledger::new();
        let a = ledger.copy_on_grow(1);
        let b = ledger.move_on_grow(2);
        let c = ledger.move_only(3);
        assert_eq!(ledger.live_count(), 3);
        assert_eq!((a.0.value(), b.0.value(), c.0.value()), (1, 2, 3));
    }
}
