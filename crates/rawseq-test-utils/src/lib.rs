//! Test utilities and instrumented element types for rawseq development.
//!
//! Provides a [`Ledger`] that records every construction, clone and drop of
//! the [`Tracked`] values it hands out, with optional [`ThrowBudget`]s that
//! make constructors or clones panic after a set number of successes. The
//! [`fixtures`] module wraps `Tracked` in types that declare different
//! relocation properties.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexSet;

pub use fixtures::{CopyOnGrow, MoveOnGrow, MoveOnly};

/// Number of operations allowed before the next one panics.
///
/// `ThrowBudget::unlimited()` never panics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThrowBudget {
    remaining: Option<usize>,
}

impl ThrowBudget {
    pub fn unlimited() -> Self {
        Self { remaining: None }
    }

    /// Allow `n` successes; the `n + 1`-th operation panics.
    pub fn after(n: usize) -> Self {
        Self { remaining: Some(n) }
    }

    /// Consume one operation. Returns `false` once the budget is exhausted.
    fn spend(&mut self) -> bool {
        match &mut self.remaining {
            None => true,
            Some(0) => false,
            Some(n) => {
                *n -= 1;
                true
            }
        }
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    next_id: u64,
    live: IndexSet<u64>,
    constructions: usize,
    clones: usize,
    drops: usize,
    drop_log: Vec<u64>,
    construct_budget: ThrowBudget,
    clone_budget: ThrowBudget,
}

impl LedgerState {
    fn mint(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        id
    }
}

/// Shared bookkeeping for a family of [`Tracked`] values.
///
/// Cloning a `Ledger` yields another handle to the same records.
#[derive(Clone, Default)]
pub struct Ledger {
    state: Rc<RefCell<LedgerState>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a tracked value, consuming the construction budget.
    ///
    /// # Panics
    ///
    /// Panics with `"construct budget exhausted"` when the budget is spent.
    pub fn make(&self, value: i64) -> Tracked {
        let id = {
            let mut state = self.state.borrow_mut();
            if !state.construct_budget.spend() {
                drop(state);
                panic!("construct budget exhausted");
            }
            state.constructions += 1;
            state.mint()
        };
        Tracked {
            id,
            value,
            ledger: self.clone(),
        }
    }

    /// Construct one tracked value per entry of `values`.
    pub fn make_all(&self, values: impl IntoIterator<Item = i64>) -> Vec<Tracked> {
        values.into_iter().map(|value| self.make(value)).collect()
    }

    pub fn set_construct_budget(&self, budget: ThrowBudget) {
        self.state.borrow_mut().construct_budget = budget;
    }

    pub fn set_clone_budget(&self, budget: ThrowBudget) {
        self.state.borrow_mut().clone_budget = budget;
    }

    /// Reset every counter and the drop log. Live ids are kept.
    pub fn reset_counters(&self) {
        let mut state = self.state.borrow_mut();
        state.constructions = 0;
        state.clones = 0;
        state.drops = 0;
        state.drop_log.clear();
    }

    pub fn constructions(&self) -> usize {
        self.state.borrow().constructions
    }

    pub fn clones(&self) -> usize {
        self.state.borrow().clones
    }

    pub fn drops(&self) -> usize {
        self.state.borrow().drops
    }

    /// Number of tracked values currently alive.
    pub fn live_count(&self) -> usize {
        self.state.borrow().live.len()
    }

    /// Ids of live values, in creation order.
    pub fn live_ids(&self) -> Vec<u64> {
        self.state.borrow().live.iter().copied().collect()
    }

    pub fn is_live(&self, id: u64) -> bool {
        self.state.borrow().live.contains(&id)
    }

    /// Ids in the order their values were dropped.
    pub fn drop_log(&self) -> Vec<u64> {
        self.state.borrow().drop_log.clone()
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Ledger")
            .field("live", &state.live.len())
            .field("constructions", &state.constructions)
            .field("clones", &state.clones)
            .field("drops", &state.drops)
            .finish()
    }
}

/// An element with an identity, a value, and a ledger that records its
/// lifecycle.
///
/// Equality compares values only; use [`id`](Tracked::id) to check that a
/// slot still holds the same instance.
pub struct Tracked {
    id: u64,
    value: i64,
    ledger: Ledger,
}

impl Tracked {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

impl Clone for Tracked {
    /// # Panics
    ///
    /// Panics with `"clone budget exhausted"` when the ledger's clone budget
    /// is spent. Nothing is recorded for the failed clone.
    fn clone(&self) -> Self {
        let id = {
            let mut state = self.ledger.state.borrow_mut();
            if !state.clone_budget.spend() {
                drop(state);
                panic!("clone budget exhausted");
            }
            state.clones += 1;
            state.mint()
        };
        Self {
            id,
            value: self.value,
            ledger: self.ledger.clone(),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        let mut state = self.ledger.state.borrow_mut();
        let was_live = state.live.shift_remove(&self.id);
        assert!(was_live, "tracked value {} dropped twice", self.id);
        state.drops += 1;
        state.drop_log.push(self.id);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialEq<i64> for Tracked {
    fn eq(&self, other: &i64) -> bool {
        self.value == *other
    }
}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tracked(#{} = {})", self.id, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn make_and_drop_are_recorded() {
        let ledger = Ledger::new();
        let a = ledger.make(1);
        let b = ledger.make(2);
        assert_eq!(ledger.live_ids(), vec![a.id(), b.id()]);
        let b_id = b.id();
        drop(b);
        assert_eq!(ledger.drops(), 1);
        assert_eq!(ledger.drop_log(), vec![b_id]);
        assert!(!ledger.is_live(b_id));
        assert_eq!(ledger.live_count(), 1);
    }

    #[test]
    fn clone_gets_a_fresh_identity() {
        let ledger = Ledger::new();
        let a = ledger.make(5);
        let b = a.clone();
        assert_ne!(a.id(), b.id());
        assert_eq!(a, b);
        assert_eq!(ledger.clones(), 1);
    }

    #[test]
    fn clone_budget_panics_when_spent() {
        let ledger = Ledger::new();
        let a = ledger.make(1);
        ledger.set_clone_budget(ThrowBudget::after(1));
        let _ok = a.clone();
        let result = catch_unwind(AssertUnwindSafe(|| a.clone()));
        assert!(result.is_err());
        assert_eq!(ledger.clones(), 1);
        assert_eq!(ledger.live_count(), 2);
    }

    #[test]
    fn construct_budget_panics_when_spent() {
        let ledger = Ledger::new();
        ledger.set_construct_budget(ThrowBudget::after(0));
        let result = catch_unwind(AssertUnwindSafe(|| ledger.make(1)));
        assert!(result.is_err());
        assert_eq!(ledger.constructions(), 0);
        assert_eq!(ledger.live_count(), 0);
    }

    #[test]
    fn reset_counters_keeps_live_set() {
        let ledger = Ledger::new();
        let _a = ledger.make(1);
        let _b = ledger.make(2).clone();
        ledger.reset_counters();
        assert_eq!(ledger.clones(), 0);
        assert_eq!(ledger.drops(), 0);
        assert!(ledger.drop_log().is_empty());
        assert_eq!(ledger.live_count(), 2);
    }

    #[test]
    fn unlimited_budget_never_runs_out() {
        let mut budget = ThrowBudget::unlimited();
        assert!((0..1000).all(|_| budget.spend()));
    }
}
