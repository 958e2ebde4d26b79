//! Contiguous sequence container over raw, uninitialized storage.
//!
//! The container is split in two layers so that element lifetime never
//! leaks into memory management:
//!
//! ```text
//! Sequence<T, R>           live range [0, len), growth, panic safety
//! ├── RawStorage<T>        aligned heap buffer of `capacity` raw slots
//! ├── R: Relocate<T>       move-or-copy decision, fixed at compile time
//! └── InitGuard<T>         rollback of partially constructed regions
//! ```
//!
//! # Panic safety
//!
//! Element constructors and clones may panic. Every reallocating operation
//! builds the new buffer to completion before swapping it in; if anything
//! panics on the way, the guards drop what was built, the new buffer is
//! released, and the sequence is exactly as it was. Allocation failure is
//! reported by the `try_*` methods as [`SequenceError`]; the infallible
//! methods panic on capacity overflow and defer to
//! [`std::alloc::handle_alloc_error`] when the allocator fails.
//!
//! # Relocation
//!
//! A Rust move never fails, so the default policy [`ByMove`] relocates
//! with a bitwise copy. Element types whose moves should not be trusted
//! mid-relocation declare it through [`MoveTraits`] and use [`ByTraits`]
//! (or force cloning with [`ByClone`]); growth then clones into the new
//! buffer and only drops the originals once every clone has succeeded.
//!
//! # Cursors
//!
//! [`Cursor`]s are buffer positions with no borrow attached. Any
//! reallocation invalidates them; [`Sequence::index_of`] detects cursors
//! from a previous buffer.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod cursor;
pub mod error;
mod guard;
pub mod raw;
pub mod relocate;
pub mod sequence;

// Public re-exports for the primary API surface.
pub use config::GrowthPolicy;
pub use cursor::Cursor;
pub use error::SequenceError;
pub use raw::RawStorage;
pub use relocate::{ByClone, ByMove, ByTraits, MoveTraits, Relocate, Strategy};
pub use sequence::Sequence;
