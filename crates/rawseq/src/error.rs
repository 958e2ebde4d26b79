//! Storage-specific error types.

use std::alloc::Layout;
use std::error::Error;
use std::fmt;

/// Errors that can occur while acquiring backing storage.
///
/// Element construction failures are not represented here: a panicking
/// constructor unwinds through the container, which rolls back any partial
/// work before the panic resumes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequenceError {
    /// The requested slot count cannot be represented as an allocation
    /// (the byte size exceeds `isize::MAX`, or growth arithmetic overflowed).
    CapacityOverflow {
        /// Number of slots requested.
        requested: usize,
    },
    /// The allocator could not satisfy the request.
    AllocationFailed {
        /// Size of the failed request in bytes.
        bytes: usize,
        /// Alignment of the failed request in bytes.
        align: usize,
    },
}

impl SequenceError {
    pub(crate) fn allocation_failed(layout: Layout) -> Self {
        Self::AllocationFailed {
            bytes: layout.size(),
            align: layout.align(),
        }
    }

    /// The layout of a failed allocation, if this error came from the allocator.
    pub fn layout(&self) -> Option<Layout> {
        match *self {
            Self::AllocationFailed { bytes, align } => Layout::from_size_align(bytes, align).ok(),
            Self::CapacityOverflow { .. } => None,
        }
    }

    /// Escalate an error from an infallible entry point.
    ///
    /// Capacity overflow panics; allocator failure is routed to
    /// [`std::alloc::handle_alloc_error`], which aborts by default.
    pub(crate) fn escalate(self) -> ! {
        match self.layout() {
            Some(layout) => std::alloc::handle_alloc_error(layout),
            None => panic!("{self}"),
        }
    }
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityOverflow { requested } => {
                write!(f, "capacity overflow: {requested} slots requested")
            }
            Self::AllocationFailed { bytes, align } => {
                write!(
                    f,
                    "allocation failed: {bytes} bytes with alignment {align}"
                )
            }
        }
    }
}

impl Error for SequenceError {}
