//! Growth policy parameters.

use crate::error::SequenceError;

/// How a full sequence picks its next capacity.
///
/// The policy only applies to growth triggered by a single insertion
/// (`push_back`, `emplace_back`, `emplace`). Explicit `reserve` and `resize`
/// requests allocate exactly what was asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowthPolicy {
    /// Multiplier applied to the current capacity.
    ///
    /// Must be at least 2 so that every growth step adds a slot.
    pub factor: usize,

    /// Capacity used when growing from an empty buffer.
    ///
    /// Must be at least 1.
    pub min_capacity: usize,
}

impl GrowthPolicy {
    /// Geometric doubling starting from a single slot: 1, 2, 4, 8, ...
    pub const DOUBLING: Self = Self {
        factor: 2,
        min_capacity: 1,
    };

    /// Capacity to grow to when `current` slots are all live.
    ///
    /// Returns [`SequenceError::CapacityOverflow`] if the multiplication
    /// overflows `usize`.
    pub fn next_capacity(&self, current: usize) -> Result<usize, SequenceError> {
        debug_assert!(self.factor >= 2 && self.min_capacity >= 1);
        if current == 0 {
            return Ok(self.min_capacity);
        }
        current
            .checked_mul(self.factor)
            .map(|grown| grown.max(self.min_capacity))
            .ok_or(SequenceError::CapacityOverflow { requested: current })
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::DOUBLING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubling_starts_at_one() {
        let policy = GrowthPolicy::DOUBLING;
        assert_eq!(policy.next_capacity(0), Ok(1));
        assert_eq!(policy.next_capacity(1), Ok(2));
        assert_eq!(policy.next_capacity(2), Ok(4));
        assert_eq!(policy.next_capacity(4), Ok(8));
    }

    #[test]
    fn overflow_is_reported() {
        let policy = GrowthPolicy::DOUBLING;
        assert!(matches!(
            policy.next_capacity(usize::MAX / 2 + 1),
            Err(SequenceError::CapacityOverflow { .. })
        ));
    }

    #[test]
    fn min_capacity_applies_to_small_buffers() {
        let policy = GrowthPolicy {
            factor: 2,
            min_capacity: 8,
        };
        assert_eq!(policy.next_capacity(0), Ok(8));
        assert_eq!(policy.next_capacity(2), Ok(8));
        assert_eq!(policy.next_capacity(8), Ok(16));
    }

    #[test]
    fn default_is_doubling() {
        assert_eq!(GrowthPolicy::default(), GrowthPolicy::DOUBLING);
    }
}
