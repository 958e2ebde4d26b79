//! Benchmark workloads for the rawseq container.
//!
//! Workloads are generated up front from a seed so every run replays the
//! same positions:
//!
//! - [`insert_positions`]: cursor indices for a run of inserts into a
//!   growing sequence
//! - [`erase_positions`]: cursor indices for draining a sequence
//! - [`mixed_workload`]: interleaved pushes, inserts, erases and pops
//! - [`apply`]: replay a workload against a [`Sequence`]

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rawseq::{Relocate, Sequence};

/// One step of a replayable workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Append a value.
    Push(u64),
    /// Insert a value before the given index.
    Insert(usize, u64),
    /// Remove the element at the given index.
    Erase(usize),
    /// Drop the last element.
    Pop,
}

/// Insert indices for growing a sequence from `initial_len` by `count`
/// elements. Each index is valid for the length at that step.
pub fn insert_positions(initial_len: usize, count: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|i| rng.random_range(0..=initial_len + i))
        .collect()
}

/// Erase indices for removing every element of a sequence of length `len`.
pub fn erase_positions(len: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|i| rng.random_range(0..len - i)).collect()
}

/// A mix of `count` operations that never erases or pops from an empty
/// sequence. Pushes and inserts outweigh removals, so the sequence grows.
pub fn mixed_workload(count: usize, seed: u64) -> Vec<Op> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut len = 0usize;
    let mut ops = Vec::with_capacity(count);
    for step in 0..count {
        let value = step as u64;
        let op = match rng.random_range(0..10u32) {
            _ if len == 0 => Op::Push(value),
            0..=4 => Op::Push(value),
            5..=6 => Op::Insert(rng.random_range(0..=len), value),
            7..=8 => Op::Erase(rng.random_range(0..len)),
            _ => Op::Pop,
        };
        match op {
            Op::Push(_) | Op::Insert(..) => len += 1,
            Op::Erase(_) | Op::Pop => len -= 1,
        }
        ops.push(op);
    }
    ops
}

/// Length a sequence ends at after replaying `ops` from empty.
pub fn final_len(ops: &[Op]) -> usize {
    ops.iter().fold(0, |len, op| match op {
        Op::Push(_) | Op::Insert(..) => len + 1,
        Op::Erase(_) | Op::Pop => len - 1,
    })
}

/// Replay `ops` against `seq`.
pub fn apply<R: Relocate<u64>>(seq: &mut Sequence<u64, R>, ops: &[Op]) {
    for &op in ops {
        match op {
            Op::Push(v) => seq.push_back(v),
            Op::Insert(i, v) => {
                let _ = seq.insert(seq.cursor_at(i), v);
            }
            Op::Erase(i) => {
                let _ = seq.erase(seq.cursor_at(i));
            }
            Op::Pop => seq.pop_back(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_positions_stay_in_range() {
        let positions = insert_positions(4, 100, 42);
        assert_eq!(positions.len(), 100);
        for (i, &pos) in positions.iter().enumerate() {
            assert!(pos <= 4 + i, "position {pos} out of range at step {i}");
        }
    }

    #[test]
    fn erase_positions_drain_exactly() {
        let positions = erase_positions(50, 7);
        let mut seq: Sequence<u64> = (0..50).collect();
        for pos in positions {
            let _ = seq.erase(seq.cursor_at(pos));
        }
        assert!(seq.is_empty());
    }

    #[test]
    fn workloads_are_deterministic() {
        assert_eq!(mixed_workload(200, 9), mixed_workload(200, 9));
        assert_eq!(insert_positions(0, 64, 3), insert_positions(0, 64, 3));
    }

    #[test]
    fn mixed_workload_matches_vec() {
        let ops = mixed_workload(500, 11);
        let mut seq: Sequence<u64> = Sequence::new();
        apply(&mut seq, &ops);

        let mut model: Vec<u64> = Vec::new();
        for &op in &ops {
            match op {
                Op::Push(v) => model.push(v),
                Op::Insert(i, v) => model.insert(i, v),
                Op::Erase(i) => {
                    model.remove(i);
                }
                Op::Pop => {
                    model.pop();
                }
            }
        }
        assert_eq!(seq.as_slice(), model.as_slice());
        assert_eq!(seq.len(), final_len(&ops));
    }
}
