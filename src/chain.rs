//! The immutable problem instance handed to the solvers.
//!
//! A chain of length `L` has real blocks `0..L` and a synthetic loss block at
//! index `L`. Boundary `b` sits between block `b - 1` and block `b`; boundary
//! `0` is the chain input and boundary `L + 1` the loss output, so there are
//! `L + 2` checkpoint weights.

use crate::blocks::{Block, Solution};
use crate::builder::ChainBuilder;
use crate::error::{Result, ScheduleError};

/// A validated linear chain of blocks.
///
/// Construct it through [`Chain::builder`] or [`Chain::from_parts`]; both
/// reject malformed input before any solver sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    blocks: Vec<Block>,
    loss: Solution,
    checkpoint_weights: Vec<u64>,
}

impl Chain {
    /// Start building a chain whose input activation weighs `input_weight`.
    pub fn builder(input_weight: u64) -> ChainBuilder {
        ChainBuilder::new(input_weight)
    }

    /// Assemble a chain from its raw parts.
    ///
    /// `checkpoint_weights` must have `blocks.len() + 2` entries.
    pub fn from_parts(
        blocks: Vec<Block>,
        loss: Solution,
        checkpoint_weights: Vec<u64>,
    ) -> Result<Self> {
        let chain = Self {
            blocks,
            loss,
            checkpoint_weights,
        };
        chain.validate()?;
        Ok(chain)
    }

    fn validate(&self) -> Result<()> {
        let len = self.blocks.len();
        if self.checkpoint_weights.len() != len + 2 {
            return Err(ScheduleError::malformed(format!(
                "expected {} checkpoint weights for {} blocks, got {}",
                len + 2,
                len,
                self.checkpoint_weights.len()
            )));
        }
        for (i, block) in self.blocks.iter().enumerate() {
            if block.is_empty() {
                return Err(ScheduleError::malformed(format!(
                    "block {i} has no candidate solution"
                )));
            }
            check_time(block.fast_forward_time, || {
                format!("fast-forward time of block {i}")
            })?;
            for (k, sol) in block.solutions().iter().enumerate() {
                check_solution(sol, || format!("block {i} solution {k}"))?;
            }
        }
        check_solution(&self.loss, || "loss block".to_string())
    }

    /// Number of real blocks `L` (the loss block is not counted).
    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn loss(&self) -> &Solution {
        &self.loss
    }

    pub fn checkpoint_weights(&self) -> &[u64] {
        &self.checkpoint_weights
    }

    /// Memory of the activation at boundary `b` (`0..=L+1`).
    ///
    /// # Panics
    ///
    /// If `b > L + 1`; use [`Chain::checkpoint_weights`] for a checked lookup.
    #[inline]
    pub fn checkpoint_weight(&self, b: usize) -> u64 {
        self.checkpoint_weights[b]
    }

    /// Candidate solutions of block `i`; index `L` yields the loss block.
    #[inline]
    pub fn solutions(&self, i: usize) -> &[Solution] {
        if i == self.blocks.len() {
            std::slice::from_ref(&self.loss)
        } else {
            self.blocks[i].solutions()
        }
    }

    /// Solution `k` of block `i`, if it exists.
    pub fn solution(&self, i: usize, k: usize) -> Option<&Solution> {
        if i > self.blocks.len() {
            return None;
        }
        self.solutions(i).get(k)
    }

    /// `cbw[i+1][k]`: memory retained after checkpointing block `i` with
    /// solution `k`.
    #[inline]
    pub fn saved_memory(&self, i: usize, k: usize) -> u64 {
        self.solutions(i)[k].saved_memory
    }

    /// Replay time of real block `i`.
    #[inline]
    pub fn fast_forward_time(&self, i: usize) -> f64 {
        self.blocks[i].fast_forward_time
    }

    /// Replay overhead of real block `i`.
    #[inline]
    pub fn fast_forward_overhead(&self, i: usize) -> u64 {
        self.blocks[i].fast_forward_overhead
    }

    /// Total replay time through blocks `[a, j)`, summed left to right.
    pub fn replay_time(&self, a: usize, j: usize) -> f64 {
        self.blocks[a..j]
            .iter()
            .map(|b| b.fast_forward_time)
            .fold(0.0, |acc, t| acc + t)
    }

    /// Memory high-water mark for checkpointing block `i` with solution `k`:
    /// the larger of its forward and backward footprints.
    pub fn checkpoint_limit(&self, i: usize, k: usize) -> u64 {
        let sol = &self.solutions(i)[k];
        let out = self.checkpoint_weights[i + 1];
        let mem_f = out + sol.saved_memory + sol.forward_overhead;
        let mem_b = self.checkpoint_weights[i] + out + sol.saved_memory + sol.backward_overhead;
        mem_f.max(mem_b)
    }
}

fn check_time<F: FnOnce() -> String>(value: f64, what: F) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ScheduleError::malformed(format!(
            "{} must be finite and non-negative, got {value}",
            what()
        )))
    }
}

fn check_solution<F: Fn() -> String>(sol: &Solution, what: F) -> Result<()> {
    check_time(sol.forward_time, || format!("forward time of {}", what()))?;
    check_time(sol.backward_time, || format!("backward time of {}", what()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_block() -> Block {
        Block::new(vec![Solution::new(1.0, 1.0).with_saved_memory(1)], 0.5, 0)
    }

    #[test]
    fn loss_block_sits_at_index_len() {
        let chain = Chain::from_parts(vec![unit_block(), unit_block()], Solution::zero(), vec![
            0, 1, 1, 0,
        ])
        .unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.solutions(2).len(), 1);
        assert_eq!(chain.solutions(2)[0], Solution::zero());
        assert!(chain.solution(3, 0).is_none());
    }

    #[test]
    fn rejects_wrong_weight_count() {
        let err = Chain::from_parts(vec![unit_block()], Solution::zero(), vec![0, 1]).unwrap_err();
        assert!(matches!(err, ScheduleError::MalformedChain(_)));
    }

    #[test]
    fn rejects_block_without_solutions() {
        let err = Chain::from_parts(
            vec![Block::new(Vec::new(), 1.0, 0)],
            Solution::zero(),
            vec![0, 1, 0],
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::MalformedChain(_)));
    }

    #[test]
    fn rejects_negative_and_nan_times() {
        let negative = Block::new(vec![Solution::new(-1.0, 1.0)], 0.0, 0);
        assert!(Chain::from_parts(vec![negative], Solution::zero(), vec![0, 1, 0]).is_err());
        let nan = Block::new(vec![Solution::new(1.0, 1.0)], f64::NAN, 0);
        assert!(Chain::from_parts(vec![nan], Solution::zero(), vec![0, 1, 0]).is_err());
        let bad_loss = Solution::new(f64::INFINITY, 0.0);
        assert!(Chain::from_parts(vec![unit_block()], bad_loss, vec![0, 1, 0]).is_err());
    }

    #[test]
    fn checkpoint_limit_takes_backward_peak() {
        let sol = Solution::new(1.0, 1.0)
            .with_saved_memory(2)
            .with_overheads(1, 3);
        let chain =
            Chain::from_parts(vec![Block::new(vec![sol], 0.0, 0)], Solution::zero(), vec![4, 1, 0])
                .unwrap();
        // forward: 1 + 2 + 1 = 4, backward: 4 + 1 + 2 + 3 = 10
        assert_eq!(chain.checkpoint_limit(0, 0), 10);
    }

    #[test]
    #[should_panic]
    fn checkpoint_weight_past_the_loss_output_panics() {
        let chain =
            Chain::from_parts(vec![unit_block()], Solution::zero(), vec![0, 1, 0]).unwrap();
        assert_eq!(chain.checkpoint_weights().get(3), None);
        chain.checkpoint_weight(3);
    }

    #[test]
    fn replay_time_sums_prefix() {
        let chain = Chain::from_parts(
            vec![unit_block(), unit_block(), unit_block()],
            Solution::zero(),
            vec![0, 1, 1, 1, 0],
        )
        .unwrap();
        assert_eq!(chain.replay_time(0, 0), 0.0);
        assert_eq!(chain.replay_time(0, 2), 1.0);
        assert_eq!(chain.replay_time(1, 3), 1.0);
    }
}
