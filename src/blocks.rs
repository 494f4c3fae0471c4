//! Block-level data structures of a chain.
//!
//! A [`Block`] is one unit of the chain (typically one layer). It owns a set
//! of interchangeable [`Solution`]s, each with its own time/memory trade-off,
//! plus the cost of a gradient-free replay through the block.

/// One candidate implementation of a block.
///
/// Memory quantities are expressed in the chain's memory unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Time of the gradient-tracking forward pass.
    pub forward_time: f64,
    /// Time of the backward pass.
    pub backward_time: f64,
    /// Transient memory used while the forward pass runs.
    pub forward_overhead: u64,
    /// Transient memory used while the backward pass runs.
    pub backward_overhead: u64,
    /// Memory retained at the following boundary for the backward pass
    /// when this solution is checkpointed (`cbw[i+1][k]`).
    pub saved_memory: u64,
}

impl Solution {
    /// A solution with the given times and no memory cost.
    pub fn new(forward_time: f64, backward_time: f64) -> Self {
        Self {
            forward_time,
            backward_time,
            forward_overhead: 0,
            backward_overhead: 0,
            saved_memory: 0,
        }
    }

    /// Zero-cost solution, used as the default loss block.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn with_saved_memory(mut self, saved_memory: u64) -> Self {
        self.saved_memory = saved_memory;
        self
    }

    pub fn with_overheads(mut self, forward_overhead: u64, backward_overhead: u64) -> Self {
        self.forward_overhead = forward_overhead;
        self.backward_overhead = backward_overhead;
        self
    }

    /// Forward plus backward time.
    #[inline]
    pub fn total_time(&self) -> f64 {
        self.forward_time + self.backward_time
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::zero()
    }
}

/// A block of the chain with its candidate solutions and replay costs.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    solutions: Vec<Solution>,
    /// Time of a no-grad replay forward through this block.
    pub fast_forward_time: f64,
    /// Transient memory of the no-grad replay.
    pub fast_forward_overhead: u64,
}

impl Block {
    pub fn new(solutions: Vec<Solution>, fast_forward_time: f64, fast_forward_overhead: u64) -> Self {
        Self {
            solutions,
            fast_forward_time,
            fast_forward_overhead,
        }
    }

    /// A block whose replay is free, e.g. a block producing only metadata
    /// or views of its input.
    pub fn with_free_replay(solutions: Vec<Solution>) -> Self {
        Self::new(solutions, 0.0, 0)
    }

    #[inline]
    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    #[inline]
    pub fn num_solutions(&self) -> usize {
        self.solutions.len()
    }

    /// Returns true if the block has no candidate solution.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }
}
