//! Error taxonomy for scheduling.
//!
//! [`ScheduleError::InfeasibleBudget`] is an ordinary outcome: callers probing
//! several budgets should match on it (or use [`ScheduleError::is_infeasible`])
//! and retry with a larger limit. The other variants indicate either a broken
//! input or a logic bug and are never recovered from inside the crate.

use thiserror::Error;

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, ScheduleError>;

/// Errors produced while solving or reconstructing a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// No arrangement of the sub-chain `[lmin, lmax]` fits in `budget`.
    #[error("cannot process the chain from index {lmin} to {lmax} with memory {budget}")]
    InfeasibleBudget {
        lmin: usize,
        lmax: usize,
        budget: u64,
    },

    /// An internal contract was broken (uncomputed cell, budget underflow,
    /// mismatched solution index).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The input chain does not satisfy the model's preconditions.
    #[error("malformed chain: {0}")]
    MalformedChain(String),

    /// The dense table for this budget and chain length cannot be allocated.
    #[error("a dense table for budget {mmax} and {len} blocks does not fit in memory")]
    TableTooLarge { mmax: u64, len: usize },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl ScheduleError {
    /// True for [`ScheduleError::InfeasibleBudget`].
    pub fn is_infeasible(&self) -> bool {
        matches!(self, ScheduleError::InfeasibleBudget { .. })
    }

    pub(crate) fn invariant<S: Into<String>>(msg: S) -> Self {
        ScheduleError::InvariantViolation(msg.into())
    }

    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Self {
        ScheduleError::MalformedChain(msg.into())
    }
}
