//! Core trait definitions shared by the solvers and the sequence builder.
//!
//! The two DP realizations (memoized and iterative) implement [`ChainSolver`]
//! and hand back a table implementing [`DecisionTable`]. Reconstruction only
//! ever reads through [`DecisionTable`], so it is agnostic to which solver
//! produced the table.

use crate::chain::Chain;
use crate::error::Result;
use crate::table::{Cell, Decision};

/// Read-only access to solved `(m, a, b)` cells.
pub trait DecisionTable {
    /// The cell at `(m, a, b)`, or `None` if it was never computed.
    fn cell(&self, m: u64, a: usize, b: usize) -> Option<Cell>;

    /// Minimum time of the cell (`+inf` when infeasible).
    fn time(&self, m: u64, a: usize, b: usize) -> Option<f64> {
        self.cell(m, a, b).map(|c| c.time)
    }

    /// Winning decision of the cell; `None` when infeasible or uncomputed.
    fn decision(&self, m: u64, a: usize, b: usize) -> Option<Decision> {
        self.cell(m, a, b).and_then(|c| c.decision)
    }
}

/// A dynamic program filling the decision table of a chain for budget `mmax`.
///
/// Implementations must fill at least every cell reachable from the root
/// `(mmax, 0, L)` and must agree with each other on those cells.
pub trait ChainSolver {
    type Table: DecisionTable;

    /// Short identifier used in logs and reports.
    fn name(&self) -> &'static str;

    fn solve(&self, chain: &Chain, mmax: u64) -> Result<Self::Table>;
}
