//! Top-down realization: lazily expands the cells reachable from
//! `(mmax, 0, L)` and memoizes them in a [`MemoTable`].

use crate::chain::Chain;
use crate::error::Result;
use crate::solver::evaluate_cell;
use crate::table::MemoTable;
use crate::traits::{ChainSolver, DecisionTable};

/// Memoized recursive solver.
///
/// Recursion depth is bounded by `L + 1`: every recursive call narrows the
/// sub-chain by at least one block.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoizedSolver;

struct MemoContext<'c> {
    chain: &'c Chain,
    table: MemoTable,
}

impl MemoContext<'_> {
    fn solve_cell(&mut self, m: u64, a: usize, b: usize) -> Result<f64> {
        if let Some(cell) = self.table.cell(m, a, b) {
            return Ok(cell.time);
        }
        let chain = self.chain;
        let cell = evaluate_cell(chain, m, a, b, |m2, a2, b2| self.solve_cell(m2, a2, b2))?;
        self.table.insert(m, a, b, cell);
        Ok(cell.time)
    }
}

impl ChainSolver for MemoizedSolver {
    type Table = MemoTable;

    fn name(&self) -> &'static str {
        "memoized"
    }

    fn solve(&self, chain: &Chain, mmax: u64) -> Result<MemoTable> {
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!("solve_memoized", mmax, len = chain.len());
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let mut ctx = MemoContext {
            chain,
            table: MemoTable::new(),
        };
        let _root = ctx.solve_cell(mmax, 0, chain.len())?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            cells = ctx.table.evaluations(),
            root = _root,
            "memoized table filled"
        );
        Ok(ctx.table)
    }
}
