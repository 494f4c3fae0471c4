//! The checkpointing dynamic program.
//!
//! For a budget `m` and a sub-chain `[a, b]` the recurrence picks the cheaper
//! of two strategies:
//! - *checkpoint later*: replay blocks `[a, j)` without gradients, keep the
//!   activation at boundary `j`, solve `[j, b]` under `m - cw[j]`, then solve
//!   `[a, j - 1]` again under `m`;
//! - *checkpoint now*: run block `a` with some solution `k`, keep its saved
//!   memory, and solve `[a + 1, b]` under `m - cbw[a+1][k]`.
//!
//! Both realizations in this module ([`MemoizedSolver`] and
//! [`IterativeSolver`]) evaluate cells through [`evaluate_cell`], so they
//! perform the same floating-point operations in the same order and agree
//! bit for bit.
//!
//! Ties are broken deterministically: the first `j` (resp. `k`) reaching the
//! minimum wins inside a strategy, and *checkpoint later*, which is evaluated
//! first, wins unless *checkpoint now* is strictly cheaper.

pub mod iterative;
pub mod memo;

pub use iterative::IterativeSolver;
pub use memo::MemoizedSolver;

use crate::chain::Chain;
use crate::error::Result;
use crate::table::{Cell, Decision, DenseTable, MemoTable};
use crate::traits::{ChainSolver, DecisionTable};

/// Which DP realization to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverKind {
    /// Top-down, expands only cells reachable from the root.
    #[default]
    Memoized,
    /// Bottom-up over every budget and sub-chain.
    Iterative,
}

impl SolverKind {
    pub fn name(self) -> &'static str {
        match self {
            SolverKind::Memoized => MemoizedSolver.name(),
            SolverKind::Iterative => IterativeSolver.name(),
        }
    }

    pub fn solve(self, chain: &Chain, mmax: u64) -> Result<SolvedTable> {
        match self {
            SolverKind::Memoized => MemoizedSolver.solve(chain, mmax).map(SolvedTable::Memo),
            SolverKind::Iterative => IterativeSolver.solve(chain, mmax).map(SolvedTable::Dense),
        }
    }
}

/// Table produced by either solver.
#[derive(Debug, Clone)]
pub enum SolvedTable {
    Memo(MemoTable),
    Dense(DenseTable),
}

impl DecisionTable for SolvedTable {
    fn cell(&self, m: u64, a: usize, b: usize) -> Option<Cell> {
        match self {
            SolvedTable::Memo(t) => t.cell(m, a, b),
            SolvedTable::Dense(t) => t.cell(m, a, b),
        }
    }
}

/// Single-block cell `[i, i]`: the cheapest solution whose forward and
/// backward footprints both fit in `m`.
pub fn base_case(chain: &Chain, m: u64, i: usize) -> Cell {
    let mut best: Option<(usize, f64)> = None;
    for (k, sol) in chain.solutions(i).iter().enumerate() {
        if m < chain.checkpoint_limit(i, k) {
            continue;
        }
        let time = sol.forward_time + sol.backward_time;
        if best.map_or(true, |(_, t)| time < t) {
            best = Some((k, time));
        }
    }
    match best {
        Some((k, time)) => Cell::feasible(time, Decision::CheckpointNow { solution: k }),
        None => Cell::INFEASIBLE,
    }
}

/// Lower bound on the budget of any schedule for `[a, b]`, `a < b`.
pub fn memory_floor(chain: &Chain, a: usize, b: usize) -> u64 {
    debug_assert!(a < b);
    let cw = |x: usize| chain.checkpoint_weight(x);
    let tail = cw(b + 1);
    let mut mmin = tail + cw(a + 1) + chain.fast_forward_overhead(a);
    if b > a + 1 {
        let inner = (a + 1..b)
            .map(|j| cw(j) + cw(j + 1) + chain.fast_forward_overhead(j))
            .max()
            .unwrap_or(0);
        mmin = mmin.max(tail + inner);
    }
    mmin
}

/// Evaluate cell `(m, a, b)`.
///
/// `sub(m', a', b')` must return the time of a strictly narrower cell; the
/// memoized solver recurses through it, the iterative solver reads its table.
pub fn evaluate_cell<F>(chain: &Chain, m: u64, a: usize, b: usize, mut sub: F) -> Result<Cell>
where
    F: FnMut(u64, usize, usize) -> Result<f64>,
{
    if a == b {
        return Ok(base_case(chain, m, a));
    }
    if m < memory_floor(chain, a, b) {
        return Ok(Cell::INFEASIBLE);
    }

    let mut best_later: Option<(usize, f64)> = None;
    for j in a + 1..=b {
        let kept = chain.checkpoint_weight(j);
        if m < kept {
            continue;
        }
        let time = chain.replay_time(a, j) + sub(m - kept, j, b)? + sub(m, a, j - 1)?;
        if best_later.map_or(true, |(_, t)| time < t) {
            best_later = Some((j, time));
        }
    }

    let mut best_now: Option<(usize, f64)> = None;
    for (k, sol) in chain.solutions(a).iter().enumerate() {
        if m < chain.checkpoint_limit(a, k) {
            continue;
        }
        let mut time = sol.forward_time + sol.backward_time;
        time += sub(m - sol.saved_memory, a + 1, b)?;
        if best_now.map_or(true, |(_, t)| time < t) {
            best_now = Some((k, time));
        }
    }

    let cell = match (best_later, best_now) {
        (None, None) => Cell::INFEASIBLE,
        (Some((j, t_later)), Some((k, t_now))) => {
            if t_now < t_later {
                Cell::feasible(t_now, Decision::CheckpointNow { solution: k })
            } else {
                Cell::feasible(t_later, Decision::CheckpointLater { split: j })
            }
        }
        (None, Some((k, t))) => Cell::feasible(t, Decision::CheckpointNow { solution: k }),
        (Some((j, t)), None) => Cell::feasible(t, Decision::CheckpointLater { split: j }),
    };
    if cell.is_feasible() {
        Ok(cell)
    } else {
        Ok(Cell::INFEASIBLE)
    }
}
