//! Scheduling driver.
//!
//! [`Scheduler`] owns a chain and answers budget queries:
//! 1. convert the memory limit into the DP budget `mmax` (the chain input is
//!    resident outside it),
//! 2. solve the decision table with the configured solver,
//! 3. reconstruct the operation sequence from the root cell.
//!
//! All solver state lives inside one call; the optional table cache is owned
//! by the scheduler instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::builder::SchedulerBuilder;
use crate::chain::Chain;
use crate::error::{Result, ScheduleError};
use crate::reconstruct::build_sequence;
use crate::sequence::Sequence;
use crate::solver::{SolvedTable, SolverKind};
use crate::traits::DecisionTable;

/// Solve `chain` for a total memory limit and return the operation sequence.
///
/// Equivalent to `Scheduler::new(chain.clone()).solve(memory_limit)` without
/// cloning the chain.
///
/// ```
/// use remat_dp::{solve, Block, Chain, Operation, Solution};
///
/// let layer = Block::new(vec![Solution::new(2.0, 3.0).with_saved_memory(1)], 1.0, 0);
/// let chain = Chain::builder(0).block(layer, 1).build().unwrap();
/// let seq = solve(&chain, 10).unwrap();
/// assert_eq!(seq.operations()[0], Operation::ForwardCheckpoint { block: 0, solution: 0 });
/// assert!(solve(&chain, 0).unwrap_err().is_infeasible());
/// ```
pub fn solve(chain: &Chain, memory_limit: u64) -> Result<Sequence> {
    solve_with(chain, memory_limit, SolverKind::default()).map(|s| s.sequence)
}

fn solve_with(chain: &Chain, memory_limit: u64, kind: SolverKind) -> Result<Schedule> {
    let mmax = dp_budget(chain, memory_limit)?;
    let table = kind.solve(chain, mmax)?;
    schedule_from_table(chain, &table, mmax)
}

fn dp_budget(chain: &Chain, memory_limit: u64) -> Result<u64> {
    memory_limit
        .checked_sub(chain.checkpoint_weight(0))
        .ok_or(ScheduleError::InfeasibleBudget {
            lmin: 0,
            lmax: chain.len(),
            budget: memory_limit,
        })
}

fn schedule_from_table(chain: &Chain, table: &SolvedTable, mmax: u64) -> Result<Schedule> {
    let len = chain.len();
    let root = table.time(mmax, 0, len).ok_or_else(|| {
        ScheduleError::invariant(format!("root cell ({mmax}, 0, {len}) was never computed"))
    })?;
    if !root.is_finite() {
        return Err(ScheduleError::InfeasibleBudget {
            lmin: 0,
            lmax: len,
            budget: mmax,
        });
    }
    let sequence = build_sequence(chain, table, mmax)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        mmax,
        expected_time = root,
        operations = sequence.len(),
        "schedule reconstructed"
    );

    Ok(Schedule {
        sequence,
        expected_time: root,
        budget: mmax,
    })
}

/// A solved query.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub sequence: Sequence,
    /// Optimal time recorded in the root cell.
    pub expected_time: f64,
    /// DP budget `mmax` the schedule was solved for.
    pub budget: u64,
}

/// Answers memory-budget queries for one chain.
pub struct Scheduler {
    chain: Chain,
    solver: SolverKind,
    cache: Option<Mutex<HashMap<u64, Arc<SolvedTable>>>>,
}

impl Scheduler {
    /// Scheduler with the default (memoized) solver and no table cache.
    pub fn new(chain: Chain) -> Self {
        Self::with_options(chain, SolverKind::default(), false)
    }

    pub fn builder(chain: Chain) -> SchedulerBuilder {
        SchedulerBuilder::new(chain)
    }

    pub(crate) fn with_options(chain: Chain, solver: SolverKind, cache_tables: bool) -> Self {
        Self {
            chain,
            solver,
            cache: cache_tables.then(|| Mutex::new(HashMap::new())),
        }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn solver_kind(&self) -> SolverKind {
        self.solver
    }

    pub fn caches_tables(&self) -> bool {
        self.cache.is_some()
    }

    /// Solve for a total memory limit, in the chain's memory unit.
    pub fn solve(&self, memory_limit: u64) -> Result<Schedule> {
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!(
            "schedule",
            memory_limit,
            len = self.chain.len(),
            solver = self.solver.name()
        );
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let mmax = dp_budget(&self.chain, memory_limit)?;
        let table = self.table_for(mmax)?;
        schedule_from_table(&self.chain, &table, mmax)
    }

    /// Decision table for DP budget `mmax`, from the cache when enabled.
    pub fn table_for(&self, mmax: u64) -> Result<Arc<SolvedTable>> {
        let Some(cache) = &self.cache else {
            return self.solver.solve(&self.chain, mmax).map(Arc::new);
        };
        if let Some(hit) = lock(cache)?.get(&mmax) {
            return Ok(Arc::clone(hit));
        }
        let table = Arc::new(self.solver.solve(&self.chain, mmax)?);
        lock(cache)?.insert(mmax, Arc::clone(&table));
        Ok(table)
    }

    /// Solve several limits; results keep the order of `limits`.
    ///
    /// With the `parallel` feature the queries run concurrently over the
    /// shared chain.
    pub fn solve_many(&self, limits: &[u64]) -> Vec<Result<Schedule>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            limits.par_iter().map(|&limit| self.solve(limit)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            limits.iter().map(|&limit| self.solve(limit)).collect()
        }
    }

    /// Smallest memory limit in `[low, high]` with a feasible schedule.
    ///
    /// Relies on feasibility being monotone in the budget.
    pub fn min_feasible_limit(&self, low: u64, high: u64) -> Result<Option<u64>> {
        if low > high || !self.is_feasible(high)? {
            return Ok(None);
        }
        let (mut lo, mut hi) = (low, high);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.is_feasible(mid)? {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        Ok(Some(lo))
    }

    fn is_feasible(&self, limit: u64) -> Result<bool> {
        let mmax = match dp_budget(&self.chain, limit) {
            Ok(m) => m,
            Err(_) => return Ok(false),
        };
        let table = self.table_for(mmax)?;
        Ok(table
            .time(mmax, 0, self.chain.len())
            .is_some_and(|t| t.is_finite()))
    }
}

fn lock<T>(m: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>> {
    m.lock()
        .map_err(|_| ScheduleError::invariant("table cache lock poisoned"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{Block, Solution};

    fn three_blocks() -> Chain {
        let sol = Solution::new(2.0, 3.0).with_saved_memory(1);
        let mut builder = Chain::builder(0);
        for _ in 0..3 {
            builder = builder.block(Block::new(vec![sol], 1.0, 0), 1);
        }
        builder.build().unwrap()
    }

    #[test]
    fn expected_time_matches_sequence_cost() {
        let scheduler = Scheduler::new(three_blocks());
        let schedule = scheduler.solve(4).unwrap();
        assert_eq!(schedule.expected_time, 17.0);
        assert_eq!(schedule.sequence.compute_time(scheduler.chain()), 17.0);
    }

    #[test]
    fn input_weight_is_taken_out_of_the_budget() {
        let sol = Solution::new(1.0, 1.0).with_saved_memory(1);
        let chain = Chain::builder(5)
            .block(Block::new(vec![sol], 1.0, 0), 1)
            .build()
            .unwrap();
        let scheduler = Scheduler::new(chain);
        assert!(scheduler.solve(4).unwrap_err().is_infeasible());
        let schedule = scheduler.solve(5 + 7).unwrap();
        assert_eq!(schedule.budget, 7);
    }

    #[test]
    fn cache_returns_the_same_table() {
        let scheduler = Scheduler::builder(three_blocks())
            .solver(SolverKind::Iterative)
            .cache_tables(true)
            .build();
        let a = scheduler.table_for(6).unwrap();
        let b = scheduler.table_for(6).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn min_feasible_limit_finds_threshold() {
        let scheduler = Scheduler::builder(three_blocks()).cache_tables(true).build();
        assert_eq!(scheduler.min_feasible_limit(0, 20).unwrap(), Some(4));
        assert_eq!(scheduler.min_feasible_limit(0, 3).unwrap(), None);
    }

    #[test]
    fn solve_many_preserves_order() {
        let scheduler = Scheduler::new(three_blocks());
        let results = scheduler.solve_many(&[3, 4, 5]);
        assert!(results[0].as_ref().unwrap_err().is_infeasible());
        assert_eq!(results[1].as_ref().unwrap().expected_time, 17.0);
        assert_eq!(results[2].as_ref().unwrap().expected_time, 15.0);
    }
}
