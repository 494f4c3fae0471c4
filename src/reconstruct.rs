//! Sequence reconstruction.
//!
//! Walks the decision table from `(mmax, 0, L)` and mirrors the branch each
//! cell took. Nested sub-sequences are appended to one output buffer in the
//! order they are produced, which is the only valid execution order.

use crate::chain::Chain;
use crate::error::{Result, ScheduleError};
use crate::sequence::{Operation, Sequence};
use crate::table::Decision;
use crate::traits::DecisionTable;

/// Build the full sequence for budget `mmax`.
pub fn build_sequence<T: DecisionTable + ?Sized>(
    chain: &Chain,
    table: &T,
    mmax: u64,
) -> Result<Sequence> {
    #[cfg(feature = "tracing")]
    let span = tracing::info_span!("reconstruct", mmax, len = chain.len());
    #[cfg(feature = "tracing")]
    let _enter = span.enter();

    let mut ops = Vec::new();
    build_interval(chain, table, 0, chain.len(), mmax, &mut ops)?;
    Ok(Sequence::from_ops(ops))
}

/// Append the operations of sub-chain `[lmin, lmax]` under budget `cmem`.
///
/// A budget of zero is valid (zero-weight chains fit in it); only a budget
/// that would go below zero is an [`ScheduleError::InvariantViolation`].
pub fn build_interval<T: DecisionTable + ?Sized>(
    chain: &Chain,
    table: &T,
    lmin: usize,
    lmax: usize,
    cmem: u64,
    out: &mut Vec<Operation>,
) -> Result<()> {
    if lmin > lmax {
        return Ok(());
    }

    #[cfg(feature = "tracing")]
    let span = tracing::trace_span!("reconstruct_interval", lmin, lmax, cmem);
    #[cfg(feature = "tracing")]
    let _enter = span.enter();

    let cell = table.cell(cmem, lmin, lmax).ok_or_else(|| {
        ScheduleError::invariant(format!(
            "cell ({cmem}, {lmin}, {lmax}) was never computed"
        ))
    })?;
    if !cell.is_feasible() {
        return Err(ScheduleError::InfeasibleBudget {
            lmin,
            lmax,
            budget: cmem,
        });
    }

    if lmin == chain.len() {
        out.push(Operation::LossMarker);
        return Ok(());
    }

    match cell.decision {
        Some(Decision::CheckpointNow { solution }) => {
            let saved = chain
                .solution(lmin, solution)
                .ok_or_else(|| {
                    ScheduleError::invariant(format!(
                        "block {lmin} has no solution {solution}"
                    ))
                })?
                .saved_memory;
            let rest = shrink(cmem, saved, lmin)?;
            out.push(Operation::ForwardCheckpoint {
                block: lmin,
                solution,
            });
            build_interval(chain, table, lmin + 1, lmax, rest, out)?;
            out.push(Operation::Backward {
                block: lmin,
                solution,
            });
        }
        Some(Decision::CheckpointLater { split }) => {
            if split <= lmin || split > lmax {
                return Err(ScheduleError::invariant(format!(
                    "split {split} outside ({lmin}, {lmax}]"
                )));
            }
            let rest = shrink(cmem, chain.checkpoint_weight(split), lmin)?;
            out.push(Operation::ForwardRecomputeOnly { block: lmin });
            out.extend((lmin + 1..split).map(|block| Operation::ForwardReplay { block }));
            build_interval(chain, table, split, lmax, rest, out)?;
            build_interval(chain, table, lmin, split - 1, cmem, out)?;
        }
        None => {
            return Err(ScheduleError::invariant(format!(
                "feasible cell ({cmem}, {lmin}, {lmax}) has no decision"
            )));
        }
    }
    Ok(())
}

fn shrink(cmem: u64, by: u64, lmin: usize) -> Result<u64> {
    cmem.checked_sub(by).ok_or_else(|| {
        ScheduleError::invariant(format!(
            "budget {cmem} cannot hold {by} at block {lmin}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{Block, Solution};
    use crate::solver::{IterativeSolver, MemoizedSolver};
    use crate::table::{Cell, MemoTable};
    use crate::traits::ChainSolver;

    fn uniform_chain(len: usize) -> Chain {
        let sol = Solution::new(2.0, 3.0).with_saved_memory(1);
        let mut builder = Chain::builder(0);
        for _ in 0..len {
            builder = builder.block(Block::new(vec![sol], 1.0, 0), 1);
        }
        builder.build().unwrap()
    }

    #[test]
    fn store_all_sequence_nests_backwards() {
        let chain = uniform_chain(2);
        let table = MemoizedSolver.solve(&chain, 50).unwrap();
        let seq = build_sequence(&chain, &table, 50).unwrap();
        assert_eq!(seq.to_string(), "Fe0/0 Fe1/0 Loss B1/0 B0/0");
    }

    #[test]
    fn empty_interval_emits_nothing() {
        let chain = uniform_chain(2);
        let table = MemoTable::new();
        let mut out = Vec::new();
        build_interval(&chain, &table, 2, 1, 5, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn missing_cell_is_an_invariant_violation() {
        let chain = uniform_chain(2);
        let table = MemoTable::new();
        let err = build_sequence(&chain, &table, 5).unwrap_err();
        assert!(matches!(err, ScheduleError::InvariantViolation(_)));
    }

    #[test]
    fn infeasible_root_reports_interval() {
        let chain = uniform_chain(3);
        let table = IterativeSolver.solve(&chain, 1).unwrap();
        let err = build_sequence(&chain, &table, 1).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::InfeasibleBudget {
                lmin: 0,
                lmax: 3,
                budget: 1
            }
        );
    }

    #[test]
    fn bad_solution_index_is_rejected() {
        let chain = uniform_chain(1);
        let mut table = MemoTable::new();
        table.insert(4, 0, 1, Cell::feasible(1.0, Decision::CheckpointNow { solution: 3 }));
        let err = build_sequence(&chain, &table, 4).unwrap_err();
        assert!(matches!(err, ScheduleError::InvariantViolation(_)));
    }

    #[test]
    fn budget_underflow_is_rejected() {
        let chain = uniform_chain(1);
        let mut table = MemoTable::new();
        table.insert(0, 0, 1, Cell::feasible(1.0, Decision::CheckpointLater { split: 1 }));
        let err = build_sequence(&chain, &table, 0).unwrap_err();
        assert!(matches!(err, ScheduleError::InvariantViolation(_)));
    }
}
