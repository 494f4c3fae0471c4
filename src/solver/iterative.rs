//! Bottom-up realization: fills every `(m, a, b)` cell by increasing width.
//!
//! A cell of width `d = b - a` only reads cells of strictly smaller width, so
//! with the `parallel` feature the whole `(m, a)` plane of one width is
//! computed concurrently.

use crate::chain::Chain;
use crate::error::{Result, ScheduleError};
use crate::solver::{base_case, evaluate_cell};
use crate::table::DenseTable;
use crate::traits::{ChainSolver, DecisionTable};

/// Iterative dense solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct IterativeSolver;

fn lookup(table: &DenseTable, m: u64, a: usize, b: usize) -> Result<f64> {
    table.time(m, a, b).ok_or_else(|| {
        ScheduleError::invariant(format!("cell ({m}, {a}, {b}) read before it was computed"))
    })
}

impl ChainSolver for IterativeSolver {
    type Table = DenseTable;

    fn name(&self) -> &'static str {
        "iterative"
    }

    fn solve(&self, chain: &Chain, mmax: u64) -> Result<DenseTable> {
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!("solve_iterative", mmax, len = chain.len());
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let mut table = DenseTable::new(mmax, chain.len())?;
        fill(chain, mmax, &mut table)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            cells = table.filled(),
            root = ?table.time(mmax, 0, chain.len()),
            "dense table filled"
        );
        Ok(table)
    }
}

#[cfg(not(feature = "parallel"))]
fn fill(chain: &Chain, mmax: u64, table: &mut DenseTable) -> Result<()> {
    let len = chain.len();
    for m in 0..=mmax {
        for i in 0..=len {
            table.insert(m, i, i, base_case(chain, m, i));
        }
    }
    for m in 0..=mmax {
        for d in 1..=len {
            for a in 0..=len - d {
                let b = a + d;
                let cell = evaluate_cell(chain, m, a, b, |m2, a2, b2| lookup(table, m2, a2, b2))?;
                table.insert(m, a, b, cell);
            }
        }
    }
    Ok(())
}

#[cfg(feature = "parallel")]
fn fill(chain: &Chain, mmax: u64, table: &mut DenseTable) -> Result<()> {
    use rayon::prelude::*;

    let len = chain.len();
    for d in 0..=len {
        #[cfg(feature = "tracing")]
        let span = tracing::trace_span!("fill_width", width = d);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let keys: Vec<(u64, usize)> = (0..=mmax)
            .flat_map(|m| (0..=len - d).map(move |a| (m, a)))
            .collect();
        let view: &DenseTable = table;
        let cells = keys
            .par_iter()
            .map(|&(m, a)| {
                let cell = if d == 0 {
                    base_case(chain, m, a)
                } else {
                    evaluate_cell(chain, m, a, a + d, |m2, a2, b2| lookup(view, m2, a2, b2))?
                };
                Ok((m, a, cell))
            })
            .collect::<Result<Vec<_>>>()?;
        for (m, a, cell) in cells {
            table.insert(m, a, a + d, cell);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{Block, Solution};

    fn uniform_chain(len: usize) -> Chain {
        let sol = Solution::new(2.0, 3.0).with_saved_memory(1);
        let mut builder = Chain::builder(0);
        for _ in 0..len {
            builder = builder.block(Block::new(vec![sol], 1.0, 0), 1);
        }
        builder.build().unwrap()
    }

    #[test]
    fn fills_every_upper_triangle_cell() {
        let chain = uniform_chain(4);
        let table = IterativeSolver.solve(&chain, 6).unwrap();
        assert_eq!(table.filled(), 7 * (5 * 6 / 2));
    }

    #[test]
    fn zero_length_chain_is_only_the_loss() {
        let chain = Chain::builder(2).loss(Solution::new(1.0, 0.5), 1).build().unwrap();
        let table = IterativeSolver.solve(&chain, 3).unwrap();
        // loss limit: cw[0] + cw[1] = 3
        assert_eq!(table.time(2, 0, 0), Some(f64::INFINITY));
        assert_eq!(table.time(3, 0, 0), Some(1.5));
    }

    #[test]
    fn huge_budget_is_an_error_not_a_panic() {
        let chain = uniform_chain(1);
        let err = IterativeSolver.solve(&chain, u64::MAX).unwrap_err();
        assert_eq!(err, ScheduleError::TableTooLarge { mmax: u64::MAX, len: 1 });
    }

    #[test]
    fn values_never_increase_with_budget() {
        let chain = uniform_chain(5);
        let table = IterativeSolver.solve(&chain, 12).unwrap();
        for a in 0..=5 {
            for b in a..=5 {
                for m in 1..=12 {
                    let prev = table.time(m - 1, a, b).unwrap();
                    let cur = table.time(m, a, b).unwrap();
                    assert!(cur <= prev, "({m}, {a}, {b}): {cur} > {prev}");
                }
            }
        }
    }
}
