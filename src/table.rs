//! DP and decision tables.
//!
//! Every entry is keyed by `(m, a, b)`: a memory budget and a sub-chain
//! `[a, b]` with `a <= b <= L`. A [`Cell`] stores the minimum time (or `+inf`)
//! together with the decision that achieved it.

use std::collections::HashMap;

use crate::error::{Result, ScheduleError};
use crate::traits::DecisionTable;

/// Which recurrence branch won a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Checkpoint block `a` now with the given solution index.
    CheckpointNow { solution: usize },
    /// Replay up to block `split - 1` and checkpoint boundary `split`.
    CheckpointLater { split: usize },
}

/// One table entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub time: f64,
    pub decision: Option<Decision>,
}

impl Cell {
    pub const INFEASIBLE: Cell = Cell {
        time: f64::INFINITY,
        decision: None,
    };

    pub fn feasible(time: f64, decision: Decision) -> Self {
        Self {
            time,
            decision: Some(decision),
        }
    }

    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.time.is_finite()
    }

    /// Bitwise equality, so that two `+inf` cells compare equal and `-0.0`
    /// differs from `0.0`.
    pub fn same_bits(&self, other: &Cell) -> bool {
        self.time.to_bits() == other.time.to_bits() && self.decision == other.decision
    }
}

/// Dense table for the iterative solver: every `m in 0..=mmax` and every
/// `0 <= a <= b <= L`.
#[derive(Debug, Clone)]
pub struct DenseTable {
    mmax: u64,
    width: usize,
    cells: Vec<Option<Cell>>,
}

impl DenseTable {
    /// Empty table for chains of length `len` (so `len + 1` block indices).
    ///
    /// Fails with [`ScheduleError::TableTooLarge`] when `(mmax + 1) * (len + 1)^2`
    /// cells do not fit in addressable memory.
    pub fn new(mmax: u64, len: usize) -> Result<Self> {
        let too_large = || ScheduleError::TableTooLarge { mmax, len };
        let width = len.checked_add(1).ok_or_else(too_large)?;
        let planes = usize::try_from(mmax)
            .ok()
            .and_then(|m| m.checked_add(1))
            .ok_or_else(too_large)?;
        let count = planes
            .checked_mul(width)
            .and_then(|n| n.checked_mul(width))
            .ok_or_else(too_large)?;
        let bytes = count
            .checked_mul(std::mem::size_of::<Option<Cell>>())
            .ok_or_else(too_large)?;
        if bytes > isize::MAX as usize {
            return Err(too_large());
        }
        Ok(Self {
            mmax,
            width,
            cells: vec![None; count],
        })
    }

    #[inline]
    fn index(&self, m: u64, a: usize, b: usize) -> Option<usize> {
        if m > self.mmax || a > b || b >= self.width {
            return None;
        }
        Some((m as usize * self.width + a) * self.width + b)
    }

    pub fn mmax(&self) -> u64 {
        self.mmax
    }

    /// Store `cell` at `(m, a, b)`. Out-of-range keys are ignored.
    pub fn insert(&mut self, m: u64, a: usize, b: usize, cell: Cell) {
        if let Some(idx) = self.index(m, a, b) {
            self.cells[idx] = Some(cell);
        }
    }

    /// Number of filled cells.
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

impl DecisionTable for DenseTable {
    fn cell(&self, m: u64, a: usize, b: usize) -> Option<Cell> {
        self.index(m, a, b).and_then(|idx| self.cells[idx])
    }
}

/// Sparse table for the memoized solver: only cells reachable from the root.
#[derive(Debug, Clone, Default)]
pub struct MemoTable {
    cells: HashMap<(u64, usize, usize), Cell>,
    evaluations: usize,
}

impl MemoTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, m: u64, a: usize, b: usize, cell: Cell) {
        self.evaluations += 1;
        self.cells.insert((m, a, b), cell);
    }

    pub fn contains(&self, m: u64, a: usize, b: usize) -> bool {
        self.cells.contains_key(&(m, a, b))
    }

    /// Number of cells the solver evaluated.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over `((m, a, b), cell)` in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = ((u64, usize, usize), Cell)> + '_ {
        self.cells.iter().map(|(k, v)| (*k, *v))
    }
}

impl DecisionTable for MemoTable {
    fn cell(&self, m: u64, a: usize, b: usize) -> Option<Cell> {
        self.cells.get(&(m, a, b)).copied()
    }
}
