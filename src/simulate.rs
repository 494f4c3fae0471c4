//! Memory replay of a sequence.
//!
//! Walks the operations with a stack of live reservations and reports the
//! memory each step needs on top of the chain input. The accounting is the
//! one the DP certifies, so a sequence reconstructed for budget `mmax` never
//! peaks above `mmax`.
//!
//! Reservations:
//! - `ForwardCheckpoint(i, k)` keeps `cbw[i+1][k]` until `Backward(i, k)`;
//! - a replay run `ForwardRecomputeOnly(a), ForwardReplay(a+1..j)` keeps the
//!   boundary `cw[j]` once the run ends, until the backward of block `j`
//!   (or the loss marker when `j == L`).

use crate::blocks::Solution;
use crate::chain::Chain;
use crate::error::{Result, ScheduleError};
use crate::sequence::{Operation, Sequence};

/// Result of a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryReplay {
    /// Memory needed by each operation, relative to the DP budget.
    pub per_op: Vec<u64>,
    /// Maximum of `per_op`.
    pub peak: u64,
    /// `peak` plus the chain input activation.
    pub absolute_peak: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reservation {
    Saved { block: usize, solution: usize, size: u64 },
    Boundary { index: usize, size: u64 },
}

impl Reservation {
    fn size(&self) -> u64 {
        match *self {
            Reservation::Saved { size, .. } | Reservation::Boundary { size, .. } => size,
        }
    }
}

struct Replayer<'c> {
    chain: &'c Chain,
    stack: Vec<Reservation>,
    reserved: u64,
    /// Last block of an unfinished replay run.
    run_end: Option<usize>,
}

impl<'c> Replayer<'c> {
    fn new(chain: &'c Chain) -> Self {
        Self {
            chain,
            stack: Vec::new(),
            reserved: 0,
            run_end: None,
        }
    }

    fn push(&mut self, r: Reservation) {
        self.reserved += r.size();
        self.stack.push(r);
    }

    fn pop(&mut self) -> Option<Reservation> {
        let r = self.stack.pop()?;
        self.reserved -= r.size();
        Some(r)
    }

    /// Close a pending replay run: the next operation must start at the
    /// boundary right after it.
    fn close_run(&mut self, next_block: Option<usize>) -> Result<()> {
        let Some(last) = self.run_end.take() else {
            return Ok(());
        };
        let index = last + 1;
        if next_block != Some(index) {
            return Err(ScheduleError::invariant(format!(
                "replay run ending at block {last} is followed by block {next_block:?}"
            )));
        }
        let size = self.chain.checkpoint_weight(index);
        self.push(Reservation::Boundary { index, size });
        Ok(())
    }

    fn release_boundary(&mut self, index: usize) {
        if let Some(Reservation::Boundary { index: top, .. }) = self.stack.last() {
            if *top == index {
                self.pop();
            }
        }
    }

    fn solution(&self, block: usize, solution: usize) -> Result<Solution> {
        self.chain.solution(block, solution).copied().ok_or_else(|| {
            ScheduleError::invariant(format!("block {block} has no solution {solution}"))
        })
    }

    fn step(&mut self, op: &Operation) -> Result<u64> {
        let chain = self.chain;
        let len = chain.len();
        let cw = |b: usize| chain.checkpoint_weight(b);
        match *op {
            Operation::ForwardCheckpoint { block, solution } => {
                self.close_run(Some(block))?;
                let sol = self.solution(block, solution)?;
                let need =
                    self.reserved + cw(block + 1) + sol.saved_memory + sol.forward_overhead;
                self.push(Reservation::Saved {
                    block,
                    solution,
                    size: sol.saved_memory,
                });
                Ok(need)
            }
            Operation::ForwardRecomputeOnly { block } => {
                self.close_run(Some(block))?;
                check_real(block, len)?;
                self.run_end = Some(block);
                Ok(self.reserved + cw(block + 1) + chain.fast_forward_overhead(block))
            }
            Operation::ForwardReplay { block } => {
                check_real(block, len)?;
                if block == 0 || self.run_end != Some(block - 1) {
                    return Err(ScheduleError::invariant(format!(
                        "replay of block {block} does not extend a replay run"
                    )));
                }
                self.run_end = Some(block);
                Ok(self.reserved + cw(block) + cw(block + 1) + chain.fast_forward_overhead(block))
            }
            Operation::Backward { block, solution } => {
                if self.run_end.is_some() {
                    return Err(ScheduleError::invariant(format!(
                        "backward of block {block} directly after a replay run"
                    )));
                }
                match self.pop() {
                    Some(Reservation::Saved {
                        block: b,
                        solution: k,
                        ..
                    }) if b == block && k == solution => {}
                    other => {
                        return Err(ScheduleError::invariant(format!(
                            "backward ({block}, {solution}) does not match live reservation {other:?}"
                        )));
                    }
                }
                let sol = self.solution(block, solution)?;
                let need = self.reserved
                    + cw(block)
                    + cw(block + 1)
                    + sol.saved_memory
                    + sol.backward_overhead;
                self.release_boundary(block);
                Ok(need)
            }
            Operation::LossMarker => {
                self.close_run(Some(len))?;
                let need = self.reserved + chain.checkpoint_limit(len, 0);
                self.release_boundary(len);
                Ok(need)
            }
        }
    }
}

fn check_real(block: usize, len: usize) -> Result<()> {
    if block < len {
        Ok(())
    } else {
        Err(ScheduleError::invariant(format!(
            "block {block} is not a real block of a chain of length {len}"
        )))
    }
}

/// Replay `sequence` against `chain` and report its memory profile.
pub fn replay(chain: &Chain, sequence: &Sequence) -> Result<MemoryReplay> {
    let mut replayer = Replayer::new(chain);
    let mut per_op = Vec::with_capacity(sequence.len());
    for op in sequence {
        per_op.push(replayer.step(op)?);
    }
    if replayer.run_end.is_some() || !replayer.stack.is_empty() {
        return Err(ScheduleError::invariant(format!(
            "sequence ends with {} live reservations",
            replayer.stack.len() + usize::from(replayer.run_end.is_some())
        )));
    }
    let peak = per_op.iter().copied().max().unwrap_or(0);
    Ok(MemoryReplay {
        per_op,
        peak,
        absolute_peak: peak + chain.checkpoint_weight(0),
    })
}
