//! The abstract operation sequence handed to a translator.

use std::fmt;

use crate::chain::Chain;

/// One step of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Forward with gradient tracking; keeps the output and the solution's
    /// backward materials.
    ForwardCheckpoint { block: usize, solution: usize },
    /// Forward that keeps only the input checkpoint; the block is re-derived
    /// later by a nested schedule.
    ForwardRecomputeOnly { block: usize },
    /// No-grad replay regenerating an intermediate value.
    ForwardReplay { block: usize },
    /// Backward of a previously checkpointed block.
    Backward { block: usize, solution: usize },
    /// Forward/backward turning point at the tail of the chain.
    LossMarker,
}

impl Operation {
    /// Block index the operation acts on; `None` for the loss marker.
    pub fn block(&self) -> Option<usize> {
        match *self {
            Operation::ForwardCheckpoint { block, .. }
            | Operation::ForwardRecomputeOnly { block }
            | Operation::ForwardReplay { block }
            | Operation::Backward { block, .. } => Some(block),
            Operation::LossMarker => None,
        }
    }

    pub fn is_forward(&self) -> bool {
        matches!(
            self,
            Operation::ForwardCheckpoint { .. }
                | Operation::ForwardRecomputeOnly { .. }
                | Operation::ForwardReplay { .. }
        )
    }

    /// Time of this operation under `chain`'s cost model, or `None` when it
    /// names a block or solution that `chain` does not have.
    pub fn time(&self, chain: &Chain) -> Option<f64> {
        match *self {
            Operation::ForwardCheckpoint { block, solution } => {
                chain.solution(block, solution).map(|s| s.forward_time)
            }
            Operation::ForwardRecomputeOnly { block } | Operation::ForwardReplay { block } => {
                chain.blocks().get(block).map(|b| b.fast_forward_time)
            }
            Operation::Backward { block, solution } => {
                chain.solution(block, solution).map(|s| s.backward_time)
            }
            Operation::LossMarker => Some(chain.loss().total_time()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Operation::ForwardCheckpoint { block, solution } => write!(f, "Fe{block}/{solution}"),
            Operation::ForwardRecomputeOnly { block } => write!(f, "Fc{block}"),
            Operation::ForwardReplay { block } => write!(f, "Fn{block}"),
            Operation::Backward { block, solution } => write!(f, "B{block}/{solution}"),
            Operation::LossMarker => f.write_str("Loss"),
        }
    }
}

/// Ordered list of operations. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    ops: Vec<Operation>,
}

impl Sequence {
    pub(crate) fn from_ops(ops: Vec<Operation>) -> Self {
        Self { ops }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.ops.iter()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Expected time, summing the cost of every operation in order.
    ///
    /// NaN if an operation does not belong to `chain`.
    pub fn compute_time(&self, chain: &Chain) -> f64 {
        self.ops
            .iter()
            .map(|op| op.time(chain).unwrap_or(f64::NAN))
            .sum()
    }

    /// Split into the forward part (up to and including the loss marker)
    /// and the backward remainder.
    pub fn split_at_loss(&self) -> (&[Operation], &[Operation]) {
        match self.ops.iter().position(|op| *op == Operation::LossMarker) {
            Some(pos) => self.ops.split_at(pos + 1),
            None => (&self.ops[..], &[]),
        }
    }

    /// Solution chosen for each real block of `chain`, `None` for blocks that
    /// never get checkpointed.
    pub fn solution_plan(&self, chain: &Chain) -> Vec<Option<usize>> {
        let mut plan = vec![None; chain.len()];
        for op in &self.ops {
            if let Operation::ForwardCheckpoint { block, solution } = *op {
                if let Some(slot) = plan.get_mut(block) {
                    *slot = Some(solution);
                }
            }
        }
        plan
    }

    /// Blocks whose backward may release their input: the preceding block
    /// had not been checkpointed yet when the backward runs.
    pub fn input_release_points(&self, chain: &Chain) -> Vec<usize> {
        let mut checkpointed = vec![false; chain.len()];
        let mut points = Vec::new();
        for op in &self.ops {
            match *op {
                Operation::ForwardCheckpoint { block, .. } => {
                    if let Some(flag) = checkpointed.get_mut(block) {
                        *flag = true;
                    }
                }
                Operation::Backward { block, .. } if block > 0 && !checkpointed[block - 1] => {
                    points.push(block);
                }
                _ => {}
            }
        }
        points
    }

    /// Number of `Backward` operations per real block.
    pub fn backward_counts(&self, chain: &Chain) -> Vec<usize> {
        let mut counts = vec![0; chain.len()];
        for op in &self.ops {
            if let Operation::Backward { block, .. } = *op {
                if let Some(c) = counts.get_mut(block) {
                    *c += 1;
                }
            }
        }
        counts
    }
}

impl FromIterator<Operation> for Sequence {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self::from_ops(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, op) in self.ops.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{op}")?;
        }
        Ok(())
    }
}
