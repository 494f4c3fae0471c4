use crate::blocks::{Block, Solution};
use crate::chain::Chain;
use crate::engine::Scheduler;
use crate::error::Result;
use crate::solver::SolverKind;

/// Incremental construction of a [`Chain`], validated on [`build`](Self::build).
pub struct ChainBuilder {
    blocks: Vec<Block>,
    weights: Vec<u64>,
    loss: Solution,
    loss_weight: u64,
}

impl ChainBuilder {
    pub fn new(input_weight: u64) -> Self {
        Self {
            blocks: Vec::new(),
            weights: vec![input_weight],
            loss: Solution::zero(),
            loss_weight: 0,
        }
    }

    /// Append a block whose output activation weighs `output_weight`.
    pub fn block(mut self, block: Block, output_weight: u64) -> Self {
        self.blocks.push(block);
        self.weights.push(output_weight);
        self
    }

    /// Replace the default zero-cost loss block; `output_weight` is the
    /// weight of boundary `L + 1`.
    pub fn loss(mut self, loss: Solution, output_weight: u64) -> Self {
        self.loss = loss;
        self.loss_weight = output_weight;
        self
    }

    pub fn build(self) -> Result<Chain> {
        let mut weights = self.weights;
        weights.push(self.loss_weight);
        Chain::from_parts(self.blocks, self.loss, weights)
    }
}

/// Configures a [`Scheduler`] for a chain.
pub struct SchedulerBuilder {
    chain: Chain,
    solver: Option<SolverKind>,
    cache_tables: bool,
}

impl SchedulerBuilder {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain,
            solver: None,
            cache_tables: false,
        }
    }

    pub fn solver(mut self, solver: SolverKind) -> Self {
        self.solver = Some(solver);
        self
    }

    /// Keep DP tables per budget so repeated queries skip the solve.
    pub fn cache_tables(mut self, enabled: bool) -> Self {
        self.cache_tables = enabled;
        self
    }

    pub fn build(self) -> Scheduler {
        Scheduler::with_options(
            self.chain,
            self.solver.unwrap_or_default(),
            self.cache_tables,
        )
    }
}
