//! Optimal activation checkpointing for heterogeneous chains.
//!
//! A network is modeled as a linear [`Chain`] of blocks. Each block offers one
//! or more candidate [`Solution`]s, which are different ways of running it
//! with their own times and memory footprints. Under a memory budget the
//! crate picks which activations to keep, which to recompute and which
//! solution each block uses, minimizing total forward plus backward time.
//!
//! ## Core idea
//! 1. Describe the chain: per-block solutions, replay costs and the
//!    activation weight at every boundary.
//! 2. Solve the three-dimensional dynamic program over `(budget, start, end)`
//!    with either the memoized or the iterative solver. Both agree bit for
//!    bit.
//! 3. Walk the decision table back into a [`Sequence`] of abstract
//!    operations a framework translator can execute.
//!
//! ## Quick start
//! ```
//! use remat_dp::{Block, Chain, Scheduler, Solution};
//!
//! let layer = Block::new(vec![Solution::new(2.0, 3.0).with_saved_memory(1)], 1.0, 0);
//! let chain = Chain::builder(0)
//!     .block(layer.clone(), 1)
//!     .block(layer.clone(), 1)
//!     .block(layer, 1)
//!     .build()
//!     .unwrap();
//!
//! let scheduler = Scheduler::new(chain);
//! let roomy = scheduler.solve(5).unwrap();
//! assert_eq!(roomy.expected_time, 15.0);
//!
//! let tight = scheduler.solve(4).unwrap();
//! assert_eq!(tight.expected_time, 17.0);
//! assert_eq!(tight.sequence.to_string(), "Fc0 Fn1 Fe2/0 Loss B2/0 Fe0/0 Fe1/0 B1/0 B0/0");
//!
//! assert!(scheduler.solve(3).unwrap_err().is_infeasible());
//! ```
//!
//! ## Features
//! - `parallel`: fills each width of the iterative table with rayon and runs
//!   [`Scheduler::solve_many`] queries concurrently.
//! - `tracing`: spans around solving and reconstruction.
//! - `heavy`: enables the long-running stress tests.

pub mod blocks;
pub mod builder;
pub mod chain;
pub mod engine;
pub mod error;
pub mod reconstruct;
pub mod sequence;
pub mod simulate;
pub mod solver;
pub mod table;
pub mod traits;
pub mod utils;

pub use crate::blocks::{Block, Solution};
pub use crate::builder::{ChainBuilder, SchedulerBuilder};
pub use crate::chain::Chain;
pub use crate::engine::{solve, Schedule, Scheduler};
pub use crate::error::{Result, ScheduleError};
pub use crate::sequence::{Operation, Sequence};
pub use crate::solver::{IterativeSolver, MemoizedSolver, SolvedTable, SolverKind};
pub use crate::table::{Cell, Decision};
pub use crate::traits::{ChainSolver, DecisionTable};
