#![allow(dead_code)]

use rand::{rngs::StdRng, Rng, SeedableRng};
use remat_dp::{Block, Chain, Solution};

/// Times are multiples of 0.25 so that every sum the solvers and
/// `Sequence::compute_time` form is exact.
fn quarter(rng: &mut StdRng, max_quarters: u32) -> f64 {
    f64::from(rng.gen_range(0..=max_quarters)) * 0.25
}

fn random_solution(rng: &mut StdRng) -> Solution {
    Solution::new(quarter(rng, 40), quarter(rng, 60))
        .with_saved_memory(rng.gen_range(0..=4))
        .with_overheads(rng.gen_range(0..=2), rng.gen_range(0..=2))
}

/// Random heterogeneous chain of `len` blocks with 1 to 3 solutions each.
/// Interior activations weigh at least one unit.
pub fn random_chain(seed: u64, len: usize) -> Chain {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = Chain::builder(rng.gen_range(0..=3));
    for _ in 0..len {
        let count = rng.gen_range(1..=3);
        let solutions = (0..count).map(|_| random_solution(&mut rng)).collect();
        let block = Block::new(solutions, quarter(&mut rng, 20), rng.gen_range(0..=2));
        builder = builder.block(block, rng.gen_range(1..=4));
    }
    let loss = Solution::new(quarter(&mut rng, 8), quarter(&mut rng, 8))
        .with_overheads(rng.gen_range(0..=1), rng.gen_range(0..=1));
    builder
        .loss(loss, rng.gen_range(0..=2))
        .build()
        .expect("random chain is well formed")
}

/// A memory limit large enough to store every activation and every saved
/// buffer at once.
pub fn generous_limit(chain: &Chain) -> u64 {
    let weights: u64 = chain.checkpoint_weights().iter().sum();
    let saved: u64 = chain
        .blocks()
        .iter()
        .map(|b| b.solutions().iter().map(|s| s.saved_memory).max().unwrap_or(0))
        .sum();
    let overhead: u64 = chain
        .blocks()
        .iter()
        .flat_map(|b| b.solutions())
        .map(|s| s.forward_overhead.max(s.backward_overhead))
        .chain(chain.blocks().iter().map(|b| b.fast_forward_overhead))
        .max()
        .unwrap_or(0);
    weights + saved + overhead + 2
}

/// Uniform chain: every block runs in 2 + 3 with one saved unit and replays
/// in 1; activations weigh one unit; the input and the loss are free.
pub fn uniform_chain(len: usize) -> Chain {
    let sol = Solution::new(2.0, 3.0).with_saved_memory(1);
    let mut builder = Chain::builder(0);
    for _ in 0..len {
        builder = builder.block(Block::new(vec![sol], 1.0, 0), 1);
    }
    builder.build().expect("uniform chain is well formed")
}
