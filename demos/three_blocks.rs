//! Example: schedules of a three-block chain at decreasing budgets.
//!
//! Run with:
//! `cargo run --example three_blocks`

use remat_dp::simulate::replay;
use remat_dp::{Block, Chain, Scheduler, Solution};

fn main() {
    let layer = Block::new(vec![Solution::new(2.0, 3.0).with_saved_memory(1)], 1.0, 0);
    let chain = Chain::builder(0)
        .block(layer.clone(), 1)
        .block(layer.clone(), 1)
        .block(layer, 1)
        .build()
        .expect("chain is well formed");
    let scheduler = Scheduler::new(chain);

    for limit in [5, 4, 3] {
        match scheduler.solve(limit) {
            Ok(schedule) => {
                let peak = replay(scheduler.chain(), &schedule.sequence)
                    .map(|r| r.peak)
                    .unwrap_or_default();
                println!(
                    "limit {limit}: time {} peak {peak}\n  {}",
                    schedule.expected_time, schedule.sequence
                );
            }
            Err(err) => println!("limit {limit}: {err}"),
        }
    }
}
