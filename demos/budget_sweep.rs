//! Example: time/memory trade-off of a heterogeneous chain.
//!
//! Every block offers a fast solution that keeps all its intermediates and a
//! lean one that keeps half. The sweep prints the optimal time for each
//! budget together with the solutions picked.
//!
//! Run with:
//! `cargo run --example budget_sweep --features parallel`

use remat_dp::{Block, Chain, Scheduler, Solution};

fn main() {
    let mut builder = Chain::builder(4);
    for i in 0..12 {
        let act = if i % 4 == 3 { 8 } else { 4 };
        let fast = Solution::new(1.0, 2.0).with_saved_memory(2 * act);
        let lean = Solution::new(1.0, 3.0).with_saved_memory(act);
        builder = builder.block(Block::new(vec![fast, lean], 1.0, 0), act);
    }
    let chain = builder.build().expect("chain is well formed");
    let scheduler = Scheduler::builder(chain).cache_tables(true).build();

    let Ok(Some(min)) = scheduler.min_feasible_limit(0, 512) else {
        println!("no feasible budget below 512");
        return;
    };
    let limits: Vec<u64> = (min..=min + 160).step_by(16).collect();
    for (limit, result) in limits.iter().zip(scheduler.solve_many(&limits)) {
        match result {
            Ok(schedule) => {
                let plan: String = schedule
                    .sequence
                    .solution_plan(scheduler.chain())
                    .iter()
                    .map(|k| match k {
                        Some(0) => 'F',
                        Some(_) => 'L',
                        None => '.',
                    })
                    .collect();
                let recomputed = schedule
                    .sequence
                    .iter()
                    .filter(|op| op.is_forward())
                    .count()
                    .saturating_sub(scheduler.chain().len());
                println!(
                    "limit {limit:>4}: time {:>6.1}  plan {plan}  extra forwards {recomputed}",
                    schedule.expected_time
                );
            }
            Err(err) => println!("limit {limit:>4}: {err}"),
        }
    }
}
