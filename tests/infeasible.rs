mod common;

use common::uniform_chain;
use remat_dp::{Block, Chain, Scheduler, ScheduleError, Solution, SolverKind};

#[test]
fn limit_below_input_weight_is_infeasible() {
    let sol = Solution::new(1.0, 1.0).with_saved_memory(1);
    let chain = Chain::builder(6)
        .block(Block::new(vec![sol], 1.0, 0), 1)
        .build()
        .unwrap();
    let err = Scheduler::new(chain).solve(5).unwrap_err();
    assert_eq!(
        err,
        ScheduleError::InfeasibleBudget {
            lmin: 0,
            lmax: 1,
            budget: 5
        }
    );
    assert_eq!(
        err.to_string(),
        "cannot process the chain from index 0 to 1 with memory 5"
    );
}

#[test]
fn zero_budget_is_a_normal_query() {
    for kind in [SolverKind::Memoized, SolverKind::Iterative] {
        let scheduler = Scheduler::builder(uniform_chain(4)).solver(kind).build();
        let err = scheduler.solve(0).unwrap_err();
        assert!(err.is_infeasible(), "{kind:?}: {err}");
    }
}

#[test]
fn free_chain_fits_in_zero_budget() {
    let free = Solution::new(1.0, 2.0);
    let chain = Chain::builder(0)
        .block(Block::with_free_replay(vec![free]), 0)
        .block(Block::with_free_replay(vec![free]), 0)
        .build()
        .unwrap();
    let schedule = Scheduler::new(chain).solve(0).unwrap();
    assert_eq!(schedule.expected_time, 6.0);
    assert_eq!(schedule.budget, 0);
}

#[test]
fn minimum_feasible_limit_is_a_threshold() {
    let scheduler = Scheduler::builder(uniform_chain(5))
        .solver(SolverKind::Iterative)
        .cache_tables(true)
        .build();
    let min = scheduler
        .min_feasible_limit(0, 64)
        .unwrap()
        .expect("64 units are plenty");
    assert!(min > 0);
    assert!(scheduler.solve(min - 1).unwrap_err().is_infeasible());
    assert!(scheduler.solve(min).is_ok());
}

#[test]
fn infeasible_is_not_an_invariant_violation() {
    let err = Scheduler::new(uniform_chain(2)).solve(1).unwrap_err();
    assert!(!matches!(err, ScheduleError::InvariantViolation(_)));
    assert!(err.is_infeasible());
}

#[test]
fn unbounded_limit_is_reported_by_the_dense_solver() {
    let dense = Scheduler::builder(uniform_chain(1))
        .solver(SolverKind::Iterative)
        .build();
    assert_eq!(
        dense.solve(u64::MAX).unwrap_err(),
        ScheduleError::TableTooLarge {
            mmax: u64::MAX,
            len: 1
        }
    );

    let memo = Scheduler::new(uniform_chain(1));
    assert_eq!(memo.solve(u64::MAX).unwrap().expected_time, 5.0);
}
