mod common;

use common::{generous_limit, random_chain};
use proptest::prelude::*;
use remat_dp::{ChainSolver, DecisionTable, IterativeSolver, MemoizedSolver};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn memoized_cells_match_dense_cells(seed in any::<u64>(), len in 1usize..=20, frac in 0u64..=100) {
        let chain = random_chain(seed, len);
        let mmax = generous_limit(&chain) * frac / 100;
        let memo = MemoizedSolver.solve(&chain, mmax).unwrap();
        let dense = IterativeSolver.solve(&chain, mmax).unwrap();
        prop_assert!(!memo.is_empty());
        for ((m, a, b), cell) in memo.iter() {
            let other = dense.cell(m, a, b).expect("dense table covers every cell");
            prop_assert!(
                cell.same_bits(&other),
                "({}, {}, {}): memo {:?} vs dense {:?}", m, a, b, cell, other
            );
        }
    }
}

#[test]
fn agreement_on_store_all_budget() {
    for seed in 0..16 {
        let chain = random_chain(seed, 8);
        let mmax = generous_limit(&chain);
        let memo = MemoizedSolver.solve(&chain, mmax).unwrap();
        let dense = IterativeSolver.solve(&chain, mmax).unwrap();
        let root_memo = memo.cell(mmax, 0, 8).unwrap();
        let root_dense = dense.cell(mmax, 0, 8).unwrap();
        assert!(root_memo.is_feasible(), "seed {seed}");
        assert!(root_memo.same_bits(&root_dense), "seed {seed}");
    }
}
