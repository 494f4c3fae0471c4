use criterion::{black_box, criterion_group, criterion_main, Criterion};
use remat_dp::reconstruct::build_sequence;
use remat_dp::simulate::replay;
use remat_dp::{Block, Chain, ChainSolver, MemoizedSolver, Solution};

fn ladder_chain(len: usize) -> Chain {
    let mut builder = Chain::builder(1);
    for i in 0..len {
        let w = (i % 4) as u64 + 1;
        let fast = Solution::new(1.0, 2.0).with_saved_memory(2 * w);
        let lean = Solution::new(1.5, 2.5).with_saved_memory(w);
        builder = builder.block(Block::new(vec![fast, lean], 0.75, 0), w);
    }
    builder.build().expect("bench chain is well formed")
}

fn bench_reconstruct(c: &mut Criterion) {
    let chain = ladder_chain(48);
    let mmax = 60;
    let table = MemoizedSolver.solve(&chain, mmax).unwrap();
    let sequence = build_sequence(&chain, &table, mmax).unwrap();

    let mut group = c.benchmark_group("sequence_ops");
    group.bench_function("build_sequence", |b| {
        b.iter(|| black_box(build_sequence(&chain, &table, black_box(mmax)).unwrap()))
    });
    group.bench_function("replay", |b| {
        b.iter(|| black_box(replay(&chain, &sequence).unwrap()))
    });
    group.bench_function("compute_time", |b| {
        b.iter(|| black_box(sequence.compute_time(&chain)))
    });
    group.finish();
}

criterion_group!(benches, bench_reconstruct);
criterion_main!(benches);
