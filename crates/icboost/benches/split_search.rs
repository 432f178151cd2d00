//! Tree growing: greedy versus exhaustive threshold search.
//!
//! Run with: cargo bench --bench split_search

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use icboost::testing::{random_regression, simulate_cir};
use icboost::{SplitSearch, TrainInput, Tree, TreeParams};

// =============================================================================
// Tree Growing
// =============================================================================

fn bench_grow_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("training/grow_tree");
    group.sample_size(20);

    let cir = simulate_cir(100, 100, 42);

    for &n_rows in &[1_000usize, 10_000] {
        let n_features = 8;
        let set = random_regression(n_rows, n_features, 0.5, 42, |x| {
            2.0 * x[0] - x[1] + if x[2] > 0.5 { 1.0 } else { -1.0 }
        });
        let input = TrainInput::new(
            set.grad.view(),
            set.hess.view(),
            set.features.view(),
            cir.view(),
        )
        .expect("valid input");

        group.throughput(Throughput::Elements((n_rows * n_features) as u64));

        for (name, search) in [
            ("greedy", SplitSearch::Greedy),
            ("exhaustive", SplitSearch::Exhaustive),
        ] {
            let params = TreeParams::builder()
                .split_search(search)
                .learning_rate(0.1)
                .max_depth(4)
                .build()
                .expect("valid params");

            group.bench_with_input(BenchmarkId::new(name, n_rows), &input, |b, input| {
                b.iter(|| {
                    let mut tree = Tree::new();
                    tree.train(black_box(input), &params).expect("training succeeds");
                    black_box(tree.n_leaves())
                })
            });
        }
    }

    group.finish();
}

// =============================================================================
// Prediction
// =============================================================================

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict/tree");

    let cir = simulate_cir(100, 100, 7);
    let set = random_regression(10_000, 8, 0.1, 7, |x| 4.0 * x[0] * x[1] - x[3]);
    let input = TrainInput::new(
        set.grad.view(),
        set.hess.view(),
        set.features.view(),
        cir.view(),
    )
    .expect("valid input");
    let params = TreeParams::builder()
        .split_search(SplitSearch::Greedy)
        .max_depth(6)
        .build()
        .expect("valid params");
    let mut tree = Tree::new();
    tree.train(&input, &params).expect("training succeeds");

    group.throughput(Throughput::Elements(set.features.nrows() as u64));
    group.bench_function("predict_data", |b| {
        b.iter(|| black_box(tree.predict_data(black_box(set.features.view()))))
    });

    group.finish();
}

criterion_group!(benches, bench_grow_tree, bench_predict);
criterion_main!(benches);
