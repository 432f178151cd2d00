//! Training behavior of trees and forests.

use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array2, ArrayView1};
use rstest::rstest;

use icboost::testing::{
    GradientSet, constant_cir, four_point_step, random_regression, simulate_cir, weak_step_signal,
};
use icboost::training::GradStats;
use icboost::{
    ConfigError, Forest, Node, NodeKind, SplitSearch, TrainError, TrainInput, Tree, TreeParams,
    Verbosity,
};

// =============================================================================
// Helpers
// =============================================================================

fn input<'a>(set: &'a GradientSet, cir_sim: &'a Array2<f64>) -> TrainInput<'a> {
    TrainInput::new(
        set.grad.view(),
        set.hess.view(),
        set.features.view(),
        cir_sim.view(),
    )
    .unwrap()
}

fn params(search: SplitSearch, learning_rate: f64, max_depth: usize) -> TreeParams {
    TreeParams::builder()
        .split_search(search)
        .learning_rate(learning_rate)
        .max_depth(max_depth)
        .build()
        .unwrap()
}

fn trained(set: &GradientSet, cir_sim: &Array2<f64>, params: &TreeParams) -> Tree {
    let mut tree = Tree::new();
    tree.train(&input(set, cir_sim), params).unwrap();
    tree
}

/// Two-level step along feature 0, noise elsewhere.
fn strong_signal(seed: u64) -> GradientSet {
    random_regression(300, 3, 0.3, seed, |x| {
        if x[0] > 0.5 {
            2.0
        } else if x[0] > 0.25 {
            0.5
        } else {
            -1.0
        }
    })
}

/// Leaf reached by explicitly checking the routing rule at every split.
fn route<'a>(node: &'a Node, row: ArrayView1<'_, f64>) -> &'a Node {
    match &node.kind {
        NodeKind::Leaf => node,
        NodeKind::Split(split) => {
            if row[split.feature] <= split.threshold {
                route(&split.left, row)
            } else {
                route(&split.right, row)
            }
        }
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn four_points_split_in_the_middle() {
    let set = four_point_step();
    let cir = constant_cir(10, 20, 1.0);
    let tree = trained(&set, &cir, &params(SplitSearch::Greedy, 0.01, 1));

    let root = tree.root().unwrap();
    let split = root.as_split().unwrap();
    assert_eq!(split.feature, 0);
    assert!(split.threshold > 0.0 && split.threshold < 1.0);
    assert_abs_diff_eq!(split.left.stats.prediction, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(split.right.stats.prediction, -1.0, epsilon = 1e-12);
    assert_eq!(tree.n_leaves(), 2);

    // Root optimism 0.25 scaled by E[max S] = 1.
    assert_abs_diff_eq!(tree.optimism(), 0.25, epsilon = 1e-12);
    assert_abs_diff_eq!(tree.score(), -0.5, epsilon = 1e-12);
}

#[rstest]
#[case(5, 1)]
#[case(4, 2)]
#[case(2, 2)]
fn small_nodes_stay_leaves(#[case] min_split_obs: usize, #[case] expected_leaves: usize) {
    let set = four_point_step();
    let cir = constant_cir(10, 20, 1.0);
    let params = TreeParams::builder()
        .learning_rate(0.1)
        .min_split_obs(min_split_obs)
        .build()
        .unwrap();
    let tree = trained(&set, &cir, &params);
    assert_eq!(tree.n_leaves(), expected_leaves);
}

#[test]
fn single_node_score() {
    let set = strong_signal(1);
    let cir = simulate_cir(50, 30, 1);
    let tree = trained(&set, &cir, &params(SplitSearch::Greedy, 0.1, 0));

    let stats = GradStats::from_all(set.grad.view(), set.hess.view());
    let n = set.grad.len() as f64;
    assert_eq!(tree.n_leaves(), 1);
    assert_abs_diff_eq!(
        tree.score(),
        -stats.grad_sum * stats.grad_sum / (2.0 * stats.hess_sum * n),
        epsilon = 1e-12
    );
    assert_eq!(tree.optimism(), 0.0);
}

#[rstest]
#[case(SplitSearch::Exhaustive, 3)]
#[case(SplitSearch::Greedy, 3)]
#[case(SplitSearch::Greedy, 6)]
fn leaves_exceed_splits_by_one(#[case] search: SplitSearch, #[case] depth: usize) {
    let set = strong_signal(2);
    let cir = simulate_cir(50, 30, 2);
    let tree = trained(&set, &cir, &params(search, 0.1, depth));

    assert!(tree.n_splits() >= 1);
    assert_eq!(tree.n_leaves(), tree.n_splits() + 1);
    assert!(tree.depth() <= depth);
}

#[test]
fn prediction_follows_routing() {
    let set = strong_signal(3);
    let cir = simulate_cir(50, 30, 3);
    let tree = trained(&set, &cir, &params(SplitSearch::Exhaustive, 0.5, 4));
    let root = tree.root().unwrap();

    let predictions = tree.predict_data(set.features.view());
    for (row, &pred) in set.features.rows().into_iter().zip(predictions.iter()) {
        assert_eq!(pred, route(root, row).stats.prediction);
        assert_eq!(pred, tree.predict_obs(&row));
    }
}

#[test]
fn deeper_trees_never_fit_worse() {
    let set = strong_signal(4);
    let cir = simulate_cir(50, 30, 4);
    let scores: Vec<f64> = (0..5)
        .map(|depth| trained(&set, &cir, &params(SplitSearch::Greedy, 0.1, depth)).score())
        .collect();
    for pair in scores.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-12, "scores {scores:?}");
    }
    assert!(scores[1] < scores[0]);
}

#[test]
fn weak_signal_needs_data() {
    let cir = constant_cir(10, 50, 1.0);
    let p = params(SplitSearch::Exhaustive, 1.0, 1);

    // n = 8: reduction 0.5 against optimism 1.25.
    let small = weak_step_signal(2);
    let tree = trained(&small, &cir, &p);
    assert_eq!(tree.n_leaves(), 1);

    // n = 400: same reduction, optimism 0.025.
    let large = weak_step_signal(100);
    let tree = trained(&large, &cir, &p);
    assert_eq!(tree.n_leaves(), 2);
    let split = tree.root().unwrap().as_split().unwrap();
    assert_eq!(split.threshold, 199.5);
    assert_abs_diff_eq!(tree.optimism(), 0.025, epsilon = 1e-12);
}

#[test]
fn importance_grows_with_trees() {
    let set = four_point_step();
    let cir = constant_cir(10, 20, 1.0);
    let p = params(SplitSearch::Greedy, 0.1, 1);
    let input = input(&set, &cir);

    let mut forest = Forest::new();
    forest.train_round(&input, &p).unwrap();
    let one = forest.importance(1, p.learning_rate);
    forest.train_round(&input, &p).unwrap();
    let two = forest.importance(1, p.learning_rate);

    // 0.1·1.9·0.5 − 0.1·0.25 per tree.
    assert_abs_diff_eq!(one[0], 0.07, epsilon = 1e-12);
    assert!(two[0] > one[0]);
    assert_abs_diff_eq!(two[0], 2.0 * one[0], epsilon = 1e-12);

    // Tree-level accumulation is additive across calls.
    let mut acc = vec![0.0];
    forest.trees()[0].importance(&mut acc, p.learning_rate);
    forest.trees()[0].importance(&mut acc, p.learning_rate);
    assert_abs_diff_eq!(acc[0], two[0], epsilon = 1e-12);
}

#[test]
fn exhaustive_search_fits_at_least_as_well() {
    let set = strong_signal(5);
    let cir = simulate_cir(50, 30, 5);
    let greedy = trained(
        &set,
        &cir,
        &TreeParams::builder()
            .learning_rate(0.1)
            .greedy_max_thresholds(4)
            .build()
            .unwrap(),
    );
    let exhaustive = trained(&set, &cir, &params(SplitSearch::Exhaustive, 0.1, 1));

    assert_eq!(greedy.n_leaves(), 2);
    assert_eq!(exhaustive.n_leaves(), 2);
    assert!(exhaustive.score() <= greedy.score() + 1e-12);
}

#[test]
fn few_boundaries_make_greedy_exhaustive() {
    let set = four_point_step();
    let cir = simulate_cir(30, 20, 6);
    let a = trained(&set, &cir, &params(SplitSearch::Greedy, 0.1, 2));
    let b = trained(&set, &cir, &params(SplitSearch::Exhaustive, 0.1, 2));
    assert_eq!(a, b);
}

#[test]
fn retraining_keeps_existing_splits() {
    let first = strong_signal(7);
    let second = strong_signal(8);
    let cir = simulate_cir(50, 30, 7);

    let mut tree = trained(&first, &cir, &params(SplitSearch::Exhaustive, 0.5, 1));
    let root_split = tree.root().unwrap().as_split().map(|s| (s.feature, s.threshold));
    assert!(root_split.is_some());

    tree.train(&input(&second, &cir), &params(SplitSearch::Exhaustive, 0.5, 2))
        .unwrap();
    let after = tree.root().unwrap().as_split().map(|s| (s.feature, s.threshold));
    assert_eq!(after, root_split);
    assert!(tree.depth() <= 2);
    assert_eq!(tree.n_leaves(), tree.n_splits() + 1);
}

#[test]
fn learning_rate_does_not_scale_predictions() {
    let set = four_point_step();
    let cir = constant_cir(10, 20, 1.0);
    let slow = trained(&set, &cir, &params(SplitSearch::Greedy, 0.01, 1));
    let fast = trained(&set, &cir, &params(SplitSearch::Greedy, 1.0, 1));
    let x = set.features.view();
    assert_eq!(slow.predict_data(x), fast.predict_data(x));
}

#[test]
fn large_learning_rate_rejects_the_split() {
    // lr·(2 − lr)·0.5 − lr·0.25 <= 0 once lr >= 1.5.
    let set = four_point_step();
    let cir = constant_cir(10, 20, 1.0);
    let tree = trained(&set, &cir, &params(SplitSearch::Greedy, 1.6, 1));
    assert_eq!(tree.n_leaves(), 1);
}

// =============================================================================
// Degenerate input
// =============================================================================

#[test]
fn zero_hessian_gives_zero_leaf() {
    let set = GradientSet {
        grad: Array1::from(vec![1.0, -2.0, 0.5]),
        hess: Array1::zeros(3),
        features: Array2::from_shape_fn((3, 1), |(i, _)| i as f64),
    };
    let cir = constant_cir(5, 10, 1.0);
    let tree = trained(&set, &cir, &params(SplitSearch::Exhaustive, 0.1, 3));

    assert_eq!(tree.n_leaves(), 1);
    let root = tree.root().unwrap();
    assert_eq!(root.stats.prediction, 0.0);
    assert_eq!(root.stats.train_loss, 0.0);
    assert_eq!(tree.predict_obs(&[1.0][..]), 0.0);
}

#[test]
fn invalid_input_is_an_error() {
    let set = four_point_step();
    let cir = constant_cir(10, 20, 1.0);
    let short = Array1::<f64>::ones(3);

    let err = TrainInput::new(
        set.grad.view(),
        short.view(),
        set.features.view(),
        cir.view(),
    )
    .unwrap_err();
    assert!(matches!(err, TrainError::LengthMismatch { .. }));

    let one_column = constant_cir(10, 1, 1.0);
    let err = TrainInput::new(
        set.grad.view(),
        set.hess.view(),
        set.features.view(),
        one_column.view(),
    )
    .unwrap_err();
    assert!(matches!(err, TrainError::InvalidCirSim { rows: 10, cols: 1 }));

    // Parameters mutated after building are checked again.
    let bad = TreeParams {
        learning_rate: 2.5,
        ..TreeParams::default()
    };
    let mut tree = Tree::new();
    let err = tree.train(&input(&set, &cir), &bad).unwrap_err();
    assert_eq!(err, TrainError::Config(ConfigError::InvalidLearningRate(2.5)));
    assert!(tree.is_empty());

    let mut forest = Forest::new();
    assert!(forest.train_round(&input(&set, &cir), &bad).is_err());
    assert!(forest.is_empty());
}

#[test]
fn verbose_training_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
    let set = strong_signal(9);
    let cir = simulate_cir(20, 16, 9);
    let p = TreeParams::builder()
        .max_depth(3)
        .learning_rate(0.2)
        .verbosity(Verbosity::Debug)
        .build()
        .unwrap();
    let tree = trained(&set, &cir, &p);
    assert!(tree.n_leaves() >= 2);
    assert!(!tree.to_string().is_empty());
}
