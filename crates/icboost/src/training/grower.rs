//! Recursive tree growth with optimism-based stopping.
//!
//! Starting from a leaf, [`TreeGrower::grow`] searches the best split of each
//! node and accepts it only when the optimism-corrected reduction of the
//! generalization loss is positive:
//!
//! ```text
//! lr·(2 − lr)·R − lr·CRt > 0,   CRt = prob_node · local_optimism · E[max S]
//! ```
//!
//! Observation indices are partitioned in place as nodes split, so every
//! recursion level works on a contiguous sub-slice of one buffer.

use ndarray::ArrayView2;

use super::input::TrainInput;
use super::logger::TrainingLogger;
use super::params::TreeParams;
use super::split::SplitFinder;
use super::stats::GradStats;
use crate::repr::{Node, NodeKind, NodeStats};

/// Grows one tree for one round of gradients.
///
/// Expects validated input: `cir_sim` with at least one row and two columns.
pub(crate) struct TreeGrower<'a, 'p> {
    input: TrainInput<'a>,
    params: &'p TreeParams,
    finder: SplitFinder<'a>,
    logger: TrainingLogger,
}

impl<'a, 'p> TreeGrower<'a, 'p> {
    pub(crate) fn new(input: TrainInput<'a>, params: &'p TreeParams) -> Self {
        let finder = SplitFinder::new(
            input.features,
            input.grad,
            input.hess,
            input.cir_sim,
            params.split_search,
            params.greedy_max_thresholds,
        );
        Self {
            input,
            params,
            finder,
            logger: TrainingLogger::new(params.verbosity),
        }
    }

    /// Leaf statistics of the root for this round's gradients.
    pub(crate) fn root_stats(&self) -> NodeStats {
        GradStats::from_all(self.input.grad, self.input.hess).leaf_stats(self.input.n_obs())
    }

    /// Split `root` (and, for an existing tree, its descendants) as far as
    /// the depth bound and the stopping rule allow.
    pub(crate) fn grow(&mut self, root: &mut Node) {
        self.logger
            .start_tree(self.input.n_obs(), self.input.n_features());
        let mut indices: Vec<usize> = (0..self.input.n_obs()).collect();
        self.split_node(root, &mut indices, 0);
    }

    pub(crate) fn logger(&self) -> &TrainingLogger {
        &self.logger
    }

    fn split_node(&mut self, node: &mut Node, indices: &mut [usize], depth: usize) {
        if depth >= self.params.max_depth || indices.len() < self.params.min_split_obs {
            return;
        }

        // Existing split: route this round's observations down.
        if let NodeKind::Split(split) = &mut node.kind {
            let n_left = partition(indices, self.input.features, split.feature, split.threshold);
            let (left, right) = indices.split_at_mut(n_left);
            self.split_node(&mut split.left, left, depth + 1);
            self.split_node(&mut split.right, right, depth + 1);
            return;
        }

        let n_total = self.input.n_obs();
        let parent = GradStats::from_indices(self.input.grad, self.input.hess, indices);
        if parent.hess_sum <= 0.0 {
            self.logger
                .degenerate_node(depth, indices.len(), parent.hess_sum);
            return;
        }

        let Some(candidate) = self.finder.find_best(indices, &parent) else {
            return;
        };
        let split = candidate.split;

        let mut stats = parent.leaf_stats(n_total);
        let crt = stats.prob_node * stats.local_optimism * candidate.expected_max;
        let lr = self.params.learning_rate;
        let gain = lr * (2.0 - lr) * split.reduction - lr * crt;
        // NaN rejects.
        if gain.is_nan() || gain <= 0.0 {
            self.logger.split_rejected(depth, split.feature, gain);
            return;
        }
        self.logger
            .split_accepted(depth, split.feature, split.threshold, gain);

        let n_left = partition(indices, self.input.features, split.feature, split.threshold);
        let (left_idx, right_idx) = indices.split_at_mut(n_left);
        let left = GradStats::from_indices(self.input.grad, self.input.hess, left_idx);
        let right = GradStats::from_indices(self.input.grad, self.input.hess, right_idx);

        stats.crt = crt;
        node.convert_to_split(
            stats,
            split.feature,
            split.threshold,
            Node::leaf(left.leaf_stats(n_total)),
            Node::leaf(right.leaf_stats(n_total)),
        );

        if let NodeKind::Split(split) = &mut node.kind {
            self.split_node(&mut split.left, left_idx, depth + 1);
            self.split_node(&mut split.right, right_idx, depth + 1);
        }
    }
}

/// Move observations with `x[feature] <= threshold` to the front.
///
/// Returns the number of left-going observations.
pub fn partition(
    indices: &mut [usize],
    features: ArrayView2<'_, f64>,
    feature: usize,
    threshold: f64,
) -> usize {
    let column = features.column(feature);
    let mut left_end = 0;
    for i in 0..indices.len() {
        if column[indices[i]] <= threshold {
            indices.swap(i, left_end);
            left_end += 1;
        }
    }
    left_end
}
