//! Split finding.
//!
//! For every feature the node's observations are sorted by value and the
//! gradient statistics are scanned as prefix sums. A candidate boundary sits
//! between two consecutive distinct values; the threshold is their midpoint.
//!
//! - [`SplitSearch::Exhaustive`]: evaluate every boundary
//! - [`SplitSearch::Greedy`]: evaluate at most `greedy_max_thresholds`
//!   boundaries, spread evenly over the sorted boundaries
//!
//! All evaluated candidates feed the [`OptimismEstimator`], which yields the
//! expected maximum of the split-statistic process for the node.

pub mod optimism;

pub use optimism::{CirGrid, Gumbel, OptimismEstimator};

use ndarray::{ArrayView1, ArrayView2};

use super::params::SplitSearch;
use super::stats::GradStats;

// =============================================================================
// SplitInfo
// =============================================================================

/// Best split of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitInfo {
    /// Feature index.
    pub feature: usize,
    /// Threshold; left iff `x <= threshold`.
    pub threshold: f64,
    /// Training-loss reduction averaged over all training observations:
    /// `[G_l²/(2H_l) + G_r²/(2H_r) − G²/(2H)] / n_total`.
    pub reduction: f64,
    /// Left child statistics.
    pub left: GradStats,
    /// Right child statistics.
    pub right: GradStats,
}

/// Outcome of a node's split search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCandidate {
    pub split: SplitInfo,
    /// `E[max S]` over all candidates tested at the node.
    pub expected_max: f64,
}

// =============================================================================
// SplitFinder
// =============================================================================

/// Finds the best split of a node and the optimism scale of choosing it.
#[derive(Debug, Clone)]
pub(crate) struct SplitFinder<'a> {
    features: ArrayView2<'a, f64>,
    grad: ArrayView1<'a, f64>,
    hess: ArrayView1<'a, f64>,
    search: SplitSearch,
    max_thresholds: usize,
    n_total: usize,
    estimator: OptimismEstimator<'a>,
    // Scratch buffers reused across features and nodes.
    sorted: Vec<usize>,
    boundaries: Vec<usize>,
}

impl<'a> SplitFinder<'a> {
    pub(crate) fn new(
        features: ArrayView2<'a, f64>,
        grad: ArrayView1<'a, f64>,
        hess: ArrayView1<'a, f64>,
        cir_sim: ArrayView2<'a, f64>,
        search: SplitSearch,
        max_thresholds: usize,
    ) -> Self {
        Self {
            features,
            grad,
            hess,
            search,
            max_thresholds: max_thresholds.max(1),
            n_total: grad.len(),
            estimator: OptimismEstimator::new(cir_sim),
            sorted: Vec::new(),
            boundaries: Vec::new(),
        }
    }

    /// Best split of the observations in `indices` with aggregate `parent`.
    ///
    /// Returns `None` when no feature offers a valid candidate. Ties go to
    /// the earliest feature, then the earliest threshold.
    pub(crate) fn find_best(&mut self, indices: &[usize], parent: &GradStats) -> Option<SplitCandidate> {
        self.estimator.reset();
        let parent_score = parent.score();
        let mut best: Option<SplitInfo> = None;

        for feature in 0..self.features.ncols() {
            let column = self.features.column(feature);

            self.sorted.clear();
            self.sorted.extend_from_slice(indices);
            self.sorted.sort_by(|&a, &b| column[a].total_cmp(&column[b]));

            // Boundary p: first p sorted observations go left.
            self.boundaries.clear();
            for p in 1..self.sorted.len() {
                if column[self.sorted[p - 1]] < column[self.sorted[p]] {
                    self.boundaries.push(p);
                }
            }
            if self.boundaries.is_empty() {
                continue;
            }
            let selected = select_boundaries(&self.boundaries, self.search, self.max_thresholds);

            let mut acc = self.estimator.begin_feature();
            let mut left = GradStats::default();
            let mut scanned = 0;
            for p in selected {
                while scanned < p {
                    let i = self.sorted[scanned];
                    left.push(self.grad[i], self.hess[i]);
                    scanned += 1;
                }
                let right = *parent - left;
                if left.hess_sum <= 0.0 || right.hess_sum <= 0.0 {
                    continue;
                }
                self.estimator.add_candidate(&mut acc, p, indices.len());

                let reduction =
                    (left.score() + right.score() - parent_score) / self.n_total as f64;
                if best.is_none_or(|b| reduction > b.reduction) {
                    let a = column[self.sorted[p - 1]];
                    let b = column[self.sorted[p]];
                    best = Some(SplitInfo {
                        feature,
                        threshold: midpoint(a, b),
                        reduction,
                        left,
                        right,
                    });
                }
            }
            self.estimator.finish_feature(acc);
        }

        let split = best?;
        let expected_max = self.estimator.expected_max()?;
        Some(SplitCandidate {
            split,
            expected_max,
        })
    }
}

/// Threshold between consecutive distinct values `a < b`.
///
/// The midpoint, or `a` when rounding pushes the midpoint out of `[a, b)`.
#[inline]
pub fn midpoint(a: f64, b: f64) -> f64 {
    let mid = a / 2.0 + b / 2.0;
    if mid >= a && mid < b { mid } else { a }
}

/// Boundaries to evaluate under `search`.
fn select_boundaries(
    boundaries: &[usize],
    search: SplitSearch,
    max_thresholds: usize,
) -> impl Iterator<Item = usize> + '_ {
    let len = boundaries.len();
    let take = match search {
        SplitSearch::Exhaustive => len,
        SplitSearch::Greedy => len.min(max_thresholds),
    };
    // Midpoints of `take` equal-width bins over the boundary list: strictly
    // increasing, and the identity when `take == len`.
    (0..take).map(move |i| boundaries[(2 * i + 1) * len / (2 * take)])
}
