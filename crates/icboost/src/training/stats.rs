//! Gradient/hessian sufficient statistics.
//!
//! A leaf's Newton-step prediction, its training-loss reduction and its
//! optimism only depend on five sums over the observations reaching it:
//!
//! ```text
//! G = Σ g    H = Σ h    G2 = Σ g²    H2 = Σ h²    gxh = Σ g·h
//! ```
//!
//! [`GradStats`] accumulates these sums together with the observation count.

use ndarray::ArrayView1;

use crate::repr::NodeStats;

/// Sums of gradients, hessians, their squares and cross-products.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradStats {
    /// Σ g
    pub grad_sum: f64,
    /// Σ h
    pub hess_sum: f64,
    /// Σ g²
    pub grad_sq_sum: f64,
    /// Σ h²
    pub hess_sq_sum: f64,
    /// Σ g·h
    pub cross_sum: f64,
    /// Number of observations.
    pub count: usize,
}

impl GradStats {
    /// Add one observation.
    #[inline]
    pub fn push(&mut self, g: f64, h: f64) {
        self.grad_sum += g;
        self.hess_sum += h;
        self.grad_sq_sum += g * g;
        self.hess_sq_sum += h * h;
        self.cross_sum += g * h;
        self.count += 1;
    }

    /// Aggregate over all observations.
    pub fn from_all(grad: ArrayView1<'_, f64>, hess: ArrayView1<'_, f64>) -> Self {
        debug_assert_eq!(grad.len(), hess.len());
        let mut stats = Self::default();
        for (&g, &h) in grad.iter().zip(hess.iter()) {
            stats.push(g, h);
        }
        stats
    }

    /// Aggregate over the observations in `indices`.
    pub fn from_indices(
        grad: ArrayView1<'_, f64>,
        hess: ArrayView1<'_, f64>,
        indices: &[usize],
    ) -> Self {
        let mut stats = Self::default();
        for &i in indices {
            stats.push(grad[i], hess[i]);
        }
        stats
    }

    /// Whether a Newton step is defined for these sums.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.count > 0 && self.hess_sum > 0.0
    }

    /// `G² / (2H)`, the loss reduction (in sum units) of the Newton step.
    ///
    /// Zero when the hessian sum is not positive.
    #[inline]
    pub fn score(&self) -> f64 {
        if self.hess_sum > 0.0 {
            self.grad_sum * self.grad_sum / (2.0 * self.hess_sum)
        } else {
            0.0
        }
    }

    /// Newton-step constant `-G/H`.
    #[inline]
    pub fn prediction(&self) -> f64 {
        if self.is_valid() {
            -self.grad_sum / self.hess_sum
        } else {
            0.0
        }
    }

    /// Average (over `n_total`) training loss of predicting the Newton step
    /// instead of zero: `-G² / (2·H·n_total)`.
    #[inline]
    pub fn train_loss(&self, n_total: usize) -> f64 {
        if self.is_valid() && n_total > 0 {
            -self.score() / n_total as f64
        } else {
            0.0
        }
    }

    /// Per-observation optimism of the Newton-step constant:
    ///
    /// ```text
    /// (G2 − 2·gxh·(G/H) + G²·H2/H²) / (H·n)
    /// ```
    ///
    /// This is the delta-method variance of `-G/H` scaled by the local
    /// curvature, i.e. the expected gap between test and training loss of
    /// the fitted constant.
    #[inline]
    pub fn local_optimism(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        let g = self.grad_sum;
        let h = self.hess_sum;
        let ratio = g / h;
        let numerator = self.grad_sq_sum - 2.0 * self.cross_sum * ratio
            + g * g * self.hess_sq_sum / (h * h);
        numerator / (h * self.count as f64)
    }

    /// Leaf statistics for a node holding these observations.
    ///
    /// The leaf's own optimism contribution is stored as its `crt` until the
    /// node is split.
    pub fn leaf_stats(&self, n_total: usize) -> NodeStats {
        let prob_node = if n_total > 0 {
            self.count as f64 / n_total as f64
        } else {
            0.0
        };
        let local_optimism = self.local_optimism();
        NodeStats {
            prediction: self.prediction(),
            train_loss: self.train_loss(n_total),
            local_optimism,
            prob_node,
            crt: prob_node * local_optimism,
            n_obs: self.count,
        }
    }
}

impl std::ops::Sub for GradStats {
    type Output = GradStats;

    fn sub(self, rhs: Self) -> Self::Output {
        GradStats {
            grad_sum: self.grad_sum - rhs.grad_sum,
            hess_sum: self.hess_sum - rhs.hess_sum,
            grad_sq_sum: self.grad_sq_sum - rhs.grad_sq_sum,
            hess_sq_sum: self.hess_sq_sum - rhs.hess_sq_sum,
            cross_sum: self.cross_sum - rhs.cross_sum,
            count: self.count - rhs.count,
        }
    }
}
