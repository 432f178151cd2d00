//! Optimism of a chosen split.
//!
//! Choosing the best of many candidate splits inflates the observed
//! training-loss reduction. Under the null of no signal, the normalized
//! reduction at split proportion `u` converges to a process `S(τ)` in the
//! time `τ = ½·ln(u(1−ε)/(ε(1−u)))`: a Cox–Ingersoll–Ross diffusion with
//! stationary χ²₁ marginal. The optimism of the selected split is the
//! node's own optimism scaled by `E[max S]` over the candidates tested.
//!
//! The process paths are supplied by the caller as an `n_sim × K` matrix
//! (`cir_sim`), column `k` sampled at `u_k = linspace(ε, 1 − ε, K)[k]`.
//!
//! Per feature the maximum over candidate proportions is taken on every
//! simulated path; the per-feature maxima are summarized by a moment-fitted
//! Gumbel and features are combined as the maximum of independent Gumbels.

use ndarray::ArrayView2;

/// Boundary offset of the split-proportion grid.
pub const GRID_EPS: f64 = 1e-12;

/// Euler–Mascheroni constant.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

// =============================================================================
// CirGrid
// =============================================================================

/// Process-time grid matching the columns of `cir_sim`.
#[derive(Debug, Clone)]
pub struct CirGrid {
    taus: Vec<f64>,
}

/// Bracketing columns and interpolation weight for one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bracket {
    lo: usize,
    weight: f64,
}

impl CirGrid {
    /// Grid for `n_cols` columns. With fewer than two there is nothing to
    /// interpolate and every candidate reads column 0.
    pub fn new(n_cols: usize) -> Self {
        let step = (1.0 - 2.0 * GRID_EPS) / (n_cols.max(2) - 1) as f64;
        let taus = (0..n_cols)
            .map(|k| split_time(GRID_EPS + k as f64 * step))
            .collect();
        Self { taus }
    }

    pub fn n_cols(&self) -> usize {
        self.taus.len()
    }

    pub fn taus(&self) -> &[f64] {
        &self.taus
    }

    fn bracket(&self, u: f64) -> Bracket {
        if self.taus.len() < 2 {
            return Bracket { lo: 0, weight: 0.0 };
        }
        let tau = split_time(u);
        let last = self.taus.len() - 1;
        // First column with tau_k > tau, kept inside [1, last].
        let hi = self.taus.partition_point(|&t| t <= tau).clamp(1, last);
        let lo = hi - 1;
        let span = self.taus[hi] - self.taus[lo];
        let weight = if span > 0.0 {
            ((tau - self.taus[lo]) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Bracket { lo, weight }
    }
}

/// Process time for split proportion `u`, clamped to the grid's range.
pub fn split_time(u: f64) -> f64 {
    let u = u.clamp(GRID_EPS, 1.0 - GRID_EPS);
    0.5 * ((u * (1.0 - GRID_EPS)) / (GRID_EPS * (1.0 - u))).ln()
}

// =============================================================================
// Gumbel
// =============================================================================

/// Gumbel (maximum) distribution with location `mu` and scale `beta`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gumbel {
    pub mu: f64,
    pub beta: f64,
}

impl Gumbel {
    /// Method-of-moments fit: `β = sd·√6/π`, `μ = mean − γβ`.
    pub fn from_moments(mean: f64, sd: f64) -> Self {
        let beta = sd * 6f64.sqrt() / std::f64::consts::PI;
        Self {
            mu: mean - EULER_GAMMA * beta,
            beta,
        }
    }

    pub fn mean(&self) -> f64 {
        self.mu + EULER_GAMMA * self.beta
    }

    /// Expected maximum of independent Gumbels.
    ///
    /// All components are taken with the largest scale `β*`, for which the
    /// maximum is Gumbel with `μ* = β*·ln Σ exp(μ_j/β*)`. When every scale
    /// is zero the maxima are constants and the largest mean is returned.
    /// Returns `None` for an empty slice.
    pub fn expected_max(components: &[Gumbel]) -> Option<f64> {
        let beta = components.iter().map(|g| g.beta).fold(None, |acc: Option<f64>, b| {
            Some(acc.map_or(b, |a| a.max(b)))
        })?;
        if beta <= 0.0 {
            return components
                .iter()
                .map(Gumbel::mean)
                .fold(None, |acc: Option<f64>, m| Some(acc.map_or(m, |a| a.max(m))));
        }
        let scaled_max = components
            .iter()
            .map(|g| g.mu / beta)
            .fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = components
            .iter()
            .map(|g| (g.mu / beta - scaled_max).exp())
            .sum();
        let mu = beta * (scaled_max + sum.ln());
        Some(mu + EULER_GAMMA * beta)
    }
}

// =============================================================================
// OptimismEstimator
// =============================================================================

/// Running maxima of the simulated paths over one feature's candidates.
#[derive(Debug, Clone)]
pub struct FeatureMaxima {
    maxima: Vec<f64>,
    n_candidates: usize,
}

impl FeatureMaxima {
    pub fn n_candidates(&self) -> usize {
        self.n_candidates
    }
}

/// Estimates `E[max S]` for a node from the simulated paths.
#[derive(Debug, Clone)]
pub struct OptimismEstimator<'a> {
    cir_sim: ArrayView2<'a, f64>,
    grid: CirGrid,
    components: Vec<Gumbel>,
}

impl<'a> OptimismEstimator<'a> {
    /// Without rows or columns in `cir_sim` no candidate is recorded and
    /// [`expected_max`](Self::expected_max) is `None`.
    pub fn new(cir_sim: ArrayView2<'a, f64>) -> Self {
        let grid = CirGrid::new(cir_sim.ncols());
        Self {
            cir_sim,
            grid,
            components: Vec::new(),
        }
    }

    /// Forget the features of the previous node.
    pub fn reset(&mut self) {
        self.components.clear();
    }

    /// Start accumulating one feature.
    pub fn begin_feature(&self) -> FeatureMaxima {
        FeatureMaxima {
            maxima: vec![f64::NEG_INFINITY; self.cir_sim.nrows()],
            n_candidates: 0,
        }
    }

    /// Account for a candidate with `n_left` of `n_node` observations on the
    /// left.
    pub fn add_candidate(&self, acc: &mut FeatureMaxima, n_left: usize, n_node: usize) {
        let n_cols = self.cir_sim.ncols();
        if n_cols == 0 {
            return;
        }
        let Bracket { lo, weight } = self.grid.bracket(n_left as f64 / n_node as f64);
        let lo_col = self.cir_sim.column(lo);
        let hi_col = self.cir_sim.column((lo + 1).min(n_cols - 1));
        for ((max, &a), &b) in acc.maxima.iter_mut().zip(lo_col.iter()).zip(hi_col.iter()) {
            let value = a + weight * (b - a);
            if value > *max {
                *max = value;
            }
        }
        acc.n_candidates += 1;
    }

    /// Summarize a feature's maxima. Features without candidates are ignored.
    pub fn finish_feature(&mut self, acc: FeatureMaxima) {
        if acc.n_candidates == 0 || acc.maxima.is_empty() {
            return;
        }
        let n = acc.maxima.len() as f64;
        let mean = acc.maxima.iter().sum::<f64>() / n;
        let sd = if acc.maxima.len() > 1 {
            let ss: f64 = acc.maxima.iter().map(|m| (m - mean) * (m - mean)).sum();
            (ss / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        self.components.push(Gumbel::from_moments(mean, sd));
    }

    /// `E[max S]` over every feature finished since the last reset.
    pub fn expected_max(&self) -> Option<f64> {
        Gumbel::expected_max(&self.components)
    }
}
