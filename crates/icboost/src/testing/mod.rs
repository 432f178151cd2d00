//! Test support: simulated split-statistic paths and synthetic data.
//!
//! Used by the crate's own tests and benchmarks; downstream test suites can
//! use it to produce the `cir_sim` input without a separate simulator.

use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_distr::{ChiSquared, Poisson, StandardNormal};

use crate::training::split::CirGrid;

/// Absolute tolerance for comparing accumulated floating-point quantities.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

// =============================================================================
// Split-statistic paths
// =============================================================================

/// Simulate `n_sims` paths of the split-statistic process on the grid of
/// `n_cols` columns.
///
/// The process is the CIR diffusion `dS = 2(1 − S)dτ + 2√2·√S dW`, started
/// from its stationary χ²₁ law and advanced with the exact transition:
/// over a step `dt`, `S' = c·χ²(1 + 2N)` with `c = 1 − e^{−2dt}` and
/// `N ~ Poisson(S·e^{−2dt} / (2c))`.
pub fn simulate_cir(n_sims: usize, n_cols: usize, seed: u64) -> Array2<f64> {
    let grid = CirGrid::new(n_cols);
    let taus = grid.taus();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sim = Array2::zeros((n_sims, n_cols));

    for mut path in sim.rows_mut() {
        if n_cols == 0 {
            break;
        }
        let z: f64 = rng.sample(StandardNormal);
        let mut x = z * z;
        path[0] = x;
        for k in 1..n_cols {
            x = cir_step(&mut rng, x, taus[k] - taus[k - 1]);
            path[k] = x;
        }
    }
    sim
}

fn cir_step<R: Rng>(rng: &mut R, x: f64, dt: f64) -> f64 {
    let decay = (-2.0 * dt).exp();
    let c = 1.0 - decay;
    if c <= f64::EPSILON {
        return x;
    }
    let lambda = x * decay / c;
    let n = if lambda > 0.0 {
        Poisson::new(lambda / 2.0).map_or(0.0, |p| p.sample(rng))
    } else {
        0.0
    };
    ChiSquared::new(1.0 + 2.0 * n).map_or(x, |chi| c * chi.sample(rng))
}

/// A `cir_sim` matrix with every entry equal to `value`.
///
/// With `value = 1` the expected maximum is exactly 1, so a split's optimism
/// equals the node's own optimism contribution.
pub fn constant_cir(n_sims: usize, n_cols: usize, value: f64) -> Array2<f64> {
    Array2::from_elem((n_sims, n_cols), value)
}

// =============================================================================
// Synthetic gradients
// =============================================================================

/// Gradient set for one boosting round.
#[derive(Debug, Clone)]
pub struct GradientSet {
    pub grad: Array1<f64>,
    pub hess: Array1<f64>,
    pub features: Array2<f64>,
}

/// Squared-loss gradients `ŷ − y` and unit hessians.
pub fn squared_loss_gradients(target: &Array1<f64>, prediction: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
    let grad = prediction - target;
    let hess = Array1::ones(target.len());
    (grad, hess)
}

/// Four observations, one feature: `g = [-1, -1, 1, 1]`, `h = 1`,
/// `x = [0, 0, 1, 1]`.
pub fn four_point_step() -> GradientSet {
    GradientSet {
        grad: Array1::from(vec![-1.0, -1.0, 1.0, 1.0]),
        hess: Array1::ones(4),
        features: Array2::from_shape_fn((4, 1), |(i, _)| if i < 2 { 0.0 } else { 1.0 }),
    }
}

/// A step signal of size 1 buried in alternating ±3 noise.
///
/// With `n = 4m` observations at `x = 0..n`, `g_i = ∓1 ± 3`: the step flips
/// sign at `x = 2m` and the noise alternates between even and odd `i`. The
/// best split (at `2m − 0.5`) always reduces the training loss by `0.5`,
/// while the node optimism is `10/n`.
pub fn weak_step_signal(m: usize) -> GradientSet {
    let n = 4 * m;
    let grad = Array1::from_shape_fn(n, |i| {
        let step = if i < 2 * m { -1.0 } else { 1.0 };
        let noise = if i % 2 == 0 { 3.0 } else { -3.0 };
        step + noise
    });
    GradientSet {
        grad,
        hess: Array1::ones(n),
        features: Array2::from_shape_fn((n, 1), |(i, _)| i as f64),
    }
}

/// Uniform features in `[0, 1)` with squared-loss gradients of the target
/// `y = signal(x) + noise·ε`, evaluated at a zero prediction.
pub fn random_regression(
    n_rows: usize,
    n_features: usize,
    noise: f64,
    seed: u64,
    signal: impl Fn(&[f64]) -> f64,
) -> GradientSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let features = Array2::from_shape_fn((n_rows, n_features), |_| rng.r#gen::<f64>());
    let target = Array1::from_iter(features.rows().into_iter().map(|row| {
        let values = row.to_vec();
        let eps: f64 = rng.sample(StandardNormal);
        signal(&values) + noise * eps
    }));
    let (grad, hess) = squared_loss_gradients(&target, &Array1::zeros(n_rows));
    GradientSet {
        grad,
        hess,
        features,
    }
}
