//! Borrowed training input for one boosting round.

use ndarray::{ArrayView1, ArrayView2};

use super::error::TrainError;

/// Gradients, hessians, features and simulated split-statistic paths for one
/// round.
///
/// `features` is `n_obs × n_features` (row-major or not, any layout works).
/// `cir_sim` is `n_sim × K`; column `k` is the process value at split
/// proportion `linspace(ε, 1 − ε, K)[k]`.
#[derive(Debug, Clone, Copy)]
pub struct TrainInput<'a> {
    pub grad: ArrayView1<'a, f64>,
    pub hess: ArrayView1<'a, f64>,
    pub features: ArrayView2<'a, f64>,
    pub cir_sim: ArrayView2<'a, f64>,
}

impl<'a> TrainInput<'a> {
    /// Create a validated input.
    ///
    /// # Errors
    ///
    /// - [`TrainError::EmptyData`] when there are no observations
    /// - [`TrainError::LengthMismatch`] when lengths disagree
    /// - [`TrainError::NoFeatures`] when the feature matrix has no columns
    /// - [`TrainError::InvalidCirSim`] when `cir_sim` has no rows or fewer
    ///   than two columns
    pub fn new(
        grad: ArrayView1<'a, f64>,
        hess: ArrayView1<'a, f64>,
        features: ArrayView2<'a, f64>,
        cir_sim: ArrayView2<'a, f64>,
    ) -> Result<Self, TrainError> {
        let input = Self {
            grad,
            hess,
            features,
            cir_sim,
        };
        input.validate()?;
        Ok(input)
    }

    /// Check shapes.
    pub fn validate(&self) -> Result<(), TrainError> {
        let (grad, hess, rows) = (self.grad.len(), self.hess.len(), self.features.nrows());
        if grad != hess || grad != rows {
            return Err(TrainError::LengthMismatch { grad, hess, rows });
        }
        if grad == 0 {
            return Err(TrainError::EmptyData);
        }
        if self.features.ncols() == 0 {
            return Err(TrainError::NoFeatures);
        }
        let (sim_rows, sim_cols) = self.cir_sim.dim();
        if sim_rows < 1 || sim_cols < 2 {
            return Err(TrainError::InvalidCirSim {
                rows: sim_rows,
                cols: sim_cols,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn n_obs(&self) -> usize {
        self.grad.len()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }
}
