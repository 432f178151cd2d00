//! Training input errors.

use super::params::ConfigError;

/// Errors returned by [`Tree::train`](crate::repr::Tree::train) and
/// [`TrainInput::new`](super::TrainInput::new).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrainError {
    /// No observations.
    #[error("training data is empty")]
    EmptyData,

    /// Gradient, hessian and feature rows disagree in length.
    #[error("length mismatch: {grad} gradients, {hess} hessians, {rows} feature rows")]
    LengthMismatch { grad: usize, hess: usize, rows: usize },

    /// The feature matrix has no columns.
    #[error("feature matrix has no columns")]
    NoFeatures,

    /// The simulated process matrix has the wrong shape.
    #[error("cir_sim must have at least 1 row and 2 columns, got {rows}x{cols}")]
    InvalidCirSim { rows: usize, cols: usize },

    /// Invalid parameters.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
