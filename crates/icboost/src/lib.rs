//! icboost: gradient tree boosting with optimism-based split stopping.
//!
//! Each boosting round grows one tree on the round's gradients and hessians.
//! A node is split only when the training-loss reduction of the best split
//! exceeds an estimate of its optimism, the expected gap between training
//! and test loss caused by fitting the split to the training data. Tree
//! complexity is therefore decided by the data, without a tuned penalty.
//!
//! # Key Types
//!
//! - [`Forest`] / [`Tree`] / [`Node`] - Model representation
//! - [`TreeParams`] - Training parameters (builder with validation)
//! - [`TrainInput`] - One round of gradients, hessians, features and
//!   simulated split-statistic paths
//! - [`persist`] - Binary, text and JSON forest formats
//!
//! # Example
//!
//! ```
//! use icboost::{Forest, TrainInput, TreeParams};
//! use icboost::testing::{constant_cir, four_point_step};
//!
//! let data = four_point_step();
//! let cir_sim = constant_cir(10, 20, 1.0);
//! let input = TrainInput::new(
//!     data.grad.view(),
//!     data.hess.view(),
//!     data.features.view(),
//!     cir_sim.view(),
//! )
//! .unwrap();
//!
//! let mut forest = Forest::new();
//! let params = TreeParams::builder().learning_rate(0.1).build().unwrap();
//! forest.train_round(&input, &params).unwrap();
//!
//! assert_eq!(forest.n_leaves(), 2);
//! assert!((forest.predict_obs(&[0.0][..]) - 1.0).abs() < 1e-12);
//! ```

// Re-export approx traits for users who want to compare predictions
pub use approx;

pub mod data;
pub mod persist;
pub mod repr;
pub mod testing;
pub mod training;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use data::SampleAccessor;
pub use repr::{Forest, Node, NodeKind, NodeStats, Tree};
pub use training::{
    ConfigError, SplitSearch, TrainError, TrainInput, TrainingLogger, TreeParams, Verbosity,
};
