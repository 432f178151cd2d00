//! Tree training.
//!
//! - [`TrainInput`]: one round of gradients, hessians, features and
//!   simulated split-statistic paths
//! - [`TreeParams`]: split search policy, learning rate and depth bound
//! - [`partition`]: in-place routing of observation indices at a split
//! - [`GradStats`]: gradient sums and the leaf formulas built on them
//! - [`TrainingLogger`], [`Verbosity`]: verbosity-gated logging
//!
//! Most callers only need [`Tree::train`](crate::repr::Tree::train) or
//! [`Forest::train_round`](crate::repr::Forest::train_round).

mod error;
mod grower;
mod input;
mod logger;
mod params;
pub mod split;
mod stats;

pub use error::TrainError;
pub(crate) use grower::TreeGrower;
pub use grower::partition;
pub use input::TrainInput;
pub use logger::{TrainingLogger, Verbosity};
pub use params::{ConfigError, SplitSearch, TreeParams};
pub(crate) use split::SplitFinder;
pub use split::{SplitCandidate, SplitInfo};
pub use stats::GradStats;
