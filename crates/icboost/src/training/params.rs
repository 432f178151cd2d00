//! Tree training parameters with builder pattern.
//!
//! ```
//! use icboost::training::{SplitSearch, TreeParams};
//!
//! // All defaults
//! let params = TreeParams::builder().build().unwrap();
//! assert_eq!(params.max_depth, 1);
//!
//! let params = TreeParams::builder()
//!     .learning_rate(0.1)
//!     .max_depth(4)
//!     .split_search(SplitSearch::Exhaustive)
//!     .build()
//!     .unwrap();
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::logger::Verbosity;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during parameter validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Learning rate must lie in `(0, 2)`.
    #[error("learning_rate must be in (0, 2), got {0}")]
    InvalidLearningRate(f64),
    /// A count parameter is below its minimum.
    #[error("{field} must be at least {min}, got {value}")]
    TooSmall {
        field: &'static str,
        min: usize,
        value: usize,
    },
}

// =============================================================================
// SplitSearch
// =============================================================================

/// How candidate thresholds are enumerated per feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitSearch {
    /// Every boundary between distinct sorted values.
    Exhaustive,
    /// At most `greedy_max_thresholds` boundaries, evenly spread.
    #[default]
    Greedy,
}

// =============================================================================
// TreeParams
// =============================================================================

/// Parameters for growing a single tree.
///
/// The learning rate does not scale leaf predictions; it only enters the
/// split acceptance test, where the training-loss reduction of a shrunk
/// step is `lr·(2 − lr)·R` and its optimism is `lr·CRt`.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct TreeParams {
    /// Candidate enumeration policy. Default: [`SplitSearch::Greedy`].
    #[builder(default)]
    pub split_search: SplitSearch,

    /// Shrinkage applied by the boosting loop. Default: 0.01.
    #[builder(default = 0.01)]
    pub learning_rate: f64,

    /// Maximum tree depth (root has depth 0). Default: 1.
    #[builder(default = 1)]
    pub max_depth: usize,

    /// Maximum thresholds per feature for greedy search. Default: 32.
    #[builder(default = 32)]
    pub greedy_max_thresholds: usize,

    /// Minimum observations for a node to be considered for splitting.
    /// Default: 2.
    #[builder(default = 2)]
    pub min_split_obs: usize,

    /// Verbosity level. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,
}

impl<S: tree_params_builder::IsComplete> TreeParamsBuilder<S> {
    /// Build and validate the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - `learning_rate` is outside `(0, 2)`
    /// - `greedy_max_thresholds == 0`
    /// - `min_split_obs < 2`
    pub fn build(self) -> Result<TreeParams, ConfigError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl TreeParams {
    /// Validate the parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // NaN fails both comparisons
        if !(self.learning_rate > 0.0 && self.learning_rate < 2.0) {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        if self.greedy_max_thresholds < 1 {
            return Err(ConfigError::TooSmall {
                field: "greedy_max_thresholds",
                min: 1,
                value: self.greedy_max_thresholds,
            });
        }
        if self.min_split_obs < 2 {
            return Err(ConfigError::TooSmall {
                field: "min_split_obs",
                min: 2,
                value: self.min_split_obs,
            });
        }
        Ok(())
    }
}

impl Default for TreeParams {
    fn default() -> Self {
        Self::builder().__build_internal()
    }
}

// =============================================================================
// Tests
// =============================================================================
