//! Training progress logging.
//!
//! Messages go through the `log` facade; [`Verbosity`] decides which of them
//! are emitted at all, so a silent run never touches the logger backend.

use serde::{Deserialize, Serialize};

/// Verbosity level for training output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// No output.
    #[default]
    Silent,
    /// Degenerate nodes and other anomalies.
    Warning,
    /// Per-tree summaries.
    Info,
    /// Every evaluated split decision.
    Debug,
}

/// Verbosity-gated logger used by the tree grower.
#[derive(Debug, Clone)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    accepted: usize,
    rejected: usize,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            accepted: 0,
            rejected: 0,
        }
    }

    #[inline]
    pub fn enabled(&self, level: Verbosity) -> bool {
        level != Verbosity::Silent && self.verbosity >= level
    }

    pub fn start_tree(&self, n_obs: usize, n_features: usize) {
        if self.enabled(Verbosity::Info) {
            log::info!("growing tree on {n_obs} observations, {n_features} features");
        }
    }

    pub fn split_accepted(&mut self, depth: usize, feature: usize, threshold: f64, gain: f64) {
        self.accepted += 1;
        if self.enabled(Verbosity::Debug) {
            log::debug!(
                "depth {depth}: split feature {feature} at {threshold:.6} accepted (gain {gain:.6e})"
            );
        }
    }

    pub fn split_rejected(&mut self, depth: usize, feature: usize, gain: f64) {
        self.rejected += 1;
        if self.enabled(Verbosity::Debug) {
            log::debug!("depth {depth}: best split on feature {feature} rejected (gain {gain:.6e})");
        }
    }

    pub fn degenerate_node(&self, depth: usize, n_obs: usize, hess_sum: f64) {
        if self.enabled(Verbosity::Warning) {
            log::warn!("depth {depth}: node with {n_obs} observations has hessian sum {hess_sum}");
        }
    }

    pub fn finish_tree(&self, n_leaves: usize, score: f64, optimism: f64) {
        if self.enabled(Verbosity::Info) {
            log::info!(
                "tree done: {n_leaves} leaves, {} splits accepted, {} rejected, \
                 loss {score:.6e}, optimism {optimism:.6e}",
                self.accepted,
                self.rejected
            );
        }
    }

    /// Number of accepted splits so far.
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Number of rejected best-candidates so far.
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}
