//! Ordered tree ensemble.

use ndarray::{Array1, ArrayView2};

use super::tree::Tree;
use crate::data::SampleAccessor;
use crate::training::{TrainError, TrainInput, TreeParams};

/// Trees in boosting-round order. The ensemble prediction is the sum of the
/// tree predictions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forest {
    trees: Vec<Tree>,
}

impl Forest {
    /// Empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_trees(trees: Vec<Tree>) -> Self {
        Self { trees }
    }

    /// Append a tree.
    pub fn push_tree(&mut self, tree: Tree) {
        self.trees.push(tree);
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tree> {
        self.trees.iter()
    }

    pub fn into_trees(self) -> Vec<Tree> {
        self.trees
    }

    /// Train a new tree on this round's gradients and append it.
    ///
    /// On error nothing is appended.
    pub fn train_round(
        &mut self,
        input: &TrainInput<'_>,
        params: &TreeParams,
    ) -> Result<&Tree, TrainError> {
        let mut tree = Tree::new();
        tree.train(input, params)?;
        self.trees.push(tree);
        let last = self.trees.len() - 1;
        Ok(&self.trees[last])
    }

    pub fn predict_obs<S: SampleAccessor + ?Sized>(&self, sample: &S) -> f64 {
        self.trees.iter().map(|t| t.predict_obs(sample)).sum()
    }

    pub fn predict_data(&self, features: ArrayView2<'_, f64>) -> Array1<f64> {
        let mut out = Array1::zeros(features.nrows());
        for tree in &self.trees {
            out += &tree.predict_data(features);
        }
        out
    }

    /// Per-feature importance summed over trees.
    pub fn importance(&self, n_features: usize, learning_rate: f64) -> Vec<f64> {
        let mut importance = vec![0.0; n_features];
        for tree in &self.trees {
            tree.importance(&mut importance, learning_rate);
        }
        importance
    }

    pub fn optimism(&self) -> f64 {
        self.trees.iter().map(Tree::optimism).sum()
    }

    pub fn score(&self) -> f64 {
        self.trees.iter().map(Tree::score).sum()
    }

    pub fn n_leaves(&self) -> usize {
        self.trees.iter().map(Tree::n_leaves).sum()
    }
}

impl<'a> IntoIterator for &'a Forest {
    type Item = &'a Tree;
    type IntoIter = std::slice::Iter<'a, Tree>;

    fn into_iter(self) -> Self::IntoIter {
        self.trees.iter()
    }
}

impl FromIterator<Tree> for Forest {
    fn from_iter<I: IntoIterator<Item = Tree>>(iter: I) -> Self {
        Self {
            trees: iter.into_iter().collect(),
        }
    }
}
