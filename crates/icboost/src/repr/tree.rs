//! Single decision tree: training entry point, prediction and in-order
//! aggregations.
//!
//! All aggregations walk the tree in order (left subtree, node, right
//! subtree) with an explicit stack, see [`InOrder`].

use std::fmt;

use ndarray::{Array1, ArrayView2};

use super::node::{Node, NodeKind};
use crate::data::SampleAccessor;
use crate::training::{TrainError, TrainInput, TreeGrower, TreeParams};

// ============================================================================
// Tree
// ============================================================================

/// A binary regression tree. Empty until the first [`train`](Tree::train).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    root: Option<Node>,
}

impl Tree {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree with the given root.
    pub fn from_root(root: Node) -> Self {
        Self { root: Some(root) }
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Grow the tree on one round of gradients.
    ///
    /// An empty tree first gets a root leaf from the full-data statistics.
    /// An already trained tree keeps its splits; this round's observations
    /// are routed down and its leaves are considered for further splits.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError`] when the input shapes or the parameters are
    /// invalid. Degenerate gradients (zero hessian) are not an error; the
    /// affected nodes simply stay leaves.
    pub fn train(&mut self, input: &TrainInput<'_>, params: &TreeParams) -> Result<(), TrainError> {
        input.validate()?;
        params.validate()?;

        let mut grower = TreeGrower::new(*input, params);
        let root = self.root.get_or_insert_with(|| Node::leaf(grower.root_stats()));
        grower.grow(root);
        grower
            .logger()
            .finish_tree(self.n_leaves(), self.score(), self.optimism());
        Ok(())
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Prediction for one observation; `0.0` for an empty tree.
    pub fn predict_obs<S: SampleAccessor + ?Sized>(&self, sample: &S) -> f64 {
        self.root
            .as_ref()
            .map_or(0.0, |root| root.leaf_for(sample).stats.prediction)
    }

    /// Predictions for every row of `features`.
    pub fn predict_data(&self, features: ArrayView2<'_, f64>) -> Array1<f64> {
        features.rows().into_iter().map(|row| self.predict_obs(&row)).collect()
    }

    // =========================================================================
    // Aggregations
    // =========================================================================

    /// Nodes in order (left subtree, node, right subtree).
    pub fn in_order(&self) -> InOrder<'_> {
        InOrder::new(self.root.as_ref())
    }

    /// Nodes in pre-order (node, left subtree, right subtree).
    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder {
            stack: self.root.iter().collect(),
        }
    }

    fn leaves(&self) -> impl Iterator<Item = &Node> {
        self.in_order().filter(|n| n.is_leaf())
    }

    /// Training loss of the tree: sum of leaf losses.
    pub fn score(&self) -> f64 {
        self.leaves().map(|n| n.stats.train_loss).sum()
    }

    /// Optimism of the leaf estimates given the tree structure.
    pub fn conditional_optimism(&self) -> f64 {
        self.leaves()
            .map(|n| n.stats.local_optimism * n.stats.prob_node)
            .sum()
    }

    /// Total optimism paid for the splits.
    pub fn optimism(&self) -> f64 {
        self.in_order()
            .filter(|n| !n.is_leaf())
            .map(|n| n.stats.crt)
            .sum()
    }

    pub fn n_leaves(&self) -> usize {
        self.leaves().count()
    }

    pub fn n_splits(&self) -> usize {
        self.in_order().filter(|n| !n.is_leaf()).count()
    }

    pub fn n_nodes(&self) -> usize {
        self.in_order().count()
    }

    /// Depth of the deepest leaf (root leaf has depth 0, empty tree 0).
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, Node::depth)
    }

    /// Add each split's expected loss reduction to `importance[feature]`.
    ///
    /// `importance` must have one slot per feature. Repeated calls
    /// accumulate.
    pub fn importance(&self, importance: &mut [f64], learning_rate: f64) {
        for node in self.in_order() {
            if let NodeKind::Split(split) = &node.kind {
                debug_assert!(split.feature < importance.len());
                importance[split.feature] += node.expected_reduction(learning_rate);
            }
        }
    }
}

// ============================================================================
// InOrder
// ============================================================================

/// In-order node iterator over a [`Tree`], driven by an explicit stack.
#[derive(Debug, Clone)]
pub struct InOrder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> InOrder<'a> {
    fn new(root: Option<&'a Node>) -> Self {
        let mut iter = Self { stack: Vec::new() };
        if let Some(root) = root {
            iter.push_left_spine(root);
        }
        iter
    }

    fn push_left_spine(&mut self, mut node: &'a Node) {
        loop {
            self.stack.push(node);
            match &node.kind {
                NodeKind::Split(split) => node = &split.left,
                NodeKind::Leaf => break,
            }
        }
    }
}

impl<'a> Iterator for InOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let NodeKind::Split(split) = &node.kind {
            self.push_left_spine(&split.right);
        }
        Some(node)
    }
}

// ============================================================================
// PreOrder
// ============================================================================

/// Pre-order node iterator, the order used by the persisted formats.
#[derive(Debug, Clone)]
pub struct PreOrder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let NodeKind::Split(split) = &node.kind {
            self.stack.push(&split.right);
            self.stack.push(&split.left);
        }
        Some(node)
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            None => writeln!(f, "<empty tree>"),
            Some(root) => write_node(f, root, 0),
        }
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &Node, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    let s = &node.stats;
    match &node.kind {
        NodeKind::Leaf => writeln!(
            f,
            "{indent}leaf: pred={:.6} loss={:.6e} opt={:.6e} prob={:.4} n={}",
            s.prediction, s.train_loss, s.local_optimism, s.prob_node, s.n_obs
        ),
        NodeKind::Split(split) => {
            writeln!(
                f,
                "{indent}[x{} <= {}] loss={:.6e} crt={:.6e} prob={:.4} n={}",
                split.feature, split.threshold, s.train_loss, s.crt, s.prob_node, s.n_obs
            )?;
            write_node(f, &split.left, depth + 1)?;
            write_node(f, &split.right, depth + 1)
        }
    }
}
