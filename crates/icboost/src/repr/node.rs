//! Tree node types.
//!
//! A node is either a leaf or a binary split that exclusively owns its two
//! children. The variant is explicit, so there is no "one child missing"
//! state to guard against during traversal.

use crate::data::SampleAccessor;

/// Statistics carried by every node, leaf or split.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeStats {
    /// Additive contribution of the node when it is a leaf (`-G/H`).
    pub prediction: f64,
    /// Training loss attributable to the node, averaged over the full
    /// training set (`-G²/(2·H·n_total)`).
    pub train_loss: f64,
    /// Per-observation optimism of the node's constant estimate.
    pub local_optimism: f64,
    /// Fraction of training observations reaching the node.
    pub prob_node: f64,
    /// Optimism bookkeeping.
    ///
    /// For a leaf this is its own optimism contribution
    /// (`prob_node · local_optimism`); for a split it is the optimism
    /// increment paid for choosing the split.
    pub crt: f64,
    /// Observations reaching the node when it was created.
    pub n_obs: usize,
}

/// Binary split: go left iff `x[feature] <= threshold`.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitNode {
    /// Feature (column) index.
    pub feature: usize,
    /// Split threshold.
    pub threshold: f64,
    /// Left child (`x <= threshold`).
    pub left: Box<Node>,
    /// Right child (`x > threshold`).
    pub right: Box<Node>,
}

impl SplitNode {
    /// Routing rule.
    #[inline]
    pub fn goes_left(&self, value: f64) -> bool {
        value <= self.threshold
    }
}

/// Leaf or split.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Leaf,
    Split(SplitNode),
}

/// A decision tree vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub stats: NodeStats,
    pub kind: NodeKind,
}

impl Node {
    /// Create a leaf.
    pub fn leaf(stats: NodeStats) -> Self {
        Self {
            stats,
            kind: NodeKind::Leaf,
        }
    }

    /// Create a split node owning `left` and `right`.
    pub fn split(stats: NodeStats, feature: usize, threshold: f64, left: Node, right: Node) -> Self {
        Self {
            stats,
            kind: NodeKind::Split(SplitNode {
                feature,
                threshold,
                left: Box::new(left),
                right: Box::new(right),
            }),
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf)
    }

    /// Split information, `None` for leaves.
    #[inline]
    pub fn as_split(&self) -> Option<&SplitNode> {
        match &self.kind {
            NodeKind::Split(split) => Some(split),
            NodeKind::Leaf => None,
        }
    }

    /// Convert this node to a split in place.
    ///
    /// `stats.crt` must already hold the optimism increment of the split.
    pub(crate) fn convert_to_split(
        &mut self,
        stats: NodeStats,
        feature: usize,
        threshold: f64,
        left: Node,
        right: Node,
    ) {
        self.stats = stats;
        self.kind = NodeKind::Split(SplitNode {
            feature,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        });
    }

    /// Follow the routing rule down to a leaf.
    pub fn leaf_for<S: SampleAccessor + ?Sized>(&self, sample: &S) -> &Node {
        let mut node = self;
        while let NodeKind::Split(split) = &node.kind {
            node = if split.goes_left(sample.feature(split.feature)) {
                &split.left
            } else {
                &split.right
            };
        }
        node
    }

    /// Expected reduction in generalization loss attributable to this split
    /// when applied with shrinkage `learning_rate`:
    ///
    /// ```text
    /// lr·(2 − lr)·(loss_parent − loss_left − loss_right) − lr·CRt
    /// ```
    ///
    /// The training-loss reduction of a step scaled by `lr` shrinks by
    /// `lr·(2 − lr)`, while its optimism scales linearly in `lr`.
    /// Leaves contribute nothing.
    pub fn expected_reduction(&self, learning_rate: f64) -> f64 {
        match &self.kind {
            NodeKind::Leaf => 0.0,
            NodeKind::Split(split) => {
                let reduction =
                    self.stats.train_loss - split.left.stats.train_loss - split.right.stats.train_loss;
                learning_rate * (2.0 - learning_rate) * reduction - learning_rate * self.stats.crt
            }
        }
    }

    /// Number of nodes in the subtree rooted here.
    pub fn n_nodes(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            if let NodeKind::Split(split) = &node.kind {
                stack.push(&split.left);
                stack.push(&split.right);
            }
        }
        count
    }

    /// Depth of the subtree rooted here (a leaf has depth 0).
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self, 0)];
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let NodeKind::Split(split) = &node.kind {
                stack.push((&split.left, depth + 1));
                stack.push((&split.right, depth + 1));
            }
        }
        max_depth
    }
}
