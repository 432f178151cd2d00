//! Forest persistence.
//!
//! Three formats, all laid out in node pre-order (node, left subtree, right
//! subtree):
//!
//! - [`binary`]: compact little-endian record stream (primary format)
//! - [`text`]: line-oriented token stream with `-1` markers for absent
//!   children and the end of the forest
//! - [`schema`]: serde types for JSON export and inspection
//!
//! The binary and text readers are tolerant: a malformed or truncated tree
//! ends decoding, and the trees decoded before it are returned together with
//! a [`ReadReport`] explaining where and why reading stopped.
//!
//! ```
//! use icboost::persist::{binary, text};
//! use icboost::repr::Forest;
//!
//! let forest = Forest::new();
//! let mut buf = Vec::new();
//! binary::write_forest(&forest, &mut buf).unwrap();
//! let (loaded, report) = binary::read_forest(buf.as_slice()).unwrap();
//! assert_eq!(loaded, forest);
//! assert!(report.is_complete());
//!
//! let mut buf = Vec::new();
//! text::write_forest(&forest, &mut buf).unwrap();
//! assert_eq!(buf, b"-1\n");
//! ```

pub mod binary;
mod error;
pub mod schema;
pub mod text;

pub use error::{ReadError, WriteError};
pub use schema::{ForestSchema, NodeSchema, TreeSchema};

use crate::repr::{Forest, Node, NodeStats};

/// Deepest tree the formats accept, counted in splits from root to leaf.
///
/// Readers reject deeper trees as malformed and writers refuse them.
pub const MAX_TREE_DEPTH: usize = 512;

/// Refuse trees the readers would reject.
pub(crate) fn check_depth(forest: &Forest) -> Result<(), WriteError> {
    for tree in forest {
        let depth = tree.depth();
        if depth > MAX_TREE_DEPTH {
            return Err(WriteError::TooLarge {
                what: "tree depth",
                value: depth,
            });
        }
    }
    Ok(())
}

// =============================================================================
// ReadReport
// =============================================================================

/// Diagnostics of a tolerant read.
#[derive(Debug, Default)]
pub struct ReadReport {
    /// Trees decoded successfully.
    pub trees: usize,
    /// Records (binary) or lines (text) consumed.
    pub records: usize,
    /// Nodes decoded, including those of a discarded partial tree.
    pub nodes: usize,
    /// Error that ended decoding early, if any.
    pub stopped_by: Option<ReadError>,
}

impl ReadReport {
    /// Whether the whole stream was decoded.
    pub fn is_complete(&self) -> bool {
        self.stopped_by.is_none()
    }

    pub(crate) fn stop(&mut self, err: ReadError) {
        log::warn!(
            "forest read stopped after {} trees ({} records, {} nodes): {err}",
            self.trees,
            self.records,
            self.nodes
        );
        self.stopped_by = Some(err);
    }
}

// =============================================================================
// PreorderBuilder
// =============================================================================

/// Split waiting for its children.
struct PendingSplit {
    stats: NodeStats,
    feature: usize,
    threshold: f64,
    left: Option<Node>,
}

/// Reassembles a tree from nodes delivered in pre-order.
///
/// Uses an explicit stack and rejects splits deeper than [`MAX_TREE_DEPTH`], so
/// hostile input can neither overflow the call stack while assembling nor
/// produce a tree too deep to drop.
#[derive(Default)]
pub(crate) struct PreorderBuilder {
    stack: Vec<PendingSplit>,
    root: Option<Node>,
}

impl PreorderBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether the root has been completed.
    pub(crate) fn is_complete(&self) -> bool {
        self.root.is_some()
    }

    pub(crate) fn push_split(
        &mut self,
        stats: NodeStats,
        feature: usize,
        threshold: f64,
    ) -> Result<(), ReadError> {
        self.ensure_open()?;
        if self.stack.len() >= MAX_TREE_DEPTH {
            return Err(ReadError::Malformed(format!(
                "tree deeper than {MAX_TREE_DEPTH} levels"
            )));
        }
        self.stack.push(PendingSplit {
            stats,
            feature,
            threshold,
            left: None,
        });
        Ok(())
    }

    pub(crate) fn push_leaf(&mut self, stats: NodeStats) -> Result<(), ReadError> {
        self.ensure_open()?;
        let mut node = Node::leaf(stats);
        // Attach the completed subtree, closing every split it completes.
        loop {
            let Some(pending) = self.stack.last_mut() else {
                self.root = Some(node);
                return Ok(());
            };
            if pending.left.is_none() {
                pending.left = Some(node);
                return Ok(());
            }
            let Some(PendingSplit {
                stats,
                feature,
                threshold,
                left: Some(left),
            }) = self.stack.pop()
            else {
                return Err(ReadError::Malformed("dangling split".into()));
            };
            node = Node::split(stats, feature, threshold, left, node);
        }
    }

    /// The completed root.
    pub(crate) fn finish(self) -> Result<Node, ReadError> {
        self.root
            .ok_or_else(|| ReadError::Malformed("tree ended before all splits had children".into()))
    }

    fn ensure_open(&self) -> Result<(), ReadError> {
        if self.root.is_some() {
            return Err(ReadError::Malformed("node after a complete tree".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::Tree;

    fn stats(prediction: f64) -> NodeStats {
        NodeStats {
            prediction,
            ..Default::default()
        }
    }

    #[test]
    fn builder_rebuilds_pre_order() {
        // S0(S1(L1, L2), L3)
        let mut b = PreorderBuilder::new();
        b.push_split(stats(0.0), 0, 0.5).unwrap();
        b.push_split(stats(0.0), 1, 1.0).unwrap();
        b.push_leaf(stats(1.0)).unwrap();
        b.push_leaf(stats(2.0)).unwrap();
        assert!(!b.is_complete());
        b.push_leaf(stats(3.0)).unwrap();
        assert!(b.is_complete());

        let tree = Tree::from_root(b.finish().unwrap());
        let leaves: Vec<f64> = tree
            .in_order()
            .filter(|n| n.is_leaf())
            .map(|n| n.stats.prediction)
            .collect();
        assert_eq!(leaves, [1.0, 2.0, 3.0]);
        assert_eq!(tree.predict_obs(&[0.0, 2.0][..]), 2.0);
    }

    #[test]
    fn builder_caps_depth() {
        // Right spine: every split has a leaf on the left.
        let mut b = PreorderBuilder::new();
        for _ in 0..MAX_TREE_DEPTH {
            b.push_split(stats(0.0), 0, 0.5).unwrap();
            b.push_leaf(stats(1.0)).unwrap();
        }
        assert!(matches!(
            b.push_split(stats(0.0), 0, 0.5),
            Err(ReadError::Malformed(_))
        ));
        b.push_leaf(stats(2.0)).unwrap();
        let tree = Tree::from_root(b.finish().unwrap());
        assert_eq!(tree.depth(), MAX_TREE_DEPTH);
    }

    #[test]
    fn builder_rejects_incomplete_and_overfull() {
        let mut b = PreorderBuilder::new();
        b.push_split(stats(0.0), 0, 0.5).unwrap();
        b.push_leaf(stats(1.0)).unwrap();
        assert!(matches!(b.finish(), Err(ReadError::Malformed(_))));

        let mut b = PreorderBuilder::new();
        b.push_leaf(stats(1.0)).unwrap();
        assert!(matches!(b.push_leaf(stats(2.0)), Err(ReadError::Malformed(_))));
    }
}
