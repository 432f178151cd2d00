//! Schema types for JSON export.
//!
//! The schema is independent of the runtime types so it can evolve on its
//! own. Trees are stored as a flat node array in pre-order with explicit
//! child indices, which keeps the JSON shallow regardless of tree depth.
//!
//! Unlike the binary and text readers, JSON decoding is all or nothing.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use super::error::{ReadError, WriteError};
use super::{MAX_TREE_DEPTH, check_depth};
use crate::repr::{Forest, Node, NodeKind, NodeStats, Tree};

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Forest schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestSchema {
    /// Schema version.
    pub version: u32,
    /// Trees in boosting-round order.
    pub trees: Vec<TreeSchema>,
}

/// Tree schema. An untrained tree has no nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TreeSchema {
    /// Nodes in pre-order; the root is node 0.
    pub nodes: Vec<NodeSchema>,
}

/// Node schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSchema {
    pub prediction: f64,
    pub train_loss: f64,
    pub local_optimism: f64,
    pub prob_node: f64,
    pub crt: f64,
    pub n_obs: usize,
    /// Present for split nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitSchema>,
}

/// Split part of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitSchema {
    pub feature: usize,
    pub threshold: f64,
    /// Index of the left child in [`TreeSchema::nodes`].
    pub left: u32,
    /// Index of the right child in [`TreeSchema::nodes`].
    pub right: u32,
}

// =============================================================================
// Runtime -> schema
// =============================================================================

impl NodeSchema {
    fn new(stats: &NodeStats, split: Option<SplitSchema>) -> Self {
        Self {
            prediction: stats.prediction,
            train_loss: stats.train_loss,
            local_optimism: stats.local_optimism,
            prob_node: stats.prob_node,
            crt: stats.crt,
            n_obs: stats.n_obs,
            split,
        }
    }

    fn stats(&self) -> NodeStats {
        NodeStats {
            prediction: self.prediction,
            train_loss: self.train_loss,
            local_optimism: self.local_optimism,
            prob_node: self.prob_node,
            crt: self.crt,
            n_obs: self.n_obs,
        }
    }
}

impl From<&Tree> for TreeSchema {
    fn from(tree: &Tree) -> Self {
        let mut nodes: Vec<NodeSchema> = Vec::with_capacity(tree.n_nodes());
        // Parent slot to patch with the index of the node being emitted.
        let mut stack: Vec<(&Node, Option<(usize, bool)>)> =
            tree.root().map(|root| (root, None)).into_iter().collect();

        while let Some((node, parent)) = stack.pop() {
            let index = nodes.len();
            if let Some((parent, is_left)) = parent {
                if let Some(split) = nodes[parent].split.as_mut() {
                    if is_left {
                        split.left = index as u32;
                    } else {
                        split.right = index as u32;
                    }
                }
            }
            match &node.kind {
                NodeKind::Leaf => nodes.push(NodeSchema::new(&node.stats, None)),
                NodeKind::Split(split) => {
                    let schema = SplitSchema {
                        feature: split.feature,
                        threshold: split.threshold,
                        left: 0,
                        right: 0,
                    };
                    nodes.push(NodeSchema::new(&node.stats, Some(schema)));
                    stack.push((&split.right, Some((index, false))));
                    stack.push((&split.left, Some((index, true))));
                }
            }
        }
        Self { nodes }
    }
}

impl From<&Forest> for ForestSchema {
    fn from(forest: &Forest) -> Self {
        Self {
            version: SCHEMA_VERSION,
            trees: forest.iter().map(TreeSchema::from).collect(),
        }
    }
}

// =============================================================================
// Schema -> runtime
// =============================================================================

impl TryFrom<TreeSchema> for Tree {
    type Error = ReadError;

    /// Children must come after their parent and every non-root node must be
    /// referenced exactly once.
    fn try_from(schema: TreeSchema) -> Result<Self, Self::Error> {
        let n = schema.nodes.len();
        if n == 0 {
            return Ok(Tree::new());
        }
        // Depth of each node from its first referencing parent; a node
        // referenced twice or never is rejected below.
        let mut depths = vec![0usize; n];
        for (index, node) in schema.nodes.iter().enumerate() {
            let Some(split) = node.split else { continue };
            for child in [split.left as usize, split.right as usize] {
                if child > index && child < n {
                    depths[child] = depths[index] + 1;
                    if depths[child] > MAX_TREE_DEPTH {
                        return Err(ReadError::Malformed(format!(
                            "tree deeper than {MAX_TREE_DEPTH} levels"
                        )));
                    }
                }
            }
        }
        // Build bottom-up so each child exists before its parent.
        let mut built: Vec<Option<Node>> = Vec::with_capacity(n);
        built.resize_with(n, || None);
        for (index, node) in schema.nodes.iter().enumerate().rev() {
            let stats = node.stats();
            let node = match node.split {
                None => Node::leaf(stats),
                Some(split) => {
                    let mut take = |child: u32| {
                        let child = child as usize;
                        if child <= index || child >= n {
                            return Err(ReadError::Malformed(format!(
                                "node {index} has invalid child {child}"
                            )));
                        }
                        built[child].take().ok_or_else(|| {
                            ReadError::Malformed(format!("node {child} has more than one parent"))
                        })
                    };
                    let left = take(split.left)?;
                    let right = take(split.right)?;
                    Node::split(stats, split.feature, split.threshold, left, right)
                }
            };
            built[index] = Some(node);
        }
        let mut built = built.into_iter();
        let root = built.next().flatten();
        if built.any(|node| node.is_some()) {
            return Err(ReadError::Malformed("unreachable nodes".into()));
        }
        root.map(Tree::from_root)
            .ok_or_else(|| ReadError::Malformed("missing root".into()))
    }
}

impl TryFrom<ForestSchema> for Forest {
    type Error = ReadError;

    fn try_from(schema: ForestSchema) -> Result<Self, Self::Error> {
        if schema.version > SCHEMA_VERSION {
            return Err(ReadError::Malformed(format!(
                "unsupported schema version {}",
                schema.version
            )));
        }
        schema.trees.into_iter().map(Tree::try_from).collect()
    }
}

// =============================================================================
// JSON I/O
// =============================================================================

/// Write `forest` as pretty-printed JSON.
pub fn write_json<W: Write>(forest: &Forest, writer: W) -> Result<(), WriteError> {
    check_depth(forest)?;
    serde_json::to_writer_pretty(writer, &ForestSchema::from(forest))?;
    Ok(())
}

/// Encode `forest` as a JSON string.
pub fn to_json_string(forest: &Forest) -> Result<String, WriteError> {
    check_depth(forest)?;
    Ok(serde_json::to_string_pretty(&ForestSchema::from(forest))?)
}

/// Read a forest from JSON.
pub fn read_json<R: Read>(reader: R) -> Result<Forest, ReadError> {
    let schema: ForestSchema = serde_json::from_reader(reader)?;
    Forest::try_from(schema)
}

/// Decode a forest from a JSON string.
pub fn from_json_str(json: &str) -> Result<Forest, ReadError> {
    let schema: ForestSchema = serde_json::from_str(json)?;
    Forest::try_from(schema)
}
