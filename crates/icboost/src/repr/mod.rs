//! Model representation: nodes, trees and the forest.

mod forest;
mod node;
mod tree;

pub use forest::Forest;
pub use node::{Node, NodeKind, NodeStats, SplitNode};
pub use tree::{InOrder, PreOrder, Tree};
