//! Persistence errors.

use thiserror::Error;

/// Errors that can occur while writing a forest.
#[derive(Debug, Error)]
pub enum WriteError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The text format has no representation for an untrained tree.
    #[error("tree {index} is empty and cannot be written in the text format")]
    EmptyTree { index: usize },

    /// A count does not fit its on-disk field.
    #[error("{what} {value} exceeds the format limit")]
    TooLarge { what: &'static str, value: usize },
}

/// Errors that can occur while reading a forest.
///
/// Header errors abort reading. Every other error ends decoding at the tree
/// in which it occurred; see [`ReadReport`](super::ReadReport).
#[derive(Debug, Error)]
pub enum ReadError {
    /// Stream does not start with the model magic.
    #[error("not an icboost model stream")]
    NotAModel,

    /// Stream was written by a newer, incompatible format.
    #[error("unsupported format version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// Stream ended inside a tree.
    #[error("stream truncated after {nodes} nodes of the current tree")]
    Truncated { nodes: usize },

    /// Unknown tag byte.
    #[error("invalid tag {tag:#04x} at record {record}")]
    InvalidTag { tag: u8, record: usize },

    /// Node records do not form a valid tree.
    #[error("malformed tree: {0}")]
    Malformed(String),

    /// Text line could not be parsed.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// I/O error during reading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
