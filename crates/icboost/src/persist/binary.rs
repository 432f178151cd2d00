//! Binary forest format.
//!
//! # Layout
//!
//! ```text
//! Header (8 bytes)
//!   0  4  Magic ("ICBT")
//!   4  1  Version major
//!   5  1  Version minor
//!   6  2  Reserved
//! Per tree
//!   1     TREE tag
//!   4     Node count (u32)
//!   ...   Node records in pre-order
//! End
//!   1     END tag
//!
//! Node record
//!   1     LEAF or SPLIT tag
//!   4     Feature (u32)         split only
//!   8     Threshold (f64)       split only
//!   8×5   prediction, train_loss, local_optimism, prob_node, crt (f64)
//!   8     n_obs (u64)
//! ```
//!
//! All integers and floats are little-endian. Floats are stored bit-exact,
//! so a round trip reproduces predictions exactly.

use std::io::{self, Read, Write};

use super::error::{ReadError, WriteError};
use super::{PreorderBuilder, ReadReport, check_depth};
use crate::repr::{Forest, Node, NodeKind, NodeStats, Tree};

// ============================================================================
// Constants
// ============================================================================

/// Magic bytes identifying an icboost forest stream.
pub const MAGIC: &[u8; 4] = b"ICBT";

/// Current format version (major).
pub const VERSION_MAJOR: u8 = 1;

/// Current format version (minor).
pub const VERSION_MINOR: u8 = 0;

/// Size of the format header in bytes.
pub const HEADER_SIZE: usize = 8;

const TAG_TREE: u8 = b'T';
const TAG_END: u8 = b'E';
const TAG_LEAF: u8 = b'L';
const TAG_SPLIT: u8 = b'S';

// ============================================================================
// Header
// ============================================================================

/// Stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHeader {
    pub version_major: u8,
    pub version_minor: u8,
}

impl FormatHeader {
    /// Header of the current version.
    pub fn current() -> Self {
        Self {
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf
    }

    /// Parse and check compatibility.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, ReadError> {
        if &buf[0..4] != MAGIC {
            return Err(ReadError::NotAModel);
        }
        let header = Self {
            version_major: buf[4],
            version_minor: buf[5],
        };
        if header.version_major != VERSION_MAJOR {
            return Err(ReadError::UnsupportedVersion {
                major: header.version_major,
                minor: header.version_minor,
            });
        }
        Ok(header)
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Write `forest` to `writer`.
pub fn write_forest<W: Write>(forest: &Forest, mut writer: W) -> Result<(), WriteError> {
    check_depth(forest)?;
    writer.write_all(&FormatHeader::current().to_bytes())?;

    let mut record = Vec::with_capacity(64);
    for tree in forest {
        let n_nodes = tree.n_nodes();
        let count = u32::try_from(n_nodes).map_err(|_| WriteError::TooLarge {
            what: "node count",
            value: n_nodes,
        })?;
        writer.write_all(&[TAG_TREE])?;
        writer.write_all(&count.to_le_bytes())?;

        for node in tree.pre_order() {
            record.clear();
            encode_node(node, &mut record)?;
            writer.write_all(&record)?;
        }
    }

    writer.write_all(&[TAG_END])?;
    writer.flush()?;
    Ok(())
}

/// Encode `forest` into a byte vector.
pub fn to_bytes(forest: &Forest) -> Result<Vec<u8>, WriteError> {
    let mut buf = Vec::new();
    write_forest(forest, &mut buf)?;
    Ok(buf)
}

fn encode_node(node: &Node, buf: &mut Vec<u8>) -> Result<(), WriteError> {
    match &node.kind {
        NodeKind::Leaf => buf.push(TAG_LEAF),
        NodeKind::Split(split) => {
            let feature = u32::try_from(split.feature).map_err(|_| WriteError::TooLarge {
                what: "feature index",
                value: split.feature,
            })?;
            buf.push(TAG_SPLIT);
            buf.extend_from_slice(&feature.to_le_bytes());
            buf.extend_from_slice(&split.threshold.to_le_bytes());
        }
    }
    let s = &node.stats;
    for value in [s.prediction, s.train_loss, s.local_optimism, s.prob_node, s.crt] {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    buf.extend_from_slice(&(s.n_obs as u64).to_le_bytes());
    Ok(())
}

// ============================================================================
// Reading
// ============================================================================

/// Read a forest from `reader`.
///
/// # Errors
///
/// Only a missing or incompatible header is an error. Decoding stops at the
/// first malformed or truncated tree; the trees before it are returned and
/// the reason is recorded in [`ReadReport::stopped_by`].
pub fn read_forest<R: Read>(mut reader: R) -> Result<(Forest, ReadReport), ReadError> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ReadError::NotAModel,
        _ => ReadError::Io(e),
    })?;
    FormatHeader::from_bytes(&header)?;

    let mut report = ReadReport::default();
    let mut trees = Vec::new();
    loop {
        match read_tree(&mut reader, &mut report) {
            Ok(Some(tree)) => {
                trees.push(tree);
                report.trees += 1;
            }
            Ok(None) => break,
            Err(err) => {
                report.stop(err);
                break;
            }
        }
    }
    Ok((Forest::from_trees(trees), report))
}

/// Decode a forest from bytes.
pub fn from_bytes(bytes: &[u8]) -> Result<(Forest, ReadReport), ReadError> {
    read_forest(bytes)
}

/// Next tree, or `None` at the END tag.
fn read_tree<R: Read>(reader: &mut R, report: &mut ReadReport) -> Result<Option<Tree>, ReadError> {
    let [tag] = read_array::<_, 1>(reader, 0)?;
    report.records += 1;
    match tag {
        TAG_END => return Ok(None),
        TAG_TREE => {}
        tag => {
            return Err(ReadError::InvalidTag {
                tag,
                record: report.records,
            });
        }
    }
    let count = u32::from_le_bytes(read_array(reader, 0)?) as usize;
    if count == 0 {
        return Ok(Some(Tree::new()));
    }

    let mut builder = PreorderBuilder::new();
    for read in 0..count {
        let [tag] = read_array::<_, 1>(reader, read)?;
        report.records += 1;
        match tag {
            TAG_LEAF => {
                let stats = read_stats(reader, read)?;
                report.nodes += 1;
                builder.push_leaf(stats)?;
            }
            TAG_SPLIT => {
                let feature = u32::from_le_bytes(read_array(reader, read)?) as usize;
                let threshold = f64::from_le_bytes(read_array(reader, read)?);
                let stats = read_stats(reader, read)?;
                report.nodes += 1;
                builder.push_split(stats, feature, threshold)?;
            }
            tag => {
                return Err(ReadError::InvalidTag {
                    tag,
                    record: report.records,
                });
            }
        }
    }
    Ok(Some(Tree::from_root(builder.finish()?)))
}

fn read_stats<R: Read>(reader: &mut R, nodes: usize) -> Result<NodeStats, ReadError> {
    let mut values = [0.0; 5];
    for value in &mut values {
        *value = f64::from_le_bytes(read_array(reader, nodes)?);
    }
    let n_obs = u64::from_le_bytes(read_array(reader, nodes)?);
    let n_obs = usize::try_from(n_obs)
        .map_err(|_| ReadError::Malformed(format!("observation count {n_obs} overflows")))?;
    let [prediction, train_loss, local_optimism, prob_node, crt] = values;
    Ok(NodeStats {
        prediction,
        train_loss,
        local_optimism,
        prob_node,
        crt,
        n_obs,
    })
}

/// Read exactly `N` bytes; end of stream maps to `Truncated { nodes }`.
fn read_array<R: Read, const N: usize>(reader: &mut R, nodes: usize) -> Result<[u8; N], ReadError> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ReadError::Truncated { nodes },
        _ => ReadError::Io(e),
    })?;
    Ok(buf)
}
