//! Line-oriented text format.
//!
//! One node per line in pre-order. An absent child, and the absent tree
//! after the last one, is the marker line `-1`:
//!
//! ```text
//! S <feature> <threshold> <prediction> <train_loss> <local_optimism> <prob_node> <crt> <n_obs>
//! L <prediction> <train_loss> <local_optimism> <prob_node> <crt> <n_obs>
//! -1
//! -1
//! L ...
//! -1
//! -1
//! -1
//! ```
//!
//! Every leaf line is followed by two markers for its absent children; the
//! forest ends with one more marker. Floats use the shortest representation
//! that parses back to the same value.

use std::io::{BufRead, Write};

use super::error::{ReadError, WriteError};
use super::{PreorderBuilder, ReadReport, check_depth};
use crate::repr::{Forest, NodeKind, NodeStats, Tree};

/// Marker for an absent child or tree.
pub const MARKER: &str = "-1";

// =============================================================================
// Writing
// =============================================================================

/// Write `forest` to `writer`.
///
/// # Errors
///
/// [`WriteError::EmptyTree`] if a tree was never trained: the marker that
/// would represent it also ends the forest.
pub fn write_forest<W: Write>(forest: &Forest, mut writer: W) -> Result<(), WriteError> {
    check_depth(forest)?;
    for (index, tree) in forest.iter().enumerate() {
        if tree.is_empty() {
            return Err(WriteError::EmptyTree { index });
        }
        for node in tree.pre_order() {
            let s = &node.stats;
            match &node.kind {
                NodeKind::Split(split) => write!(writer, "S {} {} ", split.feature, split.threshold)?,
                NodeKind::Leaf => write!(writer, "L ")?,
            }
            writeln!(
                writer,
                "{} {} {} {} {} {}",
                s.prediction, s.train_loss, s.local_optimism, s.prob_node, s.crt, s.n_obs
            )?;
            if node.is_leaf() {
                writeln!(writer, "{MARKER}\n{MARKER}")?;
            }
        }
    }
    writeln!(writer, "{MARKER}")?;
    writer.flush()?;
    Ok(())
}

/// Encode `forest` as a string.
pub fn to_string(forest: &Forest) -> Result<String, WriteError> {
    let mut buf = Vec::new();
    write_forest(forest, &mut buf)?;
    // Only ASCII is ever written.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// =============================================================================
// Reading
// =============================================================================

/// Parsed node line.
enum Line {
    Marker,
    Leaf(NodeStats),
    Split {
        feature: usize,
        threshold: f64,
        stats: NodeStats,
    },
}

/// Line source that counts consumed lines and skips blank ones.
struct Lines<R> {
    inner: std::io::Lines<R>,
    line: usize,
}

impl<R: BufRead> Lines<R> {
    fn next_line(&mut self) -> Result<Option<(usize, String)>, ReadError> {
        for text in self.inner.by_ref() {
            let text = text?;
            self.line += 1;
            if !text.trim().is_empty() {
                return Ok(Some((self.line, text)));
            }
        }
        Ok(None)
    }
}

/// Read a forest from `reader`.
///
/// Decoding stops at the first malformed or truncated tree; the trees before
/// it are returned and the reason is recorded in [`ReadReport::stopped_by`].
/// A stream without the final marker is reported as truncated.
pub fn read_forest<R: BufRead>(reader: R) -> (Forest, ReadReport) {
    let mut lines = Lines {
        inner: reader.lines(),
        line: 0,
    };
    let mut report = ReadReport::default();
    let mut trees = Vec::new();
    loop {
        let result = read_tree(&mut lines, &mut report);
        report.records = lines.line;
        match result {
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
    (Forest::from_trees(trees), report)
}

/// Decode a forest from a string.
pub fn from_str(text: &str) -> (Forest, ReadReport) {
    read_forest(text.as_bytes())
}

fn read_tree<R: BufRead>(
    lines: &mut Lines<R>,
    report: &mut ReadReport,
) -> Result<Option<Tree>, ReadError> {
    let mut builder = PreorderBuilder::new();
    let mut nodes = 0;
    while !builder.is_complete() {
        let Some((line, text)) = lines.next_line()? else {
            return Err(ReadError::Truncated { nodes });
        };
        match parse_line(line, &text)? {
            Line::Marker if nodes == 0 => return Ok(None),
            Line::Marker => {
                return Err(ReadError::Malformed(format!(
                    "line {line}: split without a child"
                )));
            }
            Line::Split {
                feature,
                threshold,
                stats,
            } => {
                builder.push_split(stats, feature, threshold)?;
            }
            Line::Leaf(stats) => {
                for _ in 0..2 {
                    match lines.next_line()? {
                        None => return Err(ReadError::Truncated { nodes }),
                        Some((_, text)) if text.trim() == MARKER => {}
                        Some((line, _)) => {
                            return Err(ReadError::Parse {
                                line,
                                message: format!("expected `{MARKER}` after a leaf"),
                            });
                        }
                    }
                }
                builder.push_leaf(stats)?;
            }
        }
        nodes += 1;
        report.nodes += 1;
    }
    Ok(Some(Tree::from_root(builder.finish()?)))
}

fn parse_line(line: usize, text: &str) -> Result<Line, ReadError> {
    let err = |message: String| ReadError::Parse { line, message };
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let stats_at = |offset: usize| -> Result<NodeStats, ReadError> {
        let float = |i: usize| {
            tokens[offset + i]
                .parse::<f64>()
                .map_err(|e| err(format!("field {}: {e}", offset + i)))
        };
        Ok(NodeStats {
            prediction: float(0)?,
            train_loss: float(1)?,
            local_optimism: float(2)?,
            prob_node: float(3)?,
            crt: float(4)?,
            n_obs: tokens[offset + 5]
                .parse()
                .map_err(|e| err(format!("field {}: {e}", offset + 5)))?,
        })
    };

    match tokens.as_slice() {
        [marker] if *marker == MARKER => Ok(Line::Marker),
        ["L", rest @ ..] if rest.len() == 6 => Ok(Line::Leaf(stats_at(1)?)),
        ["S", feature, threshold, rest @ ..] if rest.len() == 6 => Ok(Line::Split {
            feature: feature
                .parse()
                .map_err(|e| err(format!("feature: {e}")))?,
            threshold: threshold
                .parse()
                .map_err(|e| err(format!("threshold: {e}")))?,
            stats: stats_at(3)?,
        }),
        _ => Err(err(format!("unrecognized node line `{text}`"))),
    }
}
