use thiserror::Error;

use crate::side::Side;

/// Errors surfaced by graph mutation operators.
///
/// Mutators leave the graph in its pre-call state when they return an error.
/// Duplicate edges are not an error: edge creation returns the existing edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node {0} is not in the graph")]
    MissingNode(i64),

    #[error("no edge connects {0} and {1}")]
    MissingEdge(Side, Side),

    #[error("node id {0} is already in use")]
    DuplicateId(i64),

    #[error("offset {offset} is out of range for node {node} of length {len}")]
    OffsetOutOfRange { node: i64, offset: usize, len: usize },

    #[error("nodes do not form a simple linear component: {0}")]
    NotSimple(String),

    #[error("node id {0} would not be strictly positive")]
    InvalidId(i64),

    #[error("graph is not orientable here: {0}")]
    InvalidOrientation(String),

    #[error("internal consistency check failed: {0}")]
    InvariantBroken(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl From<std::io::Error> for GraphError {
    fn from(e: std::io::Error) -> Self {
        GraphError::Io(e.to_string())
    }
}
