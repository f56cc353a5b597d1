//! Error model shared by every hdforest crate.
//!
//! Structural problems with the input (or with a structure the pipeline
//! built from it) are fatal and always name the offending element. Numeric
//! degeneracies are never surfaced here; each phase resolves them with its
//! own documented fallback.

use std::fmt;

use crate::graph::NodeId;

/// Result alias for hdforest library code.
pub type Result<T> = std::result::Result<T, Error>;

/// The reason an input graph was rejected before any hierarchy was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphDefect {
    /// The graph has no nodes at all.
    Empty,
    /// An edge joins a node to itself.
    SelfLoop { node: NodeId },
    /// The same unordered pair appears more than once.
    ParallelEdge { a: NodeId, b: NodeId },
}

impl fmt::Display for GraphDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "graph has no nodes"),
            Self::SelfLoop { node } => write!(f, "self-loop on node {node}"),
            Self::ParallelEdge { a, b } => write!(f, "parallel edge between {a} and {b}"),
        }
    }
}

/// Errors returned by ingestion, configuration checks and the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The input is not a simple, non-empty undirected graph.
    #[error("invalid graph: {0}")]
    InvalidGraph(GraphDefect),

    /// A node never received a forest root. Indicates a hierarchy builder
    /// defect, not bad input.
    #[error("node {node} has no path to any leader in the degree hierarchy")]
    UnreachableNode { node: NodeId },

    /// Text input (edge list, point file, label file) could not be parsed.
    #[error("parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// A caller-supplied option is out of range for the given input.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl Error {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidGraph(_) => ErrorCode::InvalidGraph,
            Self::UnreachableNode { .. } => ErrorCode::UnreachableNode,
            Self::Parse { .. } => ErrorCode::ParseFailure,
            Self::InvalidParameter { .. } => ErrorCode::InvalidParameter,
        }
    }

    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidGraph,
    ParseFailure,
    InvalidParameter,
    UnreachableNode,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidGraph => "E1001",
            Self::ParseFailure => "E1002",
            Self::InvalidParameter => "E1003",
            Self::UnreachableNode => "E2001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidGraph => "Input graph is not simple or is empty",
            Self::ParseFailure => "Input file could not be parsed",
            Self::InvalidParameter => "Parameter out of range",
            Self::UnreachableNode => "Degree hierarchy left a node without a root",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidGraph => {
                Some("Remove self-loops and duplicate edges; supply at least one node.")
            }
            Self::ParseFailure => Some("Use one `u v` pair (or one point) per line; `#` starts a comment."),
            Self::InvalidParameter => None,
            Self::UnreachableNode => Some("This is a bug. Report it with the input graph attached."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorCode, GraphDefect};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::InvalidGraph,
            ErrorCode::ParseFailure,
            ErrorCode::InvalidParameter,
            ErrorCode::UnreachableNode,
        ];
        let codes: HashSet<&str> = all.iter().map(|c| c.code()).collect();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn invalid_graph_message_names_offender() {
        let err = Error::InvalidGraph(GraphDefect::ParallelEdge { a: 3, b: 7 });
        assert_eq!(err.to_string(), "invalid graph: parallel edge between 3 and 7");
        assert_eq!(err.code(), ErrorCode::InvalidGraph);
    }

    #[test]
    fn unreachable_node_maps_to_its_own_code() {
        let err = Error::UnreachableNode { node: 12 };
        assert_eq!(err.code().code(), "E2001");
        assert!(err.to_string().contains("12"));
    }
}
