//! Input graph ingestion and validation.
//!
//! # Overview
//!
//! Every hdforest run starts from a simple undirected [`Graph`]: no
//! self-loops, no parallel edges, at least one node. Validation happens once,
//! here, so the pipeline phases can rely on those properties without
//! re-checking them.
//!
//! ## Node order
//!
//! Nodes are inserted in a fixed order (explicitly listed nodes first, then
//! nodes in order of first appearance in the edge list). `NodeIndex` values
//! follow that order and every phase enumerates nodes by index, so the
//! enumeration order is part of the input, not an accident of hashing.
//!
//! ## Content hash
//!
//! [`Graph::content_hash`] is a BLAKE3 hash over the sorted node ids and the
//! sorted, orientation-normalized edge list. Two graphs with the same hash
//! have the same node set and edge set regardless of input line order.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};
use tracing::instrument;

use crate::error::{Error, GraphDefect, Result};

/// External node identifier as supplied by the caller.
pub type NodeId = u32;

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// A validated simple undirected graph.
///
/// Node weights are the external [`NodeId`]s; `node_map` is the reverse
/// lookup from id to petgraph `NodeIndex`. Fields are private so every
/// `Graph` has passed the checks in [`Graph::from_edges`]:
///
/// ```compile_fail
/// use hdforest_core::Graph;
/// let mut graph = Graph::from_edge_list(&[(0, 1)]).unwrap();
/// let a = graph.node_index(0).unwrap();
/// graph.graph.add_edge(a, a, ());
/// ```
#[derive(Debug, Clone)]
pub struct Graph {
    /// Undirected graph: nodes = external ids, edges = adjacency.
    graph: UnGraph<NodeId, ()>,
    /// Mapping from external id to petgraph `NodeIndex`.
    node_map: HashMap<NodeId, NodeIndex>,
    /// BLAKE3 content hash of the node and edge sets.
    content_hash: String,
}

impl Graph {
    /// Build a [`Graph`] from an explicit node list and an edge list.
    ///
    /// Nodes referenced only by edges are added automatically. Repeating a
    /// node id in `nodes` is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGraph`] when the result would have no nodes,
    /// when an edge is a self-loop, or when an unordered pair appears twice.
    #[instrument(skip_all)]
    pub fn from_edges<N, E>(nodes: N, edges: E) -> Result<Self>
    where
        N: IntoIterator<Item = NodeId>,
        E: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let mut graph = UnGraph::<NodeId, ()>::default();
        let mut node_map: HashMap<NodeId, NodeIndex> = HashMap::new();

        for id in nodes {
            node_map
                .entry(id)
                .or_insert_with(|| graph.add_node(id));
        }

        let mut seen: HashSet<(NodeId, NodeId)> = HashSet::new();
        for (a, b) in edges {
            if a == b {
                return Err(Error::InvalidGraph(GraphDefect::SelfLoop { node: a }));
            }
            let key = if a < b { (a, b) } else { (b, a) };
            if !seen.insert(key) {
                return Err(Error::InvalidGraph(GraphDefect::ParallelEdge { a: key.0, b: key.1 }));
            }

            let ia = *node_map.entry(a).or_insert_with(|| graph.add_node(a));
            let ib = *node_map.entry(b).or_insert_with(|| graph.add_node(b));
            graph.add_edge(ia, ib, ());
        }

        if graph.node_count() == 0 {
            return Err(Error::InvalidGraph(GraphDefect::Empty));
        }

        let content_hash = compute_content_hash(&graph, seen);

        Ok(Self {
            graph,
            node_map,
            content_hash,
        })
    }

    /// Build a [`Graph`] from edges alone.
    ///
    /// # Errors
    ///
    /// Same as [`Graph::from_edges`].
    pub fn from_edge_list(edges: &[(NodeId, NodeId)]) -> Result<Self> {
        Self::from_edges(std::iter::empty(), edges.iter().copied())
    }

    /// Parse a plain-text edge list.
    ///
    /// One entry per line: `u v` (whitespace or comma separated) declares an
    /// edge, a lone `u` declares a node. Text after `#` and blank lines are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed lines and
    /// [`Error::InvalidGraph`] if the parsed graph is not simple.
    pub fn parse_edge_list(text: &str) -> Result<Self> {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        for (line_no, raw) in text.lines().enumerate() {
            let tokens = tokenize(raw);
            match tokens.as_slice() {
                [] => {}
                [single] => nodes.push(parse_node_id(single, line_no + 1)?),
                [a, b] => edges.push((
                    parse_node_id(a, line_no + 1)?,
                    parse_node_id(b, line_no + 1)?,
                )),
                _ => {
                    return Err(Error::parse(
                        line_no + 1,
                        format!("expected 1 or 2 node ids, found {}", tokens.len()),
                    ));
                }
            }
        }

        Self::from_edges(nodes, edges)
    }

    /// Return the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for an external id.
    #[must_use]
    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_map.get(&id).copied()
    }

    /// Return the external id of a node.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not belong to this graph.
    #[must_use]
    pub fn node_id(&self, idx: NodeIndex) -> NodeId {
        self.graph[idx]
    }

    /// Return all node indices in enumeration order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    /// Return the external ids in enumeration order.
    #[must_use]
    pub fn ids(&self) -> Vec<NodeId> {
        self.graph.node_weights().copied().collect()
    }

    /// Return the neighbours of a node.
    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    /// Return the degree of a node.
    #[must_use]
    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.neighbors(idx).count()
    }

    /// Return every undirected edge once, as an index pair.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.graph.raw_edges().iter().map(|e| (e.source(), e.target()))
    }

    /// Return every undirected edge once, as an id pair.
    #[must_use]
    pub fn edge_ids(&self) -> Vec<(NodeId, NodeId)> {
        self.edges()
            .map(|(a, b)| (self.graph[a], self.graph[b]))
            .collect()
    }

    /// Whether `a` and `b` are adjacent.
    #[must_use]
    pub fn contains_edge(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.graph.contains_edge(a, b)
    }

    /// BLAKE3 hash of the node and edge sets (`"blake3:<hex>"`).
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Return the degree table, indexed by `NodeIndex::index()`.
    #[must_use]
    pub fn degrees(&self) -> Vec<usize> {
        self.graph
            .node_indices()
            .map(|idx| self.degree(idx))
            .collect()
    }
}

/// Parse a ground-truth label file: one integer label per line, in node
/// enumeration order. Text after `#` and blank lines are ignored.
///
/// # Errors
///
/// Returns [`Error::Parse`] for lines that are not a single integer.
pub fn parse_labels(text: &str) -> Result<Vec<i64>> {
    let mut labels = Vec::new();
    for (line_no, raw) in text.lines().enumerate() {
        match tokenize(raw).as_slice() {
            [] => {}
            [label] => labels.push(label.parse::<i64>().map_err(|e| {
                Error::parse(line_no + 1, format!("invalid label `{label}`: {e}"))
            })?),
            tokens => {
                return Err(Error::parse(
                    line_no + 1,
                    format!("expected one label, found {}", tokens.len()),
                ));
            }
        }
    }
    Ok(labels)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Split a line into tokens, dropping comments.
pub(crate) fn tokenize(line: &str) -> Vec<&str> {
    let content = line.split('#').next().unwrap_or_default();
    content
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_node_id(token: &str, line: usize) -> Result<NodeId> {
    token
        .parse::<NodeId>()
        .map_err(|e| Error::parse(line, format!("invalid node id `{token}`: {e}")))
}

/// BLAKE3 over sorted node ids followed by sorted normalized edges.
fn compute_content_hash(graph: &UnGraph<NodeId, ()>, edges: HashSet<(NodeId, NodeId)>) -> String {
    let mut ids: Vec<NodeId> = graph.node_weights().copied().collect();
    ids.sort_unstable();
    let mut edges: Vec<(NodeId, NodeId)> = edges.into_iter().collect();
    edges.sort_unstable();

    let mut hasher = blake3::Hasher::new();
    for id in ids {
        hasher.update(&id.to_le_bytes());
    }
    hasher.update(b"\x00");
    for (a, b) in edges {
        hasher.update(&a.to_le_bytes());
        hasher.update(&b.to_le_bytes());
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
