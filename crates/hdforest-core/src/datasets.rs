//! Built-in benchmark graphs.

use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId};

/// A graph with a known ground-truth label per node (enumeration order).
#[derive(Debug, Clone)]
pub struct LabelledGraph {
    pub graph: Graph,
    pub truth: Vec<i64>,
}

/// Zachary's karate club: 34 members, 78 friendships.
const KARATE_EDGES: [(NodeId, NodeId); 78] = [
    (0, 1), (0, 2), (0, 3), (0, 4), (0, 5), (0, 6), (0, 7), (0, 8),
    (0, 10), (0, 11), (0, 12), (0, 13), (0, 17), (0, 19), (0, 21), (0, 31),
    (1, 2), (1, 3), (1, 7), (1, 13), (1, 17), (1, 19), (1, 21), (1, 30),
    (2, 3), (2, 7), (2, 8), (2, 9), (2, 13), (2, 27), (2, 28), (2, 32),
    (3, 7), (3, 12), (3, 13),
    (4, 6), (4, 10),
    (5, 6), (5, 10), (5, 16),
    (6, 16),
    (8, 30), (8, 32), (8, 33),
    (9, 33),
    (13, 33),
    (14, 32), (14, 33),
    (15, 32), (15, 33),
    (18, 32), (18, 33),
    (19, 33),
    (20, 32), (20, 33),
    (22, 32), (22, 33),
    (23, 25), (23, 27), (23, 29), (23, 32), (23, 33),
    (24, 25), (24, 27), (24, 31),
    (25, 31),
    (26, 29), (26, 33),
    (27, 33),
    (28, 31), (28, 33),
    (29, 32), (29, 33),
    (30, 32), (30, 33),
    (31, 32), (31, 33),
    (32, 33),
];

/// Members who followed the instructor (node 0) after the split. Everyone
/// else followed the officer (node 33).
const KARATE_INSTRUCTOR_FACTION: [NodeId; 17] =
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 12, 13, 16, 17, 19, 21];

/// The karate club graph with its two factions as ground truth
/// (0 = instructor, 1 = officer).
///
/// # Errors
///
/// Never fails in practice; the edge table is a simple graph.
pub fn karate_club() -> Result<LabelledGraph> {
    let graph = Graph::from_edges(0..34, KARATE_EDGES)?;
    let truth = graph
        .ids()
        .into_iter()
        .map(|id| i64::from(!KARATE_INSTRUCTOR_FACTION.contains(&id)))
        .collect();
    Ok(LabelledGraph { graph, truth })
}

/// Ring of `n` nodes where node `i` links to `i + 1` and `i + 2` (mod `n`).
///
/// Every node has degree 4, so no node dominates another.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for `n < 5`, where the wrap-around
/// would produce parallel edges.
pub fn ring_lattice(n: NodeId) -> Result<Graph> {
    if n < 5 {
        return Err(Error::invalid_parameter(
            "size",
            format!("ring lattice needs at least 5 nodes, got {n}"),
        ));
    }
    let edges = (0..n).flat_map(|i| [(i, (i + 1) % n), (i, (i + 2) % n)]);
    Graph::from_edges(0..n, edges)
}
