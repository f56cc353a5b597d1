//! Secondary hierarchy among leaders.
//!
//! # Overview
//!
//! Each leader looks outward through the undirected graph, breadth first,
//! for the nearest *other* leader of strictly greater degree. The hop count
//! to that leader is the leader's effective path length, later used by the
//! composite score: a leader far from anything bigger than itself is a good
//! community center.
//!
//! Within one BFS level, neighbours are expanded in descending degree order
//! (ties by enumeration order). This only decides which of several equally
//! near dominant leaders is returned.
//!
//! ## Fallbacks
//!
//! - A leader with no dominant leader anywhere (the global maxima) gets the
//!   largest distance found by any other leader, or 2 when no leader found
//!   one.
//! - When every leader has the same degree nobody can dominate anybody, so
//!   leaders receive synthetic distances 2, 3, 4, … in enumeration order.

#![allow(clippy::module_name_repetitions)]

use std::cmp::Reverse;
use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use hdforest_core::Graph;
use petgraph::graph::NodeIndex;
use tracing::{debug, instrument, warn};

/// Distance used for unresolved leaders when no leader resolved at all.
const FALLBACK_DISTANCE: u32 = 2;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where a leader points in the leader hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderLink {
    pub leader: NodeIndex,
    /// Nearest dominant leader, or `leader` itself when there is none.
    pub target: NodeIndex,
    /// Effective path length after fallbacks are applied.
    pub distance: u32,
    /// Whether `target` was found by the search (as opposed to a fallback).
    pub resolved: bool,
}

/// How leader distances were finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMode {
    /// Searched distances, with unresolved leaders filled in.
    Searched,
    /// All leaders share one degree; distances are synthetic.
    Synthetic,
}

/// Leader links for one invocation, plus a per-node lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderHierarchy {
    links: Vec<LeaderLink>,
    position: Vec<Option<usize>>,
    mode: DistanceMode,
}

impl LeaderHierarchy {
    /// Resolve every leader's nearest dominant leader in `graph`.
    ///
    /// `leaders` must be in enumeration order; `degrees` is indexed by
    /// `NodeIndex::index()`.
    #[must_use]
    #[instrument(skip_all, fields(leaders = leaders.len()))]
    pub fn resolve(graph: &Graph, degrees: &[usize], leaders: &[NodeIndex]) -> Self {
        let n = graph.node_count();
        let uniform_degree = leaders
            .windows(2)
            .all(|pair| degrees[pair[0].index()] == degrees[pair[1].index()]);

        // Equal degrees leave nothing to search for.
        let (links, mode) = if uniform_degree {
            if leaders.len() > 1 {
                warn!(
                    leaders = leaders.len(),
                    degree = ?leaders.first().map(|l| degrees[l.index()]),
                    "all leaders share one degree, assigning synthetic distances"
                );
            }
            let links = leaders
                .iter()
                .zip(FALLBACK_DISTANCE..)
                .map(|(&leader, distance)| LeaderLink {
                    leader,
                    target: leader,
                    distance,
                    resolved: false,
                })
                .collect();
            (links, DistanceMode::Synthetic)
        } else {
            let mut is_leader = FixedBitSet::with_capacity(n);
            for leader in leaders {
                is_leader.insert(leader.index());
            }
            let found: Vec<Option<(NodeIndex, u32)>> = leaders
                .iter()
                .map(|&leader| nearest_dominant_leader(graph, degrees, &is_leader, leader))
                .collect();

            let fill = found
                .iter()
                .flatten()
                .map(|&(_, distance)| distance)
                .max()
                .unwrap_or(FALLBACK_DISTANCE);
            let links: Vec<LeaderLink> = leaders
                .iter()
                .zip(&found)
                .map(|(&leader, hit)| match *hit {
                    Some((target, distance)) => LeaderLink {
                        leader,
                        target,
                        distance,
                        resolved: true,
                    },
                    None => LeaderLink {
                        leader,
                        target: leader,
                        distance: fill,
                        resolved: false,
                    },
                })
                .collect();
            let unresolved = links.iter().filter(|l| !l.resolved).count();
            debug!(unresolved, fill, "filled distances of top leaders");
            (links, DistanceMode::Searched)
        };

        let mut position = vec![None; n];
        for (i, link) in links.iter().enumerate() {
            position[link.leader.index()] = Some(i);
        }

        Self {
            links,
            position,
            mode,
        }
    }

    /// Links in leader enumeration order.
    #[must_use]
    pub fn links(&self) -> &[LeaderLink] {
        &self.links
    }

    /// The link of `idx`, or `None` if `idx` is not a leader.
    #[must_use]
    pub fn link(&self, idx: NodeIndex) -> Option<&LeaderLink> {
        self.position
            .get(idx.index())
            .copied()
            .flatten()
            .map(|i| &self.links[i])
    }

    #[must_use]
    pub fn is_leader(&self, idx: NodeIndex) -> bool {
        self.link(idx).is_some()
    }

    /// Effective path length: the leader distance for leaders, 1 otherwise.
    #[must_use]
    pub fn path_length(&self, idx: NodeIndex) -> u32 {
        self.link(idx).map_or(1, |link| link.distance)
    }

    #[must_use]
    pub fn leader_count(&self) -> usize {
        self.links.len()
    }

    /// Leaders whose search found no dominant leader.
    #[must_use]
    pub fn unresolved_count(&self) -> usize {
        self.links.iter().filter(|l| !l.resolved).count()
    }

    #[must_use]
    pub const fn mode(&self) -> DistanceMode {
        self.mode
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// BFS from `source` for the first discovered leader with a strictly larger
/// degree. Returns that leader and its hop distance.
fn nearest_dominant_leader(
    graph: &Graph,
    degrees: &[usize],
    is_leader: &FixedBitSet,
    source: NodeIndex,
) -> Option<(NodeIndex, u32)> {
    let own = degrees[source.index()];
    let mut seen = FixedBitSet::with_capacity(graph.node_count());
    seen.insert(source.index());

    let mut queue = VecDeque::from([(source, 0u32)]);
    let mut frontier: Vec<NodeIndex> = Vec::new();

    while let Some((node, distance)) = queue.pop_front() {
        frontier.clear();
        frontier.extend(graph.neighbors(node).filter(|w| !seen.contains(w.index())));
        frontier.sort_by_key(|w| (Reverse(degrees[w.index()]), w.index()));

        for &next in &frontier {
            seen.insert(next.index());
            if is_leader.contains(next.index()) && degrees[next.index()] > own {
                return Some((next, distance + 1));
            }
            queue.push_back((next, distance + 1));
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
