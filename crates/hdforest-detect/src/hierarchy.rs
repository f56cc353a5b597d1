//! Degree hierarchy DAG.
//!
//! # Overview
//!
//! Every undirected edge is either dropped or oriented from the endpoint
//! with the smaller degree towards the one with the larger degree, so that
//! following edges always climbs in degree. Nodes with no outgoing edge are
//! local degree maxima, the *leaders*, and become forest roots.
//!
//! ## Rules
//!
//! - [`HierarchyRule::Full`]: orient every edge with unequal endpoint
//!   degrees; drop equal-degree edges.
//! - [`HierarchyRule::Maximum`]: each node points only at the neighbours of
//!   largest degree, provided that degree is at least its own. Equal-degree
//!   maxima point one way only (whichever node is enumerated first claims
//!   the edge), which keeps plateaus acyclic.
//!
//! ## Node indices
//!
//! The DAG is built with the same node insertion order as the input
//! [`Graph`], so a `NodeIndex` means the same node in both.

#![allow(clippy::module_name_repetitions)]

use hdforest_core::{Graph, HierarchyRule, NodeId};
use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
};
use tracing::{debug, instrument};

/// The degree hierarchy DAG together with the rule that produced it.
#[derive(Debug, Clone)]
pub struct DegreeDag {
    /// Directed graph: an edge `u → v` means `v` dominates `u` in degree.
    pub dag: DiGraph<NodeId, ()>,
    pub rule: HierarchyRule,
}

impl DegreeDag {
    /// Orient the edges of `graph` according to `rule`.
    ///
    /// `degrees` is the degree table of `graph`, indexed by
    /// `NodeIndex::index()`.
    #[must_use]
    #[instrument(skip(graph, degrees), fields(nodes = graph.node_count()))]
    pub fn build(graph: &Graph, degrees: &[usize], rule: HierarchyRule) -> Self {
        let mut dag = DiGraph::<NodeId, ()>::with_capacity(graph.node_count(), graph.edge_count());
        for id in graph.ids() {
            dag.add_node(id);
        }

        match rule {
            HierarchyRule::Full => add_full_edges(&mut dag, graph, degrees),
            HierarchyRule::Maximum => add_maximum_edges(&mut dag, graph, degrees),
        }

        debug!(
            rule = %rule,
            undirected_edges = graph.edge_count(),
            dag_edges = dag.edge_count(),
            "built degree hierarchy"
        );

        Self { dag, rule }
    }

    /// Nodes without outgoing edges, in enumeration order.
    #[must_use]
    pub fn leaders(&self) -> Vec<NodeIndex> {
        self.dag
            .node_indices()
            .filter(|&idx| self.is_leader(idx))
            .collect()
    }

    #[must_use]
    pub fn is_leader(&self, idx: NodeIndex) -> bool {
        self.dag
            .neighbors_directed(idx, Direction::Outgoing)
            .next()
            .is_none()
    }

    /// Nodes that point directly at `idx`.
    pub fn predecessors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.dag.neighbors_directed(idx, Direction::Incoming)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.dag.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.dag.edge_count()
    }

    /// Directed edges as `(from, to)` external id pairs, sorted.
    #[must_use]
    pub fn edge_ids(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges: Vec<(NodeId, NodeId)> = self
            .dag
            .raw_edges()
            .iter()
            .map(|e| (self.dag[e.source()], self.dag[e.target()]))
            .collect();
        edges.sort_unstable();
        edges
    }
}

fn add_full_edges(dag: &mut DiGraph<NodeId, ()>, graph: &Graph, degrees: &[usize]) {
    for v in graph.node_indices() {
        let kv = degrees[v.index()];
        for w in graph.neighbors(v) {
            if degrees[w.index()] > kv {
                dag.add_edge(v, w, ());
            }
        }
    }
}

fn add_maximum_edges(dag: &mut DiGraph<NodeId, ()>, graph: &Graph, degrees: &[usize]) {
    for v in graph.node_indices() {
        let Some(kmax) = graph.neighbors(v).map(|w| degrees[w.index()]).max() else {
            continue;
        };
        if kmax < degrees[v.index()] {
            continue;
        }
        let targets: Vec<NodeIndex> = graph
            .neighbors(v)
            .filter(|w| degrees[w.index()] == kmax)
            .collect();
        for w in targets {
            if !dag.contains_edge(w, v) {
                dag.add_edge(v, w, ());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::algo::is_cyclic_directed;

    fn build(edges: &[(NodeId, NodeId)], rule: HierarchyRule) -> (Graph, DegreeDag) {
        let graph = Graph::from_edge_list(edges).expect("valid graph");
        let degrees = graph.degrees();
        let dag = DegreeDag::build(&graph, &degrees, rule);
        (graph, dag)
    }

    fn leader_ids(graph: &Graph, dag: &DegreeDag) -> Vec<NodeId> {
        dag.leaders().into_iter().map(|i| graph.node_id(i)).collect()
    }

    #[test]
    fn star_points_leaves_at_hub() {
        for rule in [HierarchyRule::Full, HierarchyRule::Maximum] {
            let (graph, dag) = build(&[(0, 1), (0, 2), (0, 3)], rule);
            assert_eq!(dag.edge_ids(), vec![(1, 0), (2, 0), (3, 0)]);
            assert_eq!(leader_ids(&graph, &dag), vec![0]);
        }
    }

    #[test]
    fn full_rule_drops_equal_degree_edges() {
        // Triangle: all degree 2.
        let (graph, dag) = build(&[(0, 1), (1, 2), (0, 2)], HierarchyRule::Full);
        assert_eq!(dag.edge_count(), 0);
        assert_eq!(leader_ids(&graph, &dag), vec![0, 1, 2]);
    }

    #[test]
    fn maximum_rule_orients_plateau_once() {
        // Triangle under the maximum rule: 0 claims both edges, 1 claims 1→2.
        let (graph, dag) = build(&[(0, 1), (1, 2), (0, 2)], HierarchyRule::Maximum);
        assert_eq!(dag.edge_ids(), vec![(0, 1), (0, 2), (1, 2)]);
        assert_eq!(leader_ids(&graph, &dag), vec![2]);
        assert!(!is_cyclic_directed(&dag.dag));
    }

    #[test]
    fn rules_agree_on_a_single_climb() {
        // Hub 0 (degree 4) with a short tail on each side; every node has a
        // unique highest neighbour, so both rules orient the same way.
        let edges = [(3, 1), (1, 0), (0, 2), (0, 4), (0, 5), (2, 6)];
        let (full_graph, full) = build(&edges, HierarchyRule::Full);
        let (_, max) = build(&edges, HierarchyRule::Maximum);

        assert_eq!(full.edge_ids(), max.edge_ids());
        assert!(max.edge_ids().contains(&(6, 2)));
        assert!(max.edge_ids().contains(&(2, 0)));
        assert!(!is_cyclic_directed(&full.dag));
        assert!(!is_cyclic_directed(&max.dag));
        assert_eq!(leader_ids(&full_graph, &full), vec![0]);
    }

    #[test]
    fn maximum_rule_drops_edges_to_lesser_higher_degree_neighbours() {
        // Node 0 (degree 2) neighbours: 1 (degree 3) and 2 (degree 4).
        // Full keeps 0→1 and 0→2; maximum keeps only 0→2.
        let edges = [(0, 1), (0, 2), (1, 3), (1, 4), (2, 5), (2, 6), (2, 7)];
        let (_, full) = build(&edges, HierarchyRule::Full);
        let (_, max) = build(&edges, HierarchyRule::Maximum);
        assert!(full.edge_ids().contains(&(0, 1)));
        assert!(full.edge_ids().contains(&(0, 2)));
        assert!(!max.edge_ids().contains(&(0, 1)));
        assert!(max.edge_ids().contains(&(0, 2)));
    }

    #[test]
    fn isolated_node_is_its_own_leader() {
        let graph = Graph::from_edges([9], [(0, 1), (0, 2)]).expect("valid graph");
        let degrees = graph.degrees();
        for rule in [HierarchyRule::Full, HierarchyRule::Maximum] {
            let dag = DegreeDag::build(&graph, &degrees, rule);
            let leaders = leader_ids(&graph, &dag);
            assert!(leaders.contains(&9));
            let isolated = graph.node_index(9).expect("node 9");
            assert_eq!(dag.predecessors(isolated).count(), 0);
        }
    }

    #[test]
    fn dag_shares_node_indices_with_input() {
        let (graph, dag) = build(&[(5, 7), (7, 9), (9, 11)], HierarchyRule::Full);
        for idx in graph.node_indices() {
            assert_eq!(dag.dag[idx], graph.node_id(idx));
        }
    }
}
