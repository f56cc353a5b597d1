//! Spanning forest over the degree hierarchy.
//!
//! # Overview
//!
//! Starting from every leader at distance 0, the DAG is walked backwards
//! (from a node to the nodes pointing at it) one level at a time. A node is
//! claimed at the first level that reaches it; its parent is one of the
//! nodes on the previous level that point-to-it candidates offered, and its
//! root is that parent's root.
//!
//! ## Ties
//!
//! When several nodes of the previous level compete for the same child, the
//! parent is drawn uniformly from those candidates using the caller's
//! generator. This is the only randomness in the pipeline; a fixed seed
//! gives a fixed forest. Highly symmetric graphs will see different
//! forests under different seeds, which is expected.
//!
//! ## Snapshot
//!
//! The result is an immutable [`Forest`]: one [`TreeSlot`] per node,
//! indexed by `NodeIndex::index()`. Later phases read it and never write it.

use hdforest_core::{Error, Result};
use petgraph::graph::NodeIndex;
use rand::Rng;
use tracing::{debug, instrument};

use crate::hierarchy::DegreeDag;

/// Forest annotation of a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeSlot {
    /// `None` for leaders.
    pub parent: Option<NodeIndex>,
    pub root: NodeIndex,
    /// Number of parent hops to `root`.
    pub distance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forest {
    slots: Vec<TreeSlot>,
    roots: Vec<NodeIndex>,
    ties_broken: usize,
}

impl Forest {
    /// Grow the forest level by level from the leaders of `dag`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnreachableNode`] naming the first node that no
    /// leader reached. That cannot happen for a DAG produced by
    /// [`DegreeDag::build`] and signals a builder defect.
    #[instrument(skip_all, fields(nodes = dag.node_count()))]
    pub fn grow<R: Rng + ?Sized>(dag: &DegreeDag, rng: &mut R) -> Result<Self> {
        let n = dag.node_count();
        let roots = dag.leaders();

        let mut slots: Vec<Option<TreeSlot>> = vec![None; n];
        for &root in &roots {
            slots[root.index()] = Some(TreeSlot {
                parent: None,
                root,
                distance: 0,
            });
        }

        // Position of a child in `claims` for the level being built.
        let mut pending: Vec<Option<usize>> = vec![None; n];
        let mut wave = roots.clone();
        let mut distance = 0u32;
        let mut ties_broken = 0usize;

        while !wave.is_empty() {
            distance += 1;

            let mut claims: Vec<(NodeIndex, Vec<NodeIndex>)> = Vec::new();
            for &parent in &wave {
                for child in dag.predecessors(parent) {
                    if slots[child.index()].is_some() {
                        continue;
                    }
                    if let Some(pos) = pending[child.index()] {
                        claims[pos].1.push(parent);
                    } else {
                        pending[child.index()] = Some(claims.len());
                        claims.push((child, vec![parent]));
                    }
                }
            }

            let mut next = Vec::with_capacity(claims.len());
            for (child, candidates) in claims {
                pending[child.index()] = None;
                let parent = if candidates.len() > 1 {
                    ties_broken += 1;
                    candidates[rng.gen_range(0..candidates.len())]
                } else {
                    candidates[0]
                };
                let root = slots[parent.index()].map_or(parent, |slot| slot.root);
                slots[child.index()] = Some(TreeSlot {
                    parent: Some(parent),
                    root,
                    distance,
                });
                next.push(child);
            }
            wave = next;
        }

        let slots = slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or(Error::UnreachableNode {
                    node: dag.dag[NodeIndex::new(i)],
                })
            })
            .collect::<Result<Vec<TreeSlot>>>()?;

        debug!(
            roots = roots.len(),
            depth = distance.saturating_sub(1),
            ties_broken,
            "grew degree forest"
        );

        Ok(Self {
            slots,
            roots,
            ties_broken,
        })
    }

    /// Annotation for `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    #[must_use]
    pub fn slot(&self, idx: NodeIndex) -> &TreeSlot {
        &self.slots[idx.index()]
    }

    /// All annotations, indexed by `NodeIndex::index()`.
    #[must_use]
    pub fn slots(&self) -> &[TreeSlot] {
        &self.slots
    }

    /// Forest roots (the leaders), in enumeration order.
    #[must_use]
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Number of nodes whose parent was drawn among several candidates.
    #[must_use]
    pub const fn ties_broken(&self) -> usize {
        self.ties_broken
    }

    /// `(parent, child)` for every non-root node, in child order.
    #[must_use]
    pub fn tree_edges(&self) -> Vec<(NodeIndex, NodeIndex)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.parent.map(|p| (p, NodeIndex::new(i))))
            .collect()
    }

    /// Follow parent pointers from `idx`; returns the node reached and the
    /// number of hops taken.
    #[must_use]
    pub fn climb(&self, idx: NodeIndex) -> (NodeIndex, u32) {
        let mut current = idx;
        let mut hops = 0;
        while let Some(parent) = self.slots[current.index()].parent {
            current = parent;
            hops += 1;
        }
        (current, hops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdforest_core::{Graph, HierarchyRule, NodeId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn grow(edges: &[(NodeId, NodeId)], rule: HierarchyRule, seed: u64) -> (Graph, Forest) {
        let graph = Graph::from_edge_list(edges).expect("valid graph");
        let dag = DegreeDag::build(&graph, &graph.degrees(), rule);
        let mut rng = StdRng::seed_from_u64(seed);
        let forest = Forest::grow(&dag, &mut rng).expect("forest");
        (graph, forest)
    }

    fn idx(graph: &Graph, id: NodeId) -> NodeIndex {
        graph.node_index(id).expect("node exists")
    }

    #[test]
    fn path_hangs_from_its_hub() {
        // 0 - 1 - 2 - 3 - 4 with 2 boosted to degree 4 by two leaves.
        let edges = [(0, 1), (1, 2), (2, 3), (3, 4), (2, 5), (2, 6)];
        let (graph, forest) = grow(&edges, HierarchyRule::Full, 1);

        assert_eq!(forest.roots(), &[idx(&graph, 2)]);
        let slot0 = forest.slot(idx(&graph, 0));
        assert_eq!(slot0.root, idx(&graph, 2));
        assert_eq!(slot0.distance, 2);
        assert_eq!(slot0.parent, Some(idx(&graph, 1)));

        let hub = forest.slot(idx(&graph, 2));
        assert_eq!(hub.parent, None);
        assert_eq!(hub.distance, 0);
        assert_eq!(forest.ties_broken(), 0);
    }

    #[test]
    fn every_node_gets_exactly_one_slot() {
        let edges = [(0, 2), (0, 3), (0, 4), (0, 5), (1, 2), (1, 3), (1, 4), (1, 5)];
        let (graph, forest) = grow(&edges, HierarchyRule::Maximum, 9);
        assert_eq!(forest.slots().len(), graph.node_count());
        assert_eq!(forest.tree_edges().len(), graph.node_count() - forest.roots().len());
    }

    #[test]
    fn twin_hubs_split_leaves_by_tie_break() {
        // Every leaf is one hop from both hubs, so each is a tie.
        let edges = [(0, 2), (0, 3), (0, 4), (0, 5), (1, 2), (1, 3), (1, 4), (1, 5)];
        let (graph, forest) = grow(&edges, HierarchyRule::Full, 3);

        assert_eq!(forest.ties_broken(), 4);
        let hubs = [idx(&graph, 0), idx(&graph, 1)];
        for leaf in 2..6 {
            let slot = forest.slot(idx(&graph, leaf));
            assert_eq!(slot.distance, 1);
            assert!(hubs.contains(&slot.root));
            assert_eq!(slot.parent, Some(slot.root));
        }
    }

    #[test]
    fn same_seed_same_forest() {
        let edges = [(0, 2), (0, 3), (0, 4), (0, 5), (1, 2), (1, 3), (1, 4), (1, 5)];
        let (_, a) = grow(&edges, HierarchyRule::Full, 42);
        let (_, b) = grow(&edges, HierarchyRule::Full, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_eventually_differ_on_symmetric_graph() {
        let edges = [(0, 2), (0, 3), (0, 4), (0, 5), (1, 2), (1, 3), (1, 4), (1, 5)];
        let (_, reference) = grow(&edges, HierarchyRule::Full, 0);
        let differs = (1..64).any(|seed| grow(&edges, HierarchyRule::Full, seed).1 != reference);
        assert!(differs, "64 seeds produced identical tie-breaks");
    }

    #[test]
    fn distance_matches_parent_chain_and_root() {
        let edges = [
            (0, 1), (0, 2), (0, 3), (1, 4), (2, 4), (3, 5), (4, 6), (5, 6), (6, 7), (6, 8),
        ];
        for seed in 0..16 {
            let (graph, forest) = grow(&edges, HierarchyRule::Full, seed);
            for node in graph.node_indices() {
                let slot = forest.slot(node);
                let (top, hops) = forest.climb(node);
                assert_eq!(hops, slot.distance);
                assert_eq!(top, slot.root);
            }
        }
    }

    #[test]
    fn cycle_without_leader_is_unreachable() {
        use petgraph::graph::DiGraph;

        let mut dag = DiGraph::<NodeId, ()>::new();
        let a = dag.add_node(10);
        let b = dag.add_node(11);
        dag.add_node(12);
        dag.add_edge(a, b, ());
        dag.add_edge(b, a, ());
        let dag = DegreeDag {
            dag,
            rule: HierarchyRule::Maximum,
        };

        let err = Forest::grow(&dag, &mut StdRng::seed_from_u64(0)).expect_err("unreachable");
        assert_eq!(err, Error::UnreachableNode { node: 10 });
        assert_eq!(
            err.to_string(),
            "node 10 has no path to any leader in the degree hierarchy"
        );
    }

    #[test]
    fn isolated_node_roots_itself() {
        let graph = Graph::from_edges([7], [(0, 1), (1, 2)]).expect("valid graph");
        let dag = DegreeDag::build(&graph, &graph.degrees(), HierarchyRule::Maximum);
        let forest = Forest::grow(&dag, &mut StdRng::seed_from_u64(0)).expect("forest");
        let lonely = idx(&graph, 7);
        assert_eq!(forest.slot(lonely).root, lonely);
        assert_eq!(forest.slot(lonely).distance, 0);
    }
}
