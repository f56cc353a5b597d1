//! Final node → center assignment.
//!
//! Every node has one pointer: a non-leader points at its forest root, a
//! leader at its nearest dominant leader (itself when it has none). A node
//! is labelled with the first center reached by following pointers. A walk
//! that comes back to a node it already visited, which is what a leader
//! pointing at itself produces, ends as noise.

#![allow(clippy::module_name_repetitions)]

use std::collections::BTreeMap;

use fixedbitset::FixedBitSet;
use hdforest_core::{Graph, NodeId};
use petgraph::graph::NodeIndex;
use serde::{Serialize, Serializer};
use tracing::{debug, instrument};

use crate::forest::Forest;
use crate::leaders::LeaderHierarchy;

/// Integer label used for noise in list and map form.
pub const NOISE_LABEL: i64 = -1;

/// The community a node ended up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Assignment {
    /// Labelled with this center's id.
    Center(NodeId),
    /// No center reachable.
    Noise,
}

impl Assignment {
    /// Integer form: the center id, or [`NOISE_LABEL`].
    #[must_use]
    pub fn label(self) -> i64 {
        match self {
            Self::Center(id) => i64::from(id),
            Self::Noise => NOISE_LABEL,
        }
    }

    #[must_use]
    pub const fn is_noise(self) -> bool {
        matches!(self, Self::Noise)
    }
}

impl Serialize for Assignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.label())
    }
}

/// A total labelling of the graph's nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    ids: Vec<NodeId>,
    assignments: Vec<Assignment>,
}

impl Partition {
    /// Assignment of every node, in enumeration order.
    #[must_use]
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    #[must_use]
    pub fn get(&self, idx: NodeIndex) -> Option<Assignment> {
        self.assignments.get(idx.index()).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Integer labels in enumeration order.
    #[must_use]
    pub fn as_list(&self) -> Vec<i64> {
        self.assignments.iter().map(|a| a.label()).collect()
    }

    /// Node id → integer label.
    #[must_use]
    pub fn as_map(&self) -> BTreeMap<NodeId, i64> {
        self.ids
            .iter()
            .zip(&self.assignments)
            .map(|(&id, a)| (id, a.label()))
            .collect()
    }

    /// Member count per center. Noise is not included.
    #[must_use]
    pub fn group_sizes(&self) -> BTreeMap<NodeId, usize> {
        let mut sizes = BTreeMap::new();
        for assignment in &self.assignments {
            if let Assignment::Center(center) = assignment {
                *sizes.entry(*center).or_insert(0) += 1;
            }
        }
        sizes
    }

    #[must_use]
    pub fn noise_count(&self) -> usize {
        self.assignments.iter().filter(|a| a.is_noise()).count()
    }
}

/// Label every node with the center its pointer chain reaches.
#[must_use]
#[instrument(skip_all, fields(centers = centers.len()))]
pub fn assign(
    graph: &Graph,
    forest: &Forest,
    hierarchy: &LeaderHierarchy,
    centers: &[NodeIndex],
) -> Partition {
    let n = graph.node_count();
    let mut is_center = FixedBitSet::with_capacity(n);
    for center in centers {
        is_center.insert(center.index());
    }

    let pointer: Vec<NodeIndex> = graph
        .node_indices()
        .map(|idx| {
            hierarchy
                .link(idx)
                .map_or(forest.slot(idx).root, |link| link.target)
        })
        .collect();

    // Reused across walks; only the trail's bits are cleared afterwards.
    let mut visited = FixedBitSet::with_capacity(n);
    let mut trail: Vec<NodeIndex> = Vec::new();

    let assignments: Vec<Assignment> = graph
        .node_indices()
        .map(|start| {
            if is_center.contains(start.index()) {
                return Assignment::Center(graph.node_id(start));
            }

            let mut current = start;
            visited.insert(current.index());
            trail.push(current);
            let outcome = loop {
                let next = pointer[current.index()];
                if is_center.contains(next.index()) {
                    break Assignment::Center(graph.node_id(next));
                }
                if visited.contains(next.index()) {
                    break Assignment::Noise;
                }
                visited.insert(next.index());
                trail.push(next);
                current = next;
            };

            for node in trail.drain(..) {
                visited.set(node.index(), false);
            }
            outcome
        })
        .collect();

    let partition = Partition {
        ids: graph.ids(),
        assignments,
    };
    debug!(
        groups = partition.group_sizes().len(),
        noise = partition.noise_count(),
        "assigned partition"
    );
    partition
}
