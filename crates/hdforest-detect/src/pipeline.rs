//! Single entry point running every phase in order.
//!
//! # Overview
//!
//! ```text
//! Graph ──► DegreeDag ──► Forest ──► LeaderHierarchy ──► ranked scores
//!                                                              │
//!                              Partition ◄── CenterSelection ◄─┘
//! ```
//!
//! Each phase consumes the previous phase's snapshot and produces a new one.
//! The random generator is created here, once per call, and only the forest
//! phase draws from it.
//!
//! Either every phase completes and a full [`Detection`] comes back, or the
//! first fatal error is returned and nothing else is.

use std::collections::BTreeMap;
use std::time::Instant;

use hdforest_core::{DetectConfig, Graph, HierarchyRule, NodeId, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, instrument};

use crate::forest::Forest;
use crate::hierarchy::DegreeDag;
use crate::leaders::{DistanceMode, LeaderHierarchy};
use crate::partition::{Partition, assign};
use crate::score::{CenterSelection, ScoredNode, score_nodes, select_centers};

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Degree and effective path length of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeDiagnostic {
    pub id: NodeId,
    pub degree: usize,
    pub path_length: u32,
}

/// One entry of the ranked score list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedScore {
    pub id: NodeId,
    pub score: f64,
}

/// Everything a plotting or reporting consumer needs, without petgraph types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticBundle {
    pub graph_hash: String,
    pub rule: HierarchyRule,
    pub seed: Option<u64>,
    /// Per node, in enumeration order.
    pub nodes: Vec<NodeDiagnostic>,
    /// Best first.
    pub ranked: Vec<RankedScore>,
    pub centers: Vec<NodeId>,
    pub requested_centers: usize,
    pub suggested_centers: Option<usize>,
    pub effective_centers: usize,
    pub leader_count: usize,
    /// Nodes with a strictly positive score.
    pub positive_scores: usize,
    pub ties_broken: usize,
    pub dag_edges: usize,
    pub distance_mode: DistanceMode,
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Output of one [`detect`] call: every phase snapshot plus the diagnostics.
#[derive(Debug, Clone)]
pub struct Detection {
    pub dag: DegreeDag,
    pub forest: Forest,
    pub hierarchy: LeaderHierarchy,
    pub ranked: Vec<ScoredNode>,
    pub selection: CenterSelection,
    pub partition: Partition,
    pub diagnostics: DiagnosticBundle,
}

impl Detection {
    /// Center ids, best first.
    #[must_use]
    pub fn centers(&self) -> &[NodeId] {
        &self.diagnostics.centers
    }

    /// Forest edges as `(parent, child)` id pairs.
    #[must_use]
    pub fn tree_edges(&self) -> Vec<(NodeId, NodeId)> {
        self.forest
            .tree_edges()
            .into_iter()
            .map(|(parent, child)| (self.dag.dag[parent], self.dag.dag[child]))
            .collect()
    }

    /// Serializable summary for machine output.
    #[must_use]
    pub fn report(&self) -> DetectionReport {
        DetectionReport {
            centers: self.diagnostics.centers.clone(),
            group_sizes: self.partition.group_sizes(),
            noise: self.partition.noise_count(),
            partition: self.partition.as_map(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

/// JSON-friendly view of a [`Detection`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    pub centers: Vec<NodeId>,
    pub group_sizes: BTreeMap<NodeId, usize>,
    pub noise: usize,
    pub partition: BTreeMap<NodeId, i64>,
    pub diagnostics: DiagnosticBundle,
}

/// Run the full pipeline on `graph`.
///
/// With `config.seed` set the result is fully reproducible; without it the
/// generator is seeded from OS entropy.
///
/// # Errors
///
/// Propagates fatal phase errors ([`hdforest_core::Error::UnreachableNode`]).
pub fn detect(graph: &Graph, config: &DetectConfig) -> Result<Detection> {
    let mut rng = config
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    detect_with_rng(graph, config, &mut rng)
}

/// [`detect`] with a caller-supplied generator. `config.seed` is only
/// recorded in the diagnostics.
///
/// # Errors
///
/// Same as [`detect`].
#[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count(), rule = %config.rule))]
pub fn detect_with_rng<R: Rng + ?Sized>(
    graph: &Graph,
    config: &DetectConfig,
    rng: &mut R,
) -> Result<Detection> {
    let degrees = graph.degrees();
    let dag = DegreeDag::build(graph, &degrees, config.rule);
    run_phases(graph, &degrees, dag, config, rng)
}

/// Everything after the DAG. A forest error ends the run before any later
/// phase starts.
fn run_phases<R: Rng + ?Sized>(
    graph: &Graph,
    degrees: &[usize],
    dag: DegreeDag,
    config: &DetectConfig,
    rng: &mut R,
) -> Result<Detection> {
    let started = Instant::now();

    let forest = Forest::grow(&dag, rng)?;
    let hierarchy = LeaderHierarchy::resolve(graph, degrees, forest.roots());
    let ranked = score_nodes(graph, degrees, &hierarchy);
    let selection = select_centers(
        &ranked,
        &hierarchy,
        config.center_count,
        config.auto_choose_centers,
    );
    let partition = assign(graph, &forest, &hierarchy, &selection.centers);

    let diagnostics = DiagnosticBundle {
        graph_hash: graph.content_hash().to_string(),
        rule: config.rule,
        seed: config.seed,
        nodes: graph
            .node_indices()
            .map(|idx| NodeDiagnostic {
                id: graph.node_id(idx),
                degree: degrees[idx.index()],
                path_length: hierarchy.path_length(idx),
            })
            .collect(),
        ranked: ranked
            .iter()
            .map(|s| RankedScore {
                id: s.id,
                score: s.score,
            })
            .collect(),
        centers: selection
            .centers
            .iter()
            .map(|&c| graph.node_id(c))
            .collect(),
        requested_centers: selection.requested,
        suggested_centers: selection.suggested,
        effective_centers: selection.effective,
        leader_count: hierarchy.leader_count(),
        positive_scores: ranked.iter().filter(|s| s.score > 0.0).count(),
        ties_broken: forest.ties_broken(),
        dag_edges: dag.edge_count(),
        distance_mode: hierarchy.mode(),
    };

    info!(
        leaders = diagnostics.leader_count,
        centers = diagnostics.effective_centers,
        noise = partition.noise_count(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "detection complete"
    );

    Ok(Detection {
        dag,
        forest,
        hierarchy,
        ranked,
        selection,
        partition,
        diagnostics,
    })
}
