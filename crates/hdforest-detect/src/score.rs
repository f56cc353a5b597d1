//! Composite score and center selection.
//!
//! `score(v) = norm(rank(degree(v))) * norm(path_length(v)^2)`
//!
//! - `rank` is a dense rank over distinct degree values, starting at 1.
//! - `norm` is min-max normalization to `[0, 1]`; a constant sequence maps
//!   to `1/n` everywhere.
//! - `path_length` is the leader distance for leaders and 1 for everyone
//!   else, so non-leaders sit at the bottom of the squared-path scale.
//!
//! The ranked list is sorted by score descending, then node id descending.
//! The id key only makes ties deterministic; it carries no meaning.

use hdforest_core::{Graph, NodeId};
use petgraph::graph::NodeIndex;
use tracing::{debug, instrument};

use crate::leaders::LeaderHierarchy;

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// One entry of the ranked score list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredNode {
    pub node: NodeIndex,
    pub id: NodeId,
    pub degree: usize,
    pub path_length: u32,
    pub score: f64,
}

/// Score every node of `graph` and return them best first.
#[must_use]
#[instrument(skip_all, fields(nodes = graph.node_count()))]
pub fn score_nodes(graph: &Graph, degrees: &[usize], hierarchy: &LeaderHierarchy) -> Vec<ScoredNode> {
    let nodes: Vec<NodeIndex> = graph.node_indices().collect();
    let node_degrees: Vec<usize> = nodes.iter().map(|n| degrees[n.index()]).collect();
    let paths: Vec<u32> = nodes.iter().map(|&n| hierarchy.path_length(n)).collect();

    let ranks: Vec<f64> = dense_rank(&node_degrees).into_iter().map(to_f64).collect();
    let squared: Vec<f64> = paths.iter().map(|&p| f64::from(p).powi(2)).collect();

    let degree_part = min_max_normalize(&ranks);
    let path_part = min_max_normalize(&squared);

    let mut ranked: Vec<ScoredNode> = nodes
        .iter()
        .enumerate()
        .map(|(i, &node)| ScoredNode {
            node,
            id: graph.node_id(node),
            degree: node_degrees[i],
            path_length: paths[i],
            score: degree_part[i] * path_part[i],
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| b.id.cmp(&a.id)));

    debug!(
        positive = ranked.iter().filter(|s| s.score > 0.0).count(),
        top = ?ranked.first().map(|s| s.id),
        "scored nodes"
    );
    ranked
}

/// Dense rank of each value among the distinct values, smallest = 1.
#[must_use]
pub fn dense_rank(values: &[usize]) -> Vec<usize> {
    let mut distinct = values.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    values
        .iter()
        .map(|v| distinct.partition_point(|d| d < v) + 1)
        .collect()
}

/// Min-max normalization to `[0, 1]`.
///
/// If all values are equal (including a single-element slice), every output
/// is `1/n`.
#[must_use]
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !range.is_finite() || range.abs() <= f64::EPSILON {
        let uniform = 1.0 / to_f64(values.len());
        return vec![uniform; values.len()];
    }

    values.iter().map(|&v| (v - min) / range).collect()
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(value: usize) -> f64 {
    value as f64
}

// ---------------------------------------------------------------------------
// Center selection
// ---------------------------------------------------------------------------

/// Position of the first large gap in a descending score sequence.
///
/// Gaps are absolute differences between consecutive scores. Using only the
/// nonzero gaps, the cut is the first gap exceeding `mean + stddev`
/// (population stddev); the suggestion is the number of scores above it.
/// Returns 0 when there is no nonzero gap or no gap clears the bar.
#[must_use]
pub fn suggest_center_count(scores: &[f64]) -> usize {
    let gaps: Vec<f64> = scores.windows(2).map(|w| (w[0] - w[1]).abs()).collect();
    let nonzero: Vec<f64> = gaps.iter().copied().filter(|&g| g > 0.0).collect();
    if nonzero.is_empty() {
        return 0;
    }

    let count = to_f64(nonzero.len());
    let mean = nonzero.iter().sum::<f64>() / count;
    let variance = nonzero.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / count;
    let bar = variance.sqrt() + mean;

    gaps.iter().position(|&g| g > bar).map_or(0, |i| i + 1)
}

/// The chosen centers and how their number was decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CenterSelection {
    /// Centers best first.
    pub centers: Vec<NodeIndex>,
    pub requested: usize,
    /// Automatic suggestion, when requested.
    pub suggested: Option<usize>,
    /// `max(requested, suggested)`, capped at the number of leaders.
    pub effective: usize,
}

/// Pick the top leaders of `ranked` as centers.
///
/// Only leaders are eligible, so the effective count never exceeds the
/// leader count even if more were requested.
#[must_use]
pub fn select_centers(
    ranked: &[ScoredNode],
    hierarchy: &LeaderHierarchy,
    requested: usize,
    auto_choose: bool,
) -> CenterSelection {
    let suggested = auto_choose.then(|| {
        let scores: Vec<f64> = ranked.iter().map(|s| s.score).collect();
        suggest_center_count(&scores)
    });

    let wanted = requested.max(suggested.unwrap_or(0));
    let effective = wanted.min(hierarchy.leader_count());
    if effective < wanted {
        debug!(wanted, leaders = hierarchy.leader_count(), "center count capped at leader count");
    }

    let centers = ranked
        .iter()
        .filter(|s| hierarchy.is_leader(s.node))
        .take(effective)
        .map(|s| s.node)
        .collect();

    CenterSelection {
        centers,
        requested,
        suggested,
        effective,
    }
}
