//! Agreement and quality measures for a labelling.
//!
//! These consume a finished partition (integer labels in enumeration order,
//! `-1` for noise) and never feed back into detection.

use std::collections::HashMap;

use hdforest_core::{Error, Graph, Result};
use serde::Serialize;

/// Newman modularity of `labels` on `graph`.
///
/// `Q = Σ_c [ L_c / m - (d_c / 2m)^2 ]`, where `L_c` is the number of edges
/// inside community `c` and `d_c` its total degree. Noise is treated as one
/// more community. A graph without edges has modularity 0.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if `labels` does not have one entry
/// per node.
#[allow(clippy::cast_precision_loss)]
pub fn modularity(graph: &Graph, labels: &[i64]) -> Result<f64> {
    check_lengths("labels", labels.len(), graph.node_count())?;

    let m = graph.edge_count();
    if m == 0 {
        return Ok(0.0);
    }

    // label -> (internal edges, total degree)
    let mut blocks: HashMap<i64, (usize, usize)> = HashMap::new();
    for idx in graph.node_indices() {
        blocks.entry(labels[idx.index()]).or_default().1 += graph.degree(idx);
    }
    for (source, target) in graph.edges() {
        let a = labels[source.index()];
        if a == labels[target.index()] {
            blocks.entry(a).or_default().0 += 1;
        }
    }

    let m = m as f64;
    Ok(blocks
        .values()
        .map(|&(internal, degree)| {
            let share = degree as f64 / (2.0 * m);
            internal as f64 / m - share * share
        })
        .sum())
}

/// Pair-counting agreement between a predicted and a reference labelling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Precision, recall and F1 over node pairs.
///
/// A pair is a true positive when both labellings put the two nodes
/// together. Precision divides by pairs grouped in `predicted`, recall by
/// pairs grouped in `truth`. Zero denominators give 0.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if the two slices differ in length.
#[allow(clippy::cast_precision_loss)]
pub fn pairwise_scores(predicted: &[i64], truth: &[i64]) -> Result<PairScores> {
    check_lengths("truth", truth.len(), predicted.len())?;

    let mut joint: HashMap<(i64, i64), u64> = HashMap::new();
    let mut by_predicted: HashMap<i64, u64> = HashMap::new();
    let mut by_truth: HashMap<i64, u64> = HashMap::new();
    for (&p, &t) in predicted.iter().zip(truth) {
        *joint.entry((p, t)).or_default() += 1;
        *by_predicted.entry(p).or_default() += 1;
        *by_truth.entry(t).or_default() += 1;
    }

    let pairs = |count: &u64| count * count.saturating_sub(1) / 2;
    let true_positive: u64 = joint.values().map(pairs).sum();
    let predicted_pairs: u64 = by_predicted.values().map(pairs).sum();
    let truth_pairs: u64 = by_truth.values().map(pairs).sum();

    let ratio = |num: u64, den: u64| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let precision = ratio(true_positive, predicted_pairs);
    let recall = ratio(true_positive, truth_pairs);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Ok(PairScores {
        precision,
        recall,
        f1,
    })
}

/// Relabel centers to `0, 1, 2, …` in order of first appearance. Noise
/// (`-1`) is kept as is.
#[must_use]
pub fn compact_labels(labels: &[i64]) -> Vec<i64> {
    let mut dense: HashMap<i64, i64> = HashMap::new();
    labels
        .iter()
        .map(|&label| {
            if label < 0 {
                return label;
            }
            let next = i64::try_from(dense.len()).unwrap_or(i64::MAX);
            *dense.entry(label).or_insert(next)
        })
        .collect()
}

fn check_lengths(name: &'static str, got: usize, expected: usize) -> Result<()> {
    if got == expected {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name,
            reason: format!("expected {expected} entries, got {got}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx_eq(actual: f64, expected: f64) {
        let tolerance = 1e-10;
        assert!(
            (actual - expected).abs() <= tolerance,
            "actual ({actual}) != expected ({expected})"
        );
    }

    /// Two triangles joined by a single bridge 2-3.
    fn barbell() -> Graph {
        Graph::from_edge_list(&[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)])
            .expect("valid graph")
    }

    #[test]
    fn modularity_of_natural_split() {
        let q = modularity(&barbell(), &[0, 0, 0, 1, 1, 1]).expect("modularity");
        // Each side: 3 internal edges of 7, degree sum 7 of 14.
        assert_approx_eq(q, 2.0 * (3.0 / 7.0 - 0.25));
    }

    #[test]
    fn single_block_has_zero_modularity() {
        let q = modularity(&barbell(), &[5; 6]).expect("modularity");
        assert_approx_eq(q, 0.0);
    }

    #[test]
    fn noise_counts_as_a_block() {
        let graph = barbell();
        let with_noise = modularity(&graph, &[0, 0, 0, -1, -1, -1]).expect("modularity");
        let relabelled = modularity(&graph, &[0, 0, 0, 9, 9, 9]).expect("modularity");
        assert_approx_eq(with_noise, relabelled);
    }

    #[test]
    fn edgeless_graph_has_zero_modularity() {
        let graph = Graph::from_edges([0, 1, 2], std::iter::empty()).expect("valid graph");
        assert_approx_eq(modularity(&graph, &[0, 1, 2]).expect("modularity"), 0.0);
    }

    #[test]
    fn modularity_rejects_wrong_length() {
        assert!(matches!(
            modularity(&barbell(), &[0, 1]),
            Err(Error::InvalidParameter { name: "labels", .. })
        ));
    }

    #[test]
    fn identical_labellings_score_perfectly() {
        let scores = pairwise_scores(&[3, 3, 7, 7], &[0, 0, 1, 1]).expect("scores");
        assert_approx_eq(scores.precision, 1.0);
        assert_approx_eq(scores.recall, 1.0);
        assert_approx_eq(scores.f1, 1.0);
    }

    #[test]
    fn merged_prediction_keeps_recall_loses_precision() {
        // Truth pairs: (0,1), (2,3). Predicted pairs: all 6.
        let scores = pairwise_scores(&[1, 1, 1, 1], &[0, 0, 1, 1]).expect("scores");
        assert_approx_eq(scores.precision, 2.0 / 6.0);
        assert_approx_eq(scores.recall, 1.0);
        assert_approx_eq(scores.f1, 0.5);
    }

    #[test]
    fn singleton_prediction_scores_zero() {
        let scores = pairwise_scores(&[0, 1, 2], &[0, 0, 0]).expect("scores");
        assert_approx_eq(scores.precision, 0.0);
        assert_approx_eq(scores.recall, 0.0);
        assert_approx_eq(scores.f1, 0.0);
    }

    #[test]
    fn compact_labels_keeps_noise() {
        assert_eq!(compact_labels(&[33, 33, -1, 0, 33, 0]), vec![0, 0, -1, 1, 0, 1]);
    }
}
