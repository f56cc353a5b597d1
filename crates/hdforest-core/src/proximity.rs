//! Proximity graphs from point clouds.
//!
//! # Overview
//!
//! Vector data is turned into a graph by linking every pair of points whose
//! distance is at most a threshold `dc`. The threshold is picked from a grid
//! of 100 evenly spaced values between the smallest and largest pairwise
//! distance, addressed by its index (the "percent" of the distance range).
//!
//! [`percolation_profile`] sweeps that grid and reports how the largest and
//! second-largest connected components grow. The second-largest component
//! peaks right before the pieces merge, which is the usual place to cut.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId, tokenize};

/// Number of thresholds in the grid.
pub const GRID_STEPS: usize = 100;

/// Norm used for pairwise point distances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    Euclidean,
    /// L-infinity norm (largest per-coordinate difference).
    #[default]
    Chebyshev,
}

impl DistanceMetric {
    #[must_use]
    pub fn distance(self, a: &[f64], b: &[f64]) -> f64 {
        let diffs = a.iter().zip(b).map(|(x, y)| (x - y).abs());
        match self {
            Self::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
            Self::Chebyshev => diffs.fold(0.0, f64::max),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Chebyshev => "chebyshev",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Ok(Self::Euclidean),
            "chebyshev" | "linf" => Ok(Self::Chebyshev),
            other => Err(format!(
                "unknown distance metric `{other}` (expected euclidean|chebyshev)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// DistanceMatrix
// ---------------------------------------------------------------------------

/// Symmetric pairwise distances, stored as the strict upper triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Compute all pairwise distances between `points`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] when `points` is empty, a point
    /// has no coordinates, or the points differ in dimension.
    #[instrument(skip(points), fields(points = points.len()))]
    pub fn from_points(points: &[Vec<f64>], metric: DistanceMetric) -> Result<Self> {
        let Some(first) = points.first() else {
            return Err(Error::invalid_parameter("points", "no points supplied"));
        };
        let dim = first.len();
        if dim == 0 {
            return Err(Error::invalid_parameter("points", "points have no coordinates"));
        }
        if let Some((i, p)) = points.iter().enumerate().find(|(_, p)| p.len() != dim) {
            return Err(Error::invalid_parameter(
                "points",
                format!("point {i} has {} coordinates, expected {dim}", p.len()),
            ));
        }

        let n = points.len();
        let mut values = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                values.push(metric.distance(&points[i], &points[j]));
            }
        }
        Ok(Self { n, values })
    }

    /// Number of points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.n
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between points `i` and `j` (zero on the diagonal).
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n && j < self.n, "point index out of range");
        match i.cmp(&j) {
            std::cmp::Ordering::Equal => 0.0,
            std::cmp::Ordering::Less => self.values[self.offset(i, j)],
            std::cmp::Ordering::Greater => self.values[self.offset(j, i)],
        }
    }

    /// All `(i, j, distance)` with `i < j`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.n)
            .flat_map(move |i| ((i + 1)..self.n).map(move |j| (i, j)))
            .zip(self.values.iter().copied())
            .map(|((i, j), d)| (i, j, d))
    }

    const fn offset(&self, i: usize, j: usize) -> usize {
        i * self.n - i * (i + 1) / 2 + (j - i - 1)
    }
}

// ---------------------------------------------------------------------------
// Thresholds and graph construction
// ---------------------------------------------------------------------------

/// The 100 evenly spaced thresholds from the smallest to the largest
/// pairwise distance.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] with fewer than two points.
#[allow(clippy::cast_precision_loss)]
pub fn threshold_grid(dm: &DistanceMatrix) -> Result<Vec<f64>> {
    if dm.len() < 2 {
        return Err(Error::invalid_parameter(
            "points",
            "at least two points are needed to form a distance range",
        ));
    }
    let min = dm.values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = dm.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let unit = (max - min) / (GRID_STEPS - 1) as f64;
    Ok((0..GRID_STEPS).map(|i| unit.mul_add(i as f64, min)).collect())
}

/// Pick the `percent`-th threshold from [`threshold_grid`].
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] when `percent >= 100` or there are
/// fewer than two points.
pub fn choose_threshold(dm: &DistanceMatrix, percent: usize) -> Result<f64> {
    if percent >= GRID_STEPS {
        return Err(Error::invalid_parameter(
            "dc_percent",
            format!("must be below {GRID_STEPS}, got {percent}"),
        ));
    }
    Ok(threshold_grid(dm)?[percent])
}

/// Link every pair of points at distance `<= threshold`.
///
/// Node ids are the point positions `0..n`; isolated points stay in the
/// graph as degree-0 nodes.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if the point count does not fit a
/// [`NodeId`], or [`Error::InvalidGraph`] for an empty matrix.
#[instrument(skip(dm), fields(points = dm.len()))]
pub fn proximity_graph(dm: &DistanceMatrix, threshold: f64) -> Result<Graph> {
    let n = NodeId::try_from(dm.len())
        .map_err(|_| Error::invalid_parameter("points", "too many points for 32-bit node ids"))?;

    let mut edges = Vec::new();
    for (i, j, d) in dm.pairs() {
        if d <= threshold {
            // Both indices are below `n`, which fits a NodeId.
            edges.push((to_node_id(i), to_node_id(j)));
        }
    }
    debug!(threshold, edges = edges.len(), "built proximity graph");
    Graph::from_edges(0..n, edges)
}

#[allow(clippy::cast_possible_truncation)]
const fn to_node_id(i: usize) -> NodeId {
    i as NodeId
}

/// Parse a point file: one point per line, coordinates separated by
/// whitespace or commas. Text after `#` and blank lines are ignored.
///
/// # Errors
///
/// Returns [`Error::Parse`] for non-numeric tokens.
pub fn parse_points(text: &str) -> Result<Vec<Vec<f64>>> {
    let mut points = Vec::new();
    for (line_no, raw) in text.lines().enumerate() {
        let tokens = tokenize(raw);
        if tokens.is_empty() {
            continue;
        }
        let point = tokens
            .iter()
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|e| Error::parse(line_no + 1, format!("invalid coordinate `{t}`: {e}")))
            })
            .collect::<Result<Vec<f64>>>()?;
        points.push(point);
    }
    Ok(points)
}

// ---------------------------------------------------------------------------
// Percolation profile
// ---------------------------------------------------------------------------

/// Component sizes at one grid threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercolationPoint {
    pub percent: usize,
    pub threshold: f64,
    /// Fraction of points in the largest connected component.
    pub giant_fraction: f64,
    /// Fraction of points in the second-largest component (0 if connected).
    pub second_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercolationProfile {
    pub points: Vec<PercolationPoint>,
    /// Grid index where the second-largest component is biggest.
    pub suggested_percent: usize,
}

/// Sweep the threshold grid and record component growth.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] with fewer than two points.
#[allow(clippy::cast_precision_loss)]
#[instrument(skip(dm), fields(points = dm.len()))]
pub fn percolation_profile(dm: &DistanceMatrix) -> Result<PercolationProfile> {
    let grid = threshold_grid(dm)?;
    let n = dm.len();

    let mut pairs: Vec<(usize, usize, f64)> = dm.pairs().collect();
    pairs.sort_by(|a, b| a.2.total_cmp(&b.2));

    let mut uf = UnionFind::<usize>::new(n);
    let mut next = 0;
    let mut points = Vec::with_capacity(grid.len());

    for (percent, &threshold) in grid.iter().enumerate() {
        while next < pairs.len() && pairs[next].2 <= threshold {
            uf.union(pairs[next].0, pairs[next].1);
            next += 1;
        }

        let mut sizes: HashMap<usize, usize> = HashMap::new();
        for i in 0..n {
            *sizes.entry(uf.find_mut(i)).or_insert(0) += 1;
        }
        let mut sizes: Vec<usize> = sizes.into_values().collect();
        sizes.sort_unstable_by(|a, b| b.cmp(a));

        points.push(PercolationPoint {
            percent,
            threshold,
            giant_fraction: sizes.first().copied().unwrap_or(0) as f64 / n as f64,
            second_fraction: sizes.get(1).copied().unwrap_or(0) as f64 / n as f64,
        });
    }

    let mut suggested_percent = 0;
    for p in &points {
        if p.second_fraction > points[suggested_percent].second_fraction {
            suggested_percent = p.percent;
        }
    }

    Ok(PercolationProfile {
        points,
        suggested_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx_eq(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-10,
            "actual ({actual}) != expected ({expected})"
        );
    }

    /// Two tight groups of three points, far apart on the x axis.
    fn two_blobs() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![10.0, 0.0],
            vec![10.1, 0.0],
            vec![10.0, 0.1],
        ]
    }

    #[test]
    fn metrics_match_hand_computed_values() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert_approx_eq(DistanceMetric::Euclidean.distance(&a, &b), 5.0);
        assert_approx_eq(DistanceMetric::Chebyshev.distance(&a, &b), 4.0);
    }

    #[test]
    fn matrix_is_symmetric_with_zero_diagonal() {
        let dm = DistanceMatrix::from_points(&two_blobs(), DistanceMetric::Euclidean)
            .expect("distances");
        assert_eq!(dm.len(), 6);
        for i in 0..6 {
            assert_approx_eq(dm.get(i, i), 0.0);
            for j in 0..6 {
                assert_approx_eq(dm.get(i, j), dm.get(j, i));
            }
        }
        assert_approx_eq(dm.get(0, 3), 10.0);
        assert_eq!(dm.pairs().count(), 15);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let err = DistanceMatrix::from_points(&[vec![0.0], vec![1.0, 2.0]], DistanceMetric::default())
            .expect_err("dimension mismatch");
        assert!(matches!(err, Error::InvalidParameter { name: "points", .. }));
    }

    #[test]
    fn grid_spans_min_to_max() {
        let points = vec![vec![0.0], vec![1.0], vec![3.0]];
        let dm = DistanceMatrix::from_points(&points, DistanceMetric::Euclidean).expect("distances");
        let grid = threshold_grid(&dm).expect("grid");
        assert_eq!(grid.len(), GRID_STEPS);
        assert_approx_eq(grid[0], 1.0);
        assert_approx_eq(grid[99], 3.0);
        assert_approx_eq(choose_threshold(&dm, 0).expect("threshold"), 1.0);
    }

    #[test]
    fn percent_out_of_range_is_rejected() {
        let dm = DistanceMatrix::from_points(&two_blobs(), DistanceMetric::default()).expect("distances");
        assert!(choose_threshold(&dm, 100).is_err());
    }

    #[test]
    fn single_point_has_no_grid() {
        let dm = DistanceMatrix::from_points(&[vec![1.0, 1.0]], DistanceMetric::default())
            .expect("distances");
        assert!(threshold_grid(&dm).is_err());
    }

    #[test]
    fn proximity_graph_links_close_points_only() {
        let dm = DistanceMatrix::from_points(&two_blobs(), DistanceMetric::Chebyshev).expect("distances");
        let graph = proximity_graph(&dm, 0.5).expect("graph");
        assert_eq!(graph.node_count(), 6);
        // Each blob is a triangle.
        assert_eq!(graph.edge_count(), 6);
        let a = graph.node_index(0).expect("node 0");
        let d = graph.node_index(3).expect("node 3");
        assert!(!graph.contains_edge(a, d));
    }

    #[test]
    fn proximity_graph_keeps_isolated_points() {
        let dm = DistanceMatrix::from_points(&two_blobs(), DistanceMetric::Chebyshev).expect("distances");
        let graph = proximity_graph(&dm, 0.01).expect("graph");
        assert_eq!(graph.node_count(), 6);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn percolation_profile_peaks_before_blobs_merge() {
        let dm = DistanceMatrix::from_points(&two_blobs(), DistanceMetric::Chebyshev).expect("distances");
        let profile = percolation_profile(&dm).expect("profile");
        assert_eq!(profile.points.len(), GRID_STEPS);

        let suggested = profile.points[profile.suggested_percent];
        assert_approx_eq(suggested.giant_fraction, 0.5);
        assert_approx_eq(suggested.second_fraction, 0.5);

        // Only the single closest pair is linked at the bottom of the grid.
        assert_approx_eq(profile.points[0].giant_fraction, 2.0 / 6.0);
        assert_approx_eq(profile.points[GRID_STEPS - 1].giant_fraction, 1.0);
    }

    #[test]
    fn parse_points_reads_rows() {
        let points = parse_points("# x y\n1 2\n3,4\n\n").expect("points");
        assert_eq!(points, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert!(matches!(parse_points("1 a\n"), Err(Error::Parse { line: 1, .. })));
    }
}
