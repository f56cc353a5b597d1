//! `hdf points` — threshold a point cloud into a proximity graph, then
//! detect communities in it.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use hdforest_core::Config;
use hdforest_core::proximity::{
    DistanceMatrix, DistanceMetric, choose_threshold, parse_points, proximity_graph,
};
use tracing::info;

use super::{DetectFlags, read_input, read_truth, run_and_report};
use crate::output::OutputMode;

/// Arguments for `hdf points`.
#[derive(Args, Debug)]
pub struct PointsArgs {
    /// Point file: one point per line, numeric coordinates.
    pub point_file: PathBuf,

    /// Index (0-99) into the distance threshold grid.
    #[arg(long)]
    pub dc_percent: Option<usize>,

    /// Distance metric: euclidean or chebyshev.
    #[arg(long)]
    pub metric: Option<DistanceMetric>,

    #[command(flatten)]
    pub flags: DetectFlags,

    /// Ground-truth labels, one integer per line in point order.
    #[arg(long)]
    pub truth: Option<PathBuf>,
}

/// Execute `hdf points`.
pub fn run_points(args: &PointsArgs, config: &Config, output: OutputMode) -> anyhow::Result<()> {
    let text = read_input(&args.point_file)?;
    let points = parse_points(&text)
        .with_context(|| format!("failed to parse points in {}", args.point_file.display()))?;

    let metric = args.metric.unwrap_or(config.proximity.metric);
    let percent = args.dc_percent.unwrap_or(config.proximity.dc_percent);

    let matrix = DistanceMatrix::from_points(&points, metric)?;
    let threshold = choose_threshold(&matrix, percent)?;
    let graph = proximity_graph(&matrix, threshold)?;
    info!(
        points = points.len(),
        %metric,
        percent,
        threshold,
        edges = graph.edge_count(),
        "built proximity graph"
    );

    let truth = args.truth.as_deref().map(read_truth).transpose()?;
    run_and_report(
        &args.point_file.display().to_string(),
        &graph,
        &args.flags.apply(&config.detect),
        truth.as_deref(),
        output,
    )
}
