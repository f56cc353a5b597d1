//! `hdf profile` — percolation profile of a point cloud, used to pick a
//! threshold percent for `hdf points`.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use hdforest_core::Config;
use hdforest_core::proximity::{
    DistanceMatrix, DistanceMetric, PercolationProfile, parse_points, percolation_profile,
};

use crate::cmd::read_input;
use crate::output::{OutputMode, pretty_kv, pretty_section, render};

/// Arguments for `hdf profile`.
#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Point file: one point per line, numeric coordinates.
    pub point_file: PathBuf,

    /// Distance metric: euclidean or chebyshev.
    #[arg(long)]
    pub metric: Option<DistanceMetric>,
}

/// Execute `hdf profile`.
pub fn run_profile(args: &ProfileArgs, config: &Config, output: OutputMode) -> anyhow::Result<()> {
    let text = read_input(&args.point_file)?;
    let points = parse_points(&text)
        .with_context(|| format!("failed to parse points in {}", args.point_file.display()))?;
    let metric = args.metric.unwrap_or(config.proximity.metric);

    let matrix = DistanceMatrix::from_points(&points, metric)?;
    let profile = percolation_profile(&matrix)?;

    render(output, &profile, render_profile_human)
}

fn render_profile_human(profile: &PercolationProfile, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Percolation profile")?;
    writeln!(w, "{:>7}  {:>12}  {:>8}  {:>8}", "percent", "threshold", "giant", "second")?;
    for point in &profile.points {
        writeln!(
            w,
            "{:>7}  {:>12.6}  {:>8.4}  {:>8.4}",
            point.percent, point.threshold, point.giant_fraction, point.second_fraction
        )?;
    }
    writeln!(w)?;
    pretty_kv(w, "suggested", profile.suggested_percent.to_string())
}
