//! `hdf detect` — run the pipeline on an edge-list file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use hdforest_core::{Config, Graph};

use super::{DetectFlags, read_input, read_truth, run_and_report};
use crate::output::OutputMode;

/// Arguments for `hdf detect`.
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Edge list: one `u v` pair per line, a lone id declares an isolated node.
    pub edge_file: PathBuf,

    #[command(flatten)]
    pub flags: DetectFlags,

    /// Ground-truth labels, one integer per line in node order.
    #[arg(long)]
    pub truth: Option<PathBuf>,
}

/// Execute `hdf detect`.
pub fn run_detect(args: &DetectArgs, config: &Config, output: OutputMode) -> anyhow::Result<()> {
    let graph = load_graph(&args.edge_file)?;
    let truth = args.truth.as_deref().map(read_truth).transpose()?;
    let detect_config = args.flags.apply(&config.detect);

    run_and_report(
        &args.edge_file.display().to_string(),
        &graph,
        &detect_config,
        truth.as_deref(),
        output,
    )
}

fn load_graph(path: &Path) -> anyhow::Result<Graph> {
    let text = read_input(path)?;
    Graph::parse_edge_list(&text)
        .with_context(|| format!("failed to load graph from {}", path.display()))
}
