//! `hdf dataset` — run the pipeline on a built-in benchmark graph.

use clap::{Args, ValueEnum};
use hdforest_core::datasets::{karate_club, ring_lattice};
use hdforest_core::{Config, NodeId};

use super::{DetectFlags, run_and_report};
use crate::output::OutputMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DatasetName {
    /// Zachary's karate club, scored against its two factions.
    Karate,
    /// Ring lattice where every node has degree 4.
    Ring,
}

/// Arguments for `hdf dataset`.
#[derive(Args, Debug)]
pub struct DatasetArgs {
    /// Which dataset to load.
    #[arg(value_enum)]
    pub name: DatasetName,

    /// Node count for the ring lattice (at least 5).
    #[arg(long, default_value_t = 20)]
    pub size: NodeId,

    #[command(flatten)]
    pub flags: DetectFlags,
}

/// Execute `hdf dataset`.
pub fn run_dataset(args: &DatasetArgs, config: &Config, output: OutputMode) -> anyhow::Result<()> {
    let detect_config = args.flags.apply(&config.detect);
    match args.name {
        DatasetName::Karate => {
            let karate = karate_club()?;
            run_and_report("karate", &karate.graph, &detect_config, Some(&karate.truth), output)
        }
        DatasetName::Ring => {
            let ring = ring_lattice(args.size)?;
            run_and_report(
                &format!("ring({})", args.size),
                &ring,
                &detect_config,
                None,
                output,
            )
        }
    }
}
