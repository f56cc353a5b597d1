#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use hdforest_core::config::resolve_config;
use output::{CliError, OutputMode, render_error};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "hdf: community detection with hierarchical degree forests",
    propagate_version = true
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to ./hdforest.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Detect",
        about = "Detect communities in an edge list",
        long_about = "Detect communities in an undirected edge-list file and report centers, \
                      group sizes, noise and modularity."
    )]
    Detect(cmd::detect::DetectArgs),

    #[command(
        next_help_heading = "Detect",
        about = "Detect communities in a point cloud",
        long_about = "Build a proximity graph from points at a distance threshold, then detect \
                      communities in it."
    )]
    Points(cmd::points::PointsArgs),

    #[command(
        next_help_heading = "Explore",
        about = "Show the percolation profile of a point cloud",
        long_about = "Sweep the distance threshold grid and report the giant and second \
                      component fractions, with a suggested threshold percent."
    )]
    Profile(cmd::profile::ProfileArgs),

    #[command(
        next_help_heading = "Explore",
        about = "Run detection on a built-in dataset"
    )]
    Dataset(cmd::dataset::DatasetArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("HDF_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "hdforest=debug,info"
        } else {
            "hdforest=info,warn"
        })
    });

    let format = env::var("HDF_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init();
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let cwd = env::current_dir()?;
    let config = resolve_config(cli.config.as_deref(), &cwd)?;
    let output = cli.output_mode();

    match &cli.command {
        Commands::Detect(args) => cmd::detect::run_detect(args, &config, output),
        Commands::Points(args) => cmd::points::run_points(args, &config, output),
        Commands::Profile(args) => cmd::profile::run_profile(args, &config, output),
        Commands::Dataset(args) => cmd::dataset::run_dataset(args, &config, output),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let rendered = render_error(cli.output_mode(), &CliError::from_anyhow(&err));
            if rendered.is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
