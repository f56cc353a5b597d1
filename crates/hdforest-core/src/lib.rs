#![forbid(unsafe_code)]
//! hdforest-core library.
//!
//! Input side of the hierarchical degree forest pipeline: validated graphs,
//! proximity graphs built from point clouds, benchmark datasets, the shared
//! error model and configuration.
//!
//! # Conventions
//!
//! - **Errors**: library code returns [`error::Result`]; configuration
//!   loading uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod config;
pub mod datasets;
pub mod error;
pub mod graph;
pub mod proximity;

pub use config::{Config, DetectConfig, HierarchyRule, ProximityConfig};
pub use error::{Error, ErrorCode, GraphDefect, Result};
pub use graph::{Graph, NodeId};
