#![forbid(unsafe_code)]
//! hdforest-detect library.
//!
//! Community detection from node degree alone: a degree hierarchy DAG, a
//! randomized spanning forest rooted at local degree maxima, a hierarchy
//! among those leaders, a composite score picking centers, and a final
//! partition. [`detect`] runs all of it.
//!
//! # Conventions
//!
//! - **Errors**: Use [`hdforest_core::Result`] for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).
//! - **Node indices**: every per-node table is a `Vec` indexed by
//!   `NodeIndex::index()` of the input graph.

pub mod forest;
pub mod hierarchy;
pub mod leaders;
pub mod partition;
pub mod pipeline;
pub mod quality;
pub mod score;

pub use forest::{Forest, TreeSlot};
pub use hierarchy::DegreeDag;
pub use leaders::{DistanceMode, LeaderHierarchy, LeaderLink};
pub use partition::{Assignment, NOISE_LABEL, Partition};
pub use pipeline::{Detection, DetectionReport, DiagnosticBundle, detect, detect_with_rng};
pub use quality::{PairScores, compact_labels, modularity, pairwise_scores};
pub use score::{CenterSelection, ScoredNode};
