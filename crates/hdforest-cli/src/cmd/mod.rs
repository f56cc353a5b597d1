//! Subcommand handlers and the pieces they share.

pub mod dataset;
pub mod detect;
pub mod points;
pub mod profile;

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use clap::Args;
use hdforest_core::graph::parse_labels;
use hdforest_core::{DetectConfig, Graph, HierarchyRule, NodeId};
use hdforest_detect::{DiagnosticBundle, PairScores, detect, modularity, pairwise_scores};
use serde::Serialize;
use tracing::debug;

use crate::output::{OutputMode, pretty_kv, pretty_section, render};

/// Detection options shared by every subcommand that runs the pipeline.
///
/// Flags left unset fall back to the `[detect]` section of the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct DetectFlags {
    /// Number of centers to select (a lower bound with --auto).
    #[arg(long, short = 'k')]
    pub centers: Option<usize>,

    /// Let score gaps suggest the number of centers.
    #[arg(long, overrides_with = "no_auto")]
    pub auto: bool,

    /// Use exactly the requested count even if the config file enables --auto.
    #[arg(long, overrides_with = "auto")]
    pub no_auto: bool,

    /// Degree hierarchy rule: maximum or full.
    #[arg(long)]
    pub rule: Option<HierarchyRule>,

    /// Seed for forest tie-breaking; omitted means a random seed.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl DetectFlags {
    /// Overlay the flags that were given on top of `base`.
    #[must_use]
    pub fn apply(&self, base: &DetectConfig) -> DetectConfig {
        DetectConfig {
            center_count: self.centers.unwrap_or(base.center_count),
            auto_choose_centers: !self.no_auto && (self.auto || base.auto_choose_centers),
            rule: self.rule.unwrap_or(base.rule),
            seed: self.seed.or(base.seed),
        }
    }
}

/// Read a text input file with a useful error message.
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Read a ground-truth label file (one integer per line, node order).
pub fn read_truth(path: &Path) -> anyhow::Result<Vec<i64>> {
    let text = read_input(path)?;
    parse_labels(&text).with_context(|| format!("failed to parse labels in {}", path.display()))
}

// ---------------------------------------------------------------------------
// Detection summary
// ---------------------------------------------------------------------------

/// Report payload shared by `detect`, `points` and `dataset`.
#[derive(Debug, Serialize)]
pub struct DetectionSummary {
    pub source: String,
    pub nodes: usize,
    pub edges: usize,
    pub centers: Vec<NodeId>,
    pub group_sizes: BTreeMap<NodeId, usize>,
    pub noise: usize,
    pub modularity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement: Option<PairScores>,
    pub partition: BTreeMap<NodeId, i64>,
    pub diagnostics: DiagnosticBundle,
}

/// Run the pipeline on `graph` and render the summary.
pub fn run_and_report(
    source: &str,
    graph: &Graph,
    config: &DetectConfig,
    truth: Option<&[i64]>,
    output: OutputMode,
) -> anyhow::Result<()> {
    debug!(source, ?config, "running detection");
    let detection = detect(graph, config).context("detection failed")?;

    let labels = detection.partition.as_list();
    let modularity = modularity(graph, &labels)?;
    let agreement = truth
        .map(|truth| pairwise_scores(&labels, truth))
        .transpose()
        .context("ground truth does not match the graph")?;

    let report = detection.report();
    let summary = DetectionSummary {
        source: source.to_string(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        centers: report.centers,
        group_sizes: report.group_sizes,
        noise: report.noise,
        modularity,
        agreement,
        partition: report.partition,
        diagnostics: report.diagnostics,
    };

    render(output, &summary, render_summary_human)
}

fn render_summary_human(summary: &DetectionSummary, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Communities in {}", summary.source))?;
    pretty_kv(w, "nodes", summary.nodes.to_string())?;
    pretty_kv(w, "edges", summary.edges.to_string())?;
    pretty_kv(w, "rule", summary.diagnostics.rule.as_str())?;
    pretty_kv(w, "leaders", summary.diagnostics.leader_count.to_string())?;
    if let Some(suggested) = summary.diagnostics.suggested_centers {
        pretty_kv(w, "suggested", suggested.to_string())?;
    }
    pretty_kv(w, "centers", join_ids(&summary.centers))?;
    pretty_kv(w, "noise", summary.noise.to_string())?;
    pretty_kv(w, "modularity", format!("{:.4}", summary.modularity))?;
    if let Some(scores) = summary.agreement {
        pretty_kv(
            w,
            "agreement",
            format!(
                "precision {:.3}  recall {:.3}  f1 {:.3}",
                scores.precision, scores.recall, scores.f1
            ),
        )?;
    }

    writeln!(w)?;
    pretty_section(w, "Groups")?;
    for center in &summary.centers {
        let size = summary.group_sizes.get(center).copied().unwrap_or(0);
        writeln!(w, "  center {center:<8} {size} nodes")?;
    }
    Ok(())
}

fn join_ids(ids: &[NodeId]) -> String {
    if ids.is_empty() {
        return "(none)".to_string();
    }
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_only_what_was_given() {
        let base = DetectConfig {
            center_count: 4,
            auto_choose_centers: false,
            rule: HierarchyRule::Full,
            seed: Some(9),
        };
        let flags = DetectFlags {
            centers: None,
            auto: true,
            no_auto: false,
            rule: Some(HierarchyRule::Maximum),
            seed: None,
        };
        let merged = flags.apply(&base);
        assert_eq!(merged.center_count, 4);
        assert!(merged.auto_choose_centers);
        assert_eq!(merged.rule, HierarchyRule::Maximum);
        assert_eq!(merged.seed, Some(9));
    }

    #[test]
    fn no_auto_turns_off_config_auto() {
        let base = DetectConfig {
            auto_choose_centers: true,
            ..DetectConfig::default()
        };
        let unset = DetectFlags::default();
        assert!(unset.apply(&base).auto_choose_centers);

        let off = DetectFlags {
            no_auto: true,
            ..DetectFlags::default()
        };
        let merged = off.apply(&base);
        assert!(!merged.auto_choose_centers);
        assert_eq!(merged.center_count, base.center_count);
    }

    #[test]
    fn empty_id_list_renders_placeholder() {
        assert_eq!(join_ids(&[]), "(none)");
        assert_eq!(join_ids(&[33, 0]), "33, 0");
    }
}
