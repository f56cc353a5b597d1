use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::proximity::DistanceMetric;

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "hdforest.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub detect: DetectConfig,
    #[serde(default)]
    pub proximity: ProximityConfig,
}

/// Which edges the degree hierarchy DAG keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyRule {
    /// Every edge between unequal degrees, pointing at the larger degree.
    Full,
    /// Only edges to the neighbours of maximal degree.
    #[default]
    Maximum,
}

impl HierarchyRule {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Maximum => "maximum",
        }
    }
}

impl fmt::Display for HierarchyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HierarchyRule {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "maximum" | "max" => Ok(Self::Maximum),
            other => Err(format!("unknown hierarchy rule `{other}` (expected full|maximum)")),
        }
    }
}

/// Options for one detection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectConfig {
    /// Requested number of centers. With `auto_choose_centers` this is a
    /// lower bound.
    #[serde(default = "default_center_count")]
    pub center_count: usize,
    #[serde(default)]
    pub auto_choose_centers: bool,
    #[serde(default)]
    pub rule: HierarchyRule,
    /// Seed for forest tie-breaking. `None` draws a seed from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            center_count: default_center_count(),
            auto_choose_centers: false,
            rule: HierarchyRule::default(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProximityConfig {
    #[serde(default)]
    pub metric: DistanceMetric,
    /// Index into the 100-step threshold grid.
    #[serde(default = "default_dc_percent")]
    pub dc_percent: usize,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::default(),
            dc_percent: default_dc_percent(),
        }
    }
}

const fn default_center_count() -> usize {
    1
}

const fn default_dc_percent() -> usize {
    6
}

/// Load configuration from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the effective configuration.
///
/// An explicit path must exist. Without one, `hdforest.toml` in `dir` is
/// used when present, otherwise defaults.
///
/// # Errors
///
/// Returns an error if the selected file cannot be read or parsed.
pub fn resolve_config(explicit: Option<&Path>, dir: &Path) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path);
    }

    let path: PathBuf = dir.join(DEFAULT_CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }
    load_config(&path)
}
