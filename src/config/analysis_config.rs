//! Analysis configuration support
//!
//! Loads configuration from `smelltrail.toml` or `.smelltrailrc.json` in the
//! working directory, or from an explicit file.
//!
//! # Configuration Format
//!
//! ```toml
//! # smelltrail.toml
//!
//! [output]
//! delimiter = "ا"
//!
//! [ownership]
//! threshold = 0.75
//! extensions = [".java"]
//!
//! [analysis]
//! workers = 4
//! binding_workers = 2
//! branch = "master"
//!
//! [layout]
//! metrics_file = "metrics/metrics-perDev-perCommit-perSmell.csv"
//! smells_dir = "smells"
//! ```

use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::analysis::ownership::DEFAULT_THRESHOLD;
use crate::report::DEFAULT_DELIMITER;

pub const TOML_FILE: &str = "smelltrail.toml";
pub const JSON_FILE: &str = ".smelltrailrc.json";

/// Complete analysis configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub output: OutputConfig,
    pub ownership: OwnershipConfig,
    pub analysis: RunConfig,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Field separator of output tables
    pub delimiter: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OwnershipConfig {
    /// Share of commits above which an author owns a file
    pub threshold: f64,
    /// Suffixes of the files audited by `analyze`
    pub extensions: Vec<String>,
}

impl Default for OwnershipConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            extensions: vec![".java".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Projects analyzed in parallel
    pub workers: usize,
    /// Smell logs bound in parallel inside one project
    pub binding_workers: usize,
    /// Branch to walk, HEAD when unset
    pub branch: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            binding_workers: 2,
            branch: None,
        }
    }
}

/// Input file names, relative to a project's input directory.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub metrics_file: String,
    pub smells_dir: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            metrics_file: "metrics/metrics-perDev-perCommit-perSmell.csv".to_string(),
            smells_dir: "smells".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Reject values no analysis can run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..1.0).contains(&self.ownership.threshold) {
            bail!(
                "ownership threshold must be in [0, 1), got {}",
                self.ownership.threshold
            );
        }
        if self.output.delimiter.is_empty() {
            bail!("output delimiter must not be empty");
        }
        if self.output.delimiter.contains('"') || self.output.delimiter.contains('\n') {
            bail!("output delimiter must not contain quotes or line breaks");
        }
        Ok(())
    }
}

/// Load configuration from `dir`, or defaults when no file is usable.
pub fn load_config(dir: &Path) -> AnalysisConfig {
    // TOML first (preferred format)
    let toml_path = dir.join(TOML_FILE);
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded config from {}", toml_path.display());
                return config;
            }
            Err(e) => warn!("Failed to load {}: {}", toml_path.display(), e),
        }
    }

    let json_path = dir.join(JSON_FILE);
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded config from {}", json_path.display());
                return config;
            }
            Err(e) => warn!("Failed to load {}: {}", json_path.display(), e),
        }
    }

    debug!("No config found, using defaults");
    AnalysisConfig::default()
}

/// Load an explicitly named config file; its format follows its extension.
pub fn load_config_file(path: &Path) -> anyhow::Result<AnalysisConfig> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => load_json_config(path),
        _ => load_toml_config(path),
    }
}

fn load_toml_config(path: &Path) -> anyhow::Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: AnalysisConfig = toml::from_str(&content)?;
    Ok(config)
}

fn load_json_config(path: &Path) -> anyhow::Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: AnalysisConfig = serde_json::from_str(&content)?;
    Ok(config)
}
