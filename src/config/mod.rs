//! Configuration module for smelltrail
//!
//! This module handles:
//! - The configuration file (smelltrail.toml or .smelltrailrc.json)
//! - Ownership threshold and audited extensions
//! - Input layout of the smell detector outputs

mod analysis_config;

pub use analysis_config::{
    load_config, load_config_file, AnalysisConfig, LayoutConfig, OutputConfig, OwnershipConfig,
    RunConfig, JSON_FILE, TOML_FILE,
};
