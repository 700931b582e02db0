//! smelltrail - code-smell lifecycles and ownership from git history
//!
//! The library behind the `smelltrail` binary:
//! - [`analysis`] classifies commits, measures churn and computes file ownership
//! - [`smells`] resolves smell instances to files and rebuilds their lifecycle
//! - [`pipeline`] runs a pass over many projects in parallel
//! - [`report`] serializes the resulting records as delimited tables

pub mod analysis;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod smells;
pub mod vcs;

#[cfg(test)]
mod testutil;
