//! Repository-level analyses: commit intent, line churn and file ownership

pub mod classification;
pub mod commits;
pub mod diff;
pub mod ownership;

pub use classification::{Category, CommitClassifier};
pub use commits::CommitsAnalyzer;
pub use diff::DiffMetrics;
pub use ownership::OwnershipAnalyzer;
