//! Code-smell lifecycle and ownership analyses
//!
//! Inputs are produced by an external smell detector: a per-commit metrics
//! file of introduction/refactoring/deletion counters and one instance log
//! per smell type. This module locates smell instances in the repository,
//! rebuilds their lifecycle and binds them to file owners.

pub mod binding;
pub mod context;
pub mod instances;
pub mod lifecycle;
pub mod metrics;
pub mod resolver;
pub mod types;

pub use binding::SmellOwnershipBinder;
pub use lifecycle::{CommitOrdering, SmellLifecycleMerger};
pub use metrics::SmellMetrics;
pub use resolver::SmellInstanceResolver;
pub use types::SmellType;

use thiserror::Error;

use crate::report::TableError;
use crate::vcs::VcsError;

#[derive(Error, Debug)]
pub enum SmellError {
    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Failed to build thread pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
