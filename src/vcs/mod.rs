//! Version-control access
//!
//! Every analysis pass talks to a repository through the
//! [`VersionControlRepository`] trait: commit enumeration, per-path history,
//! revision trees, patch text and commit metadata. [`GitRepository`] is the
//! libgit2-backed implementation.
//!
//! # Example
//!
//! ```no_run
//! use smelltrail::vcs::{GitRepository, VersionControlRepository};
//! use std::path::Path;
//!
//! let repo = GitRepository::open(Path::new("/path/to/repo")).unwrap();
//! let commits = repo.commits(None).unwrap();
//! let history = repo.commits_touching("src/Main.java", &commits[0].sha).unwrap();
//! ```

pub mod git;
pub mod tree;

pub use git::GitRepository;
pub use tree::TreeNode;

use thiserror::Error;

use crate::models::Commit;

/// Errors raised while reading a repository.
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Failed to open git repository at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("Unknown revision '{0}'")]
    UnknownRevision(String),

    #[error("Unknown branch '{0}'")]
    UnknownBranch(String),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
}

pub type VcsResult<T> = Result<T, VcsError>;

/// Read-only queries the analyses need from a repository.
pub trait VersionControlRepository {
    /// Commits reachable from `branch` (HEAD when `None`), oldest first in
    /// topological order, with `position` filled in.
    fn commits(&self, branch: Option<&str>) -> VcsResult<Vec<Commit>>;

    /// Commits reachable from `revision` that changed `path`, newest first.
    fn commits_touching(&self, path: &str, revision: &str) -> VcsResult<Vec<Commit>>;

    /// The full file tree of `revision`.
    fn tree_at(&self, revision: &str) -> VcsResult<TreeNode>;

    /// Per-file patch text between `old` and `new`. `old == None` diffs
    /// against the empty tree.
    fn diff(&self, old: Option<&str>, new: &str) -> VcsResult<Vec<Vec<u8>>>;

    /// Author, committer, date, message and tags of one commit.
    fn commit_metadata(&self, sha: &str) -> VcsResult<Commit>;
}
