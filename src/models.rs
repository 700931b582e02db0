//! Core data models for smelltrail
//!
//! These models describe what is read from a repository (commits, diffs,
//! ownership) and the typed rows produced by each analysis pass. Every
//! record is immutable once built; passes only ever append new records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::classification::Category;
use crate::smells::SmellType;

/// A commit materialized from the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit hash
    pub sha: String,
    /// Author name
    pub author: String,
    /// Author email; one name may commit under several
    pub author_email: String,
    /// Committer name
    pub committer: String,
    /// Commit timestamp
    pub date: DateTime<Utc>,
    /// Full commit message
    pub message: String,
    /// Names of the tags pointing at this commit
    pub tags: Vec<String>,
    /// Position in the oldest-first topological walk, when known
    pub position: Option<usize>,
}

/// Added/removed line counts between two revisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStat {
    pub additions: usize,
    pub deletions: usize,
}

impl DiffStat {
    pub fn size(&self) -> usize {
        self.additions + self.deletions
    }
}

/// Authorship dominance of one file at one revision.
///
/// `owner` is `None` when no author holds more than the ownership threshold
/// of the commits touching the file. Such records are kept on purpose: they
/// are the denominator of a project's ownership coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub file: String,
    pub revision: String,
    pub owner: Option<String>,
    /// Share of the touching commits made by `owner`, 0 when unowned
    pub ratio: f64,
}

impl OwnershipRecord {
    pub fn unowned(file: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            revision: revision.into(),
            owner: None,
            ratio: 0.0,
        }
    }

    pub fn is_owned(&self) -> bool {
        self.owner.is_some()
    }
}

/// Lifecycle transition of a smell instance between two analyzed commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Introduced,
    Refactored,
    Deleted,
    /// Refactored or deleted
    Removed,
    /// Removed in a commit whose counters report both refactorings and deletions
    Ambiguous,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Introduced,
        EventKind::Refactored,
        EventKind::Deleted,
        EventKind::Removed,
        EventKind::Ambiguous,
    ];
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Introduced => write!(f, "introduced"),
            EventKind::Refactored => write!(f, "refactored"),
            EventKind::Deleted => write!(f, "deleted"),
            EventKind::Removed => write!(f, "removed"),
            EventKind::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

/// One smell-instance transition joined with the ownership of its file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmellLifecycleEvent {
    pub project: String,
    pub sha: String,
    pub smell_type: SmellType,
    pub instance: String,
    /// Resolved source file, `None` when the instance could not be located
    pub file: Option<String>,
    /// Owner of `file` at the attributed revision, empty when unowned
    pub developer: String,
    pub is_owner: bool,
    pub kind: EventKind,
}

/// Per-commit output of the commit-classification pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub author: String,
    pub committer: String,
    pub sha: String,
    pub date: DateTime<Utc>,
    pub tags: Vec<String>,
    pub classifications: Vec<Category>,
    pub diff: DiffStat,
    pub message: String,
}

/// A smell-instance row bound to the ownership of its host file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmellOwnershipRecord {
    pub sha: String,
    /// Author of the commit the smell was recorded at
    pub author: String,
    pub instance: String,
    pub file: String,
    pub is_owner: bool,
}

/// How many commits of a project introduce, refactor or delete smells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmellCommitCounts {
    pub project: String,
    pub commits: usize,
    pub introducing: usize,
    pub refactoring: usize,
    pub deleting: usize,
    pub introducing_and_removing: usize,
}

/// Per-type counters of one commit, as summed from the metrics file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmellCounters {
    pub introduced: u64,
    pub refactored: u64,
    pub deleted: u64,
}

impl SmellCounters {
    pub fn removed(&self) -> u64 {
        self.refactored + self.deleted
    }

    pub fn is_empty(&self) -> bool {
        self.introduced + self.removed() == 0
    }
}

/// A commit joined with its smell counters and release context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitContextRecord {
    pub project: String,
    pub sha: String,
    pub diff: DiffStat,
    pub categories: String,
    /// Counters in `SmellType::ALL` order
    pub smells: Vec<(SmellType, SmellCounters)>,
    /// Days until the next tagged commit, -1 when no release follows
    pub distance_to_release: i64,
    /// Days since the project's first commit
    pub distance_from_startup: i64,
    pub message: String,
}

/// Summary of one project's `analyze` pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project: String,
    pub commits: usize,
    pub files: usize,
    pub owned_files: usize,
}

impl ProjectSummary {
    /// Share of audited files that have an owner.
    pub fn ownership_coverage(&self) -> f64 {
        if self.files == 0 {
            0.0
        } else {
            self.owned_files as f64 / self.files as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_stat_size() {
        let stat = DiffStat {
            additions: 12,
            deletions: 5,
        };
        assert_eq!(stat.size(), 17);
    }

    #[test]
    fn test_counters_removed_and_empty() {
        let counters = SmellCounters {
            introduced: 0,
            refactored: 2,
            deleted: 1,
        };
        assert_eq!(counters.removed(), 3);
        assert!(!counters.is_empty());
        assert!(SmellCounters::default().is_empty());
    }

    #[test]
    fn test_ownership_coverage() {
        let summary = ProjectSummary {
            project: "p".into(),
            commits: 10,
            files: 4,
            owned_files: 3,
        };
        assert!((summary.ownership_coverage() - 0.75).abs() < f64::EPSILON);
        assert_eq!(ProjectSummary::default().ownership_coverage(), 0.0);
    }

    #[test]
    fn test_unowned_record() {
        let record = OwnershipRecord::unowned("src/A.java", "abc");
        assert!(!record.is_owned());
        assert_eq!(record.ratio, 0.0);
    }
}
