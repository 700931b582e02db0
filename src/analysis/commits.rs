//! Commit-classification pass
//!
//! Walks a branch from oldest to newest and turns every commit into a
//! [`CommitRecord`]: its classification, its tags and the line counts of its
//! diff against the previous commit of the walk.

use tracing::{debug, warn};

use super::classification::CommitClassifier;
use super::diff::DiffMetrics;
use crate::models::{CommitRecord, DiffStat};
use crate::vcs::{VcsResult, VersionControlRepository};

pub struct CommitsAnalyzer<'a, R: VersionControlRepository + ?Sized> {
    repo: &'a R,
    classifier: CommitClassifier,
    branch: Option<String>,
}

impl<'a, R: VersionControlRepository + ?Sized> CommitsAnalyzer<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self {
            repo,
            classifier: CommitClassifier::new(),
            branch: None,
        }
    }

    /// Walk `branch` instead of HEAD.
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    pub fn analyze(&self) -> VcsResult<Vec<CommitRecord>> {
        let commits = self.repo.commits(self.branch.as_deref())?;
        debug!("Analyzing {} commits", commits.len());

        let mut records = Vec::with_capacity(commits.len());
        let mut previous: Option<&str> = None;
        for commit in &commits {
            // A broken diff costs one commit's line counts, not the pass
            let diff = match DiffMetrics::between(self.repo, previous, &commit.sha) {
                Ok(stat) => stat,
                Err(e) => {
                    warn!("Failed to diff commit {}: {}", commit.sha, e);
                    DiffStat::default()
                }
            };
            records.push(CommitRecord {
                author: commit.author.clone(),
                committer: commit.committer.clone(),
                sha: commit.sha.clone(),
                date: commit.date,
                tags: commit.tags.clone(),
                classifications: self.classifier.classify(&commit.message),
                diff,
                message: commit.message.clone(),
            });
            previous = Some(&commit.sha);
        }
        Ok(records)
    }
}
