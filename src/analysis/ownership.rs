//! Per-file authorship dominance
//!
//! A file is owned by the author of more than `threshold` (strictly) of the
//! commits that touched it up to a revision. An author is a name and email
//! pair. Files without such an author still get a record, with no owner and a
//! ratio of 0.

use std::collections::BTreeMap;
use tracing::debug;

use crate::models::OwnershipRecord;
use crate::vcs::{VcsResult, VersionControlRepository};

pub const DEFAULT_THRESHOLD: f64 = 0.75;

pub struct OwnershipAnalyzer<'a, R: VersionControlRepository + ?Sized> {
    repo: &'a R,
    threshold: f64,
}

impl<'a, R: VersionControlRepository + ?Sized> OwnershipAnalyzer<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self {
            repo,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Dominant author of `path` over the history reachable from `revision`.
    pub fn owner_of(&self, path: &str, revision: &str) -> VcsResult<OwnershipRecord> {
        let history = self.repo.commits_touching(path, revision)?;
        let authors = history
            .iter()
            .map(|c| (c.author.as_str(), c.author_email.as_str()));
        let record = dominant_author(authors, self.threshold)
            .map(|(owner, ratio)| OwnershipRecord {
                file: path.to_string(),
                revision: revision.to_string(),
                owner: Some(owner),
                ratio,
            })
            .unwrap_or_else(|| OwnershipRecord::unowned(path, revision));
        debug!(
            "Ownership of {} at {}: {:?} ({:.2})",
            path, revision, record.owner, record.ratio
        );
        Ok(record)
    }

    /// Ownership of every file of `revision` ending with one of `extensions`.
    pub fn audit(&self, revision: &str, extensions: &[String]) -> VcsResult<Vec<OwnershipRecord>> {
        let tree = self.repo.tree_at(revision)?;
        tree.files()
            .into_iter()
            .filter(|file| extensions.iter().any(|ext| file.ends_with(ext.as_str())))
            .map(|file| self.owner_of(file, revision))
            .collect()
    }
}

/// The most frequent author and its share, if that share exceeds `threshold`.
///
/// Authors are `(name, email)` pairs: one name under two emails counts as two
/// authors. Ties go to the lexicographically smallest pair. The owner is
/// reported by name.
pub fn dominant_author<'s>(
    authors: impl IntoIterator<Item = (&'s str, &'s str)>,
    threshold: f64,
) -> Option<(String, f64)> {
    let mut tally: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    let mut total = 0usize;
    for author in authors {
        *tally.entry(author).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return None;
    }

    // BTreeMap iterates in key order, so the first maximum is the smallest key
    let ((name, _), count) = tally
        .into_iter()
        .fold(None::<((&str, &str), usize)>, |best, (key, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((key, n)),
        })?;

    let ratio = count as f64 / total as f64;
    (ratio > threshold).then(|| (name.to_string(), ratio))
}
