//! Commit context of smell counters
//!
//! Joins each metrics row with the commit-analysis output of its project:
//! line churn, categories, message, days since the first commit and days to
//! the next release (the next tagged commit).

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

use super::metrics::SmellMetrics;
use crate::models::{CommitContextRecord, DiffStat};
use crate::report::table::{self, Table, TableError};

/// A commit as read back from a `commits-<project>.csv` table.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitEntry {
    pub date: DateTime<Utc>,
    pub diff: DiffStat,
    pub categories: String,
    pub message: String,
    pub distance_from_startup: i64,
    /// -1 until a release at or after this commit is seen
    pub distance_to_release: i64,
}

/// The commit-analysis table of one project, keyed by sha.
#[derive(Debug, Clone, Default)]
pub struct CommitHistory {
    entries: HashMap<String, CommitEntry>,
}

impl CommitHistory {
    pub fn read(path: &Path, delimiter: &str) -> Result<Self, TableError> {
        let table = Table::read(path, delimiter)?;
        Self::from_table(&table)
    }

    /// Rows are expected oldest first. Rows with an unreadable date or
    /// count are skipped with a warning.
    pub fn from_table(table: &Table) -> Result<Self, TableError> {
        let sha_idx = table.column("sha1")?;
        let date_idx = table.column("date")?;
        let tags_idx = table.column("tags")?;
        let addition_idx = table.column("addition")?;
        let deletion_idx = table.column("deletion")?;
        let categories_idx = table.column("classifications")?;
        let message_idx = table.column("message")?;

        let mut entries: HashMap<String, CommitEntry> = HashMap::new();
        let mut first_date: Option<DateTime<Utc>> = None;
        for row in &table.rows {
            let sha = table::field(row, sha_idx);
            let parsed = parse_date(table::field(row, date_idx)).and_then(|date| {
                let additions = table::field(row, addition_idx).trim().parse().ok()?;
                let deletions = table::field(row, deletion_idx).trim().parse().ok()?;
                Some((date, DiffStat { additions, deletions }))
            });
            let Some((date, diff)) = parsed else {
                warn!("{}: skipping unreadable commit row {}", table.source_name, sha);
                continue;
            };

            let startup = *first_date.get_or_insert(date);
            entries.insert(
                sha.to_string(),
                CommitEntry {
                    date,
                    diff,
                    categories: table::field(row, categories_idx).to_string(),
                    message: table::field(row, message_idx).to_string(),
                    distance_from_startup: (date - startup).num_days(),
                    distance_to_release: -1,
                },
            );

            if is_release(table::field(row, tags_idx)) {
                for entry in entries.values_mut() {
                    if entry.distance_to_release == -1 && entry.date <= date {
                        entry.distance_to_release = (date - entry.date).num_days();
                    }
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, sha: &str) -> Option<&CommitEntry> {
        self.entries.get(sha)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

fn is_release(tags: &str) -> bool {
    let tags = tags.trim();
    !tags.is_empty() && tags != "[]"
}

/// One context row per metrics row whose commit is known.
pub fn commit_context(
    project: &str,
    metrics: &SmellMetrics,
    history: &CommitHistory,
) -> Vec<CommitContextRecord> {
    metrics
        .rows
        .iter()
        .filter_map(|row| {
            let Some(entry) = history.get(&row.sha) else {
                warn!("[{}] Commit {} missing from the commit analysis", project, row.sha);
                return None;
            };
            Some(CommitContextRecord {
                project: project.to_string(),
                sha: row.sha.clone(),
                diff: entry.diff,
                categories: entry.categories.clone(),
                smells: row.counters.clone(),
                distance_to_release: entry.distance_to_release,
                distance_from_startup: entry.distance_from_startup,
                message: entry.message.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smells::SmellType;

    const ALIF: &str = "ا";

    fn history() -> CommitHistory {
        let rows = [
            ["Alice", "Alice", "c1", "2020-01-01T00:00:00+00:00", "[]", "['feature']", "10", "0", "10", "Initial"],
            ["Bob", "Bob", "c2", "2020-01-03T12:00:00+00:00", "[]", "['fix']", "2", "1", "3", "Fix bug"],
            ["Bob", "Bob", "c3", "2020-01-11T00:00:00+00:00", "['v1']", "[]", "1", "1", "2", "Release"],
            ["Eve", "Eve", "c4", "2020-01-12T00:00:00+00:00", "[]", "[]", "5", "0", "5", "After"],
        ];
        let header = [
            "author", "committer", "sha1", "date", "tags", "classifications", "addition",
            "deletion", "size", "message",
        ];
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|r| r.iter().map(|f| f.to_string()).collect())
            .collect();
        let text = table::render(&header, &rows, ALIF);
        CommitHistory::from_table(&Table::parse(&text, ALIF, "commits").unwrap()).unwrap()
    }

    #[test]
    fn test_distances() {
        let history = history();
        assert_eq!(history.len(), 4);

        let c2 = history.get("c2").unwrap();
        assert_eq!(c2.distance_from_startup, 2);
        assert_eq!(c2.distance_to_release, 7);
        assert_eq!(c2.diff, DiffStat { additions: 2, deletions: 1 });

        assert_eq!(history.get("c1").unwrap().distance_to_release, 10);
        assert_eq!(history.get("c3").unwrap().distance_to_release, 0);
        assert_eq!(history.get("c4").unwrap().distance_to_release, -1);
        assert_eq!(history.get("c4").unwrap().distance_from_startup, 11);
    }

    #[test]
    fn test_commit_context_joins_rows() {
        let history = history();
        let metrics_text = "sha,a_IOD_I,a_IOD_R,a_IOD_D\nc2,1,0,2\nmissing,1,0,0\n";
        let metrics =
            SmellMetrics::from_table(&Table::parse(metrics_text, table::COMMA, "m").unwrap()).unwrap();

        let records = commit_context("app", &metrics, &history);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.sha, "c2");
        assert_eq!(record.categories, "['fix']");
        assert_eq!(record.message, "Fix bug");
        let iod = record
            .smells
            .iter()
            .find(|(smell, _)| *smell == SmellType::Iod)
            .map(|(_, c)| *c)
            .unwrap();
        assert_eq!(iod.removed(), 2);
    }
}
