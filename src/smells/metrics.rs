//! Per-commit smell counters
//!
//! The metrics file has one row per commit, a `sha` column, and for every
//! developer and smell type three counters (introduced, refactored,
//! deleted). Counter columns are found by their name containing the smell
//! tag; consecutive matches form the triples.

use std::path::Path;
use tracing::warn;

use super::SmellType;
use crate::models::{SmellCommitCounts, SmellCounters};
use crate::report::table::{self, Table, TableError};

pub const SHA_COLUMN: &str = "sha";

/// Counters of one commit, summed over developers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsRow {
    pub sha: String,
    /// One entry per smell type, in `SmellType::ALL` order
    pub counters: Vec<(SmellType, SmellCounters)>,
}

impl MetricsRow {
    pub fn counters(&self, smell: SmellType) -> SmellCounters {
        self.counters
            .iter()
            .find(|(kind, _)| *kind == smell)
            .map(|(_, counters)| *counters)
            .unwrap_or_default()
    }

    pub fn introduces(&self) -> bool {
        self.counters.iter().any(|(_, c)| c.introduced > 0)
    }

    pub fn refactors(&self) -> bool {
        self.counters.iter().any(|(_, c)| c.refactored > 0)
    }

    pub fn deletes(&self) -> bool {
        self.counters.iter().any(|(_, c)| c.deleted > 0)
    }
}

/// A project's metrics file, rows in file order.
#[derive(Debug, Clone, Default)]
pub struct SmellMetrics {
    pub rows: Vec<MetricsRow>,
}

impl SmellMetrics {
    pub fn read(path: &Path) -> Result<Self, TableError> {
        let table = Table::read(path, table::COMMA)?;
        Self::from_table(&table)
    }

    /// Rows with a non-numeric counter are skipped with a warning.
    pub fn from_table(table: &Table) -> Result<Self, TableError> {
        let sha_idx = table.column(SHA_COLUMN)?;
        let groups: Vec<(SmellType, Vec<usize>)> = SmellType::ALL
            .into_iter()
            .map(|smell| {
                let columns = table.columns_containing(smell.tag());
                if columns.len() % 3 != 0 {
                    warn!(
                        "{}: {} has {} counter columns, not a multiple of 3",
                        table.source_name,
                        smell,
                        columns.len()
                    );
                }
                (smell, columns)
            })
            .collect();

        let mut rows = Vec::with_capacity(table.rows.len());
        'rows: for (line, row) in table.rows.iter().enumerate() {
            let mut counters = Vec::with_capacity(groups.len());
            for (smell, columns) in &groups {
                match sum_triples(row, columns) {
                    Ok(sum) => counters.push((*smell, sum)),
                    Err(value) => {
                        warn!(
                            "{}: skipping row {} with malformed {} counter '{}'",
                            table.source_name,
                            line + 2,
                            smell,
                            value
                        );
                        continue 'rows;
                    }
                }
            }
            rows.push(MetricsRow {
                sha: table::field(row, sha_idx).to_string(),
                counters,
            });
        }
        Ok(Self { rows })
    }

    /// How many commits introduce, refactor or delete any smell.
    pub fn commit_counts(&self, project: &str) -> SmellCommitCounts {
        let mut counts = SmellCommitCounts {
            project: project.to_string(),
            commits: self.rows.len(),
            ..Default::default()
        };
        for row in &self.rows {
            let introduced = row.introduces();
            let refactored = row.refactors();
            let deleted = row.deletes();
            counts.introducing += introduced as usize;
            counts.refactoring += refactored as usize;
            counts.deleting += deleted as usize;
            if introduced && (refactored || deleted) {
                counts.introducing_and_removing += 1;
            }
        }
        counts
    }
}

fn sum_triples(row: &[String], columns: &[usize]) -> Result<SmellCounters, String> {
    let mut counters = SmellCounters::default();
    for (offset, idx) in columns.iter().enumerate() {
        let value = parse_counter(table::field(row, *idx))?;
        match offset % 3 {
            0 => counters.introduced += value,
            1 => counters.refactored += value,
            _ => counters.deleted += value,
        }
    }
    Ok(counters)
}

fn parse_counter(raw: &str) -> Result<u64, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse().map_err(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRICS: &str = "\
sha,dev_count,total,alice_HMU_I,alice_HMU_R,alice_HMU_D,bob_HMU_I,bob_HMU_R,bob_HMU_D,alice_LIC_I,alice_LIC_R,alice_LIC_D
c1,1,0,0,0,0,0,0,0,0,0,0
c2,1,1,1,0,0,2,0,0,0,0,0
c3,2,2,0,1,0,0,0,0,1,0,3
";

    fn metrics() -> SmellMetrics {
        let table = Table::parse(METRICS, table::COMMA, "metrics.csv").unwrap();
        SmellMetrics::from_table(&table).unwrap()
    }

    #[test]
    fn test_sums_over_developers() {
        let metrics = metrics();
        assert_eq!(metrics.rows.len(), 3);
        assert_eq!(metrics.rows[1].sha, "c2");
        let hmu = metrics.rows[1].counters(SmellType::Hmu);
        assert_eq!(hmu, SmellCounters { introduced: 3, refactored: 0, deleted: 0 });

        let lic = metrics.rows[2].counters(SmellType::Lic);
        assert_eq!(lic, SmellCounters { introduced: 1, refactored: 0, deleted: 3 });
        assert!(metrics.rows[2].counters(SmellType::Uio).is_empty());
    }

    #[test]
    fn test_commit_counts() {
        let counts = metrics().commit_counts("app");
        assert_eq!(
            counts,
            SmellCommitCounts {
                project: "app".into(),
                commits: 3,
                introducing: 2,
                refactoring: 1,
                deleting: 1,
                introducing_and_removing: 1,
            }
        );
    }

    #[test]
    fn test_malformed_row_is_skipped() {
        let text = "sha,a_HMU_I,a_HMU_R,a_HMU_D\nc1,1,0,0\nc2,x,0,0\nc3,0,0,1\n";
        let table = Table::parse(text, table::COMMA, "m").unwrap();
        let metrics = SmellMetrics::from_table(&table).unwrap();
        let shas: Vec<_> = metrics.rows.iter().map(|r| r.sha.as_str()).collect();
        assert_eq!(shas, vec!["c1", "c3"]);
    }

    #[test]
    fn test_missing_sha_column() {
        let table = Table::parse("commit,a_HMU_I\nc1,1\n", table::COMMA, "m").unwrap();
        assert!(matches!(
            SmellMetrics::from_table(&table),
            Err(TableError::MissingColumn { .. })
        ));
    }
}
