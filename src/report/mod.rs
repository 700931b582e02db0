//! Output tables for smelltrail analyses
//!
//! Every output stream has one record type implementing [`Record`]; rows are
//! buffered by the caller and serialized in one go by [`write_table`].
//!
//! Output files:
//! - `commits-<project>.csv` - classified commits with line churn
//! - `ownership-<project>.csv` - snapshot ownership of source files
//! - `projects.csv` - per-project ownership coverage
//! - `<project>-smell-commit-ownership.csv` - smell instances bound to owners
//! - `ownership_{introductions,refactor,deletion,removal,removal_unsure}.csv` -
//!   lifecycle events, one file per event kind
//! - `smell_commit_counts.csv` - commits introducing/refactoring/deleting smells
//! - `commits_context.csv` - commits joined with smell counters and release distance

mod records;
pub mod table;

pub use table::{Table, TableError};

use std::fmt::Display;
use std::path::Path;
use tracing::debug;

use crate::models::EventKind;

/// Default separator of output tables (Arabic letter alif).
pub const DEFAULT_DELIMITER: &str = "ا";

pub const PROJECTS_FILE: &str = "projects.csv";
pub const SMELL_COMMIT_COUNTS_FILE: &str = "smell_commit_counts.csv";
pub const COMMITS_CONTEXT_FILE: &str = "commits_context.csv";

/// A typed row of one output table.
pub trait Record {
    fn header() -> Vec<String>;
    fn fields(&self) -> Vec<String>;
}

/// Serialize `rows` under `R`'s header and write them to `path`.
pub fn write_table<R: Record>(path: &Path, delimiter: &str, rows: &[R]) -> Result<(), TableError> {
    let rendered: Vec<Vec<String>> = rows.iter().map(Record::fields).collect();
    let text = table::render(&R::header(), &rendered, delimiter);
    table::write_file(path, &text)?;
    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Render a list the way the tables store them: `['a', 'b']`.
pub fn format_list<T: Display>(items: &[T]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| format!("'{}'", item)).collect();
    format!("[{}]", quoted.join(", "))
}

pub fn commits_file(project: &str) -> String {
    format!("commits-{}.csv", project)
}

pub fn ownership_file(project: &str) -> String {
    format!("ownership-{}.csv", project)
}

pub fn smell_ownership_file(project: &str) -> String {
    format!("{}-smell-commit-ownership.csv", project)
}

/// Output file of one lifecycle event kind.
pub fn lifecycle_file(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Introduced => "ownership_introductions.csv",
        EventKind::Refactored => "ownership_refactor.csv",
        EventKind::Deleted => "ownership_deletion.csv",
        EventKind::Removed => "ownership_removal.csv",
        EventKind::Ambiguous => "ownership_removal_unsure.csv",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SmellLifecycleEvent, SmellOwnershipRecord};
    use crate::smells::SmellType;

    #[test]
    fn test_format_list() {
        assert_eq!(format_list::<String>(&[]), "[]");
        assert_eq!(format_list(&["v1.0", "release"]), "['v1.0', 'release']");
    }

    #[test]
    fn test_lifecycle_files_are_distinct() {
        let mut files: Vec<_> = EventKind::ALL.iter().map(|k| lifecycle_file(*k)).collect();
        files.sort();
        files.dedup();
        assert_eq!(files.len(), EventKind::ALL.len());
    }

    #[test]
    fn test_write_table_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(lifecycle_file(EventKind::Introduced));
        let events = vec![SmellLifecycleEvent {
            project: "app".into(),
            sha: "abc".into(),
            smell_type: SmellType::Lic,
            instance: "a.b.C$D".into(),
            file: Some("src/a/b/C.java".into()),
            developer: "Alice".into(),
            is_owner: true,
            kind: EventKind::Introduced,
        }];
        write_table(&path, DEFAULT_DELIMITER, &events).unwrap();

        let table = Table::read(&path, DEFAULT_DELIMITER).unwrap();
        assert_eq!(
            table.header,
            vec!["project", "sha", "instance", "file", "smell_type", "developer", "is_owner"]
        );
        assert_eq!(
            table.rows[0],
            vec!["app", "abc", "a.b.C$D", "src/a/b/C.java", "LIC", "Alice", "1"]
        );
    }

    #[test]
    fn test_smell_ownership_uses_boolean_words() {
        let record = SmellOwnershipRecord {
            sha: "abc".into(),
            author: "Bob".into(),
            instance: "x.Y".into(),
            file: "x/Y.java".into(),
            is_owner: false,
        };
        assert_eq!(record.fields(), vec!["abc", "Bob", "x.Y", "x/Y.java", "False"]);
        assert_eq!(SmellOwnershipRecord::header()[4], "isOwner");
    }
}
