//! Per-type smell-instance logs
//!
//! Each log lists, for every analyzed commit, the smell instances present at
//! that commit. Columns are positional: commit number, commit sha (`key`),
//! instance, commit status and id. The first row is a header. Rows of one
//! commit are contiguous.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::SmellType;
use crate::report::table::{self, Table, TableError};

const KEY_COLUMN: usize = 1;
const INSTANCE_COLUMN: usize = 2;

/// One row of an instance log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceEntry {
    pub sha: String,
    pub instance: String,
}

/// An instance log loaded once and queried per commit.
#[derive(Debug, Clone, Default)]
pub struct InstanceLog {
    pub entries: Vec<InstanceEntry>,
}

impl InstanceLog {
    pub fn read(path: &Path) -> Result<Self, TableError> {
        let table = Table::read(path, table::COMMA)?;
        Ok(Self::from_table(&table))
    }

    pub fn from_table(table: &Table) -> Self {
        let entries = table
            .rows
            .iter()
            .map(|row| InstanceEntry {
                sha: table::field(row, KEY_COLUMN).to_string(),
                instance: table::field(row, INSTANCE_COLUMN).to_string(),
            })
            .collect();
        Self { entries }
    }

    /// Instances recorded at `sha`.
    ///
    /// Reads the first group of rows keyed by `sha` and stops where it ends.
    pub fn instances_at(&self, sha: &str) -> BTreeSet<String> {
        self.entries
            .iter()
            .skip_while(|entry| entry.sha != sha)
            .take_while(|entry| entry.sha == sha)
            .map(|entry| entry.instance.clone())
            .collect()
    }
}

/// The instance log of `smell` in `smells_dir`: the first file, by name,
/// ending with `<TAG>.csv`.
pub fn locate(smells_dir: &Path, smell: SmellType) -> io::Result<Option<PathBuf>> {
    let suffix = format!("{}.csv", smell.tag());
    Ok(csv_files(smells_dir)?
        .into_iter()
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(&suffix))
        }))
}

/// Every `.csv` file directly inside `smells_dir`, sorted by name.
pub fn csv_files(smells_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(smells_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    files.sort();
    Ok(files)
}
