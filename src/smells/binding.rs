//! Smell-instance ownership binding
//!
//! Binds every row of a project's instance logs to the file hosting the
//! instance and tells whether that file had an owner at the row's commit.
//! Logs are processed on a dedicated thread pool; each task opens its own
//! repository handle and resolver and returns its rows, which are appended
//! in log order.

use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::instances::InstanceLog;
use super::resolver::SmellInstanceResolver;
use super::SmellError;
use crate::analysis::ownership::{OwnershipAnalyzer, DEFAULT_THRESHOLD};
use crate::models::SmellOwnershipRecord;
use crate::vcs::{GitRepository, TreeNode, VcsResult, VersionControlRepository};

pub struct SmellOwnershipBinder {
    project: String,
    repo_path: PathBuf,
    threshold: f64,
    workers: usize,
}

impl SmellOwnershipBinder {
    pub fn new(project: impl Into<String>, repo_path: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            repo_path: repo_path.into(),
            threshold: DEFAULT_THRESHOLD,
            workers: 1,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Bind every row of `smell_files`, batches appended in file order.
    ///
    /// An unreadable log is skipped with a warning; an unopenable repository
    /// fails the whole project.
    pub fn bind(&self, smell_files: &[PathBuf]) -> Result<Vec<SmellOwnershipRecord>, SmellError> {
        // Fail fast before spawning workers
        GitRepository::open(&self.repo_path)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;
        let batches: Vec<Result<Vec<SmellOwnershipRecord>, SmellError>> = pool.install(|| {
            smell_files
                .par_iter()
                .map(|path| self.bind_file(path))
                .collect()
        });

        let mut records = Vec::new();
        for (path, batch) in smell_files.iter().zip(batches) {
            match batch {
                Ok(rows) => records.extend(rows),
                Err(SmellError::Table(e)) => {
                    warn!("[{}] Skipping smell file {}: {}", self.project, path.display(), e)
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    fn bind_file(&self, path: &Path) -> Result<Vec<SmellOwnershipRecord>, SmellError> {
        info!("[{}] Analyzing smell file: {}", self.project, path.display());
        let log = InstanceLog::read(path)?;
        let repo = GitRepository::open(&self.repo_path)?;
        let mut task = BindingTask {
            project: &self.project,
            repo: &repo,
            ownership: OwnershipAnalyzer::new(&repo).with_threshold(self.threshold),
            resolver: SmellInstanceResolver::new(),
            tree: None,
            authors: HashMap::new(),
        };

        let mut records = Vec::with_capacity(log.entries.len());
        for entry in &log.entries {
            match task.bind(&entry.sha, &entry.instance) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => warn!(
                    "[{}] Skipping smell {} at {}: {}",
                    self.project, entry.instance, entry.sha, e
                ),
            }
        }
        debug!("[{}] {} bound rows from {}", self.project, records.len(), path.display());
        Ok(records)
    }
}

/// Per-log state of one worker.
struct BindingTask<'a> {
    project: &'a str,
    repo: &'a GitRepository,
    ownership: OwnershipAnalyzer<'a, GitRepository>,
    resolver: SmellInstanceResolver,
    /// Tree of the last revision; rows of one commit are contiguous
    tree: Option<(String, TreeNode)>,
    authors: HashMap<String, String>,
}

impl BindingTask<'_> {
    fn bind(&mut self, sha: &str, instance: &str) -> VcsResult<Option<SmellOwnershipRecord>> {
        let cached = matches!(&self.tree, Some((rev, _)) if rev == sha);
        if !cached {
            self.tree = Some((sha.to_string(), self.repo.tree_at(sha)?));
        }
        let file = match &self.tree {
            Some((_, tree)) => self.resolver.resolve(instance, tree),
            None => None,
        };
        let Some(file) = file else {
            warn!(
                "[{}] We couldn't find a satisfactory file on commit ({}) for smell: {}",
                self.project, sha, instance
            );
            return Ok(None);
        };

        let ownership = self.ownership.owner_of(&file, sha)?;
        let author = match self.authors.get(sha) {
            Some(author) => author.clone(),
            None => {
                let author = self.repo.commit_metadata(sha)?.author;
                self.authors.insert(sha.to_string(), author.clone());
                author
            }
        };
        Ok(Some(SmellOwnershipRecord {
            sha: sha.to_string(),
            author,
            instance: instance.to_string(),
            file,
            is_owner: ownership.is_owned(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestRepo;
    use std::fs;

    #[test]
    fn test_bind_appends_in_file_order() {
        let mut fixture = TestRepo::new();
        let c1 = fixture.commit("Alice", "add", &[("src/a/A.java", Some("a\n"))]);
        let c2 = fixture.commit("Bob", "add b", &[("src/a/B.java", Some("b\n"))]);

        let smells = tempfile::tempdir().unwrap();
        let header = "commit_number,key,instance,commit_status,id\n";
        let hmu = smells.path().join("app_HMU.csv");
        let lic = smells.path().join("app_LIC.csv");
        fs::write(&hmu, format!("{}0,{},a.A,ok,1\n1,{},a.Nowhere,ok,2\n", header, c1, c2)).unwrap();
        fs::write(&lic, format!("{}1,{},m#a.B$Inner,ok,3\n", header, c2)).unwrap();

        let binder = SmellOwnershipBinder::new("app", fixture.dir.path()).with_workers(2);
        let records = binder.bind(&[hmu, lic]).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sha, c1);
        assert_eq!(records[0].author, "Alice");
        assert_eq!(records[0].file, "src/a/A.java");
        assert!(records[0].is_owner);
        assert_eq!(records[1].instance, "m#a.B$Inner");
        assert_eq!(records[1].author, "Bob");
        assert_eq!(records[1].file, "src/a/B.java");
    }

    #[test]
    fn test_unreadable_log_is_skipped() {
        let mut fixture = TestRepo::new();
        fixture.commit("Alice", "add", &[("A.java", Some("a\n"))]);
        let missing = fixture.dir.path().join("missing_LIC.csv");
        let binder = SmellOwnershipBinder::new("app", fixture.dir.path());
        assert!(binder.bind(&[missing]).unwrap().is_empty());
    }

    #[test]
    fn test_missing_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        let binder = SmellOwnershipBinder::new("app", dir.path());
        assert!(matches!(binder.bind(&[]), Err(SmellError::Vcs(_))));
    }
}
