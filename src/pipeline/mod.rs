//! Multi-project orchestration
//!
//! Runs one analysis pass over every project of an input directory:
//! 1. Enumerate project directories (sorted by name)
//! 2. Run each project on a worker pool, each worker with its own repository
//!    handle, resolver and accumulators
//! 3. Log and record failed projects without stopping the others
//! 4. Return per-project batches in project-name order

use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::{CommitsAnalyzer, OwnershipAnalyzer};
use crate::config::AnalysisConfig;
use crate::models::{
    CommitContextRecord, CommitRecord, OwnershipRecord, ProjectSummary, SmellCommitCounts,
    SmellLifecycleEvent, SmellOwnershipRecord,
};
use crate::report::{self, TableError};
use crate::smells::context::{self, CommitHistory};
use crate::smells::instances::{self, InstanceLog};
use crate::smells::{
    CommitOrdering, SmellError, SmellLifecycleMerger, SmellMetrics, SmellOwnershipBinder, SmellType,
};
use crate::vcs::{GitRepository, VcsError, VersionControlRepository};

/// Reports `(project, done, total)` after each finished project.
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize) + Send + Sync>;

/// Errors that abort one project.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Missing {what}: {}", .path.display())]
    Missing { what: &'static str, path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Smell(#[from] SmellError),
}

/// A project that could not be analyzed.
#[derive(Debug)]
pub struct ProjectFailure {
    pub project: String,
    pub error: ProjectError,
}

/// Per-project results of one pass, in project-name order.
#[derive(Debug)]
pub struct RunOutcome<T> {
    pub results: Vec<(String, T)>,
    pub failures: Vec<ProjectFailure>,
}

impl<T> RunOutcome<T> {
    /// True when there were projects and none succeeded.
    pub fn all_failed(&self) -> bool {
        self.results.is_empty() && !self.failures.is_empty()
    }
}

/// Output of `analyze` for one repository.
#[derive(Debug, Clone)]
pub struct ProjectAnalysis {
    pub commits: Vec<CommitRecord>,
    pub ownership: Vec<OwnershipRecord>,
    pub summary: ProjectSummary,
}

/// Output of `merge` for one project.
#[derive(Debug, Clone)]
pub struct ProjectMerge {
    pub events: Vec<SmellLifecycleEvent>,
    pub counts: SmellCommitCounts,
    /// Present only when a commit-analysis directory was supplied
    pub context: Option<Vec<CommitContextRecord>>,
}

/// Where a project's inputs live.
#[derive(Debug, Clone, Default)]
pub struct ProjectLayout {
    /// Smell detector outputs, one subdirectory per project
    pub input_dir: PathBuf,
    /// Repositories, one subdirectory per project
    pub repos_dir: PathBuf,
    /// `<project>.logs` commit orders
    pub logs_dir: Option<PathBuf>,
    /// `commits-<project>.csv` tables from `analyze`
    pub commits_dir: Option<PathBuf>,
}

impl ProjectLayout {
    pub fn repository(&self, project: &str) -> PathBuf {
        self.repos_dir.join(project)
    }

    pub fn metrics_file(&self, project: &str, config: &AnalysisConfig) -> PathBuf {
        self.input_dir.join(project).join(&config.layout.metrics_file)
    }

    pub fn smells_dir(&self, project: &str, config: &AnalysisConfig) -> PathBuf {
        self.input_dir.join(project).join(&config.layout.smells_dir)
    }

    pub fn logs_file(&self, project: &str) -> Option<PathBuf> {
        self.logs_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.logs", project)))
    }

    pub fn commits_file(&self, project: &str) -> Option<PathBuf> {
        self.commits_dir
            .as_ref()
            .map(|dir| dir.join(report::commits_file(project)))
    }
}

/// Names of the subdirectories of `dir`, sorted.
pub fn discover_projects(dir: &Path) -> io::Result<Vec<String>> {
    let mut projects: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| !name.starts_with('.'))
        .collect();
    projects.sort();
    Ok(projects)
}

/// Runs analysis passes over many projects in parallel.
pub struct ProjectOrchestrator {
    config: AnalysisConfig,
    progress_callback: Option<ProgressCallback>,
}

impl ProjectOrchestrator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run `task` for every project on a pool of `analysis.workers` threads.
    pub fn run<T, F>(&self, projects: &[String], task: F) -> Result<RunOutcome<T>, rayon::ThreadPoolBuildError>
    where
        T: Send,
        F: Fn(&str) -> Result<T, ProjectError> + Sync,
    {
        let completed = AtomicUsize::new(0);
        let total = projects.len();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.analysis.workers.max(1))
            .build()?;

        let results: Vec<Result<T, ProjectError>> = pool.install(|| {
            projects
                .par_iter()
                .map(|project| {
                    info!("[{}] Starting analysis", project);
                    let result = task(project);

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(project, done, total);
                    }
                    info!("[{}] Ending analysis", project);
                    result
                })
                .collect()
        });

        let mut outcome = RunOutcome {
            results: Vec::new(),
            failures: Vec::new(),
        };
        for (project, result) in projects.iter().zip(results) {
            match result {
                Ok(value) => outcome.results.push((project.clone(), value)),
                Err(error) => {
                    warn!("[{}] Project failed: {}", project, error);
                    outcome.failures.push(ProjectFailure {
                        project: project.clone(),
                        error,
                    });
                }
            }
        }
        Ok(outcome)
    }

    /// Commit records and snapshot ownership of every repository in `repos_dir`.
    pub fn analyze(&self, repos_dir: &Path) -> anyhow::Result<RunOutcome<ProjectAnalysis>> {
        let projects = discover_projects(repos_dir)?;
        Ok(self.run(&projects, |project| {
            self.analyze_project(project, &repos_dir.join(project))
        })?)
    }

    pub fn analyze_project(&self, project: &str, repo_path: &Path) -> Result<ProjectAnalysis, ProjectError> {
        let repo = GitRepository::open(repo_path)?;
        let commits = CommitsAnalyzer::new(&repo)
            .with_branch(self.config.analysis.branch.clone())
            .analyze()?;

        let ownership = match commits.last() {
            Some(head) => OwnershipAnalyzer::new(&repo)
                .with_threshold(self.config.ownership.threshold)
                .audit(&head.sha, &self.config.ownership.extensions)?,
            None => Vec::new(),
        };
        let summary = ProjectSummary {
            project: project.to_string(),
            commits: commits.len(),
            files: ownership.len(),
            owned_files: ownership.iter().filter(|r| r.is_owned()).count(),
        };
        debug!(
            "[{}] {} commits, {} of {} files owned",
            project, summary.commits, summary.owned_files, summary.files
        );
        Ok(ProjectAnalysis {
            commits,
            ownership,
            summary,
        })
    }

    /// Smell ownership binding of every project in `layout.input_dir`.
    pub fn bind(&self, layout: &ProjectLayout) -> anyhow::Result<RunOutcome<Vec<SmellOwnershipRecord>>> {
        let projects = discover_projects(&layout.input_dir)?;
        Ok(self.run(&projects, |project| self.bind_project(project, layout))?)
    }

    pub fn bind_project(
        &self,
        project: &str,
        layout: &ProjectLayout,
    ) -> Result<Vec<SmellOwnershipRecord>, ProjectError> {
        let smells_dir = layout.smells_dir(project, &self.config);
        if !smells_dir.is_dir() {
            return Err(ProjectError::Missing {
                what: "smells directory",
                path: smells_dir,
            });
        }
        let files = instances::csv_files(&smells_dir).map_err(|source| ProjectError::Io {
            path: smells_dir.clone(),
            source,
        })?;
        let records = SmellOwnershipBinder::new(project, layout.repository(project))
            .with_threshold(self.config.ownership.threshold)
            .with_workers(self.config.analysis.binding_workers)
            .bind(&files)?;
        Ok(records)
    }

    /// Lifecycle events, commit counters and commit context of every project.
    pub fn merge(&self, layout: &ProjectLayout) -> anyhow::Result<RunOutcome<ProjectMerge>> {
        let projects = discover_projects(&layout.input_dir)?;
        Ok(self.run(&projects, |project| self.merge_project(project, layout))?)
    }

    pub fn merge_project(&self, project: &str, layout: &ProjectLayout) -> Result<ProjectMerge, ProjectError> {
        let metrics_file = layout.metrics_file(project, &self.config);
        if !metrics_file.is_file() {
            return Err(ProjectError::Missing {
                what: "metrics file",
                path: metrics_file,
            });
        }
        let metrics = SmellMetrics::read(&metrics_file)?;
        let repo = GitRepository::open(&layout.repository(project))?;

        let mut merger = SmellLifecycleMerger::new(project, &repo)
            .with_threshold(self.config.ownership.threshold)
            .with_ordering(self.commit_ordering(project, layout, &repo)?);
        self.load_instance_logs(project, layout, &mut merger)?;
        let events = merger.merge(&metrics);

        let context = match layout.commits_file(project) {
            Some(path) if path.is_file() => {
                let history = CommitHistory::read(&path, &self.config.output.delimiter)?;
                Some(context::commit_context(project, &metrics, &history))
            }
            Some(path) => {
                warn!("[{}] No commit analysis at {}", project, path.display());
                None
            }
            None => None,
        };

        Ok(ProjectMerge {
            events,
            counts: metrics.commit_counts(project),
            context,
        })
    }

    /// The `.logs` order when one exists, the repository walk otherwise.
    fn commit_ordering(
        &self,
        project: &str,
        layout: &ProjectLayout,
        repo: &GitRepository,
    ) -> Result<CommitOrdering, ProjectError> {
        if let Some(path) = layout.logs_file(project) {
            if path.is_file() {
                return CommitOrdering::from_log_file(&path)
                    .map_err(|source| ProjectError::Io { path, source });
            }
            warn!(
                "[{}] No commit log at {}, using repository history",
                project,
                path.display()
            );
        }
        let commits = repo.commits(self.config.analysis.branch.as_deref())?;
        Ok(CommitOrdering::from_commits(&commits))
    }

    fn load_instance_logs<R: VersionControlRepository + ?Sized>(
        &self,
        project: &str,
        layout: &ProjectLayout,
        merger: &mut SmellLifecycleMerger<'_, R>,
    ) -> Result<(), ProjectError> {
        let smells_dir = layout.smells_dir(project, &self.config);
        if !smells_dir.is_dir() {
            return Err(ProjectError::Missing {
                what: "smells directory",
                path: smells_dir,
            });
        }
        for smell in SmellType::ALL {
            let located = instances::locate(&smells_dir, smell).map_err(|source| ProjectError::Io {
                path: smells_dir.clone(),
                source,
            })?;
            let Some(path) = located else {
                debug!("[{}] No instance log for {}", project, smell);
                continue;
            };
            match InstanceLog::read(&path) {
                Ok(log) => merger.add_log(smell, log),
                Err(e) => warn!("[{}] Ignoring instance log {}: {}", project, path.display(), e),
            }
        }
        Ok(())
    }
}
