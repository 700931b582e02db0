//! Smell lifecycle reconstruction
//!
//! For every commit of the metrics file and every smell type whose counters
//! moved, the instances present at the commit are compared with those at its
//! predecessor. New instances are introductions attributed at the commit,
//! vanished ones are removals attributed at the predecessor, where the file
//! still existed. The counters decide whether a removal was a refactoring, a
//! deletion, or cannot be told apart.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

use super::instances::InstanceLog;
use super::metrics::{MetricsRow, SmellMetrics};
use super::resolver::SmellInstanceResolver;
use super::SmellType;
use crate::analysis::OwnershipAnalyzer;
use crate::models::{Commit, EventKind, OwnershipRecord, SmellCounters, SmellLifecycleEvent};
use crate::vcs::{TreeNode, VcsResult, VersionControlRepository};

/// Instances that appeared and instances that vanished between two
/// populations, as `(introduced, removed)`.
pub fn diff_populations(
    old: &BTreeSet<String>,
    new: &BTreeSet<String>,
) -> (BTreeSet<String>, BTreeSet<String>) {
    let introduced = new.difference(old).cloned().collect();
    let removed = old.difference(new).cloned().collect();
    (introduced, removed)
}

/// Event kinds recorded for each removed instance, given the commit's
/// refactoring and deletion counters.
pub fn removal_kinds(counters: &SmellCounters) -> Vec<EventKind> {
    let mut kinds = vec![EventKind::Removed];
    match (counters.refactored > 0, counters.deleted > 0) {
        (true, true) => kinds.extend([EventKind::Refactored, EventKind::Deleted, EventKind::Ambiguous]),
        (true, false) => kinds.push(EventKind::Refactored),
        (false, true) => kinds.push(EventKind::Deleted),
        (false, false) => kinds.extend([EventKind::Refactored, EventKind::Deleted]),
    }
    kinds
}

/// Topological order of a project's commits.
#[derive(Debug, Clone, Default)]
pub struct CommitOrdering {
    order: Vec<String>,
    positions: HashMap<String, usize>,
}

impl CommitOrdering {
    pub fn from_shas<I, S>(shas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordering = Self::default();
        for sha in shas {
            let sha = sha.into();
            if ordering.positions.contains_key(&sha) {
                continue;
            }
            ordering.positions.insert(sha.clone(), ordering.order.len());
            ordering.order.push(sha);
        }
        ordering
    }

    /// Ordering of a repository walk, oldest first.
    pub fn from_commits(commits: &[Commit]) -> Self {
        Self::from_shas(commits.iter().map(|c| c.sha.clone()))
    }

    /// Read a log with one sha per line, oldest first. Blank lines are ignored.
    pub fn from_log_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_shas(
            text.lines().map(str::trim).filter(|line| !line.is_empty()),
        ))
    }

    pub fn position(&self, sha: &str) -> Option<usize> {
        self.positions.get(sha).copied()
    }

    /// `None` when `sha` is unknown, `Some(None)` for the first commit.
    pub fn predecessor(&self, sha: &str) -> Option<Option<&str>> {
        let position = self.position(sha)?;
        Some(position.checked_sub(1).map(|idx| self.order[idx].as_str()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Where an instance lives at a revision and who owns that file.
struct Attribution {
    file: Option<String>,
    developer: String,
    is_owner: bool,
}

impl Attribution {
    fn unknown() -> Self {
        Self {
            file: None,
            developer: String::new(),
            is_owner: false,
        }
    }
}

/// Rebuilds the lifecycle events of one project.
pub struct SmellLifecycleMerger<'a, R: VersionControlRepository + ?Sized> {
    project: String,
    repo: &'a R,
    ownership: OwnershipAnalyzer<'a, R>,
    resolver: SmellInstanceResolver,
    logs: BTreeMap<SmellType, InstanceLog>,
    ordering: Option<CommitOrdering>,
    trees: HashMap<String, TreeNode>,
    owners: HashMap<(String, String), OwnershipRecord>,
}

impl<'a, R: VersionControlRepository + ?Sized> SmellLifecycleMerger<'a, R> {
    pub fn new(project: impl Into<String>, repo: &'a R) -> Self {
        Self {
            project: project.into(),
            repo,
            ownership: OwnershipAnalyzer::new(repo),
            resolver: SmellInstanceResolver::new(),
            logs: BTreeMap::new(),
            ordering: None,
            trees: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.ownership = OwnershipAnalyzer::new(self.repo).with_threshold(threshold);
        self
    }

    pub fn with_ordering(mut self, ordering: CommitOrdering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    pub fn add_log(&mut self, smell: SmellType, log: InstanceLog) {
        self.logs.insert(smell, log);
    }

    /// Events of every metrics row, rows taken in commit order.
    pub fn merge(&mut self, metrics: &SmellMetrics) -> Vec<SmellLifecycleEvent> {
        let mut rows: Vec<&MetricsRow> = metrics.rows.iter().collect();
        if let Some(ordering) = &self.ordering {
            rows.sort_by_key(|row| ordering.position(&row.sha).unwrap_or(usize::MAX));
        }

        let mut events = Vec::new();
        let mut previous: Option<String> = None;
        for row in rows {
            let predecessor = self.predecessor(&row.sha, previous.as_deref());
            self.trees
                .retain(|rev, _| *rev == row.sha || Some(rev.as_str()) == predecessor.as_deref());

            for smell in SmellType::ALL {
                let counters = row.counters(smell);
                if counters.is_empty() {
                    continue;
                }
                let step = self.merge_step(&row.sha, predecessor.as_deref(), smell, &counters);
                events.extend(step);
            }
            previous = Some(row.sha.clone());
        }
        events
    }

    fn predecessor(&self, sha: &str, previous_row: Option<&str>) -> Option<String> {
        match &self.ordering {
            Some(ordering) => match ordering.predecessor(sha) {
                Some(found) => found.map(str::to_string),
                None => {
                    warn!(
                        "[{}] Commit {} is not in the commit order, using the previous row",
                        self.project, sha
                    );
                    previous_row.map(str::to_string)
                }
            },
            None => previous_row.map(str::to_string),
        }
    }

    fn merge_step(
        &mut self,
        sha: &str,
        predecessor: Option<&str>,
        smell: SmellType,
        counters: &SmellCounters,
    ) -> Vec<SmellLifecycleEvent> {
        let Some(log) = self.logs.get(&smell) else {
            warn!("[{}] No instance log for {}, counters at {} ignored", self.project, smell, sha);
            return Vec::new();
        };
        let old = predecessor
            .map(|p| log.instances_at(p))
            .unwrap_or_default();
        let new = log.instances_at(sha);
        let (introduced, removed) = diff_populations(&old, &new);
        debug!(
            "[{}] {} at {}: {} introduced, {} removed",
            self.project,
            smell,
            sha,
            introduced.len(),
            removed.len()
        );

        let mut events = Vec::new();
        for instance in &introduced {
            let attribution = self.attribute_or_unknown(instance, sha);
            events.push(self.event(sha, smell, instance, &attribution, EventKind::Introduced));
        }

        if let Some(previous) = predecessor {
            let kinds = removal_kinds(counters);
            for instance in &removed {
                let attribution = self.attribute_or_unknown(instance, previous);
                for kind in &kinds {
                    events.push(self.event(sha, smell, instance, &attribution, *kind));
                }
            }
        }

        if removed.len() as u64 != counters.removed() {
            warn!(
                "[{}] {} at {}: {} removals counted but {} instances vanished",
                self.project,
                smell,
                sha,
                counters.removed(),
                removed.len()
            );
        }
        events
    }

    /// Attribution of `instance` at `revision`, without file or owner when the
    /// revision cannot be read.
    fn attribute_or_unknown(&mut self, instance: &str, revision: &str) -> Attribution {
        self.attribute(instance, revision).unwrap_or_else(|e| {
            warn!(
                "[{}] Could not attribute smell {} at {}: {}",
                self.project, instance, revision, e
            );
            Attribution::unknown()
        })
    }

    fn attribute(&mut self, instance: &str, revision: &str) -> VcsResult<Attribution> {
        if !self.trees.contains_key(revision) {
            let tree = self.repo.tree_at(revision)?;
            self.trees.insert(revision.to_string(), tree);
        }
        let file = match self.trees.get(revision) {
            Some(tree) => self.resolver.resolve(instance, tree),
            None => None,
        };
        let Some(file) = file else {
            warn!(
                "[{}] Could not find a file for smell {} at {}",
                self.project, instance, revision
            );
            return Ok(Attribution::unknown());
        };

        let key = (file.clone(), revision.to_string());
        let record = match self.owners.get(&key) {
            Some(record) => record.clone(),
            None => {
                let record = self.ownership.owner_of(&file, revision)?;
                self.owners.insert(key, record.clone());
                record
            }
        };
        Ok(Attribution {
            file: Some(file),
            is_owner: record.is_owned(),
            developer: record.owner.unwrap_or_default(),
        })
    }

    fn event(
        &self,
        sha: &str,
        smell: SmellType,
        instance: &str,
        attribution: &Attribution,
        kind: EventKind,
    ) -> SmellLifecycleEvent {
        SmellLifecycleEvent {
            project: self.project.clone(),
            sha: sha.to_string(),
            smell_type: smell,
            instance: instance.to_string(),
            file: attribution.file.clone(),
            developer: attribution.developer.clone(),
            is_owner: attribution.is_owner,
            kind,
        }
    }
}
