//! Repository access using libgit2
//!
//! Walks commit history, answers per-path history queries, snapshots
//! revision trees and extracts per-file patch text using the git2 crate
//! (Rust bindings to libgit2).

use chrono::{DateTime, TimeZone, Utc};
use git2::{DiffOptions, Oid, Patch, Repository, Sort};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

use super::{TreeNode, VcsError, VcsResult, VersionControlRepository};
use crate::models::Commit;

/// A git repository opened for read-only analysis.
///
/// Holds a libgit2 handle, which is not `Sync`: every worker opens its own.
pub struct GitRepository {
    repo: Repository,
    /// Tag names keyed by the commit they point at
    tags: HashMap<Oid, Vec<String>>,
}

impl GitRepository {
    /// Open the repository rooted at `path`.
    ///
    /// Unlike `Repository::discover`, this never climbs into a parent
    /// repository, so a plain directory inside a checkout is rejected.
    pub fn open(path: &Path) -> VcsResult<Self> {
        let repo = Repository::open(path).map_err(|source| VcsError::Open {
            path: path.display().to_string(),
            source,
        })?;
        debug!("Opened git repository at {:?}", repo.path());
        let tags = collect_tags(&repo)?;
        Ok(Self { repo, tags })
    }

    /// Check if a path is the root of a git repository.
    pub fn is_git_repo(path: &Path) -> bool {
        Repository::open(path).is_ok()
    }

    fn find_commit(&self, revision: &str) -> VcsResult<git2::Commit<'_>> {
        self.repo
            .revparse_single(revision)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| VcsError::UnknownRevision(revision.to_string()))
    }

    fn to_commit(&self, commit: &git2::Commit, position: Option<usize>) -> Commit {
        Commit {
            sha: commit.id().to_string(),
            author: commit.author().name().unwrap_or("Unknown").to_string(),
            author_email: commit.author().email().unwrap_or("").to_string(),
            committer: commit.committer().name().unwrap_or("Unknown").to_string(),
            date: git_time_to_utc(&commit.time()),
            message: commit.message().unwrap_or("").trim_end().to_string(),
            tags: self.tags.get(&commit.id()).cloned().unwrap_or_default(),
            position,
        }
    }

    /// Id of the blob at `path` in `commit`, if the file exists there.
    fn entry_id(commit: &git2::Commit, path: &Path) -> Option<Oid> {
        commit
            .tree()
            .ok()
            .and_then(|tree| tree.get_path(path).ok())
            .map(|entry| entry.id())
    }
}

impl VersionControlRepository for GitRepository {
    fn commits(&self, branch: Option<&str>) -> VcsResult<Vec<Commit>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        match branch {
            Some(name) => {
                let reference = self
                    .repo
                    .resolve_reference_from_short_name(name)
                    .map_err(|_| VcsError::UnknownBranch(name.to_string()))?;
                let target = reference.peel_to_commit()?.id();
                revwalk.push(target)?;
            }
            None => revwalk.push_head()?,
        }

        let mut commits = Vec::new();
        for (position, oid_result) in revwalk.enumerate() {
            let commit = self.repo.find_commit(oid_result?)?;
            commits.push(self.to_commit(&commit, Some(position)));
        }
        Ok(commits)
    }

    fn commits_touching(&self, path: &str, revision: &str) -> VcsResult<Vec<Commit>> {
        let file_path = Path::new(path);
        let mut pending = vec![self.find_commit(revision)?];
        let mut seen = HashSet::new();
        let mut touching = Vec::new();

        // Default history simplification of `git rev-list <rev> -- <path>`:
        // a merge identical to one parent is hidden and only that parent is
        // followed, so side branches it discarded are pruned.
        while let Some(commit) = pending.pop() {
            if !seen.insert(commit.id()) {
                continue;
            }
            let current = Self::entry_id(&commit, file_path);
            let parents: Vec<git2::Commit> = commit.parents().collect();
            if parents.is_empty() {
                if current.is_some() {
                    touching.push(commit);
                }
                continue;
            }

            match parents
                .iter()
                .position(|parent| Self::entry_id(parent, file_path) == current)
            {
                Some(same) => pending.push(parents[same].clone()),
                None => {
                    pending.extend(parents);
                    touching.push(commit);
                }
            }
        }

        touching.sort_by_key(|commit| std::cmp::Reverse(commit.time().seconds()));
        Ok(touching
            .iter()
            .map(|commit| self.to_commit(commit, None))
            .collect())
    }

    fn tree_at(&self, revision: &str) -> VcsResult<TreeNode> {
        let tree = self.find_commit(revision)?.tree()?;

        let mut files = Vec::new();
        tree.walk(git2::TreeWalkMode::PreOrder, |dir, entry| {
            if entry.kind() == Some(git2::ObjectType::Blob) {
                files.push(format!("{}{}", dir, entry.name().unwrap_or("")));
            }
            git2::TreeWalkResult::Ok
        })?;

        Ok(TreeNode::from_paths(files.iter().map(String::as_str)))
    }

    fn diff(&self, old: Option<&str>, new: &str) -> VcsResult<Vec<Vec<u8>>> {
        let new_tree = self.find_commit(new)?.tree()?;
        let old_tree = match old {
            Some(revision) => Some(self.find_commit(revision)?.tree()?),
            None => None,
        };

        let mut diff_opts = DiffOptions::new();
        diff_opts.include_untracked(false).ignore_filemode(true);
        let diff = self.repo.diff_tree_to_tree(
            old_tree.as_ref(),
            Some(&new_tree),
            Some(&mut diff_opts),
        )?;

        let mut patches = Vec::with_capacity(diff.deltas().len());
        for idx in 0..diff.deltas().len() {
            let Some(patch) = Patch::from_diff(&diff, idx)? else {
                continue;
            };
            patches.push(patch_text(&patch)?);
        }
        Ok(patches)
    }

    fn commit_metadata(&self, sha: &str) -> VcsResult<Commit> {
        let commit = self.find_commit(sha)?;
        Ok(self.to_commit(&commit, None))
    }
}

/// Hunk headers and prefixed lines of one file's patch, without the
/// `diff --git` / `---` / `+++` preamble.
fn patch_text(patch: &Patch) -> VcsResult<Vec<u8>> {
    let mut buf = Vec::new();
    for hunk_idx in 0..patch.num_hunks() {
        let (hunk, line_count) = patch.hunk(hunk_idx)?;
        buf.extend_from_slice(hunk.header());
        for line_idx in 0..line_count {
            let line = patch.line_in_hunk(hunk_idx, line_idx)?;
            match line.origin() {
                origin @ ('+' | '-' | ' ') => {
                    buf.push(origin as u8);
                    buf.extend_from_slice(line.content());
                }
                _ => buf.extend_from_slice(line.content()),
            }
        }
    }
    Ok(buf)
}

fn collect_tags(repo: &Repository) -> VcsResult<HashMap<Oid, Vec<String>>> {
    let mut tags: HashMap<Oid, Vec<String>> = HashMap::new();
    let names = repo.tag_names(None)?;
    for name in names.iter().flatten() {
        let target = repo
            .revparse_single(&format!("refs/tags/{}", name))
            .and_then(|object| object.peel_to_commit());
        match target {
            Ok(commit) => tags.entry(commit.id()).or_default().push(name.to_string()),
            Err(e) => debug!("Skipping tag {} not pointing at a commit: {}", name, e),
        }
    }
    Ok(tags)
}

fn git_time_to_utc(time: &git2::Time) -> DateTime<Utc> {
    Utc.timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestRepo;

    #[test]
    fn test_open_rejects_plain_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(!GitRepository::is_git_repo(dir.path()));
        assert!(matches!(
            GitRepository::open(dir.path()),
            Err(VcsError::Open { .. })
        ));
    }

    #[test]
    fn test_commits_are_oldest_first() {
        let mut fixture = TestRepo::new();
        let first = fixture.commit("Alice", "Initial commit", &[("a.txt", Some("a\n"))]);
        let second = fixture.commit("Bob", "Second", &[("b.txt", Some("b\n"))]);

        let repo = fixture.open();
        let commits = repo.commits(None).expect("commits");
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].sha, first);
        assert_eq!(commits[0].position, Some(0));
        assert_eq!(commits[1].sha, second);
        assert_eq!(commits[1].author, "Bob");
        assert_eq!(commits[1].message, "Second");
    }

    #[test]
    fn test_commits_touching_filters_by_path() {
        let mut fixture = TestRepo::new();
        fixture.commit("Alice", "add a", &[("src/A.java", Some("class A {}\n"))]);
        fixture.commit("Bob", "add b", &[("src/B.java", Some("class B {}\n"))]);
        let third = fixture.commit("Bob", "edit a", &[("src/A.java", Some("class A { int x; }\n"))]);

        let repo = fixture.open();
        let history = repo.commits_touching("src/A.java", &third).expect("history");
        let authors: Vec<_> = history.iter().map(|c| c.author.as_str()).collect();
        assert_eq!(authors, vec!["Bob", "Alice"]);
    }

    #[test]
    fn test_commits_touching_stops_at_revision() {
        let mut fixture = TestRepo::new();
        let first = fixture.commit("Alice", "add", &[("A.java", Some("1\n"))]);
        fixture.commit("Bob", "edit", &[("A.java", Some("2\n"))]);

        let repo = fixture.open();
        let history = repo.commits_touching("A.java", &first).expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].author, "Alice");
    }

    #[test]
    fn test_commits_touching_prunes_side_branch_of_same_merge() {
        let mut fixture = TestRepo::new();
        let base = fixture.commit_tree("Alice", "add", &[("A.java", "a\n")], &[], true);
        // Bob makes the same change on a side branch
        let side = fixture.commit_tree("Bob", "edit", &[("A.java", "x\n")], &[&base], false);
        let main = fixture.commit_tree("Alice", "edit", &[("A.java", "x\n")], &[&base], true);
        let merge = fixture.commit_tree("Alice", "merge", &[("A.java", "x\n")], &[&main, &side], true);

        let repo = fixture.open();
        let history = repo.commits_touching("A.java", &merge).expect("history");
        let shas: Vec<_> = history.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec![main.as_str(), base.as_str()]);
    }

    #[test]
    fn test_commits_touching_keeps_merge_differing_from_all_parents() {
        let mut fixture = TestRepo::new();
        let base = fixture.commit_tree("Alice", "add", &[("A.java", "a\n")], &[], true);
        let side = fixture.commit_tree("Bob", "edit", &[("A.java", "b\n")], &[&base], false);
        let main = fixture.commit_tree("Alice", "edit", &[("A.java", "c\n")], &[&base], true);
        let merge = fixture.commit_tree("Carol", "resolve", &[("A.java", "d\n")], &[&main, &side], true);

        let repo = fixture.open();
        let history = repo.commits_touching("A.java", &merge).expect("history");
        let authors: Vec<_> = history.iter().map(|c| c.author.as_str()).collect();
        assert_eq!(authors, vec!["Carol", "Alice", "Bob", "Alice"]);
    }

    #[test]
    fn test_tree_at_snapshots_revision() {
        let mut fixture = TestRepo::new();
        let first = fixture.commit("Alice", "add", &[("src/a/A.java", Some("a\n"))]);
        let second = fixture.commit("Alice", "delete", &[("src/a/A.java", None), ("B.java", Some("b\n"))]);

        let repo = fixture.open();
        assert_eq!(repo.tree_at(&first).expect("tree").files(), vec!["src/a/A.java"]);
        assert_eq!(repo.tree_at(&second).expect("tree").files(), vec!["B.java"]);
    }

    #[test]
    fn test_diff_against_empty_tree_counts_additions() {
        let mut fixture = TestRepo::new();
        let first = fixture.commit("Alice", "add", &[("a.txt", Some("one\ntwo\n"))]);

        let repo = fixture.open();
        let patches = repo.diff(None, &first).expect("diff");
        assert_eq!(patches.len(), 1);
        let text = String::from_utf8(patches[0].clone()).expect("utf8");
        assert!(text.starts_with("@@"));
        assert!(text.contains("\n+one\n+two"));
        assert!(!text.contains("+++"));
    }

    #[test]
    fn test_metadata_includes_tags() {
        let mut fixture = TestRepo::new();
        let first = fixture.commit("Alice", "release", &[("a.txt", Some("a\n"))]);
        fixture.tag("v1.0", &first);

        let repo = fixture.open();
        let commit = repo.commit_metadata(&first).expect("metadata");
        assert_eq!(commit.tags, vec!["v1.0"]);
        assert_eq!(commit.committer, "Alice");
        assert_eq!(commit.author_email, "alice@example.com");
    }

    #[test]
    fn test_unknown_revision() {
        let mut fixture = TestRepo::new();
        fixture.commit("Alice", "add", &[("a.txt", Some("a\n"))]);
        let repo = fixture.open();
        assert!(matches!(
            repo.tree_at("0000000000000000000000000000000000000001"),
            Err(VcsError::UnknownRevision(_))
        ));
    }
}
