//! Git fixtures for unit tests

use git2::{Oid, Repository, Signature, Time};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::vcs::GitRepository;

/// A throwaway repository whose commits are one day apart.
pub(crate) struct TestRepo {
    pub dir: TempDir,
    repo: Repository,
    clock: i64,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = Repository::init(dir.path()).expect("init repo");
        Self {
            dir,
            repo,
            clock: 1_500_000_000,
        }
    }

    /// Apply `changes` (`None` deletes the file) and commit them as `author`.
    pub fn commit(&mut self, author: &str, message: &str, changes: &[(&str, Option<&str>)]) -> String {
        let email = format!("{}@example.com", author.to_lowercase().replace(' ', "."));
        self.commit_as(author, &email, message, changes)
    }

    /// Like [`TestRepo::commit`] with an explicit author email.
    pub fn commit_as(
        &mut self,
        author: &str,
        email: &str,
        message: &str,
        changes: &[(&str, Option<&str>)],
    ) -> String {
        let root = self.dir.path().to_path_buf();
        let mut index = self.repo.index().expect("index");
        for (path, content) in changes {
            let full = root.join(path);
            match content {
                Some(text) => {
                    if let Some(parent) = full.parent() {
                        fs::create_dir_all(parent).expect("mkdir");
                    }
                    fs::write(&full, text).expect("write file");
                    index.add_path(Path::new(path)).expect("add path");
                }
                None => {
                    fs::remove_file(&full).expect("remove file");
                    index.remove_path(Path::new(path)).expect("remove path");
                }
            }
        }
        index.write().expect("write index");
        let tree_id = index.write_tree().expect("write tree");
        let tree = self.repo.find_tree(tree_id).expect("find tree");

        self.clock += 86_400;
        let sig = Signature::new(author, email, &Time::new(self.clock, 0)).expect("signature");
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("commit")
            .to_string()
    }

    /// Commit a flat tree of `files` on top of explicit `parents`.
    ///
    /// HEAD only moves when `move_head` is set, so side branches can be built
    /// without touching the checkout.
    pub fn commit_tree(
        &mut self,
        author: &str,
        message: &str,
        files: &[(&str, &str)],
        parents: &[&str],
        move_head: bool,
    ) -> String {
        let mut builder = self.repo.treebuilder(None).expect("treebuilder");
        for (name, content) in files {
            let blob = self.repo.blob(content.as_bytes()).expect("blob");
            builder.insert(name, blob, 0o100644).expect("insert entry");
        }
        let tree = self
            .repo
            .find_tree(builder.write().expect("write tree"))
            .expect("find tree");
        let parents: Vec<git2::Commit> = parents
            .iter()
            .map(|sha| {
                let oid = Oid::from_str(sha).expect("oid");
                self.repo.find_commit(oid).expect("parent")
            })
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

        self.clock += 86_400;
        let email = format!("{}@example.com", author.to_lowercase());
        let sig = Signature::new(author, &email, &Time::new(self.clock, 0)).expect("signature");
        let update_ref = if move_head { Some("HEAD") } else { None };
        self.repo
            .commit(update_ref, &sig, &sig, message, &tree, &parent_refs)
            .expect("commit")
            .to_string()
    }

    pub fn tag(&self, name: &str, sha: &str) {
        let object = self.repo.revparse_single(sha).expect("revparse");
        self.repo
            .tag_lightweight(name, &object, false)
            .expect("tag");
    }

    pub fn open(&self) -> GitRepository {
        GitRepository::open(self.dir.path()).expect("open fixture")
    }
}
