//! Shared fixtures: git repositories and smell detector outputs on disk

#![allow(dead_code)]

use git2::{Repository, Signature, Time};
use std::fs;
use std::path::Path;

/// Build a repository at `dir` from `(author, message, changes)` steps and
/// return the commit shas, oldest first. A `None` content deletes the file.
pub fn build_repo(dir: &Path, steps: &[(&str, &str, &[(&str, Option<&str>)])]) -> Vec<String> {
    fs::create_dir_all(dir).unwrap();
    let repo = Repository::init(dir).unwrap();
    let mut shas = Vec::new();
    let mut clock = 1_600_000_000i64;

    for (author, message, changes) in steps {
        let mut index = repo.index().unwrap();
        for (path, content) in changes.iter() {
            let full = dir.join(path);
            match content {
                Some(text) => {
                    fs::create_dir_all(full.parent().unwrap()).unwrap();
                    fs::write(&full, text).unwrap();
                    index.add_path(Path::new(path)).unwrap();
                }
                None => {
                    fs::remove_file(&full).unwrap();
                    index.remove_path(Path::new(path)).unwrap();
                }
            }
        }
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

        clock += 86_400;
        let sig = Signature::new(author, &format!("{}@example.com", author.to_lowercase()), &Time::new(clock, 0))
            .unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
        shas.push(oid.to_string());
    }
    shas
}

pub const INSTANCE_HEADER: &str = "commit_number,key,instance,commit_status,id\n";

/// Write a metrics file with one LIC triple per commit.
pub fn write_metrics(project_dir: &Path, rows: &[(&str, u32, u32, u32)]) {
    let mut text = String::from("sha,developers,alice_LIC_I,alice_LIC_R,alice_LIC_D\n");
    for (sha, introduced, refactored, deleted) in rows {
        text.push_str(&format!("{},1,{},{},{}\n", sha, introduced, refactored, deleted));
    }
    let metrics_dir = project_dir.join("metrics");
    fs::create_dir_all(&metrics_dir).unwrap();
    fs::write(metrics_dir.join("metrics-perDev-perCommit-perSmell.csv"), text).unwrap();
}

/// Write the LIC instance log from `(sha, instance)` rows.
pub fn write_lic_log(project_dir: &Path, rows: &[(&str, &str)]) {
    let mut text = String::from(INSTANCE_HEADER);
    for (idx, (sha, instance)) in rows.iter().enumerate() {
        text.push_str(&format!("{},{},{},ok,{}\n", idx, sha, instance, idx));
    }
    let smells_dir = project_dir.join("smells");
    fs::create_dir_all(&smells_dir).unwrap();
    fs::write(smells_dir.join("app_LIC.csv"), text).unwrap();
}

/// Alice writes `A.java` twice, then Bob adds `B.java` and rewrites `A.java`.
pub fn three_commit_repo(dir: &Path) -> Vec<String> {
    build_repo(
        dir,
        &[
            ("Alice", "Initial commit", &[("src/a/A.java", Some("class A {}\n"))]),
            ("Alice", "Add inner class", &[("src/a/A.java", Some("class A { class I {} }\n"))]),
            (
                "Bob",
                "Refactor inner class",
                &[
                    ("src/a/A.java", Some("class A { static class I {} }\n")),
                    ("src/a/B.java", Some("class B { class J {} }\n")),
                ],
            ),
        ],
    )
}

/// Input, repository and log directories of a single-project merge run.
pub fn three_commit_project(root: &Path, project: &str) -> Vec<String> {
    let shas = three_commit_repo(&root.join("repos").join(project));
    let project_dir = root.join("input").join(project);
    write_metrics(
        &project_dir,
        &[
            (shas[0].as_str(), 0, 0, 0),
            (shas[1].as_str(), 1, 0, 0),
            (shas[2].as_str(), 1, 1, 0),
        ],
    );
    write_lic_log(&project_dir, &[(shas[1].as_str(), "a.A$I"), (shas[2].as_str(), "a.B$J")]);
    shas
}
