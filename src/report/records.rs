//! Table layouts of the analysis records

use super::{format_list, Record};
use crate::models::{
    CommitContextRecord, CommitRecord, OwnershipRecord, ProjectSummary, SmellCommitCounts,
    SmellLifecycleEvent, SmellOwnershipRecord,
};
use crate::smells::SmellType;

fn header(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

impl Record for CommitRecord {
    fn header() -> Vec<String> {
        header(&[
            "author",
            "committer",
            "sha1",
            "date",
            "tags",
            "classifications",
            "addition",
            "deletion",
            "size",
            "message",
        ])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.author.clone(),
            self.committer.clone(),
            self.sha.clone(),
            self.date.to_rfc3339(),
            format_list(&self.tags),
            format_list(&self.classifications),
            self.diff.additions.to_string(),
            self.diff.deletions.to_string(),
            self.diff.size().to_string(),
            self.message.clone(),
        ]
    }
}

impl Record for OwnershipRecord {
    fn header() -> Vec<String> {
        header(&["file", "owner", "percentage"])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.file.clone(),
            self.owner.clone().unwrap_or_default(),
            self.ratio.to_string(),
        ]
    }
}

impl Record for ProjectSummary {
    fn header() -> Vec<String> {
        header(&["project", "commits", "files", "owned_files", "ownership_coverage"])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.project.clone(),
            self.commits.to_string(),
            self.files.to_string(),
            self.owned_files.to_string(),
            format!("{:.4}", self.ownership_coverage()),
        ]
    }
}

impl Record for SmellOwnershipRecord {
    fn header() -> Vec<String> {
        header(&["sha1", "author", "smell", "file", "isOwner"])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.sha.clone(),
            self.author.clone(),
            self.instance.clone(),
            self.file.clone(),
            if self.is_owner { "True" } else { "False" }.to_string(),
        ]
    }
}

impl Record for SmellLifecycleEvent {
    fn header() -> Vec<String> {
        header(&[
            "project",
            "sha",
            "instance",
            "file",
            "smell_type",
            "developer",
            "is_owner",
        ])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.project.clone(),
            self.sha.clone(),
            self.instance.clone(),
            self.file.clone().unwrap_or_default(),
            self.smell_type.to_string(),
            self.developer.clone(),
            if self.is_owner { "1" } else { "0" }.to_string(),
        ]
    }
}

impl Record for SmellCommitCounts {
    fn header() -> Vec<String> {
        header(&[
            "project",
            "number_commits",
            "number_commits_I",
            "number_commits_R",
            "number_commits_D",
            "number_commits_introducing_and_removing",
        ])
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.project.clone(),
            self.commits.to_string(),
            self.introducing.to_string(),
            self.refactoring.to_string(),
            self.deleting.to_string(),
            self.introducing_and_removing.to_string(),
        ]
    }
}

impl Record for CommitContextRecord {
    fn header() -> Vec<String> {
        let mut names = header(&["project", "sha1", "additions", "deletions", "categories"]);
        for smell in SmellType::ALL {
            names.push(format!("int_{}", smell));
            names.push(format!("ref_{}", smell));
            names.push(format!("del_{}", smell));
            names.push(format!("rem_{}", smell));
        }
        names.extend(header(&["distance_to_release", "distance_from_startup", "message"]));
        names
    }

    fn fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.project.clone(),
            self.sha.clone(),
            self.diff.additions.to_string(),
            self.diff.deletions.to_string(),
            self.categories.clone(),
        ];
        for smell in SmellType::ALL {
            let counters = self
                .smells
                .iter()
                .find(|(kind, _)| *kind == smell)
                .map(|(_, counters)| *counters)
                .unwrap_or_default();
            fields.push(counters.introduced.to_string());
            fields.push(counters.refactored.to_string());
            fields.push(counters.deleted.to_string());
            fields.push(counters.removed().to_string());
        }
        fields.push(self.distance_to_release.to_string());
        fields.push(self.distance_from_startup.to_string());
        fields.push(self.message.clone());
        fields
    }
}
