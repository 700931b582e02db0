//! Keyword-based commit message classification
//!
//! A message gets every category one of whose keywords starts a word in it.
//! Matching prepends a space to both the keyword and the lowercased message,
//! so `hang` does not fire inside `changelog` while `fix` still matches
//! `fixed`.

use serde::{Deserialize, Serialize};

/// Commit intent categories, in taxonomy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Chores,
    Documentation,
    Feature,
    Fix,
    Performance,
    Refactor,
    Style,
    Tests,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Chores,
        Category::Documentation,
        Category::Feature,
        Category::Fix,
        Category::Performance,
        Category::Refactor,
        Category::Style,
        Category::Tests,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Chores => "chores",
            Category::Documentation => "documentation",
            Category::Feature => "feature",
            Category::Fix => "fix",
            Category::Performance => "performance",
            Category::Refactor => "refactor",
            Category::Style => "style",
            Category::Tests => "tests",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::Chores => &["chore"],
            Category::Documentation => &["docs", "documentation"],
            Category::Feature => &[
                "implement", "add", "test", "request", "new", "start", "includ", "initial",
                "introduc", "creat", "increas",
            ],
            Category::Fix => &[
                "error", "bug", "fix", "issue", "mistake", "incorrect", "fault", "defect", "flaw",
            ],
            Category::Performance => &[
                "wait", "slow", "fast", "lag", "tim", "minor", "stuck", "instant", "respons",
                "react", "speed", "latenc", "perform", "throughput", "hang", "memory", "leak",
            ],
            Category::Refactor => &[
                "refactor", "restruct", "clean", "not used", "unused", "reformat", "import ",
                "remove", "replace", "split", "reorg", "rename", "move",
            ],
            Category::Style => &["style"],
            Category::Tests => &["test"],
        }
    }

    fn matches(&self, padded_message: &str) -> bool {
        self.keywords()
            .iter()
            .any(|keyword| padded_message.contains(&format!(" {}", keyword)))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tags commit messages with [`Category`] labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitClassifier;

impl CommitClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Categories whose keywords appear in `message`, in taxonomy order.
    pub fn classify(&self, message: &str) -> Vec<Category> {
        let padded = format!(" {}", message.to_lowercase());
        Category::ALL
            .into_iter()
            .filter(|category| category.matches(&padded))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(message: &str) -> Vec<Category> {
        CommitClassifier::new().classify(message)
    }

    #[test]
    fn test_chore() {
        assert_eq!(classify("doing chores in a commit"), vec![Category::Chores]);
    }

    #[test]
    fn test_nothing() {
        assert!(classify("no keyword").is_empty());
        assert!(classify("").is_empty());
    }

    #[test]
    fn test_only_fix() {
        assert_eq!(classify("fixed changelog"), vec![Category::Fix]);
    }

    #[test]
    fn test_keyword_must_start_a_word() {
        // "prefix" contains "fix" but not at a word start
        assert!(classify("prefix").is_empty());
        assert_eq!(classify("Hang on startup"), vec![Category::Feature, Category::Performance]);
    }

    #[test]
    fn test_multiple_labels_in_taxonomy_order() {
        let labels = classify("Fix memory leak and add tests for docs");
        assert_eq!(
            labels,
            vec![
                Category::Documentation,
                Category::Feature,
                Category::Fix,
                Category::Performance,
                Category::Tests,
            ]
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("REFACTOR module"), vec![Category::Refactor]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Category::Documentation.to_string(), "documentation");
    }
}
