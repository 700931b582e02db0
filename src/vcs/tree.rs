//! Owned snapshot of a revision's file tree

/// A directory of a revision's tree.
///
/// Blob paths are stored relative to the repository root, so a lookup never
/// has to rebuild them from the directory chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeNode {
    /// Directory path relative to the root, empty for the root itself
    pub path: String,
    /// Full paths of the files directly inside this directory
    pub blobs: Vec<String>,
    pub subtrees: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Insert a file by its full path, creating intermediate directories.
    pub fn insert(&mut self, file_path: &str) {
        let mut node = self;
        let mut parts: Vec<&str> = file_path.split('/').collect();
        parts.pop();
        for part in parts {
            let child_path = if node.path.is_empty() {
                part.to_string()
            } else {
                format!("{}/{}", node.path, part)
            };
            let idx = match node.subtrees.iter().position(|t| t.path == child_path) {
                Some(idx) => idx,
                None => {
                    node.subtrees.push(TreeNode::new(child_path));
                    node.subtrees.len() - 1
                }
            };
            node = &mut node.subtrees[idx];
        }
        node.blobs.push(file_path.to_string());
    }

    /// Build a tree from a list of file paths.
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut root = TreeNode::default();
        for path in paths {
            root.insert(path);
        }
        root
    }

    /// Depth-first search, subtrees before the files of each level.
    pub fn find_first<F>(&self, predicate: &F) -> Option<&str>
    where
        F: Fn(&str) -> bool,
    {
        for subtree in &self.subtrees {
            if let Some(found) = subtree.find_first(predicate) {
                return Some(found);
            }
        }
        self.blobs
            .iter()
            .find(|blob| predicate(blob.as_str()))
            .map(String::as_str)
    }

    /// All file paths, files of each level before its subtrees.
    pub fn files(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.extend(self.blobs.iter().map(String::as_str));
        for subtree in &self.subtrees {
            subtree.collect_files(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paths_builds_nested_dirs() {
        let tree = TreeNode::from_paths(["README.md", "src/a/A.java", "src/a/B.java", "src/C.java"]);
        assert_eq!(tree.blobs, vec!["README.md"]);
        assert_eq!(tree.subtrees.len(), 1);
        let src = &tree.subtrees[0];
        assert_eq!(src.path, "src");
        assert_eq!(src.blobs, vec!["src/C.java"]);
        assert_eq!(src.subtrees[0].path, "src/a");
        assert_eq!(src.subtrees[0].blobs.len(), 2);
    }

    #[test]
    fn test_find_first_prefers_deeper_directories() {
        let tree = TreeNode::from_paths(["Api.java", "lib/Api.java"]);
        let found = tree.find_first(&|p: &str| p.contains("Api"));
        assert_eq!(found, Some("lib/Api.java"));
    }

    #[test]
    fn test_files_lists_everything() {
        let tree = TreeNode::from_paths(["a/b/c.txt", "d.txt"]);
        let mut files = tree.files();
        files.sort();
        assert_eq!(files, vec!["a/b/c.txt", "d.txt"]);
    }
}
