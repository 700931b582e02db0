//! Smell-instance to source-file resolution
//!
//! Instance identifiers look like `[method#]qualified.ClassName[$Inner]`.
//! The host file is found by turning the class name into a path fragment and
//! searching the revision tree for the first file containing it.

use std::collections::HashMap;
use tracing::debug;

use crate::vcs::TreeNode;

/// Path fragment of the compilation unit declaring `instance`.
///
/// Keeps the text after the last `#`, cuts at the first `$` and turns the
/// package dots into slashes.
pub fn infer_path(instance: &str) -> String {
    let class = instance.rsplit('#').next().unwrap_or(instance);
    let outer = class.split('$').next().unwrap_or(class);
    outer.replace('.', "/")
}

/// Memoizing instance resolver, owned by one project's analysis.
///
/// Lookups are cached per identifier, misses included, and the cache is never
/// shared across projects.
#[derive(Debug, Default)]
pub struct SmellInstanceResolver {
    cache: HashMap<String, Option<String>>,
}

impl SmellInstanceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full path of the file hosting `instance` in `tree`, if any.
    pub fn resolve(&mut self, instance: &str, tree: &TreeNode) -> Option<String> {
        if let Some(cached) = self.cache.get(instance) {
            return cached.clone();
        }
        let fragment = infer_path(instance);
        let found = tree
            .find_first(&|path: &str| path.contains(fragment.as_str()))
            .map(str::to_string);
        debug!("Resolved {} to {:?}", instance, found);
        self.cache.insert(instance.to_string(), found.clone());
        found
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
