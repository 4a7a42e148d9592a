use regex::Regex;
use serde::Serialize;

use crate::model::tree::{TreeNode, preorder};

/// Find a node anywhere in the forest by key.
///
/// A duplicated key resolves to the copy holding the children (`nest` gives
/// them to the last record with that key), otherwise to the last copy in
/// pre-order.
pub fn find<'a>(forest: &'a [TreeNode], key: &str) -> Option<&'a TreeNode> {
    path_to(forest, key).and_then(|path| path.last().copied())
}

/// Root-first chain of nodes ending at `key` (inclusive). Duplicates resolve
/// as in [`find`].
pub fn path_to<'a>(forest: &'a [TreeNode], key: &str) -> Option<Vec<&'a TreeNode>> {
    let mut path: Vec<&TreeNode> = Vec::new();
    let mut found = None;
    for (depth, node) in preorder(forest) {
        path.truncate(depth);
        path.push(node);
        if node.key == key {
            // only the copy nest linked children to can have any
            if node.has_children() {
                return Some(path);
            }
            found = Some(path.clone());
        }
    }
    found
}

/// Nodes listed directly under `key`, or the roots when `key` is `None`.
/// A leaf yields an empty slice; an unknown key yields `None`.
pub fn children_of<'a>(forest: &'a [TreeNode], key: Option<&str>) -> Option<&'a [TreeNode]> {
    match key {
        None => Some(forest),
        Some(key) => find(forest, key).map(TreeNode::kids),
    }
}

/// A label match from [`search`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub key: String,
    pub label: String,
    pub depth: usize,
    /// Labels of the ancestors, root first
    pub breadcrumb: Vec<String>,
}

/// All nodes whose label matches `pattern`, in pre-order.
pub fn search(forest: &[TreeNode], pattern: &Regex) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    let mut trail: Vec<&str> = Vec::new();
    for (depth, node) in preorder(forest) {
        trail.truncate(depth);
        if pattern.is_match(&node.label) {
            hits.push(SearchHit {
                key: node.key.clone(),
                label: node.label.clone(),
                depth,
                breadcrumb: trail.iter().map(|s| s.to_string()).collect(),
            });
        }
        trail.push(&node.label);
    }
    hits
}
