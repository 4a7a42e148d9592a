use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::model::tree::{TreeNode, preorder};
use crate::ops::check::{CheckError, CheckResult, CheckWarning};
use crate::ops::query::SearchHit;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct NodeSummaryJson {
    pub id: String,
    pub label: String,
    pub children: usize,
}

#[derive(Debug, Serialize)]
pub struct ListingJson {
    /// The notebook being listed, absent at the top level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebook: Option<NodeSummaryJson>,
    /// Where "go up" leads; absent at the top level and for root notebooks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeSummaryJson>,
    pub notebooks: Vec<NodeSummaryJson>,
}

#[derive(Debug, Serialize)]
pub struct SearchResultsJson<'a> {
    pub pattern: &'a str,
    pub hits: &'a [SearchHit],
}

pub fn node_summary(node: &TreeNode) -> NodeSummaryJson {
    NodeSummaryJson {
        id: node.key.clone(),
        label: node.label.clone(),
        children: node.kids().len(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// `▸` for notebooks that expand, `•` for leaves
fn marker(node: &TreeNode) -> char {
    if node.has_children() { '▸' } else { '•' }
}

/// Rows deeper than this stop indenting and show their depth instead.
const MAX_INDENT: usize = 24;

/// Indented outline of a forest with identifiers aligned in a right column.
/// `levels` limits how deep the outline goes; a cut-off notebook still shows
/// its expand marker.
pub fn format_tree(forest: &[TreeNode], levels: Option<usize>) -> Vec<String> {
    let rows: Vec<(String, &str)> = preorder(forest)
        .filter(|(depth, _)| levels.is_none_or(|max| *depth < max))
        .map(|(depth, node)| {
            let indent = "  ".repeat(depth.min(MAX_INDENT));
            let left = if depth > MAX_INDENT {
                format!("{}{} [{}] {}", indent, marker(node), depth, node.label)
            } else {
                format!("{}{} {}", indent, marker(node), node.label)
            };
            (left, node.key.as_str())
        })
        .collect();

    let width = rows.iter().map(|(left, _)| left.width()).max().unwrap_or(0);
    rows.into_iter()
        .map(|(left, key)| {
            let pad = width - left.width();
            format!("{}{}  {}", left, " ".repeat(pad), key)
        })
        .collect()
}

/// Listing of one notebook's contents, with a "go up" row first when there
/// is somewhere to go up to.
pub fn format_listing(
    notebook: Option<&TreeNode>,
    parent: Option<&TreeNode>,
    entries: &[TreeNode],
) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(nb) = notebook {
        let up = parent.map(|p| p.label.as_str()).unwrap_or("(top)");
        lines.push(format!("== {} ==", nb.label));
        lines.push(format!("↑ {}", up));
    }
    if entries.is_empty() {
        lines.push("(no notebooks)".to_string());
    } else {
        lines.extend(format_tree(entries, Some(1)));
    }
    lines
}

/// `Work > Projects > Rust`
pub fn format_breadcrumb(path: &[&TreeNode]) -> String {
    path.iter()
        .map(|n| n.label.as_str())
        .collect::<Vec<_>>()
        .join(" > ")
}

pub fn format_search_hit(hit: &SearchHit) -> String {
    let mut crumbs = hit.breadcrumb.clone();
    crumbs.push(hit.label.clone());
    format!("{}  {}", crumbs.join(" > "), hit.key)
}

pub fn format_check(result: &CheckResult) -> Vec<String> {
    let mut lines = Vec::new();
    if !result.errors.is_empty() {
        lines.push("Errors:".to_string());
        for err in &result.errors {
            match err {
                CheckError::DanglingParent { id, parent } => {
                    lines.push(format!("  {} has missing parent: {}", id, parent));
                }
                CheckError::DuplicateId { id, count } => {
                    lines.push(format!("  {} appears {} times", id, count));
                }
                CheckError::Cycle { id } => {
                    lines.push(format!("  {} is in a parent cycle", id));
                }
            }
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            lines.push(String::new());
        }
        lines.push("Warnings:".to_string());
        for warn in &result.warnings {
            match warn {
                CheckWarning::ChildRefMismatch {
                    id,
                    missing,
                    unexpected,
                } => {
                    if !missing.is_empty() {
                        lines.push(format!(
                            "  {} lists children that don't point back: {}",
                            id,
                            missing.join(", ")
                        ));
                    }
                    if !unexpected.is_empty() {
                        lines.push(format!(
                            "  {} doesn't list children that name it as parent: {}",
                            id,
                            unexpected.join(", ")
                        ));
                    }
                }
                CheckWarning::BlankLabel { id } => {
                    lines.push(format!("  {} has a blank name", id));
                }
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::OrphanPolicy;
    use crate::model::record::NodeRecord;
    use crate::ops::hierarchy::massage;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn forest() -> Vec<TreeNode> {
        massage(
            vec![
                NodeRecord::new("1", None, "Work"),
                NodeRecord::new("2", Some("1"), "Projects"),
                NodeRecord::new("3", Some("2"), "Rust"),
                NodeRecord::new("4", None, "Personal"),
            ],
            OrphanPolicy::Reject,
        )
        .unwrap()
    }

    #[test]
    fn tree_outline() {
        assert_snapshot!(format_tree(&forest(), None).join("\n"), @r"
        ▸ Work        1
          ▸ Projects  2
            • Rust    3
        • Personal    4
        ");
    }

    #[test]
    fn tree_outline_limited_levels() {
        assert_eq!(
            format_tree(&forest(), Some(1)),
            vec!["▸ Work      1".to_string(), "• Personal  4".to_string()]
        );
    }

    #[test]
    fn deep_rows_stop_indenting() {
        let mut records = vec![NodeRecord::new("0", None, "n")];
        for i in 1..=MAX_INDENT + 2 {
            records.push(NodeRecord::new(&i.to_string(), Some(&(i - 1).to_string()), "n"));
        }
        let lines = format_tree(&massage(records, OrphanPolicy::Reject).unwrap(), None);

        let indent = "  ".repeat(MAX_INDENT);
        assert!(lines[MAX_INDENT].starts_with(&format!("{}▸ n ", indent)));
        assert!(lines[MAX_INDENT + 1].starts_with(&format!("{}▸ [{}] n ", indent, MAX_INDENT + 1)));
        assert!(lines[MAX_INDENT + 2].starts_with(&format!("{}• [{}] n ", indent, MAX_INDENT + 2)));
        let key_column: Vec<usize> = lines
            .iter()
            .map(|l| l.trim_end_matches(|c: char| c.is_ascii_digit()).width())
            .collect();
        assert!(key_column.iter().all(|w| *w == key_column[0]));
    }

    #[test]
    fn wide_labels_align_by_display_width() {
        let forest = massage(
            vec![
                NodeRecord::new("a", None, "日本"),
                NodeRecord::new("b", None, "Notes"),
            ],
            OrphanPolicy::Reject,
        )
        .unwrap();
        assert_eq!(
            format_tree(&forest, None),
            vec!["• 日本   a".to_string(), "• Notes  b".to_string()]
        );
    }

    #[test]
    fn listing_with_go_up_row() {
        let forest = forest();
        let work = &forest[0];
        let projects = &work.kids()[0];
        assert_eq!(
            format_listing(Some(projects), Some(work), projects.kids()),
            vec![
                "== Projects ==".to_string(),
                "↑ Work".to_string(),
                "• Rust  3".to_string(),
            ]
        );
        assert_eq!(
            format_listing(Some(work), None, work.kids())[1],
            "↑ (top)".to_string()
        );
    }

    #[test]
    fn empty_listing() {
        assert_eq!(format_listing(None, None, &[]), vec!["(no notebooks)".to_string()]);
    }

    #[test]
    fn breadcrumb_joins_labels() {
        let forest = forest();
        let path = vec![&forest[0], &forest[0].kids()[0]];
        assert_eq!(format_breadcrumb(&path), "Work > Projects");
    }
}
