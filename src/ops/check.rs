use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::record::NodeRecord;

/// Structured result from `nbt check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A validation error (the collection can't be built as-is).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// A parent reference doesn't match any record in the batch
    #[serde(rename = "dangling_parent")]
    DanglingParent { id: String, parent: String },
    /// The same identifier appears on more than one record
    #[serde(rename = "duplicate_id")]
    DuplicateId { id: String, count: usize },
    /// Following parents from this record loops back on itself
    #[serde(rename = "cycle")]
    Cycle { id: String },
}

/// A validation warning (the tree builds, but something looks off).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// The record's own child list disagrees with the records naming it as parent
    #[serde(rename = "child_ref_mismatch")]
    ChildRefMismatch {
        id: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        missing: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        unexpected: Vec<String>,
    },
    /// Label is empty or whitespace, so the tree row shows nothing
    #[serde(rename = "blank_label")]
    BlankLabel { id: String },
}

// ---------------------------------------------------------------------------
// Main check entry point
// ---------------------------------------------------------------------------

/// Validate a record batch before building a tree from it.
///
/// Read-only. Checks performed:
/// 1. No duplicate identifiers
/// 2. Every parent reference resolves within the batch
/// 3. No parent chain loops back on itself
/// 4. Warnings for child-reference lists that disagree with parent links,
///    and for blank labels
pub fn check_records(records: &[NodeRecord]) -> CheckResult {
    let mut result = CheckResult::default();

    for (id, count) in find_duplicate_ids(records) {
        result.errors.push(CheckError::DuplicateId { id, count });
    }

    let lookup: HashMap<&str, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.key.as_str(), i))
        .collect();

    for record in records {
        if let Some(parent) = &record.parent_key
            && !lookup.contains_key(parent.as_str())
        {
            result.errors.push(CheckError::DanglingParent {
                id: record.key.clone(),
                parent: parent.clone(),
            });
        }
    }

    for id in find_cycles(records, &lookup) {
        result.errors.push(CheckError::Cycle { id });
    }

    check_child_refs(records, &mut result);

    for record in records {
        if record.display_name.trim().is_empty() {
            result.warnings.push(CheckWarning::BlankLabel {
                id: record.key.clone(),
            });
        }
    }

    result.valid = result.errors.is_empty();
    result
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

/// Identifiers seen more than once, in first-seen order
fn find_duplicate_ids(records: &[NodeRecord]) -> Vec<(String, usize)> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for record in records {
        *counts.entry(record.key.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(id, n)| (id.to_string(), n))
        .collect()
}

/// One identifier per parent cycle: the first record of the cycle reached
/// while scanning in input order.
fn find_cycles(records: &[NodeRecord], lookup: &HashMap<&str, usize>) -> Vec<String> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Walking,
        Done,
    }

    let mut marks = vec![Mark::New; records.len()];
    let mut cycles = Vec::new();

    for start in 0..records.len() {
        let mut walked = Vec::new();
        let mut current = Some(start);
        while let Some(i) = current {
            match marks[i] {
                Mark::Done => break,
                Mark::Walking => {
                    cycles.push(records[i].key.clone());
                    break;
                }
                Mark::New => {
                    marks[i] = Mark::Walking;
                    walked.push(i);
                    current = records[i]
                        .parent_key
                        .as_deref()
                        .and_then(|p| lookup.get(p).copied());
                }
            }
        }
        for i in walked {
            marks[i] = Mark::Done;
        }
    }

    cycles
}

fn check_child_refs(records: &[NodeRecord], result: &mut CheckResult) {
    let mut actual: HashMap<&str, Vec<&str>> = HashMap::new();
    for record in records {
        if let Some(parent) = &record.parent_key {
            actual
                .entry(parent.as_str())
                .or_default()
                .push(record.key.as_str());
        }
    }

    for record in records {
        let Some(declared) = record.declared_children() else {
            continue;
        };
        let found = actual.get(record.key.as_str()).cloned().unwrap_or_default();
        let declared_set: HashSet<&str> = declared.iter().copied().collect();
        let found_set: HashSet<&str> = found.iter().copied().collect();

        let missing: Vec<String> = declared
            .iter()
            .filter(|d| !found_set.contains(*d))
            .map(|d| d.to_string())
            .collect();
        let unexpected: Vec<String> = found
            .iter()
            .filter(|f| !declared_set.contains(*f))
            .map(|f| f.to_string())
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            result.warnings.push(CheckWarning::ChildRefMismatch {
                id: record.key.clone(),
                missing,
                unexpected,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rec(key: &str, parent: Option<&str>) -> NodeRecord {
        NodeRecord::new(key, parent, key)
    }

    #[test]
    fn clean_batch_is_valid() {
        let result = check_records(&[rec("1", None), rec("2", Some("1"))]);
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn reports_dangling_parent() {
        let result = check_records(&[rec("1", Some("99"))]);
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![CheckError::DanglingParent {
                id: "1".to_string(),
                parent: "99".to_string()
            }]
        );
    }

    #[test]
    fn reports_duplicates_once() {
        let result = check_records(&[rec("1", None), rec("2", None), rec("1", None), rec("1", None)]);
        assert_eq!(
            result.errors,
            vec![CheckError::DuplicateId {
                id: "1".to_string(),
                count: 3
            }]
        );
    }

    #[test]
    fn reports_each_cycle_once() {
        let result = check_records(&[
            rec("a", Some("b")),
            rec("b", Some("a")),
            rec("c", Some("a")),
            rec("d", Some("d")),
        ]);
        assert_eq!(
            result.errors,
            vec![
                CheckError::Cycle { id: "a".to_string() },
                CheckError::Cycle { id: "d".to_string() },
            ]
        );
    }

    #[test]
    fn warns_on_child_ref_mismatch() {
        let mut parent = rec("1", None);
        parent.child_refs = json!(["2", "3"]);
        let result = check_records(&[parent, rec("2", Some("1")), rec("4", Some("1"))]);

        assert!(result.valid);
        assert_eq!(
            result.warnings,
            vec![CheckWarning::ChildRefMismatch {
                id: "1".to_string(),
                missing: vec!["3".to_string()],
                unexpected: vec!["4".to_string()],
            }]
        );
    }

    #[test]
    fn warns_on_blank_label() {
        let record = NodeRecord::new("1", None, "  ");
        let result = check_records(&[record]);
        assert_eq!(
            result.warnings,
            vec![CheckWarning::BlankLabel { id: "1".to_string() }]
        );
    }

    #[test]
    fn json_shape_is_tagged() {
        let result = check_records(&[rec("1", Some("x"))]);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "valid": false,
                "errors": [{"type": "dangling_parent", "id": "1", "parent": "x"}],
                "warnings": []
            })
        );
    }
}
