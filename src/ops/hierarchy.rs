//! Flat notebook list → display-ready forest.
//!
//! The build runs in three steps: [`adapt_fields`] turns each record into a
//! tree node, [`nest`] links nodes under their parents, and
//! [`prune_empty_children`] removes the children attribute from leaves.
//! [`massage`] runs all three.

use std::collections::HashMap;

use crate::model::config::OrphanPolicy;
use crate::model::record::NodeRecord;
use crate::model::tree::TreeNode;

/// Error building a forest
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("record {id} names parent {parent}, which is not in the collection")]
    DanglingParent { id: String, parent: String },
    #[error("record {id} is part of a parent cycle")]
    Cycle { id: String },
}

/// Map each record to a tree node: the display name becomes the label and the
/// child-reference field becomes an empty children slot. Child references are
/// identifiers, not nodes, so whatever they held is not carried over.
pub fn adapt_fields(records: Vec<NodeRecord>) -> Vec<TreeNode> {
    records
        .into_iter()
        .map(|record| TreeNode {
            key: record.key,
            parent_key: record.parent_key,
            label: record.display_name,
            children: Some(Vec::new()),
            fields: record.fields,
        })
        .collect()
}

/// Link nodes under their parents.
///
/// Roots and siblings keep the order they had in `nodes`. On duplicate keys
/// the last node with that key receives the children. Every returned node
/// has `children` set, possibly to an empty list.
pub fn nest(nodes: Vec<TreeNode>, orphans: OrphanPolicy) -> Result<Vec<TreeNode>, HierarchyError> {
    let mut lookup: HashMap<String, usize> = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        lookup.insert(node.key.clone(), i);
    }

    let mut child_ix: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut roots = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        let Some(parent) = node.parent_key.as_deref() else {
            roots.push(i);
            continue;
        };
        match (lookup.get(parent), orphans) {
            (Some(&p), _) => child_ix[p].push(i),
            (None, OrphanPolicy::Promote) => roots.push(i),
            (None, OrphanPolicy::Reject) => {
                return Err(HierarchyError::DanglingParent {
                    id: node.key.clone(),
                    parent: parent.to_string(),
                });
            }
        }
    }

    // Every index sits in exactly one list, so this walk sees each node at
    // most once. Nodes it never reaches hang off a parent cycle.
    let mut order = Vec::with_capacity(nodes.len());
    let mut reached = vec![false; nodes.len()];
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        reached[i] = true;
        stack.extend(child_ix[i].iter().rev());
    }
    if let Some(lost) = reached.iter().position(|r| !r) {
        return Err(HierarchyError::Cycle {
            id: nodes[lost].key.clone(),
        });
    }

    // Reverse pre-order finishes every child before its parent.
    let mut slots: Vec<Option<TreeNode>> = nodes.into_iter().map(Some).collect();
    for &i in order.iter().rev() {
        let kids: Vec<TreeNode> = child_ix[i].iter().filter_map(|&c| slots[c].take()).collect();
        if let Some(node) = slots[i].as_mut() {
            node.children = Some(kids);
        }
    }

    Ok(roots.iter().filter_map(|&r| slots[r].take()).collect())
}

/// Drop the children attribute from every node whose children list is empty,
/// at any depth. Non-empty lists are left in place and in order.
pub fn prune_empty_children(forest: &mut [TreeNode]) {
    let mut stack: Vec<&mut [TreeNode]> = vec![forest];
    while let Some(level) = stack.pop() {
        for node in level {
            if node.children.as_ref().is_some_and(Vec::is_empty) {
                node.children = None;
            } else if let Some(kids) = node.children.as_mut() {
                stack.push(kids.as_mut_slice());
            }
        }
    }
}

/// Build a widget-ready forest from a flat record list.
pub fn massage(records: Vec<NodeRecord>, orphans: OrphanPolicy) -> Result<Vec<TreeNode>, HierarchyError> {
    let mut forest = nest(adapt_fields(records), orphans)?;
    prune_empty_children(&mut forest);
    Ok(forest)
}
