use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key names the tree display widget expects in its node objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputKeys {
    pub label: String,
    pub children: String,
}

impl OutputKeys {
    /// Bootstrap-Treeview naming (`text` / `nodes`)
    pub fn treeview() -> Self {
        OutputKeys {
            label: "text".to_string(),
            children: "nodes".to_string(),
        }
    }
}

impl Default for OutputKeys {
    fn default() -> Self {
        OutputKeys {
            label: "label".to_string(),
            children: "children".to_string(),
        }
    }
}

/// A notebook placed in the hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub key: String,
    pub parent_key: Option<String>,
    pub label: String,
    /// `None` means "no children attribute": a leaf with no expand affordance.
    pub children: Option<Vec<TreeNode>>,
    /// Pass-through fields from the source record
    pub fields: Map<String, Value>,
}

impl TreeNode {
    pub fn new(key: &str, parent_key: Option<&str>, label: &str) -> Self {
        TreeNode {
            key: key.to_string(),
            parent_key: parent_key.map(str::to_string),
            label: label.to_string(),
            children: None,
            fields: Map::new(),
        }
    }

    /// Child nodes, empty for leaves
    pub fn kids(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn has_children(&self) -> bool {
        !self.kids().is_empty()
    }

    /// Render as a widget node object.
    ///
    /// Pass-through fields come first. A pass-through key that collides with
    /// the label key keeps its position and takes the label; one that
    /// collides with the children key is dropped, and the children key is
    /// only emitted when `children` is present.
    ///
    /// Builds bottom-up with an explicit stack. The returned value nests as
    /// deep as the tree does, and `serde_json` drops and serializes it
    /// recursively; for very deep forests use [`write_forest_json`].
    pub fn to_value(&self, keys: &OutputKeys) -> Value {
        // (node, next child to render, rendered children)
        let mut stack = vec![(self, 0usize, Vec::<Value>::new())];
        let mut done = Value::Null;
        while let Some((node, next)) = stack.last_mut().map(|(n, i, _)| (*n, i)) {
            if let Some(child) = node.kids().get(*next) {
                *next += 1;
                stack.push((child, 0, Vec::new()));
                continue;
            }
            let Some((node, _, kids)) = stack.pop() else { break };
            let value = node.object(keys, kids);
            match stack.last_mut() {
                Some((_, _, siblings)) => siblings.push(value),
                None => done = value,
            }
        }
        done
    }

    fn object(&self, keys: &OutputKeys, kids: Vec<Value>) -> Value {
        let mut map = self.fields.clone();
        map.shift_remove(&keys.children);
        map.insert(keys.label.clone(), Value::String(self.label.clone()));
        if self.children.is_some() {
            map.insert(keys.children.clone(), Value::Array(kids));
        }
        Value::Object(map)
    }
}

// Dropping field by field would recurse once per tree level.
impl Drop for TreeNode {
    fn drop(&mut self) {
        let Some(mut stack) = self.children.take() else { return };
        while let Some(mut node) = stack.pop() {
            if let Some(kids) = node.children.take() {
                stack.extend(kids);
            }
        }
    }
}

/// Render a whole forest as a JSON array
pub fn forest_to_value(forest: &[TreeNode], keys: &OutputKeys) -> Value {
    Value::Array(forest.iter().map(|n| n.to_value(keys)).collect())
}

/// Write a forest as compact JSON, the same document [`forest_to_value`]
/// builds, without building it. Depth costs heap, not call stack.
pub fn write_forest_json<W: Write>(forest: &[TreeNode], keys: &OutputKeys, out: &mut W) -> io::Result<()> {
    out.write_all(b"[")?;
    let mut stack: Vec<(&[TreeNode], usize)> = vec![(forest, 0)];
    while let Some((level, i)) = stack.last_mut().map(|top| {
        top.1 += 1;
        (top.0, top.1 - 1)
    }) {
        let Some(node) = level.get(i) else {
            stack.pop();
            out.write_all(b"]")?;
            if !stack.is_empty() {
                // closes the node that owned this children list
                out.write_all(b"}")?;
            }
            continue;
        };
        if i > 0 {
            out.write_all(b",")?;
        }
        write_node_open(node, keys, out)?;
        match &node.children {
            Some(kids) => {
                out.write_all(b",")?;
                serde_json::to_writer(&mut *out, &keys.children)?;
                out.write_all(b":[")?;
                stack.push((kids.as_slice(), 0));
            }
            None => out.write_all(b"}")?,
        }
    }
    Ok(())
}

/// `{` and every member except the children list, same order as `to_value`
fn write_node_open<W: Write>(node: &TreeNode, keys: &OutputKeys, out: &mut W) -> io::Result<()> {
    out.write_all(b"{")?;
    let mut first = true;
    let mut labelled = false;
    for (key, value) in &node.fields {
        if *key == keys.children {
            continue;
        }
        if *key == keys.label {
            write_member(out, &mut first, key, &node.label)?;
            labelled = true;
        } else {
            write_member(out, &mut first, key, value)?;
        }
    }
    if !labelled {
        write_member(out, &mut first, &keys.label, &node.label)?;
    }
    Ok(())
}

fn write_member<W: Write, T: Serialize + ?Sized>(
    out: &mut W,
    first: &mut bool,
    key: &str,
    value: &T,
) -> io::Result<()> {
    if !*first {
        out.write_all(b",")?;
    }
    *first = false;
    serde_json::to_writer(&mut *out, key)?;
    out.write_all(b":")?;
    serde_json::to_writer(&mut *out, value)?;
    Ok(())
}

/// Depth-first, pre-order walk over a forest yielding `(depth, node)`.
/// Siblings are visited in order. Uses an explicit stack, so deep trees
/// don't grow the call stack.
pub struct Preorder<'a> {
    stack: Vec<(usize, &'a TreeNode)>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = (usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.kids().iter().rev().map(|c| (depth + 1, c)));
        Some((depth, node))
    }
}

pub fn preorder(forest: &[TreeNode]) -> Preorder<'_> {
    Preorder {
        stack: forest.iter().rev().map(|n| (0, n)).collect(),
    }
}

/// Total number of nodes reachable from the roots
pub fn node_count(forest: &[TreeNode]) -> usize {
    preorder(forest).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Vec<TreeNode> {
        let mut a = TreeNode::new("a", None, "A");
        let mut b = TreeNode::new("b", Some("a"), "B");
        b.children = Some(vec![TreeNode::new("c", Some("b"), "C")]);
        a.children = Some(vec![b, TreeNode::new("d", Some("a"), "D")]);
        vec![a, TreeNode::new("e", None, "E")]
    }

    #[test]
    fn preorder_visits_siblings_in_order() {
        let forest = sample();
        let seen: Vec<(usize, &str)> = preorder(&forest)
            .map(|(d, n)| (d, n.key.as_str()))
            .collect();
        assert_eq!(
            seen,
            vec![(0, "a"), (1, "b"), (2, "c"), (1, "d"), (0, "e")]
        );
        assert_eq!(node_count(&forest), 5);
    }

    #[test]
    fn to_value_omits_absent_children() {
        let mut node = TreeNode::new("x", None, "Inbox");
        node.fields.insert("url".to_string(), json!("x"));
        node.fields.insert("children".to_string(), json!(["stale"]));

        assert_eq!(
            node.to_value(&OutputKeys::default()),
            json!({"url": "x", "label": "Inbox"})
        );
    }

    #[test]
    fn to_value_uses_treeview_keys() {
        let mut parent = TreeNode::new("p", None, "Parent");
        parent.children = Some(vec![TreeNode::new("c", Some("p"), "Child")]);

        assert_eq!(
            parent.to_value(&OutputKeys::treeview()),
            json!({"text": "Parent", "nodes": [{"text": "Child"}]})
        );
    }

    fn member_order(value: &Value) -> Vec<&str> {
        value.as_object().unwrap().keys().map(String::as_str).collect()
    }

    #[test]
    fn label_collision_keeps_position() {
        let mut node = TreeNode::new("x", None, "Inbox");
        node.fields.insert("url".to_string(), json!("x"));
        node.fields.insert("label".to_string(), json!("stale"));
        node.fields.insert("owner".to_string(), json!("me"));

        let value = node.to_value(&OutputKeys::default());
        assert_eq!(value, json!({"url": "x", "label": "Inbox", "owner": "me"}));
        assert_eq!(member_order(&value), vec!["url", "label", "owner"]);

        let mut out = Vec::new();
        write_forest_json(std::slice::from_ref(&node), &OutputKeys::default(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"[{"url":"x","label":"Inbox","owner":"me"}]"#
        );
    }

    #[test]
    fn written_json_matches_value() {
        let mut forest = sample();
        forest[0].fields.insert("url".to_string(), json!("a"));
        forest[0].fields.insert("children".to_string(), json!(["stale"]));
        forest[1].children = Some(Vec::new());

        for keys in [OutputKeys::default(), OutputKeys::treeview()] {
            let mut out = Vec::new();
            write_forest_json(&forest, &keys, &mut out).unwrap();
            let expected = serde_json::to_string(&forest_to_value(&forest, &keys)).unwrap();
            assert_eq!(String::from_utf8(out).unwrap(), expected);
        }

        let mut out = Vec::new();
        write_forest_json(&[], &OutputKeys::default(), &mut out).unwrap();
        assert_eq!(out, b"[]");
    }

    /// Root-first chain `0 → 1 → … → depth-1`, built without recursion
    fn chain(depth: usize) -> TreeNode {
        let mut node = TreeNode::new(&(depth - 1).to_string(), None, "leaf");
        for i in (0..depth - 1).rev() {
            let mut parent = TreeNode::new(&i.to_string(), None, "inner");
            parent.children = Some(vec![node]);
            node = parent;
        }
        node
    }

    /// Count node objects, taking the value apart level by level
    fn count_objects(value: Value, children: &str) -> usize {
        let mut count = 0;
        let mut stack = vec![value];
        while let Some(v) = stack.pop() {
            match v {
                Value::Array(items) => stack.extend(items),
                Value::Object(mut map) => {
                    count += 1;
                    if let Some(kids) = map.shift_remove(children) {
                        stack.push(kids);
                    }
                }
                _ => {}
            }
        }
        count
    }

    const DEEP: usize = 200_000;

    #[test]
    fn deep_chain_renders_and_drops() {
        let root = chain(DEEP);
        assert_eq!(node_count(std::slice::from_ref(&root)), DEEP);

        let value = root.to_value(&OutputKeys::default());
        assert_eq!(count_objects(value, "children"), DEEP);

        let mut out = Vec::new();
        write_forest_json(std::slice::from_ref(&root), &OutputKeys::treeview(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(r#""nodes":["#).count(), DEEP - 1);
        assert!(text.starts_with(r#"[{"text":"inner","nodes":[{"#));
        assert!(text.ends_with(&format!(r#"{{"text":"leaf"}}{}]"#, "]}".repeat(DEEP - 1))));

        drop(root);
    }
}
