use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which keys of an API object hold the values the tree builder needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMap {
    /// Unique identifier key (the notebook API uses the detail URL)
    pub id: String,
    /// Parent identifier key; `null` or absent marks a root
    pub parent: String,
    /// Human-readable name key
    pub display_name: String,
    /// Child-reference key (e.g. the list of nested notebook URLs).
    /// When unset or empty, records are not required to carry one.
    pub children_ref: Option<String>,
}

impl FieldMap {
    pub fn children_ref(&self) -> Option<&str> {
        self.children_ref.as_deref().filter(|name| !name.is_empty())
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        FieldMap {
            id: "url".to_string(),
            parent: "parent".to_string(),
            display_name: "name".to_string(),
            children_ref: Some("notebooks".to_string()),
        }
    }
}

/// Error decoding a raw JSON object into a [`NodeRecord`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("record {index} is not a JSON object")]
    NotAnObject { index: usize },
    #[error("record {index} is missing field '{field}'")]
    MissingField { index: usize, field: String },
    #[error("record {index} has an invalid '{field}' field: expected {expected}")]
    InvalidField {
        index: usize,
        field: String,
        expected: &'static str,
    },
}

/// A flat notebook record as received from the API.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    /// Identifier (value of the id field)
    pub key: String,
    /// Parent identifier, `None` for roots
    pub parent_key: Option<String>,
    /// Label text
    pub display_name: String,
    /// Raw child-reference value, `Null` when the field map names none
    pub child_refs: Value,
    /// All remaining keys in source order, id and parent included
    pub fields: Map<String, Value>,
}

impl NodeRecord {
    /// Build a record directly, without going through JSON. Used by callers
    /// that already hold typed data (and heavily by tests).
    pub fn new(key: &str, parent_key: Option<&str>, display_name: &str) -> Self {
        NodeRecord {
            key: key.to_string(),
            parent_key: parent_key.map(str::to_string),
            display_name: display_name.to_string(),
            child_refs: Value::Null,
            fields: Map::new(),
        }
    }

    /// Decode the object at position `index` of a collection.
    ///
    /// The display name and child-reference keys are taken out of the
    /// object; everything else, including the id and parent keys, stays in
    /// `fields` so it reaches the output unchanged.
    pub fn from_value(index: usize, value: Value, fields: &FieldMap) -> Result<Self, RecordError> {
        let Value::Object(mut map) = value else {
            return Err(RecordError::NotAnObject { index });
        };

        let key = match map.get(&fields.id) {
            None => {
                return Err(RecordError::MissingField {
                    index,
                    field: fields.id.clone(),
                });
            }
            Some(v) => key_string(v).ok_or_else(|| RecordError::InvalidField {
                index,
                field: fields.id.clone(),
                expected: "a string or integer",
            })?,
        };

        let parent_key = match map.get(&fields.parent) {
            None | Some(Value::Null) => None,
            Some(v) => Some(key_string(v).ok_or_else(|| RecordError::InvalidField {
                index,
                field: fields.parent.clone(),
                expected: "a string, integer or null",
            })?),
        };

        let display_name = match map.shift_remove(&fields.display_name) {
            None => {
                return Err(RecordError::MissingField {
                    index,
                    field: fields.display_name.clone(),
                });
            }
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(RecordError::InvalidField {
                    index,
                    field: fields.display_name.clone(),
                    expected: "a string",
                });
            }
        };

        let child_refs = match fields.children_ref() {
            None => Value::Null,
            Some(name) => map.shift_remove(name).ok_or_else(|| RecordError::MissingField {
                index,
                field: name.to_string(),
            })?,
        };

        Ok(NodeRecord {
            key,
            parent_key,
            display_name,
            child_refs,
            fields: map,
        })
    }

    /// Declared child identifiers, when the child-reference value is a list
    /// of strings. Anything else yields `None`.
    pub fn declared_children(&self) -> Option<Vec<&str>> {
        match &self.child_refs {
            Value::Array(items) => items.iter().map(Value::as_str).collect(),
            _ => None,
        }
    }
}

/// Decode a whole collection, failing on the first malformed record.
pub fn read_records(values: Vec<Value>, fields: &FieldMap) -> Result<Vec<NodeRecord>, RecordError> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| NodeRecord::from_value(index, value, fields))
        .collect()
}

fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}
