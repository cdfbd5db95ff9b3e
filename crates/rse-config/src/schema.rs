//! Recursive schema model describing the shape of a config document.
//!
//! A schema is a finite tree assembled in code by the embedding application.
//! It carries no behavior of its own; validation and repair live in the store.

use serde_json::{Map, Value, json};
use std::collections::BTreeSet;

/// One position in the config tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// Leaf value.
    Scalar(ScalarKind),
    /// Nested record with named properties.
    Object(ObjectSchema),
}

/// Kinds of leaf values.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarKind {
    /// UTF-8 string with a minimum length in characters.
    String { min_len: usize },
    /// Any JSON number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// One of a fixed set of string literals.
    Enum(Vec<String>),
    /// Homogeneous array of leaf values.
    Array(Box<ScalarKind>),
    /// Array of external repository references (normalized during repair).
    RepoList,
    /// Free-form value (records with arbitrary content).
    Any,
}

/// Property map plus required-ness for an object node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    properties: Vec<(String, SchemaNode)>,
    required: BTreeSet<String>,
}

impl SchemaNode {
    /// Any string.
    pub fn string() -> Self {
        SchemaNode::Scalar(ScalarKind::String { min_len: 0 })
    }

    /// String with at least one character.
    pub fn non_empty_string() -> Self {
        SchemaNode::Scalar(ScalarKind::String { min_len: 1 })
    }

    /// Any number.
    pub fn number() -> Self {
        SchemaNode::Scalar(ScalarKind::Number)
    }

    /// Boolean flag.
    pub fn boolean() -> Self {
        SchemaNode::Scalar(ScalarKind::Boolean)
    }

    /// Enumeration of string literals.
    pub fn one_of(literals: &[&str]) -> Self {
        SchemaNode::Scalar(ScalarKind::Enum(
            literals.iter().map(|lit| lit.to_string()).collect(),
        ))
    }

    /// Array of plain strings.
    pub fn string_array() -> Self {
        SchemaNode::Scalar(ScalarKind::Array(Box::new(ScalarKind::String {
            min_len: 0,
        })))
    }

    /// List of repository references.
    pub fn repo_list() -> Self {
        SchemaNode::Scalar(ScalarKind::RepoList)
    }

    /// Free-form value.
    pub fn any() -> Self {
        SchemaNode::Scalar(ScalarKind::Any)
    }

    /// Object node from a property map.
    pub fn object(schema: ObjectSchema) -> Self {
        SchemaNode::Object(schema)
    }

    /// Return the object schema when this node is an object.
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            SchemaNode::Object(schema) => Some(schema),
            SchemaNode::Scalar(_) => None,
        }
    }

    /// Render this node as a draft-07 JSON Schema fragment.
    pub fn to_json_schema(&self) -> Value {
        match self {
            SchemaNode::Scalar(kind) => scalar_json_schema(kind),
            SchemaNode::Object(schema) => {
                let mut properties = Map::new();
                for (name, node) in &schema.properties {
                    properties.insert(name.clone(), node.to_json_schema());
                }
                let mut out = Map::new();
                out.insert("type".to_string(), json!("object"));
                out.insert("properties".to_string(), Value::Object(properties));
                if !schema.required.is_empty() {
                    let required: Vec<Value> = schema
                        .property_names()
                        .filter(|name| schema.is_required(name))
                        .map(|name| Value::String(name.to_string()))
                        .collect();
                    out.insert("required".to_string(), Value::Array(required));
                }
                Value::Object(out)
            }
        }
    }
}

impl ObjectSchema {
    /// Empty object schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an optional property.
    pub fn property(mut self, name: &str, node: SchemaNode) -> Self {
        self.insert(name, node);
        self
    }

    /// Add a required property.
    pub fn required_property(mut self, name: &str, node: SchemaNode) -> Self {
        self.insert(name, node);
        self.required.insert(name.to_string());
        self
    }

    /// Look up a property node by name.
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, node)| node)
    }

    /// Whether the schema declares a property.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether a property must be present.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.properties
            .iter()
            .map(|(name, node)| (name.as_str(), node))
    }

    /// Property names in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }

    fn insert(&mut self, name: &str, node: SchemaNode) {
        match self.properties.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = node,
            None => self.properties.push((name.to_string(), node)),
        }
    }
}

fn scalar_json_schema(kind: &ScalarKind) -> Value {
    match kind {
        ScalarKind::String { min_len: 0 } => json!({ "type": "string" }),
        ScalarKind::String { min_len } => json!({ "type": "string", "minLength": min_len }),
        ScalarKind::Number => json!({ "type": "number" }),
        ScalarKind::Boolean => json!({ "type": "boolean" }),
        ScalarKind::Enum(literals) => json!({ "type": "string", "enum": literals }),
        ScalarKind::Array(item) => json!({ "type": "array", "items": scalar_json_schema(item) }),
        ScalarKind::RepoList => json!({ "type": "array", "items": { "type": "string" } }),
        ScalarKind::Any => json!({}),
    }
}
