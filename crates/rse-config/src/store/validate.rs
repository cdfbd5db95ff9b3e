//! Schema validation for config documents.
//!
//! Unlike a fail-fast checker this collects every violation so callers can
//! report (and the repair engine can reason about) the full set at once.
//! Keys the schema does not declare are ignored.

use crate::model::ValidationError;
use crate::schema::{ObjectSchema, ScalarKind, SchemaNode};
use serde_json::{Map, Value};

/// Validate a document against a schema node.
pub fn validate(value: &Value, schema: &SchemaNode) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_node(value, schema, "", &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate one property in isolation from its siblings.
pub fn validate_property(
    name: &str,
    node: &SchemaNode,
    value: &Value,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_node(value, node, name, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_node(value: &Value, node: &SchemaNode, path: &str, errors: &mut Vec<ValidationError>) {
    match node {
        SchemaNode::Scalar(kind) => check_scalar(value, kind, path, errors),
        SchemaNode::Object(schema) => match expect_object(value, path) {
            Ok(map) => check_object(map, schema, path, errors),
            Err(err) => errors.push(err),
        },
    }
}

fn check_object(
    map: &Map<String, Value>,
    schema: &ObjectSchema,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    for (name, node) in schema.properties() {
        let child_path = join_path(path, name);
        match map.get(name) {
            Some(value) => check_node(value, node, &child_path, errors),
            None if schema.is_required(name) => {
                errors.push(ValidationError::new(child_path, "missing required field"));
            }
            None => {}
        }
    }
}

fn check_scalar(value: &Value, kind: &ScalarKind, path: &str, errors: &mut Vec<ValidationError>) {
    let result = match kind {
        ScalarKind::String { min_len } => expect_string(value, *min_len, path),
        ScalarKind::Number => expect_number(value, path),
        ScalarKind::Boolean => expect_bool(value, path),
        ScalarKind::Enum(literals) => expect_literal(value, literals, path),
        ScalarKind::Array(item) => {
            match expect_array(value, path) {
                Ok(items) => {
                    for (idx, entry) in items.iter().enumerate() {
                        check_scalar(entry, item, &format!("{path}[{idx}]"), errors);
                    }
                    Ok(())
                }
                Err(err) => Err(err),
            }
        }
        ScalarKind::RepoList => validate_string_array(value, path, errors),
        ScalarKind::Any => Ok(()),
    };
    if let Err(err) = result {
        errors.push(err);
    }
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ValidationError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ValidationError::new(path, "expected object")),
    }
}

/// Expect a JSON array or return a typed error.
fn expect_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, ValidationError> {
    match value {
        Value::Array(arr) => Ok(arr),
        _ => Err(ValidationError::new(path, "expected array")),
    }
}

/// Expect a JSON string of at least `min_len` characters.
fn expect_string(value: &Value, min_len: usize, path: &str) -> Result<(), ValidationError> {
    let Some(text) = value.as_str() else {
        return Err(ValidationError::new(path, "expected string"));
    };
    if text.chars().count() < min_len {
        return Err(ValidationError::new(
            path,
            format!("expected string of at least {min_len} characters"),
        ));
    }
    Ok(())
}

/// Expect a JSON boolean or return a typed error.
fn expect_bool(value: &Value, path: &str) -> Result<(), ValidationError> {
    if matches!(value, Value::Bool(_)) {
        Ok(())
    } else {
        Err(ValidationError::new(path, "expected bool"))
    }
}

/// Expect any JSON number.
fn expect_number(value: &Value, path: &str) -> Result<(), ValidationError> {
    if value.is_number() {
        Ok(())
    } else {
        Err(ValidationError::new(path, "expected number"))
    }
}

/// Expect one of the allowed string literals.
fn expect_literal(value: &Value, literals: &[String], path: &str) -> Result<(), ValidationError> {
    let Some(text) = value.as_str() else {
        return Err(ValidationError::new(path, "expected string"));
    };
    if literals.iter().any(|literal| literal == text) {
        return Ok(());
    }
    let allowed = literals
        .iter()
        .map(|literal| format!("\"{literal}\""))
        .collect::<Vec<_>>()
        .join(", ");
    Err(ValidationError::new(path, format!("expected one of {allowed}")))
}

/// Validate that a value is an array of strings.
fn validate_string_array(
    value: &Value,
    path: &str,
    errors: &mut Vec<ValidationError>,
) -> Result<(), ValidationError> {
    let arr = expect_array(value, path)?;
    for (idx, entry) in arr.iter().enumerate() {
        if entry.as_str().is_none() {
            errors.push(ValidationError::new(
                format!("{path}[{idx}]"),
                "expected string",
            ));
        }
    }
    Ok(())
}

/// Join nested paths for error messages and repair reports.
pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}
