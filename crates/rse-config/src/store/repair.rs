//! Schema-driven repair of invalid config documents.
//!
//! Only the offending sub-trees are replaced with defaults; every valid user
//! value is kept verbatim. Missing properties are filled from the defaults and
//! reported separately from repaired ones.

use super::utils::normalize_repo_url;
use super::validate::{join_path, validate, validate_property};
use crate::schema::{ObjectSchema, ScalarKind, SchemaNode};
use log::{debug, info};
use serde_json::{Map, Value};

/// Path reported when the whole document had to be replaced.
pub const ROOT_PATH: &str = "<root>";

/// Result of a repair pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairOutcome {
    /// Repaired document.
    pub fixed: Value,
    /// Paths whose user value was invalid and replaced by the default.
    pub changed_paths: Vec<String>,
    /// Paths that were absent and filled from the default.
    pub filled_paths: Vec<String>,
}

/// Repair `value` against `schema`, falling back to `default` per property.
///
/// `default` must itself satisfy `schema`; the output then always validates.
pub fn repair(value: &Value, default: &Value, schema: &SchemaNode) -> RepairOutcome {
    let mut outcome = RepairOutcome {
        fixed: Value::Null,
        changed_paths: Vec::new(),
        filled_paths: Vec::new(),
    };

    outcome.fixed = match (schema, value) {
        (SchemaNode::Object(object), Value::Object(map)) => {
            let default_map = default.as_object().cloned().unwrap_or_default();
            Value::Object(repair_object(map, &default_map, object, "", &mut outcome))
        }
        _ => {
            if validate(value, schema).is_ok() {
                value.clone()
            } else {
                outcome.changed_paths.push(ROOT_PATH.to_string());
                default.clone()
            }
        }
    };

    if !outcome.filled_paths.is_empty() {
        info!(
            "filled missing config fields from defaults: {}",
            outcome.filled_paths.join(", ")
        );
    }
    if !outcome.changed_paths.is_empty() {
        debug!(
            "replaced invalid config fields with defaults: {}",
            outcome.changed_paths.join(", ")
        );
    }
    outcome
}

fn repair_object(
    user: &Map<String, Value>,
    default: &Map<String, Value>,
    schema: &ObjectSchema,
    prefix: &str,
    outcome: &mut RepairOutcome,
) -> Map<String, Value> {
    let mut fixed = default.clone();

    for (name, node) in schema.properties() {
        let path = join_path(prefix, name);
        let default_value = default.get(name);

        let Some(user_value) = user.get(name) else {
            if default_value.is_some() {
                outcome.filled_paths.push(path);
            }
            continue;
        };

        match node {
            SchemaNode::Object(child) => match user_value {
                Value::Object(user_child) => {
                    let empty = Map::new();
                    let default_child = default_value
                        .and_then(Value::as_object)
                        .unwrap_or(&empty);
                    let repaired = repair_object(user_child, default_child, child, &path, outcome);
                    fixed.insert(name.to_string(), Value::Object(repaired));
                }
                _ => {
                    fall_back(&mut fixed, name, default_value);
                    outcome.changed_paths.push(path);
                }
            },
            SchemaNode::Scalar(ScalarKind::RepoList) if user_value.is_array() => {
                fixed.insert(name.to_string(), normalize_repo_list(user_value));
            }
            SchemaNode::Scalar(_) => {
                if validate_property(name, node, user_value).is_ok() {
                    fixed.insert(name.to_string(), user_value.clone());
                } else {
                    fall_back(&mut fixed, name, default_value);
                    outcome.changed_paths.push(path);
                }
            }
        }
    }

    fixed
}

/// Replace a property with its default, or drop it when there is none.
fn fall_back(fixed: &mut Map<String, Value>, name: &str, default_value: Option<&Value>) {
    match default_value {
        Some(value) => {
            fixed.insert(name.to_string(), value.clone());
        }
        None => {
            fixed.shift_remove(name);
        }
    }
}

/// Canonicalize every entry of a repository list into `owner/repo` form.
fn normalize_repo_list(value: &Value) -> Value {
    let Value::Array(items) = value else {
        return value.clone();
    };
    Value::Array(
        items
            .iter()
            .map(|item| {
                let raw = match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                Value::String(normalize_repo_url(&raw))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ObjectSchema;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema() -> SchemaNode {
        SchemaNode::object(
            ObjectSchema::new()
                .property("projectName", SchemaNode::non_empty_string())
                .property("deployBehavior", SchemaNode::one_of(&["prompt", "autoYes", "autoNo"]))
                .property("repos", SchemaNode::repo_list())
                .property(
                    "codeStyle",
                    SchemaNode::object(
                        ObjectSchema::new()
                            .property("lineWidth", SchemaNode::number())
                            .property(
                                "modernize",
                                SchemaNode::object(
                                    ObjectSchema::new()
                                        .property("replaceFs", SchemaNode::boolean())
                                        .property("replacePath", SchemaNode::boolean()),
                                ),
                            ),
                    ),
                ),
        )
    }

    fn defaults() -> Value {
        json!({
            "projectName": "unknown",
            "deployBehavior": "prompt",
            "repos": [],
            "codeStyle": {
                "lineWidth": 80,
                "modernize": { "replaceFs": false, "replacePath": false }
            }
        })
    }

    #[test]
    fn replaces_only_invalid_leaves() {
        let user = json!({
            "projectName": "demo",
            "deployBehavior": "sometimes",
            "repos": [],
            "codeStyle": {
                "lineWidth": 120,
                "modernize": { "replaceFs": "yes", "replacePath": true }
            }
        });
        let outcome = repair(&user, &defaults(), &schema());
        assert_eq!(
            outcome.changed_paths,
            vec!["deployBehavior", "codeStyle.modernize.replaceFs"]
        );
        assert!(outcome.filled_paths.is_empty());
        assert_eq!(
            outcome.fixed,
            json!({
                "projectName": "demo",
                "deployBehavior": "prompt",
                "repos": [],
                "codeStyle": {
                    "lineWidth": 120,
                    "modernize": { "replaceFs": false, "replacePath": true }
                }
            })
        );
        assert_eq!(validate(&outcome.fixed, &schema()), Ok(()));
    }

    #[test]
    fn fills_missing_keys_without_reporting_changes() {
        let user = json!({ "projectName": "demo", "codeStyle": { "lineWidth": 100 } });
        let outcome = repair(&user, &defaults(), &schema());
        assert!(outcome.changed_paths.is_empty());
        assert_eq!(
            outcome.filled_paths,
            vec!["deployBehavior", "repos", "codeStyle.modernize"]
        );
        assert_eq!(outcome.fixed["codeStyle"]["lineWidth"], json!(100));
        assert_eq!(outcome.fixed["codeStyle"]["modernize"]["replaceFs"], json!(false));
    }

    #[test]
    fn object_node_with_scalar_value_falls_back_wholesale() {
        let user = json!({ "codeStyle": "compact" });
        let outcome = repair(&user, &defaults(), &schema());
        assert_eq!(outcome.changed_paths, vec!["codeStyle"]);
        assert_eq!(outcome.fixed["codeStyle"], defaults()["codeStyle"]);
    }

    #[test]
    fn repo_lists_are_normalized_not_replaced() {
        let user = json!({
            "repos": ["git+https://github.com/reliverse/cli.git", "https://gitlab.com/a/b"]
        });
        let outcome = repair(&user, &defaults(), &schema());
        assert!(outcome.changed_paths.is_empty());
        assert_eq!(outcome.fixed["repos"], json!(["reliverse/cli", "a/b"]));
    }

    #[test]
    fn non_object_root_is_replaced_by_default() {
        let outcome = repair(&json!("broken"), &defaults(), &schema());
        assert_eq!(outcome.changed_paths, vec![ROOT_PATH]);
        assert_eq!(outcome.fixed, defaults());
    }

    #[test]
    fn invalid_value_without_default_is_dropped() {
        let partial_defaults = json!({ "projectName": "unknown" });
        let user = json!({ "projectName": "demo", "deployBehavior": 3 });
        let outcome = repair(&user, &partial_defaults, &schema());
        assert_eq!(outcome.fixed, json!({ "projectName": "demo" }));
        assert_eq!(outcome.changed_paths, vec!["deployBehavior"]);
    }

    #[test]
    fn converges_for_injected_garbage_at_every_leaf() {
        let garbage = [json!(null), json!(42), json!("nope"), json!([1]), json!({ "x": 1 })];
        for junk in garbage {
            let user = json!({
                "projectName": junk.clone(),
                "deployBehavior": junk.clone(),
                "repos": junk.clone(),
                "codeStyle": { "lineWidth": junk.clone(), "modernize": junk.clone() }
            });
            let outcome = repair(&user, &defaults(), &schema());
            assert_eq!(validate(&outcome.fixed, &schema()), Ok(()), "junk={junk}");
        }
    }

    #[test]
    fn valid_paths_are_never_changed() {
        let user = json!({
            "projectName": "kept",
            "deployBehavior": "bogus",
            "codeStyle": { "lineWidth": 99, "modernize": { "replaceFs": true, "replacePath": 7 } }
        });
        let outcome = repair(&user, &defaults(), &schema());
        assert_eq!(outcome.fixed["projectName"], json!("kept"));
        assert_eq!(outcome.fixed["codeStyle"]["lineWidth"], json!(99));
        assert_eq!(outcome.fixed["codeStyle"]["modernize"]["replaceFs"], json!(true));
        assert_eq!(
            outcome.changed_paths,
            vec!["deployBehavior", "codeStyle.modernize.replacePath"]
        );
        assert_eq!(outcome.filled_paths, vec!["repos"]);
    }
}
