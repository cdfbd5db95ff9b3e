//! Deep merge of partial override documents onto complete config documents.

use super::validate::join_path;
use crate::ConfigError;
use serde_json::{Map, Value};

/// Override for a single key.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Replace the base value wholesale.
    Set(Value),
    /// Merge into the base object, leaving unspecified nested keys intact.
    Merge(PartialDocument),
    /// Delete the key from the base document.
    Remove,
}

/// Partial document applied by [`merge`]; keys it does not mention are untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartialDocument {
    entries: Vec<(String, Patch)>,
}

impl PartialDocument {
    /// Empty patch (a no-op when merged).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `key` with `value`.
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, Patch::Set(value.into()));
        self
    }

    /// Merge a nested partial document into `key`.
    pub fn merge(mut self, key: &str, nested: PartialDocument) -> Self {
        self.insert(key, Patch::Merge(nested));
        self
    }

    /// Delete `key`.
    pub fn remove(mut self, key: &str) -> Self {
        self.insert(key, Patch::Remove);
        self
    }

    /// Convert a JSON object into a patch.
    ///
    /// Nested objects merge, `null` deletes, every other value replaces.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            _ => Err(ConfigError::Invalid(
                "partial document must be an object".to_string(),
            )),
        }
    }

    fn from_map(map: Map<String, Value>) -> Self {
        let entries = map
            .into_iter()
            .map(|(key, value)| {
                let patch = match value {
                    Value::Null => Patch::Remove,
                    Value::Object(nested) => Patch::Merge(Self::from_map(nested)),
                    other => Patch::Set(other),
                };
                (key, patch)
            })
            .collect();
        Self { entries }
    }

    /// Whether the patch has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-level keys mentioned by the patch.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Patch for a top-level key.
    pub fn get(&self, key: &str) -> Option<&Patch> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, patch)| patch)
    }

    /// Keep only the top-level keys accepted by `keep`.
    pub fn retain_keys(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(key, _)| keep(key));
    }

    /// Materialize the patch as a plain object (deletions are dropped).
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (key, patch) in &self.entries {
            match patch {
                Patch::Set(value) => {
                    map.insert(key.clone(), value.clone());
                }
                Patch::Merge(nested) => {
                    map.insert(key.clone(), nested.to_value());
                }
                Patch::Remove => {}
            }
        }
        Value::Object(map)
    }

    fn insert(&mut self, key: &str, patch: Patch) {
        match self.entries.iter_mut().find(|(name, _)| name == key) {
            Some(slot) => slot.1 = patch,
            None => self.entries.push((key.to_string(), patch)),
        }
    }
}

impl TryFrom<Value> for PartialDocument {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Deep-merge `overrides` onto `base`, returning the merged document.
pub fn merge(base: &Value, overrides: &PartialDocument) -> Value {
    let mut merged = base.clone();
    apply_patch(&mut merged, overrides);
    merged
}

fn apply_patch(base: &mut Value, patch: &PartialDocument) {
    if !base.is_object() {
        *base = Value::Object(Map::new());
    }
    let Value::Object(base_map) = base else {
        return;
    };
    for (key, entry) in &patch.entries {
        match entry {
            Patch::Set(value) => {
                base_map.insert(key.clone(), value.clone());
            }
            Patch::Remove => {
                base_map.shift_remove(key);
            }
            Patch::Merge(nested) => {
                let mergeable = base_map.get(key).is_some_and(Value::is_object);
                match base_map.get_mut(key) {
                    Some(existing) if mergeable => apply_patch(existing, nested),
                    _ => {
                        base_map.insert(key.clone(), nested.to_value());
                    }
                }
            }
        }
    }
}

/// Merge overlay values into the base, recursively overriding objects.
///
/// Arrays and scalars in the overlay replace the base value wholesale.
pub(crate) fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

/// List the paths at which two documents differ.
///
/// Objects are compared key by key; arrays and scalars are compared whole.
pub(crate) fn diff_paths(before: &Value, after: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_diff(before, after, "", &mut out);
    out
}

fn collect_diff(before: &Value, after: &Value, path: &str, out: &mut Vec<String>) {
    match (before, after) {
        (Value::Object(left), Value::Object(right)) => {
            for (key, left_value) in left {
                let child = join_path(path, key);
                match right.get(key) {
                    Some(right_value) => collect_diff(left_value, right_value, &child, out),
                    None => out.push(child),
                }
            }
            for key in right.keys() {
                if !left.contains_key(key) {
                    out.push(join_path(path, key));
                }
            }
        }
        _ if before == after => {}
        _ => out.push(path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn base() -> Value {
        json!({
            "projectName": "demo",
            "features": { "i18n": false, "api": true, "docker": false },
            "ignoreDependencies": ["a", "b"]
        })
    }

    #[test]
    fn nested_merge_keeps_unspecified_fields() {
        let patch = PartialDocument::new()
            .merge("features", PartialDocument::new().set("i18n", true));
        let merged = merge(&base(), &patch);
        assert_eq!(
            merged["features"],
            json!({ "i18n": true, "api": true, "docker": false })
        );
        assert_eq!(merged["projectName"], json!("demo"));
    }

    #[test]
    fn arrays_are_replaced_not_merged() {
        let patch = PartialDocument::new().set("ignoreDependencies", json!(["c"]));
        let merged = merge(&base(), &patch);
        assert_eq!(merged["ignoreDependencies"], json!(["c"]));
    }

    #[test]
    fn remove_deletes_and_set_replaces_objects() {
        let patch = PartialDocument::new()
            .remove("projectName")
            .set("features", json!({ "ci": true }));
        let merged = merge(&base(), &patch);
        assert_eq!(merged, json!({ "features": { "ci": true }, "ignoreDependencies": ["a", "b"] }));
    }

    #[test]
    fn from_value_maps_null_to_remove() {
        let patch = PartialDocument::from_value(json!({
            "projectName": null,
            "features": { "api": false }
        }))
        .expect("patch");
        assert_eq!(patch.get("projectName"), Some(&Patch::Remove));
        let merged = merge(&base(), &patch);
        assert!(merged.get("projectName").is_none());
        assert_eq!(merged["features"]["api"], json!(false));
        assert_eq!(merged["features"]["i18n"], json!(false));
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(PartialDocument::from_value(json!([1])).is_err());
    }

    #[test]
    fn merge_onto_scalar_replaces_with_patch_contents() {
        let base = json!({ "customRules": "none" });
        let patch = PartialDocument::new().merge(
            "customRules",
            PartialDocument::new().set("strict", true).remove("ghost"),
        );
        assert_eq!(merge(&base, &patch), json!({ "customRules": { "strict": true } }));
    }

    #[test]
    fn disjoint_merges_compose() {
        let a = PartialDocument::new().merge("features", PartialDocument::new().set("ci", true));
        let b = PartialDocument::new().set("projectName", "other");
        let both = PartialDocument::new()
            .merge("features", PartialDocument::new().set("ci", true))
            .set("projectName", "other");
        assert_eq!(merge(&merge(&base(), &a), &b), merge(&base(), &both));
    }

    #[test]
    fn merge_json_values_overrides_recursively() {
        let mut doc = base();
        merge_json_values(&mut doc, &json!({ "features": { "api": false }, "version": "1.0.0" }));
        assert_eq!(doc["features"]["api"], json!(false));
        assert_eq!(doc["features"]["docker"], json!(false));
        assert_eq!(doc["version"], json!("1.0.0"));
    }

    #[test]
    fn diff_reports_changed_added_and_removed_paths() {
        let after = json!({
            "features": { "i18n": true, "api": true, "docker": false },
            "ignoreDependencies": ["a"],
            "version": "1.0.0"
        });
        assert_eq!(
            diff_paths(&base(), &after),
            vec!["projectName", "features.i18n", "ignoreDependencies", "version"]
        );
        assert!(diff_paths(&base(), &base()).is_empty());
    }
}
