//! Description of the config document supplied by the embedding application.

use crate::ConfigError;
use crate::model::ImportTarget;
use crate::schema::SchemaNode;
use serde_json::{Map, Value, json};
use std::fs;
use std::path::Path;

/// Directory (relative to the project root) holding the config document.
pub const CONFIG_DIR: &str = ".config";

/// Everything the store needs to know about one kind of config document.
#[derive(Debug, Clone)]
pub struct ConfigDefinition {
    /// File stem; the document lives at `.config/<stem>.{ts,jsonc}`.
    pub file_stem: String,
    /// Root schema (an object node).
    pub schema: SchemaNode,
    /// Always schema-valid fallback document.
    pub defaults: Value,
    /// Comment blocks placed above top-level keys when serializing.
    pub section_comments: Vec<SectionComment>,
    /// Skeleton used by the module encoding.
    pub module: ModuleTemplate,
    /// `$schema` references written into new documents.
    pub schema_refs: SchemaRefs,
    /// Project file whose presence means the project already uses module configs.
    pub reference_file: String,
    /// Top-level keys copied by [`crate::ConfigStore::migrate_from`].
    pub migratable_keys: Vec<String>,
}

/// Comment lines rendered above a top-level key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionComment {
    pub key: String,
    pub lines: Vec<String>,
}

impl SectionComment {
    pub fn new(key: &str, lines: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            lines: lines.iter().map(|line| line.to_string()).collect(),
        }
    }
}

/// Factory function and import specifiers for the module encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleTemplate {
    /// Factory wrapped around the document (`defineConfig`).
    pub factory: String,
    /// Specifier for [`ImportTarget::Library`].
    pub library_import: String,
    /// Specifier for [`ImportTarget::Development`].
    pub dev_import: String,
}

impl ModuleTemplate {
    /// Resolve the import specifier for a target.
    pub fn import_for<'a>(&'a self, target: &'a ImportTarget) -> &'a str {
        match target {
            ImportTarget::Library => &self.library_import,
            ImportTarget::Development => &self.dev_import,
            ImportTarget::Custom(path) => path,
        }
    }
}

/// `$schema` values for published and development builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRefs {
    pub published: String,
    pub development: String,
}

impl ConfigDefinition {
    /// Config file name for an encoding (`rse.ts`, `rse.jsonc`).
    pub fn file_name(&self, encoding: crate::Encoding) -> String {
        format!("{}.{}", self.file_stem, encoding.extension())
    }

    /// Whether `key` is a declared top-level property.
    pub fn is_known_key(&self, key: &str) -> bool {
        self.schema
            .as_object()
            .is_some_and(|schema| schema.contains(key))
    }

    /// Drop top-level keys the schema does not declare.
    pub fn retain_known_keys(&self, map: &mut Map<String, Value>) -> Vec<String> {
        let dropped: Vec<String> = map
            .keys()
            .filter(|key| !self.is_known_key(key))
            .cloned()
            .collect();
        for key in &dropped {
            map.shift_remove(key);
        }
        dropped
    }

    /// Render the schema as a standalone draft-07 JSON Schema document.
    pub fn json_schema(&self, title: &str, description: &str) -> Value {
        let rendered = self.schema.to_json_schema();
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "title": title,
            "description": description,
            "type": "object",
            "properties": rendered.get("properties").cloned().unwrap_or_else(|| json!({})),
            "required": rendered.get("required").cloned().unwrap_or_else(|| json!([])),
        })
    }

    /// Write [`Self::json_schema`] to `path`, replacing any previous file.
    pub fn write_json_schema(
        &self,
        path: impl AsRef<Path>,
        title: &str,
        description: &str,
    ) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let rendered = serde_json::to_string_pretty(&self.json_schema(title, description))?;
        fs::write(path, format!("{rendered}\n"))
            .map_err(|err| ConfigError::write_failed(path, err))?;
        Ok(())
    }
}

/// Source of project facts merged into freshly created documents.
pub trait ProjectDetector: Send + Sync {
    /// Inspect the project and return a (partial) document of detected values.
    fn detect(&self, project_root: &Path) -> Value;
}
