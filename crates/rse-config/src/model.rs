//! Data types shared by the config store entry points.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// On-disk textual representation of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Source module exporting `factory({...})` as its default value.
    Module,
    /// Plain JSON data annotated with `//` section comments.
    Jsonc,
}

impl Encoding {
    /// File extension used for this encoding.
    pub fn extension(self) -> &'static str {
        match self {
            Encoding::Module => "ts",
            Encoding::Jsonc => "jsonc",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Module => f.write_str("module"),
            Encoding::Jsonc => f.write_str("jsonc"),
        }
    }
}

/// Location and encoding chosen for a project's config document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Canonical config file path.
    pub path: PathBuf,
    /// Encoding used to read and write `path`.
    pub encoding: Encoding,
}

/// Import specifier used by the module encoding skeleton.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImportTarget {
    /// Published library import.
    #[default]
    Library,
    /// Development-relative import used inside the tool's own repository.
    Development,
    /// Fully custom import specifier.
    Custom(String),
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Dotted/bracketed property path (`codeStyle.modernize.replaceFs`).
    pub path: String,
    /// Human-readable reason.
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() {
            "root"
        } else {
            &self.path
        };
        write!(f, "Path \"{path}\": {}", self.message)
    }
}

/// Result of an idempotent create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new document was written.
    Created(ResolvedPath),
    /// A document already existed and was left untouched.
    AlreadyExists(ResolvedPath),
}

/// Result of a successful update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The merged document equals the stored one; nothing was written.
    Unchanged,
    /// The merged document was written; lists the paths that changed.
    Updated { changed: Vec<String> },
}
