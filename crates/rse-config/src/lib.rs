//! Persistence, validation, and self-repair for project config documents.
//!
//! This crate locates a project's config file (`.config/<stem>.ts` or
//! `.config/<stem>.jsonc`), reads it back, repairs invalid fields from
//! defaults, deep-merges partial updates, and writes it atomically.

mod definition;
mod error;
mod model;
pub mod rse;
mod schema;
mod store;

/// Document definitions supplied by the embedding application.
pub use definition::{
    CONFIG_DIR, ConfigDefinition, ModuleTemplate, ProjectDetector, SchemaRefs, SectionComment,
};
/// Public error type returned by store and validation APIs.
pub use error::ConfigError;
/// Shared data types.
pub use model::*;
/// Schema tree types.
pub use schema::{ObjectSchema, ScalarKind, SchemaNode};
/// Store entry points and the algorithms behind them.
pub use store::{
    ConfigStore, EncodingPrompt, PartialDocument, Patch, ROOT_PATH, RepairOutcome, StoreOptions,
    merge, normalize_repo_url, repair, validate, validate_property,
};
