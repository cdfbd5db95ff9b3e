//! Config store: create, read, update, and resolve a project's config document.
//!
//! Composes path resolution, parsing, validation, repair, merging, and atomic
//! writes into the entry points callers use. Reads never fail; they degrade to
//! `None`. Updates either fully apply or leave the previous file in place.

mod lenient;
mod merge;
mod parse;
mod path;
mod render;
mod repair;
mod utils;
mod validate;
mod write;


use crate::definition::{ConfigDefinition, ProjectDetector};
use crate::{ConfigError, CreateOutcome, Encoding, ImportTarget, ResolvedPath, UpdateOutcome};
use log::{debug, error, info, warn};
use parse::read_document;
use path::{PathCache, PathResolver};
use render::render_document;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use utils::{ArtifactPaths, normalize_path};
use write::{WriteMode, discard_backup, write_document};

pub use merge::{PartialDocument, Patch, merge};
pub use path::EncodingPrompt;
pub use repair::{ROOT_PATH, RepairOutcome, repair};
pub use utils::normalize_repo_url;
pub use validate::{validate, validate_property};

pub(crate) use parse::parse_json5;

/// `$schema` key pinned to the development reference in dev mode.
const SCHEMA_KEY: &str = "$schema";

/// Options controlling path resolution and module output.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Never ask the prompt; new projects fall back to JSONC.
    pub skip_prompt: bool,
    /// Encoding for projects without a config file, checked before prompting.
    pub encoding_hint: Option<Encoding>,
    /// Override for the reference file (relative paths join the project root).
    pub reference_path: Option<PathBuf>,
    /// Import specifier written into module-encoded files.
    pub import_target: ImportTarget,
}

impl StoreOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress the encoding prompt.
    pub fn with_skip_prompt(mut self, skip_prompt: bool) -> Self {
        self.skip_prompt = skip_prompt;
        self
    }

    /// Pick the encoding for new projects up front.
    pub fn with_encoding_hint(mut self, encoding: Encoding) -> Self {
        self.encoding_hint = Some(encoding);
        self
    }

    /// Use a different reference file when deciding whether to prompt.
    pub fn with_reference_path(mut self, path: impl AsRef<Path>) -> Self {
        self.reference_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the import specifier for module-encoded files.
    pub fn with_import_target(mut self, target: ImportTarget) -> Self {
        self.import_target = target;
        self
    }
}

/// Entry points for one kind of config document.
pub struct ConfigStore {
    definition: ConfigDefinition,
    options: StoreOptions,
    prompt: Option<Arc<dyn EncodingPrompt>>,
    detector: Option<Arc<dyn ProjectDetector>>,
    cache: PathCache,
}

impl ConfigStore {
    /// Create a store for `definition` with default options.
    pub fn new(definition: ConfigDefinition) -> Self {
        Self {
            definition,
            options: StoreOptions::default(),
            prompt: None,
            detector: None,
            cache: PathCache::default(),
        }
    }

    /// Store for the built-in `rse` document with `package.json` detection.
    pub fn rse() -> Self {
        Self::new(crate::rse::definition()).with_detector(crate::rse::PackageJsonDetector)
    }

    /// Replace the store options.
    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Install the prompt used to pick an encoding for new projects.
    pub fn with_prompt(mut self, prompt: impl EncodingPrompt + 'static) -> Self {
        self.prompt = Some(Arc::new(prompt));
        self
    }

    /// Install the detector whose facts seed newly created documents.
    pub fn with_detector(mut self, detector: impl ProjectDetector + 'static) -> Self {
        self.detector = Some(Arc::new(detector));
        self
    }

    /// Document definition backing this store.
    pub fn definition(&self) -> &ConfigDefinition {
        &self.definition
    }

    /// Resolve where the project's config lives and how it is encoded.
    pub fn resolve_path(
        &self,
        project_root: impl AsRef<Path>,
        dev_mode: bool,
    ) -> Result<ResolvedPath, ConfigError> {
        PathResolver {
            definition: &self.definition,
            options: &self.options,
            prompt: self.prompt.as_deref(),
            cache: &self.cache,
        }
        .resolve(project_root.as_ref(), dev_mode)
    }

    /// Drop the cached resolution for a project root.
    pub fn forget(&self, project_root: impl AsRef<Path>) -> Result<(), ConfigError> {
        let root = normalize_path(project_root.as_ref())?;
        self.cache.forget(&root);
        Ok(())
    }

    /// Drop every cached resolution.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Write a new config document unless one already exists.
    ///
    /// The document is the defaults, overlaid with detected project facts,
    /// overlaid with `overrides`.
    pub fn create(
        &self,
        project_root: impl AsRef<Path>,
        dev_mode: bool,
        overrides: &PartialDocument,
    ) -> Result<CreateOutcome, ConfigError> {
        let project_root = project_root.as_ref();
        let resolved = self.resolve_path(project_root, dev_mode)?;
        if resolved.path.exists() {
            debug!(
                "config already exists; skipping create (path={})",
                resolved.path.display()
            );
            return Ok(CreateOutcome::AlreadyExists(resolved));
        }

        let mut document = self.definition.defaults.clone();
        if let Some(detector) = &self.detector {
            let detected = detector.detect(project_root);
            merge::merge_json_values(&mut document, &detected);
        }
        if dev_mode && self.definition.is_known_key(SCHEMA_KEY) {
            if let Value::Object(map) = &mut document {
                map.insert(
                    SCHEMA_KEY.to_string(),
                    Value::String(self.definition.schema_refs.development.clone()),
                );
            }
        }
        let mut document = merge(&document, overrides);
        if let Value::Object(map) = &mut document {
            self.definition.retain_known_keys(map);
        }
        if let Err(errors) = validate(&document, &self.definition.schema) {
            warn!(
                "derived config is invalid; repairing against defaults (errors={})",
                errors.len()
            );
            document = repair(&document, &self.definition.defaults, &self.definition.schema).fixed;
        }

        let text = self.render(&document, resolved.encoding, dev_mode)?;
        write_document(&resolved.path, &text, WriteMode::CreateNew)?.finish()?;
        info!(
            "created config (path={}, encoding={})",
            resolved.path.display(),
            resolved.encoding
        );
        Ok(CreateOutcome::Created(resolved))
    }

    /// Read, validate, and if needed self-heal the config document.
    ///
    /// Returns `None` when the document is absent or cannot be salvaged.
    pub fn read(&self, project_root: impl AsRef<Path>, dev_mode: bool) -> Option<Value> {
        let resolved = match self.resolve_path(project_root, dev_mode) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!("failed to resolve config path (err={err})");
                return None;
            }
        };
        let loaded = self.load(&resolved)?;
        if let Some(reason) = loaded.heal {
            self.write_back(&resolved, &loaded.value, dev_mode, reason);
        }
        Some(loaded.value)
    }

    /// Deep-merge `updates` into the stored document and persist it.
    ///
    /// A missing or unusable document is treated as the defaults. Nothing is
    /// written unless the merged document validates.
    pub fn update(
        &self,
        project_root: impl AsRef<Path>,
        dev_mode: bool,
        updates: &PartialDocument,
    ) -> Result<UpdateOutcome, ConfigError> {
        let project_root = project_root.as_ref();
        let resolved = self.resolve_path(project_root, dev_mode)?;
        let stored = self.load(&resolved);
        let base = match &stored {
            Some(loaded) => loaded.value.clone(),
            None => self.definition.defaults.clone(),
        };

        let mut merged = merge(&base, updates);
        if let Value::Object(map) = &mut merged {
            let dropped = self.definition.retain_known_keys(map);
            if !dropped.is_empty() {
                debug!("ignoring unknown update keys (keys={})", dropped.join(", "));
            }
        }
        if let Err(errors) = validate(&merged, &self.definition.schema) {
            error!(
                "rejected config update (path={}, errors={})",
                resolved.path.display(),
                errors.len()
            );
            return Err(ConfigError::SchemaViolation(errors));
        }

        let changed = merge::diff_paths(&base, &merged);
        let heal = stored.as_ref().and_then(|loaded| loaded.heal);
        if stored.is_some() && changed.is_empty() && heal.is_none() {
            discard_backup(&resolved.path)?;
            debug!(
                "config update is a no-op (path={})",
                resolved.path.display()
            );
            return Ok(UpdateOutcome::Unchanged);
        }

        let text = self.render(&merged, resolved.encoding, dev_mode)?;
        write_document(&resolved.path, &text, WriteMode::Replace)?.finish()?;
        if let Some(reason) = heal.filter(|_| changed.is_empty()) {
            info!(
                "rewrote config during update (path={}, reason={reason})",
                resolved.path.display()
            );
            return Ok(UpdateOutcome::Unchanged);
        }
        info!(
            "updated config (path={}, changed={})",
            resolved.path.display(),
            changed.join(", ")
        );
        Ok(UpdateOutcome::Updated { changed })
    }

    /// Import the migratable keys of an external JSONC config, then delete it.
    ///
    /// Returns the keys that were migrated.
    pub fn migrate_from(
        &self,
        external: impl AsRef<Path>,
        project_root: impl AsRef<Path>,
        dev_mode: bool,
    ) -> Result<Vec<String>, ConfigError> {
        let external = external.as_ref();
        let text = fs::read_to_string(external)?;
        let value = parse_json5(&text).inspect_err(|err| {
            warn!(
                "external config could not be parsed (path={}, err={err})",
                external.display()
            );
        })?;

        let mut patch = PartialDocument::from_value(value)?;
        let migratable = &self.definition.migratable_keys;
        patch.retain_keys(|key| migratable.iter().any(|allowed| allowed == key));
        let migrated: Vec<String> = patch.keys().map(str::to_string).collect();
        if !patch.is_empty() {
            self.update(project_root, dev_mode, &patch)?;
        }

        fs::remove_file(external).map_err(|err| ConfigError::write_failed(external, err))?;
        info!(
            "migrated external config (path={}, keys={})",
            external.display(),
            migrated.join(", ")
        );
        Ok(migrated)
    }

    fn render(
        &self,
        document: &Value,
        encoding: Encoding,
        dev_mode: bool,
    ) -> Result<String, ConfigError> {
        let import = match &self.options.import_target {
            ImportTarget::Custom(_) => self.options.import_target.clone(),
            _ if dev_mode => ImportTarget::Development,
            other => other.clone(),
        };
        render_document(document, encoding, &self.definition, &import)
    }

    /// Persist a self-healed document; failures are logged, not returned.
    fn write_back(&self, resolved: &ResolvedPath, document: &Value, dev_mode: bool, reason: &str) {
        let result = self
            .render(document, resolved.encoding, dev_mode)
            .and_then(|text| write_document(&resolved.path, &text, WriteMode::Replace))
            .and_then(|committed| committed.finish());
        match result {
            Ok(()) => info!(
                "rewrote config (path={}, reason={reason})",
                resolved.path.display()
            ),
            Err(err) => warn!(
                "failed to rewrite config (path={}, reason={reason}, err={err})",
                resolved.path.display()
            ),
        }
    }

    /// Parse, validate, and repair the stored document in memory.
    ///
    /// Has no side effects; `heal` says why the on-disk text should be rewritten.
    fn load(&self, resolved: &ResolvedPath) -> Option<Loaded> {
        let parsed = match read_document(&resolved.path, resolved.encoding, &self.definition) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => {
                debug!("no usable config found (path={})", resolved.path.display());
                return None;
            }
            Err(err) => {
                warn!(
                    "failed to read config (path={}, err={err})",
                    resolved.path.display()
                );
                return None;
            }
        };

        let recovered = parsed.is_recovered();
        let value = parsed.into_value();
        if validate(&value, &self.definition.schema).is_ok() {
            return Some(Loaded {
                value,
                heal: recovered.then_some("recovered"),
            });
        }

        let outcome = repair(&value, &self.definition.defaults, &self.definition.schema);
        if validate(&outcome.fixed, &self.definition.schema).is_ok() {
            return Some(Loaded {
                value: outcome.fixed,
                heal: Some("repaired"),
            });
        }

        self.load_backup(resolved)
    }

    fn load_backup(&self, resolved: &ResolvedPath) -> Option<Loaded> {
        let backup = ArtifactPaths::for_path(&resolved.path).backup;
        let parsed = match read_document(&backup, resolved.encoding, &self.definition) {
            Ok(Some(parsed)) => parsed,
            _ => {
                warn!(
                    "config could not be repaired and no usable backup exists (path={})",
                    resolved.path.display()
                );
                return None;
            }
        };
        let value = parsed.into_value();
        if validate(&value, &self.definition.schema).is_err() {
            warn!("config backup is invalid (path={})", backup.display());
            return None;
        }
        Some(Loaded {
            value,
            heal: Some("restored from backup"),
        })
    }
}

/// Stored document as loaded into memory.
struct Loaded {
    value: Value,
    /// Reason the on-disk text differs from `value`, if it does.
    heal: Option<&'static str>,
}
