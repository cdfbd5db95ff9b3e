//! Config path and encoding resolution.

use super::StoreOptions;
use super::utils::normalize_path;
use crate::definition::{CONFIG_DIR, ConfigDefinition};
use crate::{ConfigError, Encoding, ResolvedPath};
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Asks the embedding application which encoding a new project should use.
pub trait EncodingPrompt: Send + Sync {
    /// Pick an encoding for `project_root`; `None` falls back to JSONC.
    fn choose_encoding(&self, project_root: &Path) -> Option<Encoding>;
}

/// Resolution results memoized per project root and mode.
#[derive(Debug, Default)]
pub(crate) struct PathCache {
    entries: Mutex<HashMap<(PathBuf, bool), ResolvedPath>>,
}

impl PathCache {
    pub(crate) fn get(&self, root: &Path, dev_mode: bool) -> Option<ResolvedPath> {
        self.entries
            .lock()
            .get(&(root.to_path_buf(), dev_mode))
            .cloned()
    }

    pub(crate) fn insert(&self, root: &Path, dev_mode: bool, resolved: ResolvedPath) {
        self.entries
            .lock()
            .insert((root.to_path_buf(), dev_mode), resolved);
    }

    pub(crate) fn forget(&self, root: &Path) {
        self.entries.lock().retain(|(cached, _), _| cached != root);
    }

    pub(crate) fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Decides where a project's config lives and how it is encoded.
pub(crate) struct PathResolver<'a> {
    pub(crate) definition: &'a ConfigDefinition,
    pub(crate) options: &'a StoreOptions,
    pub(crate) prompt: Option<&'a dyn EncodingPrompt>,
    pub(crate) cache: &'a PathCache,
}

impl PathResolver<'_> {
    /// Resolve (or recall) the config location for `project_root`.
    pub(crate) fn resolve(
        &self,
        project_root: &Path,
        dev_mode: bool,
    ) -> Result<ResolvedPath, ConfigError> {
        let root = normalize_path(project_root)?;
        if let Some(cached) = self.cache.get(&root, dev_mode) {
            return Ok(cached);
        }

        let resolved = self.decide(&root, dev_mode);
        info!(
            "resolved config path (path={}, encoding={}, dev_mode={dev_mode})",
            resolved.path.display(),
            resolved.encoding
        );
        self.cache.insert(&root, dev_mode, resolved.clone());
        Ok(resolved)
    }

    fn decide(&self, root: &Path, dev_mode: bool) -> ResolvedPath {
        let module_path = self.config_path(root, Encoding::Module);
        if dev_mode {
            return ResolvedPath {
                path: module_path,
                encoding: Encoding::Module,
            };
        }
        if module_path.exists() {
            return ResolvedPath {
                path: module_path,
                encoding: Encoding::Module,
            };
        }
        let jsonc_path = self.config_path(root, Encoding::Jsonc);
        if jsonc_path.exists() {
            return ResolvedPath {
                path: jsonc_path,
                encoding: Encoding::Jsonc,
            };
        }

        let encoding = self.choose_for_new_project(root);
        ResolvedPath {
            path: self.config_path(root, encoding),
            encoding,
        }
    }

    fn choose_for_new_project(&self, root: &Path) -> Encoding {
        if let Some(hint) = self.options.encoding_hint {
            debug!("using encoding hint (encoding={hint})");
            return hint;
        }
        let reference = match &self.options.reference_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => root.join(path),
            None => root.join(&self.definition.reference_file),
        };
        if !reference.exists() || self.options.skip_prompt {
            return Encoding::Jsonc;
        }
        match self.prompt {
            Some(prompt) => {
                let choice = prompt.choose_encoding(root).unwrap_or(Encoding::Jsonc);
                debug!(
                    "encoding chosen by prompt (encoding={choice}, reference={})",
                    reference.display()
                );
                choice
            }
            None => Encoding::Jsonc,
        }
    }

    fn config_path(&self, root: &Path, encoding: Encoding) -> PathBuf {
        root.join(CONFIG_DIR)
            .join(self.definition.file_name(encoding))
    }
}
