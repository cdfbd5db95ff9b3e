//! Helper utilities for config path handling and value normalization.

use crate::ConfigError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static GIT_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^git\+").expect("regex"));
static HOST_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(www\.)?(github|gitlab|bitbucket|sourcehut)\.com/").expect("regex")
});
static HOST_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(github|gitlab|bitbucket|sourcehut)\.com/").expect("regex")
});
static GIT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\.git$").expect("regex"));

/// Normalize a path by canonicalizing when possible, preserving NotFound.
pub(super) fn normalize_path(path: &Path) -> Result<PathBuf, ConfigError> {
    match path.canonicalize() {
        Ok(path) => Ok(path),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(err) => Err(ConfigError::Io(err)),
    }
}

/// Sibling paths used while a document is being replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArtifactPaths {
    pub(crate) canonical: PathBuf,
    pub(crate) backup: PathBuf,
    pub(crate) temp: PathBuf,
}

impl ArtifactPaths {
    pub(crate) fn for_path(canonical: &Path) -> Self {
        Self {
            canonical: canonical.to_path_buf(),
            backup: with_suffix(canonical, "backup"),
            temp: with_suffix(canonical, "tmp"),
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Canonicalize a repository reference into `owner/repo` form.
///
/// Strips a `git+` prefix, known forge hosts, and a trailing `.git`.
pub fn normalize_repo_url(url: &str) -> String {
    let url = url.trim();
    let url = GIT_PREFIX.replace(url, "");
    let url = HOST_URL.replace(&url, "");
    let url = HOST_BARE.replace(&url, "");
    GIT_SUFFIX.replace(&url, "").into_owned()
}
