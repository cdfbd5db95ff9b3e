//! Crash-safe replacement of the canonical config file.
//!
//! A write moves through `Clean -> BackedUp -> TempWritten -> Committed`.
//! Dropping a transaction before it commits rolls back: the temp file is
//! removed and a missing canonical file is restored from the backup. The
//! backup itself is only removed by [`CommittedWrite::finish`].

use super::utils::ArtifactPaths;
use crate::ConfigError;
use log::{debug, error, warn};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// How an existing canonical file is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    /// Refuse to touch an existing canonical file.
    CreateNew,
    /// Back up and replace an existing canonical file.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Clean,
    BackedUp,
    TempWritten,
    Committed,
}

/// In-flight write of one config file.
#[derive(Debug)]
pub(crate) struct WriteTransaction {
    paths: ArtifactPaths,
    stage: Stage,
    has_backup: bool,
}

/// A committed write whose backup has not been cleaned up yet.
#[derive(Debug)]
#[must_use = "call finish() to remove the backup"]
pub(crate) struct CommittedWrite {
    backup: Option<PathBuf>,
}

impl CommittedWrite {
    /// Remove the backup left by the write.
    pub(crate) fn finish(self) -> Result<(), ConfigError> {
        if let Some(backup) = self.backup {
            remove_if_exists(&backup)?;
            debug!("removed config backup (path={})", backup.display());
        }
        Ok(())
    }
}

/// Serialize-and-commit in one call.
pub(crate) fn write_document(
    path: &Path,
    contents: &str,
    mode: WriteMode,
) -> Result<CommittedWrite, ConfigError> {
    let mut transaction = WriteTransaction::begin(path)?;
    if mode == WriteMode::CreateNew && path.exists() {
        return Err(ConfigError::write_failed(
            path,
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "config file already exists",
            ),
        ));
    }
    transaction.back_up()?;
    transaction.write_temp(contents)?;
    transaction.commit()
}

/// Remove a backup left behind by an interrupted write.
pub(crate) fn discard_backup(path: &Path) -> Result<(), ConfigError> {
    let paths = ArtifactPaths::for_path(path);
    if paths.backup.exists() {
        remove_if_exists(&paths.backup)?;
        debug!("removed stale config backup (path={})", paths.backup.display());
    }
    Ok(())
}

impl WriteTransaction {
    /// Prepare the target directory and clear a stale temp file.
    pub(crate) fn begin(path: &Path) -> Result<Self, ConfigError> {
        let paths = ArtifactPaths::for_path(path);
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| ConfigError::write_failed(parent, err))?;
        }
        if paths.temp.exists() {
            warn!(
                "removing stale config temp file (path={})",
                paths.temp.display()
            );
            remove_if_exists(&paths.temp)?;
        }
        Ok(Self {
            paths,
            stage: Stage::Clean,
            has_backup: false,
        })
    }

    /// Copy the current canonical file (if any) to the backup path.
    pub(crate) fn back_up(&mut self) -> Result<(), ConfigError> {
        if self.paths.canonical.exists() {
            fs::copy(&self.paths.canonical, &self.paths.backup)
                .map_err(|err| ConfigError::write_failed(&self.paths.backup, err))?;
            self.has_backup = true;
            debug!(
                "backed up config (path={}, backup={})",
                self.paths.canonical.display(),
                self.paths.backup.display()
            );
        }
        self.stage = Stage::BackedUp;
        Ok(())
    }

    /// Write and flush the new contents to the temp path.
    pub(crate) fn write_temp(&mut self, contents: &str) -> Result<(), ConfigError> {
        let temp = &self.paths.temp;
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(temp)
            .map_err(|err| ConfigError::write_failed(temp, err))?;
        file.write_all(contents.as_bytes())
            .map_err(|err| ConfigError::write_failed(temp, err))?;
        file.sync_all()
            .map_err(|err| ConfigError::write_failed(temp, err))?;
        self.stage = Stage::TempWritten;
        Ok(())
    }

    /// Rename the temp file over the canonical path.
    pub(crate) fn commit(mut self) -> Result<CommittedWrite, ConfigError> {
        if self.stage != Stage::TempWritten {
            return Err(ConfigError::Invalid(
                "commit requires a written temp file".to_string(),
            ));
        }
        fs::rename(&self.paths.temp, &self.paths.canonical)
            .map_err(|err| ConfigError::write_failed(&self.paths.canonical, err))?;
        self.stage = Stage::Committed;
        debug!("committed config (path={})", self.paths.canonical.display());
        Ok(CommittedWrite {
            backup: self.has_backup.then(|| self.paths.backup.clone()),
        })
    }

    fn roll_back(&self) {
        if self.paths.temp.exists() {
            if let Err(err) = fs::remove_file(&self.paths.temp) {
                warn!(
                    "failed to remove config temp file (path={}, err={err})",
                    self.paths.temp.display()
                );
            }
        }
        if self.stage >= Stage::BackedUp
            && self.has_backup
            && !self.paths.canonical.exists()
        {
            match fs::copy(&self.paths.backup, &self.paths.canonical) {
                Ok(_) => warn!(
                    "restored config from backup after failed write (path={})",
                    self.paths.canonical.display()
                ),
                Err(err) => error!(
                    "failed to restore config from backup (path={}, err={err})",
                    self.paths.canonical.display()
                ),
            }
        }
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        if self.stage != Stage::Committed {
            self.roll_back();
        }
    }
}

fn remove_if_exists(path: &Path) -> Result<(), ConfigError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(ConfigError::write_failed(path, err)),
    }
}
