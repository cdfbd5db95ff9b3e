use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Throwaway project directory with helpers for seeding files.
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("tmp"),
        }
    }

    /// Project with a `tsconfig.json`, which makes the store ask for an encoding.
    pub fn with_tsconfig() -> Self {
        let project = Self::new();
        project.write("tsconfig.json", "{}");
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of a project-relative file.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn jsonc_config(&self) -> PathBuf {
        self.path(".config/rse.jsonc")
    }

    pub fn module_config(&self) -> PathBuf {
        self.path(".config/rse.ts")
    }

    /// Write a project-relative file, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("dir");
        }
        fs::write(&path, contents).expect("write");
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).expect("read")
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}
