//! Project Source Port
//!
//! Read-only access to the local project being deployed.

use std::path::{Path, PathBuf};

use crate::domain::entities::LocalTree;
use crate::error::DeployResult;

/// Options for walking the local project
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Extra gitignore-style patterns to leave out
    pub exclude: Vec<String>,
    /// Compute `sha256:` checksums for every file
    pub checksums: bool,
    /// Honour `.gitignore` inside git repositories
    pub respect_gitignore: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            checksums: false,
            respect_gitignore: true,
        }
    }
}

pub trait ProjectSource {
    /// Walk `root` (a directory or a single file) into a tree of records.
    fn scan(&self, root: &Path, options: &ScanOptions) -> DeployResult<LocalTree>;

    fn is_file(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Immediate subdirectories of `path`, sorted
    fn child_dirs(&self, path: &Path) -> Vec<PathBuf>;

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }
}
