//! File records and trees
//!
//! The same record shape describes both sides of a deploy. Local records come
//! from walking the project directory, remote records from an SFTP listing.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::domain::value_objects::{ExcludeRules, RelPath};

/// Metadata of one regular file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: RelPath,
    pub size: u64,
    /// Modification time in whole seconds since the Unix epoch
    pub mtime: Option<i64>,
    /// `sha256:<hex>` when computed
    pub checksum: Option<String>,
}

pub type LocalFileRecord = FileRecord;
pub type RemoteFileRecord = FileRecord;

impl FileRecord {
    pub fn new(path: RelPath, size: u64, mtime: Option<i64>) -> Self {
        Self {
            path,
            size,
            mtime,
            checksum: None,
        }
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }
}

/// A packaged local project
#[derive(Debug, Clone, Default)]
pub struct LocalTree {
    /// Absolute local root; `root.join(path)` recovers a file
    pub root: PathBuf,
    pub files: BTreeMap<RelPath, LocalFileRecord>,
    /// Directories that were walked, including empty ones
    pub dirs: BTreeSet<RelPath>,
    /// Rules that kept paths out of the package
    pub excludes: ExcludeRules,
    /// Packaged from a single file rather than a directory
    pub single_file: bool,
}

impl LocalTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Tree for one file uploaded on its own
    pub fn single(root: impl Into<PathBuf>, record: LocalFileRecord) -> Self {
        let mut tree = Self::new(root);
        tree.single_file = true;
        tree.insert(record);
        tree
    }

    pub fn with_excludes(mut self, excludes: ExcludeRules) -> Self {
        self.excludes = excludes;
        self
    }

    /// Whether a remote-only file at `path` falls inside what this tree
    /// packages, and may therefore be deleted in deletion mode
    pub fn covers(&self, path: &RelPath) -> bool {
        !self.single_file && !self.excludes.is_excluded(path, false)
    }

    pub fn insert(&mut self, record: LocalFileRecord) {
        for dir in record.path.ancestors() {
            self.dirs.insert(dir);
        }
        self.files.insert(record.path.clone(), record);
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.values().map(|f| f.size).sum()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// What already exists under the remote root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteListing {
    pub files: BTreeMap<RelPath, RemoteFileRecord>,
    pub dirs: BTreeSet<RelPath>,
    /// False when the remote root itself is missing
    pub root_exists: bool,
}

impl RemoteListing {
    /// Listing of a remote root that does not exist yet
    pub fn missing_root() -> Self {
        Self::default()
    }

    pub fn empty_root() -> Self {
        Self {
            root_exists: true,
            ..Default::default()
        }
    }

    pub fn insert(&mut self, record: RemoteFileRecord) {
        self.files.insert(record.path.clone(), record);
    }

    pub fn get(&self, path: &RelPath) -> Option<&RemoteFileRecord> {
        self.files.get(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(s: &str) -> RelPath {
        RelPath::new(s).unwrap()
    }

    #[test]
    fn local_tree_records_ancestor_dirs() {
        let mut tree = LocalTree::new("/project");
        tree.insert(FileRecord::new(rel("a/b/c.txt"), 3, Some(10)));
        assert!(tree.dirs.contains(&rel("a")));
        assert!(tree.dirs.contains(&rel("a/b")));
        assert_eq!(tree.total_bytes(), 3);
    }

    #[test]
    fn single_file_tree_covers_nothing_else() {
        let tree = LocalTree::single("/project", FileRecord::new(rel("robots.txt"), 1, None));
        assert!(tree.single_file);
        assert!(!tree.covers(&rel("index.html")));

        let dir_tree = LocalTree::new("/project");
        assert!(dir_tree.covers(&rel("index.html")));
        assert!(!dir_tree.covers(&rel("venv/lib/site.py")));
    }

    #[test]
    fn missing_root_listing_is_empty() {
        let listing = RemoteListing::missing_root();
        assert!(!listing.root_exists);
        assert!(listing.files.is_empty());
    }
}
