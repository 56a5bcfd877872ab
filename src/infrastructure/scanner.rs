//! Local project scanner
//!
//! Walks a project with the `ignore` crate so `.gitignore`, `.crignore` and
//! configured exclude patterns all apply with gitignore semantics.
//! `.gitignore` only counts inside a git repository. The rules that applied
//! travel with the tree so deletion mode can respect them too.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use ignore::WalkBuilder;
use sha2::{Digest, Sha256};
use tracing::{debug, trace, warn};

use crate::domain::entities::{LocalFileRecord, LocalTree};
use crate::domain::ports::{ProjectSource, ScanOptions};
use crate::domain::value_objects::{ExcludeRules, RelPath, IGNORE_FILE};
use crate::error::{DeployError, DeployResult};

const GITIGNORE_FILE: &str = ".gitignore";

/// Reads the deploy source from the real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProjectSource;

impl FsProjectSource {
    pub fn new() -> Self {
        Self
    }
}

/// SHA-256 of a file's content, `sha256:<hex>`
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("sha256:{:x}", hasher.finalize()))
}

fn mtime_secs(metadata: &fs::Metadata) -> Option<i64> {
    let modified = metadata.modified().ok()?;
    match modified.duration_since(UNIX_EPOCH) {
        Ok(d) => Some(d.as_secs() as i64),
        Err(e) => Some(-(e.duration().as_secs() as i64)),
    }
}

/// Whether `root` sits inside a git work tree
fn inside_git_repo(root: &Path) -> bool {
    let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    root.ancestors().any(|dir| dir.join(".git").exists())
}

fn build_excludes(root: &Path, patterns: &[String]) -> DeployResult<ExcludeRules> {
    ExcludeRules::with_patterns(patterns).map_err(|e| DeployError::Scan {
        path: root.to_path_buf(),
        message: format!("invalid exclude pattern: {}", e),
    })
}

/// Record the ignore files of a walked directory so they can be consulted
/// after the walk.
fn collect_ignore_files(rules: &mut ExcludeRules, dir: Option<RelPath>, path: &Path, gitignore: bool) {
    let mut names = vec![IGNORE_FILE];
    if gitignore {
        names.push(GITIGNORE_FILE);
    }
    for name in names {
        let file = path.join(name);
        if !file.is_file() {
            continue;
        }
        if let Err(e) = rules.add_ignore_file(dir.clone(), &file) {
            warn!(file = %file.display(), error = %e, "unusable ignore patterns");
        }
    }
}

fn record_for(
    root: &Path,
    path: &Path,
    metadata: &fs::Metadata,
    checksums: bool,
) -> DeployResult<LocalFileRecord> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let rel = RelPath::from_path(relative).map_err(|e| DeployError::InvalidPath {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let mut record = LocalFileRecord::new(rel, metadata.len(), mtime_secs(metadata));
    if checksums {
        let hash = hash_file(path).map_err(|e| DeployError::Scan {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        record = record.with_checksum(hash);
    }
    Ok(record)
}

impl FsProjectSource {
    fn scan_file(&self, file: &Path, options: &ScanOptions) -> DeployResult<LocalTree> {
        let root = file.parent().unwrap_or(Path::new("")).to_path_buf();
        let metadata = fs::metadata(file).map_err(|e| DeployError::Scan {
            path: file.to_path_buf(),
            message: e.to_string(),
        })?;
        let record = record_for(&root, file, &metadata, options.checksums)?;
        Ok(LocalTree::single(root, record))
    }

    fn scan_dir(&self, root: &Path, options: &ScanOptions) -> DeployResult<LocalTree> {
        let use_gitignore = options.respect_gitignore && inside_git_repo(root);
        if options.respect_gitignore && !use_gitignore {
            debug!(root = %root.display(), "not a git repository, .gitignore not applied");
        }

        let base = build_excludes(root, &options.exclude)?;
        let filter_rules = base.clone();
        let filter_root = root.to_path_buf();

        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(false)
            .parents(false)
            .git_ignore(use_gitignore)
            .git_exclude(use_gitignore)
            .git_global(false)
            .require_git(false)
            .ignore(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                let relative = entry.path().strip_prefix(&filter_root).unwrap_or(entry.path());
                match RelPath::from_path(relative) {
                    Ok(rel) => !filter_rules.is_excluded(&rel, is_dir),
                    // Reported with its real error when the record is built
                    Err(_) => true,
                }
            });
        builder.add_custom_ignore_filename(IGNORE_FILE);

        let mut tree = LocalTree::new(root.to_path_buf());
        let mut rules = base;
        for result in builder.build() {
            let entry = result.map_err(|e| DeployError::Scan {
                path: root.to_path_buf(),
                message: e.to_string(),
            })?;
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if entry.depth() == 0 {
                if file_type.is_dir() {
                    collect_ignore_files(&mut rules, None, entry.path(), use_gitignore);
                }
                continue;
            }
            if file_type.is_dir() {
                let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
                if let Ok(dir) = RelPath::from_path(relative) {
                    collect_ignore_files(&mut rules, Some(dir.clone()), entry.path(), use_gitignore);
                    for ancestor in dir.ancestors() {
                        tree.dirs.insert(ancestor);
                    }
                    tree.dirs.insert(dir);
                }
                continue;
            }
            if !file_type.is_file() {
                trace!(path = %entry.path().display(), "skipping non-regular file");
                continue;
            }
            let metadata = entry.metadata().map_err(|e| DeployError::Scan {
                path: entry.path().to_path_buf(),
                message: e.to_string(),
            })?;
            tree.insert(record_for(root, entry.path(), &metadata, options.checksums)?);
        }

        debug!(
            root = %root.display(),
            files = tree.len(),
            dirs = tree.dirs.len(),
            ignore_files = rules.ignore_file_count(),
            "scan complete"
        );
        Ok(tree.with_excludes(rules))
    }
}

impl ProjectSource for FsProjectSource {
    fn scan(&self, root: &Path, options: &ScanOptions) -> DeployResult<LocalTree> {
        if root.is_file() {
            return self.scan_file(root, options);
        }
        if !root.is_dir() {
            return Err(DeployError::ProjectNotFound {
                path: root.to_path_buf(),
            });
        }
        self.scan_dir(root, options)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn child_dirs(&self, path: &Path) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(path) else {
            return Vec::new();
        };
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
            .map(|e| e.path())
            .collect();
        dirs.sort();
        dirs
    }
}
