//! Relative Path Value Object
//!
//! A project-relative path in posix form, used as the key that joins local
//! and remote file records:
//! - Always `/`-separated, never absolute
//! - No traversal components (`..`)
//! - `.` segments and repeated separators are collapsed

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Error when path validation fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path contains traversal components (..)
    ContainsTraversal,
    /// Path is absolute when relative is required
    AbsoluteNotAllowed,
    /// Path is empty (or only `.` segments)
    Empty,
    /// Path is not valid UTF-8
    NotUtf8,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::ContainsTraversal => write!(f, "path contains traversal components (..)"),
            PathError::AbsoluteNotAllowed => write!(f, "absolute paths are not allowed"),
            PathError::Empty => write!(f, "path is empty"),
            PathError::NotUtf8 => write!(f, "path is not valid UTF-8"),
        }
    }
}

impl std::error::Error for PathError {}

/// A validated relative posix path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelPath(String);

impl RelPath {
    /// Parse a `/`-separated string.
    pub fn new(path: &str) -> Result<Self, PathError> {
        if path.starts_with('/') {
            return Err(PathError::AbsoluteNotAllowed);
        }

        let mut segments = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(PathError::ContainsTraversal),
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self(segments.join("/")))
    }

    /// Build from a native path that is already relative to some root.
    pub fn from_path(path: &Path) -> Result<Self, PathError> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    segments.push(part.to_str().ok_or(PathError::NotUtf8)?);
                }
                Component::CurDir => continue,
                Component::ParentDir => return Err(PathError::ContainsTraversal),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(PathError::AbsoluteNotAllowed)
                }
            }
        }
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parent directory, or `None` for a top-level entry
    pub fn parent(&self) -> Option<RelPath> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| RelPath(parent.to_string()))
    }

    /// All proper ancestors, outermost first (`a`, `a/b` for `a/b/c`)
    pub fn ancestors(&self) -> Vec<RelPath> {
        let mut out = Vec::new();
        let mut end = 0;
        while let Some(pos) = self.0[end..].find('/') {
            end += pos;
            out.push(RelPath(self.0[..end].to_string()));
            end += 1;
        }
        out
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.0.split('/').count()
    }

    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Join a child segment or sub-path.
    pub fn join(&self, child: &str) -> Result<RelPath, PathError> {
        RelPath::new(&format!("{}/{}", self.0, child))
    }

    /// Local absolute path under `root`
    pub fn to_local(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, s| acc.join(s))
    }

    /// Remote absolute path under `remote_root`
    pub fn under(&self, remote_root: &str) -> String {
        let root = remote_root.trim_end_matches('/');
        format!("{}/{}", root, self.0)
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for RelPath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for RelPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
