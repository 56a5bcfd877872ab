//! Deploy plan entity
//!
//! The ordered result of diffing a local tree against a remote listing.

use serde::Serialize;

use crate::domain::value_objects::RelPath;

/// What to do with one path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanAction {
    Upload,
    Skip,
    Delete,
}

/// Why an action was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    /// No remote counterpart
    New,
    SizeChanged,
    MtimeChanged,
    ChecksumChanged,
    Unchanged,
    /// Remote-only file in deletion mode
    Extraneous,
}

impl ChangeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeReason::New => "new",
            ChangeReason::SizeChanged => "size changed",
            ChangeReason::MtimeChanged => "modified",
            ChangeReason::ChecksumChanged => "content changed",
            ChangeReason::Unchanged => "unchanged",
            ChangeReason::Extraneous => "not present locally",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub action: PlanAction,
    pub path: RelPath,
    /// Local size for uploads, remote size otherwise
    pub size: u64,
    /// Local mtime to preserve on upload
    pub mtime: Option<i64>,
    pub reason: ChangeReason,
}

/// Ordered actions plus the directories to create first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployPlan {
    pub entries: Vec<PlanEntry>,
    /// Missing remote directories, parent before child
    pub directories: Vec<RelPath>,
}

impl DeployPlan {
    pub fn uploads(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().filter(|e| e.action == PlanAction::Upload)
    }

    pub fn skips(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().filter(|e| e.action == PlanAction::Skip)
    }

    pub fn deletes(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().filter(|e| e.action == PlanAction::Delete)
    }

    pub fn upload_bytes(&self) -> u64 {
        self.uploads().map(|e| e.size).sum()
    }

    /// True when nothing would change remotely
    pub fn is_noop(&self) -> bool {
        self.directories.is_empty() && self.entries.iter().all(|e| e.action == PlanAction::Skip)
    }

    pub fn entry(&self, path: &str) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.path.as_str() == path)
    }
}
