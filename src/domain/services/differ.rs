//! Differ Domain Service
//!
//! Decides, file by file, whether the remote copy is current. Size is always
//! checked. Modification time is trusted within a small skew tolerance.
//! Content hashes are only consulted when timestamps cannot be trusted.

use crate::domain::entities::{
    ChangeReason, DeployPlan, FileRecord, LocalTree, PlanAction, PlanEntry, RemoteListing,
};
use crate::domain::value_objects::RelPath;

/// Whether remote modification times can be compared with local ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampPolicy {
    #[default]
    Trusted,
    /// Fall back to checksums (e.g. the server rewrites mtimes)
    Unreliable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareConfig {
    /// Allowed clock skew in seconds
    pub mtime_tolerance_secs: i64,
    pub timestamps: TimestampPolicy,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            mtime_tolerance_secs: 2,
            timestamps: TimestampPolicy::Trusted,
        }
    }
}

impl CompareConfig {
    /// True when checksums are needed to compare files
    pub fn needs_checksums(&self) -> bool {
        self.timestamps == TimestampPolicy::Unreliable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanConfig {
    pub compare: CompareConfig,
    /// Turn remote-only files into deletes
    pub delete_extraneous: bool,
}

/// Compare a local file with its remote counterpart.
pub fn compare(local: &FileRecord, remote: &FileRecord, config: &CompareConfig) -> ChangeReason {
    if local.size != remote.size {
        return ChangeReason::SizeChanged;
    }

    if config.timestamps == TimestampPolicy::Trusted {
        if let (Some(l), Some(r)) = (local.mtime, remote.mtime) {
            return if (l - r).abs() > config.mtime_tolerance_secs {
                ChangeReason::MtimeChanged
            } else {
                ChangeReason::Unchanged
            };
        }
    }

    match (&local.checksum, &remote.checksum) {
        (Some(l), Some(r)) if l != r => ChangeReason::ChecksumChanged,
        // Same size and nothing else to go on
        _ => ChangeReason::Unchanged,
    }
}

/// Diff a local tree against a remote listing.
///
/// Every local file yields exactly one entry, in path order. Remote-only files
/// follow as deletes when deletion is enabled and are otherwise left alone.
/// Deletion never reaches paths the local tree excludes, nor anything beside
/// a single uploaded file.
pub fn plan(local: &LocalTree, remote: &RemoteListing, config: &PlanConfig) -> DeployPlan {
    let mut entries = Vec::with_capacity(local.files.len());

    for (path, record) in &local.files {
        let reason = match remote.get(path) {
            Some(existing) => compare(record, existing, &config.compare),
            None => ChangeReason::New,
        };
        let action = if reason == ChangeReason::Unchanged {
            PlanAction::Skip
        } else {
            PlanAction::Upload
        };
        entries.push(PlanEntry {
            action,
            path: path.clone(),
            size: record.size,
            mtime: record.mtime,
            reason,
        });
    }

    if config.delete_extraneous {
        for (path, record) in &remote.files {
            if !local.files.contains_key(path) && local.covers(path) {
                entries.push(PlanEntry {
                    action: PlanAction::Delete,
                    path: path.clone(),
                    size: record.size,
                    mtime: record.mtime,
                    reason: ChangeReason::Extraneous,
                });
            }
        }
    }

    DeployPlan {
        entries,
        directories: missing_directories(local, remote),
    }
}

/// Local directories absent remotely, parent before child.
fn missing_directories(local: &LocalTree, remote: &RemoteListing) -> Vec<RelPath> {
    let mut dirs: Vec<RelPath> = local
        .dirs
        .iter()
        .filter(|d| !remote.dirs.contains(*d))
        .cloned()
        .collect();
    dirs.sort_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.cmp(b)));
    dirs
}
