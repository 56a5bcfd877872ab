//! Differential Uploader
//!
//! Surveys the remote root, diffs it against the packaged local tree and
//! transfers only what changed. Each file goes to a temporary name, gets the
//! local modification time, and is then renamed into place, so a file is
//! either fully old or fully new on the server and the next survey sees it as
//! current.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::cancel::CancelToken;
use crate::domain::entities::{
    DeployPlan, FileRecord, LocalTree, PlanAction, PlanEntry, RemoteListing, UploadReport,
};
use crate::domain::ports::{
    Clock, DeployEvent, DeployEventSink, EntryKind, RemoteConnection, TransportError,
};
use crate::domain::services::{self, retry, retry_with, PlanConfig, RetryError, RetryPolicy};
use crate::domain::value_objects::RelPath;
use crate::error::{DeployError, DeployResult};

/// Suffix of in-flight uploads. Leftovers are ignored when surveying.
pub const PART_SUFFIX: &str = ".crship-part";

#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Absolute remote directory the project maps onto
    pub remote_root: String,
    pub dry_run: bool,
    pub plan: PlanConfig,
    pub file_retry: RetryPolicy,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            remote_root: "/www".to_string(),
            dry_run: false,
            plan: PlanConfig::default(),
            file_retry: RetryPolicy::default(),
        }
    }
}

pub struct DifferentialUploader {
    options: UploadOptions,
    clock: Arc<dyn Clock>,
    events: Arc<dyn DeployEventSink>,
    cancel: CancelToken,
}

/// Per-file operations are retried unless the whole session is gone
fn is_retryable(error: &TransportError) -> bool {
    !error.is_fatal()
}

/// Attempts spent on the nearest ancestor of `path` that could not be created
fn broken_ancestor(broken: &BTreeMap<RelPath, u32>, path: &RelPath) -> Option<u32> {
    path.ancestors()
        .iter()
        .rev()
        .find_map(|dir| broken.get(dir).copied())
}

impl DifferentialUploader {
    pub fn new(
        options: UploadOptions,
        clock: Arc<dyn Clock>,
        events: Arc<dyn DeployEventSink>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            options,
            clock,
            events,
            cancel,
        }
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    fn remote_root(&self) -> &str {
        let trimmed = self.options.remote_root.trim_end_matches('/');
        if trimmed.is_empty() {
            "/"
        } else {
            trimmed
        }
    }

    fn remote_path(&self, path: &RelPath) -> String {
        path.under(self.remote_root())
    }

    /// List everything below the remote root.
    ///
    /// A missing root is not an error; it yields an empty listing with
    /// `root_exists == false`.
    pub fn survey(&self, conn: &mut dyn RemoteConnection) -> DeployResult<RemoteListing> {
        let root = self.remote_root().to_string();
        let mut listing = RemoteListing::empty_root();
        let mut queue: VecDeque<(Option<RelPath>, String)> = VecDeque::new();
        queue.push_back((None, root.clone()));

        while let Some((dir, remote_dir)) = queue.pop_front() {
            if self.cancel.is_cancelled() {
                return Err(DeployError::Cancelled);
            }

            let entries = match self.read_dir_with_retry(conn, &remote_dir) {
                Ok(entries) => entries,
                Err(RetryError {
                    error: TransportError::NotFound(_),
                    ..
                }) if dir.is_none() => {
                    debug!(root = %root, "remote root does not exist yet");
                    return Ok(RemoteListing::missing_root());
                }
                Err(RetryError { error, attempts }) => {
                    return Err(DeployError::from_transport(error, &remote_dir, attempts));
                }
            };

            for entry in entries {
                if entry.name == "." || entry.name == ".." {
                    continue;
                }
                let rel = match &dir {
                    Some(parent) => parent.join(&entry.name),
                    None => RelPath::new(&entry.name),
                };
                let rel = match rel {
                    Ok(rel) => rel,
                    Err(e) => {
                        warn!(dir = %remote_dir, name = %entry.name, error = %e, "skipping unusable remote name");
                        continue;
                    }
                };

                match entry.stat.kind {
                    EntryKind::Dir => {
                        queue.push_back((Some(rel.clone()), self.remote_path(&rel)));
                        listing.dirs.insert(rel);
                    }
                    EntryKind::File if entry.name.ends_with(PART_SUFFIX) => {
                        debug!(path = %rel, "ignoring leftover partial upload");
                    }
                    EntryKind::File => {
                        let mut record = FileRecord::new(rel, entry.stat.size, entry.stat.mtime);
                        if self.options.plan.compare.needs_checksums() {
                            let remote = self.remote_path(&record.path);
                            match conn.checksum(&remote) {
                                Ok(Some(sum)) => record.checksum = Some(sum),
                                Ok(None) => {}
                                Err(e) if e.is_fatal() => {
                                    return Err(DeployError::from_transport(e, &remote, 1))
                                }
                                Err(e) => debug!(path = %remote, error = %e, "remote checksum unavailable"),
                            }
                        }
                        listing.insert(record);
                    }
                    EntryKind::Other => {
                        debug!(path = %rel, "ignoring non-regular remote entry");
                    }
                }
            }
        }

        debug!(
            files = listing.files.len(),
            dirs = listing.dirs.len(),
            "remote survey complete"
        );
        Ok(listing)
    }

    fn read_dir_with_retry(
        &self,
        conn: &mut dyn RemoteConnection,
        path: &str,
    ) -> Result<Vec<crate::domain::ports::RemoteEntry>, RetryError<TransportError>> {
        retry(
            &self.options.file_retry,
            self.clock.as_ref(),
            |_| conn.read_dir(path),
            |e| is_retryable(e) && !matches!(e, TransportError::NotFound(_)),
        )
    }

    /// Diff the local tree against a survey.
    pub fn plan(&self, local: &LocalTree, remote: &RemoteListing) -> DeployPlan {
        if self.options.plan.delete_extraneous && local.single_file {
            warn!(root = %self.remote_root(), "single-file upload, remote files are not deleted");
        }
        services::plan(local, remote, &self.options.plan)
    }

    /// Apply a plan. Never fails as a whole; problems land in the report.
    pub fn execute(
        &self,
        conn: &mut dyn RemoteConnection,
        local_root: &Path,
        plan: &DeployPlan,
    ) -> UploadReport {
        if self.options.dry_run {
            return self.describe(plan);
        }

        let mut report = UploadReport::default();

        if let Err(e) = self.ensure_root(conn) {
            warn!(root = %self.remote_root(), error = %e, "cannot create remote root");
            self.abort(&mut report, format!("cannot create {}: {}", self.remote_root(), e));
            return report;
        }

        // Directories that could not be created, with the attempts spent
        let mut broken_dirs: BTreeMap<RelPath, u32> = BTreeMap::new();
        for dir in &plan.directories {
            if self.cancel.is_cancelled() {
                self.abort(&mut report, "cancelled by user");
                return report;
            }
            if let Some(attempts) = broken_ancestor(&broken_dirs, dir) {
                broken_dirs.insert(dir.clone(), attempts);
                continue;
            }

            let remote = self.remote_path(dir);
            let result = retry(
                &self.options.file_retry,
                self.clock.as_ref(),
                |_| Self::make_dir(conn, &remote),
                is_retryable,
            );
            match result {
                Ok(()) => {
                    debug!(path = %remote, "created remote directory");
                    report.directories_created.push(dir.to_string());
                    self.events
                        .on_event(DeployEvent::DirectoryCreated { path: dir.to_string() });
                }
                Err(RetryError { error, .. }) if error.is_fatal() => {
                    self.abort(&mut report, error.to_string());
                    return report;
                }
                Err(RetryError { error, attempts }) => {
                    warn!(path = %remote, attempts, error = %error, "cannot create remote directory");
                    broken_dirs.insert(dir.clone(), attempts);
                }
            }
        }

        let total = plan.uploads().count();
        let mut index = 0;
        for entry in &plan.entries {
            if self.cancel.is_cancelled() {
                self.abort(&mut report, "cancelled by user");
                break;
            }

            match entry.action {
                PlanAction::Skip => {
                    report.skipped.push(entry.path.to_string());
                    if self.events.wants_detailed_events() {
                        self.events.on_event(DeployEvent::FileSkipped {
                            path: entry.path.to_string(),
                            reason: entry.reason.as_str().to_string(),
                        });
                    }
                }
                PlanAction::Upload => {
                    let current = index;
                    index += 1;

                    if let Some(attempts) = broken_ancestor(&broken_dirs, &entry.path) {
                        let message = "parent directory could not be created".to_string();
                        self.fail(&mut report, entry, attempts, message);
                        continue;
                    }

                    self.events.on_event(DeployEvent::FileStarted {
                        index: current,
                        total,
                        path: entry.path.to_string(),
                        size: entry.size,
                    });

                    match self.upload_with_retry(conn, local_root, entry) {
                        Err(RetryError {
                            error: TransportError::Interrupted,
                            ..
                        }) => {
                            info!(path = %entry.path, "upload interrupted");
                            self.abort(&mut report, "cancelled by user");
                            break;
                        }
                        Ok(bytes) => {
                            debug!(path = %entry.path, bytes, "uploaded");
                            report.uploaded.push(entry.path.to_string());
                            report.bytes_uploaded += bytes;
                            self.events.on_event(DeployEvent::FileUploaded {
                                index: current,
                                path: entry.path.to_string(),
                                bytes,
                            });
                        }
                        Err(RetryError { error, attempts }) => {
                            let fatal = error.is_fatal();
                            self.fail(&mut report, entry, attempts, error.to_string());
                            if fatal {
                                self.abort(&mut report, error.to_string());
                                break;
                            }
                        }
                    }
                }
                PlanAction::Delete => {
                    let remote = self.remote_path(&entry.path);
                    let result = retry(
                        &self.options.file_retry,
                        self.clock.as_ref(),
                        |_| conn.remove(&remote),
                        is_retryable,
                    );
                    match result {
                        Ok(()) => {
                            report.deleted.push(entry.path.to_string());
                            self.events.on_event(DeployEvent::FileDeleted {
                                path: entry.path.to_string(),
                            });
                        }
                        Err(RetryError { error, attempts }) => {
                            let fatal = error.is_fatal();
                            self.fail(&mut report, entry, attempts, error.to_string());
                            if fatal {
                                self.abort(&mut report, error.to_string());
                                break;
                            }
                        }
                    }
                }
            }
        }

        info!(
            uploaded = report.uploaded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            deleted = report.deleted.len(),
            aborted = report.aborted,
            "upload finished"
        );
        report
    }

    /// Survey, plan and execute in one go.
    pub fn run(
        &self,
        conn: &mut dyn RemoteConnection,
        local: &LocalTree,
    ) -> DeployResult<(DeployPlan, UploadReport)> {
        let remote = self.survey(conn)?;
        let plan = self.plan(local, &remote);
        self.events.on_event(DeployEvent::Planned {
            upload: plan.uploads().count(),
            skip: plan.skips().count(),
            delete: plan.deletes().count(),
            directories: plan.directories.len(),
            bytes: plan.upload_bytes(),
        });
        let report = self.execute(conn, &local.root, &plan);
        Ok((plan, report))
    }

    /// Report for a dry run: what would happen, with no remote calls
    fn describe(&self, plan: &DeployPlan) -> UploadReport {
        let mut report = UploadReport::dry_run();
        report.directories_created = plan.directories.iter().map(|d| d.to_string()).collect();
        for entry in &plan.entries {
            let path = entry.path.to_string();
            match entry.action {
                PlanAction::Upload => {
                    report.bytes_uploaded += entry.size;
                    report.uploaded.push(path);
                }
                PlanAction::Skip => report.skipped.push(path),
                PlanAction::Delete => report.deleted.push(path),
            }
        }
        report
    }

    fn upload_with_retry(
        &self,
        conn: &mut dyn RemoteConnection,
        local_root: &Path,
        entry: &PlanEntry,
    ) -> Result<u64, RetryError<TransportError>> {
        let local = entry.path.to_local(local_root);
        let target = self.remote_path(&entry.path);
        let temp = format!("{}{}", target, PART_SUFFIX);

        retry_with(
            &self.options.file_retry,
            self.clock.as_ref(),
            |_| {
                let result = Self::upload_once(conn, &local, &temp, &target, entry.mtime);
                if let Err(e) = &result {
                    if e.leaves_session_usable() {
                        // Best effort; a leftover temp file is ignored by later surveys
                        let _ = conn.remove(&temp);
                    }
                }
                result
            },
            is_retryable,
            |attempt, error, delay| {
                debug!(path = %entry.path, attempt, error = %error, "upload failed, retrying");
                self.events.on_event(DeployEvent::FileRetrying {
                    path: entry.path.to_string(),
                    attempt,
                    error: error.to_string(),
                    delay_ms: delay.as_millis() as u64,
                });
            },
        )
    }

    fn upload_once(
        conn: &mut dyn RemoteConnection,
        local: &Path,
        temp: &str,
        target: &str,
        mtime: Option<i64>,
    ) -> Result<u64, TransportError> {
        let bytes = conn.put(local, temp)?;
        if let Some(mtime) = mtime {
            conn.set_mtime(temp, mtime)?;
        }
        conn.rename(temp, target)?;
        Ok(bytes)
    }

    /// mkdir that accepts a directory someone else already created
    fn make_dir(conn: &mut dyn RemoteConnection, path: &str) -> Result<(), TransportError> {
        match conn.mkdir(path) {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => match conn.stat(path) {
                Ok(stat) if stat.kind == EntryKind::Dir => Ok(()),
                _ => Err(e),
            },
        }
    }

    /// Create the remote root and any missing parents.
    fn ensure_root(&self, conn: &mut dyn RemoteConnection) -> Result<(), TransportError> {
        let root = self.remote_root();
        match conn.stat(root) {
            Ok(stat) if stat.kind == EntryKind::Dir => return Ok(()),
            Ok(_) => {
                return Err(TransportError::File {
                    path: root.to_string(),
                    message: "exists but is not a directory".to_string(),
                })
            }
            Err(TransportError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let mut current = String::new();
        for segment in root.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            match conn.stat(&current) {
                Ok(_) => continue,
                Err(TransportError::NotFound(_)) => Self::make_dir(conn, &current)?,
                Err(e) => return Err(e),
            }
        }
        info!(root = %root, "created remote root");
        Ok(())
    }

    fn fail(&self, report: &mut UploadReport, entry: &PlanEntry, attempts: u32, error: String) {
        info!(path = %entry.path, attempts, error = %error, "transfer failed");
        report.record_failure(&entry.path, attempts, error.clone());
        self.events.on_event(DeployEvent::FileFailed {
            path: entry.path.to_string(),
            attempts,
            error,
        });
    }

    fn abort(&self, report: &mut UploadReport, reason: impl Into<String>) {
        let reason = reason.into();
        info!(reason = %reason, "upload aborted");
        report.abort(reason.clone());
        self.events.on_event(DeployEvent::UploadAborted { reason });
    }
}
