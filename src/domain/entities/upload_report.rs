//! Upload report entity

use serde::Serialize;

use crate::domain::value_objects::RelPath;

/// A file that still failed after its retry budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedTransfer {
    pub path: String,
    pub attempts: u32,
    pub error: String,
}

/// Outcome of executing a deploy plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    pub skipped: Vec<String>,
    pub deleted: Vec<String>,
    pub directories_created: Vec<String>,
    pub failed: Vec<FailedTransfer>,
    pub bytes_uploaded: u64,
    /// Stopped early on a fatal connection error or cancel
    pub aborted: bool,
    pub abort_reason: Option<String>,
    /// Nothing was changed remotely; lists show what would have happened
    pub dry_run: bool,
}

impl UploadReport {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Default::default()
        }
    }

    pub fn record_failure(&mut self, path: &RelPath, attempts: u32, error: impl Into<String>) {
        self.failed.push(FailedTransfer {
            path: path.to_string(),
            attempts,
            error: error.into(),
        });
    }

    pub fn abort(&mut self, reason: impl Into<String>) {
        self.aborted = true;
        self.abort_reason = Some(reason.into());
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn is_success(&self) -> bool {
        !self.aborted && self.failed.is_empty()
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "would upload" } else { "uploaded" };
        let mut text = format!(
            "{} {}, skipped {}, failed {}",
            verb,
            self.uploaded.len(),
            self.skipped.len(),
            self.failed.len()
        );
        if !self.deleted.is_empty() {
            let del = if self.dry_run { "would delete" } else { "deleted" };
            text.push_str(&format!(", {} {}", del, self.deleted.len()));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts() {
        let mut report = UploadReport::default();
        report.uploaded.push("a".into());
        report.uploaded.push("b".into());
        report.skipped.push("c".into());
        report.record_failure(&RelPath::new("d").unwrap(), 3, "boom");
        assert_eq!(report.summary(), "uploaded 2, skipped 1, failed 1");
        assert!(!report.is_success());
    }

    #[test]
    fn dry_run_summary_uses_conditional_verbs() {
        let mut report = UploadReport::dry_run();
        report.uploaded.push("a".into());
        report.deleted.push("z".into());
        assert_eq!(
            report.summary(),
            "would upload 1, skipped 0, failed 0, would delete 1"
        );
    }

    #[test]
    fn abort_marks_report() {
        let mut report = UploadReport::default();
        report.abort("connection lost");
        assert!(report.aborted);
        assert_eq!(report.abort_reason.as_deref(), Some("connection lost"));
        assert!(!report.is_success());
    }
}
