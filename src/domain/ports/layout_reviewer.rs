//! Layout Reviewer Port
//!
//! When the local project does not look like the site type expects (for
//! example a Django app without `manage.py`), the deploy asks a reviewer
//! whether to continue anyway.
//! Implementations can be:
//! - `InteractiveReviewer`: asks on the terminal
//! - `AcceptingReviewer`: always continues (`--yes`, JSON mode, non-TTY)

use std::path::PathBuf;

use crate::domain::entities::Webapp;

/// A problem found while checking the project layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutIssue {
    /// The file that was expected
    pub file: PathBuf,
    pub message: String,
}

pub trait LayoutReviewer {
    /// Return true to continue the deploy despite the issues.
    fn review(&self, webapp: &Webapp, issues: &[LayoutIssue]) -> bool;
}

/// Continues without asking
pub struct AcceptingReviewer;

impl LayoutReviewer for AcceptingReviewer {
    fn review(&self, _webapp: &Webapp, _issues: &[LayoutIssue]) -> bool {
        true
    }
}
