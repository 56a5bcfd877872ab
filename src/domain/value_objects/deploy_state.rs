//! Deploy state value object
//!
//! States of one deploy run and the edges between them.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployState {
    Idle,
    Packaging,
    Uploading,
    Activating,
    Restarting,
    Done,
    Failed,
}

impl DeployState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeployState::Done | DeployState::Failed)
    }

    /// Whether `self -> next` is an allowed edge.
    ///
    /// `Idle -> Activating` covers redeploys without upload, `Idle -> Restarting`
    /// the standalone restart, and `Uploading -> Done` dry-runs and upload-only runs.
    pub fn can_transition_to(&self, next: DeployState) -> bool {
        use DeployState::*;
        if next == Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Idle, Packaging)
                | (Idle, Activating)
                | (Idle, Restarting)
                | (Packaging, Uploading)
                | (Uploading, Activating)
                | (Uploading, Done)
                | (Activating, Restarting)
                | (Restarting, Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeployState::Idle => "idle",
            DeployState::Packaging => "packaging",
            DeployState::Uploading => "uploading",
            DeployState::Activating => "activating",
            DeployState::Restarting => "restarting",
            DeployState::Done => "done",
            DeployState::Failed => "failed",
        }
    }
}

impl fmt::Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
