//! Deploy Result
//!
//! Outcome of one orchestrated run.

use crate::application::restart::RestartStatus;
use crate::domain::entities::UploadReport;
use crate::domain::ports::TaskId;
use crate::domain::value_objects::DeployState;
use crate::error::DeployError;

/// Result of a deploy operation
#[derive(Debug)]
pub struct DeployOutcome {
    /// Final state (`Done` or `Failed`)
    pub state: DeployState,
    pub history: Vec<DeployState>,
    /// Present when the run got as far as uploading
    pub upload: Option<UploadReport>,
    /// Deploy task queued during activation
    pub activation_task: Option<TaskId>,
    pub restart: RestartStatus,
    /// Non-fatal problems (forced activation, unconfirmed restart)
    pub warnings: Vec<String>,
    /// Why the run failed
    pub failure: Option<DeployError>,
    /// Site URL to show the user
    pub url: Option<String>,
}

impl DeployOutcome {
    pub fn new() -> Self {
        Self {
            state: DeployState::Idle,
            history: Vec::new(),
            upload: None,
            activation_task: None,
            restart: RestartStatus::NotRequested,
            warnings: Vec::new(),
            failure: None,
            url: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == DeployState::Done && self.failure.is_none()
    }

    /// The restart was triggered but never confirmed
    pub fn restart_timeout(&self) -> Option<DeployError> {
        match self.restart {
            RestartStatus::TimedOut { task, waited } => Some(DeployError::RestartTimeout {
                task_id: task.0,
                waited_secs: waited.as_secs(),
            }),
            _ => None,
        }
    }

    /// Turn a failed outcome into its error
    pub fn into_result(mut self) -> Result<DeployOutcome, DeployError> {
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

impl Default for DeployOutcome {
    fn default() -> Self {
        Self::new()
    }
}
