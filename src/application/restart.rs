//! Task polling
//!
//! Platform tasks (deploy, restart) run asynchronously. We poll their status
//! at a fixed interval until they finish or the timeout passes.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::application::cancel::CancelToken;
use crate::domain::ports::{Clock, ControlPlane, TaskId, TaskKind, TaskStatus};
use crate::error::{DeployError, DeployResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(180),
        }
    }
}

/// How waiting on a task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskWait {
    Completed { waited: Duration },
    TimedOut { waited: Duration },
}

/// What the orchestrator knows about the restart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartStatus {
    NotRequested,
    Confirmed { task: TaskId, waited: Duration },
    /// Triggered, but the platform never reported completion
    TimedOut { task: TaskId, waited: Duration },
}

impl RestartStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, RestartStatus::Confirmed { .. })
    }
}

/// Poll `task` until it completes, fails, or `policy.timeout` passes.
///
/// Transient API errors while polling are logged and polling continues.
pub fn wait_for_task(
    api: &dyn ControlPlane,
    task: TaskId,
    kind: TaskKind,
    policy: &PollPolicy,
    clock: &dyn Clock,
    cancel: &CancelToken,
) -> DeployResult<TaskWait> {
    let start = clock.now();
    loop {
        if cancel.is_cancelled() {
            return Err(DeployError::Cancelled);
        }

        match api.task_status(task) {
            Ok(TaskStatus::Completed) => {
                let waited = clock.now().saturating_duration_since(start);
                debug!(task = %task, kind = %kind, waited_secs = waited.as_secs(), "task completed");
                return Ok(TaskWait::Completed { waited });
            }
            Ok(TaskStatus::Failed(message)) => {
                return Err(DeployError::TaskFailed {
                    kind: kind.to_string(),
                    task_id: task.0,
                    message,
                });
            }
            Ok(status) => debug!(task = %task, ?status, "task still running"),
            Err(e) if e.is_transient() => {
                warn!(task = %task, error = %e, "could not read task status, will retry");
            }
            Err(e) => return Err(e.into()),
        }

        let waited = clock.now().saturating_duration_since(start);
        if waited >= policy.timeout {
            info!(task = %task, kind = %kind, waited_secs = waited.as_secs(), "gave up waiting for task");
            return Ok(TaskWait::TimedOut { waited });
        }
        clock.sleep(policy.interval.min(policy.timeout - waited));
    }
}
