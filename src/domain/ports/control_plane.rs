//! Control Plane Port
//!
//! The hosting platform's HTTPS API: webapp lookup, SFTP credential issuance,
//! and queueing and polling of platform tasks.

use std::fmt;
use thiserror::Error;

use crate::domain::entities::Webapp;
use crate::domain::value_objects::{Credentials, Environment};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// 401/403, the token is missing, wrong or lacks access
    #[error("{resource}: {message}")]
    Unauthorized { resource: String, message: String },

    /// Any other non-2xx answer
    #[error("{resource} returned HTTP {status}: {message}")]
    Status {
        resource: String,
        status: u16,
        message: String,
    },

    /// No answer at all (DNS, TLS, timeout)
    #[error("request failed: {0}")]
    Transport(String),

    /// The body did not have the expected shape
    #[error("unexpected response from {resource}: {message}")]
    Decode { resource: String, message: String },
}

impl ApiError {
    /// Worth asking again later (used while polling)
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform task types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Issue a fresh SFTP password
    ResetPassword,
    /// Deploy: install dependencies, migrate, collect static files
    Init,
    Restart,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::ResetPassword => "resetpassword",
            TaskKind::Init => "init",
            TaskKind::Restart => "restart",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed(String),
}

impl TaskStatus {
    /// Map the API's status string. Unknown values count as still running.
    pub fn from_api(status: &str, detail: Option<&str>) -> Self {
        match status {
            "completed" | "success" => TaskStatus::Completed,
            "failed" | "error" => {
                TaskStatus::Failed(detail.unwrap_or("task reported failure").to_string())
            }
            "pending" | "queued" | "new" => TaskStatus::Pending,
            _ => TaskStatus::Running,
        }
    }
}

/// Client for the hosting platform API
pub trait ControlPlane {
    fn webapp(&self, handle: &str) -> ApiResult<Webapp>;

    /// Reset and return the SFTP password for the webapp. The username is the handle.
    fn issue_credentials(&self, webapp: &Webapp, env: Environment) -> ApiResult<Credentials>;

    fn queue_task(&self, webapp: &Webapp, env: Environment, kind: TaskKind) -> ApiResult<TaskId>;

    fn task_status(&self, task: TaskId) -> ApiResult<TaskStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_mapping() {
        assert_eq!(TaskStatus::from_api("completed", None), TaskStatus::Completed);
        assert_eq!(TaskStatus::from_api("queued", None), TaskStatus::Pending);
        assert_eq!(TaskStatus::from_api("in-progress", None), TaskStatus::Running);
        assert_eq!(
            TaskStatus::from_api("failed", Some("migrate failed")),
            TaskStatus::Failed("migrate failed".into())
        );
    }

    #[test]
    fn only_server_errors_and_transport_are_transient() {
        assert!(ApiError::Transport("timeout".into()).is_transient());
        let server = ApiError::Status {
            resource: "api/tasks/1/".into(),
            status: 502,
            message: "bad gateway".into(),
        };
        assert!(server.is_transient());
        let client = ApiError::Status {
            resource: "api/tasks/1/".into(),
            status: 404,
            message: "not found".into(),
        };
        assert!(!client.is_transient());
    }

    #[test]
    fn task_kind_wire_names() {
        assert_eq!(TaskKind::ResetPassword.as_str(), "resetpassword");
        assert_eq!(TaskKind::Init.as_str(), "init");
        assert_eq!(TaskKind::Restart.as_str(), "restart");
    }
}
