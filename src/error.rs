//! Error types for crship
//!
//! Uses `thiserror` for library errors. The binary wraps these in `anyhow`.
//!
//! Every variant that comes out of a retry loop carries the resource that
//! failed and the number of attempts that were made.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::ports::{ApiError, TransportError};
use crate::domain::value_objects::DeployState;

/// Result type alias for crship operations
pub type DeployResult<T> = Result<T, DeployError>;

/// Main error type for deploy operations
#[derive(Error, Debug)]
pub enum DeployError {
    /// Credentials were rejected (API token or SFTP password). Never retried.
    #[error("authentication failed for {resource}: {message}")]
    Auth { resource: String, message: String },

    /// The transfer host could not be reached after the retry budget was spent
    #[error("could not connect to {host} after {attempts} attempt(s): {message}")]
    Connect {
        host: String,
        attempts: u32,
        message: String,
    },

    /// A single file (or directory listing) could not be transferred
    #[error("transfer of '{path}' failed after {attempts} attempt(s): {message}")]
    Transfer {
        path: String,
        attempts: u32,
        message: String,
    },

    /// Restart was triggered but not confirmed before the poll timeout
    #[error("restart task {task_id} was not confirmed within {waited_secs}s; uploaded files are live but the restart is unconfirmed")]
    RestartTimeout { task_id: u64, waited_secs: u64 },

    /// Some uploads failed and `--force` was not given
    #[error("{failed} file(s) failed to upload (first: '{path}' after {attempts} attempt(s)); refusing to activate without --force")]
    ActivationBlocked {
        failed: usize,
        path: String,
        attempts: u32,
    },

    /// Some uploads failed in an upload-only run
    #[error("{failed} file(s) failed to upload (first: '{path}' after {attempts} attempt(s))")]
    PartialUpload {
        failed: usize,
        path: String,
        attempts: u32,
    },

    /// The upload stopped early because of a connection-level error
    #[error("upload aborted: {reason}")]
    UploadAborted { reason: String },

    /// A queued platform task reported failure
    #[error("remote {kind} task {task_id} failed: {message}")]
    TaskFailed {
        kind: String,
        task_id: u64,
        message: String,
    },

    /// Control-plane API error that is not an authentication problem
    #[error("control plane error: {0}")]
    Api(ApiError),

    /// Local project path does not exist
    #[error("project path not found: {path}")]
    ProjectNotFound { path: PathBuf },

    /// Local tree walk failed
    #[error("failed to scan {path}: {message}")]
    Scan { path: PathBuf, message: String },

    /// A path could not be turned into a relative posix path
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Configuration file could not be parsed
    #[error("invalid configuration in {file}: {message}")]
    Config { file: PathBuf, message: String },

    /// No API token was found for the webapp
    #[error("an API token is required for '{handle}': pass --token, set CRSHIP_TOKEN, or add it to .crship.toml")]
    MissingToken { handle: String },

    /// Orchestrator attempted an edge the state machine does not allow
    #[error("invalid deploy state transition from {from} to {to}")]
    InvalidTransition { from: DeployState, to: DeployState },

    /// The user declined to continue after a project layout warning
    #[error("deployment declined by user")]
    Declined,

    /// Ctrl-C or another cancellation request
    #[error("operation cancelled by user")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// Errors that mean the user stopped the run rather than something breaking
    pub fn is_user_cancel(&self) -> bool {
        matches!(self, DeployError::Cancelled | DeployError::Declined)
    }

    /// Lift a transport error into a deploy error for the given resource.
    pub fn from_transport(err: TransportError, resource: &str, attempts: u32) -> Self {
        match err {
            TransportError::Auth(message) => DeployError::Auth {
                resource: resource.to_string(),
                message,
            },
            TransportError::Connect(message) | TransportError::ConnectionLost(message) => {
                DeployError::Connect {
                    host: resource.to_string(),
                    attempts,
                    message,
                }
            }
            TransportError::File { path, message } => DeployError::Transfer {
                path,
                attempts,
                message,
            },
            TransportError::NotFound(path) => DeployError::Transfer {
                path,
                attempts,
                message: "no such file or directory".to_string(),
            },
            TransportError::Interrupted => DeployError::Cancelled,
        }
    }
}

impl From<ApiError> for DeployError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { resource, message } => DeployError::Auth { resource, message },
            other => DeployError::Api(other),
        }
    }
}
