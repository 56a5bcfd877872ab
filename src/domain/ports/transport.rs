//! Transport Port
//!
//! The remote file operations a deploy needs. The production implementation
//! speaks SFTP over SSH; tests use an in-memory remote.
//!
//! Remote paths are absolute posix strings (`/www/static/site.css`).

use std::path::Path;
use thiserror::Error;

use crate::domain::value_objects::{Credentials, RemoteHost};

/// Error reported by a transport
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Credentials rejected by the server
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// Host unreachable, TCP or SSH handshake failure
    #[error("connection failed: {0}")]
    Connect(String),

    /// An established session broke
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// An operation on a single path failed
    #[error("{path}: {message}")]
    File { path: String, message: String },

    #[error("{0}: no such file or directory")]
    NotFound(String),

    /// The user cancelled while a transfer was in flight
    #[error("transfer interrupted")]
    Interrupted,
}

impl TransportError {
    /// Errors after which no further operation on the session can succeed
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TransportError::Auth(_) | TransportError::ConnectionLost(_) | TransportError::Interrupted
        )
    }

    /// The session still works after this error, so cleanup calls make sense
    pub fn leaves_session_usable(&self) -> bool {
        !matches!(self, TransportError::Auth(_) | TransportError::ConnectionLost(_))
    }

    /// Worth another connection attempt
    pub fn is_transient_connect(&self) -> bool {
        matches!(
            self,
            TransportError::Connect(_) | TransportError::ConnectionLost(_)
        )
    }
}

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, sockets and the like; ignored when listing
    Other,
}

/// Attributes of a remote path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStat {
    pub kind: EntryKind,
    pub size: u64,
    pub mtime: Option<i64>,
}

/// One directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub stat: RemoteStat,
}

/// Opens connections to a transfer host
pub trait Transport {
    type Connection: RemoteConnection;

    /// Open the network connection.
    ///
    /// The returned handle has not done its protocol handshake yet and is
    /// not authenticated.
    fn connect(&self, host: &RemoteHost) -> TransportResult<Self::Connection>;
}

/// An open connection to the transfer host
pub trait RemoteConnection {
    /// Protocol handshake on a freshly connected handle
    fn handshake(&mut self) -> TransportResult<()>;

    fn authenticate(&mut self, credentials: &Credentials) -> TransportResult<()>;

    /// List a directory; `NotFound` when it does not exist
    fn read_dir(&mut self, path: &str) -> TransportResult<Vec<RemoteEntry>>;

    fn stat(&mut self, path: &str) -> TransportResult<RemoteStat>;

    /// Create one directory level
    fn mkdir(&mut self, path: &str) -> TransportResult<()>;

    /// Copy a local file to `remote`, returning the bytes written
    fn put(&mut self, local: &Path, remote: &str) -> TransportResult<u64>;

    /// Set access and modification time (seconds since the epoch)
    fn set_mtime(&mut self, path: &str, mtime: i64) -> TransportResult<()>;

    /// Rename, replacing `to` if it exists
    fn rename(&mut self, from: &str, to: &str) -> TransportResult<()>;

    fn remove(&mut self, path: &str) -> TransportResult<()>;

    /// `sha256:<hex>` of a remote file, when the server can compute it
    fn checksum(&mut self, _path: &str) -> TransportResult<Option<String>> {
        Ok(None)
    }

    /// Tear the connection down. Must tolerate being called more than once.
    fn close(&mut self) -> TransportResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_and_lost_connection_are_fatal() {
        assert!(TransportError::Auth("no".into()).is_fatal());
        assert!(TransportError::ConnectionLost("eof".into()).is_fatal());
        assert!(!TransportError::File {
            path: "/www/a".into(),
            message: "denied".into()
        }
        .is_fatal());
    }

    #[test]
    fn interruption_stops_the_run_but_keeps_the_session() {
        let err = TransportError::Interrupted;
        assert!(err.is_fatal());
        assert!(err.leaves_session_usable());
        assert!(!err.is_transient_connect());
        assert!(!TransportError::ConnectionLost("eof".into()).leaves_session_usable());
    }

    #[test]
    fn auth_is_never_retried_on_connect() {
        assert!(!TransportError::Auth("no".into()).is_transient_connect());
        assert!(TransportError::Connect("refused".into()).is_transient_connect());
    }
}
