//! Transfer Session Manager
//!
//! Opens authenticated connections with bounded retry and hands them out as
//! a `Session` that closes itself when dropped.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::ports::{Clock, RemoteConnection, Transport, TransportError};
use crate::domain::services::{retry_with, RetryError, RetryPolicy};
use crate::domain::value_objects::{Credentials, RemoteHost};
use crate::error::{DeployError, DeployResult};

/// An authenticated connection, owned by one run
pub struct Session<C: RemoteConnection> {
    conn: Option<C>,
    host: RemoteHost,
}

impl<C: RemoteConnection> Session<C> {
    pub fn new(conn: C, host: RemoteHost) -> Self {
        Self {
            conn: Some(conn),
            host,
        }
    }

    pub fn host(&self) -> &RemoteHost {
        &self.host
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// The live connection, or an error once the session is closed
    pub fn connection(&mut self) -> DeployResult<&mut C> {
        self.conn.as_mut().ok_or_else(|| DeployError::Connect {
            host: self.host.to_string(),
            attempts: 0,
            message: "session already closed".to_string(),
        })
    }

    /// Close the connection. Safe to call any number of times.
    pub fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            match conn.close() {
                Ok(()) => debug!(host = %self.host, "session closed"),
                Err(e) => warn!(host = %self.host, error = %e, "error while closing session"),
            }
        }
    }
}

impl<C: RemoteConnection> Drop for Session<C> {
    fn drop(&mut self) {
        self.close();
    }
}

pub struct SessionManager<T: Transport> {
    transport: T,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl<T: Transport> SessionManager<T> {
    pub fn new(transport: T, policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            policy,
            clock,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Connect, handshake and authenticate.
    ///
    /// Rejected credentials fail at once. Network failures are retried per
    /// the policy and then reported with the number of attempts made. A
    /// handle that fails after connecting is closed before the next attempt.
    pub fn open(
        &self,
        host: &RemoteHost,
        credentials: &Credentials,
    ) -> DeployResult<Session<T::Connection>> {
        let result = retry_with(
            &self.policy,
            self.clock.as_ref(),
            |attempt| {
                debug!(host = %host, attempt, "connecting");
                let mut conn = self.transport.connect(host)?;
                let ready = conn
                    .handshake()
                    .and_then(|()| conn.authenticate(credentials));
                match ready {
                    Ok(()) => Ok(conn),
                    Err(e) => {
                        if let Err(close_err) = conn.close() {
                            debug!(host = %host, error = %close_err, "close after failed attempt");
                        }
                        Err(e)
                    }
                }
            },
            TransportError::is_transient_connect,
            |attempt, error, delay| {
                warn!(
                    host = %host,
                    attempt,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "connection attempt failed, retrying"
                );
            },
        );

        match result {
            Ok(conn) => {
                info!(host = %host, user = %credentials.username, "session opened");
                Ok(Session::new(conn, host.clone()))
            }
            Err(RetryError { error, attempts }) => {
                Err(DeployError::from_transport(error, &host.to_string(), attempts))
            }
        }
    }

    /// Open a session, run `f`, and close the session on every path.
    pub fn with_session<R>(
        &self,
        host: &RemoteHost,
        credentials: &Credentials,
        f: impl FnOnce(&mut Session<T::Connection>) -> DeployResult<R>,
    ) -> DeployResult<R> {
        let mut session = self.open(host, credentials)?;
        let result = f(&mut session);
        session.close();
        result
    }
}
