use crate::connection::Connection;
use crate::error::{MpdError, Result};
use crate::types::ConnectionTarget;
use std::io::ErrorKind;
use std::time::Duration;

/// Owns the connection target and the connect/disconnect lifecycle.
///
/// At most one live connection exists at a time: a fresh connect always
/// tears the previous connection down first and swallows teardown failures,
/// so callers only ever see "the transport refused the connection".
///
/// Not safe for concurrent connect/disconnect; the single-threaded caller
/// serializes access by reconnecting only from within an in-flight command.
pub struct ConnectionManager {
    target: ConnectionTarget,
    request_timeout: Duration,
    connection: Option<Connection>,
}

impl ConnectionManager {
    /// Create a manager for `target`; no connection is opened yet
    pub fn new(target: ConnectionTarget, request_timeout: Duration) -> Self {
        Self {
            target,
            request_timeout,
            connection: None,
        }
    }

    /// The configured transport target
    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    /// Whether a connection is currently held
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The live connection, if any
    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// Mutable access to the live connection, if any
    pub fn connection_mut(&mut self) -> Option<&mut Connection> {
        self.connection.as_mut()
    }

    /// Tear down any existing connection and open a fresh one.
    ///
    /// Logs a refused connection before returning the error.
    pub async fn connect(&mut self) -> Result<()> {
        self.connect_inner(true).await
    }

    /// Like [`connect`](Self::connect) but without the refusal log; used by
    /// the start-up retry loop where refusals are the expected case.
    pub async fn connect_quiet(&mut self) -> Result<()> {
        self.connect_inner(false).await
    }

    async fn connect_inner(&mut self, log_refused: bool) -> Result<()> {
        self.disconnect().await;

        match Connection::open(&self.target, self.request_timeout).await {
            Ok(connection) => {
                tracing::info!("Connected to MPD server at {}", self.target);
                self.connection = Some(connection);
                Ok(())
            }
            Err(e) => {
                if log_refused {
                    tracing::error!("MPD server {}: connection refused ({})", self.target, e);
                }
                Err(e)
            }
        }
    }

    /// Close the current connection, if any. Safe to call repeatedly.
    ///
    /// Teardown failures are tolerated: a connection that was already lost
    /// reports `NotConnected`/`ConnectionReset` and is simply dropped, and a
    /// broken pipe gets one retry of the close before being dropped too.
    pub async fn disconnect(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };

        if let Err(first) = connection.close().await {
            match first {
                MpdError::Io(ref e)
                    if e.kind() == ErrorKind::NotConnected
                        || e.kind() == ErrorKind::ConnectionReset => {}
                MpdError::Io(ref e) if e.kind() == ErrorKind::BrokenPipe => {
                    if let Err(second) = connection.close().await {
                        tracing::debug!("Second close attempt failed: {}", second);
                    }
                }
                other => tracing::debug!("Close failed: {}", other),
            }
        }
        tracing::debug!("Disconnected from {}", self.target);
    }
}
