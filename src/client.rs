use crate::error::Result;
use crate::manager::ConnectionManager;
use crate::protocol::Response;
use crate::proxy;
use crate::registry::{CommandId, CommandRegistry};
use crate::types::{ConnectionState, ConnectionTarget, StartupWait};
use std::time::Duration;
use tokio::time::sleep;

/// Interval between start-up connection attempts
const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// MPD client that survives server restarts.
///
/// The `PersistentClient` owns the connection lifecycle and the negotiated
/// command table, and forwards every command through a health-check first:
/// when the transport has died since the last call, the connection is
/// re-established transparently before the command goes out. Callers only
/// notice through logs and the latency of the one call that healed it.
///
/// The client itself lives for the whole process; only the underlying
/// connection comes and goes.
///
/// # Example
///
/// ```no_run
/// use mpd_remote::{CommandId, ConnectionTarget, PersistentClient, StartupWait};
/// use std::time::Duration;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let target = ConnectionTarget::Tcp {
///         host: "localhost".to_string(),
///         port: 6600,
///     };
///     let mut client = PersistentClient::new(target, Duration::from_secs(10));
///
///     if client.wait_for_server(Duration::from_secs(30)).await == StartupWait::TimedOut {
///         return Err("MPD server unreachable".into());
///     }
///
///     client.invoke(CommandId::Play, &[]).await?;
///     client.disconnect().await;
///     Ok(())
/// }
/// ```
pub struct PersistentClient {
    manager: ConnectionManager,
    registry: CommandRegistry,
}

impl PersistentClient {
    /// Create a client for `target`.
    ///
    /// Nothing is connected yet; call [`wait_for_server`](Self::wait_for_server)
    /// before issuing commands. `request_timeout` bounds every exchange,
    /// health checks included.
    pub fn new(target: ConnectionTarget, request_timeout: Duration) -> Self {
        Self {
            manager: ConnectionManager::new(target, request_timeout),
            registry: CommandRegistry::new(),
        }
    }

    /// Externally observable lifecycle state.
    ///
    /// Once `CommandsEstablished` is reached it is reported for the rest of
    /// the process, across any number of internal reconnects.
    pub fn state(&self) -> ConnectionState {
        if self.registry.is_established() {
            ConnectionState::CommandsEstablished
        } else if self.manager.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// The commands currently in the proxy table
    pub fn commands(&self) -> impl Iterator<Item = CommandId> + '_ {
        self.registry.commands()
    }

    /// Protocol version from the live connection's greeting, if connected
    pub fn server_version(&self) -> Option<&str> {
        self.manager.connection().map(|c| c.version())
    }

    /// Bounded start-up wait: one connect-and-establish attempt per second.
    ///
    /// Stops as soon as the command table is established; gives up after
    /// `timeout` worth of attempts. Never fails; an unreachable server is
    /// reported as [`StartupWait::TimedOut`] for the caller to escalate.
    pub async fn wait_for_server(&mut self, timeout: Duration) -> StartupWait {
        let attempts = timeout.as_secs().max(1);

        for attempt in 1..=attempts {
            if self.try_establish().await {
                tracing::info!("MPD server ready after {} attempt(s)", attempt);
                return StartupWait::Established;
            }
            sleep(RETRY_INTERVAL).await;
        }

        tracing::warn!(
            "MPD server not reachable within {} attempts",
            attempts
        );
        StartupWait::TimedOut
    }

    /// Issue `command` with positional `args` through the proxy policy.
    ///
    /// See the crate docs for the policy itself: one health check, at most
    /// one reconnect, then the command exactly once.
    pub async fn invoke(&mut self, command: CommandId, args: &[&str]) -> Result<Response> {
        proxy::forward(&mut self.manager, &self.registry, command, args).await
    }

    /// Drop the server connection.
    ///
    /// Idempotent; this is the scoped teardown point every shutdown path
    /// funnels through. The client stays usable; the next command would
    /// simply heal the connection again.
    pub async fn disconnect(&mut self) {
        self.manager.disconnect().await;
    }

    /// One connect + establish attempt; all failures are non-fatal
    async fn try_establish(&mut self) -> bool {
        if self.manager.connect_quiet().await.is_err() {
            return false;
        }

        if !self.registry.is_established() {
            let Some(connection) = self.manager.connection_mut() else {
                return false;
            };
            if let Err(e) = self.registry.establish(connection).await {
                tracing::error!("Error establishing command list: {}", e);
                return false;
            }
        }

        self.registry.is_established()
    }
}
