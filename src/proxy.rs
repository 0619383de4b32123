//! The per-command proxy policy: health-check, heal, then forward.

use crate::error::{MpdError, Result};
use crate::manager::ConnectionManager;
use crate::protocol::{Command, Response};
use crate::registry::{CommandId, CommandRegistry};

/// Forward one command through the health-check-then-reconnect policy.
///
/// The sequence per call is fixed:
///
/// 1. `ping` the current connection.
/// 2. If the ping fails with a connection-class error, ask the manager for
///    one reconnect. A failed reconnect is logged and otherwise ignored.
/// 3. Issue the real command exactly once and return its result unchanged.
///
/// This is at-most-one-retry, not a retry loop: errors from the real command
/// itself are never retried here, and with the server still down step 3
/// reports an ordinary command failure to the caller.
pub(crate) async fn forward(
    manager: &mut ConnectionManager,
    registry: &CommandRegistry,
    command: CommandId,
    args: &[&str],
) -> Result<Response> {
    if !registry.supports(command) {
        return Err(MpdError::UnsupportedCommand(command.name()));
    }

    match health_check(manager).await {
        Ok(()) => {}
        Err(e) if e.is_connection_error() => {
            tracing::debug!("Health check failed ({}), reconnecting", e);
            // reconnect failures are logged by the manager and never abort
            // the call; the command below still gets its one attempt
            let _ = manager.connect().await;
        }
        // a non-transport ping failure means the server is confused,
        // not the connection; surface it
        Err(e) => return Err(e),
    }

    let connection = manager
        .connection_mut()
        .ok_or(MpdError::ConnectionClosed)?;

    let mut request = Command::new(command.name());
    for arg in args {
        request = request.arg(arg);
    }
    connection.exchange(&request).await
}

async fn health_check(manager: &mut ConnectionManager) -> Result<()> {
    let connection = manager
        .connection_mut()
        .ok_or(MpdError::ConnectionClosed)?;
    connection.exchange(&Command::new("ping")).await?;
    Ok(())
}
