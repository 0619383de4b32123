use thiserror::Error;

/// Result type for MPD operations
pub type Result<T> = std::result::Result<T, MpdError>;

/// Errors that can occur when talking to an MPD server
#[derive(Error, Debug)]
pub enum MpdError {
    /// I/O error on the transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection was closed unexpectedly (or never opened)
    #[error("Connection closed")]
    ConnectionClosed,

    /// Request timed out waiting for a response
    #[error("Request timeout")]
    Timeout,

    /// The server rejected a command (an `ACK` response)
    #[error("Server error {code} in {command}: {message}")]
    Server {
        /// Numeric error code from the `ACK` line
        code: u32,
        /// Index of the failing command within a command list
        index: u32,
        /// Name of the command the server rejected
        command: String,
        /// Human-readable message from the server
        message: String,
    },

    /// Command is not in the proxy table (unknown to the server or to this crate)
    #[error("Unsupported command: {0}")]
    UnsupportedCommand(&'static str),

    /// Malformed protocol data from the server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl MpdError {
    /// True for transport-level failures that a reconnect may clear.
    ///
    /// Server rejections and protocol mismatches are not connection-class:
    /// the transport delivered them fine.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            MpdError::Io(_) | MpdError::ConnectionClosed | MpdError::Timeout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_class_covers_transport_failures() {
        assert!(MpdError::ConnectionClosed.is_connection_error());
        assert!(MpdError::Timeout.is_connection_error());
        assert!(
            MpdError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
                .is_connection_error()
        );
    }

    #[test]
    fn server_rejections_are_not_connection_class() {
        let err = MpdError::Server {
            code: 5,
            index: 0,
            command: "play".to_string(),
            message: "unknown command".to_string(),
        };
        assert!(!err.is_connection_error());
        assert!(!MpdError::UnsupportedCommand("shuffle").is_connection_error());
    }
}
