use crate::error::{MpdError, Result};
use crate::protocol::Response;
use std::fmt;
use std::path::PathBuf;

/// Where the MPD server lives.
///
/// Exactly one transport form is active; the target is immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// TCP host and port
    Tcp {
        /// Hostname or IP address
        host: String,
        /// TCP port (MPD default is 6600)
        port: u16,
    },
    /// Local (Unix domain) socket path
    Socket(PathBuf),
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionTarget::Tcp { host, port } => write!(f, "{}:{}", host, port),
            ConnectionTarget::Socket(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Externally observable connection lifecycle state.
///
/// `CommandsEstablished` is terminal for the process lifetime: once the
/// command table is built, later reconnects do not change this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live connection
    Disconnected,
    /// Connected, command table not yet negotiated
    Connected,
    /// Connected at least once and the command table is built
    CommandsEstablished,
}

/// Outcome of the bounded start-up wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupWait {
    /// The server became reachable and the command table was built
    Established,
    /// The server stayed unreachable for the whole window
    TimedOut,
}

/// Playback state as reported by `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Play,
    Pause,
    Stop,
}

impl PlayState {
    fn from_name(name: &str) -> Option<PlayState> {
        match name {
            "play" => Some(PlayState::Play),
            "pause" => Some(PlayState::Pause),
            "stop" => Some(PlayState::Stop),
            _ => None,
        }
    }
}

/// The `status` fields the controller cares about
#[derive(Debug, Clone, Copy)]
pub struct Status {
    /// Current playback state
    pub state: PlayState,
    /// Volume percentage; absent when no output is enabled
    pub volume: Option<u8>,
}

impl Status {
    /// Extract the status fields from a `status` response
    pub fn from_response(response: &Response) -> Result<Status> {
        let state = response
            .get("state")
            .and_then(PlayState::from_name)
            .ok_or_else(|| MpdError::InvalidResponse("status without a play state".to_string()))?;

        // volume is -1 when MPD has no mixer; treat that the same as absent
        let volume = response
            .get("volume")
            .and_then(|v| v.parse::<i16>().ok())
            .and_then(|v| u8::try_from(v).ok());

        Ok(Status { state, volume })
    }
}
