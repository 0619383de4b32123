use crate::connection::Connection;
use crate::error::Result;
use crate::protocol::Command;
use std::collections::BTreeSet;

/// Commands never entered into the proxy table.
///
/// `ping` is the health check itself; wrapping it would make every health
/// check recursively health-check first.
const COMMAND_BLACKLIST: [&str; 1] = ["ping"];

/// The commands this crate knows how to issue.
///
/// The set is declared statically and dispatched through one generic entry
/// point; the server's own command list then narrows it down at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommandId {
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    Status,
    CurrentSong,
    SetVolume,
    Volume,
    ToggleOutput,
}

impl CommandId {
    /// Every command identifier, in protocol-name order
    pub const ALL: [CommandId; 10] = [
        CommandId::Play,
        CommandId::Pause,
        CommandId::Stop,
        CommandId::Next,
        CommandId::Previous,
        CommandId::Status,
        CommandId::CurrentSong,
        CommandId::SetVolume,
        CommandId::Volume,
        CommandId::ToggleOutput,
    ];

    /// Protocol name of the command
    pub fn name(self) -> &'static str {
        match self {
            CommandId::Play => "play",
            CommandId::Pause => "pause",
            CommandId::Stop => "stop",
            CommandId::Next => "next",
            CommandId::Previous => "previous",
            CommandId::Status => "status",
            CommandId::CurrentSong => "currentsong",
            CommandId::SetVolume => "setvol",
            CommandId::Volume => "volume",
            CommandId::ToggleOutput => "toggleoutput",
        }
    }

    /// Reverse lookup from a server-reported command name
    pub fn from_name(name: &str) -> Option<CommandId> {
        CommandId::ALL.iter().copied().find(|id| id.name() == name)
    }
}

/// Outcome of an [`CommandRegistry::establish`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Establish {
    /// The command table was built by this call
    Established,
    /// The table already existed; the call changed nothing
    AlreadyEstablished,
}

/// Discovers and records which commands the server supports.
///
/// The table is built on the first successful [`establish`] and is then
/// fixed for the process lifetime: later reconnects reuse it even if a
/// restarted server would report a different command list.
///
/// [`establish`]: CommandRegistry::establish
pub struct CommandRegistry {
    table: BTreeSet<CommandId>,
    established: bool,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            table: BTreeSet::new(),
            established: false,
        }
    }

    /// Whether the command table has been built
    pub fn is_established(&self) -> bool {
        self.established
    }

    /// Whether `command` is in the proxy table
    pub fn supports(&self, command: CommandId) -> bool {
        self.table.contains(&command)
    }

    /// The commands the server supports and this crate implements
    pub fn commands(&self) -> impl Iterator<Item = CommandId> + '_ {
        self.table.iter().copied()
    }

    /// Query the server's command list and build the proxy table.
    ///
    /// Runs against the live connection at most once per process: when the
    /// table already exists this is a no-op, even though `connection` may be
    /// a different socket than the one the table was built over. Reported
    /// names with no matching [`CommandId`] are skipped with a log entry.
    pub async fn establish(&mut self, connection: &mut Connection) -> Result<Establish> {
        if self.established {
            return Ok(Establish::AlreadyEstablished);
        }

        let response = connection.exchange(&Command::new("commands")).await?;
        for name in response.values("command") {
            if COMMAND_BLACKLIST.contains(&name) {
                continue;
            }
            match CommandId::from_name(name) {
                Some(id) => {
                    self.table.insert(id);
                }
                None => tracing::debug!("No local implementation for command '{}'", name),
            }
        }

        self.established = true;
        tracing::info!("Command table established: {} commands", self.table.len());
        Ok(Establish::Established)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
