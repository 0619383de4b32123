//! MPD line protocol: request encoding, response parsing, and the
//! connection greeting.
//!
//! The protocol is a plain text exchange: the client sends one command per
//! line, the server answers with `key: value` lines terminated by `OK`, or
//! with a single `ACK` line on failure.

use crate::error::{MpdError, Result};
use std::fmt;

/// A single protocol command with positional arguments
#[derive(Debug, Clone)]
pub struct Command {
    name: &'static str,
    args: Vec<String>,
}

impl Command {
    /// Create a command with no arguments
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    /// Append a positional argument
    pub fn arg(mut self, arg: impl fmt::Display) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// The protocol name of the command
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wire encoding: command, quoted arguments, trailing newline.
    ///
    /// Every argument is double-quoted with `\` and `"` escaped, so values
    /// containing spaces survive intact.
    pub fn encode(&self) -> String {
        let mut line = String::from(self.name);
        for arg in &self.args {
            line.push(' ');
            line.push('"');
            for ch in arg.chars() {
                if ch == '\\' || ch == '"' {
                    line.push('\\');
                }
                line.push(ch);
            }
            line.push('"');
        }
        line.push('\n');
        line
    }
}

/// A successful response: the `key: value` pairs seen before the terminal `OK`.
///
/// Keys repeat (e.g. one `command:` line per supported command), so pairs are
/// kept in arrival order rather than collapsed into a map.
#[derive(Debug, Clone, Default)]
pub struct Response {
    fields: Vec<(String, String)>,
}

impl Response {
    pub(crate) fn push(&mut self, key: String, value: String) {
        self.fields.push((key, value));
    }

    /// First value for `key`, if any
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `key`, in arrival order
    pub fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.fields
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All `key: value` pairs, in arrival order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True when the response carried no payload lines (a bare `OK`)
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One parsed line of a server response
#[derive(Debug)]
pub(crate) enum ResponseLine {
    /// A `key: value` payload line
    Field(String, String),
    /// The terminal `OK`
    Ok,
    /// A terminal `ACK [code@index] {command} message` error line
    Ack {
        code: u32,
        index: u32,
        command: String,
        message: String,
    },
}

/// Classify one line of a response
pub(crate) fn parse_line(line: &str) -> Result<ResponseLine> {
    if line == "OK" {
        return Ok(ResponseLine::Ok);
    }
    if let Some(rest) = line.strip_prefix("ACK ") {
        return parse_ack(rest);
    }
    if let Some((key, value)) = line.split_once(": ") {
        return Ok(ResponseLine::Field(key.to_string(), value.to_string()));
    }
    Err(MpdError::InvalidResponse(line.to_string()))
}

// ACK payload shape: [code@index] {command} message
fn parse_ack(rest: &str) -> Result<ResponseLine> {
    let malformed = || MpdError::InvalidResponse(format!("ACK {}", rest));

    let rest = rest.strip_prefix('[').ok_or_else(malformed)?;
    let (code_part, rest) = rest.split_once(']').ok_or_else(malformed)?;
    let (code, index) = code_part.split_once('@').ok_or_else(malformed)?;
    let code = code.parse().map_err(|_| malformed())?;
    let index = index.parse().map_err(|_| malformed())?;

    let rest = rest.trim_start();
    let rest = rest.strip_prefix('{').ok_or_else(malformed)?;
    let (command, message) = rest.split_once('}').ok_or_else(malformed)?;

    Ok(ResponseLine::Ack {
        code,
        index,
        command: command.to_string(),
        message: message.trim_start().to_string(),
    })
}

/// Extract the protocol version from the `OK MPD <version>` greeting
pub(crate) fn parse_greeting(line: &str) -> Result<String> {
    line.strip_prefix("OK MPD ")
        .map(|version| version.to_string())
        .ok_or_else(|| MpdError::InvalidResponse(format!("unexpected greeting: {}", line)))
}
