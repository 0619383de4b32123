use crate::error::{MpdError, Result};
use crate::protocol::{self, Command, Response, ResponseLine};
use crate::types::ConnectionTarget;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, UnixStream};
use tokio::time::timeout;

/// Buffered stream over either transport form
enum MpdStream {
    Tcp(BufReader<TcpStream>),
    Unix(BufReader<UnixStream>),
}

impl MpdStream {
    async fn read_line(&mut self, buf: &mut String) -> std::io::Result<usize> {
        match self {
            MpdStream::Tcp(stream) => stream.read_line(buf).await,
            MpdStream::Unix(stream) => stream.read_line(buf).await,
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        match self {
            MpdStream::Tcp(stream) => stream.write_all(data).await,
            MpdStream::Unix(stream) => stream.write_all(data).await,
        }
    }

    async fn shutdown(&mut self) -> std::io::Result<()> {
        match self {
            MpdStream::Tcp(stream) => stream.shutdown().await,
            MpdStream::Unix(stream) => stream.shutdown().await,
        }
    }
}

/// One live connection to the server.
///
/// Owns the socket and the request/response exchange; knows nothing about
/// reconnection policy. Dropping the connection closes the socket, but the
/// deliberate teardown path is [`Connection::close`].
pub struct Connection {
    stream: MpdStream,
    version: String,
    timeout: Duration,
}

impl Connection {
    /// Open a connection to `target` and consume the server greeting.
    ///
    /// `request_timeout` bounds the greeting and every later exchange.
    pub async fn open(target: &ConnectionTarget, request_timeout: Duration) -> Result<Self> {
        tracing::debug!("Connecting to {}", target);

        let stream = match target {
            ConnectionTarget::Tcp { host, port } => MpdStream::Tcp(BufReader::new(
                TcpStream::connect((host.as_str(), *port)).await?,
            )),
            ConnectionTarget::Socket(path) => {
                MpdStream::Unix(BufReader::new(UnixStream::connect(path).await?))
            }
        };

        let mut connection = Self {
            stream,
            version: String::new(),
            timeout: request_timeout,
        };

        let greeting = match timeout(request_timeout, connection.read_line()).await {
            Ok(line) => line?,
            Err(_) => return Err(MpdError::Timeout),
        };
        connection.version = protocol::parse_greeting(&greeting)?;
        tracing::debug!("Connected, MPD protocol {}", connection.version);

        Ok(connection)
    }

    /// Protocol version announced in the greeting
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Send a command and read its complete response.
    ///
    /// An `ACK` from the server surfaces as [`MpdError::Server`]; exceeding
    /// the request timeout surfaces as [`MpdError::Timeout`].
    pub async fn exchange(&mut self, command: &Command) -> Result<Response> {
        tracing::trace!("Sending: {}", command.name());
        let encoded = command.encode();

        match timeout(self.timeout, self.exchange_inner(&encoded)).await {
            Ok(result) => result,
            Err(_) => Err(MpdError::Timeout),
        }
    }

    async fn exchange_inner(&mut self, encoded: &str) -> Result<Response> {
        self.stream.write_all(encoded.as_bytes()).await?;

        let mut response = Response::default();
        loop {
            let line = self.read_line().await?;
            match protocol::parse_line(&line)? {
                ResponseLine::Field(key, value) => response.push(key, value),
                ResponseLine::Ok => return Ok(response),
                ResponseLine::Ack {
                    code,
                    index,
                    command,
                    message,
                } => {
                    return Err(MpdError::Server {
                        code,
                        index,
                        command,
                        message,
                    })
                }
            }
        }
    }

    /// Announce `close` and shut the stream down.
    ///
    /// Fails with an I/O error when the peer is already gone; callers decide
    /// how much of that to tolerate.
    pub async fn close(&mut self) -> Result<()> {
        self.stream.write_all(b"close\n").await?;
        self.stream.shutdown().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = self.stream.read_line(&mut line).await?;
        if n == 0 {
            return Err(MpdError::ConnectionClosed);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }
}
