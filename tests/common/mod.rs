//! In-process fake MPD server for the integration tests.
//!
//! Speaks just enough of the line protocol to exercise the client: greeting,
//! `commands` enumeration, `ping`, the playback commands, and `ACK` errors.
//! Connections can be killed on demand to simulate a server restart.

#![allow(dead_code)]

use mpd_remote::{ConnectionTarget, PersistentClient, StartupWait};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub const GREETING: &str = "OK MPD 0.23.5\n";

#[derive(Clone)]
struct Shared {
    log: Arc<Mutex<Vec<String>>>,
    commands: Arc<Mutex<Vec<String>>>,
    state: Arc<Mutex<String>>,
    reject_play: Arc<AtomicBool>,
}

pub struct FakeMpd {
    addr: SocketAddr,
    shared: Shared,
    connections: Arc<AtomicUsize>,
    kill_tx: broadcast::Sender<()>,
    accept_handle: JoinHandle<()>,
}

impl FakeMpd {
    /// Start on an ephemeral port
    pub async fn start(advertised: &[&str]) -> FakeMpd {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake server");
        Self::serve(listener, advertised)
    }

    /// Start on a previously reserved address
    pub async fn start_on(addr: SocketAddr, advertised: &[&str]) -> FakeMpd {
        let listener = TcpListener::bind(addr).await.expect("rebind fake server");
        Self::serve(listener, advertised)
    }

    fn serve(listener: TcpListener, advertised: &[&str]) -> FakeMpd {
        let addr = listener.local_addr().expect("local addr");
        let shared = Shared {
            log: Arc::new(Mutex::new(Vec::new())),
            commands: Arc::new(Mutex::new(
                advertised.iter().map(|s| s.to_string()).collect(),
            )),
            state: Arc::new(Mutex::new("stop".to_string())),
            reject_play: Arc::new(AtomicBool::new(false)),
        };
        let connections = Arc::new(AtomicUsize::new(0));
        let (kill_tx, _) = broadcast::channel(4);

        let accept_handle = tokio::spawn(accept_loop(
            listener,
            shared.clone(),
            connections.clone(),
            kill_tx.clone(),
        ));

        FakeMpd {
            addr,
            shared,
            connections,
            kill_tx,
            accept_handle,
        }
    }

    pub fn target(&self) -> ConnectionTarget {
        tcp_target(self.addr)
    }

    /// Raw command lines received, across all connections
    pub fn received(&self) -> Vec<String> {
        self.shared.log.lock().unwrap().clone()
    }

    pub fn clear_log(&self) {
        self.shared.log.lock().unwrap().clear();
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Replace the advertised command list (visible to later `commands` calls)
    pub fn set_commands(&self, advertised: &[&str]) {
        *self.shared.commands.lock().unwrap() =
            advertised.iter().map(|s| s.to_string()).collect();
    }

    /// Make `play` answer with an `ACK` instead of `OK`
    pub fn reject_play(&self, reject: bool) {
        self.shared.reject_play.store(reject, Ordering::SeqCst);
    }

    /// Drop every open connection, as a restarting server would
    pub fn kill_connections(&self) {
        let _ = self.kill_tx.send(());
    }

    /// Stop listening and drop every open connection
    pub fn stop(&self) {
        self.accept_handle.abort();
        self.kill_connections();
    }
}

impl Drop for FakeMpd {
    fn drop(&mut self) {
        self.accept_handle.abort();
    }
}

async fn accept_loop(
    listener: TcpListener,
    shared: Shared,
    connections: Arc<AtomicUsize>,
    kill_tx: broadcast::Sender<()>,
) {
    loop {
        let Ok((socket, _)) = listener.accept().await else {
            return;
        };
        connections.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(handle_connection(socket, shared.clone(), kill_tx.subscribe()));
    }
}

async fn handle_connection(
    mut socket: TcpStream,
    shared: Shared,
    mut kill_rx: broadcast::Receiver<()>,
) {
    if socket.write_all(GREETING.as_bytes()).await.is_err() {
        return;
    }
    let (read, mut write) = socket.into_split();
    let mut lines = BufReader::new(read).lines();

    loop {
        tokio::select! {
            _ = kill_rx.recv() => {
                // dropping the halves sends FIN, like a server restart
                return;
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { return };
                if !respond(&line, &shared, &mut write).await {
                    return;
                }
            }
        }
    }
}

async fn respond(line: &str, shared: &Shared, write: &mut OwnedWriteHalf) -> bool {
    shared.log.lock().unwrap().push(line.to_string());

    let name = line.split(' ').next().unwrap_or("");
    let reply = match name {
        "commands" => {
            let mut out = String::new();
            for command in shared.commands.lock().unwrap().iter() {
                out.push_str(&format!("command: {}\n", command));
            }
            out.push_str("OK\n");
            out
        }
        "ping" => "OK\n".to_string(),
        "status" => format!(
            "volume: 50\nstate: {}\nOK\n",
            shared.state.lock().unwrap()
        ),
        "currentsong" => "Artist: The Testers\nTitle: Fixture\nOK\n".to_string(),
        "close" => return false,
        "play" if shared.reject_play.load(Ordering::SeqCst) => {
            "ACK [55@0] {play} playlist is empty\n".to_string()
        }
        "play" | "pause" | "stop" => {
            *shared.state.lock().unwrap() = name.to_string();
            "OK\n".to_string()
        }
        "next" | "previous" | "volume" | "setvol" | "toggleoutput" => "OK\n".to_string(),
        other => format!("ACK [5@0] {{{}}} unknown command\n", other),
    };

    write.write_all(reply.as_bytes()).await.is_ok()
}

pub fn tcp_target(addr: SocketAddr) -> ConnectionTarget {
    ConnectionTarget::Tcp {
        host: addr.ip().to_string(),
        port: addr.port(),
    }
}

/// Bind and immediately release an ephemeral port, so a test can start a
/// server there later
pub async fn reserve_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("reserve port");
    listener.local_addr().expect("local addr")
}

/// Connect a client to the fake server and establish the command table
pub async fn establish(server: &FakeMpd) -> PersistentClient {
    let mut client = PersistentClient::new(server.target(), Duration::from_secs(2));
    assert_eq!(
        client.wait_for_server(Duration::from_secs(5)).await,
        StartupWait::Established
    );
    server.clear_log();
    client
}

/// First token of every received line
pub fn names(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| line.split(' ').next().unwrap_or("").to_string())
        .collect()
}
