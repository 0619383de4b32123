//! Building blocks for GPIO-style MPD remote controls
//!
//! This library wraps an MPD (Music Player Daemon) connection in the
//! plumbing a hardware remote needs to run unattended: the server may
//! restart or the network may drop, and the remote keeps working without
//! operator intervention. It supports:
//!
//! - A self-healing client: every command is preceded by a cheap health
//!   check, and a dead connection is re-established transparently
//! - Command-set negotiation: the server's own `commands` list decides
//!   which commands are callable
//! - A bounded start-up wait for the server to come up
//! - Button and rotary-encoder bindings with debouncing and quadrature
//!   decoding (hardware pin drivers plug in behind a trait)
//! - INI configuration and the classic remote-control playback actions
//!
//! # Quick Start
//!
//! ```no_run
//! use mpd_remote::{
//!     BindingMap, ChannelSource, Config, PersistentClient, Player, Service, StartupWait,
//! };
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_from(Path::new("/etc/mpd-remote.conf"))?;
//!
//!     let mut client =
//!         PersistentClient::new(config.mpd.target.clone(), config.mpd.request_timeout);
//!     if client.wait_for_server(config.mpd.startup_timeout).await == StartupWait::TimedOut {
//!         return Err("MPD server unreachable".into());
//!     }
//!
//!     // feed pin events into `tx` from your GPIO backend of choice
//!     let (tx, source) = ChannelSource::new(64);
//!     let _ = tx;
//!
//!     let player = Player::new(client, config.mpd.volume_step);
//!     let bindings = BindingMap::new(config.buttons, config.encoders);
//!     Service::new(player, bindings)
//!         .run(source, async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized into several layers:
//!
//! - **Service**: the event loop mapping input events to player actions
//! - **Player**: one-method-per-action playback glue
//! - **Client**: the persistent facade applying the health-check-then-
//!   reconnect policy to every command
//! - **Manager / Registry**: connection lifecycle and the negotiated
//!   command table
//! - **Connection / Protocol**: MPD line-protocol transport and framing
//! - **Input / Config**: pin event decoding and the INI file format

mod client;
mod config;
mod connection;
mod error;
mod input;
mod logging;
mod manager;
mod player;
mod protocol;
mod proxy;
mod registry;
mod service;
mod types;

// Public exports
pub use client::PersistentClient;
pub use config::{Config, ConfigError, MpdSettings, DEFAULT_CONFIG_PATH};
pub use error::{MpdError, Result};
pub use input::{
    Action, BindingMap, ButtonBinding, ChannelSource, Debouncer, EncoderBinding, InputSource,
    Level, Pin, PinEvent, Pull, QuadratureDecoder, RotaryDirection, TriggerEdge,
};
pub use logging::init as init_logging;
pub use player::Player;
pub use protocol::{Command, Response};
pub use registry::CommandId;
pub use service::Service;
pub use types::{ConnectionState, ConnectionTarget, PlayState, StartupWait, Status};
