//! Keyboard-driven demo of the remote-control stack.
//!
//! Keys stand in for the GPIO inputs a real remote would wire up, but
//! everything behind them (the persistent client, command negotiation,
//! reconnect-on-failure) is the production path. Stop and restart your MPD
//! server while this runs and keep pressing keys to watch it heal.
//!
//! Usage: `cargo run --example remote -- [host [port]]`

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use futures_util::StreamExt;
use mpd_remote::{Action, CommandId, ConnectionTarget, PersistentClient, Player, StartupWait};
use std::error::Error;
use std::time::Duration;

const VOLUME_STEP: u8 = 5;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

fn key_action(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Char(' ') => Some(Action::PlayPause),
        KeyCode::Char('s') => Some(Action::PlayStop),
        KeyCode::Char('n') => Some(Action::NextTrack),
        KeyCode::Char('p') => Some(Action::PrevTrack),
        KeyCode::Char('m') => Some(Action::ToggleMute),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::VolumeUp),
        KeyCode::Char('-') => Some(Action::VolumeDown),
        _ => None,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    mpd_remote::init_logging("warn");

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "localhost".to_string());
    let port: u16 = match args.next() {
        Some(port) => port.parse()?,
        None => 6600,
    };

    let target = ConnectionTarget::Tcp { host, port };
    println!("Waiting for MPD server at {}...", target);

    let mut client = PersistentClient::new(target, REQUEST_TIMEOUT);
    if client.wait_for_server(STARTUP_TIMEOUT).await == StartupWait::TimedOut {
        eprintln!("MPD server unreachable, giving up");
        std::process::exit(1);
    }

    println!(
        "Connected, MPD protocol {}",
        client.server_version().unwrap_or("unknown")
    );
    let commands: Vec<&str> = client.commands().map(CommandId::name).collect();
    println!("Negotiated commands: {}", commands.join(", "));

    let mut player = Player::new(client, VOLUME_STEP);

    enable_raw_mode()?;
    let result = run(&mut player).await;
    disable_raw_mode()?;

    // scoped teardown, on clean exit and error alike
    player.client_mut().disconnect().await;
    result
}

async fn run(player: &mut Player) -> Result<(), Box<dyn Error>> {
    print!("space play/pause | s play/stop | n next | p prev | m mute | +/- volume | i song | q quit\r\n");

    let mut events = EventStream::new();
    while let Some(event) = events.next().await {
        let Event::Key(key) = event? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
            KeyCode::Char('i') => show_song(player).await,
            code => {
                if let Some(action) = key_action(code) {
                    act(player, action).await;
                }
            }
        }
    }
    Ok(())
}

async fn act(player: &mut Player, action: Action) {
    match player.perform(action).await {
        Ok(()) => show_status(player).await,
        Err(e) => print!("{} failed: {}\r\n", action.name(), e),
    }
}

async fn show_status(player: &mut Player) {
    match player.status().await {
        Ok(status) => {
            let volume = status
                .volume
                .map(|v| format!("{}%", v))
                .unwrap_or_else(|| "--".to_string());
            print!("state: {:?}  volume: {}\r\n", status.state, volume);
        }
        Err(e) => print!("status failed: {}\r\n", e),
    }
}

async fn show_song(player: &mut Player) {
    match player.client_mut().invoke(CommandId::CurrentSong, &[]).await {
        Ok(response) => {
            let artist = response.get("Artist").unwrap_or("?");
            let title = response.get("Title").unwrap_or("?");
            print!("{} - {}\r\n", artist, title);
        }
        Err(e) => print!("currentsong failed: {}\r\n", e),
    }
}
