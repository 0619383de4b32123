//! Logging setup.
//!
//! The library itself only emits `tracing` events; binaries call [`init`]
//! once to install a subscriber. Output goes to stdout in a compact format,
//! which systemd forwards to the journal unchanged.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, falling back to `default`
/// (e.g. `"info"`). Calling this twice panics, as the global subscriber can
/// only be set once.
pub fn init(default: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
