//! Configuration file handling for `/etc/mpd-remote.conf`.
//!
//! Loaded once at start-up; the resulting values are immutable for the
//! process lifetime. `[mpd]` carries the connection settings, `[gpio]` the
//! input bindings:
//!
//! ```ini
//! [mpd]
//! host = localhost
//! port = 6600
//! startup_timeout = 30
//!
//! [gpio]
//! button1 = 17,up,press,play_pause
//! button2 = 27,up,press,next,50
//! rotenc1 = 22,23,up,vol_dn,vol_up
//! ```

use crate::input::{Action, ButtonBinding, EncoderBinding, Pin, Pull, TriggerEdge};
use crate::types::ConnectionTarget;
use ini::Ini;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/mpd-remote.conf";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 6600;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_VOLUME_STEP: u8 = 5;
const DEFAULT_BOUNCE_MS: u64 = 100;

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse the config file
    #[error("Failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// A value failed validation
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// The `[gpio]` section defines no buttons or encoders
    #[error("No inputs configured in [gpio]")]
    NoInputs,
}

fn invalid(key: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        section: "gpio".to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn invalid_mpd(key: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        section: "mpd".to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Connection settings from the `[mpd]` section
#[derive(Debug, Clone)]
pub struct MpdSettings {
    /// Where the server lives
    pub target: ConnectionTarget,
    /// Per-request network timeout
    pub request_timeout: Duration,
    /// How long start-up waits for the server
    pub startup_timeout: Duration,
    /// Volume percentage per volume action
    pub volume_step: u8,
}

impl Default for MpdSettings {
    fn default() -> Self {
        Self {
            target: ConnectionTarget::Tcp {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
            },
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            startup_timeout: Duration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS),
            volume_step: DEFAULT_VOLUME_STEP,
        }
    }
}

/// The whole parsed configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub mpd: MpdSettings,
    pub buttons: Vec<ButtonBinding>,
    pub encoders: Vec<EncoderBinding>,
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }
}

/// Parse an `Ini` object into a `Config`, overlaying defaults
fn parse_ini(ini: &Ini) -> Result<Config, ConfigError> {
    let mut mpd = MpdSettings::default();

    if let Some(section) = ini.section(Some("mpd")) {
        let nonempty = |v: &str| {
            let v = v.trim();
            (!v.is_empty()).then(|| v.to_string())
        };
        let socket = section.get("socket").and_then(nonempty);
        let host = section.get("host").and_then(nonempty);
        let port_raw = section.get("port").and_then(nonempty);

        if let Some(socket) = socket {
            if host.is_some() || port_raw.is_some() {
                return Err(invalid_mpd(
                    "socket",
                    &socket,
                    "mutually exclusive with host/port",
                ));
            }
            mpd.target = ConnectionTarget::Socket(PathBuf::from(socket));
        } else {
            let port = match port_raw {
                Some(v) => v
                    .parse::<u16>()
                    .map_err(|_| invalid_mpd("port", &v, "must be a TCP port number"))?,
                None => DEFAULT_PORT,
            };
            mpd.target = ConnectionTarget::Tcp {
                host: host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port,
            };
        }

        if let Some(v) = section.get("timeout") {
            mpd.request_timeout = Duration::from_secs(parse_seconds("timeout", v)?);
        }
        if let Some(v) = section.get("startup_timeout") {
            mpd.startup_timeout = Duration::from_secs(parse_seconds("startup_timeout", v)?);
        }
        if let Some(v) = section.get("volume_step") {
            let step = v
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|s| (1..=50).contains(s))
                .ok_or_else(|| invalid_mpd("volume_step", v, "must be an integer in 1..=50"))?;
            mpd.volume_step = step;
        }
    }

    let mut buttons = Vec::new();
    let mut encoders = Vec::new();
    let mut used_pins = HashSet::new();

    if let Some(section) = ini.section(Some("gpio")) {
        for (key, value) in section.iter() {
            let name = key.to_lowercase();
            if name.starts_with("button") {
                buttons.push(parse_button(key, value, &mut used_pins)?);
            } else if name.starts_with("rotenc") {
                encoders.push(parse_encoder(key, value, &mut used_pins)?);
            } else {
                return Err(invalid(
                    key,
                    value,
                    "keys must start with 'button' or 'rotenc'",
                ));
            }
        }
    }

    if buttons.is_empty() && encoders.is_empty() {
        return Err(ConfigError::NoInputs);
    }

    Ok(Config {
        mpd,
        buttons,
        encoders,
    })
}

fn parse_seconds(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|s| *s > 0)
        .ok_or_else(|| invalid_mpd(key, value, "must be a positive number of seconds"))
}

// buttonN = pin,pull,edge,action[,bounce_ms]
fn parse_button(
    key: &str,
    value: &str,
    used_pins: &mut HashSet<Pin>,
) -> Result<ButtonBinding, ConfigError> {
    let fields: Vec<&str> = value.split(',').map(str::trim).collect();
    if !(4..=5).contains(&fields.len()) {
        return Err(invalid(key, value, "expected pin,pull,edge,action[,bounce_ms]"));
    }

    let pin = parse_pin(key, value, fields[0], used_pins)?;
    let pull = parse_pull(key, value, fields[1])?;
    let edge = TriggerEdge::from_name(&fields[2].to_lowercase()).ok_or_else(|| {
        invalid(
            key,
            value,
            format!("edge must be one of {}", TriggerEdge::NAMES.join("/")),
        )
    })?;
    let action = parse_action(key, value, fields[3])?;

    let bounce_ms = match fields.get(4) {
        Some(v) => v
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or_else(|| invalid(key, value, "bounce time must be a positive integer (ms)"))?,
        None => DEFAULT_BOUNCE_MS,
    };

    Ok(ButtonBinding {
        pin,
        pull,
        edge,
        action,
        bounce: Duration::from_millis(bounce_ms),
    })
}

// rotencN = pin_a,pin_b,pull,ccw_action,cw_action
fn parse_encoder(
    key: &str,
    value: &str,
    used_pins: &mut HashSet<Pin>,
) -> Result<EncoderBinding, ConfigError> {
    let fields: Vec<&str> = value.split(',').map(str::trim).collect();
    if fields.len() != 5 {
        return Err(invalid(
            key,
            value,
            "expected pin_a,pin_b,pull,ccw_action,cw_action",
        ));
    }

    let pin_a = parse_pin(key, value, fields[0], used_pins)?;
    let pin_b = parse_pin(key, value, fields[1], used_pins)?;
    let pull = parse_pull(key, value, fields[2])?;
    let ccw = parse_action(key, value, fields[3])?;
    let cw = parse_action(key, value, fields[4])?;

    Ok(EncoderBinding {
        pin_a,
        pin_b,
        pull,
        ccw,
        cw,
    })
}

fn parse_pin(
    key: &str,
    value: &str,
    field: &str,
    used_pins: &mut HashSet<Pin>,
) -> Result<Pin, ConfigError> {
    let pin = field
        .parse::<Pin>()
        .map_err(|_| invalid(key, value, format!("'{}' is not a GPIO pin number", field)))?;
    if !used_pins.insert(pin) {
        return Err(invalid(key, value, format!("pin {} is already in use", pin)));
    }
    Ok(pin)
}

fn parse_pull(key: &str, value: &str, field: &str) -> Result<Pull, ConfigError> {
    Pull::from_name(&field.to_lowercase()).ok_or_else(|| {
        invalid(
            key,
            value,
            format!("resistor must be one of {}", Pull::NAMES.join("/")),
        )
    })
}

fn parse_action(key: &str, value: &str, field: &str) -> Result<Action, ConfigError> {
    Action::from_name(&field.to_lowercase()).ok_or_else(|| {
        invalid(
            key,
            value,
            format!("action must be one of {}", Action::NAMES.join("/")),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        let ini = Ini::load_from_str(text).expect("valid ini");
        parse_ini(&ini)
    }

    #[test]
    fn parses_full_configuration() {
        let config = parse(
            "[mpd]\n\
             host = music.local\n\
             port = 6601\n\
             timeout = 5\n\
             startup_timeout = 20\n\
             volume_step = 3\n\
             \n\
             [gpio]\n\
             button1 = 17,up,press,play_pause\n\
             button2 = 27,dnex,release,next,50\n\
             rotenc1 = 22,23,up,vol_dn,vol_up\n",
        )
        .expect("valid config");

        assert_eq!(
            config.mpd.target,
            ConnectionTarget::Tcp {
                host: "music.local".to_string(),
                port: 6601,
            }
        );
        assert_eq!(config.mpd.request_timeout, Duration::from_secs(5));
        assert_eq!(config.mpd.startup_timeout, Duration::from_secs(20));
        assert_eq!(config.mpd.volume_step, 3);

        assert_eq!(config.buttons.len(), 2);
        assert_eq!(config.buttons[0].pin, 17);
        assert_eq!(config.buttons[0].action, Action::PlayPause);
        assert_eq!(config.buttons[0].bounce, Duration::from_millis(100));
        assert_eq!(config.buttons[1].pull, Pull::ExternalDown);
        assert_eq!(config.buttons[1].edge, TriggerEdge::Release);
        assert_eq!(config.buttons[1].bounce, Duration::from_millis(50));

        assert_eq!(config.encoders.len(), 1);
        assert_eq!(config.encoders[0].ccw, Action::VolumeDown);
        assert_eq!(config.encoders[0].cw, Action::VolumeUp);
    }

    #[test]
    fn missing_mpd_section_uses_defaults() {
        let config = parse("[gpio]\nbutton1 = 17,up,press,play_pause\n").expect("valid config");
        assert_eq!(
            config.mpd.target,
            ConnectionTarget::Tcp {
                host: "localhost".to_string(),
                port: 6600,
            }
        );
        assert_eq!(config.mpd.request_timeout, Duration::from_secs(10));
        assert_eq!(config.mpd.startup_timeout, Duration::from_secs(30));
        assert_eq!(config.mpd.volume_step, 5);
    }

    #[test]
    fn socket_target_is_supported() {
        let config = parse(
            "[mpd]\nsocket = /run/mpd/socket\n[gpio]\nbutton1 = 17,up,press,play_pause\n",
        )
        .expect("valid config");
        assert_eq!(
            config.mpd.target,
            ConnectionTarget::Socket(PathBuf::from("/run/mpd/socket"))
        );
    }

    #[test]
    fn socket_and_host_conflict() {
        let err = parse(
            "[mpd]\nsocket = /run/mpd/socket\nhost = localhost\n\
             [gpio]\nbutton1 = 17,up,press,play_pause\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "socket"));
    }

    #[test]
    fn rejects_bad_port() {
        let err = parse("[mpd]\nport = 66000x\n[gpio]\nbutton1 = 17,up,press,play_pause\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "port"));
    }

    #[test]
    fn rejects_unknown_resistor() {
        let err = parse("[gpio]\nbutton1 = 17,sideways,press,play_pause\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("up/dn/upex/dnex"), "got: {}", message);
    }

    #[test]
    fn rejects_unknown_action() {
        let err = parse("[gpio]\nbutton1 = 17,up,press,eject\n").unwrap_err();
        assert!(err.to_string().contains("play_pause"));
    }

    #[test]
    fn rejects_duplicate_pins() {
        let err = parse(
            "[gpio]\nbutton1 = 17,up,press,play_pause\nrotenc1 = 17,23,up,vol_dn,vol_up\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("already in use"));
    }

    #[test]
    fn rejects_unknown_gpio_keys() {
        let err = parse("[gpio]\nled1 = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "led1"));
    }

    #[test]
    fn rejects_zero_bounce() {
        let err = parse("[gpio]\nbutton1 = 17,up,press,play_pause,0\n").unwrap_err();
        assert!(err.to_string().contains("bounce"));
    }

    #[test]
    fn empty_gpio_section_is_an_error() {
        assert!(matches!(
            parse("[mpd]\nhost = localhost\n"),
            Err(ConfigError::NoInputs)
        ));
    }

    #[test]
    fn rejects_out_of_range_volume_step() {
        let err = parse(
            "[mpd]\nvolume_step = 90\n[gpio]\nbutton1 = 17,up,press,play_pause\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "volume_step"));
    }
}
