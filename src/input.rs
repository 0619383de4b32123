//! Input event model: pin events in, bound player actions out.
//!
//! Hardware pin drivers stay outside the crate. Whatever backend owns the
//! pins (a GPIO character-device reader, a keyboard shim, a test) feeds raw
//! level transitions through an [`InputSource`]; debouncing, quadrature
//! decoding, and the pin-to-action mapping all happen here.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Physical pin number (BCM numbering)
pub type Pin = u8;

/// Electrical level of an input pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Pull resistor configuration for an input pin.
///
/// The `External` variants describe pins wired to an external resistor;
/// the level the pin rests at (and therefore which level means "pressed")
/// follows from the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    /// Internal pull-up; active low
    Up,
    /// Internal pull-down; active high
    Down,
    /// External pull-up; active low
    ExternalUp,
    /// External pull-down; active high
    ExternalDown,
}

impl Pull {
    /// Accepted configuration names
    pub const NAMES: [&'static str; 4] = ["up", "dn", "upex", "dnex"];

    /// Parse a configuration name
    pub fn from_name(name: &str) -> Option<Pull> {
        match name {
            "up" => Some(Pull::Up),
            "dn" => Some(Pull::Down),
            "upex" => Some(Pull::ExternalUp),
            "dnex" => Some(Pull::ExternalDown),
            _ => None,
        }
    }

    /// The level a pressed button drives the pin to
    pub fn active_level(self) -> Level {
        match self {
            Pull::Up | Pull::ExternalUp => Level::Low,
            Pull::Down | Pull::ExternalDown => Level::High,
        }
    }

    /// The level the pin rests at
    pub fn idle_level(self) -> Level {
        match self.active_level() {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Which button transition triggers the bound action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEdge {
    Press,
    Release,
}

impl TriggerEdge {
    /// Accepted configuration names
    pub const NAMES: [&'static str; 2] = ["press", "release"];

    /// Parse a configuration name
    pub fn from_name(name: &str) -> Option<TriggerEdge> {
        match name {
            "press" => Some(TriggerEdge::Press),
            "release" => Some(TriggerEdge::Release),
            _ => None,
        }
    }
}

/// A playback action an input can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PlayPause,
    PlayStop,
    NextTrack,
    PrevTrack,
    ToggleMute,
    VolumeDown,
    VolumeUp,
}

impl Action {
    /// Accepted configuration names
    pub const NAMES: [&'static str; 7] = [
        "play_pause",
        "play_stop",
        "next",
        "prev",
        "mute",
        "vol_dn",
        "vol_up",
    ];

    /// Parse a configuration name
    pub fn from_name(name: &str) -> Option<Action> {
        match name {
            "play_pause" => Some(Action::PlayPause),
            "play_stop" => Some(Action::PlayStop),
            "next" => Some(Action::NextTrack),
            "prev" => Some(Action::PrevTrack),
            "mute" => Some(Action::ToggleMute),
            "vol_dn" => Some(Action::VolumeDown),
            "vol_up" => Some(Action::VolumeUp),
            _ => None,
        }
    }

    /// Configuration name of the action
    pub fn name(self) -> &'static str {
        match self {
            Action::PlayPause => "play_pause",
            Action::PlayStop => "play_stop",
            Action::NextTrack => "next",
            Action::PrevTrack => "prev",
            Action::ToggleMute => "mute",
            Action::VolumeDown => "vol_dn",
            Action::VolumeUp => "vol_up",
        }
    }
}

/// A button bound to one pin
#[derive(Debug, Clone)]
pub struct ButtonBinding {
    pub pin: Pin,
    pub pull: Pull,
    pub edge: TriggerEdge,
    pub action: Action,
    /// Debounce window; transitions inside it are dropped
    pub bounce: Duration,
}

/// A rotary encoder bound to a pin pair
#[derive(Debug, Clone)]
pub struct EncoderBinding {
    pub pin_a: Pin,
    pub pin_b: Pin,
    pub pull: Pull,
    /// Action per counter-clockwise detent
    pub ccw: Action,
    /// Action per clockwise detent
    pub cw: Action,
}

/// A pin level transition delivered by an event source
#[derive(Debug, Clone, Copy)]
pub struct PinEvent {
    pub pin: Pin,
    pub level: Level,
    pub at: Instant,
}

/// Source of raw pin events (the hardware driver seam)
pub trait InputSource {
    /// Wait for the next pin event; `None` when the source has closed
    fn next_event(&mut self) -> impl Future<Output = Option<PinEvent>>;
}

/// Channel-backed [`InputSource`] for hardware integrators and tests
pub struct ChannelSource {
    rx: mpsc::Receiver<PinEvent>,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it
    pub fn new(capacity: usize) -> (mpsc::Sender<PinEvent>, ChannelSource) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, ChannelSource { rx })
    }
}

impl InputSource for ChannelSource {
    fn next_event(&mut self) -> impl Future<Output = Option<PinEvent>> {
        self.rx.recv()
    }
}

/// Per-pin time filter that drops transitions inside the bounce window
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Whether a transition at `at` should be acted on
    pub fn accept(&mut self, at: Instant) -> bool {
        if let Some(last) = self.last {
            if at.duration_since(last) < self.window {
                return false;
            }
        }
        self.last = Some(at);
        true
    }
}

/// Direction of a completed encoder detent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotaryDirection {
    Clockwise,
    CounterClockwise,
}

/// Gray-code state machine over the (A, B) channel levels.
///
/// A detent is reported only when the encoder walks a full valid cycle back
/// to its rest state; skipped or bouncing transitions discard the partial
/// cycle instead of guessing a direction.
#[derive(Debug)]
pub struct QuadratureDecoder {
    state: u8,
    rest: u8,
    accum: i8,
}

impl QuadratureDecoder {
    /// Create a decoder for channels resting at `idle`
    pub fn new(idle: Level) -> Self {
        let rest = encode(idle, idle);
        Self {
            state: rest,
            rest,
            accum: 0,
        }
    }

    /// Apply the current channel levels, reporting a completed detent
    pub fn update(&mut self, a: Level, b: Level) -> Option<RotaryDirection> {
        let next = encode(a, b);
        let delta = step(self.state, next);
        self.state = next;

        let Some(delta) = delta else {
            self.accum = 0;
            return None;
        };
        self.accum = self.accum.saturating_add(delta);

        if next != self.rest {
            return None;
        }
        let cycle = self.accum;
        self.accum = 0;
        match cycle {
            4 => Some(RotaryDirection::Clockwise),
            -4 => Some(RotaryDirection::CounterClockwise),
            _ => None,
        }
    }
}

fn encode(a: Level, b: Level) -> u8 {
    let bit = |level| match level {
        Level::High => 1u8,
        Level::Low => 0u8,
    };
    bit(a) << 1 | bit(b)
}

// one gray-code quarter step; None marks a skipped (invalid) transition
fn step(from: u8, to: u8) -> Option<i8> {
    match (from, to) {
        // A leads B: clockwise
        (0b11, 0b01) | (0b01, 0b00) | (0b00, 0b10) | (0b10, 0b11) => Some(1),
        // B leads A: counter-clockwise
        (0b11, 0b10) | (0b10, 0b00) | (0b00, 0b01) | (0b01, 0b11) => Some(-1),
        _ if from == to => Some(0),
        _ => None,
    }
}

struct ButtonState {
    binding: ButtonBinding,
    debounce: Debouncer,
}

struct EncoderState {
    binding: EncoderBinding,
    a: Level,
    b: Level,
    decoder: QuadratureDecoder,
}

/// Resolves raw pin events to bound actions.
///
/// Buttons are debounced per pin and filtered to their configured trigger
/// edge; encoder pins are folded through quadrature decoding. Events on
/// unbound pins resolve to nothing.
pub struct BindingMap {
    buttons: HashMap<Pin, ButtonState>,
    encoders: Vec<EncoderState>,
    encoder_pins: HashMap<Pin, usize>,
}

impl BindingMap {
    /// Build the map from validated bindings
    pub fn new(buttons: Vec<ButtonBinding>, encoders: Vec<EncoderBinding>) -> Self {
        let buttons = buttons
            .into_iter()
            .map(|binding| {
                let state = ButtonState {
                    debounce: Debouncer::new(binding.bounce),
                    binding,
                };
                (state.binding.pin, state)
            })
            .collect();

        let mut encoder_pins = HashMap::new();
        let encoders: Vec<EncoderState> = encoders
            .into_iter()
            .enumerate()
            .map(|(index, binding)| {
                encoder_pins.insert(binding.pin_a, index);
                encoder_pins.insert(binding.pin_b, index);
                let idle = binding.pull.idle_level();
                EncoderState {
                    a: idle,
                    b: idle,
                    decoder: QuadratureDecoder::new(idle),
                    binding,
                }
            })
            .collect();

        Self {
            buttons,
            encoders,
            encoder_pins,
        }
    }

    /// Feed one pin event, returning the action it triggers, if any
    pub fn resolve(&mut self, event: PinEvent) -> Option<Action> {
        if let Some(state) = self.buttons.get_mut(&event.pin) {
            if !state.debounce.accept(event.at) {
                return None;
            }
            let edge = if event.level == state.binding.pull.active_level() {
                TriggerEdge::Press
            } else {
                TriggerEdge::Release
            };
            return (edge == state.binding.edge).then_some(state.binding.action);
        }

        if let Some(&index) = self.encoder_pins.get(&event.pin) {
            let state = &mut self.encoders[index];
            if event.pin == state.binding.pin_a {
                state.a = event.level;
            } else {
                state.b = event.level;
            }
            return state
                .decoder
                .update(state.a, state.b)
                .map(|direction| match direction {
                    RotaryDirection::Clockwise => state.binding.cw,
                    RotaryDirection::CounterClockwise => state.binding.ccw,
                });
        }

        None
    }
}
