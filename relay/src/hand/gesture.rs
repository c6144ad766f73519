//! Gesture classification and command debouncing.
//!
//! Maps a finger vector onto one of five motion commands with an
//! exact-match table, then collapses the per-frame command stream into
//! transitions: a command is emitted once when it becomes active and is
//! suppressed while it stays active.  Losing the hand resets to idle.

use std::fmt;

use tracing::debug;

use super::fingers::FingerVector;

// ── Commands ───────────────────────────────────────────────

/// Motion commands understood by the remote device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Forward,
    Left,
    Right,
    Backward,
    Stop,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Forward,
        Command::Left,
        Command::Right,
        Command::Backward,
        Command::Stop,
    ];

    /// Single ASCII byte written to the serial link.
    pub fn wire_byte(&self) -> u8 {
        match self {
            Self::Forward => b'F',
            Self::Left => b'L',
            Self::Right => b'R',
            Self::Backward => b'B',
            Self::Stop => b'S',
        }
    }

    pub fn as_char(&self) -> char {
        self.wire_byte() as char
    }

    /// Human-readable name.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Forward => "Forward",
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Backward => "Backward",
            Self::Stop => "Stop",
        }
    }

    /// Finger pattern (thumb, index, middle, ring, pinky) that selects this command.
    pub fn pattern(&self) -> FingerVector {
        match self {
            Self::Forward => FingerVector::from_bits([0, 1, 0, 0, 0]),
            Self::Left => FingerVector::from_bits([1, 0, 0, 0, 0]),
            Self::Right => FingerVector::from_bits([0, 1, 1, 0, 0]),
            Self::Backward => FingerVector::from_bits([0, 0, 0, 0, 1]),
            Self::Stop => FingerVector::from_bits([0, 0, 0, 0, 0]),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_char(), self.description())
    }
}

/// Classify a finger vector.  Anything outside the five exact patterns is
/// `None`: not an error, just no command this frame.
pub fn classify(fingers: FingerVector) -> Option<Command> {
    Command::ALL.into_iter().find(|c| c.pattern() == fingers)
}

// ── Debouncer ──────────────────────────────────────────────

/// What one frame contributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The detector reported no hand.
    NoHand,
    /// A hand was present; the classified command, if any.
    Hand(Option<Command>),
}

/// Persistent debounce state: the last emitted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebounceState {
    #[default]
    Idle,
    Active(Command),
}

impl DebounceState {
    pub fn active_command(&self) -> Option<Command> {
        match self {
            Self::Idle => None,
            Self::Active(c) => Some(*c),
        }
    }
}

/// State changes reported by the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle -> Active(command).  The command should be sent.
    Engaged(Command),
    /// Active(from) -> Active(to).  `to` should be sent.
    Switched { from: Command, to: Command },
    /// Active(last) -> Idle after the hand disappeared.  Nothing is sent.
    TrackingLost { last: Command },
}

impl Transition {
    /// The command to forward to the transport, if any.
    pub fn command_to_send(&self) -> Option<Command> {
        match self {
            Self::Engaged(c) => Some(*c),
            Self::Switched { to, .. } => Some(*to),
            Self::TrackingLost { .. } => None,
        }
    }
}

/// Collapses a per-frame command stream into transitions.
#[derive(Debug, Default)]
pub struct Debouncer {
    state: DebounceState,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Feed one frame.  State changes at most once per call.
    pub fn observe(&mut self, observation: Observation) -> Option<Transition> {
        match (self.state, observation) {
            (DebounceState::Active(last), Observation::NoHand) => {
                self.state = DebounceState::Idle;
                debug!("Tracking lost while {:?} active", last);
                Some(Transition::TrackingLost { last })
            }
            (DebounceState::Idle, Observation::NoHand) => None,
            // Unsupported pose: ignored, not the same as losing the hand.
            (_, Observation::Hand(None)) => None,
            (DebounceState::Active(current), Observation::Hand(Some(next))) if current == next => {
                None
            }
            (DebounceState::Active(from), Observation::Hand(Some(to))) => {
                self.state = DebounceState::Active(to);
                Some(Transition::Switched { from, to })
            }
            (DebounceState::Idle, Observation::Hand(Some(c))) => {
                self.state = DebounceState::Active(c);
                Some(Transition::Engaged(c))
            }
        }
    }

    /// One-line status for periodic logging.
    pub fn status_line(&self) -> String {
        match self.state {
            DebounceState::Idle => "idle".to_string(),
            DebounceState::Active(c) => format!("active {}", c),
        }
    }
}
