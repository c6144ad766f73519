//! Operator display: live landmark overlay and the exit key.
//!
//! Two implementations:
//! - `TerminalOverlay`: crossterm alternate screen, Esc exits
//! - `HeadlessOverlay`: renders nothing; the loop ends on SIGINT/SIGTERM

pub mod headless;
pub mod plot;
pub mod terminal;

use std::io;
use std::time::Duration;

use crate::hand::{Command, DebounceState, FingerVector};
use crate::source::Frame;

pub use headless::HeadlessOverlay;
pub use plot::plot_hand;
pub use terminal::TerminalOverlay;

/// Everything the overlay shows for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub frame: &'a Frame,
    /// Finger vector of the primary hand, if one was detected.
    pub fingers: Option<FingerVector>,
    /// This frame's classification.
    pub command: Option<Command>,
    /// Debouncer state after this frame.
    pub state: DebounceState,
    /// Transport description, or None in detect-only mode.
    pub link: Option<&'a str>,
    /// Most recent narration line.
    pub last_event: Option<&'a str>,
}

impl FrameView<'_> {
    /// On-screen gesture label, e.g. "Gesture: F".
    pub fn gesture_label(&self) -> String {
        match self.command {
            Some(c) => format!("Gesture: {}", c.as_char()),
            None => "Gesture: -".to_string(),
        }
    }
}

/// A surface the operator watches.
pub trait Overlay {
    /// Draw the current frame.
    fn render(&mut self, view: &FrameView<'_>) -> io::Result<()>;

    /// Wait up to `timeout` for the exit control.  True means stop.
    fn poll_exit(&mut self, timeout: Duration) -> io::Result<bool>;
}
