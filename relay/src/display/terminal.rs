//! Terminal overlay on the alternate screen.  Built on crossterm.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor::{Hide, MoveTo, MoveToNextLine, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{
        disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use tracing::warn;

use super::{plot_hand, FrameView, Overlay};

const TITLE: &str = "Hand Gesture Recognition (Esc to exit)";

/// Full-screen landmark view.  Restores the terminal on drop.
pub struct TerminalOverlay {
    stdout: Stdout,
    cols: u16,
    rows: u16,
}

impl TerminalOverlay {
    pub fn new(cols: u16, rows: u16) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        Ok(Self { stdout, cols, rows })
    }

    fn line(&mut self, text: &str) -> io::Result<()> {
        queue!(self.stdout, Print(text), MoveToNextLine(1))
    }
}

impl Overlay for TerminalOverlay {
    fn render(&mut self, view: &FrameView<'_>) -> io::Result<()> {
        queue!(self.stdout, MoveTo(0, 0), Clear(ClearType::All))?;
        self.line(TITLE)?;

        let border = format!("+{}+", "-".repeat(self.cols as usize));
        self.line(&border)?;
        match view.frame.primary_hand() {
            Some(hand) => {
                for row in plot_hand(hand, self.cols, self.rows) {
                    self.line(&format!("|{}|", row))?;
                }
            }
            None => {
                let blank = " ".repeat(self.cols as usize);
                for _ in 0..self.rows {
                    self.line(&format!("|{}|", blank))?;
                }
            }
        }
        self.line(&border)?;

        self.line(&view.gesture_label())?;
        let hand = match (view.frame.primary_hand(), view.fingers) {
            (Some(hand), Some(fingers)) => format!(
                "fingers {}  score {:.2}  {}",
                fingers,
                hand.score,
                hand.handedness.as_deref().unwrap_or("?")
            ),
            _ => "no hand".to_string(),
        };
        self.line(&format!(
            "frame {}  {}x{}  hands {}  {}",
            view.frame.id,
            view.frame.width,
            view.frame.height,
            view.frame.hands.len(),
            hand
        ))?;
        let active = match view.state.active_command() {
            Some(c) => c.to_string(),
            None => "idle".to_string(),
        };
        self.line(&format!("active {}", active))?;
        self.line(&format!("link {}", view.link.unwrap_or("detect-only")))?;
        if let Some(event) = view.last_event {
            self.line(event)?;
        }
        self.stdout.flush()
    }

    fn poll_exit(&mut self, timeout: Duration) -> io::Result<bool> {
        while event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if is_exit_key(&key) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

/// Esc, or Ctrl-C since raw mode swallows SIGINT.
fn is_exit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

impl Drop for TerminalOverlay {
    fn drop(&mut self) {
        if let Err(e) = execute!(self.stdout, LeaveAlternateScreen, Show) {
            warn!("failed to leave alternate screen: {}", e);
        }
        if let Err(e) = disable_raw_mode() {
            warn!("failed to restore terminal mode: {}", e);
        }
    }
}
