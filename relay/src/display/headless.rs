//! Headless overlay, used when no terminal is attached.
//!
//! Draws nothing and never requests exit; the relay stops on a signal or
//! at the end of the landmark stream.

use std::io;
use std::time::Duration;

use tracing::{debug, trace};

use super::{FrameView, Overlay};

#[derive(Debug, Default)]
pub struct HeadlessOverlay {
    frames: u64,
}

impl HeadlessOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl Overlay for HeadlessOverlay {
    fn render(&mut self, view: &FrameView<'_>) -> io::Result<()> {
        self.frames += 1;
        trace!("frame {}: {}", view.frame.id, view.gesture_label());
        Ok(())
    }

    fn poll_exit(&mut self, _timeout: Duration) -> io::Result<bool> {
        Ok(false)
    }
}

impl Drop for HeadlessOverlay {
    fn drop(&mut self) {
        debug!("headless overlay closed after {} frame(s)", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Frame;

    #[test]
    fn test_counts_frames_and_never_exits() {
        let frame = Frame {
            id: 1,
            width: 640,
            height: 480,
            hands: Vec::new(),
        };
        let view = FrameView {
            frame: &frame,
            fingers: None,
            command: None,
            state: Default::default(),
            link: None,
            last_event: None,
        };
        let mut overlay = HeadlessOverlay::new();
        overlay.render(&view).unwrap();
        overlay.render(&view).unwrap();
        assert_eq!(overlay.frames_rendered(), 2);
        assert!(!overlay.poll_exit(Duration::from_millis(1)).unwrap());
    }
}
