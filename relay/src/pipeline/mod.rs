//! The relay loop: acquire, classify, debounce, emit, render.
//!
//! Single-threaded and sequential.  Each iteration handles one frame; the
//! loop ends on the exit key, SIGINT/SIGTERM, the end of a replay, or a
//! capture failure.  On every path the overlay, sink and source are each
//! released once before `run` returns.

pub mod emitter;
pub mod stats;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::config::Config;
use crate::display::{FrameView, Overlay};
use crate::hand::{self, Command, Observation};
use crate::source::{Frame, LandmarkSource};

pub use emitter::Emitter;
pub use stats::LoopStats;

/// Global flag set by SIGTERM/SIGINT handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Why the loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The operator pressed the exit key.
    ExitKey,
    /// SIGINT or SIGTERM.
    Signal,
    /// A replay ran out of frames.
    EndOfStream,
}

pub struct Relay {
    source: Box<dyn LandmarkSource>,
    overlay: Box<dyn Overlay>,
    emitter: Emitter,
    stats: LoopStats,
    poll_timeout: Duration,
    status_interval: Option<Duration>,
    left_hand_warned: bool,
}

impl Relay {
    pub fn new(
        source: Box<dyn LandmarkSource>,
        overlay: Box<dyn Overlay>,
        emitter: Emitter,
        config: &Config,
    ) -> Self {
        let status_interval = match config.relay.status_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            source,
            overlay,
            emitter,
            stats: LoopStats::new(config.relay.timing_window),
            poll_timeout: Duration::from_millis(config.display.poll_timeout_ms),
            status_interval,
            left_hand_warned: false,
        }
    }

    #[cfg(test)]
    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Process one frame: first hand only, then classify, debounce and draw.
    /// Returns this frame's classification.
    pub fn step(&mut self, frame: &Frame) -> std::io::Result<Option<Command>> {
        let primary = frame.primary_hand();
        if let Some(h) = primary {
            if h.is_left() && !self.left_hand_warned {
                warn!("Detector reports a left hand; the thumb reading assumes a right hand");
                self.left_hand_warned = true;
            }
        }
        let fingers = primary.map(|h| hand::extract(h, frame.width, frame.height));
        let command = fingers.and_then(hand::classify);

        let observation = match fingers {
            Some(_) => Observation::Hand(command),
            None => Observation::NoHand,
        };
        self.emitter.observe(observation);

        let view = FrameView {
            frame,
            fingers,
            command,
            state: self.emitter.state(),
            link: self.emitter.link(),
            last_event: self.emitter.last_event(),
        };
        self.overlay.render(&view)?;
        Ok(command)
    }

    /// Run until stopped, then release everything.
    pub fn run(mut self) -> anyhow::Result<ExitReason> {
        install_signal_handlers();
        info!(
            "Relay running: source {}, link {}",
            self.source.describe(),
            self.emitter.link().unwrap_or("none (detect-only)")
        );

        let outcome = self.run_loop();

        let Relay {
            source,
            overlay,
            mut emitter,
            stats,
            ..
        } = self;
        // Overlay first so the terminal is back before the summary prints.
        drop(overlay);
        emitter.close();
        drop(source);

        let s = stats.snapshot();
        let c = emitter.counters();
        info!(
            "Relay stopped: {} frame(s), {} with a hand, {} command(s) emitted, {} sent, {} write failure(s)",
            s.total_frames, s.frames_with_hand, c.emitted, c.sent, c.write_failures
        );

        match &outcome {
            Ok(reason) => info!("Exit reason: {:?}", reason),
            Err(e) => error!("Relay aborted: {:#}", e),
        }
        outcome
    }

    fn run_loop(&mut self) -> anyhow::Result<ExitReason> {
        let mut last_status_log = Instant::now();

        loop {
            if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
                info!("Shutdown signal received, exiting");
                return Ok(ExitReason::Signal);
            }

            let started = Instant::now();
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("Landmark stream from {} ended", self.source.describe());
                    return Ok(ExitReason::EndOfStream);
                }
                Err(e) => {
                    error!("Failed to capture frame from {}: {}", self.source.describe(), e);
                    return Err(e.into());
                }
            };

            let command = self.step(&frame)?;
            self.stats
                .record_frame(started.elapsed(), frame.primary_hand().is_some(), command.is_some());

            if self.overlay.poll_exit(self.poll_timeout)? {
                info!("Exit key pressed, exiting");
                return Ok(ExitReason::ExitKey);
            }

            if let Some(interval) = self.status_interval {
                if last_status_log.elapsed() >= interval {
                    info!("{}", self.status_line());
                    last_status_log = Instant::now();
                }
            }
        }
    }

    /// One-line loop status for periodic logging.
    pub fn status_line(&self) -> String {
        let s = self.stats.snapshot();
        let c = self.emitter.counters();
        format!(
            "Relay status: {} frame(s), {} unmatched, {:.1} fps (p50 {:.1}ms, p99 {:.1}ms), {} emitted, {} suppressed, {} tracking loss(es), {} write failure(s), {}",
            s.total_frames,
            s.unmatched_frames,
            s.fps,
            s.frame_p50,
            s.frame_p99,
            c.emitted,
            c.suppressed,
            c.tracking_losses,
            c.write_failures,
            self.emitter.status_line()
        )
    }
}
