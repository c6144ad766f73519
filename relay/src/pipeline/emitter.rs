//! Command emitter: debouncer plus the optional transport.
//!
//! Every transition that carries a command is written to the sink, once.
//! Without a sink (detect-only) transitions still happen and are logged.
//! Write failures never roll back the debouncer.

use tracing::{debug, info, warn};

use crate::hand::{Command, DebounceState, Debouncer, Observation, Transition};
use crate::transport::CommandSink;

/// Counters reported in status lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitterCounters {
    /// Transitions that carried a command.
    pub emitted: u64,
    /// Commands written successfully.
    pub sent: u64,
    /// Commands whose write failed.
    pub write_failures: u64,
    /// Hand frames repeating the active command.
    pub suppressed: u64,
    /// Active -> Idle transitions.
    pub tracking_losses: u64,
}

pub struct Emitter {
    debouncer: Debouncer,
    sink: Option<Box<dyn CommandSink>>,
    link: Option<String>,
    counters: EmitterCounters,
    last_event: Option<String>,
}

impl Emitter {
    /// `None` runs detect-only.
    pub fn new(sink: Option<Box<dyn CommandSink>>) -> Self {
        let link = sink.as_ref().map(|s| s.describe());
        Self {
            debouncer: Debouncer::new(),
            sink,
            link,
            counters: EmitterCounters::default(),
            last_event: None,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.debouncer.state()
    }

    pub fn counters(&self) -> EmitterCounters {
        self.counters
    }

    /// Transport description, or None when detect-only.
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn last_event(&self) -> Option<&str> {
        self.last_event.as_deref()
    }

    pub fn status_line(&self) -> String {
        self.debouncer.status_line()
    }

    /// Feed one frame's observation and act on the resulting transition.
    pub fn observe(&mut self, observation: Observation) -> Option<Transition> {
        let before = self.debouncer.state();
        let transition = self.debouncer.observe(observation);

        match transition {
            Some(Transition::TrackingLost { last }) => {
                self.counters.tracking_losses += 1;
                self.narrate(format!("No hand detected, tracking lost (was {})", last));
            }
            Some(t) => {
                if let Some(command) = t.command_to_send() {
                    self.narrate(format!("Detected: {}", command));
                    self.emit(command);
                }
            }
            None => {
                if let Observation::Hand(Some(c)) = observation {
                    if before.active_command() == Some(c) {
                        self.counters.suppressed += 1;
                    }
                }
            }
        }
        transition
    }

    fn emit(&mut self, command: Command) {
        self.counters.emitted += 1;
        let Some(sink) = self.sink.as_mut() else {
            self.narrate(format!("Detect-only: {} not sent", command.as_char()));
            return;
        };
        match sink.send(command) {
            Ok(()) => {
                self.counters.sent += 1;
                let line = format!("Sent {} to {}", command.as_char(), sink.describe());
                self.narrate(line);
            }
            Err(e) => {
                self.counters.write_failures += 1;
                warn!(
                    "Serial communication error on {}: {}",
                    sink.describe(),
                    e
                );
                self.last_event = Some(format!("Send failed: {}", e));
            }
        }
    }

    fn narrate(&mut self, line: String) {
        info!("{}", line);
        self.last_event = Some(line);
    }

    /// Release the sink.  Later commands are counted as detect-only.
    pub fn close(&mut self) {
        if let Some(sink) = self.sink.take() {
            debug!("releasing command sink {}", sink.describe());
            drop(sink);
        }
        self.link = None;
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FailingSink, RecordingSink, SinkRecord};
    use super::*;

    fn hand(c: Option<Command>) -> Observation {
        Observation::Hand(c)
    }

    fn recording() -> (Emitter, SinkRecord) {
        let (sink, record) = RecordingSink::new();
        (Emitter::new(Some(Box::new(sink))), record)
    }

    #[test]
    fn test_held_pose_sends_once() {
        let (mut emitter, sink) = recording();
        for _ in 0..3 {
            emitter.observe(hand(Some(Command::Forward)));
        }
        assert_eq!(sink.written(), b"F");
        assert_eq!(emitter.state(), DebounceState::Active(Command::Forward));
        assert_eq!(emitter.counters().suppressed, 2);
        assert_eq!(emitter.last_event(), Some("Sent F to recorder"));
    }

    #[test]
    fn test_change_sends_new_command() {
        let (mut emitter, sink) = recording();
        emitter.observe(hand(Some(Command::Forward)));
        emitter.observe(hand(Some(Command::Forward)));
        emitter.observe(hand(Some(Command::Stop)));
        assert_eq!(sink.written(), b"FS");
    }

    #[test]
    fn test_tracking_lost_then_same_pose_resends() {
        let (mut emitter, sink) = recording();
        emitter.observe(hand(Some(Command::Left)));
        emitter.observe(Observation::NoHand);
        emitter.observe(Observation::NoHand);
        assert_eq!(emitter.state(), DebounceState::Idle);
        assert_eq!(emitter.counters().tracking_losses, 1);
        emitter.observe(hand(Some(Command::Left)));
        assert_eq!(sink.written(), b"LL");
    }

    #[test]
    fn test_unmatched_pose_sends_nothing() {
        let (mut emitter, sink) = recording();
        emitter.observe(hand(None));
        emitter.observe(hand(None));
        assert!(sink.written().is_empty());
        assert_eq!(emitter.state(), DebounceState::Idle);
    }

    #[test]
    fn test_detect_only_tracks_state() {
        let mut emitter = Emitter::new(None);
        assert_eq!(emitter.link(), None);
        let t = emitter.observe(hand(Some(Command::Backward)));
        assert_eq!(t, Some(Transition::Engaged(Command::Backward)));
        assert_eq!(emitter.state(), DebounceState::Active(Command::Backward));
        assert_eq!(emitter.counters().emitted, 1);
        assert_eq!(emitter.counters().sent, 0);
        assert_eq!(emitter.last_event(), Some("Detect-only: B not sent"));
    }

    #[test]
    fn test_write_failure_keeps_state() {
        let mut emitter = Emitter::new(Some(Box::new(FailingSink)));
        emitter.observe(hand(Some(Command::Right)));
        assert_eq!(emitter.state(), DebounceState::Active(Command::Right));
        assert_eq!(emitter.counters().write_failures, 1);

        // Holding the pose does not retry the failed write.
        emitter.observe(hand(Some(Command::Right)));
        assert_eq!(emitter.counters().write_failures, 1);
        assert_eq!(emitter.counters().emitted, 1);
    }

    #[test]
    fn test_same_transitions_with_and_without_sink() {
        let script = [
            hand(Some(Command::Forward)),
            hand(Some(Command::Forward)),
            hand(None),
            Observation::NoHand,
            hand(Some(Command::Stop)),
            hand(Some(Command::Left)),
        ];
        let (mut with_sink, _sink) = recording();
        let mut without = Emitter::new(None);
        for obs in script {
            assert_eq!(with_sink.observe(obs), without.observe(obs));
            assert_eq!(with_sink.state(), without.state());
        }
    }

    #[test]
    fn test_close_releases_sink_once() {
        let (mut emitter, sink) = recording();
        emitter.close();
        emitter.close();
        assert_eq!(sink.released(), 1);
        assert_eq!(emitter.link(), None);
    }
}
