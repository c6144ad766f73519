//! Recorded landmark stream, read back from a JSON-lines file.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::info;

use super::wire::FrameReader;
use super::{Frame, LandmarkSource};
use crate::error::SourceError;

/// Replays frames from a file, optionally paced to a frame rate.
pub struct ReplaySource {
    path: PathBuf,
    reader: FrameReader<BufReader<File>>,
    frame_interval: Option<Duration>,
    next_due: Option<Instant>,
}

impl ReplaySource {
    /// `mirror` must match how the session was recorded: raw detector
    /// output is replayed with mirroring on.
    pub fn open(path: &Path, fps: Option<f32>, mirror: bool) -> Result<Self, SourceError> {
        let frame_interval = fps.map(interval_for).transpose()?;
        let file = File::open(path)?;
        info!(
            "Replaying landmarks from {}{}",
            path.display(),
            fps.map(|f| format!(" at {} fps", f)).unwrap_or_default()
        );
        Ok(Self {
            path: path.to_path_buf(),
            reader: FrameReader::new(BufReader::new(file), mirror),
            frame_interval,
            next_due: None,
        })
    }

    fn pace(&mut self) {
        let Some(interval) = self.frame_interval else {
            return;
        };
        let now = Instant::now();
        if let Some(due) = self.next_due {
            if due > now {
                std::thread::sleep(due - now);
            }
        }
        self.next_due = Some(self.next_due.unwrap_or(now).max(now) + interval);
    }
}

/// Time between frames at `fps`.  Rates that are not positive, or so low
/// the interval overflows, are rejected.
fn interval_for(fps: f32) -> Result<Duration, SourceError> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(SourceError::InvalidFps(fps));
    }
    Duration::try_from_secs_f32(1.0 / fps).map_err(|_| SourceError::InvalidFps(fps))
}

impl LandmarkSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        self.pace();
        self.reader.next_frame()
    }

    fn describe(&self) -> String {
        format!("replay {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::fingers::hand_with_pattern;
    use crate::source::wire::frame_line;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ReplaySource::open(&dir.path().join("none.jsonl"), None, true).err().unwrap();
        assert!(matches!(err, SourceError::Read(_)));
    }

    #[test]
    fn test_replay_until_end() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.jsonl");
        let lines = [
            frame_line(640, 480, &[hand_with_pattern([0, 1, 0, 0, 0])]),
            frame_line(640, 480, &[]),
        ];
        std::fs::write(&path, lines.join("\n")).unwrap();

        let mut replay = ReplaySource::open(&path, None, false).unwrap();
        assert_eq!(replay.next_frame().unwrap().unwrap().hands.len(), 1);
        assert!(replay.next_frame().unwrap().unwrap().hands.is_empty());
        assert!(replay.next_frame().unwrap().is_none());
        assert!(replay.describe().contains("session.jsonl"));
    }

    #[test]
    fn test_pacing_spaces_frames() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("paced.jsonl");
        let line = frame_line(10, 10, &[]);
        std::fs::write(&path, format!("{line}\n{line}\n{line}\n")).unwrap();

        let mut replay = ReplaySource::open(&path, Some(50.0), false).unwrap();
        let start = Instant::now();
        for _ in 0..3 {
            replay.next_frame().unwrap().unwrap();
        }
        // Two full intervals of 20ms between three frames.
        assert!(start.elapsed() >= Duration::from_millis(38));
    }

    #[test]
    fn test_unusable_rates_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rate.jsonl");
        std::fs::write(&path, frame_line(10, 10, &[])).unwrap();

        for fps in [1e-20, 0.0, -5.0, f32::NAN, f32::INFINITY] {
            let err = ReplaySource::open(&path, Some(fps), false).err();
            assert!(matches!(err, Some(SourceError::InvalidFps(_))), "{}", fps);
        }
        assert!(ReplaySource::open(&path, Some(0.5), false).is_ok());
    }
}
