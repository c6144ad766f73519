//! Landmark sources: live detector process and recorded replay.

pub mod detector;
pub mod replay;
pub mod wire;

use std::fs::File;
use std::path::PathBuf;

use crate::config::DetectorConfig;
use crate::error::SourceError;
use crate::hand::Hand;

pub use detector::DetectorProcess;
pub use replay::ReplaySource;

/// One captured image's detector output.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Sequence number, starting at 1.
    pub id: u64,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Detected hands in detector order.
    pub hands: Vec<Hand>,
}

impl Frame {
    /// The hand used for classification: the first one reported.
    /// Any further hands are ignored.
    pub fn primary_hand(&self) -> Option<&Hand> {
        self.hands.first()
    }
}

/// Something that yields frames.
pub trait LandmarkSource {
    /// Block until the next frame.  `Ok(None)` is a clean end of stream;
    /// an error means capture failed.
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Short description for log lines.
    fn describe(&self) -> String;
}

/// Source selector.
#[derive(Debug, Clone)]
pub enum SourceKind {
    /// Spawn the configured detector process.
    Detector,
    /// Read a recorded session.
    Replay { path: PathBuf, fps: Option<f32> },
}

/// Open the selected source.  Failure here is fatal: the loop never starts.
///
/// `log` receives the detector's stderr while the terminal overlay owns
/// the screen.
pub fn open(
    kind: &SourceKind,
    config: &DetectorConfig,
    log: Option<&File>,
) -> Result<Box<dyn LandmarkSource>, SourceError> {
    match kind {
        SourceKind::Detector => Ok(Box::new(DetectorProcess::spawn(config, log)?)),
        SourceKind::Replay { path, fps } => Ok(Box::new(ReplaySource::open(
            path,
            *fps,
            config.mirror,
        )?)),
    }
}
