//! JSON-lines frame format shared by the live detector and replay files.
//!
//! One object per line:
//!
//! ```text
//! {"width":640,"height":480,"hands":[{"score":0.93,"handedness":"Right","landmarks":[[x,y,z], ...]}]}
//! ```
//!
//! Coordinates are the detector's raw output on the unflipped camera image.
//! With mirroring on (the default) every x becomes 1 - x, so landmarks
//! match the selfie view the operator sees and the thumb test expects.
//!
//! Hands are listed in detector order.  A hand without exactly 21
//! landmarks is dropped.  A line carrying `"error"` is a failed read, and
//! a frame with a zero dimension is rejected.

use std::io::BufRead;

use serde::Deserialize;
use tracing::debug;

use super::Frame;
use crate::error::SourceError;
use crate::hand::{Hand, LandmarkPoint, LANDMARK_COUNT};

#[derive(Deserialize, Debug)]
struct HandMessage {
    #[serde(default = "full_score")]
    score: f32,
    #[serde(default)]
    handedness: Option<String>,
    landmarks: Vec<LandmarkPoint>,
}

#[derive(Deserialize, Debug)]
struct FrameMessage {
    width: u32,
    height: u32,
    #[serde(default)]
    hands: Vec<HandMessage>,
    #[serde(default)]
    error: Option<String>,
}

fn full_score() -> f32 {
    1.0
}

/// Parse a single frame line, mirroring x when `mirror` is set.
pub fn parse_frame(
    line: &str,
    id: u64,
    line_no: u64,
    mirror: bool,
) -> Result<Frame, SourceError> {
    let msg: FrameMessage = serde_json::from_str(line).map_err(|source| SourceError::Malformed {
        line: line_no,
        source,
    })?;

    if let Some(error) = msg.error {
        return Err(SourceError::Detector(error));
    }
    if msg.width == 0 || msg.height == 0 {
        return Err(SourceError::InvalidFrame {
            line: line_no,
            reason: format!("image size {}x{}", msg.width, msg.height),
        });
    }

    let hands = msg
        .hands
        .into_iter()
        .filter_map(|h| {
            let count = h.landmarks.len();
            match Hand::from_points(h.landmarks) {
                Some(mut hand) => {
                    hand.score = h.score;
                    hand.handedness = h.handedness;
                    if mirror {
                        hand.mirror();
                    }
                    Some(hand)
                }
                None => {
                    debug!(
                        "frame {}: expected {} landmarks, got {}; hand dropped",
                        id, LANDMARK_COUNT, count
                    );
                    None
                }
            }
        })
        .collect();

    Ok(Frame {
        id,
        width: msg.width,
        height: msg.height,
        hands,
    })
}

/// Reads frames line by line from any buffered reader.
pub struct FrameReader<R> {
    reader: R,
    line: String,
    line_no: u64,
    next_id: u64,
    mirror: bool,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R, mirror: bool) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
            next_id: 1,
            mirror,
        }
    }

    /// Read one raw line, trimmed.  None at end of input.
    pub fn read_line(&mut self) -> Result<Option<&str>, SourceError> {
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some(self.line.trim()))
    }

    /// Next frame, skipping blank lines.  None at end of input.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        loop {
            let id = self.next_id;
            let line_no = self.line_no + 1;
            let mirror = self.mirror;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if line.is_empty() {
                continue;
            }
            let frame = parse_frame(line, id, line_no, mirror)?;
            self.next_id += 1;
            return Ok(Some(frame));
        }
    }

    pub fn frames_read(&self) -> u64 {
        self.next_id - 1
    }
}

// ── Test helpers ───────────────────────────────────────────

/// Serialize a frame back to a wire line (used to build fixtures).
/// Points are written as given; read them back with mirroring off.
#[cfg(test)]
pub(crate) fn frame_line(width: u32, height: u32, hands: &[Hand]) -> String {
    let hands: Vec<serde_json::Value> = hands
        .iter()
        .map(|h| {
            let pts: Vec<[f32; 3]> = h.points.iter().map(|p| [p.x, p.y, 0.0]).collect();
            serde_json::json!({ "score": h.score, "landmarks": pts })
        })
        .collect();
    serde_json::json!({ "width": width, "height": height, "hands": hands }).to_string()
}
