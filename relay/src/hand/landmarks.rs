//! Hand landmark model as reported by the external detector.
//!
//! Models the 21 MediaPipe hand landmarks in image space.  Coordinates are
//! normalized to [0,1] with y growing downward.  The detector also sends a
//! relative depth per point; it is accepted on the wire and dropped.

use serde::Deserialize;

// ── Landmark definitions ───────────────────────────────────

/// The 21 hand landmarks, in detector index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Fingertip landmarks, thumb first.
    pub fn fingertips() -> [HandLandmark; 5] {
        [
            Self::ThumbTip,
            Self::IndexTip,
            Self::MiddleTip,
            Self::RingTip,
            Self::PinkyTip,
        ]
    }
}

/// Skeleton edges used by the overlay.
pub const HAND_CONNECTIONS: [(HandLandmark, HandLandmark); 21] = {
    use HandLandmark::*;
    [
        (Wrist, ThumbCmc),
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        (Wrist, IndexMcp),
        (IndexMcp, IndexPip),
        (IndexPip, IndexDip),
        (IndexDip, IndexTip),
        (IndexMcp, MiddleMcp),
        (MiddleMcp, MiddlePip),
        (MiddlePip, MiddleDip),
        (MiddleDip, MiddleTip),
        (MiddleMcp, RingMcp),
        (RingMcp, RingPip),
        (RingPip, RingDip),
        (RingDip, RingTip),
        (RingMcp, PinkyMcp),
        (Wrist, PinkyMcp),
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

// ── Landmark point ─────────────────────────────────────────

/// A single landmark position, normalized to the image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(from = "[f32; 3]")]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
}

impl From<[f32; 3]> for LandmarkPoint {
    fn from(v: [f32; 3]) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

impl LandmarkPoint {
    #[cfg(test)]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Pixel coordinates for an image of `width` x `height`.
    ///
    /// Rounds half away from zero, which is monotonic over [0,1].
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        (
            (self.x * width as f32).round() as i32,
            (self.y * height as f32).round() as i32,
        )
    }
}

// ── Hand ───────────────────────────────────────────────────

/// One detected hand: exactly 21 landmarks in detector order.
#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    pub points: [LandmarkPoint; LANDMARK_COUNT],
    /// Detector confidence (0.0-1.0).
    pub score: f32,
    /// Detector-reported handedness ("Left"/"Right"), if any.
    pub handedness: Option<String>,
}

impl Hand {
    /// Build a hand from a landmark list.  Returns None unless there are
    /// exactly 21 points.
    pub fn from_points(points: Vec<LandmarkPoint>) -> Option<Self> {
        let points: [LandmarkPoint; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(Self {
            points,
            score: 1.0,
            handedness: None,
        })
    }

    pub fn point(&self, landmark: HandLandmark) -> &LandmarkPoint {
        &self.points[landmark.index()]
    }

    /// Flip the hand horizontally, as if the camera image were mirrored.
    pub fn mirror(&mut self) {
        for p in self.points.iter_mut() {
            p.x = 1.0 - p.x;
        }
    }

    /// True when the detector labelled this hand as a left hand.
    pub fn is_left(&self) -> bool {
        self.handedness
            .as_deref()
            .is_some_and(|h| h.eq_ignore_ascii_case("left"))
    }

    #[cfg(test)]
    pub fn point_mut(&mut self, landmark: HandLandmark) -> &mut LandmarkPoint {
        &mut self.points[landmark.index()]
    }
}
