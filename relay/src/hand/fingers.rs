//! Finger extension extraction.
//!
//! Each finger is tested independently against its own reference joint,
//! in pixel space.  Index through pinky are "extended" when the tip sits
//! above the PIP joint (image y grows downward).  The thumb is "extended"
//! when its tip sits left of the IP joint.
//!
//! The thumb test assumes a horizontally mirrored feed and a right hand.
//! A left hand or an unmirrored feed will misreport the thumb; this is a
//! known accuracy limitation kept for compatibility with existing poses.

use std::fmt;

use super::landmarks::{Hand, HandLandmark};

/// The five fingers, in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// (tip, reference joint) pair used for the extension test.
    pub fn landmarks(&self) -> (HandLandmark, HandLandmark) {
        match self {
            Self::Thumb => (HandLandmark::ThumbTip, HandLandmark::ThumbIp),
            Self::Index => (HandLandmark::IndexTip, HandLandmark::IndexPip),
            Self::Middle => (HandLandmark::MiddleTip, HandLandmark::MiddlePip),
            Self::Ring => (HandLandmark::RingTip, HandLandmark::RingPip),
            Self::Pinky => (HandLandmark::PinkyTip, HandLandmark::PinkyPip),
        }
    }
}

/// Extension state of all five fingers: {thumb, index, middle, ring, pinky}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FingerVector(pub [bool; 5]);

impl FingerVector {
    /// Build from 0/1 flags, e.g. `from_bits([0, 1, 0, 0, 0])`.
    pub fn from_bits(bits: [u8; 5]) -> Self {
        Self(bits.map(|b| b != 0))
    }

    #[cfg(test)]
    pub fn is_extended(&self, finger: Finger) -> bool {
        self.0[finger.index()]
    }
}

impl fmt::Display for FingerVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for extended in self.0 {
            f.write_str(if extended { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Compute the finger vector for `hand` in an image of `width` x `height`.
pub fn extract(hand: &Hand, width: u32, height: u32) -> FingerVector {
    let mut fingers = [false; 5];
    for finger in Finger::ALL {
        let (tip, joint) = finger.landmarks();
        let (tip_x, tip_y) = hand.point(tip).to_pixel(width, height);
        let (joint_x, joint_y) = hand.point(joint).to_pixel(width, height);
        fingers[finger.index()] = match finger {
            Finger::Thumb => tip_x < joint_x,
            _ => tip_y < joint_y,
        };
    }
    FingerVector(fingers)
}

// ── Test helpers ───────────────────────────────────────────

/// Build a hand whose landmarks produce exactly `pattern` under `extract`.
///
/// Every landmark starts at the image centre; each finger's tip is then
/// moved above (or left of, for the thumb) its reference joint when the
/// pattern marks it extended, and below/right otherwise.
#[cfg(test)]
pub(crate) fn hand_with_pattern(pattern: [u8; 5]) -> Hand {
    use super::landmarks::{LandmarkPoint, LANDMARK_COUNT};

    let mut hand = Hand::from_points(vec![LandmarkPoint::new(0.5, 0.5); LANDMARK_COUNT])
        .expect("21 points");
    for finger in Finger::ALL {
        let (tip, _) = finger.landmarks();
        let extended = pattern[finger.index()] != 0;
        let offset = if extended { -0.1 } else { 0.1 };
        let p = hand.point_mut(tip);
        match finger {
            Finger::Thumb => p.x += offset,
            _ => p.y += offset,
        }
    }
    hand
}
