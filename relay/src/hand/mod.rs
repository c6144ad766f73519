//! Hand model, finger extraction, and gesture classification.
//!
//! Provides:
//! - `landmarks`: the 21-point hand model reported by the detector
//! - `fingers`: per-finger extension test producing a `FingerVector`
//! - `gesture`: exact-match command table and the command debouncer

pub mod fingers;
pub mod gesture;
pub mod landmarks;

pub use fingers::{extract, FingerVector};
pub use gesture::{classify, Command, DebounceState, Debouncer, Observation, Transition};
pub use landmarks::{Hand, HandLandmark, LandmarkPoint, HAND_CONNECTIONS, LANDMARK_COUNT};
