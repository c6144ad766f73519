//! Loop timing instrumentation.
//!
//! Keeps a rolling window of per-frame processing times (acquire, classify,
//! render) for the periodic status line and the shutdown summary.

use std::time::Duration;

/// Rolling loop statistics over a window of samples.
#[derive(Debug)]
pub struct LoopStats {
    /// Per-frame processing time in milliseconds.
    pub frame_times: Vec<f64>,
    /// Maximum number of samples to keep.
    pub window_size: usize,
    /// Total frames processed.
    pub total_frames: u64,
    /// Frames in which the detector reported at least one hand.
    pub frames_with_hand: u64,
    /// Frames whose hand pose matched no command.
    pub unmatched_frames: u64,
}

impl Default for LoopStats {
    fn default() -> Self {
        Self::new(300)
    }
}

impl LoopStats {
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            frame_times: Vec::with_capacity(window_size),
            window_size,
            total_frames: 0,
            frames_with_hand: 0,
            unmatched_frames: 0,
        }
    }

    /// Record one loop iteration.
    pub fn record_frame(&mut self, elapsed: Duration, had_hand: bool, matched: bool) {
        self.frame_times.push(elapsed.as_secs_f64() * 1000.0);
        if self.frame_times.len() > self.window_size {
            self.frame_times.remove(0);
        }

        self.total_frames += 1;
        if had_hand {
            self.frames_with_hand += 1;
            if !matched {
                self.unmatched_frames += 1;
            }
        }
    }

    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }
        let idx = ((sorted.len() as f64 - 1.0) * p / 100.0).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    /// Percentiles over the current window.
    pub fn snapshot(&self) -> LoopSnapshot {
        let mut times = self.frame_times.clone();
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let p50 = Self::percentile(&times, 50.0);
        LoopSnapshot {
            frame_p50: p50,
            frame_p99: Self::percentile(&times, 99.0),
            fps: if p50 > 0.0 { 1000.0 / p50 } else { 0.0 },
            total_frames: self.total_frames,
            frames_with_hand: self.frames_with_hand,
            unmatched_frames: self.unmatched_frames,
        }
    }
}

/// Computed loop statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSnapshot {
    pub frame_p50: f64,
    pub frame_p99: f64,
    pub fps: f64,
    pub total_frames: u64,
    pub frames_with_hand: u64,
    pub unmatched_frames: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_empty_stats() {
        let stats = LoopStats::new(10).snapshot();
        assert_eq!(stats.total_frames, 0);
        assert_eq!(stats.frame_p50, 0.0);
        assert_eq!(stats.fps, 0.0);
    }

    #[test]
    fn test_percentiles_and_fps() {
        let mut stats = LoopStats::new(100);
        for v in [10, 20, 20, 20, 40] {
            stats.record_frame(ms(v), true, true);
        }
        let s = stats.snapshot();
        assert!((s.frame_p50 - 20.0).abs() < 0.01);
        assert!((s.frame_p99 - 40.0).abs() < 0.01);
        assert!((s.fps - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_hand_counters() {
        let mut stats = LoopStats::new(10);
        stats.record_frame(ms(1), false, false);
        stats.record_frame(ms(1), true, true);
        stats.record_frame(ms(1), true, false);
        let s = stats.snapshot();
        assert_eq!(s.total_frames, 3);
        assert_eq!(s.frames_with_hand, 2);
        assert_eq!(s.unmatched_frames, 1);
    }

    #[test]
    fn test_window_size_trim() {
        let mut stats = LoopStats::new(5);
        for i in 0..10 {
            stats.record_frame(ms(i), false, false);
        }
        assert_eq!(stats.frame_times.len(), 5);
        assert_eq!(stats.total_frames, 10);
        assert!((stats.frame_times[0] - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_zero_window_keeps_one_sample() {
        let mut stats = LoopStats::new(0);
        stats.record_frame(ms(3), false, false);
        stats.record_frame(ms(4), false, false);
        assert_eq!(stats.frame_times.len(), 1);
    }
}
