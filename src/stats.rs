//! Per-frame counters.

use serde::Serialize;

/// Running frame statistics for a [`Stage`](crate::stage::Stage).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    /// Frames that produced a scroll state.
    pub frames: u64,
    /// Interval between the last two frames.
    pub last_interval_ms: f64,
    /// Mean interval over all frames after the first.
    pub average_interval_ms: f64,
    /// Trigger callbacks run.
    pub dispatches: u64,
    /// Property writes sent to the sink.
    pub writes: u64,
    #[serde(skip)]
    last_timestamp_ms: Option<f64>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one frame.
    pub fn record_frame(&mut self, now_ms: f64, dispatches: u64, writes: u64) {
        if let Some(last) = self.last_timestamp_ms {
            let interval = (now_ms - last).max(0.0);
            let intervals = self.frames as f64;
            self.average_interval_ms =
                (self.average_interval_ms * (intervals - 1.0).max(0.0) + interval) / intervals.max(1.0);
            self.last_interval_ms = interval;
        }
        self.last_timestamp_ms = Some(now_ms);
        self.frames += 1;
        self.dispatches += dispatches;
        self.writes += writes;
    }

    /// Estimated frames per second from the average interval.
    pub fn fps(&self) -> f64 {
        if self.average_interval_ms > 0.0 {
            1000.0 / self.average_interval_ms
        } else {
            0.0
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn test_average_interval() {
        let mut stats = FrameStats::new();
        stats.record_frame(0.0, 0, 0);
        stats.record_frame(10.0, 1, 2);
        stats.record_frame(30.0, 0, 3);
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.last_interval_ms, 20.0);
        assert_eq!(stats.average_interval_ms, 15.0);
        assert_eq!(stats.dispatches, 1);
        assert_eq!(stats.writes, 5);
    }

    #[test]
    fn test_fps_without_frames_is_zero() {
        assert_eq!(FrameStats::new().fps(), 0.0);
    }
}
