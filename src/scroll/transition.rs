//! Time-based scroll transitions.

use crate::easing::Ease;

/// An eased move from one offset to another.
///
/// [`value_at`](Self::value_at) is a pure function of the inputs, so a replay
/// that feeds the same frame timestamps reproduces the same positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTransition {
    pub from: f64,
    pub to: f64,
    pub start_ms: f64,
    pub duration_ms: f64,
    pub ease: Ease,
}

impl ScrollTransition {
    /// Linear progress through the transition, clamped to `[0, 1]`.
    pub fn progress_at(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Scroll offset at `now_ms`. Exactly `to` once the duration has elapsed.
    pub fn value_at(&self, now_ms: f64) -> f64 {
        let t = self.progress_at(now_ms);
        if t >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * self.ease.apply(t)
    }

    pub fn is_finished(&self, now_ms: f64) -> bool {
        self.progress_at(now_ms) >= 1.0
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

    fn transition(ease: Ease) -> ScrollTransition {
        ScrollTransition {
            from: 100.0,
            to: 1100.0,
            start_ms: 1000.0,
            duration_ms: 500.0,
            ease,
        }
    }

    #[test]
    fn test_linear_midpoint() {
        let t = transition(Ease::Linear);
        assert_eq!(t.value_at(1250.0), 600.0);
    }

    #[test]
    fn test_clamps_before_and_after() {
        let t = transition(Ease::ExpoOut);
        assert_eq!(t.value_at(0.0), 100.0);
        assert_eq!(t.value_at(1500.0), 1100.0);
        assert_eq!(t.value_at(99_999.0), 1100.0);
        assert!(t.is_finished(1500.0));
        assert!(!t.is_finished(1499.0));
    }

    #[test]
    fn test_zero_duration_jumps() {
        let mut t = transition(Ease::Linear);
        t.duration_ms = 0.0;
        assert_eq!(t.value_at(1000.0), 1100.0);
    }
}
