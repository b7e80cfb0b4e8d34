//! Runtime configuration.
//!
//! Loaded from JSON (CLI replay scripts, tests) or from a JavaScript object
//! handed to the wasm constructor. Every field has a default, so an empty
//! object is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::easing::Ease;
use crate::error::{ReelError, Result};

/// Smooth-scroll driver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScrollConfig {
    /// Fraction of the remaining distance covered per 60 Hz frame while
    /// following wheel/touch input. Must be in `(0, 1]`.
    pub lerp: f64,
    /// Default duration of a `scroll_to` transition, in milliseconds.
    pub duration_ms: f64,
    /// Default ease of a `scroll_to` transition.
    pub ease: Ease,
    /// Multiplier applied to wheel deltas.
    pub wheel_multiplier: f64,
    /// Multiplier applied to touch deltas.
    pub touch_multiplier: f64,
    /// Ease touch input like wheel input instead of following the finger.
    pub smooth_touch: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            lerp: 0.1,
            duration_ms: 1200.0,
            ease: Ease::ExpoOut,
            wheel_multiplier: 1.0,
            touch_multiplier: 2.0,
            smooth_touch: false,
        }
    }
}

/// Top-level configuration for a [`Stage`](crate::stage::Stage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StageConfig {
    pub scroll: ScrollConfig,
    /// Distance from the viewport top used to decide the active nav section.
    pub nav_probe_px: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            scroll: ScrollConfig::default(),
            nav_probe_px: 100.0,
        }
    }
}

impl StageConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the driver cannot work with.
    pub fn validate(&self) -> Result<()> {
        let scroll = &self.scroll;
        if !(scroll.lerp > 0.0 && scroll.lerp <= 1.0) {
            return Err(ReelError::Config(format!(
                "lerp must be in (0, 1], got {}",
                scroll.lerp
            )));
        }
        if !scroll.duration_ms.is_finite() || scroll.duration_ms < 0.0 {
            return Err(ReelError::Config(format!(
                "durationMs must be a non-negative number, got {}",
                scroll.duration_ms
            )));
        }
        for (name, value) in [
            ("wheelMultiplier", scroll.wheel_multiplier),
            ("touchMultiplier", scroll.touch_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ReelError::Config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if !self.nav_probe_px.is_finite() {
            return Err(ReelError::Config("navProbePx must be finite".to_string()));
        }
        Ok(())
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
    fn test_empty_object_uses_defaults() {
        let config = StageConfig::from_json("{}").unwrap();
        assert_eq!(config, StageConfig::default());
        assert_eq!(config.scroll.ease, Ease::ExpoOut);
    }

    #[test]
    fn test_partial_override() {
        let config =
            StageConfig::from_json(r#"{"scroll": {"lerp": 0.2, "ease": "power2.inOut"}}"#)
                .unwrap();
        assert_eq!(config.scroll.lerp, 0.2);
        assert_eq!(config.scroll.ease, Ease::PowerInOut(2));
        assert_eq!(config.scroll.duration_ms, 1200.0);
    }

    #[test]
    fn test_rejects_bad_lerp() {
        let err = StageConfig::from_json(r#"{"scroll": {"lerp": 0}}"#).unwrap_err();
        assert!(matches!(err, ReelError::Config(_)), "got {err:?}");
    }

    #[test]
    fn test_rejects_unknown_ease() {
        let err = StageConfig::from_json(r#"{"scroll": {"ease": "bounce.out"}}"#).unwrap_err();
        assert!(matches!(err, ReelError::Json(_)), "got {err:?}");
    }
}
