//! Smooth-scroll driver.
//!
//! Turns jumpy wheel/touch input and programmatic scroll-to requests into one
//! eased scroll position, published once per animation frame:
//!
//! - Wheel/touch deltas move a *target*; the visible offset follows it by a
//!   frame-rate corrected lerp.
//! - `scroll_to` requests are queued and start on the next frame, so the call
//!   returns immediately and the move runs across frames.
//! - After [`SmoothScroll::destroy`] no frame produces a state.
//!
//! The driver only computes states; [`Stage`](crate::stage::Stage) publishes
//! them to subscribers.

mod transition;

pub use transition::ScrollTransition;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ScrollConfig;
use crate::easing::Ease;

/// Nominal frame interval the lerp factor is defined against.
const FRAME_MS: f64 = 1000.0 / 60.0;
/// Lerp snaps to the target once this close, in pixels.
const SNAP_PX: f64 = 0.5;
/// Native scroll events this close to the driven offset are echoes of our own
/// writes and are ignored.
const NATIVE_ECHO_PX: f64 = 1.0;

/// Scroll direction since the previous frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScrollDirection {
    Forward,
    Backward,
    #[default]
    Idle,
}

/// Scroll state published once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollState {
    /// Interpolated scroll offset in pixels.
    pub offset: f64,
    /// Pixels per millisecond since the previous frame.
    pub velocity: f64,
    /// Frame timestamp; strictly increasing between published states.
    pub timestamp_ms: f64,
    pub direction: ScrollDirection,
}

/// Where a `scroll_to` request should go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScrollTarget {
    Offset(f64),
    Top,
    Bottom,
    /// A named anchor registered with [`SmoothScroll::set_anchor`].
    Anchor(String),
}

/// Options for a `scroll_to` request.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScrollToOptions {
    /// Overrides the configured duration.
    pub duration_ms: Option<f64>,
    /// Overrides the configured ease.
    pub ease: Option<Ease>,
    /// Added to the resolved target.
    pub offset: f64,
    /// Jump on the next frame instead of easing.
    pub immediate: bool,
    /// Ignore wheel/touch input until the transition finishes.
    pub lock: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingScroll {
    to: f64,
    duration_ms: f64,
    ease: Ease,
    lock: bool,
}

/// The smooth-scroll driver. See the module docs.
pub struct SmoothScroll {
    config: ScrollConfig,
    limit: f64,
    offset: f64,
    target: f64,
    last: Option<ScrollState>,
    pending: Option<PendingScroll>,
    transition: Option<ScrollTransition>,
    locked: bool,
    anchors: HashMap<String, f64>,
    destroyed: bool,
}

impl fmt::Debug for SmoothScroll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmoothScroll")
            .field("offset", &self.offset)
            .field("target", &self.target)
            .field("limit", &self.limit)
            .field("transition", &self.transition)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl SmoothScroll {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            limit: 0.0,
            offset: 0.0,
            target: 0.0,
            last: None,
            pending: None,
            transition: None,
            locked: false,
            anchors: HashMap::new(),
            destroyed: false,
        }
    }

    /// Set the largest valid offset (content height minus viewport height).
    pub fn set_limit(&mut self, limit: f64) {
        self.limit = if limit.is_finite() { limit.max(0.0) } else { 0.0 };
        self.offset = self.clamp(self.offset);
        self.target = self.clamp(self.target);
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    /// Current interpolated offset.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Offset the driver is heading towards.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Last published state.
    pub fn state(&self) -> Option<ScrollState> {
        self.last
    }

    /// Scroll position as a fraction of the scrollable range.
    pub fn progress(&self) -> f64 {
        if self.limit <= 0.0 {
            return 0.0;
        }
        (self.offset / self.limit).clamp(0.0, 1.0)
    }

    /// Whether the driver is still moving towards a target.
    pub fn is_animating(&self) -> bool {
        self.pending.is_some()
            || self.transition.is_some()
            || (self.target - self.offset).abs() > f64::EPSILON
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn clamp(&self, offset: f64) -> f64 {
        if offset.is_finite() {
            offset.clamp(0.0, self.limit)
        } else {
            self.offset
        }
    }

    fn input_blocked(&self) -> bool {
        self.destroyed || self.locked
    }

    /// Drop any queued or running `scroll_to`.
    fn cancel_transition(&mut self) {
        if self.pending.take().is_some() || self.transition.take().is_some() {
            tracing::trace!("scroll transition cancelled by input");
        }
        self.locked = false;
    }

    /// Wheel input (pixels; positive scrolls down).
    pub fn on_wheel(&mut self, delta: f64) {
        if self.input_blocked() || !delta.is_finite() {
            return;
        }
        self.cancel_transition();
        self.target = self.clamp(self.target + delta * self.config.wheel_multiplier);
    }

    /// Touch input (pixels the finger moved up; positive scrolls down).
    pub fn on_touch(&mut self, delta: f64) {
        if self.input_blocked() || !delta.is_finite() {
            return;
        }
        self.cancel_transition();
        self.target = self.clamp(self.target + delta * self.config.touch_multiplier);
        if !self.config.smooth_touch {
            self.offset = self.target;
        }
    }

    /// Adopt a scroll position the platform applied on its own (scrollbar
    /// drag, keyboard, find-in-page). Ignored while the driver is moving.
    pub fn on_native_scroll(&mut self, offset: f64) {
        if self.destroyed || !offset.is_finite() {
            return;
        }
        // While the driver moves the page, scroll events echo its own writes.
        if (offset - self.offset).abs() < NATIVE_ECHO_PX || self.locked || self.is_animating() {
            return;
        }
        self.cancel_transition();
        self.offset = self.clamp(offset);
        self.target = self.offset;
    }

    /// Register a named scroll destination (a section top).
    pub fn set_anchor(&mut self, name: &str, offset: f64) {
        self.anchors.insert(name.to_string(), offset);
    }

    pub fn anchor(&self, name: &str) -> Option<f64> {
        self.anchors.get(name).copied()
    }

    /// Request an eased move. Returns immediately; the move starts on the next
    /// frame and supersedes any earlier request.
    ///
    /// Returns `false` (and changes nothing) for an unknown anchor or after
    /// teardown.
    pub fn scroll_to(&mut self, target: &ScrollTarget, options: ScrollToOptions) -> bool {
        if self.destroyed {
            return false;
        }
        let resolved = match target {
            ScrollTarget::Offset(offset) => *offset,
            ScrollTarget::Top => 0.0,
            ScrollTarget::Bottom => self.limit,
            ScrollTarget::Anchor(name) => match self.anchors.get(name) {
                Some(offset) => *offset,
                None => {
                    tracing::debug!(anchor = %name, "scroll_to: unknown anchor");
                    return false;
                }
            },
        };
        let to = self.clamp(resolved + options.offset);

        self.transition = None;
        if options.immediate {
            self.pending = None;
            self.locked = false;
            self.offset = to;
            self.target = to;
            return true;
        }

        self.pending = Some(PendingScroll {
            to,
            duration_ms: options
                .duration_ms
                .filter(|d| d.is_finite() && *d >= 0.0)
                .unwrap_or(self.config.duration_ms),
            ease: options.ease.unwrap_or(self.config.ease),
            lock: options.lock,
        });
        self.locked = options.lock;
        tracing::debug!(to, "scroll_to queued");
        true
    }

    /// Advance one frame.
    ///
    /// Returns the state to publish, or `None` after teardown or when
    /// `now_ms` is not later than the previous frame.
    pub fn tick(&mut self, now_ms: f64) -> Option<ScrollState> {
        if self.destroyed || !now_ms.is_finite() {
            return None;
        }
        let dt = match self.last {
            Some(last) if now_ms <= last.timestamp_ms => return None,
            Some(last) => now_ms - last.timestamp_ms,
            None => FRAME_MS,
        };
        let previous = self.offset;

        if let Some(pending) = self.pending.take() {
            self.transition = Some(ScrollTransition {
                from: self.offset,
                to: pending.to,
                start_ms: now_ms,
                duration_ms: pending.duration_ms,
                ease: pending.ease,
            });
            self.locked = pending.lock;
        }

        if let Some(transition) = self.transition {
            self.offset = transition.value_at(now_ms);
            self.target = self.offset;
            if transition.is_finished(now_ms) {
                self.transition = None;
                self.locked = false;
            }
        } else {
            let factor = 1.0 - (1.0 - self.config.lerp).powf(dt / FRAME_MS);
            self.offset += (self.target - self.offset) * factor;
            if (self.target - self.offset).abs() < SNAP_PX {
                self.offset = self.target;
            }
        }

        let delta = self.offset - previous;
        let direction = if delta > 0.0 {
            ScrollDirection::Forward
        } else if delta < 0.0 {
            ScrollDirection::Backward
        } else {
            ScrollDirection::Idle
        };
        let state = ScrollState {
            offset: self.offset,
            velocity: delta / dt,
            timestamp_ms: now_ms,
            direction,
        };
        self.last = Some(state);
        Some(state)
    }

    /// Tear down: stop any transition and make every later `tick` return
    /// `None`.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.pending = None;
        self.transition = None;
        self.locked = false;
        self.target = self.offset;
        tracing::debug!("smooth scroll destroyed");
    }
}
