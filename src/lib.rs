//! reelscroll - scroll-driven animation for an animated portfolio page
//!
//! Smooth scrolling, scroll-triggered animation and per-section lifecycle
//! management, compiled to WebAssembly for the browser and runnable natively
//! for tests and frame replays:
//! - Smooth-scroll driver with eased, non-blocking `scroll_to`
//! - Trigger registry with enter/leave/once/toggle and scrubbed regions
//! - Scoped section lifecycles: unmount releases exactly what mount created
//! - Time-based property tweens written through a pluggable effect sink
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { ReelScroll } from 'reelscroll';
//! await init();
//! const reel = new ReelScroll();
//! reel.mountPortfolio();
//! ```
//!
//! # Usage (Rust)
//!
//! ```
//! use reelscroll::{RecordingSink, Stage, StageConfig, StaticLayout};
//!
//! let layout = StaticLayout::new(800.0).with("about", "section", 800.0, 1200.0);
//! let stage = Stage::new(StageConfig::default(), Box::new(layout), Box::new(RecordingSink::new()));
//! let about = stage.mount(reelscroll::sections::by_name("about").unwrap());
//! stage.frame(16.0);
//! about.unmount();
//! ```

// Core
pub mod config;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod stats;

// Scroll and animation coordination
pub mod binder;
pub mod effects;
pub mod nav;
pub mod scroll;
pub mod stage;
pub mod trigger;
pub mod tween;

// Page content and drivers
pub mod replay;
pub mod sections;

#[cfg(target_arch = "wasm32")]
pub mod web;

use wasm_bindgen::prelude::*;

pub use binder::{AnimationGuard, MountedSection, Section, SectionScope, SectionState, TriggerGuard};
pub use config::{ScrollConfig, StageConfig};
pub use easing::Ease;
pub use effects::{EffectSink, Property, PropertyWrite, RecordingSink};
pub use error::{ReelError, Result};
pub use geometry::{Bounds, Geometry, NodeId, StaticLayout};
pub use scroll::{ScrollDirection, ScrollState, ScrollTarget, ScrollToOptions, SmoothScroll};
pub use stage::{DispatchRecord, EffectContext, ScopeId, Stage, SubscriptionId};
pub use trigger::{
    Anchor, Region, RegionSpec, Scrub, TriggerEvent, TriggerEventKind, TriggerId, TriggerMode,
    TriggerRegistry,
};
pub use tween::{AnimationHandle, Animator, Repeat, Tween};

#[cfg(target_arch = "wasm32")]
pub use web::ReelScroll;

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
