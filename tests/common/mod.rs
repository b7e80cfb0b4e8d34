//! Common test utilities.
//!
//! Page layout builders, a stage constructor wired to a recording sink, and a
//! recorder for trigger events.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::cell::RefCell;
use std::rc::Rc;

use reelscroll::trigger::{callback, TriggerCallback};
use reelscroll::{
    RecordingSink, ScrollTarget, ScrollToOptions, Stage, StageConfig, StaticLayout, TriggerEvent,
    TriggerEventKind, TriggerId,
};

pub const VIEWPORT: f64 = 800.0;
pub const FRAME_MS: f64 = 16.0;

// ============================================================================
// Layout Builders
// ============================================================================

/// Builds a [`StaticLayout`] section by section, top to bottom.
pub struct PageBuilder {
    layout: StaticLayout,
    cursor: f64,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self {
            layout: StaticLayout::new(VIEWPORT),
            cursor: 0.0,
        }
    }

    /// Add a section `height` tall with the given child keys, each 40px tall
    /// and spaced 60px apart from 100px below the section top.
    pub fn section(mut self, name: &str, height: f64, keys: &[&str]) -> Self {
        let top = self.cursor;
        self.layout.add(name, "section", top, height);
        let mut offset = 100.0;
        for key in keys {
            self.layout.add(name, key, top + offset, 40.0);
            offset += 60.0;
        }
        self.cursor += height;
        self
    }

    pub fn build(self) -> StaticLayout {
        self.layout
    }
}

/// A layout with every node the portfolio sections look up.
pub fn portfolio_layout() -> StaticLayout {
    PageBuilder::new()
        .section("hero", 900.0, &["background", "overlay"])
        .section("scroll-indicator", 100.0, &["mouse", "chevron"])
        .section(
            "about",
            1600.0,
            &["word-0", "word-1", "word-2", "word-3", "left-panel"],
        )
        .section("tagline", 400.0, &["text"])
        .section("showreel", 1000.0, &["heading", "card-0", "card-1"])
        .section("projects", 1400.0, &["heading", "card-0", "card-1", "card-2"])
        .section("services", 1000.0, &["heading", "card-0", "card-1"])
        .section("tools", 800.0, &["heading", "card-0", "card-1", "card-2"])
        .section(
            "journey",
            2000.0,
            &["background", "frame-0", "frame-1", "year-0", "year-1", "year-2"],
        )
        .section("contact", 900.0, &["heading", "card-0"])
        .section("testimonials", 800.0, &["bubble"])
        .build()
}

// ============================================================================
// Stage Helpers
// ============================================================================

pub fn stage_with(layout: StaticLayout) -> (Stage, RecordingSink) {
    let sink = RecordingSink::new();
    let stage = Stage::new(
        StageConfig::default(),
        Box::new(layout),
        Box::new(sink.clone()),
    );
    (stage, sink)
}

/// Run `count` frames after `start_ms`. Returns the last timestamp.
pub fn run_frames(stage: &Stage, start_ms: f64, count: u32) -> f64 {
    let mut now = start_ms;
    for _ in 0..count {
        now += FRAME_MS;
        stage.frame(now);
    }
    now
}

/// Jump straight to `offset` and run one frame at `now_ms`.
pub fn jump_to(stage: &Stage, offset: f64, now_ms: f64) {
    stage.scroll_to(
        &ScrollTarget::Offset(offset),
        ScrollToOptions {
            immediate: true,
            ..ScrollToOptions::default()
        },
    );
    stage.frame(now_ms);
}

// ============================================================================
// Event Recorder
// ============================================================================

/// Collects `(label, event)` pairs from any number of callbacks.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<(String, TriggerEvent)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that records every event under `label`.
    pub fn callback(&self, label: &str) -> TriggerCallback {
        let events = Rc::clone(&self.events);
        let label = label.to_string();
        callback(move |event, _| events.borrow_mut().push((label.clone(), *event)))
    }

    pub fn labels(&self) -> Vec<String> {
        self.events.borrow().iter().map(|(l, _)| l.clone()).collect()
    }

    pub fn kinds(&self) -> Vec<TriggerEventKind> {
        self.events.borrow().iter().map(|(_, e)| e.kind).collect()
    }

    pub fn events_for(&self, id: TriggerId) -> Vec<TriggerEvent> {
        self.events
            .borrow()
            .iter()
            .filter(|(_, e)| e.id == id)
            .map(|(_, e)| *e)
            .collect()
    }

    /// Progress values of every `Update` event, in order.
    pub fn progress(&self) -> Vec<f64> {
        self.events
            .borrow()
            .iter()
            .filter(|(_, e)| e.kind == TriggerEventKind::Update)
            .map(|(_, e)| e.progress)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}
