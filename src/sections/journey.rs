//! Journey timeline: background parallax, staggered frames, and an active
//! milestone that tints the background.

use std::cell::Cell;
use std::rc::Rc;

use crate::binder::{Section, SectionScope};
use crate::easing::Ease;
use crate::effects::Property;
use crate::nav::SECTION_ROOT;
use crate::trigger::{callback, Anchor, Edge, RegionSpec, Scrub, TriggerEventKind, TriggerMode};
use crate::tween::Tween;

use super::{Entrance, TOP_85};

/// Background tint per milestone, in degrees.
pub const MILESTONE_HUES: [f64; 5] = [25.0, 200.0, 280.0, 140.0, 45.0];

const FRAME_STAGGER_MS: f64 = 200.0;
/// `"top 60%"`
const MARKER_START: Anchor = Anchor::relative(Edge::Top, Edge::Percent(60.0));
/// `"bottom 40%"`
const MARKER_END: Anchor = Anchor::relative(Edge::Bottom, Edge::Percent(40.0));

fn milestone_hue(index: usize) -> f64 {
    MILESTONE_HUES
        .get(index % MILESTONE_HUES.len())
        .copied()
        .unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct JourneySection {
    active: Rc<Cell<usize>>,
}

impl JourneySection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the active milestone index.
    pub fn active_frame(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.active)
    }
}

impl Section for JourneySection {
    fn name(&self) -> &str {
        "journey"
    }

    fn bind(&mut self, scope: &mut SectionScope<'_>) {
        let Some(root) = scope.node(SECTION_ROOT) else {
            return;
        };
        let background = scope.node("background");

        if let Some(background) = background {
            scope.trigger(
                RegionSpec::new(root, Anchor::TOP_BOTTOM, Anchor::BOTTOM_TOP),
                TriggerMode::Scrub(Scrub::Smoothed { lag_ms: 1000.0 }),
                callback(move |event, ctx| {
                    if event.kind == TriggerEventKind::Update {
                        ctx.set(background, Property::TranslateYPercent, -20.0 * event.progress);
                    }
                }),
            );
            scope.set(background, Property::Hue, milestone_hue(self.active.get()));
        }

        let frame = Entrance {
            y: 50.0,
            scale: 0.8,
            duration_ms: 1000.0,
            ease: Ease::PowerOut(3),
            ..Entrance::default()
        };
        let mut delay = 0.0;
        for node in scope.nodes("frame") {
            frame.delayed(delay).bind(scope, node, TOP_85, true);
            delay += FRAME_STAGGER_MS;
        }

        for (index, marker) in scope.nodes("year").into_iter().enumerate() {
            let active = Rc::clone(&self.active);
            scope.trigger(
                RegionSpec::new(marker, MARKER_START, MARKER_END),
                TriggerMode::Toggle,
                callback(move |event, ctx| {
                    if !matches!(event.kind, TriggerEventKind::Enter | TriggerEventKind::EnterBack) {
                        return;
                    }
                    if active.replace(index) == index {
                        return;
                    }
                    tracing::trace!(index, "journey milestone active");
                    if let Some(background) = background {
                        ctx.animate(
                            Tween::to(background, Property::Hue, milestone_hue(index))
                                .duration_ms(1500.0)
                                .ease(Ease::PowerOut(2)),
                        );
                    }
                }),
            );
        }
    }
}
