//! About: word-by-word reveal and side-panel parallax.

use crate::binder::{Section, SectionScope};
use crate::easing::{Ease, BACK_OVERSHOOT};
use crate::effects::Property;
use crate::trigger::{callback, Anchor, RegionSpec, Scrub, TriggerEventKind, TriggerMode};

use super::{Entrance, TOP_85};

const WORD_STAGGER_MS: f64 = 100.0;

#[derive(Debug, Default)]
pub struct AboutSection;

impl AboutSection {
    pub fn new() -> Self {
        Self
    }
}

impl Section for AboutSection {
    fn name(&self) -> &str {
        "about"
    }

    fn bind(&mut self, scope: &mut SectionScope<'_>) {
        let word = Entrance {
            y: 30.0,
            duration_ms: 800.0,
            ease: Ease::BackOut(BACK_OVERSHOOT),
            ..Entrance::default()
        };
        let mut delay = 0.0;
        for node in scope.nodes("word") {
            word.delayed(delay).bind(scope, node, TOP_85, true);
            delay += WORD_STAGGER_MS;
        }

        let Some(panel) = scope.node("left-panel") else {
            return;
        };
        scope.trigger(
            RegionSpec::new(panel, Anchor::TOP_BOTTOM, Anchor::BOTTOM_TOP),
            TriggerMode::Scrub(Scrub::Linked),
            callback(move |event, ctx| {
                if event.kind == TriggerEventKind::Update {
                    ctx.set(panel, Property::TranslateYPercent, -50.0 * event.progress);
                }
            }),
        );
    }
}
