//! Client testimonials: a chat bubble shown while the section is in view.

use crate::binder::{Section, SectionScope};
use crate::easing::{Ease, BACK_OVERSHOOT};
use crate::effects::Property;
use crate::nav::SECTION_ROOT;
use crate::trigger::{callback, Anchor, Edge, RegionSpec, TriggerEventKind, TriggerMode};
use crate::tween::Tween;

/// `"bottom 20%"`
const BUBBLE_END: Anchor = Anchor::relative(Edge::Bottom, Edge::Percent(20.0));

#[derive(Debug, Default)]
pub struct TestimonialsSection;

impl TestimonialsSection {
    pub fn new() -> Self {
        Self
    }
}

impl Section for TestimonialsSection {
    fn name(&self) -> &str {
        "testimonials"
    }

    fn bind(&mut self, scope: &mut SectionScope<'_>) {
        let (Some(root), Some(bubble)) = (scope.node(SECTION_ROOT), scope.node("bubble")) else {
            return;
        };
        scope.set(bubble, Property::Opacity, 0.0);
        scope.set(bubble, Property::Scale, 0.8);

        scope.trigger(
            RegionSpec::new(root, super::TOP_80, BUBBLE_END),
            TriggerMode::Toggle,
            callback(move |event, ctx| {
                let (opacity, scale, ease) = match event.kind {
                    TriggerEventKind::Enter | TriggerEventKind::EnterBack => {
                        (1.0, 1.0, Ease::BackOut(BACK_OVERSHOOT))
                    }
                    TriggerEventKind::Leave | TriggerEventKind::LeaveBack => {
                        (0.0, 0.8, Ease::PowerIn(2))
                    }
                    TriggerEventKind::Update => return,
                };
                for (property, to) in [(Property::Opacity, opacity), (Property::Scale, scale)] {
                    ctx.animate(Tween::to(bubble, property, to).duration_ms(400.0).ease(ease));
                }
            }),
        );
    }
}
