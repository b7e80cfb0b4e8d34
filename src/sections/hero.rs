//! Hero: intro fade and background parallax.

use crate::binder::{Section, SectionScope};
use crate::easing::Ease;
use crate::effects::Property;
use crate::nav::SECTION_ROOT;
use crate::trigger::{callback, Anchor, RegionSpec, Scrub, TriggerEventKind, TriggerMode};
use crate::tween::Tween;

/// Background moves up by this share of its height over the section.
const PARALLAX_PERCENT: f64 = -30.0;

#[derive(Debug, Default)]
pub struct HeroSection;

impl HeroSection {
    pub fn new() -> Self {
        Self
    }
}

impl Section for HeroSection {
    fn name(&self) -> &str {
        "hero"
    }

    fn bind(&mut self, scope: &mut SectionScope<'_>) {
        let (Some(root), Some(background)) = (scope.node(SECTION_ROOT), scope.node("background"))
        else {
            return;
        };

        scope.animate(
            Tween::from_to(background, Property::Scale, 1.1, 1.0)
                .duration_ms(2000.0)
                .ease(Ease::PowerOut(3)),
        );
        scope.animate(
            Tween::from_to(background, Property::Opacity, 0.0, 1.0)
                .duration_ms(2000.0)
                .ease(Ease::PowerOut(3)),
        );
        // Overlay starts one second before the background settles.
        if let Some(overlay) = scope.node("overlay") {
            scope.animate(
                Tween::from_to(overlay, Property::Opacity, 0.0, 1.0)
                    .duration_ms(1500.0)
                    .delay_ms(1000.0)
                    .ease(Ease::PowerOut(2)),
            );
        }

        scope.trigger(
            RegionSpec::new(root, Anchor::TOP_TOP, Anchor::BOTTOM_TOP),
            TriggerMode::Scrub(Scrub::Smoothed { lag_ms: 1000.0 }),
            callback(move |event, ctx| {
                if event.kind == TriggerEventKind::Update {
                    ctx.set(background, Property::TranslateYPercent, PARALLAX_PERCENT * event.progress);
                }
            }),
        );
    }
}
