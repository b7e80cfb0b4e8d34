//! "Scroll down" hint: delayed reveal, endless float, hidden once the page
//! scrolls.

use crate::binder::{Section, SectionScope};
use crate::easing::Ease;
use crate::effects::Property;
use crate::nav::SECTION_ROOT;
use crate::trigger::{callback, Region, TriggerEventKind, TriggerMode};
use crate::tween::{Repeat, Tween};

/// Scrolling past this offset hides the hint.
const HIDE_AFTER_PX: f64 = 100.0;

#[derive(Debug, Default)]
pub struct ScrollIndicator;

impl ScrollIndicator {
    pub fn new() -> Self {
        Self
    }
}

impl Section for ScrollIndicator {
    fn name(&self) -> &str {
        "scroll-indicator"
    }

    fn bind(&mut self, scope: &mut SectionScope<'_>) {
        let Some(root) = scope.node(SECTION_ROOT) else {
            return;
        };

        scope.animate(
            Tween::from_to(root, Property::Opacity, 0.0, 1.0)
                .duration_ms(1000.0)
                .delay_ms(2000.0)
                .ease(Ease::PowerOut(3)),
        );
        scope.animate(
            Tween::from_to(root, Property::TranslateY, -20.0, 0.0)
                .duration_ms(1000.0)
                .delay_ms(2000.0)
                .ease(Ease::PowerOut(3)),
        );

        if let Some(mouse) = scope.node("mouse") {
            scope.animate(
                Tween::to(mouse, Property::TranslateY, 10.0)
                    .duration_ms(2000.0)
                    .ease(Ease::PowerInOut(2))
                    .repeat(Repeat::Infinite)
                    .yoyo(true),
            );
        }
        if let Some(chevron) = scope.node("chevron") {
            for (property, to) in [(Property::Scale, 1.1), (Property::Opacity, 0.7)] {
                scope.animate(
                    Tween::to(chevron, property, to)
                        .duration_ms(1500.0)
                        .ease(Ease::PowerInOut(2))
                        .repeat(Repeat::Infinite)
                        .yoyo(true),
                );
            }
        }

        scope.trigger_fixed(
            Region::fixed(0.0, HIDE_AFTER_PX),
            TriggerMode::OnLeave,
            callback(move |event, ctx| {
                if event.kind == TriggerEventKind::Leave {
                    ctx.animate(
                        Tween::to(root, Property::Opacity, 0.0)
                            .duration_ms(300.0)
                            .ease(Ease::PowerOut(2)),
                    );
                }
            }),
        );
        scope.trigger_fixed(
            Region::fixed(0.0, HIDE_AFTER_PX),
            TriggerMode::OnEnterBack,
            callback(move |_, ctx| {
                ctx.animate(
                    Tween::to(root, Property::Opacity, 1.0)
                        .duration_ms(300.0)
                        .ease(Ease::PowerOut(2)),
                );
            }),
        );
    }
}
