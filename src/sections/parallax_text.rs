//! A block of text that fades in and drifts against the scroll.

use crate::binder::{Section, SectionScope};
use crate::easing::Ease;
use crate::effects::Property;
use crate::trigger::{callback, Anchor, RegionSpec, Scrub, TriggerEventKind, TriggerMode};
use crate::tween::Tween;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParallaxDirection {
    #[default]
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct ParallaxText {
    name: String,
    speed: f64,
    direction: ParallaxDirection,
    delay_ms: f64,
}

impl ParallaxText {
    pub fn new(name: &str, speed: f64, direction: ParallaxDirection) -> Self {
        Self {
            name: name.to_string(),
            speed,
            direction,
            delay_ms: 0.0,
        }
    }

    #[must_use]
    pub fn delay_ms(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Total drift over the region, in pixels.
    pub fn travel(&self) -> f64 {
        match self.direction {
            ParallaxDirection::Up => -100.0 * self.speed,
            ParallaxDirection::Down => 100.0 * self.speed,
        }
    }
}

impl Section for ParallaxText {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&mut self, scope: &mut SectionScope<'_>) {
        let Some(text) = scope.node("text") else {
            return;
        };

        // The scrub owns TranslateY, so the reveal only fades and scales.
        for (property, from) in [(Property::Opacity, 0.0), (Property::Scale, 0.9)] {
            scope.animate(
                Tween::from_to(text, property, from, 1.0)
                    .duration_ms(1200.0)
                    .delay_ms(self.delay_ms)
                    .ease(Ease::PowerOut(3)),
            );
        }

        let travel = self.travel();
        scope.trigger(
            RegionSpec::new(text, Anchor::TOP_BOTTOM, Anchor::BOTTOM_TOP),
            TriggerMode::Scrub(Scrub::Linked),
            callback(move |event, ctx| {
                if event.kind == TriggerEventKind::Update {
                    ctx.set(text, Property::TranslateY, travel * event.progress);
                }
            }),
        );
    }
}
