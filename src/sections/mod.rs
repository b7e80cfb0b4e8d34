//! The portfolio page's sections.
//!
//! Every section looks its nodes up by key inside its own namespace (the root
//! element is always [`SECTION_ROOT`](crate::nav::SECTION_ROOT)), returns early
//! when a node is not rendered, and registers everything through its
//! [`SectionScope`].

mod about;
mod hero;
mod journey;
mod parallax_text;
mod reveal;
mod scroll_indicator;
mod testimonials;

pub use about::AboutSection;
pub use hero::HeroSection;
pub use journey::{JourneySection, MILESTONE_HUES};
pub use parallax_text::{ParallaxDirection, ParallaxText};
pub use reveal::RevealSection;
pub use scroll_indicator::ScrollIndicator;
pub use testimonials::TestimonialsSection;

use crate::binder::{Section, SectionScope};
use crate::easing::Ease;
use crate::effects::Property;
use crate::geometry::NodeId;
use crate::stage::EffectContext;
use crate::trigger::{callback, Anchor, Edge, RegionSpec, TriggerEventKind, TriggerId, TriggerMode};
use crate::tween::Tween;

/// `"top 80%"`
pub(crate) const TOP_80: Anchor = Anchor::relative(Edge::Top, Edge::Percent(80.0));
/// `"top 85%"`
pub(crate) const TOP_85: Anchor = Anchor::relative(Edge::Top, Edge::Percent(85.0));

/// A fade-and-slide entrance. Hidden values are written at bind time; `play`
/// animates to the resting state and `reverse` back to the hidden one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Entrance {
    pub opacity: f64,
    /// Hidden vertical offset in pixels.
    pub y: f64,
    /// Hidden scale.
    pub scale: f64,
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub ease: Ease,
}

impl Default for Entrance {
    fn default() -> Self {
        Self {
            opacity: 0.0,
            y: 30.0,
            scale: 1.0,
            duration_ms: 800.0,
            delay_ms: 0.0,
            ease: Ease::PowerOut(2),
        }
    }
}

impl Entrance {
    #[must_use]
    pub fn delayed(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    fn animates_y(&self) -> bool {
        self.y.abs() > f64::EPSILON
    }

    fn animates_scale(&self) -> bool {
        (self.scale - 1.0).abs() > f64::EPSILON
    }

    /// Write the hidden state.
    pub fn hide(&self, scope: &mut SectionScope<'_>, node: NodeId) {
        scope.set(node, Property::Opacity, self.opacity);
        if self.animates_y() {
            scope.set(node, Property::TranslateY, self.y);
        }
        if self.animates_scale() {
            scope.set(node, Property::Scale, self.scale);
        }
    }

    fn tweens(&self, node: NodeId, opacity: f64, y: f64, scale: f64) -> Vec<Tween> {
        let mut tweens = vec![Tween::to(node, Property::Opacity, opacity)];
        if self.animates_y() {
            tweens.push(Tween::to(node, Property::TranslateY, y));
        }
        if self.animates_scale() {
            tweens.push(Tween::to(node, Property::Scale, scale));
        }
        tweens
    }

    pub fn play(&self, ctx: &mut EffectContext<'_>, node: NodeId) {
        for tween in self.tweens(node, 1.0, 0.0, 1.0) {
            ctx.animate(
                tween
                    .duration_ms(self.duration_ms)
                    .delay_ms(self.delay_ms)
                    .ease(self.ease),
            );
        }
    }

    /// Play back to the hidden state. Reversal ignores the delay.
    pub fn reverse(&self, ctx: &mut EffectContext<'_>, node: NodeId) {
        for tween in self.tweens(node, self.opacity, self.y, self.scale) {
            ctx.animate(tween.duration_ms(self.duration_ms).ease(self.ease));
        }
    }

    /// Hide `node` now and play the entrance when its top reaches `start`.
    ///
    /// With `reverse_on_leave_back` the entrance plays backwards when the
    /// page scrolls back above the start ("play none none reverse");
    /// otherwise it plays once and the trigger retires.
    pub fn bind(
        self,
        scope: &mut SectionScope<'_>,
        node: NodeId,
        start: Anchor,
        reverse_on_leave_back: bool,
    ) -> Option<TriggerId> {
        self.hide(scope, node);
        let mode = if reverse_on_leave_back {
            TriggerMode::Toggle
        } else {
            TriggerMode::Once
        };
        scope.trigger(
            RegionSpec::from_start(node, start),
            mode,
            callback(move |event, ctx| match event.kind {
                TriggerEventKind::Enter => self.play(ctx, node),
                TriggerEventKind::LeaveBack => self.reverse(ctx, node),
                TriggerEventKind::Leave | TriggerEventKind::EnterBack | TriggerEventKind::Update => {}
            }),
        )
    }
}

/// Every section of the portfolio page, top to bottom.
pub fn portfolio_sections() -> Vec<Box<dyn Section>> {
    vec![
        Box::new(HeroSection::new()),
        Box::new(ScrollIndicator::new()),
        Box::new(AboutSection::new()),
        Box::new(ParallaxText::new("tagline", 0.5, ParallaxDirection::Up)),
        Box::new(RevealSection::showreel()),
        Box::new(RevealSection::projects()),
        Box::new(RevealSection::services()),
        Box::new(RevealSection::tools()),
        Box::new(JourneySection::new()),
        Box::new(RevealSection::contact()),
        Box::new(TestimonialsSection::new()),
    ]
}

/// Build one page section by name.
pub fn by_name(name: &str) -> Option<Box<dyn Section>> {
    portfolio_sections()
        .into_iter()
        .find(|section| section.name() == name)
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
    use crate::nav::NAV_SECTIONS;

    #[test]
    fn test_every_nav_entry_has_a_section() {
        for name in NAV_SECTIONS {
            assert!(by_name(name).is_some(), "no section named {name}");
        }
    }

    #[test]
    fn test_section_names_are_unique() {
        let mut names: Vec<String> = portfolio_sections()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
