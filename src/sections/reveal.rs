//! Heading-and-cards entrance shared by the showreel, projects, services,
//! tools and contact sections.

use crate::binder::{Section, SectionScope};
use crate::easing::Ease;
use crate::trigger::{Anchor, Edge};

use super::{Entrance, TOP_80};

/// `"top 95%"`
const TOP_95: Anchor = Anchor::relative(Edge::Top, Edge::Percent(95.0));

/// A section whose heading and cards slide in when scrolled to.
#[derive(Debug, Clone)]
pub struct RevealSection {
    name: &'static str,
    heading: Entrance,
    card: Entrance,
    start: Anchor,
    card_start: Anchor,
    stagger_ms: f64,
    /// Play backwards when scrolled back above the start.
    reversible: bool,
}

impl RevealSection {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            heading: Entrance {
                y: 50.0,
                duration_ms: 1000.0,
                ease: Ease::PowerOut(3),
                ..Entrance::default()
            },
            card: Entrance {
                y: 50.0,
                scale: 0.9,
                duration_ms: 800.0,
                ease: Ease::PowerOut(2),
                ..Entrance::default()
            },
            start: TOP_80,
            card_start: TOP_80,
            stagger_ms: 100.0,
            reversible: true,
        }
    }

    pub fn showreel() -> Self {
        Self {
            heading: Entrance {
                y: 100.0,
                duration_ms: 1500.0,
                ease: Ease::PowerOut(3),
                ..Entrance::default()
            },
            ..Self::new("showreel")
        }
    }

    /// Project cards play once, each when it nears the viewport bottom.
    pub fn projects() -> Self {
        Self {
            card_start: TOP_95,
            reversible: false,
            ..Self::new("projects")
        }
    }

    pub fn services() -> Self {
        Self {
            stagger_ms: 150.0,
            ..Self::new("services")
        }
    }

    pub fn tools() -> Self {
        Self {
            card: Entrance {
                y: 30.0,
                scale: 0.8,
                duration_ms: 600.0,
                ease: Ease::BackOut(crate::easing::BACK_OVERSHOOT),
                ..Entrance::default()
            },
            stagger_ms: 50.0,
            ..Self::new("tools")
        }
    }

    pub fn contact() -> Self {
        Self {
            stagger_ms: 200.0,
            ..Self::new("contact")
        }
    }
}

impl Section for RevealSection {
    fn name(&self) -> &str {
        self.name
    }

    fn bind(&mut self, scope: &mut SectionScope<'_>) {
        if let Some(heading) = scope.node("heading") {
            self.heading.bind(scope, heading, self.start, self.reversible);
        }

        // Cards with their own start each trigger separately, no stagger.
        let per_card = self.card_start != self.start;
        let mut delay = 0.0;
        for card in scope.nodes("card") {
            let entrance = if per_card { self.card } else { self.card.delayed(delay) };
            entrance.bind(scope, card, self.card_start, self.reversible);
            delay += self.stagger_ms;
        }
    }
}
