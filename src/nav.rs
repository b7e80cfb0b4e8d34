//! Navigation helpers: which section is under the nav bar, and where each
//! section starts.

use crate::geometry::Geometry;

/// Node key every section uses for its root element.
pub const SECTION_ROOT: &str = "section";

/// Sections listed in the navigation bar, top to bottom.
pub const NAV_SECTIONS: [&str; 8] = [
    "hero",
    "about",
    "showreel",
    "projects",
    "services",
    "tools",
    "journey",
    "contact",
];

/// Document offset of a section's root node.
pub fn section_top(geometry: &dyn Geometry, section: &str) -> Option<f64> {
    geometry
        .find(section, SECTION_ROOT)
        .and_then(|node| geometry.bounds(node))
        .map(|bounds| bounds.top)
}

/// The first section whose root box contains `probe` (a document offset,
/// usually scroll offset plus a fixed distance below the viewport top).
///
/// Both edges count as inside. Sections that are not rendered are skipped.
pub fn active_section<'a>(
    geometry: &dyn Geometry,
    sections: impl IntoIterator<Item = &'a str>,
    probe: f64,
) -> Option<&'a str> {
    sections.into_iter().find(|section| {
        geometry
            .find(section, SECTION_ROOT)
            .and_then(|node| geometry.bounds(node))
            .is_some_and(|bounds| bounds.top <= probe && probe <= bounds.bottom())
    })
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
    use crate::geometry::StaticLayout;

    fn layout() -> StaticLayout {
        StaticLayout::new(800.0)
            .with("hero", SECTION_ROOT, 0.0, 800.0)
            .with("about", SECTION_ROOT, 800.0, 1200.0)
            .with("contact", SECTION_ROOT, 2000.0, 600.0)
    }

    #[test]
    fn test_probe_inside_section() {
        let layout = layout();
        assert_eq!(active_section(&layout, NAV_SECTIONS, 100.0), Some("hero"));
        assert_eq!(active_section(&layout, NAV_SECTIONS, 900.0), Some("about"));
    }

    #[test]
    fn test_shared_edge_goes_to_earlier_section() {
        let layout = layout();
        assert_eq!(active_section(&layout, NAV_SECTIONS, 800.0), Some("hero"));
    }

    #[test]
    fn test_probe_past_everything() {
        let layout = layout();
        assert_eq!(active_section(&layout, NAV_SECTIONS, 5000.0), None);
    }

    #[test]
    fn test_section_top_missing_node() {
        let layout = layout();
        assert_eq!(section_top(&layout, "about"), Some(800.0));
        assert_eq!(section_top(&layout, "tools"), None);
    }
}
