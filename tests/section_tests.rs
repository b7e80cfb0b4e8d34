//! Portfolio section tests
//!
//! Each section mounted on the shared test page: what it writes at bind time,
//! what its triggers play, and what it skips when nodes are missing.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::{jump_to, portfolio_layout, run_frames, stage_with};
use reelscroll::sections::{self, JourneySection, RevealSection, MILESTONE_HUES};
use reelscroll::{Geometry, NodeId, Property, RecordingSink, Stage, StaticLayout};

fn node(layout: &StaticLayout, section: &str, key: &str) -> NodeId {
    layout
        .find(section, key)
        .unwrap_or_else(|| panic!("no node {section}:{key}"))
}

fn value(sink: &RecordingSink, node: NodeId, property: Property) -> f64 {
    sink.value(node, property)
        .unwrap_or_else(|| panic!("{node:?} {property:?} never written"))
}

fn page() -> (Stage, RecordingSink, StaticLayout) {
    let layout = portfolio_layout();
    let (stage, sink) = stage_with(layout.clone());
    (stage, sink, layout)
}

// ============================================================================
// Hero
// ============================================================================

#[test]
fn test_hero_intro_and_parallax() {
    let (stage, sink, layout) = page();
    let background = node(&layout, "hero", "background");
    let overlay = node(&layout, "hero", "overlay");
    let _hero = stage.mount(sections::by_name("hero").unwrap());

    jump_to(&stage, 0.0, 16.0);
    assert_eq!(value(&sink, overlay, Property::Opacity), 0.0, "delayed start renders now");
    assert_eq!(value(&sink, background, Property::Scale), 1.1);

    let now = run_frames(&stage, 16.0, 200);
    assert_eq!(value(&sink, background, Property::Scale), 1.0);
    assert_eq!(value(&sink, background, Property::Opacity), 1.0);
    assert_eq!(value(&sink, overlay, Property::Opacity), 1.0);

    // Halfway through the hero: background drifts up by half of 30%.
    jump_to(&stage, 450.0, now + 16.0);
    let lagging = value(&sink, background, Property::TranslateYPercent);
    assert!(lagging > -15.0 && lagging < 0.0, "smoothed: {lagging}");
    run_frames(&stage, now + 16.0, 800);
    assert_eq!(value(&sink, background, Property::TranslateYPercent), -15.0);
}

// ============================================================================
// About
// ============================================================================

#[test]
fn test_about_words_hidden_then_staggered() {
    let (stage, sink, layout) = page();
    let words: Vec<NodeId> = (0..4)
        .map(|i| node(&layout, "about", &format!("word-{i}")))
        .collect();
    let _about = stage.mount(sections::by_name("about").unwrap());

    for &word in &words {
        assert_eq!(value(&sink, word, Property::Opacity), 0.0);
        assert_eq!(value(&sink, word, Property::TranslateY), 30.0);
    }

    jump_to(&stage, 0.0, 16.0);
    jump_to(&stage, 1000.0, 32.0);
    run_frames(&stage, 32.0, 5);
    // 80ms in: the first word is moving, the last is still waiting.
    assert!(value(&sink, words[0], Property::Opacity) > 0.0);
    assert_eq!(value(&sink, words[3], Property::Opacity), 0.0);

    run_frames(&stage, 112.0, 120);
    for &word in &words {
        assert_eq!(value(&sink, word, Property::Opacity), 1.0);
        assert_eq!(value(&sink, word, Property::TranslateY), 0.0);
    }

    // Scrolling back above the start plays the words backwards.
    jump_to(&stage, 0.0, 3000.0);
    run_frames(&stage, 3000.0, 120);
    for &word in &words {
        assert_eq!(value(&sink, word, Property::Opacity), 0.0);
        assert_eq!(value(&sink, word, Property::TranslateY), 30.0);
    }
}

#[test]
fn test_about_panel_follows_scroll() {
    let (stage, sink, layout) = page();
    let panel = node(&layout, "about", "left-panel");
    let _about = stage.mount(sections::by_name("about").unwrap());

    // Panel region runs from 540 ("top bottom") to 1380 ("bottom top").
    jump_to(&stage, 960.0, 16.0);
    assert_eq!(value(&sink, panel, Property::TranslateYPercent), -25.0);
    jump_to(&stage, 5000.0, 32.0);
    assert_eq!(value(&sink, panel, Property::TranslateYPercent), -50.0);
}

// ============================================================================
// Tagline
// ============================================================================

#[test]
fn test_tagline_drifts_with_scroll() {
    let (stage, sink, layout) = page();
    let text = node(&layout, "tagline", "text");
    let _tagline = stage.mount(sections::by_name("tagline").unwrap());

    jump_to(&stage, 2320.0, 16.0);
    assert_eq!(value(&sink, text, Property::TranslateY), -25.0);
    assert_eq!(value(&sink, text, Property::Opacity), 0.0, "reveal starts from hidden");

    run_frames(&stage, 16.0, 100);
    assert_eq!(value(&sink, text, Property::Opacity), 1.0);
    assert_eq!(value(&sink, text, Property::Scale), 1.0);
    assert_eq!(value(&sink, text, Property::TranslateY), -25.0, "reveal leaves the drift alone");
}

// ============================================================================
// Journey
// ============================================================================

#[test]
fn test_journey_tracks_active_milestone() {
    let (stage, sink, layout) = page();
    let background = node(&layout, "journey", "background");
    let section = JourneySection::new();
    let active = section.active_frame();
    let _journey = stage.mount(Box::new(section));

    assert_eq!(value(&sink, background, Property::Hue), MILESTONE_HUES[0]);

    // Year markers: [7000, 7200], [7060, 7260], [7120, 7320].
    jump_to(&stage, 0.0, 16.0);
    jump_to(&stage, 7010.0, 32.0);
    assert_eq!(active.get(), 0);
    jump_to(&stage, 7070.0, 48.0);
    assert_eq!(active.get(), 1);
    jump_to(&stage, 7130.0, 64.0);
    assert_eq!(active.get(), 2);

    run_frames(&stage, 64.0, 120);
    assert_eq!(value(&sink, background, Property::Hue), MILESTONE_HUES[2]);
}

#[test]
fn test_journey_frames_enter_in_order() {
    let (stage, sink, layout) = page();
    let frames = [node(&layout, "journey", "frame-0"), node(&layout, "journey", "frame-1")];
    let _journey = stage.mount(sections::by_name("journey").unwrap());

    for frame in frames {
        assert_eq!(value(&sink, frame, Property::Scale), 0.8);
    }
    jump_to(&stage, 0.0, 16.0);
    jump_to(&stage, 7000.0, 32.0);
    run_frames(&stage, 32.0, 8);
    assert!(value(&sink, frames[0], Property::Opacity) > 0.0);
    assert_eq!(value(&sink, frames[1], Property::Opacity), 0.0, "200ms stagger");

    run_frames(&stage, 160.0, 120);
    for frame in frames {
        assert_eq!(value(&sink, frame, Property::Opacity), 1.0);
        assert_eq!(value(&sink, frame, Property::Scale), 1.0);
    }
}

// ============================================================================
// Reveals
// ============================================================================

#[test]
fn test_reveal_reverses_on_leave_back() {
    let (stage, sink, layout) = page();
    let heading = node(&layout, "showreel", "heading");
    let _showreel = stage.mount(Box::new(RevealSection::showreel()));
    assert_eq!(value(&sink, heading, Property::TranslateY), 100.0);

    jump_to(&stage, 0.0, 16.0);
    jump_to(&stage, 2500.0, 32.0);
    let now = run_frames(&stage, 32.0, 120);
    assert_eq!(value(&sink, heading, Property::Opacity), 1.0);
    assert_eq!(value(&sink, heading, Property::TranslateY), 0.0);

    jump_to(&stage, 0.0, now + 16.0);
    run_frames(&stage, now + 16.0, 120);
    assert_eq!(value(&sink, heading, Property::Opacity), 0.0);
    assert_eq!(value(&sink, heading, Property::TranslateY), 100.0);
}

#[test]
fn test_project_cards_play_once() {
    let (stage, sink, layout) = page();
    let card = node(&layout, "projects", "card-0");
    let _projects = stage.mount(Box::new(RevealSection::projects()));

    // card-0 starts at 4160 - 95% of 800.
    jump_to(&stage, 0.0, 16.0);
    jump_to(&stage, 3500.0, 32.0);
    let now = run_frames(&stage, 32.0, 100);
    assert_eq!(value(&sink, card, Property::Opacity), 1.0);

    jump_to(&stage, 0.0, now + 16.0);
    run_frames(&stage, now + 16.0, 100);
    assert_eq!(value(&sink, card, Property::Opacity), 1.0, "no reverse");
}

// ============================================================================
// Testimonials and Scroll Indicator
// ============================================================================

#[test]
fn test_testimonial_bubble_toggles() {
    let (stage, sink, layout) = page();
    let bubble = node(&layout, "testimonials", "bubble");
    let _testimonials = stage.mount(sections::by_name("testimonials").unwrap());
    assert_eq!(value(&sink, bubble, Property::Opacity), 0.0);
    assert_eq!(value(&sink, bubble, Property::Scale), 0.8);

    jump_to(&stage, 0.0, 16.0);
    jump_to(&stage, 9600.0, 32.0);
    let now = run_frames(&stage, 32.0, 40);
    assert_eq!(value(&sink, bubble, Property::Opacity), 1.0);
    assert_eq!(value(&sink, bubble, Property::Scale), 1.0);

    jump_to(&stage, 9000.0, now + 16.0);
    run_frames(&stage, now + 16.0, 40);
    assert_eq!(value(&sink, bubble, Property::Opacity), 0.0);
}

#[test]
fn test_scroll_indicator_hides_and_returns() {
    let (stage, sink, layout) = page();
    let root = node(&layout, "scroll-indicator", "section");
    let _indicator = stage.mount(sections::by_name("scroll-indicator").unwrap());

    jump_to(&stage, 0.0, 16.0);
    assert_eq!(value(&sink, root, Property::Opacity), 0.0);
    let now = run_frames(&stage, 16.0, 200);
    assert_eq!(value(&sink, root, Property::Opacity), 1.0);

    jump_to(&stage, 500.0, now + 16.0);
    let now = run_frames(&stage, now + 16.0, 30);
    assert_eq!(value(&sink, root, Property::Opacity), 0.0);

    jump_to(&stage, 50.0, now + 16.0);
    run_frames(&stage, now + 16.0, 30);
    assert_eq!(value(&sink, root, Property::Opacity), 1.0);
}

#[test]
fn test_detached_node_gets_no_more_writes() {
    let (stage, sink, layout) = page();
    let chevron = node(&layout, "scroll-indicator", "chevron");
    let _indicator = stage.mount(sections::by_name("scroll-indicator").unwrap());

    let now = run_frames(&stage, 0.0, 5);
    assert_eq!(stage.running_animations(), 5);
    assert!(sink.writes_to(chevron) > 0);

    // The chevron leaves the page while its section stays mounted.
    let mut removed = layout.clone();
    removed.detach(chevron);
    stage.set_geometry(Box::new(removed));
    assert_eq!(stage.running_animations(), 3, "both chevron loops stop");

    let before = sink.writes_to(chevron);
    stage.set(chevron, Property::Opacity, 0.0);
    run_frames(&stage, now, 195);
    assert_eq!(sink.writes_to(chevron), before);
    assert_eq!(stage.running_animations(), 1, "only the mouse float is left");
}

#[test]
fn test_detach_node_stops_its_tweens() {
    let (stage, _, layout) = page();
    let mouse = node(&layout, "scroll-indicator", "mouse");
    let _indicator = stage.mount(sections::by_name("scroll-indicator").unwrap());
    assert_eq!(stage.detach_node(mouse), 1);
    assert_eq!(stage.detach_node(mouse), 0);
}

// ============================================================================
// Whole Page
// ============================================================================

#[test]
fn test_missing_nodes_register_nothing() {
    let (stage, sink) = stage_with(StaticLayout::new(800.0));
    let mounted: Vec<_> = sections::portfolio_sections()
        .into_iter()
        .map(|section| stage.mount(section))
        .collect();

    assert_eq!(mounted.len(), 11);
    assert_eq!(stage.registry_len(), 0);
    assert_eq!(stage.running_animations(), 0);
    run_frames(&stage, 0.0, 10);
    assert!(sink.writes().is_empty());
}

#[test]
fn test_partial_hero_skips_missing_overlay() {
    let layout = StaticLayout::new(800.0)
        .with("hero", "section", 0.0, 900.0)
        .with("hero", "background", 0.0, 900.0);
    let (stage, _) = stage_with(layout);
    let hero = stage.mount(sections::by_name("hero").unwrap());
    assert_eq!(hero.trigger_ids().len(), 1);
    assert_eq!(stage.running_animations(), 2);
}

#[test]
fn test_full_page_mount_and_unmount() {
    let (stage, _, _) = page();
    let mounted: Vec<_> = sections::portfolio_sections()
        .into_iter()
        .map(|section| stage.mount(section))
        .collect();
    assert!(stage.registry_len() > 20);
    assert!(stage.running_animations() > 0);
    assert_eq!(stage.mounted_sections().len(), 11);

    stage.scroll_to_section("contact");
    run_frames(&stage, 0.0, 200);
    assert_eq!(stage.active_section().as_deref(), Some("contact"));

    for section in mounted {
        section.unmount();
    }
    assert_eq!(stage.registry_len(), 0);
    assert_eq!(stage.running_animations(), 0);
}
