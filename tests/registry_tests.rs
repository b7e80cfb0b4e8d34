//! Trigger registry tests
//!
//! Region crossings, dispatch order, id lifetimes, scrubbing and anchor
//! resolution, exercised on the registry directly.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use reelscroll::trigger::{callback, Dispatch};
use reelscroll::{
    Anchor, Region, RegionSpec, Scrub, StaticLayout, TriggerEventKind, TriggerId, TriggerMode,
    TriggerRegistry,
};
use test_case::test_case;

fn noop() -> reelscroll::trigger::TriggerCallback {
    callback(|_, _| {})
}

fn kinds(dispatches: &[Dispatch]) -> Vec<TriggerEventKind> {
    dispatches.iter().map(|d| d.event.kind).collect()
}

fn ids(dispatches: &[Dispatch]) -> Vec<TriggerId> {
    dispatches.iter().map(|d| d.event.id).collect()
}

// ============================================================================
// Crossings
// ============================================================================

#[test]
fn test_enter_and_leave_forward() {
    let mut registry = TriggerRegistry::new();
    registry.register(Region::fixed(100.0, 200.0), TriggerMode::Toggle, noop());

    assert!(registry.evaluate(0.0, 0.0).is_empty(), "before the region");
    assert_eq!(kinds(&registry.evaluate(150.0, 16.0)), [TriggerEventKind::Enter]);
    assert!(registry.evaluate(160.0, 32.0).is_empty(), "no repeat while inside");
    assert_eq!(kinds(&registry.evaluate(250.0, 48.0)), [TriggerEventKind::Leave]);
}

#[test]
fn test_enter_back_and_leave_back() {
    let mut registry = TriggerRegistry::new();
    registry.register(Region::fixed(100.0, 200.0), TriggerMode::Toggle, noop());
    registry.evaluate(300.0, 0.0);

    assert_eq!(kinds(&registry.evaluate(150.0, 16.0)), [TriggerEventKind::EnterBack]);
    assert_eq!(kinds(&registry.evaluate(50.0, 32.0)), [TriggerEventKind::LeaveBack]);
}

#[test]
fn test_skipping_over_region_fires_both_edges() {
    let mut registry = TriggerRegistry::new();
    registry.register(Region::fixed(100.0, 200.0), TriggerMode::Toggle, noop());
    registry.evaluate(0.0, 0.0);

    assert_eq!(
        kinds(&registry.evaluate(1000.0, 16.0)),
        [TriggerEventKind::Enter, TriggerEventKind::Leave]
    );
    assert_eq!(
        kinds(&registry.evaluate(0.0, 32.0)),
        [TriggerEventKind::EnterBack, TriggerEventKind::LeaveBack]
    );
}

#[test]
fn test_region_ends_are_inclusive() {
    let mut registry = TriggerRegistry::new();
    let id = registry.register(Region::fixed(100.0, 200.0), TriggerMode::Toggle, noop());
    registry.evaluate(100.0, 0.0);
    assert!(registry.is_active(id));
    registry.evaluate(200.0, 16.0);
    assert!(registry.is_active(id));
    registry.evaluate(200.5, 32.0);
    assert!(!registry.is_active(id));
}

#[test]
fn test_content_already_passed_plays_entrance() {
    let mut registry = TriggerRegistry::new();
    registry.register(Region::fixed(100.0, 200.0), TriggerMode::OnEnter, noop());
    assert_eq!(kinds(&registry.evaluate(5000.0, 0.0)), [TriggerEventKind::Enter]);
}

#[test_case(TriggerMode::OnEnter, &[TriggerEventKind::Enter, TriggerEventKind::Enter] ; "on_enter")]
#[test_case(TriggerMode::OnLeave, &[TriggerEventKind::Leave] ; "on_leave")]
#[test_case(TriggerMode::OnEnterBack, &[TriggerEventKind::EnterBack] ; "on_enter_back")]
#[test_case(TriggerMode::OnLeaveBack, &[TriggerEventKind::LeaveBack] ; "on_leave_back")]
#[test_case(TriggerMode::Once, &[TriggerEventKind::Enter] ; "once")]
#[test_case(TriggerMode::Scrub(Scrub::Linked), &[] ; "scrub ignores crossings")]
fn test_mode_filters_edges(mode: TriggerMode, expected: &[TriggerEventKind]) {
    let mut registry = TriggerRegistry::new();
    registry.register(Region::fixed(100.0, 200.0), mode, noop());

    let mut seen = Vec::new();
    let mut now = 0.0;
    // Down through, back up through, down again.
    for offset in [0.0, 150.0, 300.0, 150.0, 0.0, 150.0] {
        seen.extend(
            registry
                .evaluate(offset, now)
                .into_iter()
                .map(|d| d.event.kind)
                .filter(|kind| *kind != TriggerEventKind::Update),
        );
        now += 16.0;
    }
    assert_eq!(seen, expected);
}

// ============================================================================
// Order and Identity
// ============================================================================

#[test]
fn test_dispatch_follows_registration_order() {
    let mut registry = TriggerRegistry::new();
    let registered: Vec<TriggerId> = (0..8u8)
        .map(|i| {
            let start = 100.0 - f64::from(i) * 10.0;
            registry.register(Region::fixed(start, 500.0), TriggerMode::OnEnter, noop())
        })
        .collect();

    registry.evaluate(0.0, 0.0);
    let fired = registry.evaluate(200.0, 16.0);
    assert_eq!(ids(&fired), registered);
}

#[test]
fn test_unregister_is_idempotent() {
    let mut registry = TriggerRegistry::new();
    let a = registry.register(Region::fixed(0.0, 10.0), TriggerMode::OnEnter, noop());
    let b = registry.register(Region::fixed(0.0, 10.0), TriggerMode::OnEnter, noop());

    assert!(registry.unregister(a));
    assert!(!registry.unregister(a), "second unregister is a no-op");
    assert_eq!(registry.len(), 1);
    assert!(registry.contains(b));

    let ids_before: Vec<TriggerId> = registry.ids().collect();
    assert!(!registry.unregister(a));
    assert_eq!(registry.ids().collect::<Vec<_>>(), ids_before);
}

#[test]
fn test_never_issued_id_is_ignored() {
    let mut other = TriggerRegistry::new();
    for _ in 0..5 {
        other.register(Region::fixed(0.0, 1.0), TriggerMode::OnEnter, noop());
    }
    let foreign = other.ids().last().unwrap();

    let mut registry = TriggerRegistry::new();
    let own = registry.register(Region::fixed(0.0, 1.0), TriggerMode::OnEnter, noop());
    assert!(!registry.unregister(foreign));
    assert!(registry.contains(own));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_freed_slot_gets_new_generation() {
    let mut registry = TriggerRegistry::new();
    let first = registry.register(Region::fixed(0.0, 1.0), TriggerMode::OnEnter, noop());
    registry.unregister(first);
    let second = registry.register(Region::fixed(0.0, 1.0), TriggerMode::OnEnter, noop());

    assert_eq!(first.index(), second.index(), "slot is reused");
    assert_ne!(first, second, "but the id is not");
    assert!(!registry.contains(first));
    assert!(!registry.unregister(first), "stale handle cannot remove the new entry");
    assert!(registry.contains(second));
}

#[test]
fn test_once_retires_after_first_enter() {
    let mut registry = TriggerRegistry::new();
    let id = registry.register(Region::fixed(100.0, 200.0), TriggerMode::Once, noop());
    assert_eq!(kinds(&registry.evaluate(1000.0, 0.0)), [TriggerEventKind::Enter]);
    registry.evaluate(0.0, 16.0);
    assert!(registry.evaluate(150.0, 32.0).is_empty());
    assert!(registry.contains(id), "retired, still registered");
    assert!(registry.unregister(id));
}

// ============================================================================
// Scrub
// ============================================================================

#[test]
fn test_linked_scrub_is_monotonic_and_reaches_one() {
    let mut registry = TriggerRegistry::new();
    registry.register(
        Region::fixed(100.0, 1100.0),
        TriggerMode::Scrub(Scrub::Linked),
        noop(),
    );

    let mut progress = Vec::new();
    let mut offset = 100.0;
    let mut now = 0.0;
    while offset <= 1100.0 {
        for dispatch in registry.evaluate(offset, now) {
            if dispatch.event.kind == TriggerEventKind::Update {
                progress.push(dispatch.event.progress);
            }
        }
        offset += 37.0;
        now += 16.0;
    }
    for dispatch in registry.evaluate(1100.0, now) {
        if dispatch.event.kind == TriggerEventKind::Update {
            progress.push(dispatch.event.progress);
        }
    }

    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "non-decreasing: {progress:?}");
    assert_eq!(*progress.first().unwrap(), 0.0);
    assert_eq!(*progress.last().unwrap(), 1.0);
}

#[test]
fn test_scrub_reports_clamped_values_past_edges() {
    let mut registry = TriggerRegistry::new();
    registry.register(
        Region::fixed(100.0, 200.0),
        TriggerMode::Scrub(Scrub::Linked),
        noop(),
    );
    registry.evaluate(150.0, 0.0);
    let past = registry.evaluate(900.0, 16.0);
    let update = past
        .iter()
        .find(|d| d.event.kind == TriggerEventKind::Update)
        .unwrap();
    assert_eq!(update.event.progress, 1.0);
    assert!(registry.evaluate(950.0, 32.0).is_empty(), "no change, no update");
}

#[test]
fn test_smoothed_scrub_lags_then_converges() {
    let mut registry = TriggerRegistry::new();
    registry.register(
        Region::fixed(0.0, 1000.0),
        TriggerMode::Scrub(Scrub::Smoothed { lag_ms: 200.0 }),
        noop(),
    );
    registry.evaluate(0.0, 0.0);

    let first = registry.evaluate(1000.0, 16.0);
    let lagging = first
        .iter()
        .find(|d| d.event.kind == TriggerEventKind::Update)
        .unwrap()
        .event
        .progress;
    assert!(lagging > 0.0 && lagging < 1.0, "smoothed progress lags: {lagging}");

    let mut last = lagging;
    let mut now = 16.0;
    for _ in 0..200 {
        now += 16.0;
        for dispatch in registry.evaluate(1000.0, now) {
            assert!(dispatch.event.progress >= last);
            last = dispatch.event.progress;
        }
    }
    assert_eq!(last, 1.0, "snaps to the linked value");
}

#[test]
fn test_zero_height_region_never_scrubs() {
    let mut registry = TriggerRegistry::new();
    registry.register(
        Region::fixed(500.0, 400.0),
        TriggerMode::Scrub(Scrub::Linked),
        noop(),
    );
    let mut registry_enter = TriggerRegistry::new();
    registry_enter.register(Region::fixed(500.0, 400.0), TriggerMode::Toggle, noop());

    let mut now = 0.0;
    for offset in [0.0, 500.0, 900.0] {
        assert!(registry.evaluate(offset, now).is_empty());
        registry_enter.evaluate(offset, now);
        now += 16.0;
    }
    assert_eq!(
        kinds(&registry_enter.evaluate(0.0, 64.0)),
        [TriggerEventKind::EnterBack, TriggerEventKind::LeaveBack]
    );
}

// ============================================================================
// Node-relative Regions
// ============================================================================

#[test]
fn test_spec_region_resolves_against_layout() {
    let mut layout = StaticLayout::new(800.0);
    let node = layout.add("about", "heading", 2000.0, 100.0);
    let mut registry = TriggerRegistry::new();
    let id = registry.register(
        RegionSpec::new(node, "top 80%".parse().unwrap(), Anchor::BOTTOM_TOP),
        TriggerMode::OnEnter,
        noop(),
    );
    assert_eq!(registry.region(id), None, "dormant until resolved");

    registry.refresh(&layout);
    let region = registry.region(id).unwrap();
    assert_eq!(region.start, 2000.0 - 640.0);
    assert_eq!(region.end, 2100.0);
}

#[test]
fn test_missing_node_goes_dormant() {
    let mut layout = StaticLayout::new(800.0);
    let node = layout.add("about", "heading", 2000.0, 100.0);
    let mut registry = TriggerRegistry::new();
    let id = registry.register(
        RegionSpec::from_start(node, Anchor::TOP_BOTTOM),
        TriggerMode::Toggle,
        noop(),
    );
    registry.refresh(&layout);
    layout.detach(node);
    registry.refresh(&layout);

    assert_eq!(registry.region(id), None);
    assert!(registry.evaluate(1500.0, 0.0).is_empty(), "dormant never fires");
}

#[test_case("top 80%", 1000.0, 500.0, 800.0 => 360.0 ; "percent viewport")]
#[test_case("top bottom", 1000.0, 500.0, 800.0 => 200.0 ; "top bottom")]
#[test_case("bottom top", 1000.0, 500.0, 800.0 => 1500.0 ; "bottom top")]
#[test_case("center center", 1000.0, 500.0, 800.0 => 850.0 ; "center center")]
#[test_case("top top+=50", 1000.0, 500.0, 800.0 => 950.0 ; "adjusted viewport")]
#[test_case("top 100px", 1000.0, 500.0, 800.0 => 900.0 ; "pixel viewport")]
#[test_case("1234", 1000.0, 500.0, 800.0 => 1234.0 ; "absolute")]
fn test_anchor_resolution(anchor: &str, top: f64, height: f64, viewport: f64) -> f64 {
    let anchor: Anchor = anchor.parse().unwrap();
    anchor.resolve(reelscroll::Bounds::new(top, height), viewport)
}

#[test_case("" ; "empty")]
#[test_case("top" ; "element edge only")]
#[test_case("middle bottom" ; "unknown edge")]
#[test_case("top bottom extra" ; "too many tokens")]
fn test_invalid_anchor(anchor: &str) {
    assert!(anchor.parse::<Anchor>().is_err());
}
