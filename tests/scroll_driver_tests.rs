//! Smooth-scroll driver tests
//!
//! Input smoothing, non-blocking `scroll_to`, frame timestamps and teardown,
//! on the bare driver and through a stage.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{portfolio_layout, run_frames, stage_with, FRAME_MS};
use reelscroll::{
    sections, Ease, ScrollConfig, ScrollDirection, ScrollTarget, ScrollToOptions, SmoothScroll,
};

fn driver(limit: f64) -> SmoothScroll {
    let mut driver = SmoothScroll::new(ScrollConfig::default());
    driver.set_limit(limit);
    driver
}

/// Tick until the driver settles, returning the offsets it published.
fn settle(driver: &mut SmoothScroll, start_ms: f64) -> Vec<f64> {
    let mut offsets = Vec::new();
    let mut now = start_ms;
    for _ in 0..600 {
        now += FRAME_MS;
        if let Some(state) = driver.tick(now) {
            offsets.push(state.offset);
        }
        if !driver.is_animating() {
            break;
        }
    }
    offsets
}

// ============================================================================
// scroll_to
// ============================================================================

#[test]
fn test_scroll_to_returns_before_moving() {
    let mut driver = driver(5000.0);
    assert!(driver.scroll_to(&ScrollTarget::Offset(2000.0), ScrollToOptions::default()));
    assert_eq!(driver.offset(), 0.0, "nothing moves until a frame runs");
    assert!(driver.is_animating());

    let offsets = settle(&mut driver, 0.0);
    assert!(offsets.len() > 10, "the move spans many frames");
    assert_eq!(*offsets.last().unwrap(), 2000.0, "lands exactly on the target");
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_scroll_to_duration_override() {
    let mut driver = driver(5000.0);
    let options = ScrollToOptions {
        duration_ms: Some(160.0),
        ease: Some(Ease::Linear),
        ..ScrollToOptions::default()
    };
    driver.scroll_to(&ScrollTarget::Offset(1600.0), options);

    driver.tick(16.0);
    assert_eq!(driver.offset(), 0.0, "transition starts on this frame");
    driver.tick(96.0);
    assert!((driver.offset() - 800.0).abs() < 1e-9);
    driver.tick(176.0);
    assert_eq!(driver.offset(), 1600.0);
    assert!(!driver.is_animating());
}

#[test]
fn test_later_scroll_to_supersedes() {
    let mut driver = driver(5000.0);
    driver.scroll_to(&ScrollTarget::Offset(3000.0), ScrollToOptions::default());
    driver.tick(16.0);
    driver.tick(32.0);
    driver.tick(48.0);
    driver.scroll_to(&ScrollTarget::Offset(200.0), ScrollToOptions::default());

    let offsets = settle(&mut driver, 48.0);
    assert_eq!(*offsets.last().unwrap(), 200.0);
}

#[test]
fn test_scroll_to_clamps_to_limit() {
    let mut driver = driver(1000.0);
    driver.scroll_to(&ScrollTarget::Offset(99_999.0), ScrollToOptions::default());
    settle(&mut driver, 0.0);
    assert_eq!(driver.offset(), 1000.0);

    driver.scroll_to(&ScrollTarget::Top, ScrollToOptions::default());
    settle(&mut driver, 10_000.0);
    assert_eq!(driver.offset(), 0.0);

    driver.scroll_to(&ScrollTarget::Bottom, ScrollToOptions::default());
    settle(&mut driver, 20_000.0);
    assert_eq!(driver.offset(), 1000.0);
    assert_eq!(driver.progress(), 1.0);
}

#[test]
fn test_unknown_anchor_changes_nothing() {
    let mut driver = driver(5000.0);
    assert!(!driver.scroll_to(
        &ScrollTarget::Anchor("nowhere".into()),
        ScrollToOptions::default()
    ));
    assert!(!driver.is_animating());
    driver.tick(16.0);
    assert_eq!(driver.offset(), 0.0);
}

#[test]
fn test_anchor_with_offset() {
    let mut driver = driver(5000.0);
    driver.set_anchor("about", 1200.0);
    driver.scroll_to(
        &ScrollTarget::Anchor("about".into()),
        ScrollToOptions {
            offset: -100.0,
            immediate: true,
            ..ScrollToOptions::default()
        },
    );
    assert_eq!(driver.offset(), 1100.0);
}

#[test]
fn test_locked_transition_ignores_wheel() {
    let mut driver = driver(5000.0);
    driver.scroll_to(
        &ScrollTarget::Offset(1000.0),
        ScrollToOptions {
            lock: true,
            ..ScrollToOptions::default()
        },
    );
    driver.tick(16.0);
    driver.on_wheel(-500.0);
    driver.on_touch(-500.0);

    let offsets = settle(&mut driver, 16.0);
    assert_eq!(*offsets.last().unwrap(), 1000.0);

    driver.on_wheel(100.0);
    assert_eq!(driver.target(), 1100.0, "input works again once unlocked");
}

#[test]
fn test_wheel_cancels_unlocked_transition() {
    let mut driver = driver(5000.0);
    driver.scroll_to(&ScrollTarget::Offset(3000.0), ScrollToOptions::default());
    driver.tick(16.0);
    driver.tick(100.0);
    let interrupted_at = driver.offset();
    driver.on_wheel(50.0);

    settle(&mut driver, 100.0);
    assert_eq!(driver.offset(), interrupted_at + 50.0);
}

// ============================================================================
// Input Smoothing
// ============================================================================

#[test]
fn test_wheel_lerp_converges_on_target() {
    let mut driver = driver(5000.0);
    driver.on_wheel(300.0);
    assert_eq!(driver.target(), 300.0);

    let offsets = settle(&mut driver, 0.0);
    assert!((offsets[0] - 30.0).abs() < 1e-9, "first frame covers the lerp fraction");
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(*offsets.last().unwrap(), 300.0, "snaps onto the target");
}

#[test]
fn test_lerp_is_frame_rate_corrected() {
    let mut at_60 = driver(5000.0);
    let mut at_30 = driver(5000.0);
    at_60.on_wheel(1000.0);
    at_30.on_wheel(1000.0);

    let frame = 1000.0 / 60.0;
    at_60.tick(frame);
    at_30.tick(frame);
    for i in 2..=20u8 {
        at_60.tick(frame * f64::from(i));
        if i % 2 == 0 {
            at_30.tick(frame * f64::from(i));
        }
    }
    assert!((at_60.offset() - at_30.offset()).abs() < 1e-6);
}

#[test]
fn test_wheel_clamps_target() {
    let mut driver = driver(1000.0);
    driver.on_wheel(-200.0);
    assert_eq!(driver.target(), 0.0);
    driver.on_wheel(1e9);
    assert_eq!(driver.target(), 1000.0);
    driver.on_wheel(f64::NAN);
    assert_eq!(driver.target(), 1000.0);
}

#[test]
fn test_touch_follows_finger_by_default() {
    let mut driver = driver(5000.0);
    driver.on_touch(100.0);
    assert_eq!(driver.offset(), 200.0, "touch multiplier applied, no easing");
}

#[test]
fn test_native_scroll_adopted_only_when_idle() {
    let mut driver = driver(5000.0);
    driver.on_native_scroll(700.0);
    assert_eq!(driver.offset(), 700.0);
    assert_eq!(driver.target(), 700.0);

    driver.scroll_to(&ScrollTarget::Offset(2000.0), ScrollToOptions::default());
    driver.tick(16.0);
    driver.tick(200.0);
    let driven = driver.offset();
    driver.on_native_scroll(driven - 40.0);
    assert_eq!(driver.offset(), driven, "echo of our own write is ignored");
}

#[test]
fn test_direction_and_velocity() {
    let mut driver = driver(5000.0);
    driver.on_wheel(500.0);
    let forward = driver.tick(16.0).unwrap();
    assert_eq!(forward.direction, ScrollDirection::Forward);
    assert!(forward.velocity > 0.0);

    settle(&mut driver, 16.0);
    driver.on_wheel(-200.0);
    let backward = driver.tick(100_000.0).unwrap();
    assert_eq!(backward.direction, ScrollDirection::Backward);
}

// ============================================================================
// Frames and Teardown
// ============================================================================

#[test]
fn test_timestamps_strictly_increase() {
    let mut driver = driver(5000.0);
    assert!(driver.tick(100.0).is_some());
    assert!(driver.tick(100.0).is_none(), "same timestamp");
    assert!(driver.tick(90.0).is_none(), "earlier timestamp");
    assert!(driver.tick(f64::NAN).is_none());
    let next = driver.tick(116.0).unwrap();
    assert_eq!(next.timestamp_ms, 116.0);
    assert_eq!(driver.state().unwrap().timestamp_ms, 116.0);
}

#[test]
fn test_destroy_stops_publishing() {
    let mut driver = driver(5000.0);
    driver.scroll_to(&ScrollTarget::Offset(2000.0), ScrollToOptions::default());
    assert!(driver.tick(16.0).is_some());
    driver.destroy();
    driver.destroy();

    assert!(driver.tick(32.0).is_none());
    assert!(!driver.scroll_to(&ScrollTarget::Top, ScrollToOptions::default()));
    assert!(driver.tick(48.0).is_none());
    assert!(!driver.is_animating());
}

// ============================================================================
// Through the Stage
// ============================================================================

#[test]
fn test_scroll_to_section_lands_on_section_top() {
    let (stage, _) = stage_with(portfolio_layout());
    let _about = stage.mount(sections::by_name("about").unwrap());
    assert!(stage.scroll_to_section("about"));

    run_frames(&stage, 0.0, 200);
    assert_eq!(stage.offset(), 1000.0);
    assert_eq!(stage.active_section().as_deref(), Some("about"));
}

#[test]
fn test_scroll_to_unmounted_section_fails_softly() {
    let (stage, _) = stage_with(portfolio_layout());
    assert!(!stage.scroll_to_section("no-such-section"));
    run_frames(&stage, 0.0, 5);
    assert_eq!(stage.offset(), 0.0);
}

#[test]
fn test_scroll_one_screen_moves_past_the_hero() {
    let (stage, _) = stage_with(portfolio_layout());
    assert!(stage.scroll_one_screen());
    run_frames(&stage, 0.0, 200);
    assert_eq!(stage.offset(), 800.0);
}

#[test]
fn test_subscribers_run_in_subscription_order() {
    let (stage, _) = stage_with(portfolio_layout());
    let order = Rc::new(RefCell::new(Vec::new()));
    for label in ["a", "b", "c"] {
        let order = Rc::clone(&order);
        stage.subscribe(move |_| order.borrow_mut().push(label));
    }
    stage.frame(16.0);
    assert_eq!(*order.borrow(), ["a", "b", "c"]);
}

#[test]
fn test_unsubscribe_is_idempotent() {
    let (stage, _) = stage_with(portfolio_layout());
    let id = stage.subscribe(|_| {});
    assert_eq!(stage.subscriber_count(), 1);
    assert!(stage.unsubscribe(id));
    assert!(!stage.unsubscribe(id));
    assert_eq!(stage.subscriber_count(), 0);
}

#[test]
fn test_subscribe_after_destroy_is_ignored() {
    let (stage, _) = stage_with(portfolio_layout());
    stage.destroy();
    stage.subscribe(|_| panic!("subscribed after teardown"));
    assert!(stage.frame(16.0).is_none());
    assert_eq!(stage.subscriber_count(), 0);
}

#[test]
fn test_stage_subscriber_may_reenter_stage() {
    let (stage, _) = stage_with(portfolio_layout());
    let seen = Rc::new(Cell::new(0.0));
    {
        let seen = Rc::clone(&seen);
        let handle = stage.clone();
        stage.subscribe(move |state| {
            seen.set(state.offset);
            // Reading back through the stage while it publishes.
            assert_eq!(handle.offset(), state.offset);
        });
    }
    stage.on_wheel(400.0);
    run_frames(&stage, 0.0, 120);
    assert_eq!(seen.get(), 400.0);
}

#[test]
fn test_stage_destroy_silences_subscribers() {
    let (stage, _) = stage_with(portfolio_layout());
    let calls = Rc::new(Cell::new(0));
    {
        let calls = Rc::clone(&calls);
        stage.subscribe(move |_| calls.set(calls.get() + 1));
    }
    stage.scroll_to(&ScrollTarget::Offset(3000.0), ScrollToOptions::default());
    run_frames(&stage, 0.0, 3);
    stage.destroy();
    assert!(stage.frame(1000.0).is_none());
    assert_eq!(calls.get(), 3);
    assert!(stage.is_destroyed());
}
