//! The per-page coordination point.
//!
//! [`Stage`] owns the smooth-scroll driver, the trigger registry, the animator,
//! the effect sink and the geometry provider behind one shared single-threaded
//! handle. [`Stage::frame`] is the only place per-frame work happens:
//!
//! 1. tick the driver and publish the scroll state to subscribers;
//! 2. evaluate the registry and run the dispatch list, with no registry borrow
//!    held while a callback runs;
//! 3. advance the animator and write the values to the sink.
//!
//! Callbacks receive an [`EffectContext`] that borrows each piece only for the
//! duration of one call, so a callback may mount or unmount sections, register
//! or unregister triggers, and start or cancel tweens.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Serialize;

use crate::binder::{MountedSection, Section};
use crate::config::StageConfig;
use crate::effects::{EffectSink, Property};
use crate::geometry::{Geometry, NodeId};
use crate::nav;
use crate::scroll::{ScrollState, ScrollTarget, ScrollToOptions, SmoothScroll};
use crate::stats::FrameStats;
use crate::trigger::{Placement, TriggerCallback, TriggerEvent, TriggerId, TriggerMode, TriggerRegistry};
use crate::tween::{AnimationHandle, Animator, Tween};

/// Identifies one mounted section instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeId(u64);

/// Identifies a scroll subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ScrollSubscriber = Rc<RefCell<dyn FnMut(&ScrollState)>>;

/// A trigger callback run, kept while dispatch recording is on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRecord {
    /// Name of the section that owns the trigger, if any.
    pub section: Option<String>,
    pub event: TriggerEvent,
}

pub(crate) struct StageInner {
    config: StageConfig,
    driver: RefCell<SmoothScroll>,
    registry: RefCell<TriggerRegistry>,
    animator: RefCell<Animator>,
    sink: RefCell<Box<dyn EffectSink>>,
    geometry: RefCell<Box<dyn Geometry>>,
    stats: RefCell<FrameStats>,
    subscribers: RefCell<Vec<(SubscriptionId, ScrollSubscriber)>>,
    next_subscription: Cell<u64>,
    /// Live section scopes and their names, in mount order.
    scopes: RefCell<Vec<(ScopeId, String)>>,
    next_scope: Cell<u64>,
    /// Unregisters requested while the registry was borrowed.
    deferred_unregister: RefCell<Vec<TriggerId>>,
    /// Cancels requested while the animator was borrowed.
    deferred_cancel: RefCell<Vec<AnimationHandle>>,
    dispatch_log: RefCell<Option<Vec<DispatchRecord>>>,
    /// Direct writes since the last frame.
    direct_writes: Cell<u64>,
    destroyed: Cell<bool>,
}

impl StageInner {
    /// Write a value now. Any tween on the same property stops. Writes to a
    /// node that has left the page are dropped.
    pub(crate) fn write(&self, node: NodeId, property: Property, value: f64) {
        if !self.node_attached(node) {
            tracing::trace!(?node, ?property, "write to detached node dropped");
            return;
        }
        if let Ok(mut animator) = self.animator.try_borrow_mut() {
            animator.note_value(node, property, value);
        }
        if let Ok(mut sink) = self.sink.try_borrow_mut() {
            sink.set_property(node, property, value);
            self.direct_writes.set(self.direct_writes.get() + 1);
        } else {
            tracing::warn!(?node, ?property, "sink busy, write dropped");
        }
    }

    pub(crate) fn start_tween(
        &self,
        tween: Tween,
        owner: Option<ScopeId>,
        now_ms: Option<f64>,
    ) -> Option<AnimationHandle> {
        if self.destroyed.get() {
            return None;
        }
        match self.animator.try_borrow_mut() {
            Ok(mut animator) => Some(animator.start(tween, owner, now_ms)),
            Err(_) => {
                tracing::warn!(node = ?tween.node, "animator busy, tween dropped");
                None
            }
        }
    }

    pub(crate) fn cancel_tween(&self, handle: AnimationHandle) -> bool {
        match self.animator.try_borrow_mut() {
            Ok(mut animator) => animator.cancel(handle),
            Err(_) => {
                self.deferred_cancel.borrow_mut().push(handle);
                false
            }
        }
    }

    pub(crate) fn register(
        &self,
        placement: Placement,
        mode: TriggerMode,
        callback: TriggerCallback,
        owner: Option<ScopeId>,
    ) -> Option<TriggerId> {
        if self.destroyed.get() {
            return None;
        }
        let mut registry = self.registry.try_borrow_mut().ok()?;
        let id = registry.register_owned(placement, mode, callback, owner);
        if let Ok(geometry) = self.geometry.try_borrow() {
            registry.resolve(id, geometry.as_ref());
        }
        Some(id)
    }

    /// Unregister now, or after the current registry borrow ends.
    ///
    /// The registration's callback is dropped after the registry borrow is
    /// released, so guards it owns unregister directly and report their own
    /// result. Returns `false` only for ids that were not live, or when the
    /// registry is mid-call and the removal is queued for the next drain.
    pub(crate) fn unregister(&self, id: TriggerId) -> bool {
        let taken = match self.registry.try_borrow_mut() {
            Ok(mut registry) => registry.take(id),
            Err(_) => {
                self.deferred_unregister.borrow_mut().push(id);
                return false;
            }
        };
        let removed = taken.is_some();
        drop(taken);
        self.drain_deferred();
        removed
    }

    fn drain_deferred(&self) {
        loop {
            let pending: Vec<TriggerId> = match self.deferred_unregister.try_borrow_mut() {
                Ok(mut queue) => std::mem::take(&mut *queue),
                Err(_) => return,
            };
            let cancels: Vec<AnimationHandle> = match self.deferred_cancel.try_borrow_mut() {
                Ok(mut queue) => std::mem::take(&mut *queue),
                Err(_) => Vec::new(),
            };
            if pending.is_empty() && cancels.is_empty() {
                return;
            }
            if let Ok(mut animator) = self.animator.try_borrow_mut() {
                for handle in cancels {
                    animator.cancel(handle);
                }
            }
            let taken: Vec<TriggerCallback> = {
                let Ok(mut registry) = self.registry.try_borrow_mut() else {
                    self.deferred_unregister.borrow_mut().extend(pending);
                    return;
                };
                pending.into_iter().filter_map(|id| registry.take(id)).collect()
            };
            // Callbacks may own guards; they release with the registry free.
            drop(taken);
        }
    }

    fn node_attached(&self, node: NodeId) -> bool {
        self.geometry
            .try_borrow()
            .map_or(true, |geometry| geometry.is_attached(node))
    }

    /// Stop every tween whose target node has left the page.
    fn cancel_detached(&self) -> usize {
        let Ok(geometry) = self.geometry.try_borrow() else {
            return 0;
        };
        let Ok(mut animator) = self.animator.try_borrow_mut() else {
            return 0;
        };
        let detached: Vec<NodeId> = animator
            .nodes()
            .into_iter()
            .filter(|node| !geometry.is_attached(*node))
            .collect();
        let mut cancelled = 0;
        for node in detached {
            let stopped = animator.cancel_node(node);
            tracing::debug!(?node, stopped, "node detached, tweens cancelled");
            cancelled += stopped;
        }
        cancelled
    }

    pub(crate) fn registry_contains(&self, id: TriggerId) -> bool {
        self.registry.try_borrow().is_ok_and(|r| r.contains(id))
    }

    pub(crate) fn registry_is_active(&self, id: TriggerId) -> bool {
        self.registry.try_borrow().is_ok_and(|r| r.is_active(id))
    }

    pub(crate) fn has_running_tweens(&self, owner: ScopeId) -> bool {
        self.animator.try_borrow().is_ok_and(|a| a.has_owner(owner))
    }

    pub(crate) fn find_node(&self, section: &str, key: &str) -> Option<NodeId> {
        self.geometry.try_borrow().ok()?.find(section, key)
    }

    pub(crate) fn viewport_height(&self) -> f64 {
        self.geometry
            .try_borrow()
            .map_or(0.0, |geometry| geometry.viewport_height())
    }

    pub(crate) fn open_scope(&self, name: &str) -> ScopeId {
        let scope = ScopeId(self.next_scope.get());
        self.next_scope.set(scope.0 + 1);
        self.scopes.borrow_mut().push((scope, name.to_string()));
        self.sync_anchor(name);
        scope
    }

    /// End a scope: its pending dispatches are skipped and its tweens stop.
    pub(crate) fn close_scope(&self, scope: ScopeId) {
        self.scopes.borrow_mut().retain(|(id, _)| *id != scope);
        match self.animator.try_borrow_mut() {
            Ok(mut animator) => {
                let cancelled = animator.cancel_owner(scope);
                tracing::trace!(?scope, cancelled, "scope closed");
            }
            Err(_) => tracing::warn!(?scope, "animator busy while closing scope"),
        }
    }

    fn scope_is_live(&self, scope: ScopeId) -> bool {
        self.scopes.borrow().iter().any(|(id, _)| *id == scope)
    }

    fn scope_name(&self, scope: ScopeId) -> Option<String> {
        self.scopes
            .borrow()
            .iter()
            .find(|(id, _)| *id == scope)
            .map(|(_, name)| name.clone())
    }

    /// Point the driver's anchor for `section` at the section's top.
    fn sync_anchor(&self, section: &str) {
        let top = self
            .geometry
            .try_borrow()
            .ok()
            .and_then(|geometry| nav::section_top(geometry.as_ref(), section));
        if let (Some(top), Ok(mut driver)) = (top, self.driver.try_borrow_mut()) {
            driver.set_anchor(section, top);
        }
    }
}

/// Write access handed to trigger callbacks.
pub struct EffectContext<'a> {
    inner: &'a Rc<StageInner>,
    owner: Option<ScopeId>,
    now_ms: f64,
}

impl EffectContext<'_> {
    /// Write a property immediately. A running tween on the same property is
    /// superseded.
    pub fn set(&mut self, node: NodeId, property: Property, value: f64) {
        self.inner.write(node, property, value);
    }

    /// Start a tween owned by the callback's section. Its clock starts now.
    pub fn animate(&mut self, tween: Tween) -> Option<AnimationHandle> {
        self.inner.start_tween(tween, self.owner, Some(self.now_ms))
    }

    /// Idempotent.
    pub fn cancel(&mut self, handle: AnimationHandle) -> bool {
        self.inner.cancel_tween(handle)
    }

    /// Timestamp of the frame being dispatched.
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// The section that owns the running callback.
    pub fn owner(&self) -> Option<ScopeId> {
        self.owner
    }

    /// A handle to the stage, for callbacks that mount or unmount sections.
    pub fn stage(&self) -> Stage {
        Stage {
            inner: Rc::clone(self.inner),
        }
    }
}

/// Shared handle to one page's scroll and animation state.
#[derive(Clone)]
pub struct Stage {
    inner: Rc<StageInner>,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("triggers", &self.registry_len())
            .field("scopes", &self.inner.scopes.borrow().len())
            .field("destroyed", &self.inner.destroyed.get())
            .finish_non_exhaustive()
    }
}

impl Stage {
    pub fn new(config: StageConfig, geometry: Box<dyn Geometry>, sink: Box<dyn EffectSink>) -> Self {
        let mut driver = SmoothScroll::new(config.scroll.clone());
        driver.set_limit(geometry.scroll_limit());
        Self {
            inner: Rc::new(StageInner {
                config,
                driver: RefCell::new(driver),
                registry: RefCell::new(TriggerRegistry::new()),
                animator: RefCell::new(Animator::new()),
                sink: RefCell::new(sink),
                geometry: RefCell::new(geometry),
                stats: RefCell::new(FrameStats::new()),
                subscribers: RefCell::new(Vec::new()),
                next_subscription: Cell::new(0),
                scopes: RefCell::new(Vec::new()),
                next_scope: Cell::new(0),
                deferred_unregister: RefCell::new(Vec::new()),
                deferred_cancel: RefCell::new(Vec::new()),
                dispatch_log: RefCell::new(None),
                direct_writes: Cell::new(0),
                destroyed: Cell::new(false),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<StageInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<StageInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn inner(&self) -> &Rc<StageInner> {
        &self.inner
    }

    pub fn config(&self) -> &StageConfig {
        &self.inner.config
    }

    /// Run one animation frame. Returns the published scroll state, or `None`
    /// after teardown or for a timestamp that is not after the previous one.
    pub fn frame(&self, now_ms: f64) -> Option<ScrollState> {
        let inner = &self.inner;
        if inner.destroyed.get() {
            return None;
        }
        inner.drain_deferred();

        let state = inner.driver.borrow_mut().tick(now_ms)?;

        let subscribers: Vec<ScrollSubscriber> = inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, subscriber)| Rc::clone(subscriber))
            .collect();
        for subscriber in subscribers {
            if let Ok(mut subscriber) = subscriber.try_borrow_mut() {
                (&mut *subscriber)(&state);
            }
        }

        let dispatches = inner.registry.borrow_mut().evaluate(state.offset, now_ms);
        let mut ran = 0u64;
        for dispatch in dispatches {
            if inner.destroyed.get() {
                break;
            }
            // Removed earlier in this frame, or its section is gone.
            if !inner.registry_contains(dispatch.event.id) {
                continue;
            }
            if let Some(owner) = dispatch.owner {
                if !inner.scope_is_live(owner) {
                    continue;
                }
            }
            let Ok(mut callback) = dispatch.callback.try_borrow_mut() else {
                tracing::debug!(id = ?dispatch.event.id, "callback re-entered, skipped");
                continue;
            };
            if let Some(log) = inner.dispatch_log.borrow_mut().as_mut() {
                log.push(DispatchRecord {
                    section: dispatch.owner.and_then(|owner| inner.scope_name(owner)),
                    event: dispatch.event,
                });
            }
            let mut ctx = EffectContext {
                inner,
                owner: dispatch.owner,
                now_ms,
            };
            (&mut *callback)(&dispatch.event, &mut ctx);
            ran += 1;
        }
        inner.drain_deferred();
        inner.cancel_detached();

        let tweened = {
            let mut animator = inner.animator.borrow_mut();
            let mut sink = inner.sink.borrow_mut();
            let writes = animator.tick(now_ms, &mut **sink);
            sink.flush();
            writes
        };
        let writes = u64::try_from(tweened).unwrap_or(u64::MAX) + inner.direct_writes.replace(0);
        inner.stats.borrow_mut().record_frame(now_ms, ran, writes);
        Some(state)
    }

    /// Wheel input in pixels.
    pub fn on_wheel(&self, delta: f64) {
        self.inner.driver.borrow_mut().on_wheel(delta);
    }

    /// Touch drag in pixels.
    pub fn on_touch(&self, delta: f64) {
        self.inner.driver.borrow_mut().on_touch(delta);
    }

    /// Adopt a scroll position the platform applied itself.
    pub fn on_native_scroll(&self, offset: f64) {
        self.inner.driver.borrow_mut().on_native_scroll(offset);
    }

    /// Non-blocking eased scroll; see [`SmoothScroll::scroll_to`].
    pub fn scroll_to(&self, target: &ScrollTarget, options: ScrollToOptions) -> bool {
        self.inner.driver.borrow_mut().scroll_to(target, options)
    }

    /// Scroll to a mounted section's top.
    pub fn scroll_to_section(&self, name: &str) -> bool {
        self.inner.sync_anchor(name);
        self.scroll_to(&ScrollTarget::Anchor(name.to_string()), ScrollToOptions::default())
    }

    /// Current interpolated offset.
    pub fn offset(&self) -> f64 {
        self.inner.driver.borrow().offset()
    }

    /// Last published scroll state.
    pub fn scroll_state(&self) -> Option<ScrollState> {
        self.inner.driver.borrow().state()
    }

    /// Scroll position as a fraction of the scrollable range.
    pub fn progress(&self) -> f64 {
        self.inner.driver.borrow().progress()
    }

    /// Subscribe to every published scroll state. Subscribers may call back
    /// into the stage.
    pub fn subscribe(&self, callback: impl FnMut(&ScrollState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.get());
        self.inner.next_subscription.set(self.inner.next_subscription.get() + 1);
        if !self.inner.destroyed.get() {
            self.inner
                .subscribers
                .borrow_mut()
                .push((id, Rc::new(RefCell::new(callback))));
        }
        id
    }

    /// Idempotent.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        before != subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Register a trigger that belongs to no section.
    pub fn register(
        &self,
        placement: impl Into<Placement>,
        mode: TriggerMode,
        callback: TriggerCallback,
    ) -> Option<TriggerId> {
        self.inner.register(placement.into(), mode, callback, None)
    }

    /// Idempotent.
    pub fn unregister(&self, id: TriggerId) -> bool {
        self.inner.unregister(id)
    }

    pub fn is_registered(&self, id: TriggerId) -> bool {
        self.inner.registry_contains(id)
    }

    pub fn is_active(&self, id: TriggerId) -> bool {
        self.inner.registry_is_active(id)
    }

    pub fn registry_len(&self) -> usize {
        self.inner.registry.try_borrow().map_or(0, |r| r.len())
    }

    /// Start a tween outside any section.
    pub fn animate(&self, tween: Tween) -> Option<AnimationHandle> {
        self.inner.start_tween(tween, None, None)
    }

    /// Idempotent.
    pub fn cancel(&self, handle: AnimationHandle) -> bool {
        self.inner.cancel_tween(handle)
    }

    pub fn running_animations(&self) -> usize {
        self.inner.animator.try_borrow().map_or(0, |a| a.running_count())
    }

    /// Write a property immediately.
    pub fn set(&self, node: NodeId, property: Property, value: f64) {
        self.inner.write(node, property, value);
    }

    /// Mount a section: bind it in a fresh scope.
    pub fn mount(&self, section: Box<dyn Section>) -> MountedSection {
        MountedSection::mount(self, section)
    }

    /// Names of the mounted sections, in mount order.
    pub fn mounted_sections(&self) -> Vec<String> {
        self.inner
            .scopes
            .borrow()
            .iter()
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Swap the geometry provider and re-resolve everything against it.
    pub fn set_geometry(&self, geometry: Box<dyn Geometry>) {
        *self.inner.geometry.borrow_mut() = geometry;
        self.refresh();
    }

    /// Re-resolve regions, the scroll limit and section anchors (after layout
    /// or a resize). Tweens on nodes that left the page stop.
    pub fn refresh(&self) {
        let inner = &self.inner;
        {
            let geometry = inner.geometry.borrow();
            inner.registry.borrow_mut().refresh(geometry.as_ref());
            inner.driver.borrow_mut().set_limit(geometry.scroll_limit());
        }
        inner.cancel_detached();
        let names = self.mounted_sections();
        for name in &names {
            inner.sync_anchor(name);
        }
        tracing::debug!(sections = names.len(), "stage refreshed");
    }

    /// A node is leaving the page: stop every tween on it now, ahead of the
    /// next geometry check.
    pub fn detach_node(&self, node: NodeId) -> usize {
        self.inner.animator.borrow_mut().cancel_node(node)
    }

    /// Scroll one viewport down from the top, past the hero (the scroll
    /// indicator's click action).
    pub fn scroll_one_screen(&self) -> bool {
        let height = self.inner.viewport_height();
        self.scroll_to(&ScrollTarget::Offset(height), ScrollToOptions::default())
    }

    /// The mounted section under the nav probe line.
    pub fn active_section(&self) -> Option<String> {
        let names = self.mounted_sections();
        let geometry = self.inner.geometry.borrow();
        let probe = self.offset() + self.inner.config.nav_probe_px;
        nav::active_section(
            geometry.as_ref(),
            names.iter().map(String::as_str),
            probe,
        )
        .map(str::to_string)
    }

    pub fn stats(&self) -> FrameStats {
        *self.inner.stats.borrow()
    }

    /// Start or stop keeping a log of every callback run.
    pub fn record_dispatches(&self, enabled: bool) {
        *self.inner.dispatch_log.borrow_mut() = enabled.then(Vec::new);
    }

    /// Drain the dispatch log.
    pub fn take_dispatch_log(&self) -> Vec<DispatchRecord> {
        self.inner
            .dispatch_log
            .borrow_mut()
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Tear everything down. Later frames do nothing and no subscriber or
    /// callback runs again. Idempotent.
    pub fn destroy(&self) {
        let inner = &self.inner;
        if inner.destroyed.replace(true) {
            return;
        }
        inner.driver.borrow_mut().destroy();
        inner.subscribers.borrow_mut().clear();
        let scopes: Vec<ScopeId> = inner.scopes.borrow().iter().map(|(id, _)| *id).collect();
        for scope in scopes {
            inner.close_scope(scope);
        }
        // Registrations are dropped outside the borrow: a callback may own a
        // guard that unregisters itself on drop.
        let ids: Vec<TriggerId> = inner.registry.borrow().ids().collect();
        for id in ids {
            inner.unregister(id);
        }
        tracing::debug!("stage destroyed");
    }
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
    use crate::effects::RecordingSink;
    use crate::geometry::StaticLayout;
    use crate::trigger::{callback, Region};

    fn stage() -> (Stage, RecordingSink) {
        let sink = RecordingSink::new();
        let layout = StaticLayout::new(800.0).with("page", "section", 0.0, 5000.0);
        let stage = Stage::new(
            StageConfig::default(),
            Box::new(layout),
            Box::new(sink.clone()),
        );
        (stage, sink)
    }

    #[test]
    fn test_frame_publishes_to_subscribers() {
        let (stage, _) = stage();
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        stage.subscribe(move |_| counter.set(counter.get() + 1));
        stage.frame(16.0);
        stage.frame(32.0);
        stage.frame(32.0);
        assert_eq!(seen.get(), 2, "repeated timestamp is not published");
    }

    #[test]
    fn test_callback_can_unregister_itself() {
        let (stage, _) = stage();
        let slot: Rc<Cell<Option<TriggerId>>> = Rc::new(Cell::new(None));
        let own = Rc::clone(&slot);
        let id = stage
            .register(
                Region::fixed(0.0, 100.0),
                TriggerMode::OnEnter,
                callback(move |_, ctx| {
                    if let Some(id) = own.get() {
                        ctx.stage().unregister(id);
                    }
                }),
            )
            .unwrap();
        slot.set(Some(id));
        stage.frame(16.0);
        assert!(!stage.is_registered(id));
    }

    #[test]
    fn test_destroy_stops_frames() {
        let (stage, sink) = stage();
        stage.register(
            Region::fixed(0.0, 100.0),
            TriggerMode::OnEnter,
            callback(|_, ctx| ctx.set(NodeId(0), Property::Opacity, 0.5)),
        );
        stage.destroy();
        assert!(stage.frame(16.0).is_none());
        assert_eq!(stage.registry_len(), 0);
        assert!(sink.writes().is_empty());
    }
}
