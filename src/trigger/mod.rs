//! Animation trigger registry.
//!
//! Maps scroll regions to callbacks. Every frame the registry compares the new
//! scroll offset against each region and produces a dispatch list in
//! registration order. The registry itself never runs callbacks and never
//! touches the page: [`Stage`](crate::stage::Stage) runs the dispatch list
//! after the registry borrow is released, so callbacks are free to mount,
//! unmount, register and unregister.
//!
//! Registrations live in a generation-stamped arena. A freed slot is only
//! reused with a bumped generation, so a [`TriggerId`] is never issued twice.

mod anchor;
mod region;

pub use anchor::{Anchor, Edge, EdgeSpec};
pub use region::{Phase, Placement, Region, RegionSpec};

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;
use crate::scroll::ScrollDirection;
use crate::stage::{EffectContext, ScopeId};

/// Progress changes smaller than this are not reported.
const PROGRESS_EPSILON: f64 = 1e-9;
/// Smoothed scrub snaps to its target once this close.
const SMOOTH_SNAP: f64 = 1e-4;

/// Handle to one registration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerId {
    idx: u32,
    generation: u32,
}

impl TriggerId {
    /// Raw slot index (diagnostics only).
    pub fn index(self) -> u32 {
        self.idx
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TriggerId({}@gen{})", self.idx, self.generation)
    }
}

/// How scrub progress follows the scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scrub {
    /// Progress is exactly the scroll fraction through the region.
    Linked,
    /// Progress catches up with the scroll fraction over roughly `lag_ms`.
    Smoothed { lag_ms: f64 },
}

/// Which region crossings a registration reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerMode {
    /// Scrolling forward into the region.
    OnEnter,
    /// Scrolling forward out of the region.
    OnLeave,
    /// Scrolling backward into the region.
    OnEnterBack,
    /// Scrolling backward out of the region.
    OnLeaveBack,
    /// All four crossings.
    Toggle,
    /// The first forward entry only; the registration then retires.
    Once,
    /// Continuous progress updates while the scroll moves through the region.
    Scrub(Scrub),
}

impl TriggerMode {
    fn fires_on(self, kind: TriggerEventKind) -> bool {
        use TriggerEventKind as K;
        matches!(
            (self, kind),
            (Self::OnEnter | Self::Once, K::Enter)
                | (Self::OnLeave, K::Leave)
                | (Self::OnEnterBack, K::EnterBack)
                | (Self::OnLeaveBack, K::LeaveBack)
                | (
                    Self::Toggle,
                    K::Enter | K::Leave | K::EnterBack | K::LeaveBack
                )
        )
    }
}

/// What happened to a registration this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerEventKind {
    Enter,
    Leave,
    EnterBack,
    LeaveBack,
    Update,
}

/// Payload handed to a trigger callback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    pub id: TriggerId,
    pub kind: TriggerEventKind,
    /// Scroll fraction through the region in `[0, 1]`.
    pub progress: f64,
    /// Scroll offset that produced this event.
    pub offset: f64,
    pub direction: ScrollDirection,
}

/// Shared, single-threaded trigger callback.
pub type TriggerCallback = Rc<RefCell<dyn FnMut(&TriggerEvent, &mut EffectContext<'_>)>>;

/// Box a closure as a [`TriggerCallback`].
pub fn callback(f: impl FnMut(&TriggerEvent, &mut EffectContext<'_>) + 'static) -> TriggerCallback {
    Rc::new(RefCell::new(f))
}

/// One callback invocation produced by [`TriggerRegistry::evaluate`].
pub struct Dispatch {
    pub event: TriggerEvent,
    pub owner: Option<ScopeId>,
    pub callback: TriggerCallback,
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("event", &self.event)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

struct Registration {
    placement: Placement,
    region: Option<Region>,
    mode: TriggerMode,
    callback: TriggerCallback,
    owner: Option<ScopeId>,
    phase: Option<Phase>,
    progress: Option<f64>,
    retired: bool,
}

struct Slot {
    generation: u32,
    entry: Option<Registration>,
}

/// Process-wide list of scroll-region bindings.
///
/// Not `Send` or `Sync`: the frame loop is the only mutator.
pub struct TriggerRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Live ids in registration order.
    order: Vec<TriggerId>,
    last_offset: Option<f64>,
    last_eval_ms: Option<f64>,
    _single_thread: PhantomData<Rc<()>>,
}

impl Default for TriggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TriggerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerRegistry")
            .field("live", &self.order.len())
            .field("slots", &self.slots.len())
            .finish_non_exhaustive()
    }
}

/// Region crossings between two phases, in the order they happen.
fn crossings(prev: Phase, next: Phase) -> &'static [TriggerEventKind] {
    use Phase::{Active, After, Before};
    use TriggerEventKind as K;
    match (prev, next) {
        (Before, Active) => &[K::Enter],
        (Before, After) => &[K::Enter, K::Leave],
        (Active, After) => &[K::Leave],
        (After, Active) => &[K::EnterBack],
        (After, Before) => &[K::EnterBack, K::LeaveBack],
        (Active, Before) => &[K::LeaveBack],
        (Before, Before) | (Active, Active) | (After, After) => &[],
    }
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            last_offset: None,
            last_eval_ms: None,
            _single_thread: PhantomData,
        }
    }

    /// Register a callback for a region.
    ///
    /// Node-relative placements start dormant until [`resolve`](Self::resolve)
    /// or [`refresh`](Self::refresh) finds their target.
    pub fn register(
        &mut self,
        placement: impl Into<Placement>,
        mode: TriggerMode,
        callback: TriggerCallback,
    ) -> TriggerId {
        self.register_owned(placement.into(), mode, callback, None)
    }

    pub(crate) fn register_owned(
        &mut self,
        placement: Placement,
        mode: TriggerMode,
        callback: TriggerCallback,
        owner: Option<ScopeId>,
    ) -> TriggerId {
        let registration = Registration {
            region: placement.resolve(None),
            placement,
            mode,
            callback,
            owner,
            phase: None,
            progress: None,
            retired: false,
        };

        let reusable = self
            .free
            .pop()
            .and_then(|idx| usize::try_from(idx).ok().map(|pos| (idx, pos)));
        let id = match reusable.and_then(|(idx, pos)| self.slots.get_mut(pos).map(|s| (idx, s))) {
            Some((idx, slot)) => {
                // Bumped generation keeps stale handles from matching.
                slot.generation = slot.generation.wrapping_add(1);
                slot.entry = Some(registration);
                TriggerId {
                    idx,
                    generation: slot.generation,
                }
            }
            None => {
                let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(registration),
                });
                TriggerId { idx, generation: 0 }
            }
        };

        self.order.push(id);
        tracing::trace!(?id, ?mode, "trigger registered");
        id
    }

    /// Remove exactly one registration.
    ///
    /// Idempotent: an id that was already removed, or never issued, is a
    /// no-op. Returns whether anything was removed.
    pub fn unregister(&mut self, id: TriggerId) -> bool {
        self.take(id).is_some()
    }

    /// Remove a registration and hand back its callback, so the caller can
    /// drop it (and any guards it owns) outside its registry borrow.
    pub(crate) fn take(&mut self, id: TriggerId) -> Option<TriggerCallback> {
        let registration = self.slot_mut(id)?.entry.take()?;
        self.free.push(id.idx);
        self.order.retain(|live| *live != id);
        tracing::trace!(?id, "trigger unregistered");
        Some(registration.callback)
    }

    /// Whether `id` is still registered.
    pub fn contains(&self, id: TriggerId) -> bool {
        self.entry(id).is_some()
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Live ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = TriggerId> + '_ {
        self.order.iter().copied()
    }

    /// Whether the last evaluated offset lies inside the registration's region.
    pub fn is_active(&self, id: TriggerId) -> bool {
        self.entry(id)
            .is_some_and(|r| !r.retired && r.region.is_some() && r.phase == Some(Phase::Active))
    }

    /// The registration's current resolved region.
    pub fn region(&self, id: TriggerId) -> Option<Region> {
        self.entry(id).and_then(|r| r.region)
    }

    /// The owner scope recorded at registration.
    pub fn owner(&self, id: TriggerId) -> Option<ScopeId> {
        self.entry(id).and_then(|r| r.owner)
    }

    /// Resolve one registration against current geometry.
    pub fn resolve(&mut self, id: TriggerId, geometry: &dyn Geometry) {
        if let Some(entry) = self.entry_mut(id) {
            entry.region = entry.placement.resolve(Some(geometry));
        }
    }

    /// Re-resolve every node-relative region (after layout or resize).
    ///
    /// Regions whose target has disappeared go dormant.
    pub fn refresh(&mut self, geometry: &dyn Geometry) {
        for slot in &mut self.slots {
            if let Some(entry) = slot.entry.as_mut() {
                entry.region = entry.placement.resolve(Some(geometry));
            }
        }
    }

    /// Compare `offset` against every region and collect the callbacks to run,
    /// in registration order.
    pub fn evaluate(&mut self, offset: f64, now_ms: f64) -> Vec<Dispatch> {
        let direction = match self.last_offset {
            Some(last) if offset > last => ScrollDirection::Forward,
            Some(last) if offset < last => ScrollDirection::Backward,
            _ => ScrollDirection::Idle,
        };
        let dt = self
            .last_eval_ms
            .map_or(0.0, |last| (now_ms - last).max(0.0));
        self.last_offset = Some(offset);
        self.last_eval_ms = Some(now_ms);

        let Self { slots, order, .. } = self;
        let mut out = Vec::new();

        for &id in order.iter() {
            let Some(entry) = usize::try_from(id.idx)
                .ok()
                .and_then(|idx| slots.get_mut(idx))
                .filter(|slot| slot.generation == id.generation)
                .and_then(|slot| slot.entry.as_mut())
            else {
                continue;
            };
            if entry.retired {
                continue;
            }
            let Some(region) = entry.region else {
                continue;
            };

            let prev = entry.phase.unwrap_or(Phase::Before);
            let next = region.phase_of(offset);
            entry.phase = Some(next);

            let progress = region.progress_at(offset);
            for &kind in crossings(prev, next) {
                if !entry.mode.fires_on(kind) {
                    continue;
                }
                out.push(Dispatch {
                    event: TriggerEvent {
                        id,
                        kind,
                        progress,
                        offset,
                        direction,
                    },
                    owner: entry.owner,
                    callback: Rc::clone(&entry.callback),
                });
                if matches!(entry.mode, TriggerMode::Once) {
                    entry.retired = true;
                    break;
                }
            }

            if let TriggerMode::Scrub(scrub) = entry.mode {
                if region.is_empty() {
                    continue;
                }
                let reported = match (scrub, entry.progress) {
                    (Scrub::Smoothed { lag_ms }, Some(last)) if lag_ms > 0.0 => {
                        let factor = -(-dt / lag_ms).exp_m1();
                        let eased = last + (progress - last) * factor;
                        if (progress - eased).abs() < SMOOTH_SNAP {
                            progress
                        } else {
                            eased
                        }
                    }
                    _ => progress,
                };
                let changed = entry
                    .progress
                    .map_or(true, |last| (reported - last).abs() > PROGRESS_EPSILON);
                if changed {
                    entry.progress = Some(reported);
                    out.push(Dispatch {
                        event: TriggerEvent {
                            id,
                            kind: TriggerEventKind::Update,
                            progress: reported,
                            offset,
                            direction,
                        },
                        owner: entry.owner,
                        callback: Rc::clone(&entry.callback),
                    });
                }
            }
        }

        out
    }

    fn slot_mut(&mut self, id: TriggerId) -> Option<&mut Slot> {
        usize::try_from(id.idx)
            .ok()
            .and_then(|idx| self.slots.get_mut(idx))
            .filter(|slot| slot.generation == id.generation)
    }

    fn entry(&self, id: TriggerId) -> Option<&Registration> {
        usize::try_from(id.idx)
            .ok()
            .and_then(|idx| self.slots.get(idx))
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, id: TriggerId) -> Option<&mut Registration> {
        self.slot_mut(id).and_then(|slot| slot.entry.as_mut())
    }
}
