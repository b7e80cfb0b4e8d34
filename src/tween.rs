//! Time-based property animation.
//!
//! A [`Tween`] interpolates one property of one node. The [`Animator`] owns
//! every running tween, advances them each frame, and writes the values to an
//! [`EffectSink`]. Starting a tween on a `(node, property)` pair that is
//! already animating supersedes the older one; cancelling is idempotent.

use std::collections::HashMap;
use std::fmt;

use crate::easing::Ease;
use crate::effects::{EffectSink, Property};
use crate::geometry::NodeId;
use crate::stage::ScopeId;

/// Default tween duration.
const DEFAULT_DURATION_MS: f64 = 500.0;

/// How many extra cycles a tween plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    /// Play `n` more times after the first.
    Count(u32),
    /// Never finish; only cancellation stops it.
    Infinite,
    #[default]
    Never,
}

/// One property interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub node: NodeId,
    pub property: Property,
    /// Start value. `None` starts from the node's current value.
    pub from: Option<f64>,
    pub to: f64,
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub ease: Ease,
    pub repeat: Repeat,
    /// Alternate direction on every repeat.
    pub yoyo: bool,
}

impl Tween {
    /// Animate `property` of `node` to `to`.
    pub fn to(node: NodeId, property: Property, to: f64) -> Self {
        Self {
            node,
            property,
            from: None,
            to,
            duration_ms: DEFAULT_DURATION_MS,
            delay_ms: 0.0,
            ease: Ease::default(),
            repeat: Repeat::Never,
            yoyo: false,
        }
    }

    /// Animate from `from` to `to`. The start value is written on the first
    /// frame even while the delay is pending.
    pub fn from_to(node: NodeId, property: Property, from: f64, to: f64) -> Self {
        Self {
            from: Some(from),
            ..Self::to(node, property, to)
        }
    }

    #[must_use]
    pub fn duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms.max(0.0);
        self
    }

    #[must_use]
    pub fn delay_ms(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms.max(0.0);
        self
    }

    #[must_use]
    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    #[must_use]
    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    #[must_use]
    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    fn lerp(from: f64, to: f64, t: f64) -> f64 {
        from + (to - from) * t
    }

    /// Value `elapsed_ms` after the delay, and whether the tween is done.
    fn sample(&self, from: f64, elapsed_ms: f64) -> (f64, bool) {
        let cycles_total = match self.repeat {
            Repeat::Never => Some(1.0),
            Repeat::Count(n) => Some(f64::from(n) + 1.0),
            Repeat::Infinite => None,
        };

        if self.duration_ms <= 0.0 {
            return (self.to, cycles_total.is_some());
        }

        if let Some(total) = cycles_total {
            if elapsed_ms >= self.duration_ms * total {
                // A yoyo with an even number of cycles ends where it started.
                let ends_reversed = self.yoyo && (total % 2.0) < 0.5;
                return (if ends_reversed { from } else { self.to }, true);
            }
        }

        let cycle = (elapsed_ms / self.duration_ms).floor();
        let t = (elapsed_ms - cycle * self.duration_ms) / self.duration_ms;
        let reversed = self.yoyo && cycle % 2.0 >= 1.0;
        let t = if reversed { 1.0 - t } else { t };
        (Self::lerp(from, self.to, self.ease.apply(t)), false)
    }
}

/// Handle to a running tween.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationHandle {
    idx: u32,
    generation: u32,
}

impl fmt::Debug for AnimationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnimationHandle({}@gen{})", self.idx, self.generation)
    }
}

#[derive(Debug)]
struct Running {
    tween: Tween,
    owner: Option<ScopeId>,
    start_ms: Option<f64>,
    from: Option<f64>,
    from_written: bool,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    running: Option<Running>,
}

/// Owner of every running tween.
#[derive(Debug, Default)]
pub struct Animator {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Last value written per `(node, property)`, used as implicit start.
    values: HashMap<(NodeId, Property), f64>,
    /// The tween currently driving each `(node, property)`.
    targets: HashMap<(NodeId, Property), AnimationHandle>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a tween. With `now_ms` of `None` the clock starts on the next
    /// [`tick`](Self::tick).
    pub fn start(&mut self, tween: Tween, owner: Option<ScopeId>, now_ms: Option<f64>) -> AnimationHandle {
        let key = (tween.node, tween.property);
        if let Some(previous) = self.targets.get(&key).copied() {
            self.cancel(previous);
            tracing::trace!(?previous, "tween superseded");
        }

        let running = Running {
            tween,
            owner,
            start_ms: now_ms,
            from: None,
            from_written: false,
        };

        let reusable = self
            .free
            .pop()
            .and_then(|idx| usize::try_from(idx).ok().map(|pos| (idx, pos)));
        let handle = match reusable.and_then(|(idx, pos)| self.slots.get_mut(pos).map(|s| (idx, s))) {
            Some((idx, slot)) => {
                slot.generation = slot.generation.wrapping_add(1);
                slot.running = Some(running);
                AnimationHandle {
                    idx,
                    generation: slot.generation,
                }
            }
            None => {
                let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Slot {
                    generation: 0,
                    running: Some(running),
                });
                AnimationHandle { idx, generation: 0 }
            }
        };
        self.targets.insert(key, handle);
        handle
    }

    /// Stop a tween where it is. Idempotent; returns whether it was running.
    pub fn cancel(&mut self, handle: AnimationHandle) -> bool {
        let Some(slot) = self.slot_mut(handle) else {
            return false;
        };
        let Some(running) = slot.running.take() else {
            return false;
        };
        let key = (running.tween.node, running.tween.property);
        if self.targets.get(&key) == Some(&handle) {
            self.targets.remove(&key);
        }
        self.free.push(handle.idx);
        true
    }

    /// Cancel every tween matching `predicate`. Returns how many stopped.
    fn cancel_where(&mut self, predicate: impl Fn(&Running) -> bool) -> usize {
        let handles: Vec<AnimationHandle> = self
            .slots
            .iter()
            .zip(0u32..)
            .filter_map(|(slot, idx)| {
                slot.running
                    .as_ref()
                    .filter(|r| predicate(r))
                    .map(|_| AnimationHandle {
                        idx,
                        generation: slot.generation,
                    })
            })
            .collect();
        handles.into_iter().filter(|h| self.cancel(*h)).count()
    }

    /// Cancel every tween started on behalf of `owner`.
    pub fn cancel_owner(&mut self, owner: ScopeId) -> usize {
        self.cancel_where(|r| r.owner == Some(owner))
    }

    /// Cancel every tween targeting `node` (the node is being removed).
    pub fn cancel_node(&mut self, node: NodeId) -> usize {
        let cancelled = self.cancel_where(|r| r.tween.node == node);
        self.values.retain(|(n, _), _| *n != node);
        cancelled
    }

    pub fn is_running(&self, handle: AnimationHandle) -> bool {
        usize::try_from(handle.idx)
            .ok()
            .and_then(|idx| self.slots.get(idx))
            .is_some_and(|slot| slot.generation == handle.generation && slot.running.is_some())
    }

    pub fn has_owner(&self, owner: ScopeId) -> bool {
        self.slots
            .iter()
            .filter_map(|slot| slot.running.as_ref())
            .any(|r| r.owner == Some(owner))
    }

    /// Nodes with at least one running tween, without repeats.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.targets.keys().map(|(node, _)| *node).collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    pub fn running_count(&self) -> usize {
        self.slots.iter().filter(|s| s.running.is_some()).count()
    }

    /// Last value written to `(node, property)`.
    pub fn value(&self, node: NodeId, property: Property) -> Option<f64> {
        self.values.get(&(node, property)).copied()
    }

    /// Record a direct write. The newer write wins, so any tween on the same
    /// property stops.
    pub fn note_value(&mut self, node: NodeId, property: Property, value: f64) {
        if let Some(handle) = self.targets.get(&(node, property)).copied() {
            self.cancel(handle);
        }
        self.values.insert((node, property), value);
    }

    /// Advance every tween to `now_ms` and write the values. Returns the
    /// number of writes.
    pub fn tick(&mut self, now_ms: f64, sink: &mut dyn EffectSink) -> usize {
        let Self {
            slots,
            free,
            values,
            targets,
        } = self;
        let mut writes = 0;

        for (slot, idx) in slots.iter_mut().zip(0u32..) {
            let Some(running) = slot.running.as_mut() else {
                continue;
            };
            let tween = running.tween;
            let start = *running.start_ms.get_or_insert(now_ms);
            let elapsed = now_ms - start - tween.delay_ms;

            if elapsed < 0.0 {
                // Explicit start values render immediately, before the delay.
                if let (Some(from), false) = (tween.from, running.from_written) {
                    sink.set_property(tween.node, tween.property, from);
                    values.insert((tween.node, tween.property), from);
                    running.from_written = true;
                    writes += 1;
                }
                continue;
            }

            let from = *running.from.get_or_insert_with(|| {
                tween
                    .from
                    .or_else(|| values.get(&(tween.node, tween.property)).copied())
                    .unwrap_or_else(|| tween.property.initial())
            });
            let (value, finished) = tween.sample(from, elapsed);
            sink.set_property(tween.node, tween.property, value);
            values.insert((tween.node, tween.property), value);
            writes += 1;

            if finished {
                slot.running = None;
                free.push(idx);
                let handle = AnimationHandle {
                    idx,
                    generation: slot.generation,
                };
                let key = (tween.node, tween.property);
                if targets.get(&key) == Some(&handle) {
                    targets.remove(&key);
                }
            }
        }
        writes
    }

    fn slot_mut(&mut self, handle: AnimationHandle) -> Option<&mut Slot> {
        usize::try_from(handle.idx)
            .ok()
            .and_then(|idx| self.slots.get_mut(idx))
            .filter(|slot| slot.generation == handle.generation)
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

    const NODE: NodeId = NodeId(7);

    #[test]
    fn test_linear_tween_reaches_target_exactly() {
        let mut animator = Animator::new();
        let mut sink = RecordingSink::new();
        let tween = Tween::from_to(NODE, Property::Opacity, 0.0, 1.0)
            .duration_ms(100.0)
            .ease(Ease::Linear);
        let handle = animator.start(tween, None, Some(0.0));

        animator.tick(50.0, &mut sink);
        assert_eq!(sink.value(NODE, Property::Opacity), Some(0.5));
        assert!(animator.is_running(handle));

        animator.tick(100.0, &mut sink);
        assert_eq!(sink.value(NODE, Property::Opacity), Some(1.0));
        assert!(!animator.is_running(handle), "finished tween should stop");
        assert_eq!(animator.running_count(), 0);
    }

    #[test]
    fn test_from_value_renders_during_delay() {
        let mut animator = Animator::new();
        let mut sink = RecordingSink::new();
        let tween = Tween::from_to(NODE, Property::TranslateY, 50.0, 0.0)
            .delay_ms(1000.0)
            .duration_ms(100.0);
        animator.start(tween, None, Some(0.0));

        animator.tick(10.0, &mut sink);
        assert_eq!(sink.value(NODE, Property::TranslateY), Some(50.0));
        animator.tick(20.0, &mut sink);
        assert_eq!(sink.writes().len(), 1, "start value is written once");
    }

    #[test]
    fn test_newer_tween_supersedes() {
        let mut animator = Animator::new();
        let mut sink = RecordingSink::new();
        let first = animator.start(
            Tween::to(NODE, Property::Scale, 2.0).duration_ms(100.0),
            None,
            Some(0.0),
        );
        let second = animator.start(
            Tween::to(NODE, Property::Scale, 0.5).duration_ms(100.0),
            None,
            Some(0.0),
        );
        assert!(!animator.is_running(first));
        assert!(animator.is_running(second));
        assert_ne!(first, second);

        animator.tick(200.0, &mut sink);
        assert_eq!(sink.value(NODE, Property::Scale), Some(0.5));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut animator = Animator::new();
        let handle = animator.start(Tween::to(NODE, Property::Blur, 4.0), None, None);
        assert!(animator.cancel(handle));
        assert!(!animator.cancel(handle));
    }

    #[test]
    fn test_implicit_start_uses_last_value() {
        let mut animator = Animator::new();
        let mut sink = RecordingSink::new();
        animator.note_value(NODE, Property::Opacity, 0.2);
        animator.start(
            Tween::to(NODE, Property::Opacity, 1.0)
                .duration_ms(100.0)
                .ease(Ease::Linear),
            None,
            Some(0.0),
        );
        animator.tick(0.0, &mut sink);
        assert_eq!(sink.value(NODE, Property::Opacity), Some(0.2));
    }

    #[test]
    fn test_yoyo_repeat_returns_to_start() {
        let mut animator = Animator::new();
        let mut sink = RecordingSink::new();
        let tween = Tween::from_to(NODE, Property::TranslateY, 0.0, 10.0)
            .duration_ms(100.0)
            .ease(Ease::Linear)
            .repeat(Repeat::Count(1))
            .yoyo(true);
        let handle = animator.start(tween, None, Some(0.0));

        animator.tick(150.0, &mut sink);
        assert_eq!(sink.value(NODE, Property::TranslateY), Some(5.0));
        animator.tick(250.0, &mut sink);
        assert_eq!(sink.value(NODE, Property::TranslateY), Some(0.0));
        assert!(!animator.is_running(handle));
    }

    #[test]
    fn test_infinite_repeat_keeps_running() {
        let mut animator = Animator::new();
        let mut sink = RecordingSink::new();
        let handle = animator.start(
            Tween::to(NODE, Property::Scale, 1.1).repeat(Repeat::Infinite),
            None,
            Some(0.0),
        );
        animator.tick(60_000.0, &mut sink);
        assert!(animator.is_running(handle));
    }

    #[test]
    fn test_cancel_node_drops_all_tweens_on_node() {
        let mut animator = Animator::new();
        animator.start(Tween::to(NODE, Property::Opacity, 0.0), None, None);
        animator.start(Tween::to(NODE, Property::Scale, 2.0), None, None);
        animator.start(Tween::to(NodeId(1), Property::Scale, 2.0), None, None);
        assert_eq!(animator.cancel_node(NODE), 2);
        assert_eq!(animator.running_count(), 1);
    }

    #[test]
    fn test_nodes_lists_each_animated_node_once() {
        let mut animator = Animator::new();
        animator.start(Tween::to(NODE, Property::Opacity, 0.0), None, None);
        animator.start(Tween::to(NODE, Property::Scale, 2.0), None, None);
        animator.start(Tween::to(NodeId(1), Property::Scale, 2.0), None, None);
        assert_eq!(animator.nodes(), [NodeId(1), NODE]);
        animator.cancel_node(NodeId(1));
        assert_eq!(animator.nodes(), [NODE]);
    }
}
