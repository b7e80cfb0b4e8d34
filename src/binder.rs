//! Per-section lifecycle binding.
//!
//! A [`Section`] registers its triggers and tweens through a [`SectionScope`]
//! when mounted. Every registration is recorded as a guard owned by that one
//! mounted instance, and unmounting releases exactly those guards: two
//! instances of the same section never touch each other's registrations, and a
//! remount always starts from fresh ids.

use std::fmt;
use std::rc::Weak;

use serde::Serialize;

use crate::effects::Property;
use crate::geometry::NodeId;
use crate::stage::{ScopeId, Stage, StageInner};
use crate::trigger::{Region, RegionSpec, TriggerCallback, TriggerId, TriggerMode};
use crate::tween::{AnimationHandle, Tween};

/// A page section that binds scroll behaviour to its nodes.
pub trait Section {
    /// Section name; also the namespace its node keys are looked up in.
    fn name(&self) -> &str;

    /// Register triggers and start tweens. Missing nodes are skipped, never
    /// treated as errors.
    fn bind(&mut self, scope: &mut SectionScope<'_>);
}

/// Lifecycle of a mounted section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionState {
    Unmounted,
    Mounting,
    /// Mounted, nothing in view and nothing animating.
    Idle,
    /// A region of the section is active or one of its tweens is running.
    Animating,
    Unmounting,
}

/// Owns one trigger registration. Dropping the guard unregisters it.
///
/// A guard that outlives its stage does nothing.
pub struct TriggerGuard {
    stage: Weak<StageInner>,
    id: TriggerId,
    released: bool,
}

impl TriggerGuard {
    pub fn new(stage: &Stage, id: TriggerId) -> Self {
        Self {
            stage: stage.downgrade(),
            id,
            released: false,
        }
    }

    pub fn id(&self) -> TriggerId {
        self.id
    }

    /// Unregister now. Returns whether the registration was still live.
    pub fn dispose(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        if std::mem::replace(&mut self.released, true) {
            return false;
        }
        self.stage
            .upgrade()
            .is_some_and(|stage| stage.unregister(self.id))
    }
}

impl Drop for TriggerGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for TriggerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerGuard")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}

/// Owns one tween. Dropping the guard cancels it.
pub struct AnimationGuard {
    stage: Weak<StageInner>,
    handle: AnimationHandle,
    released: bool,
}

impl AnimationGuard {
    pub fn new(stage: &Stage, handle: AnimationHandle) -> Self {
        Self {
            stage: stage.downgrade(),
            handle,
            released: false,
        }
    }

    pub fn handle(&self) -> AnimationHandle {
        self.handle
    }

    /// Cancel now. Returns whether the tween was still running.
    pub fn dispose(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        if std::mem::replace(&mut self.released, true) {
            return false;
        }
        self.stage
            .upgrade()
            .is_some_and(|stage| stage.cancel_tween(self.handle))
    }
}

impl Drop for AnimationGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for AnimationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationGuard")
            .field("handle", &self.handle)
            .field("released", &self.released)
            .finish()
    }
}

/// The API a section binds through.
pub struct SectionScope<'a> {
    stage: &'a Stage,
    scope: ScopeId,
    name: &'a str,
    triggers: &'a mut Vec<TriggerGuard>,
    animations: &'a mut Vec<AnimationGuard>,
}

impl SectionScope<'_> {
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn scope_id(&self) -> ScopeId {
        self.scope
    }

    /// Look up one of this section's nodes.
    pub fn node(&self, key: &str) -> Option<NodeId> {
        let node = self.stage.inner().find_node(self.name, key);
        if node.is_none() {
            tracing::debug!(section = self.name, key, "node not rendered, skipping");
        }
        node
    }

    /// Nodes `{prefix}-0`, `{prefix}-1`, ... up to the first missing one.
    pub fn nodes(&self, prefix: &str) -> Vec<NodeId> {
        (0..)
            .map_while(|i: usize| {
                self.stage
                    .inner()
                    .find_node(self.name, &format!("{prefix}-{i}"))
            })
            .collect()
    }

    /// Register a trigger on a node-relative region.
    pub fn trigger(
        &mut self,
        region: RegionSpec,
        mode: TriggerMode,
        callback: TriggerCallback,
    ) -> Option<TriggerId> {
        self.register(region.into(), mode, callback)
    }

    /// Register a trigger on an absolute region.
    pub fn trigger_fixed(
        &mut self,
        region: Region,
        mode: TriggerMode,
        callback: TriggerCallback,
    ) -> Option<TriggerId> {
        self.register(region.into(), mode, callback)
    }

    fn register(
        &mut self,
        placement: crate::trigger::Placement,
        mode: TriggerMode,
        callback: TriggerCallback,
    ) -> Option<TriggerId> {
        let id = self
            .stage
            .inner()
            .register(placement, mode, callback, Some(self.scope))?;
        self.triggers.push(TriggerGuard::new(self.stage, id));
        Some(id)
    }

    /// Start a tween owned by this section. Its clock starts on the next frame.
    pub fn animate(&mut self, tween: Tween) -> Option<AnimationHandle> {
        let handle = self
            .stage
            .inner()
            .start_tween(tween, Some(self.scope), None)?;
        self.animations.push(AnimationGuard::new(self.stage, handle));
        Some(handle)
    }

    /// Write a property immediately (initial states).
    pub fn set(&mut self, node: NodeId, property: Property, value: f64) {
        self.stage.set(node, property, value);
    }

    pub fn viewport_height(&self) -> f64 {
        self.stage.inner().viewport_height()
    }

    /// The stage this section is mounted on.
    pub fn stage(&self) -> Stage {
        self.stage.clone()
    }
}

/// A section bound to a stage. Dropping it unmounts.
pub struct MountedSection {
    stage: Weak<StageInner>,
    section: Box<dyn Section>,
    name: String,
    scope: Option<ScopeId>,
    triggers: Vec<TriggerGuard>,
    animations: Vec<AnimationGuard>,
    transition: Option<SectionState>,
}

impl fmt::Debug for MountedSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountedSection")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("triggers", &self.triggers.len())
            .finish_non_exhaustive()
    }
}

impl MountedSection {
    pub(crate) fn mount(stage: &Stage, section: Box<dyn Section>) -> Self {
        let name = section.name().to_string();
        let mut mounted = Self {
            stage: stage.downgrade(),
            section,
            name,
            scope: None,
            triggers: Vec::new(),
            animations: Vec::new(),
            transition: None,
        };
        mounted.bind(stage);
        mounted
    }

    fn bind(&mut self, stage: &Stage) {
        if stage.is_destroyed() {
            tracing::debug!(section = %self.name, "stage destroyed, not mounting");
            return;
        }
        self.transition = Some(SectionState::Mounting);
        let scope = stage.inner().open_scope(&self.name);
        self.scope = Some(scope);

        let Self {
            section,
            name,
            triggers,
            animations,
            ..
        } = self;
        let mut section_scope = SectionScope {
            stage,
            scope,
            name: name.as_str(),
            triggers,
            animations,
        };
        section.bind(&mut section_scope);

        self.transition = None;
        tracing::debug!(
            section = %self.name,
            ?scope,
            triggers = self.triggers.len(),
            "section mounted"
        );
    }

    /// Release every guard this instance owns.
    fn release(&mut self) {
        let Some(scope) = self.scope.take() else {
            return;
        };
        self.transition = Some(SectionState::Unmounting);
        let stage = self.stage.upgrade();
        if let Some(stage) = &stage {
            // Close first so dispatches still queued this frame are skipped.
            stage.close_scope(scope);
        }
        self.triggers.clear();
        self.animations.clear();
        self.transition = None;
        tracing::debug!(section = %self.name, ?scope, "section unmounted");
    }

    /// Unmount now.
    pub fn unmount(mut self) {
        self.release();
    }

    /// Release everything, then bind again with fresh ids.
    pub fn rebind(&mut self) {
        self.release();
        if let Some(inner) = self.stage.upgrade() {
            let stage = Stage::from_inner(inner);
            self.bind(&stage);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> Option<ScopeId> {
        self.scope
    }

    /// Trigger ids currently owned by this instance.
    pub fn trigger_ids(&self) -> Vec<TriggerId> {
        self.triggers.iter().map(TriggerGuard::id).collect()
    }

    pub fn state(&self) -> SectionState {
        if let Some(transition) = self.transition {
            return transition;
        }
        let (Some(scope), Some(stage)) = (self.scope, self.stage.upgrade()) else {
            return SectionState::Unmounted;
        };
        let busy = self
            .triggers
            .iter()
            .any(|guard| stage.registry_is_active(guard.id()))
            || stage.has_running_tweens(scope);
        if busy {
            SectionState::Animating
        } else {
            SectionState::Idle
        }
    }
}

impl Drop for MountedSection {
    fn drop(&mut self) {
        self.release();
    }
}
