//! Trigger regions and their resolution against page geometry.

use serde::{Deserialize, Serialize};

use super::anchor::Anchor;
use crate::geometry::{Geometry, NodeId};

/// An absolute scroll range `[start, end]`, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub start: f64,
    pub end: f64,
}

/// Where the scroll position is relative to a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Before,
    Active,
    After,
}

impl Region {
    /// A region between two absolute offsets. An inverted range collapses to
    /// zero height at `start`.
    pub fn fixed(start: f64, end: f64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn height(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.height() <= 0.0
    }

    pub fn phase_of(&self, offset: f64) -> Phase {
        if offset < self.start {
            Phase::Before
        } else if offset > self.end {
            Phase::After
        } else {
            Phase::Active
        }
    }

    /// How far `offset` has moved through the region, clamped to `[0, 1]`.
    ///
    /// Exactly `1.0` at `end`. A zero-height region reports `0.0` before its
    /// start and `1.0` from it on.
    pub fn progress_at(&self, offset: f64) -> f64 {
        if offset >= self.end {
            return 1.0;
        }
        if offset <= self.start || self.is_empty() {
            return 0.0;
        }
        ((offset - self.start) / self.height()).clamp(0.0, 1.0)
    }
}

/// A region defined relative to a page node, re-resolved on refresh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionSpec {
    pub target: NodeId,
    pub start: Anchor,
    pub end: Anchor,
}

impl RegionSpec {
    pub fn new(target: NodeId, start: Anchor, end: Anchor) -> Self {
        Self { target, start, end }
    }

    /// From `start` until the element has left through the viewport top.
    pub fn from_start(target: NodeId, start: Anchor) -> Self {
        Self::new(target, start, Anchor::BOTTOM_TOP)
    }

    /// Resolve against current geometry. `None` when the target is gone.
    pub fn resolve(&self, geometry: &dyn Geometry) -> Option<Region> {
        let bounds = geometry.bounds(self.target)?;
        let viewport = geometry.viewport_height();
        Some(Region::fixed(
            self.start.resolve(bounds, viewport),
            self.end.resolve(bounds, viewport),
        ))
    }
}

/// How a registration's region is defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Fixed(Region),
    Spec(RegionSpec),
}

impl From<Region> for Placement {
    fn from(region: Region) -> Self {
        Self::Fixed(region)
    }
}

impl From<RegionSpec> for Placement {
    fn from(spec: RegionSpec) -> Self {
        Self::Spec(spec)
    }
}

impl Placement {
    pub(crate) fn resolve(&self, geometry: Option<&dyn Geometry>) -> Option<Region> {
        match self {
            Self::Fixed(region) => Some(*region),
            Self::Spec(spec) => geometry.and_then(|g| spec.resolve(g)),
        }
    }

    /// The node this placement follows, if any.
    pub fn target(&self) -> Option<NodeId> {
        match self {
            Self::Fixed(_) => None,
            Self::Spec(spec) => Some(spec.target),
        }
    }
}
