//! Visual effect sinks.
//!
//! Scroll-linked animation writes visual properties outside the declarative
//! render path. All such writes go through an [`EffectSink`], so the animation
//! layer never holds DOM references: the browser build writes inline styles,
//! native builds record the writes.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::geometry::NodeId;

/// A visual property the animation layer may set on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    /// `0.0..=1.0`
    Opacity,
    /// Pixels.
    TranslateX,
    /// Pixels.
    TranslateY,
    /// Percent of the node's own height.
    TranslateYPercent,
    /// Uniform scale factor.
    Scale,
    /// Degrees around the X axis.
    RotateX,
    /// Blur radius in pixels.
    Blur,
    /// Accent hue in degrees (section background tint).
    Hue,
}

impl Property {
    /// Value a node has before anything animates it.
    pub fn initial(self) -> f64 {
        match self {
            Self::Opacity | Self::Scale => 1.0,
            Self::TranslateX
            | Self::TranslateY
            | Self::TranslateYPercent
            | Self::RotateX
            | Self::Blur
            | Self::Hue => 0.0,
        }
    }
}

/// Receiver of imperative property writes.
pub trait EffectSink {
    fn set_property(&mut self, node: NodeId, property: Property, value: f64);

    /// Called once at the end of every frame, after all writes.
    fn flush(&mut self) {}
}

/// One recorded write.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyWrite {
    pub node: NodeId,
    pub property: Property,
    pub value: f64,
}

#[derive(Debug, Default)]
struct Recording {
    writes: Vec<PropertyWrite>,
    current: BTreeMap<(NodeId, Property), f64>,
    flushes: u64,
}

/// Sink that records every write. Clones share one recording, so a test can
/// keep a handle after giving the sink to a stage.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    recording: Rc<RefCell<Recording>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest value written to `(node, property)`.
    pub fn value(&self, node: NodeId, property: Property) -> Option<f64> {
        self.recording.borrow().current.get(&(node, property)).copied()
    }

    /// Every write since the last [`take_writes`](Self::take_writes).
    pub fn writes(&self) -> Vec<PropertyWrite> {
        self.recording.borrow().writes.clone()
    }

    /// Drain the write log. Latest values are kept.
    pub fn take_writes(&self) -> Vec<PropertyWrite> {
        std::mem::take(&mut self.recording.borrow_mut().writes)
    }

    /// Writes to `node` still in the log.
    pub fn writes_to(&self, node: NodeId) -> usize {
        self.recording
            .borrow()
            .writes
            .iter()
            .filter(|w| w.node == node)
            .count()
    }

    /// Latest value of every property ever written.
    pub fn snapshot(&self) -> Vec<PropertyWrite> {
        self.recording
            .borrow()
            .current
            .iter()
            .map(|(&(node, property), &value)| PropertyWrite {
                node,
                property,
                value,
            })
            .collect()
    }

    pub fn flush_count(&self) -> u64 {
        self.recording.borrow().flushes
    }
}

impl EffectSink for RecordingSink {
    fn set_property(&mut self, node: NodeId, property: Property, value: f64) {
        let mut recording = self.recording.borrow_mut();
        recording.writes.push(PropertyWrite {
            node,
            property,
            value,
        });
        recording.current.insert((node, property), value);
    }

    fn flush(&mut self) {
        self.recording.borrow_mut().flushes += 1;
    }
}
