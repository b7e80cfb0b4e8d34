//! Element geometry queries.
//!
//! The animation layer never touches the DOM directly. Node lookup and
//! bounding-box queries go through [`Geometry`]; the browser build implements
//! it over `getBoundingClientRect`, native builds use [`StaticLayout`].

use serde::{Deserialize, Serialize};

/// Opaque handle to a page node (a DOM element in the browser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Vertical extent of a node in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Distance from the document top to the node's top edge.
    pub top: f64,
    /// Node height in pixels.
    pub height: f64,
}

impl Bounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self {
            top,
            height: height.max(0.0),
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Node lookup and bounding-geometry queries.
///
/// Nodes are addressed by `(section, key)`, e.g. `("about", "word-3")`.
/// Every query may fail because the node is not rendered yet or was already
/// removed; callers treat `None` as "skip", never as an error.
pub trait Geometry {
    /// Find a node by section name and key.
    fn find(&self, section: &str, key: &str) -> Option<NodeId>;

    /// Document-space bounds of a node, if it is still attached.
    fn bounds(&self, node: NodeId) -> Option<Bounds>;

    /// Whether the node is still on the page. Tweens and writes stop for
    /// nodes that are not.
    fn is_attached(&self, node: NodeId) -> bool {
        self.bounds(node).is_some()
    }

    /// Height of the visible viewport.
    fn viewport_height(&self) -> f64;

    /// Total scrollable document height.
    fn content_height(&self) -> f64;

    /// Largest valid scroll offset.
    fn scroll_limit(&self) -> f64 {
        (self.content_height() - self.viewport_height()).max(0.0)
    }
}

/// One node of a [`StaticLayout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticNode {
    pub section: String,
    pub key: String,
    pub top: f64,
    pub height: f64,
    #[serde(default = "attached_default")]
    pub attached: bool,
}

fn attached_default() -> bool {
    true
}

/// A fixed page layout for native runs: tests, the replay CLI, benches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticLayout {
    pub viewport_height: f64,
    #[serde(default)]
    pub nodes: Vec<StaticNode>,
}

impl Default for StaticLayout {
    fn default() -> Self {
        Self::new(800.0)
    }
}

impl StaticLayout {
    pub fn new(viewport_height: f64) -> Self {
        Self {
            viewport_height,
            nodes: Vec::new(),
        }
    }

    /// Add a node and return its handle.
    pub fn add(&mut self, section: &str, key: &str, top: f64, height: f64) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(StaticNode {
            section: section.to_string(),
            key: key.to_string(),
            top,
            height: height.max(0.0),
            attached: true,
        });
        id
    }

    /// Builder form of [`add`](Self::add).
    #[must_use]
    pub fn with(mut self, section: &str, key: &str, top: f64, height: f64) -> Self {
        self.add(section, key, top, height);
        self
    }

    /// Mark a node as removed from the page.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(entry) = self.entry_mut(node) {
            entry.attached = false;
        }
    }

    /// Move or resize a node.
    pub fn set_bounds(&mut self, node: NodeId, top: f64, height: f64) {
        if let Some(entry) = self.entry_mut(node) {
            entry.top = top;
            entry.height = height.max(0.0);
        }
    }

    fn entry(&self, node: NodeId) -> Option<&StaticNode> {
        usize::try_from(node.0)
            .ok()
            .and_then(|idx| self.nodes.get(idx))
    }

    fn entry_mut(&mut self, node: NodeId) -> Option<&mut StaticNode> {
        usize::try_from(node.0)
            .ok()
            .and_then(|idx| self.nodes.get_mut(idx))
    }
}

impl Geometry for StaticLayout {
    fn find(&self, section: &str, key: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.attached && n.section == section && n.key == key)
            .and_then(|idx| u32::try_from(idx).ok())
            .map(NodeId)
    }

    fn bounds(&self, node: NodeId) -> Option<Bounds> {
        self.entry(node)
            .filter(|n| n.attached)
            .map(|n| Bounds::new(n.top, n.height))
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn content_height(&self) -> f64 {
        self.nodes
            .iter()
            .filter(|n| n.attached)
            .map(|n| n.top + n.height)
            .fold(self.viewport_height, f64::max)
    }
}
