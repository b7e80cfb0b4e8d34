//! DOM-backed geometry and effect sink.
//!
//! Nodes are located by element id `"{section}-{key}"` (the section root is
//! `id="{section}"`), falling back to `[data-reel="{section}:{key}"]`. Found
//! elements are interned in a [`NodeTable`] shared by [`DomGeometry`] and
//! [`DomSink`], so a [`NodeId`] means the same element to both.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use web_sys::{Document, HtmlElement, Window};
use wasm_bindgen::JsCast;

use crate::effects::{EffectSink, Property};
use crate::geometry::{Bounds, Geometry, NodeId};
use crate::nav::SECTION_ROOT;

#[derive(Default)]
pub struct NodeTable {
    elements: RefCell<Vec<HtmlElement>>,
    by_key: RefCell<HashMap<(String, String), NodeId>>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn element(&self, node: NodeId) -> Option<HtmlElement> {
        let idx = usize::try_from(node.0).ok()?;
        self.elements.borrow().get(idx).cloned()
    }

    fn lookup(document: &Document, section: &str, key: &str) -> Option<HtmlElement> {
        let id = if key == SECTION_ROOT {
            section.to_string()
        } else {
            format!("{section}-{key}")
        };
        document
            .get_element_by_id(&id)
            .or_else(|| {
                document
                    .query_selector(&format!("[data-reel=\"{section}:{key}\"]"))
                    .ok()
                    .flatten()
            })
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
    }

    /// The interned element, if it is still in the document.
    fn connected(&self, node: NodeId) -> Option<HtmlElement> {
        self.element(node).filter(|el| el.is_connected())
    }

    fn find(&self, document: &Document, section: &str, key: &str) -> Option<NodeId> {
        let cache_key = (section.to_string(), key.to_string());
        let cached = self.by_key.borrow().get(&cache_key).copied();
        if let Some(node) = cached {
            if self.connected(node).is_some() {
                return Some(node);
            }
        }

        let element = Self::lookup(document, section, key)?;
        let mut elements = self.elements.borrow_mut();
        // A re-rendered element takes over its key's slot.
        if let Some(slot) = cached
            .and_then(|node| usize::try_from(node.0).ok())
            .and_then(|idx| elements.get_mut(idx))
        {
            *slot = element;
            return cached;
        }
        let node = NodeId(u32::try_from(elements.len()).ok()?);
        elements.push(element);
        self.by_key.borrow_mut().insert(cache_key, node);
        Some(node)
    }

    /// Number of interned elements.
    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }
}

/// Geometry read from the live document.
pub struct DomGeometry {
    window: Window,
    document: Document,
    table: Rc<NodeTable>,
}

impl DomGeometry {
    pub fn new(window: Window, document: Document, table: Rc<NodeTable>) -> Self {
        Self {
            window,
            document,
            table,
        }
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }
}

impl Geometry for DomGeometry {
    fn find(&self, section: &str, key: &str) -> Option<NodeId> {
        self.table.find(&self.document, section, key)
    }

    fn bounds(&self, node: NodeId) -> Option<Bounds> {
        let element = self.table.connected(node)?;
        let rect = element.get_bounding_client_rect();
        Some(Bounds::new(rect.top() + self.scroll_y(), rect.height()))
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.table.connected(node).is_some()
    }

    fn viewport_height(&self) -> f64 {
        self.window
            .inner_height()
            .ok()
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0)
    }

    fn content_height(&self) -> f64 {
        self.document
            .document_element()
            .map_or(0.0, |root| f64::from(root.scroll_height()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct NodeStyle {
    opacity: f64,
    translate_x: f64,
    translate_y: f64,
    translate_y_percent: f64,
    scale: f64,
    rotate_x: f64,
    blur: f64,
    hue: Option<f64>,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            opacity: Property::Opacity.initial(),
            translate_x: 0.0,
            translate_y: 0.0,
            translate_y_percent: 0.0,
            scale: Property::Scale.initial(),
            rotate_x: 0.0,
            blur: 0.0,
            hue: None,
        }
    }
}

impl NodeStyle {
    fn set(&mut self, property: Property, value: f64) {
        match property {
            Property::Opacity => self.opacity = value.clamp(0.0, 1.0),
            Property::TranslateX => self.translate_x = value,
            Property::TranslateY => self.translate_y = value,
            Property::TranslateYPercent => self.translate_y_percent = value,
            Property::Scale => self.scale = value,
            Property::RotateX => self.rotate_x = value,
            Property::Blur => self.blur = value.max(0.0),
            Property::Hue => self.hue = Some(value),
        }
    }

    fn transform(&self) -> String {
        format!(
            "translate3d({:.3}px, {:.3}px, 0) translateY({:.3}%) scale({:.4}) rotateX({:.3}deg)",
            self.translate_x, self.translate_y, self.translate_y_percent, self.scale, self.rotate_x
        )
    }
}

/// Writes accumulated properties as inline styles once per frame.
pub struct DomSink {
    table: Rc<NodeTable>,
    styles: HashMap<NodeId, NodeStyle>,
    dirty: Vec<NodeId>,
}

impl DomSink {
    pub fn new(table: Rc<NodeTable>) -> Self {
        Self {
            table,
            styles: HashMap::new(),
            dirty: Vec::new(),
        }
    }
}

impl EffectSink for DomSink {
    fn set_property(&mut self, node: NodeId, property: Property, value: f64) {
        self.styles.entry(node).or_default().set(property, value);
        if !self.dirty.contains(&node) {
            self.dirty.push(node);
        }
    }

    fn flush(&mut self) {
        for node in self.dirty.drain(..) {
            // Removed elements get no more writes.
            let (Some(style), Some(element)) = (self.styles.get(&node), self.table.connected(node))
            else {
                continue;
            };
            let css = element.style();
            css.set_property("opacity", &format!("{:.4}", style.opacity)).ok();
            css.set_property("transform", &style.transform()).ok();
            css.set_property("will-change", "transform, opacity").ok();
            if style.blur > 0.0 {
                css.set_property("filter", &format!("blur({:.2}px)", style.blur)).ok();
            } else {
                css.remove_property("filter").ok();
            }
            if let Some(hue) = style.hue {
                css.set_property("--reel-hue", &format!("{hue:.1}")).ok();
            }
        }
    }
}
