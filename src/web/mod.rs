//! Browser entry point.
//!
//! [`ReelScroll`] wires a [`Stage`] to the page: window listeners feed the
//! smooth-scroll driver, a `requestAnimationFrame` loop runs frames, the
//! driven offset is applied with `window.scrollTo`, and a [`DomSink`] writes
//! inline styles.
//!
//! ```javascript
//! import init, { ReelScroll } from 'reelscroll';
//! await init();
//! const reel = new ReelScroll({ scroll: { lerp: 0.1 } });
//! reel.mountPortfolio();
//! nav.onclick = () => reel.scrollToSection('about');
//! reel.onActiveSection((name) => highlight(name));
//! ```

mod dom;
mod raf;

pub use dom::{DomGeometry, DomSink, NodeTable};
pub use raf::RafLoop;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Function;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Event, EventTarget, TouchEvent, WheelEvent, Window};

use crate::binder::MountedSection;
use crate::config::StageConfig;
use crate::error::ReelError;
use crate::scroll::{ScrollTarget, ScrollToOptions};
use crate::sections;
use crate::stage::Stage;

/// `WheelEvent.deltaMode` values.
const DOM_DELTA_LINE: u32 = 1;
const DOM_DELTA_PAGE: u32 = 2;
const LINE_HEIGHT_PX: f64 = 16.0;

struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: &EventTarget,
        kind: &'static str,
        passive: bool,
        handler: impl FnMut(Event) + 'static,
    ) -> Option<Self> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        let options = AddEventListenerOptions::new();
        options.set_passive(passive);
        target
            .add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                closure.as_ref().unchecked_ref(),
                &options,
            )
            .ok()?;
        Some(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }

    fn detach(&self) {
        self.target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref())
            .ok();
    }
}

/// Smooth scrolling and scroll-linked animation for the portfolio page.
#[wasm_bindgen]
pub struct ReelScroll {
    stage: Stage,
    window: Window,
    raf: RafLoop,
    listeners: Vec<Listener>,
    mounted: Vec<MountedSection>,
    on_active: Rc<RefCell<Option<Function>>>,
    /// Click handler on the scroll indicator, re-attached on each mount.
    indicator_click: Option<Listener>,
}

#[wasm_bindgen]
impl ReelScroll {
    /// `config` is an optional `StageConfig`-shaped object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ReelScroll, JsValue> {
        console_error_panic_hook::set_once();

        let config: StageConfig = if config.is_undefined() || config.is_null() {
            StageConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| ReelError::Js(e.to_string()))?
        };
        config.validate()?;

        let window = web_sys::window().ok_or_else(|| ReelError::Js("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| ReelError::Js("no document".into()))?;

        let table = Rc::new(NodeTable::new());
        let geometry = DomGeometry::new(window.clone(), document, Rc::clone(&table));
        let stage = Stage::new(config, Box::new(geometry), Box::new(DomSink::new(table)));

        // Start from wherever the page already is (reload, anchor link).
        stage.on_native_scroll(window.scroll_y().unwrap_or(0.0));

        {
            let window = window.clone();
            stage.subscribe(move |state| {
                window.scroll_to_with_x_and_y(0.0, state.offset);
            });
        }

        let on_active: Rc<RefCell<Option<Function>>> = Rc::new(RefCell::new(None));
        let raf = {
            let stage = stage.clone();
            let on_active = Rc::clone(&on_active);
            let mut last_active: Option<String> = None;
            RafLoop::new(move |timestamp_ms| {
                if stage.frame(timestamp_ms).is_none() {
                    return;
                }
                let active = stage.active_section();
                if active == last_active {
                    return;
                }
                if let Some(callback) = on_active.borrow().as_ref() {
                    let name = active.as_deref().map_or(JsValue::NULL, JsValue::from_str);
                    if let Err(err) = callback.call1(&JsValue::NULL, &name) {
                        tracing::warn!(?err, "active section callback failed");
                    }
                }
                last_active = active;
            })
        };

        let listeners = Self::attach_listeners(&window, &stage);
        raf.start();
        tracing::debug!(listeners = listeners.len(), "reelscroll started");

        Ok(Self {
            stage,
            window,
            raf,
            listeners,
            mounted: Vec::new(),
            on_active,
            indicator_click: None,
        })
    }

    fn attach_listeners(window: &Window, stage: &Stage) -> Vec<Listener> {
        let target: &EventTarget = window.as_ref();
        let mut listeners = Vec::new();

        {
            let stage = stage.clone();
            let window = window.clone();
            listeners.extend(Listener::attach(target, "wheel", false, move |event| {
                let Some(wheel) = event.dyn_ref::<WheelEvent>() else {
                    return;
                };
                if wheel.ctrl_key() {
                    return; // pinch zoom
                }
                event.prevent_default();
                let scale = match wheel.delta_mode() {
                    DOM_DELTA_LINE => LINE_HEIGHT_PX,
                    DOM_DELTA_PAGE => window
                        .inner_height()
                        .ok()
                        .and_then(|h| h.as_f64())
                        .unwrap_or(800.0),
                    _ => 1.0,
                };
                stage.on_wheel(wheel.delta_y() * scale);
            }));
        }

        let last_touch_y = Rc::new(Cell::new(None::<f64>));
        {
            let last_touch_y = Rc::clone(&last_touch_y);
            listeners.extend(Listener::attach(target, "touchstart", true, move |event| {
                let y = event
                    .dyn_ref::<TouchEvent>()
                    .and_then(|touch| touch.touches().get(0))
                    .map(|touch| f64::from(touch.client_y()));
                last_touch_y.set(y);
            }));
        }
        {
            let stage = stage.clone();
            listeners.extend(Listener::attach(target, "touchmove", false, move |event| {
                let Some(y) = event
                    .dyn_ref::<TouchEvent>()
                    .and_then(|touch| touch.touches().get(0))
                    .map(|touch| f64::from(touch.client_y()))
                else {
                    return;
                };
                if let Some(last) = last_touch_y.replace(Some(y)) {
                    event.prevent_default();
                    stage.on_touch(last - y);
                }
            }));
        }
        {
            let stage = stage.clone();
            let window = window.clone();
            listeners.extend(Listener::attach(target, "scroll", true, move |_| {
                if let Ok(y) = window.scroll_y() {
                    stage.on_native_scroll(y);
                }
            }));
        }
        {
            let stage = stage.clone();
            listeners.extend(Listener::attach(target, "resize", true, move |_| {
                stage.refresh();
            }));
        }

        listeners
    }

    /// Mount every portfolio section found in the document.
    #[wasm_bindgen(js_name = mountPortfolio)]
    pub fn mount_portfolio(&mut self) {
        self.mounted.clear();
        for section in sections::portfolio_sections() {
            self.mounted.push(self.stage.mount(section));
        }
        self.stage.refresh();
        self.attach_indicator_click();
    }

    fn attach_indicator_click(&mut self) {
        if let Some(old) = self.indicator_click.take() {
            old.detach();
        }
        let Some(indicator) = self
            .window
            .document()
            .and_then(|document| document.get_element_by_id("scroll-indicator"))
        else {
            return;
        };
        let target: &EventTarget = indicator.as_ref();
        let stage = self.stage.clone();
        self.indicator_click = Listener::attach(target, "click", true, move |_| {
            stage.scroll_one_screen();
        });
    }

    /// Scroll one viewport down from the top of the page.
    #[wasm_bindgen(js_name = scrollOneScreen)]
    pub fn scroll_one_screen(&self) -> bool {
        self.stage.scroll_one_screen()
    }

    /// Scroll to an offset (number), `"top"`, `"bottom"`, or a section name.
    #[wasm_bindgen(js_name = scrollTo)]
    pub fn scroll_to(&self, target: JsValue, duration_ms: Option<f64>) -> bool {
        let target = if let Some(offset) = target.as_f64() {
            ScrollTarget::Offset(offset)
        } else if let Some(name) = target.as_string() {
            match name.as_str() {
                "top" => ScrollTarget::Top,
                "bottom" => ScrollTarget::Bottom,
                _ => {
                    self.stage.refresh();
                    ScrollTarget::Anchor(name)
                }
            }
        } else {
            return false;
        };
        let options = ScrollToOptions {
            duration_ms,
            ..ScrollToOptions::default()
        };
        self.stage.scroll_to(&target, options)
    }

    #[wasm_bindgen(js_name = scrollToSection)]
    pub fn scroll_to_section(&self, name: &str) -> bool {
        self.stage.scroll_to_section(name)
    }

    /// Name of the section under the nav bar.
    #[wasm_bindgen(js_name = activeSection)]
    pub fn active_section(&self) -> Option<String> {
        self.stage.active_section()
    }

    /// Call `callback(name)` whenever the section under the nav bar changes
    /// (`null` between sections). Replaces any earlier callback.
    #[wasm_bindgen(js_name = onActiveSection)]
    pub fn on_active_section(&self, callback: Option<Function>) {
        *self.on_active.borrow_mut() = callback;
    }

    /// Scroll position as a fraction of the page.
    pub fn progress(&self) -> f64 {
        self.stage.progress()
    }

    /// Re-measure the page after layout changes.
    pub fn refresh(&self) {
        self.stage.refresh();
    }

    /// Frame statistics as a plain object.
    pub fn stats(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.stage.stats())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    /// Stop the frame loop, remove every listener and release all sections.
    pub fn destroy(&mut self) {
        self.raf.stop();
        for listener in self.listeners.drain(..).chain(self.indicator_click.take()) {
            listener.detach();
        }
        self.mounted.clear();
        self.on_active.borrow_mut().take();
        self.stage.destroy();
        // Leave the page where the driver put it.
        if let Some(state) = self.stage.scroll_state() {
            self.window.scroll_to_with_x_and_y(0.0, state.offset);
        }
    }
}

impl Drop for ReelScroll {
    fn drop(&mut self) {
        self.destroy();
    }
}
