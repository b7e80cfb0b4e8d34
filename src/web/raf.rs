//! `requestAnimationFrame` loop.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

// Global bindings; avoids fetching the Window object every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

type RafClosure = Closure<dyn FnMut(f64)>;

struct RafInner {
    /// Registered with `requestAnimationFrame`; re-registers itself.
    closure: RefCell<Option<RafClosure>>,
    callback: RefCell<Box<dyn FnMut(f64)>>,
    running: Cell<bool>,
    raf_id: Cell<i32>,
    frames: Cell<u64>,
}

/// Calls a callback with the frame timestamp (ms) once per animation frame
/// until stopped or dropped.
pub struct RafLoop {
    inner: Rc<RafInner>,
}

impl RafLoop {
    /// Not running until [`start`](Self::start).
    pub fn new(callback: impl FnMut(f64) + 'static) -> Self {
        Self {
            inner: Rc::new(RafInner {
                closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                running: Cell::new(false),
                raf_id: Cell::new(0),
                frames: Cell::new(0),
            }),
        }
    }

    /// No-op when already running.
    pub fn start(&self) {
        if self.inner.running.replace(true) {
            return;
        }

        let inner = Rc::clone(&self.inner);
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            if !inner.running.get() {
                return;
            }
            inner.frames.set(inner.frames.get() + 1);

            if let Ok(mut callback) = inner.callback.try_borrow_mut() {
                (&mut *callback)(timestamp_ms);
            }

            if inner.running.get() {
                if let Some(closure) = inner.closure.borrow().as_ref() {
                    inner
                        .raf_id
                        .set(request_animation_frame(closure.as_ref().unchecked_ref()));
                }
            }
        }) as Box<dyn FnMut(f64)>);

        let id = request_animation_frame(closure.as_ref().unchecked_ref());
        self.inner.raf_id.set(id);
        *self.inner.closure.borrow_mut() = Some(closure);
    }

    /// Cancel the pending frame. The loop can be started again.
    pub fn stop(&self) {
        if !self.inner.running.replace(false) {
            return;
        }
        cancel_animation_frame(self.inner.raf_id.get());
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }
}

impl Drop for RafLoop {
    fn drop(&mut self) {
        self.stop();
        // The closure holds an Rc to the inner state; drop it to break the cycle.
        self.inner.closure.borrow_mut().take();
    }
}

impl fmt::Debug for RafLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RafLoop")
            .field("running", &self.inner.running.get())
            .field("frames", &self.inner.frames.get())
            .finish()
    }
}
