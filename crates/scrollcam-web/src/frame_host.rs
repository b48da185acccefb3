//! `requestAnimationFrame` as a [`FrameHost`].

use std::cell::RefCell;
use std::rc::Rc;

use scrollcam_core::{FrameHandle, FrameHost};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Slot for the per-frame callback. It is filled after the session exists,
/// since the callback needs a handle back to the session.
pub type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

pub struct WindowFrameHost {
    window: web_sys::Window,
    callback: FrameCallback,
}

impl WindowFrameHost {
    pub fn new(window: web_sys::Window, callback: FrameCallback) -> Self {
        Self { window, callback }
    }
}

impl std::fmt::Debug for WindowFrameHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowFrameHost")
            .field("installed", &self.callback.borrow().is_some())
            .finish()
    }
}

impl FrameHost for WindowFrameHost {
    fn request_frame(&mut self) -> FrameHandle {
        let slot = self.callback.borrow();
        let Some(callback) = slot.as_ref() else {
            tracing::warn!("frame requested before the callback was installed");
            return FrameHandle(0);
        };
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(id) => FrameHandle(id),
            Err(err) => {
                tracing::error!(error = ?err, "requestAnimationFrame failed");
                FrameHandle(0)
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Err(err) = self.window.cancel_animation_frame(handle.0) {
            tracing::warn!(error = ?err, "cancelAnimationFrame failed");
        }
    }
}
