//! The JavaScript-facing tour handle.

use std::cell::RefCell;
use std::rc::Rc;

use scrollcam_core::{Subscription, TourConfig, TourError, TourSession};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::WebSession;
use crate::deferred::Deferred;
use crate::frame_host::{FrameCallback, WindowFrameHost};
use crate::renderer::{JsMapRenderer, describe};
use crate::sections::SectionRegistrar;
use crate::wire::{SnapshotMessage, outcome_label};

fn to_js(err: &TourError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn busy() -> JsValue {
    JsValue::from_str("tour session is busy; call again outside the frame or listener")
}

/// One page's tour. Create it once the map renderer object exists and
/// call `dispose()` when the page unmounts.
#[wasm_bindgen]
pub struct TourHandle {
    session: Rc<RefCell<WebSession>>,
    deferred: Rc<Deferred>,
    frame_callback: FrameCallback,
    sections: Rc<SectionRegistrar>,
    subscriptions: Vec<(u32, Subscription)>,
    next_subscription: u32,
}

#[wasm_bindgen]
impl TourHandle {
    /// Parses `config_json` and wires the tour to `renderer`, which must
    /// expose `setPose(pose)`. Playback waits for `start()`.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, renderer: JsValue) -> Result<TourHandle, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let config = TourConfig::from_json(config_json).map_err(|e| to_js(&e))?;
        let renderer = JsMapRenderer::new(renderer)?;
        let frame_callback: FrameCallback = Rc::default();
        let host = WindowFrameHost::new(window, Rc::clone(&frame_callback));
        let session = TourSession::from_config(&config, host, renderer).map_err(|e| to_js(&e))?;
        let session = Rc::new(RefCell::new(session));
        let deferred: Rc<Deferred> = Rc::default();

        let weak = Rc::downgrade(&session);
        let on_frame_deferred = Rc::clone(&deferred);
        *frame_callback.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
            let Some(session) = weak.upgrade() else {
                return;
            };
            match session.try_borrow_mut() {
                Ok(mut session) => {
                    session.on_frame(timestamp);
                    on_frame_deferred.apply(&mut session);
                }
                Err(_) => tracing::warn!("tour session busy, skipping frame"),
            }
        }));

        let sections = SectionRegistrar::new(
            document,
            Rc::downgrade(&session),
            Rc::clone(&deferred),
            config.registration,
        )?;

        Ok(Self {
            session,
            deferred,
            frame_callback,
            sections,
            subscriptions: Vec::new(),
            next_subscription: 0,
        })
    }

    pub fn start(&self) -> Result<(), JsValue> {
        self.session.try_borrow_mut().map_err(|_| busy())?.start();
        Ok(())
    }

    /// Pauses now, or right after the running frame or listener returns.
    pub fn pause(&self) {
        match self.session.try_borrow_mut() {
            Ok(mut session) => session.pause(),
            Err(_) => self.deferred.request_pause(),
        }
    }

    /// Observes the element with DOM id `element_id` as section `section_id`.
    #[wasm_bindgen(js_name = registerSection)]
    pub fn register_section(&self, section_id: &str, element_id: &str) -> Result<(), JsValue> {
        let session = self.session.try_borrow().map_err(|_| busy())?;
        if session.mapper().section(section_id).is_none() {
            return Err(to_js(&TourError::UnknownSection(section_id.to_string())));
        }
        drop(session);
        self.sections.register(section_id, element_id);
        Ok(())
    }

    /// The renderer's `onReady` signal.
    #[wasm_bindgen(js_name = rendererReady)]
    pub fn renderer_ready(&self) -> Result<(), JsValue> {
        self.session
            .try_borrow_mut()
            .map_err(|_| busy())?
            .renderer_ready();
        Ok(())
    }

    /// The renderer's `onError` signal.
    #[wasm_bindgen(js_name = rendererFailed)]
    pub fn renderer_failed(&self, error: JsValue) -> Result<(), JsValue> {
        self.session
            .try_borrow_mut()
            .map_err(|_| busy())?
            .renderer_failed(describe(&error));
        Ok(())
    }

    /// Calls `listener(snapshot)` after every section update. Returns an id
    /// for `unsubscribe`.
    pub fn subscribe(&mut self, listener: js_sys::Function) -> Result<u32, JsValue> {
        let subscription = self
            .session
            .try_borrow()
            .map_err(|_| busy())?
            .subscribe(move |snapshot| {
                let message = SnapshotMessage::from(snapshot)
                    .serialize(&serde_wasm_bindgen::Serializer::json_compatible());
                let result = message
                    .map_err(JsValue::from)
                    .and_then(|value| listener.call1(&JsValue::NULL, &value));
                if let Err(err) = result {
                    tracing::warn!(error = %describe(&err), "section listener threw");
                }
            });
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscriptions.push((id, subscription));
        Ok(id)
    }

    pub fn unsubscribe(&mut self, id: u32) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|(sub, _)| *sub != id);
        self.subscriptions.len() != before
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let snapshot = self.session.try_borrow().map_err(|_| busy())?.snapshot();
        SnapshotMessage::from(&snapshot)
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(JsValue::from)
    }

    /// Flies to the waypoint bound to `section_id`. The promise resolves
    /// with `"arrived"`, `"superseded"`, `"renderer_failed"` or `"dropped"`,
    /// or with `null` when the section has no waypoint.
    #[wasm_bindgen(js_name = flyTo)]
    pub fn fly_to(&self, section_id: &str) -> Result<js_sys::Promise, JsValue> {
        let completion = self
            .session
            .try_borrow_mut()
            .map_err(|_| busy())?
            .fly_to_section(section_id)
            .map_err(|e| to_js(&e))?;
        Ok(wasm_bindgen_futures::future_to_promise(async move {
            match completion {
                Some(completion) => Ok(JsValue::from_str(outcome_label(&completion.await))),
                None => Ok(JsValue::NULL),
            }
        }))
    }

    #[wasm_bindgen(getter, js_name = isDisposed)]
    pub fn is_disposed(&self) -> bool {
        self.deferred.is_dispose_requested()
            || self
                .session
                .try_borrow()
                .is_ok_and(|session| session.is_disposed())
    }

    /// Tears the tour down. Safe to call more than once, including from
    /// `setPose` or a section listener, where the session itself is
    /// disposed as soon as that callback returns.
    pub fn dispose(&mut self) {
        match self.session.try_borrow_mut() {
            Ok(mut session) => {
                session.dispose();
                drop(session);
                // No frame callback is running while the borrow is free.
                self.frame_callback.borrow_mut().take();
            }
            Err(_) => self.deferred.request_dispose(),
        }
        self.sections.disconnect();
        self.subscriptions.clear();
    }
}
