//! `IntersectionObserver` binding for content sections.
//!
//! Sections are often registered before their elements mount, so a lookup
//! that misses is retried on the configured backoff schedule.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use gloo::timers::future::TimeoutFuture;
use js_sys::Array;
use scrollcam_core::{Backoff, IntersectionSample};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::WebSession;
use crate::deferred::Deferred;
use crate::wire::observer_thresholds;

type IntersectCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;

pub struct SectionRegistrar {
    document: web_sys::Document,
    observer: IntersectionObserver,
    _on_intersect: IntersectCallback,
    /// Element DOM id to section id.
    targets: Rc<RefCell<BTreeMap<String, String>>>,
    backoff: Backoff,
    disconnected: Cell<bool>,
}

impl SectionRegistrar {
    pub fn new(
        document: web_sys::Document,
        session: Weak<RefCell<WebSession>>,
        deferred: Rc<Deferred>,
        backoff: Backoff,
    ) -> Result<Rc<Self>, JsValue> {
        let targets: Rc<RefCell<BTreeMap<String, String>>> = Rc::default();
        let on_intersect = {
            let targets = Rc::clone(&targets);
            IntersectCallback::new(move |entries: Array, _observer: IntersectionObserver| {
                let Some(session) = session.upgrade() else {
                    return;
                };
                let samples = collect_samples(&entries, &targets.borrow());
                let Ok(mut session) = session.try_borrow_mut() else {
                    tracing::warn!(
                        entries = samples.len(),
                        "tour session busy, dropping intersection update"
                    );
                    return;
                };
                if let Err(err) = session.observe_batch(samples) {
                    tracing::warn!(error = %err, "intersection update rejected");
                }
                deferred.apply(&mut session);
            })
        };

        let options = IntersectionObserverInit::new();
        let thresholds: Array = observer_thresholds()
            .into_iter()
            .map(JsValue::from_f64)
            .collect();
        options.set_threshold(&thresholds);
        let observer = IntersectionObserver::new_with_options(
            on_intersect.as_ref().unchecked_ref(),
            &options,
        )?;

        Ok(Rc::new(Self {
            document,
            observer,
            _on_intersect: on_intersect,
            targets,
            backoff,
            disconnected: Cell::new(false),
        }))
    }

    /// Starts observing `element_id` on behalf of `section_id`, retrying in
    /// the background until the element exists or the budget runs out.
    pub fn register(self: &Rc<Self>, section_id: &str, element_id: &str) {
        if self.try_attach(section_id, element_id) {
            return;
        }
        let registrar = Rc::downgrade(self);
        let backoff = self.backoff;
        let section_id = section_id.to_string();
        let element_id = element_id.to_string();
        tracing::debug!(
            section = %section_id,
            element = %element_id,
            "element not mounted, retrying"
        );

        wasm_bindgen_futures::spawn_local(async move {
            for delay in backoff.delays() {
                TimeoutFuture::new(delay).await;
                let Some(registrar) = registrar.upgrade() else {
                    return;
                };
                if registrar.disconnected.get() || registrar.try_attach(&section_id, &element_id) {
                    return;
                }
            }
            tracing::warn!(
                section = %section_id,
                element = %element_id,
                budget_ms = backoff.budget_ms(),
                "section element never mounted, giving up"
            );
        });
    }

    fn try_attach(&self, section_id: &str, element_id: &str) -> bool {
        let Some(element) = self.document.get_element_by_id(element_id) else {
            return false;
        };
        self.targets
            .borrow_mut()
            .insert(element_id.to_string(), section_id.to_string());
        self.observer.observe(&element);
        tracing::debug!(section = %section_id, element = %element_id, "section observed");
        true
    }

    pub fn observed_count(&self) -> usize {
        self.targets.borrow().len()
    }

    /// Stops observing and abandons pending retries.
    pub fn disconnect(&self) {
        if self.disconnected.replace(true) {
            return;
        }
        self.observer.disconnect();
        self.targets.borrow_mut().clear();
    }
}

impl Drop for SectionRegistrar {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn collect_samples(
    entries: &Array,
    targets: &BTreeMap<String, String>,
) -> Vec<(String, IntersectionSample)> {
    entries
        .iter()
        .filter_map(|entry| {
            let entry: IntersectionObserverEntry = entry.dyn_into().ok()?;
            let section = targets.get(&entry.target().id())?.clone();
            Some((
                section,
                IntersectionSample {
                    ratio: Some(entry.intersection_ratio()),
                    is_intersecting: entry.is_intersecting(),
                },
            ))
        })
        .collect()
}
