//! Bridge to a JavaScript map renderer exposing `setPose`.

use js_sys::{Function, Reflect};
use scrollcam_core::{MapRenderer, Pose, RendererError};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::wire::PoseMessage;

/// Calls `target.setPose({ position, lookAt, altitude })` for every pose.
#[derive(Debug)]
pub struct JsMapRenderer {
    target: JsValue,
    set_pose: Function,
}

impl JsMapRenderer {
    pub fn new(target: JsValue) -> Result<Self, JsValue> {
        let set_pose = Reflect::get(&target, &JsValue::from_str("setPose"))?
            .dyn_into::<Function>()
            .map_err(|_| JsValue::from_str("map renderer has no setPose function"))?;
        Ok(Self { target, set_pose })
    }
}

impl MapRenderer for JsMapRenderer {
    fn set_pose(&mut self, pose: &Pose) -> Result<(), RendererError> {
        let arg = PoseMessage::from(pose)
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|err| RendererError::Failed(err.to_string()))?;
        self.set_pose
            .call1(&self.target, &arg)
            .map(|_| ())
            .map_err(|err| RendererError::Rejected(describe(&err)))
    }
}

/// Best-effort text for a thrown JS value.
pub fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{value:?}")
}
