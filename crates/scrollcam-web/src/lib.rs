//! Scrollcam Web
//!
//! Browser bindings for `scrollcam-core`: frames come from
//! `requestAnimationFrame`, section visibility from `IntersectionObserver`,
//! and poses go to a JavaScript map renderer.
//!
//! Everything except [`wire`] only builds for `wasm32`.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod wire;

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
mod deferred;

#[cfg(target_arch = "wasm32")]
mod frame_host;
#[cfg(target_arch = "wasm32")]
mod handle;
#[cfg(target_arch = "wasm32")]
mod logging;
#[cfg(target_arch = "wasm32")]
mod renderer;
#[cfg(target_arch = "wasm32")]
mod sections;

#[cfg(target_arch = "wasm32")]
pub use frame_host::WindowFrameHost;
#[cfg(target_arch = "wasm32")]
pub use handle::TourHandle;
#[cfg(target_arch = "wasm32")]
pub use logging::{DEFAULT_FILTER, init as init_logging};
#[cfg(target_arch = "wasm32")]
pub use renderer::JsMapRenderer;

#[cfg(target_arch = "wasm32")]
type WebSession = scrollcam_core::TourSession<WindowFrameHost, JsMapRenderer>;
