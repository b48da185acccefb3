//! Scrollcam Core Library
//!
//! Scroll-synchronized camera choreography for a map-backed page: a looping
//! keyframed camera tour played frame-rate independently, plus a mapper that
//! turns viewport intersection readings into an active section.
//!
//! Everything here is single-threaded and platform independent. The browser
//! bindings live in `scrollcam-web`.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod backoff;
pub mod choreographer;
pub mod completion;
pub mod config;
pub mod error;
pub mod frame;
pub mod kernel;
pub mod mapper;
pub mod path;
pub mod publisher;
pub mod renderer;
pub mod session;

#[cfg(test)]
mod test_utils;

pub use backoff::Backoff;
pub use choreographer::{Choreographer, FlightOptions, PlayState};
pub use completion::{FlightCompletion, FlightOutcome, Settler};
pub use config::{OrbitConfig, SectionConfig, TourConfig, WaypointConfig};
pub use error::{RendererError, TourError};
pub use frame::{DEFAULT_MAX_FRAME_DELTA_MS, FrameDriver, FrameHandle, FrameHost};
pub use kernel::{EasingType, Vec2};
pub use mapper::{IntersectionSample, MapperOptions, ScrollMapper, SectionChange, SectionDescriptor};
pub use path::{Orbit, OrbitAltitude, Path, Pose, Segment, Waypoint};
pub use publisher::{SectionPublisher, SectionSnapshot, Subscription};
pub use renderer::{MapRenderer, PushOutcome, RendererAdapter, RendererStatus};
pub use session::TourSession;
