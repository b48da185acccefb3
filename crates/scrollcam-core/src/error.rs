//! Error types for tour configuration and renderer plumbing.

/// Errors raised while building or driving a tour.
///
/// Everything except [`TourError::NonFinitePose`] and
/// [`TourError::UnknownSection`] is a configuration error and surfaces
/// before playback starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TourError {
    #[error("tour path needs at least one waypoint")]
    EmptyPath,
    #[error("waypoint `{name}`: duration must be positive, got {duration_ms}ms")]
    NonPositiveDuration { name: String, duration_ms: f64 },
    #[error("waypoint `{name}`: altitude must be non-negative, got {altitude}")]
    NegativeAltitude { name: String, altitude: f64 },
    #[error("waypoint `{name}`: {field} is not a finite number")]
    NonFiniteWaypoint { name: String, field: &'static str },
    #[error("waypoint `{name}`: invalid orbit ({reason})")]
    InvalidOrbit { name: String, reason: &'static str },
    #[error("waypoint index {index} is out of range for a path of {len}")]
    WaypointOutOfRange { index: usize, len: usize },
    #[error("duplicate section id `{0}`")]
    DuplicateSection(String),
    #[error("section order indices must be unique and contiguous from 0, missing {0}")]
    SectionOrderGap(usize),
    #[error("section `{id}`: visibility threshold must be in (0, 1], got {threshold}")]
    InvalidThreshold { id: String, threshold: f64 },
    #[error(
        "section `{id}`: visibility threshold {threshold} \
         must exceed the exit dead band {exit_dead_band}"
    )]
    DeadBandExceedsThreshold {
        id: String,
        threshold: f64,
        exit_dead_band: f64,
    },
    #[error("section `{section}` is bound to unknown waypoint `{waypoint}`")]
    UnknownWaypointBinding { section: String, waypoint: String },
    #[error("non-looping tours are not supported")]
    LoopingDisabled,
    #[error("invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: &'static str },
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("unknown section `{0}`")]
    UnknownSection(String),
    #[error("intersection ratio for section `{0}` is not a number")]
    NonFiniteRatio(String),
    #[error("computed pose has a non-finite {0}")]
    NonFinitePose(&'static str),
}

impl From<serde_json::Error> for TourError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Errors reported by the map renderer boundary.
///
/// None of these halt the frame loop; the adapter logs them and the camera
/// holds its last pose.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RendererError {
    #[error("map renderer is not ready")]
    NotReady,
    #[error("map renderer rejected pose: {0}")]
    Rejected(String),
    #[error("map renderer failed: {0}")]
    Failed(String),
}
