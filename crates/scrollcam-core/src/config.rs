//! JSON tour configuration.
//!
//! Angles are written in degrees here and converted to radians when the
//! path is built.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::backoff::Backoff;
use crate::choreographer::FlightOptions;
use crate::error::TourError;
use crate::frame::DEFAULT_MAX_FRAME_DELTA_MS;
use crate::kernel::{EasingType, Vec2};
use crate::mapper::{DEFAULT_VISIBILITY_THRESHOLD, MapperOptions, ScrollMapper, SectionDescriptor};
use crate::path::{Orbit, OrbitAltitude, Path, Waypoint};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitConfig {
    pub radius: f64,
    /// Signed sweep in degrees.
    pub angular_span_deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_angle_deg: Option<f64>,
    #[serde(default)]
    pub altitude: OrbitAltitude,
}

impl OrbitConfig {
    fn to_orbit(&self) -> Orbit {
        Orbit {
            radius: self.radius,
            angular_span: self.angular_span_deg.to_radians(),
            start_angle: self.start_angle_deg.map(f64::to_radians),
            altitude: self.altitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointConfig {
    pub name: String,
    pub position: Vec2,
    /// Defaults to `position`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub look_at: Option<Vec2>,
    #[serde(default)]
    pub altitude: f64,
    pub duration_ms: f64,
    /// Falls back to [`TourConfig::default_easing`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<EasingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbit: Option<OrbitConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub id: String,
    pub order_index: usize,
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f64,
    /// Waypoint the camera flies to when this section becomes active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoint: Option<String>,
}

fn default_visibility_threshold() -> f64 {
    DEFAULT_VISIBILITY_THRESHOLD
}

fn default_true() -> bool {
    true
}

fn default_max_frame_delta_ms() -> f64 {
    DEFAULT_MAX_FRAME_DELTA_MS
}

fn default_flight_duration_ms() -> f64 {
    FlightOptions::default().duration_ms
}

fn default_flight_easing() -> EasingType {
    FlightOptions::default().easing
}

/// Everything a page needs to run a tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourConfig {
    pub waypoints: Vec<WaypointConfig>,
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
    #[serde(default)]
    pub default_easing: EasingType,
    /// Only looping tours are supported; `false` is rejected.
    #[serde(default = "default_true")]
    pub looping: bool,
    #[serde(default)]
    pub exit_dead_band: f64,
    #[serde(default = "default_max_frame_delta_ms")]
    pub max_frame_delta_ms: f64,
    #[serde(default = "default_flight_duration_ms")]
    pub flight_duration_ms: f64,
    #[serde(default = "default_flight_easing")]
    pub flight_easing: EasingType,
    /// Retry schedule for sections whose elements are not mounted yet.
    #[serde(default)]
    pub registration: Backoff,
}

impl TourConfig {
    /// Parses and checks the scalar options. Waypoints and sections are
    /// checked when built.
    pub fn from_json(json: &str) -> Result<Self, TourError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TourError> {
        if !self.looping {
            return Err(TourError::LoopingDisabled);
        }
        if !(self.max_frame_delta_ms.is_finite() && self.max_frame_delta_ms > 0.0) {
            return Err(TourError::InvalidOption {
                name: "max_frame_delta_ms",
                reason: "must be a positive number",
            });
        }
        if !(self.flight_duration_ms.is_finite() && self.flight_duration_ms > 0.0) {
            return Err(TourError::InvalidOption {
                name: "flight_duration_ms",
                reason: "must be a positive number",
            });
        }
        Ok(())
    }

    pub fn build_path(&self) -> Result<Path, TourError> {
        let waypoints = self
            .waypoints
            .iter()
            .map(|w| {
                let mut waypoint =
                    Waypoint::new(w.name.clone(), w.position, w.altitude, w.duration_ms)
                        .with_easing(w.easing.unwrap_or(self.default_easing));
                if let Some(look_at) = w.look_at {
                    waypoint = waypoint.looking_at(look_at);
                }
                if let Some(orbit) = &w.orbit {
                    waypoint = waypoint.with_orbit(orbit.to_orbit());
                }
                waypoint
            })
            .collect();
        Path::new(waypoints)
    }

    pub fn mapper_options(&self) -> MapperOptions {
        MapperOptions {
            exit_dead_band: self.exit_dead_band,
        }
    }

    pub fn build_mapper(&self) -> Result<ScrollMapper, TourError> {
        let descriptors = self
            .sections
            .iter()
            .map(|s| {
                SectionDescriptor::new(s.id.clone(), s.order_index)
                    .with_threshold(s.visibility_threshold)
            })
            .collect();
        ScrollMapper::new(descriptors, self.mapper_options())
    }

    /// Section id to waypoint index, for sections that name a waypoint.
    pub fn section_bindings(&self, path: &Path) -> Result<BTreeMap<String, usize>, TourError> {
        let mut bindings = BTreeMap::new();
        for section in &self.sections {
            let Some(name) = &section.waypoint else {
                continue;
            };
            let index = path
                .index_of(name)
                .ok_or_else(|| TourError::UnknownWaypointBinding {
                    section: section.id.clone(),
                    waypoint: name.clone(),
                })?;
            bindings.insert(section.id.clone(), index);
        }
        Ok(bindings)
    }

    pub fn flight_options(&self) -> FlightOptions {
        FlightOptions {
            duration_ms: self.flight_duration_ms,
            easing: self.flight_easing,
        }
    }
}
