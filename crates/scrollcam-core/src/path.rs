//! Waypoint path model: the immutable, cyclic camera tour.

use serde::{Deserialize, Serialize};

use crate::error::TourError;
use crate::kernel::{EasingType, Vec2, lerp, lerp_vec2};

/// The camera's instantaneous position, look-at target and altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub look_at: Vec2,
    pub altitude: f64,
}

impl Pose {
    pub fn new(position: Vec2, look_at: Vec2, altitude: f64) -> Self {
        Self {
            position,
            look_at,
            altitude,
        }
    }

    /// Rejects poses the renderer must never see.
    pub fn validate(&self) -> Result<(), TourError> {
        if !self.position.iter().all(|v| v.is_finite()) {
            return Err(TourError::NonFinitePose("position"));
        }
        if !self.look_at.iter().all(|v| v.is_finite()) {
            return Err(TourError::NonFinitePose("look_at"));
        }
        if !self.altitude.is_finite() {
            return Err(TourError::NonFinitePose("altitude"));
        }
        Ok(())
    }

    /// Interpolates every component of two poses with the same factor.
    pub fn lerp(&self, other: &Pose, t: f64) -> Pose {
        Pose {
            position: lerp_vec2(self.position, other.position, t),
            look_at: lerp_vec2(self.look_at, other.look_at, t),
            altitude: lerp(self.altitude, other.altitude, t),
        }
    }
}

/// How altitude behaves while sweeping an orbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrbitAltitude {
    /// Keep the orbiting waypoint's altitude for the whole sweep.
    #[default]
    Hold,
    /// Blend toward the next waypoint's altitude.
    Lerp,
}

/// Sweep around the waypoint's look-at point instead of translating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    pub radius: f64,
    /// Signed sweep in radians.
    pub angular_span: f64,
    /// Starting bearing in radians. `None` uses the bearing of the
    /// waypoint's position as seen from its look-at point.
    pub start_angle: Option<f64>,
    pub altitude: OrbitAltitude,
}

/// One stop on the camera tour.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub name: String,
    pub position: Vec2,
    pub look_at: Vec2,
    pub altitude: f64,
    pub orbit: Option<Orbit>,
    /// Time budget of the segment that leaves this waypoint.
    pub duration_ms: f64,
    /// Easing of the segment that leaves this waypoint.
    pub easing: EasingType,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, position: Vec2, altitude: f64, duration_ms: f64) -> Self {
        Self {
            name: name.into(),
            position,
            look_at: position,
            altitude,
            orbit: None,
            duration_ms,
            easing: EasingType::default(),
        }
    }

    #[must_use]
    pub fn looking_at(mut self, look_at: Vec2) -> Self {
        self.look_at = look_at;
        self
    }

    #[must_use]
    pub fn with_easing(mut self, easing: EasingType) -> Self {
        self.easing = easing;
        self
    }

    #[must_use]
    pub fn with_orbit(mut self, orbit: Orbit) -> Self {
        self.orbit = Some(orbit);
        self
    }

    /// The camera pose resting at this waypoint.
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.look_at, self.altitude)
    }

    /// Where an orbit sweep leaves the camera, if this waypoint orbits.
    pub fn sweep_end(&self) -> Option<Vec2> {
        self.orbit.as_ref().map(|orbit| {
            let angle = self.orbit_start_angle(orbit) + orbit.angular_span;
            orbit_point(self.look_at, orbit.radius, angle)
        })
    }

    pub(crate) fn orbit_start_angle(&self, orbit: &Orbit) -> f64 {
        orbit.start_angle.unwrap_or_else(|| {
            let dx = self.position[0] - self.look_at[0];
            let dy = self.position[1] - self.look_at[1];
            if dx == 0.0 && dy == 0.0 {
                0.0
            } else {
                dy.atan2(dx)
            }
        })
    }

    fn validate(&self) -> Result<(), TourError> {
        let non_finite = |field| TourError::NonFiniteWaypoint {
            name: self.name.clone(),
            field,
        };
        if !self.position.iter().all(|v| v.is_finite()) {
            return Err(non_finite("position"));
        }
        if !self.look_at.iter().all(|v| v.is_finite()) {
            return Err(non_finite("look_at"));
        }
        if !self.altitude.is_finite() {
            return Err(non_finite("altitude"));
        }
        if !self.duration_ms.is_finite() {
            return Err(non_finite("duration_ms"));
        }
        if self.duration_ms <= 0.0 {
            return Err(TourError::NonPositiveDuration {
                name: self.name.clone(),
                duration_ms: self.duration_ms,
            });
        }
        if self.altitude < 0.0 {
            return Err(TourError::NegativeAltitude {
                name: self.name.clone(),
                altitude: self.altitude,
            });
        }
        if let Some(orbit) = &self.orbit {
            let invalid = |reason| TourError::InvalidOrbit {
                name: self.name.clone(),
                reason,
            };
            if !orbit.radius.is_finite() || orbit.radius <= 0.0 {
                return Err(invalid("radius must be positive and finite"));
            }
            if !orbit.angular_span.is_finite() {
                return Err(invalid("angular span must be finite"));
            }
            if orbit.start_angle.is_some_and(|a| !a.is_finite()) {
                return Err(invalid("start angle must be finite"));
            }
        }
        Ok(())
    }
}

pub(crate) fn orbit_point(center: Vec2, radius: f64, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    [center[0] + radius * cos, center[1] + radius * sin]
}

// An orbit segment never translates toward its `to` waypoint, so the next
// segment starts wherever that waypoint is placed.
fn warn_on_sweep_gaps(waypoints: &[Waypoint]) {
    let len = waypoints.len();
    for (i, waypoint) in waypoints.iter().enumerate() {
        let (Some(end), Some(orbit)) = (waypoint.sweep_end(), waypoint.orbit.as_ref()) else {
            continue;
        };
        let next = &waypoints[(i + 1) % len];
        let gap = (end[0] - next.position[0]).hypot(end[1] - next.position[1]);
        if gap > orbit.radius * 0.01 {
            tracing::warn!(
                waypoint = %waypoint.name,
                next = %next.name,
                gap,
                "orbit sweep ends away from the next waypoint, the camera will jump"
            );
        }
    }
}

/// The interval between two consecutive waypoints.
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    pub index: usize,
    pub from: &'a Waypoint,
    pub to: &'a Waypoint,
}

impl Segment<'_> {
    pub fn duration_ms(&self) -> f64 {
        self.from.duration_ms
    }

    pub fn easing(&self) -> EasingType {
        self.from.easing
    }

    pub fn is_orbit(&self) -> bool {
        self.from.orbit.is_some()
    }

    /// Pose at eased progress `e` through this segment.
    pub fn pose_at(&self, e: f64) -> Pose {
        match &self.from.orbit {
            Some(orbit) => {
                let center = self.from.look_at;
                let angle = self.from.orbit_start_angle(orbit) + e * orbit.angular_span;
                let altitude = match orbit.altitude {
                    OrbitAltitude::Hold => self.from.altitude,
                    OrbitAltitude::Lerp => lerp(self.from.altitude, self.to.altitude, e),
                };
                Pose::new(orbit_point(center, orbit.radius, angle), center, altitude)
            }
            None => self.from.pose().lerp(&self.to.pose(), e),
        }
    }
}

/// Ordered, non-empty, cyclic sequence of waypoints.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    waypoints: Vec<Waypoint>,
    total_duration_ms: f64,
}

impl Path {
    pub fn new(waypoints: Vec<Waypoint>) -> Result<Self, TourError> {
        if waypoints.is_empty() {
            return Err(TourError::EmptyPath);
        }
        for waypoint in &waypoints {
            waypoint.validate()?;
        }
        warn_on_sweep_gaps(&waypoints);
        let total_duration_ms = waypoints.iter().map(|w| w.duration_ms).sum();
        Ok(Self {
            waypoints,
            total_duration_ms,
        })
    }

    /// Number of segments; one per waypoint since traversal wraps.
    pub fn segment_count(&self) -> usize {
        self.waypoints.len()
    }

    /// Segment `index` runs from waypoint `index` to waypoint `index + 1`,
    /// both taken modulo the path length.
    pub fn segment_at(&self, index: usize) -> Segment<'_> {
        let len = self.waypoints.len();
        let index = index % len;
        Segment {
            index,
            from: &self.waypoints[index],
            to: &self.waypoints[(index + 1) % len],
        }
    }

    pub fn total_duration_ms(&self) -> f64 {
        self.total_duration_ms
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn waypoint(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// A single-waypoint tour has nothing to interpolate between.
    pub fn is_degenerate(&self) -> bool {
        self.waypoints.len() == 1
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.waypoints.iter().position(|w| w.name == name)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    fn three_stops() -> Path {
        Path::new(vec![
            Waypoint::new("a", [0.0, 0.0], 100.0, 1000.0),
            Waypoint::new("b", [10.0, 0.0], 200.0, 2000.0),
            Waypoint::new("c", [10.0, 10.0], 300.0, 1000.0),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_empty_path() {
        assert_eq!(Path::new(Vec::new()), Err(TourError::EmptyPath));
    }

    #[test]
    fn rejects_bad_waypoints() {
        let zero = Path::new(vec![Waypoint::new("z", [0.0, 0.0], 0.0, 0.0)]);
        assert!(matches!(zero, Err(TourError::NonPositiveDuration { .. })));

        let below = Path::new(vec![Waypoint::new("b", [0.0, 0.0], -1.0, 10.0)]);
        assert!(matches!(below, Err(TourError::NegativeAltitude { .. })));

        let nan = Path::new(vec![Waypoint::new("n", [f64::NAN, 0.0], 0.0, 10.0)]);
        assert!(matches!(
            nan,
            Err(TourError::NonFiniteWaypoint {
                field: "position",
                ..
            })
        ));

        let orbit = Path::new(vec![Waypoint::new("o", [0.0, 0.0], 0.0, 10.0).with_orbit(
            Orbit {
                radius: 0.0,
                angular_span: PI,
                start_angle: None,
                altitude: OrbitAltitude::Hold,
            },
        )]);
        assert!(matches!(orbit, Err(TourError::InvalidOrbit { .. })));
    }

    #[test]
    fn segments_wrap_and_sum() {
        let path = three_stops();
        assert_eq!(path.segment_count(), 3);
        assert_eq!(path.total_duration_ms(), 4000.0);

        let last = path.segment_at(2);
        assert_eq!(last.from.name, "c");
        assert_eq!(last.to.name, "a");

        let wrapped = path.segment_at(4);
        assert_eq!(wrapped.index, 1);
        assert_eq!(wrapped.from.name, "b");
        assert_eq!(path.index_of("c"), Some(2));
        assert_eq!(path.index_of("zzz"), None);
    }

    #[test]
    fn translation_segment_interpolates_all_components() {
        let path = three_stops();
        let pose = path.segment_at(0).pose_at(0.5);
        assert_eq!(pose.position, [5.0, 0.0]);
        assert_eq!(pose.look_at, [5.0, 0.0]);
        assert_eq!(pose.altitude, 150.0);
    }

    #[test]
    fn orbit_segment_sweeps_around_look_at() {
        let hub = Waypoint::new("hub", [1.0, 0.0], 50.0, 1000.0)
            .looking_at([0.0, 0.0])
            .with_orbit(Orbit {
                radius: 1.0,
                angular_span: FRAC_PI_2,
                start_angle: None,
                altitude: OrbitAltitude::Hold,
            });
        let next = Waypoint::new("next", [0.0, 5.0], 80.0, 1000.0);
        let path = Path::new(vec![hub, next]).unwrap();
        let segment = path.segment_at(0);
        assert!(segment.is_orbit());

        let start = segment.pose_at(0.0);
        assert!((start.position[0] - 1.0).abs() < 1e-9);
        assert!(start.position[1].abs() < 1e-9);

        let end = segment.pose_at(1.0);
        assert!(end.position[0].abs() < 1e-9);
        assert!((end.position[1] - 1.0).abs() < 1e-9);
        assert_eq!(end.look_at, [0.0, 0.0]);
        assert_eq!(end.altitude, 50.0);

        let sweep_end = path.waypoint(0).unwrap().sweep_end().unwrap();
        assert!((sweep_end[1] - 1.0).abs() < 1e-9);

        // The return leg is a plain translation back to the hub.
        let back = path.segment_at(1).pose_at(1.0);
        assert_eq!(back.position, [1.0, 0.0]);
    }

    #[test]
    fn orbit_altitude_can_lerp() {
        let hub = Waypoint::new("hub", [1.0, 0.0], 100.0, 1000.0)
            .looking_at([0.0, 0.0])
            .with_orbit(Orbit {
                radius: 2.0,
                angular_span: PI,
                start_angle: Some(0.0),
                altitude: OrbitAltitude::Lerp,
            });
        let next = Waypoint::new("next", [0.0, 0.0], 300.0, 1000.0);
        let path = Path::new(vec![hub, next]).unwrap();
        let mid = path.segment_at(0).pose_at(0.5);
        assert_eq!(mid.altitude, 200.0);
        assert!(mid.position[0].abs() < 1e-9);
        assert!((mid.position[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn pose_validation_flags_non_finite_components() {
        assert!(Pose::new([0.0, 0.0], [0.0, 0.0], 0.0).validate().is_ok());
        assert_eq!(
            Pose::new([0.0, f64::INFINITY], [0.0, 0.0], 0.0).validate(),
            Err(TourError::NonFinitePose("position"))
        );
        assert_eq!(
            Pose::new([0.0, 0.0], [0.0, 0.0], f64::NAN).validate(),
            Err(TourError::NonFinitePose("altitude"))
        );
    }
}
