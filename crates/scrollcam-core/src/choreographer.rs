//! Camera choreographer: plays a looping tour and pushes poses to the renderer.

use std::sync::Arc;

use crate::completion::{self, FlightCompletion, FlightOutcome, Settler};
use crate::error::TourError;
use crate::kernel::EasingType;
use crate::path::{Path, Pose};
use crate::renderer::{MapRenderer, PushOutcome, RendererAdapter};

/// Playback state of the tour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    /// Constructed or stopped; the clock is at the start of the tour.
    #[default]
    Idle,
    Playing,
    /// Clock frozen, last pose retained.
    Paused,
}

/// Timing of transient flights started by [`Choreographer::fly_to`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightOptions {
    pub duration_ms: f64,
    pub easing: EasingType,
}

impl Default for FlightOptions {
    fn default() -> Self {
        Self {
            duration_ms: 1500.0,
            easing: EasingType::EaseInOutCubic,
        }
    }
}

/// A transient segment from wherever the camera was to a chosen waypoint.
#[derive(Debug)]
struct Flight {
    target: usize,
    from: Pose,
    duration_ms: f64,
    elapsed_ms: f64,
    easing: EasingType,
    settler: Settler,
}

impl Flight {
    fn pose(&self, to: &Pose) -> Pose {
        let t = (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0);
        self.from.lerp(to, self.easing.apply(t))
    }

    fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}

/// Drives one [`Path`] and feeds the resulting poses to a renderer.
///
/// The clock only advances through [`tick`](Self::tick). Overflow past the
/// end of a segment carries into the next one, so the tour period equals
/// [`Path::total_duration_ms`] regardless of how time is sliced into frames.
#[derive(Debug)]
pub struct Choreographer<R> {
    path: Arc<Path>,
    adapter: RendererAdapter<R>,
    state: PlayState,
    active_segment_index: usize,
    segment_elapsed_ms: f64,
    flight: Option<Flight>,
    flight_options: FlightOptions,
    last_pose: Option<Pose>,
}

impl<R: MapRenderer> Choreographer<R> {
    pub fn new(path: Arc<Path>, renderer: R) -> Self {
        Self {
            path,
            adapter: RendererAdapter::new(renderer),
            state: PlayState::Idle,
            active_segment_index: 0,
            segment_elapsed_ms: 0.0,
            flight: None,
            flight_options: FlightOptions::default(),
            last_pose: None,
        }
    }

    pub fn with_flight_options(mut self, options: FlightOptions) -> Self {
        self.flight_options = options;
        self
    }

    pub fn path(&self) -> &Arc<Path> {
        &self.path
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Whether the clock advances on `tick`.
    pub fn running(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn active_segment_index(&self) -> usize {
        self.active_segment_index
    }

    pub fn segment_elapsed_ms(&self) -> f64 {
        self.segment_elapsed_ms
    }

    /// Linear progress through the active segment, in `[0, 1]`.
    pub fn segment_progress(&self) -> f64 {
        if self.path.is_degenerate() {
            return 0.0;
        }
        let duration = self
            .path
            .segment_at(self.active_segment_index)
            .duration_ms();
        (self.segment_elapsed_ms / duration).clamp(0.0, 1.0)
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }

    /// Last pose computed by `tick`, whether or not the renderer took it.
    pub fn last_pose(&self) -> Option<Pose> {
        self.last_pose
    }

    pub fn adapter(&self) -> &RendererAdapter<R> {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut RendererAdapter<R> {
        &mut self.adapter
    }

    pub fn start(&mut self) {
        if self.state == PlayState::Playing {
            return;
        }
        tracing::info!(
            from = ?self.state,
            segment = self.active_segment_index,
            "tour playing"
        );
        self.state = PlayState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state == PlayState::Playing {
            tracing::debug!(segment = self.active_segment_index, "tour paused");
            self.state = PlayState::Paused;
        }
    }

    /// Returns to `Idle` with the clock rewound. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.supersede_flight();
        if self.state != PlayState::Idle {
            tracing::info!("tour stopped");
        }
        self.state = PlayState::Idle;
        self.active_segment_index = 0;
        self.segment_elapsed_ms = 0.0;
    }

    /// Replaces the tour. Playback restarts at the first segment of the new
    /// path; nothing is interpolated across the two paths.
    pub fn swap_path(&mut self, path: Arc<Path>) {
        self.supersede_flight();
        tracing::info!(waypoints = path.len(), "tour path swapped");
        self.path = path;
        self.active_segment_index = 0;
        self.segment_elapsed_ms = 0.0;
    }

    /// Advances the clock by `delta_ms` and pushes the resulting pose.
    ///
    /// Returns `Ok(None)` when not playing or when the delta is unusable.
    /// A non-finite pose is returned as an error and never reaches the
    /// renderer.
    pub fn tick(&mut self, delta_ms: f64) -> Result<Option<Pose>, TourError> {
        if self.state != PlayState::Playing {
            return Ok(None);
        }
        if !delta_ms.is_finite() || delta_ms < 0.0 {
            tracing::warn!(delta_ms, "ignoring invalid frame delta");
            return Ok(None);
        }

        let leftover = self.advance_flight(delta_ms);
        if let Some(leftover) = leftover {
            self.advance_tour(leftover);
        }

        let pose = self.current_pose()?;
        self.last_pose = Some(pose);
        if self.adapter.push(&pose) == PushOutcome::Dropped {
            tracing::trace!(dropped = self.adapter.dropped_frames(), "pose dropped");
        }
        Ok(Some(pose))
    }

    /// Pose for the current clock position, validated.
    pub fn current_pose(&self) -> Result<Pose, TourError> {
        let pose = if let Some(flight) = &self.flight {
            flight.pose(&self.path.waypoints()[flight.target].pose())
        } else if self.path.is_degenerate() {
            self.path.waypoints()[0].pose()
        } else {
            let segment = self.path.segment_at(self.active_segment_index);
            segment.pose_at(segment.easing().apply(self.segment_progress()))
        };
        pose.validate()?;
        Ok(pose)
    }

    /// Interrupts the tour with a flight to waypoint `index`.
    ///
    /// When the flight lands, the tour resumes on the segment leaving that
    /// waypoint. Any flight already underway is settled as superseded.
    pub fn fly_to(&mut self, index: usize) -> Result<FlightCompletion, TourError> {
        let len = self.path.len();
        if index >= len {
            return Err(TourError::WaypointOutOfRange { index, len });
        }
        let from = self.current_pose()?;
        self.supersede_flight();

        let (settler, completion) = completion::channel();
        tracing::debug!(
            waypoint = %self.path.waypoints()[index].name,
            duration_ms = self.flight_options.duration_ms,
            "flight started"
        );
        self.flight = Some(Flight {
            target: index,
            from,
            duration_ms: self.flight_options.duration_ms,
            elapsed_ms: 0.0,
            easing: self.flight_options.easing,
            settler,
        });
        Ok(completion)
    }

    /// The renderer signalled readiness; the next computed pose goes through.
    /// While not playing no tick will follow, so the held pose is pushed now.
    pub fn renderer_ready(&mut self) {
        self.adapter.mark_ready();
        if self.state != PlayState::Playing {
            if let Some(pose) = self.last_pose {
                self.adapter.push(&pose);
            }
        }
    }

    /// The renderer failed. Pose pushes stop but the clock keeps its place.
    pub fn renderer_failed(&mut self, diagnostic: impl Into<String>) {
        let diagnostic = diagnostic.into();
        if let Some(flight) = &mut self.flight {
            flight
                .settler
                .settle(FlightOutcome::RendererFailed(diagnostic.clone()));
        }
        self.adapter.mark_failed(diagnostic);
    }

    /// Advances an active flight. Returns the time left over for the tour,
    /// or `None` if the flight is still underway.
    fn advance_flight(&mut self, delta_ms: f64) -> Option<f64> {
        let Some(flight) = &mut self.flight else {
            return Some(delta_ms);
        };
        flight.elapsed_ms += delta_ms;
        if !flight.is_finished() {
            return None;
        }

        let leftover = flight.elapsed_ms - flight.duration_ms;
        let target = flight.target;
        flight.settler.settle(FlightOutcome::Arrived);
        self.flight = None;
        tracing::debug!(waypoint = %self.path.waypoints()[target].name, "flight arrived");

        self.active_segment_index = target;
        self.segment_elapsed_ms = 0.0;
        Some(leftover)
    }

    fn advance_tour(&mut self, delta_ms: f64) {
        if self.path.is_degenerate() {
            return;
        }
        self.segment_elapsed_ms += delta_ms;

        // Whole cycles land back on the same segment.
        let total = self.path.total_duration_ms();
        if self.segment_elapsed_ms >= total {
            self.segment_elapsed_ms %= total;
        }

        loop {
            let duration = self
                .path
                .segment_at(self.active_segment_index)
                .duration_ms();
            if self.segment_elapsed_ms < duration {
                break;
            }
            self.segment_elapsed_ms -= duration;
            self.active_segment_index = (self.active_segment_index + 1) % self.path.len();
            tracing::trace!(segment = self.active_segment_index, "segment advanced");
        }
    }

    fn supersede_flight(&mut self) {
        if let Some(mut flight) = self.flight.take() {
            flight.settler.settle(FlightOutcome::Superseded);
        }
    }
}
