//! Frame-loop driver for the choreographer.
//!
//! The host supplies `request_frame`/`cancel_frame` (in the browser,
//! `requestAnimationFrame`); the driver owns the single outstanding request
//! and turns frame timestamps into clock deltas.

use crate::choreographer::{Choreographer, PlayState};
use crate::path::Pose;
use crate::renderer::MapRenderer;

/// Cap on a single frame's delta. Hidden tabs stop firing frames, and the
/// first frame back would otherwise fast-forward the tour by minutes.
pub const DEFAULT_MAX_FRAME_DELTA_MS: f64 = 100.0;

/// Opaque id of a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// The host's "run before next repaint" primitive.
pub trait FrameHost {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Owns a [`Choreographer`] and keeps at most one frame request in flight.
#[derive(Debug)]
pub struct FrameDriver<H, R> {
    host: H,
    choreographer: Choreographer<R>,
    pending: Option<FrameHandle>,
    last_timestamp: Option<f64>,
    max_frame_delta_ms: f64,
}

impl<H: FrameHost, R: MapRenderer> FrameDriver<H, R> {
    pub fn new(host: H, choreographer: Choreographer<R>) -> Self {
        Self {
            host,
            choreographer,
            pending: None,
            last_timestamp: None,
            max_frame_delta_ms: DEFAULT_MAX_FRAME_DELTA_MS,
        }
    }

    pub fn with_max_frame_delta(mut self, max_frame_delta_ms: f64) -> Self {
        self.max_frame_delta_ms = max_frame_delta_ms;
        self
    }

    pub fn choreographer(&self) -> &Choreographer<R> {
        &self.choreographer
    }

    pub fn choreographer_mut(&mut self) -> &mut Choreographer<R> {
        &mut self.choreographer
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn start(&mut self) {
        self.choreographer.start();
        self.schedule();
    }

    pub fn pause(&mut self) {
        self.choreographer.pause();
        self.cancel_pending();
        self.last_timestamp = None;
    }

    /// Cancels the pending frame and rewinds the tour. Idempotent, and safe
    /// to call from inside a frame callback.
    pub fn stop(&mut self) {
        self.cancel_pending();
        self.last_timestamp = None;
        self.choreographer.stop();
    }

    /// Entry point for the host's frame callback.
    ///
    /// `timestamp_ms` is the host's monotonic frame time. The first frame
    /// after a start or resume contributes no time.
    pub fn on_frame(&mut self, timestamp_ms: f64) -> Option<Pose> {
        self.pending = None;
        if self.choreographer.state() != PlayState::Playing {
            return None;
        }

        let delta = match self.last_timestamp {
            Some(last) => (timestamp_ms - last).clamp(0.0, self.max_frame_delta_ms),
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp_ms);

        let pose = match self.choreographer.tick(delta) {
            Ok(pose) => pose,
            Err(err) => {
                tracing::error!(error = %err, "pose rejected before reaching the renderer");
                None
            }
        };

        self.schedule();
        pose
    }

    fn schedule(&mut self) {
        if self.pending.is_none() && self.choreographer.state() == PlayState::Playing {
            self.pending = Some(self.host.request_frame());
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.host.cancel_frame(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::path::{Orbit, OrbitAltitude, Path, Waypoint};
    use crate::test_utils::{ManualFrameHost, RecordingRenderer};

    fn driver() -> FrameDriver<ManualFrameHost, RecordingRenderer> {
        let path = Arc::new(
            Path::new(vec![
                Waypoint::new("a", [0.0, 0.0], 0.0, 1000.0),
                Waypoint::new("b", [1.0, 0.0], 0.0, 1000.0),
            ])
            .unwrap(),
        );
        let mut choreographer = Choreographer::new(path, RecordingRenderer::default());
        choreographer.renderer_ready();
        FrameDriver::new(ManualFrameHost::default(), choreographer)
    }

    /// Runs the pending callback the way the browser would.
    fn frame(d: &mut FrameDriver<ManualFrameHost, RecordingRenderer>, timestamp_ms: f64) {
        d.host_mut().fire();
        d.on_frame(timestamp_ms);
    }

    #[test]
    fn start_schedules_one_frame_at_a_time() {
        let mut d = driver();
        d.start();
        d.start();
        d.start();
        assert_eq!(d.host().outstanding.len(), 1);

        let fired = d.host_mut().fire();
        assert!(fired.is_some());
        d.on_frame(0.0);
        assert_eq!(d.host().outstanding.len(), 1);
        assert_eq!(d.host().requested, 2);
    }

    #[test]
    fn deltas_come_from_timestamps() {
        let mut d = driver();
        d.start();
        frame(&mut d, 1000.0);
        assert_eq!(d.choreographer().segment_elapsed_ms(), 0.0);
        frame(&mut d, 1016.0);
        frame(&mut d, 1048.0);
        assert_eq!(d.choreographer().segment_elapsed_ms(), 48.0);
    }

    #[test]
    fn long_gaps_are_clamped() {
        let mut d = driver().with_max_frame_delta(50.0);
        d.start();
        frame(&mut d, 0.0);
        frame(&mut d, 60_000.0);
        assert_eq!(d.choreographer().segment_elapsed_ms(), 50.0);
    }

    #[test]
    fn pause_cancels_and_resume_skips_the_gap() {
        let mut d = driver();
        d.start();
        frame(&mut d, 0.0);
        frame(&mut d, 20.0);
        d.pause();
        assert!(d.host().outstanding.is_empty());
        assert_eq!(d.host().cancelled.len(), 1);

        d.start();
        frame(&mut d, 5_000.0);
        frame(&mut d, 5_010.0);
        assert_eq!(d.choreographer().segment_elapsed_ms(), 30.0);
    }

    #[test]
    fn stop_is_idempotent_and_releases_the_frame() {
        let mut d = driver();
        d.stop();
        d.start();
        d.stop();
        d.stop();
        assert!(d.pending_frame().is_none());
        assert!(d.host().outstanding.is_empty());
        assert!(!d.choreographer().running());

        // A frame that was already dispatched does nothing once stopped.
        assert_eq!(d.on_frame(10.0), None);
        assert!(d.host().outstanding.is_empty());
    }

    #[test]
    fn rejected_pose_keeps_the_loop_alive() {
        let edge = Waypoint::new("edge", [1e308, 0.0], 0.0, 1000.0).with_orbit(Orbit {
            radius: 1e308,
            angular_span: 1.0,
            start_angle: None,
            altitude: OrbitAltitude::Hold,
        });
        let home = Waypoint::new("home", [0.0, 0.0], 0.0, 1000.0);
        let path = Arc::new(Path::new(vec![edge, home]).unwrap());
        let mut choreographer = Choreographer::new(path, RecordingRenderer::default());
        choreographer.renderer_ready();
        let mut d = FrameDriver::new(ManualFrameHost::default(), choreographer);

        d.start();
        frame(&mut d, 0.0);
        d.host_mut().fire();
        assert_eq!(d.on_frame(16.0), None);

        assert_eq!(d.host().outstanding.len(), 1);
        assert_eq!(d.host().requested, 3);
        assert!(d.choreographer().adapter().renderer().poses.is_empty());
        assert_eq!(d.choreographer().segment_elapsed_ms(), 16.0);
    }
}
