//! One page's tour: frame driver, scroll mapper and the section bindings
//! between them, owned together and torn down together.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::choreographer::Choreographer;
use crate::completion::FlightCompletion;
use crate::config::TourConfig;
use crate::error::TourError;
use crate::frame::{FrameDriver, FrameHost};
use crate::mapper::{IntersectionSample, ScrollMapper, SectionChange};
use crate::path::Pose;
use crate::publisher::{SectionSnapshot, Subscription};
use crate::renderer::MapRenderer;

#[derive(Debug)]
pub struct TourSession<H, R> {
    driver: FrameDriver<H, R>,
    mapper: ScrollMapper,
    /// Section id to the waypoint the camera flies to when it activates.
    bindings: BTreeMap<String, usize>,
    disposed: bool,
}

impl<H: FrameHost, R: MapRenderer> TourSession<H, R> {
    /// Builds every part from `config`. Any configuration error surfaces
    /// here, before a frame is requested.
    pub fn from_config(config: &TourConfig, host: H, renderer: R) -> Result<Self, TourError> {
        config.validate()?;
        let path = Arc::new(config.build_path()?);
        let mapper = config.build_mapper()?;
        let bindings = config.section_bindings(&path)?;

        tracing::info!(
            waypoints = path.len(),
            sections = mapper.section_count(),
            bound = bindings.len(),
            period_ms = path.total_duration_ms(),
            "tour session created"
        );

        let choreographer =
            Choreographer::new(path, renderer).with_flight_options(config.flight_options());
        let driver =
            FrameDriver::new(host, choreographer).with_max_frame_delta(config.max_frame_delta_ms);
        Ok(Self {
            driver,
            mapper,
            bindings,
            disposed: false,
        })
    }

    pub fn start(&mut self) {
        if !self.disposed {
            self.driver.start();
        }
    }

    pub fn pause(&mut self) {
        if !self.disposed {
            self.driver.pause();
        }
    }

    pub fn on_frame(&mut self, timestamp_ms: f64) -> Option<Pose> {
        if self.disposed {
            return None;
        }
        self.driver.on_frame(timestamp_ms)
    }

    pub fn observe(
        &mut self,
        id: &str,
        sample: IntersectionSample,
    ) -> Result<Option<SectionChange>, TourError> {
        self.observe_batch([(id, sample)])
    }

    /// Feeds the mapper. When the active section changes to one bound to a
    /// waypoint, the camera flies there.
    pub fn observe_batch<I, S>(&mut self, samples: I) -> Result<Option<SectionChange>, TourError>
    where
        I: IntoIterator<Item = (S, IntersectionSample)>,
        S: AsRef<str>,
    {
        if self.disposed {
            return Ok(None);
        }
        let change = self.mapper.observe_batch(samples)?;
        if let Some(current) = change.as_ref().and_then(|c| c.current.as_deref()) {
            if let Some(&index) = self.bindings.get(current) {
                // Nobody awaits scroll-triggered flights; a newer one supersedes it.
                drop(self.driver.choreographer_mut().fly_to(index)?);
            }
        }
        Ok(change)
    }

    /// Flies to the waypoint bound to `section`. `Ok(None)` when the
    /// section has no binding or the session is disposed.
    pub fn fly_to_section(
        &mut self,
        section: &str,
    ) -> Result<Option<FlightCompletion>, TourError> {
        if self.disposed {
            return Ok(None);
        }
        if self.mapper.section(section).is_none() {
            return Err(TourError::UnknownSection(section.to_string()));
        }
        match self.bindings.get(section) {
            Some(&index) => self.driver.choreographer_mut().fly_to(index).map(Some),
            None => Ok(None),
        }
    }

    pub fn renderer_ready(&mut self) {
        self.driver.choreographer_mut().renderer_ready();
    }

    pub fn renderer_failed(&mut self, diagnostic: impl Into<String>) {
        self.driver.choreographer_mut().renderer_failed(diagnostic);
    }

    pub fn subscribe(&self, listener: impl Fn(&SectionSnapshot) + 'static) -> Subscription {
        self.mapper.publisher().subscribe(listener)
    }

    pub fn snapshot(&self) -> SectionSnapshot {
        self.mapper.snapshot()
    }

    pub fn bound_waypoint(&self, section: &str) -> Option<usize> {
        self.bindings.get(section).copied()
    }

    pub fn mapper(&self) -> &ScrollMapper {
        &self.mapper
    }

    pub fn driver(&self) -> &FrameDriver<H, R> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut FrameDriver<H, R> {
        &mut self.driver
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Stops the tour, releases the pending frame and drops all
    /// subscribers. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.driver.stop();
        self.mapper.publisher().clear();
        self.disposed = true;
        tracing::info!("tour session disposed");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::choreographer::PlayState;
    use crate::completion::FlightOutcome;
    use crate::test_utils::{ManualFrameHost, RecordingRenderer};

    const CONFIG: &str = r#"{
        "flight_duration_ms": 200,
        "waypoints": [
            {"name": "harbour", "position": [0.0, 0.0], "altitude": 100.0, "duration_ms": 1000},
            {"name": "market", "position": [1.0, 0.0], "altitude": 200.0, "duration_ms": 1000},
            {"name": "ridge", "position": [1.0, 1.0], "altitude": 400.0, "duration_ms": 1000}
        ],
        "sections": [
            {"id": "about", "order_index": 0},
            {"id": "projects", "order_index": 1, "waypoint": "ridge"}
        ]
    }"#;

    type Session = TourSession<ManualFrameHost, RecordingRenderer>;

    fn session() -> Session {
        let config = TourConfig::from_json(CONFIG).unwrap();
        let mut session = TourSession::from_config(
            &config,
            ManualFrameHost::default(),
            RecordingRenderer::default(),
        )
        .unwrap();
        session.renderer_ready();
        session
    }

    fn frame(s: &mut Session, timestamp_ms: f64) -> Option<Pose> {
        s.driver_mut().host_mut().fire();
        s.on_frame(timestamp_ms)
    }

    #[test]
    fn bound_section_flies_the_camera() {
        let mut s = session();
        s.start();
        frame(&mut s, 0.0);
        frame(&mut s, 100.0);

        let change = s
            .observe("projects", IntersectionSample::ratio(0.8))
            .unwrap();
        assert_eq!(change.unwrap().current.as_deref(), Some("projects"));
        assert!(s.driver().choreographer().is_flying());

        frame(&mut s, 200.0);
        let landed = frame(&mut s, 300.0).unwrap();
        assert!(!s.driver().choreographer().is_flying());
        assert_eq!(landed, Pose::new([1.0, 1.0], [1.0, 1.0], 400.0));
        assert_eq!(s.driver().choreographer().active_segment_index(), 2);
        assert_eq!(
            s.driver().choreographer().adapter().renderer().poses.last(),
            Some(&landed)
        );
    }

    #[test]
    fn unbound_section_leaves_the_tour_alone() {
        let mut s = session();
        s.start();
        s.observe("about", IntersectionSample::ratio(0.9)).unwrap();
        assert_eq!(s.mapper().active_section(), Some("about"));
        assert!(!s.driver().choreographer().is_flying());
        assert!(s.fly_to_section("about").unwrap().is_none());
    }

    #[test]
    fn explicit_flight_resolves_on_arrival() {
        let mut s = session();
        s.start();
        frame(&mut s, 0.0);
        let mut completion = s.fly_to_section("projects").unwrap().unwrap();
        frame(&mut s, 100.0);
        assert_eq!(completion.try_outcome(), None);
        frame(&mut s, 200.0);
        assert_eq!(completion.try_outcome(), Some(FlightOutcome::Arrived));

        assert_eq!(
            s.fly_to_section("blog").unwrap_err(),
            TourError::UnknownSection("blog".into())
        );
    }

    #[test]
    fn subscribers_see_every_update() {
        let mut s = session();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let seen = seen.clone();
            s.subscribe(move |snapshot| seen.borrow_mut().push(snapshot.active.clone()))
        };
        s.observe("about", IntersectionSample::ratio(0.5)).unwrap();
        s.observe("about", IntersectionSample::ratio(0.1)).unwrap();
        assert_eq!(*seen.borrow(), vec![Some("about".to_string()), None]);
        assert_eq!(s.snapshot().progress_of("about"), 0.1);
    }

    #[test]
    fn dispose_tears_everything_down_once() {
        let mut s = session();
        let _sub = s.subscribe(|_| {});
        s.start();
        frame(&mut s, 0.0);
        assert!(s.driver().pending_frame().is_some());

        s.dispose();
        s.dispose();
        assert!(s.is_disposed());
        assert!(s.driver().pending_frame().is_none());
        assert!(s.driver().host().outstanding.is_empty());
        assert_eq!(s.mapper().publisher().subscriber_count(), 0);
        assert_eq!(s.driver().choreographer().state(), PlayState::Idle);

        s.start();
        assert!(s.driver().pending_frame().is_none());
        assert_eq!(s.on_frame(50.0), None);
        assert_eq!(s.observe("about", IntersectionSample::ratio(1.0)), Ok(None));
        assert!(s.fly_to_section("projects").unwrap().is_none());
        assert!(!s.driver().choreographer().is_flying());
    }

    #[test]
    fn config_errors_surface_at_construction() {
        let mut config = TourConfig::from_json(CONFIG).unwrap();
        config.sections[0].waypoint = Some("lighthouse".into());
        let err = TourSession::from_config(
            &config,
            ManualFrameHost::default(),
            RecordingRenderer::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TourError::UnknownWaypointBinding { .. }));
    }
}
