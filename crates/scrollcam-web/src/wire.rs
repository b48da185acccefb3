//! Shapes exchanged with JavaScript.

use std::collections::BTreeMap;

use scrollcam_core::{FlightOutcome, Pose, SectionSnapshot};
use serde::Serialize;

/// Argument of the renderer's `setPose`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseMessage {
    pub position: [f64; 2],
    pub look_at: [f64; 2],
    pub altitude: f64,
}

impl From<&Pose> for PoseMessage {
    fn from(pose: &Pose) -> Self {
        Self {
            position: pose.position,
            look_at: pose.look_at,
            altitude: pose.altitude,
        }
    }
}

/// What section subscribers receive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotMessage {
    pub active: Option<String>,
    pub progress: BTreeMap<String, f64>,
}

impl From<&SectionSnapshot> for SnapshotMessage {
    fn from(snapshot: &SectionSnapshot) -> Self {
        Self {
            active: snapshot.active.clone(),
            progress: snapshot.progress.clone(),
        }
    }
}

/// Intersection thresholds at every 5%, so ratio changes arrive while a
/// section scrolls rather than only when it crosses its own threshold.
pub fn observer_thresholds() -> Vec<f64> {
    (0..=20).map(|step| f64::from(step) / 20.0).collect()
}

/// Value a `flyTo` promise resolves with.
pub fn outcome_label(outcome: &FlightOutcome) -> &'static str {
    match outcome {
        FlightOutcome::Arrived => "arrived",
        FlightOutcome::Superseded => "superseded",
        FlightOutcome::RendererFailed(_) => "renderer_failed",
        FlightOutcome::Dropped => "dropped",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_uses_camel_case_keys() {
        let pose = Pose::new([13.4, 52.5], [13.41, 52.52], 650.0);
        let json = serde_json::to_value(PoseMessage::from(&pose)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "position": [13.4, 52.5],
                "lookAt": [13.41, 52.52],
                "altitude": 650.0
            })
        );
    }

    #[test]
    fn snapshot_is_a_plain_object() {
        let snapshot = SectionSnapshot {
            active: Some("skills".into()),
            progress: BTreeMap::from([("skills".into(), 0.75), ("contact".into(), 0.0)]),
        };
        let json = serde_json::to_value(SnapshotMessage::from(&snapshot)).unwrap();
        assert_eq!(json["active"], "skills");
        assert_eq!(json["progress"]["skills"], 0.75);
    }

    #[test]
    fn thresholds_cover_the_unit_interval() {
        let thresholds = observer_thresholds();
        assert_eq!(thresholds.len(), 21);
        assert_eq!(thresholds.first(), Some(&0.0));
        assert_eq!(thresholds.last(), Some(&1.0));
        assert!(thresholds.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(outcome_label(&FlightOutcome::Arrived), "arrived");
        assert_eq!(
            outcome_label(&FlightOutcome::RendererFailed("context lost".into())),
            "renderer_failed"
        );
    }
}
