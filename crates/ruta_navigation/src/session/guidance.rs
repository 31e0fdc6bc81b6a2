use jiff::SignedDuration;
use ruta_routing::{geopoint::GeoPoint, meters::Meters};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::session_status::SessionStatus;

/// What to show the traveler after a position update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Guidance {
    pub segment_index: usize,
    pub distance_to_next_waypoint: Meters,

    /// Degrees clockwise from north
    pub bearing_to_next_waypoint: f64,

    /// Unknown until the traveler has been seen moving
    pub estimated_time_remaining: Option<SignedDuration>,

    pub distance_remaining: Meters,
    pub deviation: Meters,
    pub deviation_flag: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationSignal {
    /// The traveler left the route, a new one should be computed from `origin`
    Recalculate { origin: GeoPoint },

    /// Within arrival tolerance of the destination
    Arrived,

    /// The update timeout elapsed, the session was aborted
    SignalLost,
}

impl NavigationSignal {
    pub fn user_message(&self) -> &'static str {
        match self {
            NavigationSignal::Recalculate { .. } => "off route - recalculating",
            NavigationSignal::Arrived => "you have arrived",
            NavigationSignal::SignalLost => "signal lost - recalculating",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UpdateOutcome {
    pub status: SessionStatus,

    /// Absent when the update was not applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<Guidance>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<NavigationSignal>,
}

impl UpdateOutcome {
    /// Outcome of an update that changed nothing.
    pub fn inactive(status: SessionStatus) -> Self {
        UpdateOutcome {
            status,
            guidance: None,
            signals: Vec::new(),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.guidance.is_some()
    }

    pub fn has_signal(&self, signal: &NavigationSignal) -> bool {
        self.signals.iter().any(|s| {
            std::mem::discriminant(s) == std::mem::discriminant(signal)
        })
    }
}
