use jiff::SignedDuration;
use ruta_routing::meters::Meters;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TrackerParams {
    /// Distance from the route above which a fix counts as off-route
    pub deviation_threshold: Meters,

    /// Consecutive off-route fixes needed to raise the deviation flag
    pub deviation_updates: usize,

    /// Distance below which a position is considered to be at a waypoint
    pub arrival_tolerance: Meters,

    /// Sessions without a valid update for this long are aborted
    pub update_timeout: SignedDuration,

    /// Number of recent fixes averaged for the remaining time estimate
    pub speed_window: usize,
}

impl Default for TrackerParams {
    fn default() -> Self {
        TrackerParams {
            deviation_threshold: Meters::new(50.0),
            deviation_updates: 3,
            arrival_tolerance: Meters::new(20.0),
            update_timeout: SignedDuration::from_mins(5),
            speed_window: 5,
        }
    }
}
