use jiff::{SignedDuration, Timestamp};
use ruta_routing::{geopoint::GeoPoint, meters::Meters};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{
    session_id::{DriverId, SessionId},
    session_status::SessionStatus,
};

/// Snapshot of a session that reached a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub driver_id: DriverId,
    pub status: SessionStatus,
    pub started_at: Timestamp,

    /// Time of the last applied position
    pub ended_at: Timestamp,

    pub distance_traveled: Meters,
    pub route_distance: Meters,
    pub deviation_events: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,

    /// Applied positions in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breadcrumb: Vec<GeoPoint>,
}

impl SessionRecord {
    pub fn duration(&self) -> SignedDuration {
        self.ended_at.duration_since(self.started_at)
    }
}
