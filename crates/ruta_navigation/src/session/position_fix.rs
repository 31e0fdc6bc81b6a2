use jiff::Timestamp;
use ruta_routing::geopoint::GeoPoint;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::tracker_error::TrackerError;

/// Live GPS reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PositionFix {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: Timestamp,

    /// Ground speed in meters per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,

    /// Degrees clockwise from north
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
}

impl PositionFix {
    pub fn new(lat: f64, lon: f64, timestamp: Timestamp) -> Self {
        PositionFix {
            lat,
            lon,
            timestamp,
            speed: None,
            heading: None,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    /// Fix from a recorded point, `None` when the point has no timestamp.
    pub fn from_point(point: &GeoPoint) -> Option<Self> {
        point
            .timestamp
            .map(|timestamp| PositionFix::new(point.lat, point.lon, timestamp))
    }

    /// Point of the fix, rejected when the coordinates are out of range or not finite.
    pub fn try_point(&self) -> Result<GeoPoint, TrackerError> {
        let point = self.point();
        if point.is_valid() {
            Ok(point)
        } else {
            Err(TrackerError::InvalidPosition {
                lat: self.lat,
                lon: self.lon,
            })
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon).with_timestamp(Some(self.timestamp))
    }

    /// Reported speed when it is usable.
    pub(crate) fn reported_speed(&self) -> Option<f64> {
        self.speed.filter(|speed| speed.is_finite() && *speed >= 0.0)
    }
}
