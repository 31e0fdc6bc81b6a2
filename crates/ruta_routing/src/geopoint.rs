use geo::{Bearing, Distance, Haversine};
use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{constants::EARTH_RADIUS_METERS, meters::Meters};

#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("Invalid coordinates: lat {lat}, lon {lon}")]
pub struct InvalidCoordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl GeoPoint {
    /// Creates a point without validating the coordinates, use [`GeoPoint::try_new`] for
    /// untrusted input.
    pub const fn new(lat: f64, lon: f64) -> Self {
        GeoPoint {
            lat,
            lon,
            elevation: None,
            timestamp: None,
        }
    }

    pub fn try_new(lat: f64, lon: f64) -> Result<Self, InvalidCoordinates> {
        if is_valid_lat_lon(lat, lon) {
            Ok(GeoPoint::new(lat, lon))
        } else {
            Err(InvalidCoordinates { lat, lon })
        }
    }

    pub fn with_elevation(mut self, elevation: Option<f64>) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn with_timestamp(mut self, timestamp: Option<Timestamp>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn is_valid(&self) -> bool {
        is_valid_lat_lon(self.lat, self.lon)
    }

    pub fn haversine_distance(&self, other: &GeoPoint) -> Meters {
        let haversine = Haversine;
        Meters::new(haversine.distance(geo::Point::from(self), geo::Point::from(other)))
    }

    /// Initial bearing towards `dest`, in degrees clockwise from north within `[0, 360)`.
    pub fn bearing(&self, dest: &GeoPoint) -> f64 {
        let haversine = Haversine;
        haversine
            .bearing(geo::Point::from(self), geo::Point::from(dest))
            .rem_euclid(360.0)
    }

    /// Position on the unit sphere scaled to the earth radius. Chord lengths between these
    /// vectors match great-circle distances closely at the scale of waypoint clustering.
    pub fn to_cartesian(&self) -> [f64; 3] {
        let lat = self.lat.to_radians();
        let lon = self.lon.to_radians();

        [
            EARTH_RADIUS_METERS * lat.cos() * lon.cos(),
            EARTH_RADIUS_METERS * lat.cos() * lon.sin(),
            EARTH_RADIUS_METERS * lat.sin(),
        ]
    }

    /// Local planar offset of `self` relative to `origin` in meters (east, north).
    pub fn local_offset(&self, origin: &GeoPoint) -> (f64, f64) {
        let mean_lat = ((self.lat + origin.lat) / 2.0).to_radians();
        let dlon = wrap_longitude(self.lon - origin.lon);

        let x = dlon.to_radians() * mean_lat.cos() * EARTH_RADIUS_METERS;
        let y = (self.lat - origin.lat).to_radians() * EARTH_RADIUS_METERS;
        (x, y)
    }

    /// Point at `fraction` of the straight line from `self` to `to`, taking the short way
    /// across the antimeridian.
    pub fn interpolate(&self, to: &GeoPoint, fraction: f64) -> GeoPoint {
        let dlon = wrap_longitude(to.lon - self.lon);

        GeoPoint::new(
            self.lat + fraction * (to.lat - self.lat),
            wrap_longitude(self.lon + fraction * dlon),
        )
    }
}

/// Brings a longitude or longitude difference back within `[-180, 180]`.
fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

fn is_valid_lat_lon(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

impl From<&GeoPoint> for geo::Point<f64> {
    fn from(point: &GeoPoint) -> Self {
        geo::Point::new(point.lon, point.lat)
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        geo::Point::new(point.lon, point.lat)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(point: geo::Point<f64>) -> Self {
        GeoPoint::new(point.y(), point.x())
    }
}
