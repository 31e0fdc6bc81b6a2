use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use ruta_routing::{geopoint::GeoPoint, kmh::Kmh, routing::OptimizedRoute};

use crate::session::PositionFix;

/// Longitude step between two route points, about 1.1 km on the equator
pub const STEP: f64 = 0.01;

pub fn base_time() -> Timestamp {
    Timestamp::from_second(1_700_000_000).unwrap()
}

/// Route going east along the equator with `segments` segments of `STEP` degrees.
pub fn straight_route(segments: usize) -> Arc<OptimizedRoute> {
    let points = (0..=segments)
        .map(|i| GeoPoint::new(0.0, i as f64 * STEP))
        .collect();

    Arc::new(OptimizedRoute::from_points(points, Kmh::new(40.0)))
}

pub fn fix_at(lat: f64, lon: f64, seconds: i64) -> PositionFix {
    PositionFix::new(lat, lon, base_time() + SignedDuration::from_secs(seconds))
}
