#![allow(dead_code)]

use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use ruta_navigation::session::PositionFix;
use ruta_routing::{geopoint::GeoPoint, kmh::Kmh, routing::OptimizedRoute};

/// Meters per degree of latitude
pub const METERS_PER_DEGREE: f64 = 111_195.0;

pub fn base_time() -> Timestamp {
    Timestamp::from_second(1_700_000_000).unwrap()
}

/// Two segments of about 1.1 km, east along the equator then north.
pub fn two_segment_route() -> Arc<OptimizedRoute> {
    Arc::new(OptimizedRoute::from_points(
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.01),
            GeoPoint::new(0.01, 0.01),
        ],
        Kmh::new(40.0),
    ))
}

/// Fix `north` meters north of the equator at longitude `lon`.
pub fn fix_north_of(north: f64, lon: f64, seconds: i64) -> PositionFix {
    PositionFix::new(
        north / METERS_PER_DEGREE,
        lon,
        base_time() + SignedDuration::from_secs(seconds),
    )
}

/// Small deterministic generator, enough to add GPS noise.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg(seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1))
    }

    /// Uniform in `[-1, 1]`
    pub fn next_signed(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
    }
}
