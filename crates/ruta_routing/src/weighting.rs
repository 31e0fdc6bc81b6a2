use fxhash::FxHashMap;
use thiserror::Error;

use crate::{constants::COORD_SCALE_FACTOR, geopoint::GeoPoint};

/// Travel cost between two geographic points.
///
/// Implementations must return a non-negative value. A non-finite value means the two
/// points are not connected and no edge will be created between them.
pub trait WeightFunction {
    fn weight(&self, from: &GeoPoint, to: &GeoPoint) -> f64;
}

impl<W: WeightFunction + ?Sized> WeightFunction for &W {
    fn weight(&self, from: &GeoPoint, to: &GeoPoint) -> f64 {
        (**self).weight(from, to)
    }
}

/// Haversine distance in meters.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreatCircleDistance;

impl WeightFunction for GreatCircleDistance {
    fn weight(&self, from: &GeoPoint, to: &GeoPoint) -> f64 {
        from.haversine_distance(to).value()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeightingError {
    #[error("Distance table has {actual} entries, expected {expected} for {points} points")]
    TableSize {
        points: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoordinateKey(i64, i64);

impl From<&GeoPoint> for CoordinateKey {
    fn from(point: &GeoPoint) -> Self {
        CoordinateKey(
            (point.lat * COORD_SCALE_FACTOR).round() as i64,
            (point.lon * COORD_SCALE_FACTOR).round() as i64,
        )
    }
}

/// Distances taken from a road network, precomputed for a fixed set of points.
///
/// The table is a flat row-major matrix: `distances[from * points.len() + to]`. Pairs of
/// points that are not part of the table are reported as unreachable.
#[derive(Debug, Clone)]
pub struct RoadNetworkDistance {
    index: FxHashMap<CoordinateKey, usize>,
    distances: Vec<f64>,
    num_points: usize,
}

impl RoadNetworkDistance {
    pub fn new(points: &[GeoPoint], distances: Vec<f64>) -> Result<Self, WeightingError> {
        let num_points = points.len();
        let expected = num_points * num_points;

        if distances.len() != expected {
            return Err(WeightingError::TableSize {
                points: num_points,
                expected,
                actual: distances.len(),
            });
        }

        let mut index = FxHashMap::default();
        for (i, point) in points.iter().enumerate() {
            // First occurrence wins when the same coordinates appear twice
            index.entry(CoordinateKey::from(point)).or_insert(i);
        }

        Ok(RoadNetworkDistance {
            index,
            distances,
            num_points,
        })
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }
}

impl WeightFunction for RoadNetworkDistance {
    fn weight(&self, from: &GeoPoint, to: &GeoPoint) -> f64 {
        let (Some(&i), Some(&j)) = (
            self.index.get(&CoordinateKey::from(from)),
            self.index.get(&CoordinateKey::from(to)),
        ) else {
            return f64::INFINITY;
        };

        if i == j {
            return 0.0;
        }

        let distance = self.distances[i * self.num_points + j];
        if distance < 0.0 {
            // Providers report unroutable pairs with negative or null values
            return f64::INFINITY;
        }

        distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_great_circle_distance() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 1.0);

        let weight = GreatCircleDistance.weight(&a, &b);
        assert!((weight - 111_195.0).abs() < 10.0, "{weight}");
        assert_eq!(GreatCircleDistance.weight(&a, &a), 0.0);
    }

    #[test]
    fn test_road_network_lookup() {
        let points = vec![GeoPoint::new(1.0, 1.0), GeoPoint::new(2.0, 2.0)];
        let road = RoadNetworkDistance::new(&points, vec![0.0, 150.0, 220.0, 0.0]).unwrap();

        assert_eq!(road.weight(&points[0], &points[1]), 150.0);
        assert_eq!(road.weight(&points[1], &points[0]), 220.0);
        assert_eq!(road.weight(&points[1], &points[1]), 0.0);
        assert_eq!(
            road.weight(&points[0], &GeoPoint::new(3.0, 3.0)),
            f64::INFINITY
        );
    }

    #[test]
    fn test_road_network_rejects_bad_table() {
        let points = vec![GeoPoint::new(1.0, 1.0), GeoPoint::new(2.0, 2.0)];
        assert_eq!(
            RoadNetworkDistance::new(&points, vec![0.0; 3]).unwrap_err(),
            WeightingError::TableSize {
                points: 2,
                expected: 4,
                actual: 3
            }
        );
    }
}
