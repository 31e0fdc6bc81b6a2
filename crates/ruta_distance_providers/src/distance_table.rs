use ruta_routing::{
    geopoint::GeoPoint,
    weighting::{RoadNetworkDistance, WeightingError},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Travel distances and times between every pair of a set of points.
///
/// Both tables are flat row-major vectors, `distances[from * size + to]`. Unroutable pairs
/// hold a negative value.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct DistanceTable {
    /// Meters
    pub distances: Vec<f64>,

    /// Seconds
    pub times: Vec<f64>,
}

impl std::hash::Hash for DistanceTable {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for d in &self.distances {
            state.write_u64(d.to_bits());
        }
        for t in &self.times {
            state.write_u64(t.to_bits());
        }
    }
}

impl DistanceTable {
    pub const UNREACHABLE: f64 = -1.0;

    /// Number of points covered by the table.
    pub fn size(&self) -> usize {
        self.distances.len().isqrt()
    }

    pub fn distance(&self, from: usize, to: usize) -> Option<f64> {
        self.lookup(&self.distances, from, to)
    }

    pub fn time(&self, from: usize, to: usize) -> Option<f64> {
        self.lookup(&self.times, from, to)
    }

    fn lookup(&self, values: &[f64], from: usize, to: usize) -> Option<f64> {
        let size = self.size();
        if from >= size || to >= size {
            return None;
        }

        values
            .get(from * size + to)
            .copied()
            .filter(|value| *value >= 0.0)
    }

    /// Weight function answering with this table's distances for `points`, which must be
    /// the points the table was fetched for, in the same order.
    pub fn into_weighting(self, points: &[GeoPoint]) -> Result<RoadNetworkDistance, WeightingError> {
        RoadNetworkDistance::new(points, self.distances)
    }
}

#[cfg(test)]
mod tests {
    use ruta_routing::weighting::WeightFunction;

    use super::*;

    fn table() -> DistanceTable {
        DistanceTable {
            distances: vec![0.0, 120.0, 90.0, 0.0],
            times: vec![0.0, 12.0, DistanceTable::UNREACHABLE, 0.0],
        }
    }

    #[test]
    fn test_lookup() {
        let table = table();

        assert_eq!(table.size(), 2);
        assert_eq!(table.distance(0, 1), Some(120.0));
        assert_eq!(table.distance(1, 0), Some(90.0));
        assert_eq!(table.time(1, 0), None);
        assert_eq!(table.distance(2, 0), None);
    }

    #[test]
    fn test_into_weighting() {
        let points = [GeoPoint::new(45.0, 6.0), GeoPoint::new(45.01, 6.0)];
        let weighting = table().into_weighting(&points).unwrap();

        assert_eq!(weighting.weight(&points[0], &points[1]), 120.0);
        assert!(
            table()
                .into_weighting(&points[..1])
                .is_err()
        );
    }
}
