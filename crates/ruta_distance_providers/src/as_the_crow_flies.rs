use ruta_routing::geopoint::GeoPoint;

use crate::distance_table::DistanceTable;

pub fn as_the_crow_flies_table<P>(points: &[P], speed_kmh: f64) -> DistanceTable
where
    for<'a> &'a P: Into<geo_types::Point>,
{
    let points = points
        .iter()
        .map(|point| {
            let point: geo_types::Point = point.into();
            GeoPoint::from(point)
        })
        .collect::<Vec<_>>();

    let meters_per_second = speed_kmh / 3.6;
    let size = points.len();

    let mut distances = Vec::with_capacity(size * size);
    let mut times = Vec::with_capacity(size * size);

    for from in &points {
        for to in &points {
            let distance = from.haversine_distance(to).value();
            distances.push(distance);
            times.push(if meters_per_second > 0.0 {
                distance / meters_per_second
            } else {
                DistanceTable::UNREACHABLE
            });
        }
    }

    DistanceTable { distances, times }
}
