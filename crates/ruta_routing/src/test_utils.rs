use crate::{
    geopoint::GeoPoint,
    graph::{RouteGraph, Waypoint, WaypointId},
};

fn waypoints(points: &[(f64, f64)]) -> Vec<Waypoint> {
    points
        .iter()
        .enumerate()
        .map(|(i, &(lat, lon))| Waypoint::new(WaypointId::new(i), GeoPoint::new(lat, lon), None))
        .collect()
}

fn links(links: &[(usize, usize, f64)]) -> Vec<(WaypointId, WaypointId, f64)> {
    links
        .iter()
        .map(|&(from, to, weight)| (WaypointId::new(from), WaypointId::new(to), weight))
        .collect()
}

/// Four corners of a square on the equator, sides of equal weight.
///
/// ```text
/// 3 --- 2
/// |     |
/// 0 --- 1
/// ```
pub fn square_graph() -> RouteGraph {
    RouteGraph::from_parts(
        waypoints(&[(0.0, 0.0), (0.0, 0.001), (0.001, 0.001), (0.001, 0.0)]),
        links(&[(0, 1, 100.0), (1, 2, 100.0), (2, 3, 100.0), (3, 0, 100.0)]),
        false,
    )
}

/// A, B and C where the direct A-C edge costs more than going through B.
pub fn triangle_graph() -> RouteGraph {
    RouteGraph::from_parts(
        waypoints(&[(0.0, 0.0), (0.001, 0.0005), (0.0, 0.001)]),
        links(&[(0, 1, 100.0), (1, 2, 100.0), (0, 2, 1_000.0)]),
        false,
    )
}
