#![allow(dead_code)]

use fixedbitset::FixedBitSet;
use ruta_routing::{
    geopoint::GeoPoint,
    graph::{RouteGraph, WaypointId},
    meters::Meters,
};

/// GPX document with a single track made of `points`.
pub fn gpx_track(points: &[(f64, f64)]) -> String {
    let track_points = points
        .iter()
        .map(|(lat, lon)| format!(r#"      <trkpt lat="{lat}" lon="{lon}"/>"#))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="ruta tests" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
{track_points}
    </trkseg>
  </trk>
</gpx>"#
    )
}

//
//  Roughly 10 km loop:
//
//          B
//         / \
//        /   \
//       A --- C
//
pub const TRIANGLE_A: GeoPoint = GeoPoint::new(48.8566, 2.3522);
pub const TRIANGLE_B: GeoPoint = GeoPoint::new(48.8866, 2.3752);
pub const TRIANGLE_C: GeoPoint = GeoPoint::new(48.8566, 2.3982);

/// Deterministic pseudo random sequence in `[0, 1)`.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg(seed)
    }

    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Wandering track of `len` points around `center`, steps of up to about 40 m.
pub fn random_walk(center: GeoPoint, len: usize, seed: u64) -> Vec<GeoPoint> {
    let mut rng = Lcg::new(seed);
    let mut current = center;

    (0..len)
        .map(|_| {
            let point = current;
            current = GeoPoint::new(
                current.lat + (rng.next_f64() - 0.5) * 0.0007,
                current.lon + (rng.next_f64() - 0.5) * 0.0007,
            );
            point
        })
        .collect()
}

/// Length of the shortest simple path between `from` and `to`, found by trying them all.
pub fn exhaustive_shortest_distance(
    graph: &RouteGraph,
    from: WaypointId,
    to: WaypointId,
) -> Option<Meters> {
    fn visit(
        graph: &RouteGraph,
        current: WaypointId,
        to: WaypointId,
        visited: &mut FixedBitSet,
        length: Meters,
        best: &mut Option<Meters>,
    ) {
        if current == to {
            if best.is_none_or(|best| length < best) {
                *best = Some(length);
            }
            return;
        }

        for (next, edge) in graph.neighbors(current) {
            if visited.contains(next.get()) {
                continue;
            }

            visited.insert(next.get());
            visit(graph, next, to, visited, length + edge.distance(), best);
            visited.set(next.get(), false);
        }
    }

    let mut visited = FixedBitSet::with_capacity(graph.len());
    visited.insert(from.get());

    let mut best = None;
    visit(graph, from, to, &mut visited, Meters::ZERO, &mut best);
    best
}
