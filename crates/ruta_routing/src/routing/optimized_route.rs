use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    geopoint::GeoPoint,
    graph::{RouteGraph, WaypointId},
    kmh::Kmh,
    meters::Meters,
};

use super::optimizer_params::OptimizationMode;

/// Ordered waypoints to follow, starting at the origin.
///
/// `points` holds the coordinates of every entry of `waypoints`, in the same order.
/// Segment `i` goes from `points[i]` to `points[i + 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OptimizedRoute {
    mode: OptimizationMode,
    waypoints: Vec<WaypointId>,
    points: Vec<GeoPoint>,

    /// Great-circle length along the waypoints, whatever the weight function
    total_distance: Meters,

    /// Sum of the edge weights the optimizer minimized, the road distance in meters when
    /// the graph is weighted by a road network
    total_cost: f64,

    total_duration: SignedDuration,
}

impl OptimizedRoute {
    pub fn new(
        mode: OptimizationMode,
        waypoints: Vec<WaypointId>,
        points: Vec<GeoPoint>,
        total_distance: Meters,
        total_cost: f64,
        total_duration: SignedDuration,
    ) -> Self {
        OptimizedRoute {
            mode,
            waypoints,
            points,
            total_distance,
            total_cost,
            total_duration,
        }
    }

    /// Route through `waypoints` of `graph`, the ids must exist in the graph.
    pub(crate) fn from_waypoints(
        graph: &RouteGraph,
        mode: OptimizationMode,
        waypoints: Vec<WaypointId>,
        total_distance: Meters,
        total_cost: f64,
        average_speed: Kmh,
    ) -> Self {
        let points = waypoints
            .iter()
            .filter_map(|&id| graph.waypoint(id))
            .map(|waypoint| {
                let point = waypoint.point();
                GeoPoint::new(point.lat, point.lon).with_elevation(point.elevation)
            })
            .collect();

        let total_duration = if average_speed.value() > 0.0 {
            total_distance / average_speed
        } else {
            SignedDuration::ZERO
        };

        OptimizedRoute {
            mode,
            waypoints,
            points,
            total_distance,
            total_cost,
            total_duration,
        }
    }

    /// Straight route through `points`, with a distance measured along the segments.
    pub fn from_points(points: Vec<GeoPoint>, average_speed: Kmh) -> Self {
        let waypoints = (0..points.len()).map(WaypointId::new).collect::<Vec<_>>();
        let total_distance = points
            .windows(2)
            .map(|pair| pair[0].haversine_distance(&pair[1]))
            .sum::<Meters>();

        let target = waypoints.last().copied().unwrap_or_default();
        let total_duration = if average_speed.value() > 0.0 {
            total_distance / average_speed
        } else {
            SignedDuration::ZERO
        };

        OptimizedRoute {
            mode: OptimizationMode::ShortestPath { target },
            waypoints,
            points,
            total_distance,
            total_cost: total_distance.value(),
            total_duration,
        }
    }

    pub fn mode(&self) -> OptimizationMode {
        self.mode
    }

    pub fn waypoints(&self) -> &[WaypointId] {
        &self.waypoints
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn origin(&self) -> Option<WaypointId> {
        self.waypoints.first().copied()
    }

    pub fn destination(&self) -> Option<WaypointId> {
        self.waypoints.last().copied()
    }

    pub fn total_distance(&self) -> Meters {
        self.total_distance
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn total_duration(&self) -> SignedDuration {
        self.total_duration
    }

    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn segment(&self, index: usize) -> Option<(&GeoPoint, &GeoPoint)> {
        Some((self.points.get(index)?, self.points.get(index + 1)?))
    }

    /// Great-circle length of segment `index`, zero past the end.
    pub fn segment_length(&self, index: usize) -> Meters {
        self.segment(index)
            .map(|(from, to)| from.haversine_distance(to))
            .unwrap_or(Meters::ZERO)
    }

    /// Length of all the segments before `index`.
    pub fn length_before(&self, index: usize) -> Meters {
        (0..index.min(self.segment_count()))
            .map(|i| self.segment_length(i))
            .sum()
    }

    /// Length of every segment followed end to end.
    pub fn path_length(&self) -> Meters {
        self.length_before(self.segment_count())
    }
}
