use rstar::{RTree, primitives::GeomWithData};

use crate::{geopoint::GeoPoint, meters::Meters};

use super::waypoint::{Waypoint, WaypointId};

type IndexedWaypoint = GeomWithData<[f64; 3], WaypointId>;

/// Chord lengths are never longer than the arc they span, a small margin covers the
/// difference between earth radius conventions.
const RADIUS_MARGIN: f64 = 1.001;

/// R-tree over waypoint positions on the earth sphere (3D cartesian, meters).
#[derive(Clone)]
pub(crate) struct WaypointIndex {
    tree: RTree<IndexedWaypoint>,
}

impl WaypointIndex {
    pub fn new() -> Self {
        WaypointIndex { tree: RTree::new() }
    }

    pub fn insert(&mut self, waypoint: &Waypoint) {
        self.tree.insert(IndexedWaypoint::new(
            waypoint.point().to_cartesian(),
            waypoint.id(),
        ));
    }

    /// Nearest waypoint whose great-circle distance to `point` is within `radius`.
    /// Equal distances resolve to the lowest id.
    pub fn nearest_within(
        &self,
        waypoints: &[Waypoint],
        point: &GeoPoint,
        radius: Meters,
    ) -> Option<WaypointId> {
        let max_radius = radius.value() * RADIUS_MARGIN;

        self.tree
            .locate_within_distance(point.to_cartesian(), max_radius * max_radius)
            .map(|candidate| {
                let id = candidate.data;
                (waypoints[id].point().haversine_distance(point), id)
            })
            .filter(|(distance, _)| *distance <= radius)
            .min()
            .map(|(_, id)| id)
    }

    pub fn nearest(&self, point: &GeoPoint) -> Option<WaypointId> {
        self.tree
            .nearest_neighbor(&point.to_cartesian())
            .map(|nearest| nearest.data)
    }
}
