use fxhash::FxHashMap;
use tracing::{debug, warn};

use crate::geopoint::GeoPoint;

use super::{
    edge::{Edge, EdgeId},
    spatial_index::WaypointIndex,
    waypoint::{Waypoint, WaypointId},
};

/// Waypoints and weighted edges of one import. Immutable once built.
#[derive(Clone)]
pub struct RouteGraph {
    waypoints: Vec<Waypoint>,
    edges: Vec<Edge>,

    /// Outgoing edges per waypoint, in insertion order
    adjacency: Vec<Vec<EdgeId>>,

    index: WaypointIndex,
    directed: bool,

    start: Option<WaypointId>,
    end: Option<WaypointId>,
}

impl RouteGraph {
    /// Builds a graph from already deduplicated waypoints and `(from, to, weight)` links.
    ///
    /// Waypoint ids are reassigned from their position in `waypoints`. Links with an
    /// unknown endpoint, a self loop or an invalid weight are dropped, parallel links keep
    /// the cheapest weight. The start and end waypoints are the first and last ones.
    pub fn from_parts(
        waypoints: Vec<Waypoint>,
        links: impl IntoIterator<Item = (WaypointId, WaypointId, f64)>,
        directed: bool,
    ) -> Self {
        let waypoints = waypoints
            .into_iter()
            .enumerate()
            .map(|(i, waypoint)| {
                Waypoint::new(
                    WaypointId::new(i),
                    *waypoint.point(),
                    waypoint.label().map(str::to_owned),
                )
            })
            .collect::<Vec<_>>();

        let start = (!waypoints.is_empty()).then(|| WaypointId::new(0));
        let end = waypoints.len().checked_sub(1).map(WaypointId::new);

        let mut graph = RouteGraph::empty(waypoints, directed, start, end);
        let mut seen = FxHashMap::default();
        for (from, to, weight) in links {
            graph.add_edge(&mut seen, from, to, weight);
        }

        graph
    }

    pub(crate) fn empty(
        waypoints: Vec<Waypoint>,
        directed: bool,
        start: Option<WaypointId>,
        end: Option<WaypointId>,
    ) -> Self {
        let mut index = WaypointIndex::new();
        for waypoint in &waypoints {
            index.insert(waypoint);
        }

        RouteGraph {
            adjacency: vec![Vec::new(); waypoints.len()],
            waypoints,
            edges: Vec::new(),
            index,
            directed,
            start,
            end,
        }
    }

    /// `seen` maps a waypoint pair to the edge already connecting it.
    pub(crate) fn add_edge(
        &mut self,
        seen: &mut FxHashMap<(WaypointId, WaypointId), EdgeId>,
        from: WaypointId,
        to: WaypointId,
        weight: f64,
    ) {
        if from == to || !self.contains(from) || !self.contains(to) {
            return;
        }

        if !weight.is_finite() || weight < 0.0 {
            debug!(%from, %to, weight, "Skipping edge without a usable weight");
            return;
        }

        let distance = self.waypoints[from]
            .point()
            .haversine_distance(self.waypoints[to].point());

        let key = if self.directed || from < to {
            (from, to)
        } else {
            (to, from)
        };

        if let Some(&edge_id) = seen.get(&key) {
            self.edges[edge_id].keep_cheapest(weight, distance);
            return;
        }

        let edge_id = EdgeId::new(self.edges.len());
        self.edges.push(Edge::new(from, to, weight, distance));
        self.adjacency[from.get()].push(edge_id);
        if !self.directed {
            self.adjacency[to.get()].push(edge_id);
        }

        seen.insert(key, edge_id);
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn contains(&self, id: WaypointId) -> bool {
        id.get() < self.waypoints.len()
    }

    pub fn waypoint(&self, id: WaypointId) -> Option<&Waypoint> {
        self.waypoints.get(id.get())
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id]
    }

    /// Waypoint of the first recorded point.
    pub fn start_waypoint(&self) -> Option<WaypointId> {
        self.start
    }

    /// Waypoint of the last recorded point.
    pub fn end_waypoint(&self) -> Option<WaypointId> {
        self.end
    }

    /// Reachable neighbours of `id` with the edge leading to them.
    pub fn neighbors(&self, id: WaypointId) -> impl Iterator<Item = (WaypointId, &Edge)> + '_ {
        self.adjacency
            .get(id.get())
            .into_iter()
            .flatten()
            .map(move |&edge_id| {
                let edge = &self.edges[edge_id];
                (edge.adj_node(id), edge)
            })
    }

    /// Waypoint closest to `point`, used to snap a live position back onto the graph.
    pub fn nearest_waypoint(&self, point: &GeoPoint) -> Option<WaypointId> {
        let nearest = self.index.nearest(point);
        if nearest.is_none() {
            warn!("Cannot snap a position onto an empty graph");
        }
        nearest
    }
}

impl std::fmt::Debug for RouteGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteGraph")
            .field("waypoints", &self.waypoints.len())
            .field("edges", &self.edges.len())
            .field("directed", &self.directed)
            .finish()
    }
}
