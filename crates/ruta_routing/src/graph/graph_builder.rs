use fxhash::FxHashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{geopoint::GeoPoint, meters::Meters, timer_debug, weighting::WeightFunction};

use super::{
    graph_error::GraphError,
    route_graph::RouteGraph,
    spatial_index::WaypointIndex,
    waypoint::{Waypoint, WaypointId},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GraphBuilderParams {
    /// Raw points closer than this to an accepted waypoint are merged into it
    pub proximity_threshold: Meters,
    pub directed: bool,

    /// Connect the last waypoint of a track to the first waypoint of the next one
    pub chain_tracks: bool,
}

impl Default for GraphBuilderParams {
    fn default() -> Self {
        GraphBuilderParams {
            proximity_threshold: Meters::new(15.0),
            directed: false,
            chain_tracks: true,
        }
    }
}

/// Deduplicates raw track points into waypoints, in visiting order.
pub struct GraphBuilder {
    params: GraphBuilderParams,
    waypoints: Vec<Waypoint>,
    index: WaypointIndex,

    /// Distinct consecutive waypoints visited by each track
    tracks: Vec<Vec<WaypointId>>,

    first: Option<WaypointId>,
    last: Option<WaypointId>,
}

impl GraphBuilder {
    pub fn new(params: GraphBuilderParams) -> Self {
        GraphBuilder {
            params,
            waypoints: Vec::new(),
            index: WaypointIndex::new(),
            tracks: Vec::new(),
            first: None,
            last: None,
        }
    }

    /// Deduplicates every track in order.
    pub fn deduplicate<I, T>(params: GraphBuilderParams, tracks: I) -> WaypointSet
    where
        I: IntoIterator<Item = T>,
        T: IntoIterator<Item = GeoPoint>,
    {
        let mut builder = GraphBuilder::new(params);
        for track in tracks {
            builder.add_track(track);
        }
        builder.finish()
    }

    /// Points added after this call belong to a new track.
    pub fn begin_track(&mut self) {
        if self.tracks.last().is_none_or(|track| !track.is_empty()) {
            self.tracks.push(Vec::new());
        }
    }

    pub fn add_track(&mut self, points: impl IntoIterator<Item = GeoPoint>) {
        self.begin_track();
        for point in points {
            self.add_point(point);
        }
    }

    pub fn add_point(&mut self, point: GeoPoint) -> WaypointId {
        self.add_labeled_point(point, None)
    }

    /// Adds a raw point and returns the waypoint it was merged into. The label is only
    /// used when the waypoint does not have one yet.
    pub fn add_labeled_point(&mut self, point: GeoPoint, label: Option<String>) -> WaypointId {
        let id = match self.index.nearest_within(
            &self.waypoints,
            &point,
            self.params.proximity_threshold,
        ) {
            Some(id) => {
                if let Some(label) = label {
                    self.waypoints[id].set_label_if_missing(label);
                }
                id
            }
            None => {
                let id = WaypointId::new(self.waypoints.len());
                let waypoint = Waypoint::new(id, point, label);
                self.index.insert(&waypoint);
                self.waypoints.push(waypoint);
                id
            }
        };

        if self.tracks.is_empty() {
            self.tracks.push(Vec::new());
        }

        if let Some(track) = self.tracks.last_mut()
            && track.last() != Some(&id)
        {
            track.push(id);
        }

        self.first.get_or_insert(id);
        self.last = Some(id);

        id
    }

    pub fn finish(mut self) -> WaypointSet {
        self.tracks.retain(|track| !track.is_empty());

        debug!(
            waypoints = self.waypoints.len(),
            tracks = self.tracks.len(),
            "Deduplicated track points"
        );

        WaypointSet {
            params: self.params,
            waypoints: self.waypoints,
            tracks: self.tracks,
            first: self.first,
            last: self.last,
        }
    }

    pub fn build<W: WeightFunction>(self, weighting: &W) -> Result<RouteGraph, GraphError> {
        self.finish().connect(weighting)
    }
}

/// Deduplicated waypoints whose edges are not weighted yet.
///
/// Keeping the two phases apart allows a road-network distance table to be fetched for
/// exactly these waypoints before connecting them.
#[derive(Debug, Clone)]
pub struct WaypointSet {
    params: GraphBuilderParams,
    waypoints: Vec<Waypoint>,
    tracks: Vec<Vec<WaypointId>>,
    first: Option<WaypointId>,
    last: Option<WaypointId>,
}

impl WaypointSet {
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn points(&self) -> Vec<GeoPoint> {
        self.waypoints
            .iter()
            .map(|waypoint| *waypoint.point())
            .collect()
    }

    /// Consecutive waypoint pairs in visiting order, including the links between tracks
    /// when they are chained.
    fn links(&self) -> Vec<(WaypointId, WaypointId)> {
        let mut links = Vec::new();
        let mut previous_track_end: Option<WaypointId> = None;

        for track in &self.tracks {
            if self.params.chain_tracks
                && let (Some(from), Some(&to)) = (previous_track_end, track.first())
            {
                links.push((from, to));
            }

            links.extend(track.windows(2).map(|pair| (pair[0], pair[1])));
            previous_track_end = track.last().copied();
        }

        links
    }

    pub fn connect<W: WeightFunction>(self, weighting: &W) -> Result<RouteGraph, GraphError> {
        if self.waypoints.len() < 2 {
            return Err(GraphError::Degenerate {
                waypoints: self.waypoints.len(),
            });
        }

        let links = self.links();

        let graph = timer_debug!("Connect waypoints", {
            let mut graph = RouteGraph::empty(
                self.waypoints,
                self.params.directed,
                self.first,
                self.last,
            );

            let mut seen = FxHashMap::default();
            for (from, to) in links {
                let weight = {
                    let waypoints = graph.waypoints();
                    weighting.weight(waypoints[from].point(), waypoints[to].point())
                };
                graph.add_edge(&mut seen, from, to, weight);
            }

            graph
        });

        info!(
            waypoints = graph.len(),
            edges = graph.edges().len(),
            directed = graph.is_directed(),
            "Built route graph"
        );

        Ok(graph)
    }
}

/// Deduplicates and connects `tracks` in one go.
pub fn build_graph<I, T, W>(
    tracks: I,
    params: GraphBuilderParams,
    weighting: &W,
) -> Result<RouteGraph, GraphError>
where
    I: IntoIterator<Item = T>,
    T: IntoIterator<Item = GeoPoint>,
    W: WeightFunction,
{
    GraphBuilder::deduplicate(params, tracks).connect(weighting)
}
