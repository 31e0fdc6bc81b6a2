use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    gpx::{GpxDocument, GpxError},
    graph::{GraphBuilder, GraphBuilderParams, GraphError, RouteGraph, WaypointSet},
    routing::{OptimizationMode, OptimizedRoute, OptimizerParams, RoutingError, optimize},
    weighting::WeightFunction,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    #[error("Failed to parse GPX file #{file}: {source}")]
    Gpx {
        file: usize,
        #[source]
        source: GpxError,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Routing(#[from] RoutingError),
}

impl ImportError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ImportError::Gpx { source, .. } => source.user_message(),
            ImportError::Graph(error) => error.user_message(),
            ImportError::Routing(error) => error.user_message(),
        }
    }
}

/// What to compute once the graph of an import is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    /// From the first recorded point to the last one
    #[default]
    ShortestPath,

    /// Every waypoint, starting at the first recorded point
    Tour,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ImportParams {
    pub kind: RouteKind,
    pub graph: GraphBuilderParams,
    pub optimizer: OptimizerParams,
}

/// Result of one import. The graph is kept so later recalculations run against the same
/// waypoints.
#[derive(Debug, Clone)]
pub struct ImportedRoute {
    pub graph: RouteGraph,
    pub route: OptimizedRoute,
}

/// Parses every file and deduplicates their points, each file being one track.
pub fn deduplicate_files(
    files: &[&[u8]],
    params: &GraphBuilderParams,
) -> Result<WaypointSet, ImportError> {
    let documents = files
        .iter()
        .enumerate()
        .map(|(file, bytes)| {
            GpxDocument::parse(bytes).map_err(|source| ImportError::Gpx { file, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder = GraphBuilder::new(*params);
    for document in &documents {
        builder.begin_track();
        for track_point in document.track_points() {
            builder.add_labeled_point(track_point.point, track_point.name);
        }
    }

    Ok(builder.finish())
}

/// Connects `waypoints` and optimizes from the graph start.
pub fn optimize_waypoints<W: WeightFunction>(
    waypoints: WaypointSet,
    weighting: &W,
    params: &ImportParams,
) -> Result<ImportedRoute, ImportError> {
    let graph = waypoints.connect(weighting)?;

    let (Some(origin), Some(target)) = (graph.start_waypoint(), graph.end_waypoint()) else {
        return Err(RoutingError::NoWaypoints.into());
    };

    let mode = match params.kind {
        RouteKind::ShortestPath => OptimizationMode::ShortestPath { target },
        RouteKind::Tour => OptimizationMode::Tour,
    };

    let route = optimize(&graph, origin, mode, &params.optimizer)?;

    Ok(ImportedRoute { graph, route })
}

/// Full pipeline from raw GPX files to an optimized route over a new graph.
///
/// Nothing is returned unless every stage succeeds.
pub fn optimize_gpx<W: WeightFunction>(
    files: &[&[u8]],
    weighting: &W,
    params: &ImportParams,
) -> Result<ImportedRoute, ImportError> {
    let waypoints = deduplicate_files(files, &params.graph)?;
    let imported = optimize_waypoints(waypoints, weighting, params)?;

    info!(
        files = files.len(),
        waypoints = imported.graph.len(),
        route_waypoints = imported.route.waypoints().len(),
        "Imported GPX route"
    );

    Ok(imported)
}

#[cfg(test)]
mod tests {
    use crate::{graph::WaypointId, weighting::GreatCircleDistance};

    use super::*;

    const FIRST: &str = r#"<gpx><trk><trkseg>
        <trkpt lat="48.0000" lon="2.0000"><name>Depot</name></trkpt>
        <trkpt lat="48.0010" lon="2.0000"/>
    </trkseg></trk></gpx>"#;

    const SECOND: &str = r#"<gpx><trk><trkseg>
        <trkpt lat="48.0020" lon="2.0000"/>
        <trkpt lat="48.0030" lon="2.0000"/>
    </trkseg></trk></gpx>"#;

    #[test]
    fn test_files_are_chained() {
        let imported = optimize_gpx(
            &[FIRST.as_bytes(), SECOND.as_bytes()],
            &GreatCircleDistance,
            &ImportParams::default(),
        )
        .unwrap();

        assert_eq!(imported.graph.len(), 4);
        assert_eq!(
            imported.route.waypoints(),
            [0, 1, 2, 3].map(WaypointId::new)
        );
        assert_eq!(imported.graph.waypoints()[0].label(), Some("Depot"));
    }

    #[test]
    fn test_bad_file_is_reported_with_its_position() {
        let error = optimize_gpx(
            &[FIRST.as_bytes(), b"<gpx></gpx>"],
            &GreatCircleDistance,
            &ImportParams::default(),
        )
        .unwrap_err();

        assert_eq!(
            error,
            ImportError::Gpx {
                file: 1,
                source: GpxError::EmptyTrack
            }
        );
        assert_eq!(error.user_message(), "track file empty or corrupt");
    }

    #[test]
    fn test_single_location_is_degenerate() {
        let xml = r#"<gpx><trk><trkseg>
            <trkpt lat="48.0" lon="2.0"/><trkpt lat="48.00001" lon="2.0"/>
        </trkseg></trk></gpx>"#;

        let error = optimize_gpx(
            &[xml.as_bytes()],
            &GreatCircleDistance,
            &ImportParams::default(),
        )
        .unwrap_err();

        assert!(matches!(error, ImportError::Graph(GraphError::Degenerate { .. })));
    }

    #[test]
    fn test_tour_starts_at_first_point() {
        let params = ImportParams {
            kind: RouteKind::Tour,
            ..ImportParams::default()
        };

        let imported = optimize_gpx(&[SECOND.as_bytes(), FIRST.as_bytes()], &GreatCircleDistance, &params)
            .unwrap();

        assert_eq!(imported.route.origin(), Some(WaypointId::new(0)));
        assert_eq!(imported.route.waypoints().len(), 4);
    }
}
