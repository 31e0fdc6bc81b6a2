use ruta_routing::{
    geopoint::GeoPoint,
    graph::{GraphBuilderParams, RouteGraph, Waypoint, WaypointId, build_graph},
    import::{ImportParams, optimize_gpx},
    routing::{OptimizationMode, OptimizerParams, Termination, Tour, optimize},
    weighting::{GreatCircleDistance, RoadNetworkDistance, WeightFunction},
};

use crate::test_utils::{
    TRIANGLE_A, TRIANGLE_B, TRIANGLE_C, exhaustive_shortest_distance, gpx_track, random_walk,
};

mod test_utils;

fn triangle_gpx() -> String {
    gpx_track(&[
        (TRIANGLE_A.lat, TRIANGLE_A.lon),
        (TRIANGLE_B.lat, TRIANGLE_B.lon),
        (TRIANGLE_C.lat, TRIANGLE_C.lon),
        (TRIANGLE_A.lat, TRIANGLE_A.lon),
    ])
}

fn shortest_to_c() -> OptimizationMode {
    OptimizationMode::ShortestPath {
        target: WaypointId::new(2),
    }
}

fn iterations_only() -> OptimizerParams {
    OptimizerParams {
        termination: vec![Termination::Iterations(500)],
        ..OptimizerParams::default()
    }
}

#[test]
fn test_triangle_takes_direct_edge_when_cheaper() {
    let gpx = triangle_gpx();
    let graph = build_graph(
        [ruta_routing::gpx::GpxDocument::parse(gpx.as_bytes())
            .unwrap()
            .points()],
        GraphBuilderParams::default(),
        &GreatCircleDistance,
    )
    .unwrap();

    assert_eq!(graph.len(), 3);

    let route = optimize(
        &graph,
        WaypointId::new(0),
        shortest_to_c(),
        &OptimizerParams::default(),
    )
    .unwrap();

    assert_eq!(route.waypoints(), [0, 2].map(WaypointId::new));
}

#[test]
fn test_triangle_goes_through_b_when_direct_edge_is_expensive() {
    let points = [TRIANGLE_A, TRIANGLE_B, TRIANGLE_C];
    #[rustfmt::skip]
    let road = RoadNetworkDistance::new(&points, vec![
            0.0, 4_000.0, 12_000.0,
        4_000.0,     0.0,  4_000.0,
       12_000.0, 4_000.0,      0.0,
    ])
    .unwrap();

    let gpx = triangle_gpx();
    let imported = optimize_gpx(&[gpx.as_bytes()], &road, &ImportParams::default()).unwrap();

    // The recorded track ends where it started, so ask for C explicitly
    let graph = imported.graph;
    let route = optimize(
        &graph,
        WaypointId::new(0),
        shortest_to_c(),
        &OptimizerParams::default(),
    )
    .unwrap();

    assert_eq!(route.waypoints(), [0, 1, 2].map(WaypointId::new));
    assert_eq!(route.points()[1].lat, TRIANGLE_B.lat);

    // Road distance is what was minimized, the great-circle length is much shorter
    assert_eq!(route.total_cost(), 8_000.0);
    assert!(route.total_distance().value() < 8_000.0);
}

fn assert_matches_exhaustive_search(graph: &RouteGraph) {
    let origin = WaypointId::new(0);
    for target in (1..graph.len()).map(WaypointId::new) {
        let route = optimize(
            graph,
            origin,
            OptimizationMode::ShortestPath { target },
            &OptimizerParams::default(),
        )
        .unwrap();

        let best = exhaustive_shortest_distance(graph, origin, target).unwrap();
        assert!(
            route.total_distance().value() <= best.value() + 1e-6,
            "target {target}: {} > {}",
            route.total_distance(),
            best
        );
    }
}

#[test]
fn test_shortest_path_matches_exhaustive_search_on_grid() {
    //
    //  6 - 7 - 8
    //  | \ |   |
    //  3 - 4 - 5
    //  |   | / |
    //  0 - 1 - 2
    //
    let waypoints = (0..9)
        .map(|i| {
            let point = GeoPoint::new(45.0 + (i / 3) as f64 * 0.001, 6.0 + (i % 3) as f64 * 0.0013);
            Waypoint::new(WaypointId::new(i), point, None)
        })
        .collect::<Vec<_>>();

    #[rustfmt::skip]
    let pairs = [
        (0, 1), (1, 2), (3, 4), (4, 5), (6, 7), (7, 8),
        (0, 3), (3, 6), (1, 4), (4, 7), (2, 5), (5, 8),
        (3, 7), (1, 5),
    ];

    let links = pairs
        .iter()
        .map(|&(from, to)| {
            let weight = GreatCircleDistance.weight(waypoints[from].point(), waypoints[to].point());
            (WaypointId::new(from), WaypointId::new(to), weight)
        })
        .collect::<Vec<_>>();

    let graph = RouteGraph::from_parts(waypoints, links, false);
    assert_matches_exhaustive_search(&graph);
}

#[test]
fn test_shortest_path_matches_exhaustive_search_on_recorded_tracks() {
    let mut checked = 0;

    for seed in 0..10 {
        let Ok(graph) = build_graph(
            [random_walk(GeoPoint::new(45.0, 6.0), 9, seed)],
            GraphBuilderParams::default(),
            &GreatCircleDistance,
        ) else {
            continue;
        };

        assert_matches_exhaustive_search(&graph);
        checked += 1;
    }

    assert!(checked > 0);
}

#[test]
fn test_optimizer_is_deterministic() {
    let track = random_walk(GeoPoint::new(50.85, 4.35), 120, 7);
    let graph = build_graph(
        [track],
        GraphBuilderParams::default(),
        &GreatCircleDistance,
    )
    .unwrap();

    for mode in [
        OptimizationMode::Tour,
        OptimizationMode::ShortestPath {
            target: graph.end_waypoint().unwrap(),
        },
    ] {
        let runs = (0..3)
            .map(|_| {
                let route =
                    optimize(&graph, WaypointId::new(0), mode, &OptimizerParams::default())
                        .unwrap();
                serde_json::to_string(&route).unwrap()
            })
            .collect::<Vec<_>>();

        assert_eq!(runs[0], runs[1]);
        assert_eq!(runs[1], runs[2]);
    }
}

#[test]
fn test_tour_is_never_worse_than_greedy() {
    let graph = build_graph(
        [random_walk(GeoPoint::new(40.4, -3.7), 80, 3)],
        GraphBuilderParams::default(),
        &GreatCircleDistance,
    )
    .unwrap();

    let matrix = ruta_routing::routing::CostMatrix::from_graph(&graph);
    let greedy = Tour::nearest_neighbor(&matrix, WaypointId::new(0), false).unwrap();

    let route = optimize(
        &graph,
        WaypointId::new(0),
        OptimizationMode::Tour,
        &iterations_only(),
    )
    .unwrap();

    let optimized = Tour::new(route.waypoints().to_vec(), false);
    assert!(optimized.cost(&matrix) <= greedy.cost(&matrix) + 1e-6);

    let mut visited = route.waypoints().to_vec();
    visited.sort();
    visited.dedup();
    assert_eq!(visited.len(), graph.len());
}
