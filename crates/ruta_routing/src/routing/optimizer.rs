use tracing::{debug, info, instrument};

use crate::{
    geopoint::GeoPoint,
    graph::{RouteGraph, WaypointId},
    meters::Meters,
    timer_debug,
};

use super::{
    cost_matrix::CostMatrix,
    dijkstra::dijkstra,
    optimized_route::OptimizedRoute,
    optimizer_params::{OptimizationMode, OptimizerParams},
    routing_error::RoutingError,
    tour::Tour,
    two_opt::improve_tour,
};

/// Computes a route over `graph` starting at `origin`.
///
/// The graph is never modified and no I/O happens, so concurrent calls over the same
/// graph are independent.
#[instrument(skip(graph, params), level = "debug")]
pub fn optimize(
    graph: &RouteGraph,
    origin: WaypointId,
    mode: OptimizationMode,
    params: &OptimizerParams,
) -> Result<OptimizedRoute, RoutingError> {
    if graph.is_empty() {
        return Err(RoutingError::NoWaypoints);
    }

    if !graph.contains(origin) {
        return Err(RoutingError::UnknownWaypoint(origin));
    }

    let route = match mode {
        OptimizationMode::ShortestPath { target } => {
            shortest_path(graph, origin, target, params)?
        }
        OptimizationMode::Tour => tour(graph, origin, params)?,
    };

    info!(
        waypoints = route.waypoints().len(),
        distance = %route.total_distance(),
        "Optimized route"
    );

    Ok(route)
}

fn shortest_path(
    graph: &RouteGraph,
    origin: WaypointId,
    target: WaypointId,
    params: &OptimizerParams,
) -> Result<OptimizedRoute, RoutingError> {
    if !graph.contains(target) {
        return Err(RoutingError::UnknownWaypoint(target));
    }

    let mode = OptimizationMode::ShortestPath { target };

    if origin == target {
        return Ok(OptimizedRoute::from_waypoints(
            graph,
            mode,
            vec![origin],
            Meters::ZERO,
            0.0,
            params.average_speed,
        ));
    }

    let tree = timer_debug!("Shortest path", dijkstra(graph, origin, Some(target)));

    let (Some(path), Some(distance)) = (tree.path_to(target), tree.distance(target)) else {
        return Err(RoutingError::UnreachableTarget {
            from: origin,
            to: target,
        });
    };

    Ok(OptimizedRoute::from_waypoints(
        graph,
        mode,
        path,
        distance,
        tree.cost(target),
        params.average_speed,
    ))
}

fn tour(
    graph: &RouteGraph,
    origin: WaypointId,
    params: &OptimizerParams,
) -> Result<OptimizedRoute, RoutingError> {
    if graph.len() > params.max_tour_waypoints {
        return Err(RoutingError::TooManyWaypoints {
            count: graph.len(),
            max: params.max_tour_waypoints,
        });
    }

    let matrix = CostMatrix::from_graph(graph);

    let mut tour = Tour::nearest_neighbor(&matrix, origin, params.return_to_origin)?;
    let greedy_cost = tour.cost(&matrix);

    let statistics = timer_debug!(
        "2-opt",
        improve_tour(&mut tour, &matrix, &params.termination)
    );

    debug!(
        greedy_cost,
        improved_cost = tour.cost(&matrix),
        iterations = statistics.iterations,
        applied_moves = statistics.applied_moves,
        "Improved tour"
    );

    let total_distance = tour.distance(&matrix);
    let total_cost = tour.cost(&matrix);
    let stops = tour.into_sequence();

    let waypoints = if params.allow_revisits {
        expand_legs(&matrix, &stops)?
    } else {
        stops
    };

    Ok(OptimizedRoute::from_waypoints(
        graph,
        OptimizationMode::Tour,
        waypoints,
        total_distance,
        total_cost,
        params.average_speed,
    ))
}

/// Replaces every leg between two stops with the graph path it stands for.
fn expand_legs(matrix: &CostMatrix, stops: &[WaypointId]) -> Result<Vec<WaypointId>, RoutingError> {
    let mut waypoints = Vec::with_capacity(stops.len());
    waypoints.extend(stops.first().copied());

    for leg in stops.windows(2) {
        let (from, to) = (leg[0], leg[1]);
        let path = matrix
            .path(from, to)
            .ok_or(RoutingError::UnreachableTarget { from, to })?;

        waypoints.extend(path.into_iter().skip(1));
    }

    Ok(waypoints)
}

/// Snaps `position` to the nearest waypoint and computes a new shortest path to `target`.
pub fn reroute_from(
    graph: &RouteGraph,
    position: &GeoPoint,
    target: WaypointId,
    params: &OptimizerParams,
) -> Result<OptimizedRoute, RoutingError> {
    let origin = graph
        .nearest_waypoint(position)
        .ok_or(RoutingError::NoWaypoints)?;

    debug!(%origin, %target, "Rerouting from current position");

    optimize(
        graph,
        origin,
        OptimizationMode::ShortestPath { target },
        params,
    )
}

/// Snaps `position` to the nearest waypoint and chains shortest paths through `stops`, in
/// the given order. Used to recalculate a tour without dropping the stops left to visit.
pub fn reroute_through(
    graph: &RouteGraph,
    position: &GeoPoint,
    stops: &[WaypointId],
    params: &OptimizerParams,
) -> Result<OptimizedRoute, RoutingError> {
    let origin = graph
        .nearest_waypoint(position)
        .ok_or(RoutingError::NoWaypoints)?;

    debug!(%origin, stops = stops.len(), "Rerouting through remaining stops");

    let mut waypoints = vec![origin];
    let mut total_distance = Meters::ZERO;
    let mut total_cost = 0.0;
    let mut current = origin;

    for &stop in stops {
        if !graph.contains(stop) {
            return Err(RoutingError::UnknownWaypoint(stop));
        }
        if stop == current {
            continue;
        }

        let tree = dijkstra(graph, current, Some(stop));
        let (Some(path), Some(distance)) = (tree.path_to(stop), tree.distance(stop)) else {
            return Err(RoutingError::UnreachableTarget {
                from: current,
                to: stop,
            });
        };

        waypoints.extend(path.into_iter().skip(1));
        total_distance += distance;
        total_cost += tree.cost(stop);
        current = stop;
    }

    Ok(OptimizedRoute::from_waypoints(
        graph,
        OptimizationMode::Tour,
        waypoints,
        total_distance,
        total_cost,
        params.average_speed,
    ))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{square_graph, triangle_graph};

    use super::*;

    #[test]
    fn test_origin_equals_target() {
        let graph = square_graph();
        let route = optimize(
            &graph,
            WaypointId::new(2),
            OptimizationMode::ShortestPath {
                target: WaypointId::new(2),
            },
            &OptimizerParams::default(),
        )
        .unwrap();

        assert_eq!(route.waypoints(), [WaypointId::new(2)]);
        assert_eq!(route.total_distance(), Meters::ZERO);
    }

    #[test]
    fn test_unknown_waypoints() {
        let graph = square_graph();

        assert_eq!(
            optimize(
                &graph,
                WaypointId::new(9),
                OptimizationMode::Tour,
                &OptimizerParams::default()
            )
            .unwrap_err(),
            RoutingError::UnknownWaypoint(WaypointId::new(9))
        );

        assert_eq!(
            optimize(
                &graph,
                WaypointId::new(0),
                OptimizationMode::ShortestPath {
                    target: WaypointId::new(7)
                },
                &OptimizerParams::default()
            )
            .unwrap_err(),
            RoutingError::UnknownWaypoint(WaypointId::new(7))
        );
    }

    #[test]
    fn test_empty_graph() {
        let graph = RouteGraph::from_parts(Vec::new(), Vec::new(), false);

        assert_eq!(
            optimize(
                &graph,
                WaypointId::new(0),
                OptimizationMode::Tour,
                &OptimizerParams::default()
            )
            .unwrap_err(),
            RoutingError::NoWaypoints
        );
    }

    #[test]
    fn test_tour_over_too_many_waypoints_is_rejected() {
        let graph = square_graph();
        let params = OptimizerParams {
            max_tour_waypoints: 3,
            ..OptimizerParams::default()
        };

        assert_eq!(
            optimize(&graph, WaypointId::new(0), OptimizationMode::Tour, &params).unwrap_err(),
            RoutingError::TooManyWaypoints { count: 4, max: 3 }
        );

        // Shortest paths do not need the cost matrix
        assert!(
            optimize(
                &graph,
                WaypointId::new(0),
                OptimizationMode::ShortestPath {
                    target: WaypointId::new(2)
                },
                &params
            )
            .is_ok()
        );
    }

    #[test]
    fn test_reroute_through_keeps_remaining_stops() {
        let graph = square_graph();
        let near_b = *graph.waypoint(WaypointId::new(1)).unwrap().point();

        let route = reroute_through(
            &graph,
            &near_b,
            &[2, 3].map(WaypointId::new),
            &OptimizerParams::default(),
        )
        .unwrap();

        assert_eq!(route.mode(), OptimizationMode::Tour);
        assert_eq!(route.origin(), Some(WaypointId::new(1)));
        assert_eq!(route.destination(), Some(WaypointId::new(3)));
        assert!(route.waypoints().contains(&WaypointId::new(2)));
        assert!(route.total_distance() > Meters::ZERO);
    }

    #[test]
    fn test_shortest_path_avoids_expensive_edge() {
        let graph = triangle_graph();
        let route = optimize(
            &graph,
            WaypointId::new(0),
            OptimizationMode::ShortestPath {
                target: WaypointId::new(2),
            },
            &OptimizerParams::default(),
        )
        .unwrap();

        assert_eq!(route.waypoints(), [0, 1, 2].map(WaypointId::new));
        assert_eq!(route.points().len(), 3);
    }

    #[test]
    fn test_tour_visits_every_waypoint_once() {
        let graph = square_graph();
        let route = optimize(
            &graph,
            WaypointId::new(0),
            OptimizationMode::Tour,
            &OptimizerParams::default(),
        )
        .unwrap();

        let mut waypoints = route.waypoints().to_vec();
        assert_eq!(waypoints[0], WaypointId::new(0));
        waypoints.sort();
        waypoints.dedup();
        assert_eq!(waypoints.len(), 4);
        assert_eq!(route.waypoints().len(), 4);
    }

    #[test]
    fn test_tour_with_revisits_follows_edges() {
        let graph = triangle_graph();
        let params = OptimizerParams {
            allow_revisits: true,
            return_to_origin: true,
            ..OptimizerParams::default()
        };

        let route = optimize(&graph, WaypointId::new(0), OptimizationMode::Tour, &params).unwrap();

        // Consecutive waypoints are always adjacent in the graph
        for pair in route.waypoints().windows(2) {
            assert!(
                graph.neighbors(pair[0]).any(|(adj, _)| adj == pair[1]),
                "{pair:?}"
            );
        }
        assert_eq!(route.waypoints().first(), route.waypoints().last());
    }

    #[test]
    fn test_duration_follows_average_speed() {
        let graph = square_graph();
        let route = optimize(
            &graph,
            WaypointId::new(0),
            OptimizationMode::ShortestPath {
                target: WaypointId::new(1),
            },
            &OptimizerParams::default(),
        )
        .unwrap();

        let expected = route.total_distance().value() / (40.0 / 3.6);
        assert!((route.total_duration().as_secs_f64() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_reroute_snaps_to_nearest_waypoint() {
        let graph = square_graph();
        let near_third = graph.waypoint(WaypointId::new(3)).unwrap().point();
        let position = GeoPoint::new(near_third.lat + 0.00001, near_third.lon);

        let route = reroute_from(
            &graph,
            &position,
            WaypointId::new(1),
            &OptimizerParams::default(),
        )
        .unwrap();

        assert_eq!(route.origin(), Some(WaypointId::new(3)));
        assert_eq!(route.destination(), Some(WaypointId::new(1)));
    }
}
