use thiserror::Error;

use crate::graph::WaypointId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("Graph has no waypoints")]
    NoWaypoints,

    #[error("No path from waypoint {from} to waypoint {to}")]
    UnreachableTarget { from: WaypointId, to: WaypointId },

    #[error("Waypoint {0} does not exist in the graph")]
    UnknownWaypoint(WaypointId),

    #[error("Tour over {count} waypoints exceeds the limit of {max}")]
    TooManyWaypoints { count: usize, max: usize },
}

impl RoutingError {
    pub fn user_message(&self) -> &'static str {
        match self {
            RoutingError::NoWaypoints => "track file empty or corrupt",
            RoutingError::UnreachableTarget { .. } => "no route found between points",
            RoutingError::UnknownWaypoint(_) => "unknown point on the route",
            RoutingError::TooManyWaypoints { .. } => "too many points to plan a tour",
        }
    }
}
