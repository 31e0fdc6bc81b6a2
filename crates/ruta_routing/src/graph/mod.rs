mod edge;
mod graph_builder;
mod graph_error;
mod route_graph;
mod spatial_index;
mod waypoint;

pub use edge::{Edge, EdgeId};
pub use graph_builder::{GraphBuilder, GraphBuilderParams, WaypointSet, build_graph};
pub use graph_error::GraphError;
pub use route_graph::RouteGraph;
pub use waypoint::{Waypoint, WaypointId};
