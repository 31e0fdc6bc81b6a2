mod cost_matrix;
mod dijkstra;
mod optimized_route;
mod optimizer;
mod optimizer_params;
mod routing_error;
mod tour;
mod two_opt;

pub use cost_matrix::CostMatrix;
pub use dijkstra::{ShortestPathTree, dijkstra};
pub use optimized_route::OptimizedRoute;
pub use optimizer::{optimize, reroute_from, reroute_through};
pub use optimizer_params::{MAX_TOUR_WAYPOINTS, OptimizationMode, OptimizerParams, Termination};
pub use routing_error::RoutingError;
pub use tour::Tour;
pub use two_opt::{TwoOptStatistics, improve_tour};
