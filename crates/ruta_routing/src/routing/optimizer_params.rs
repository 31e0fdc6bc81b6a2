use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{graph::WaypointId, kmh::Kmh};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizationMode {
    /// Cheapest path from the origin to `target`
    ShortestPath { target: WaypointId },

    /// Visit every waypoint starting from the origin
    Tour,
}

/// Budget of the tour improvement search, the first one reached stops it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Wall-clock cap. The resulting tour then depends on the machine speed, so two runs
    /// over the same graph may differ.
    Duration(SignedDuration),

    /// Number of improvement passes over the tour
    Iterations(usize),
}

/// About 32 MB of cost matrix
pub const MAX_TOUR_WAYPOINTS: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OptimizerParams {
    /// Used to derive the route duration from its distance
    pub average_speed: Kmh,

    /// Expand a tour into the full graph path between its stops, waypoints may repeat
    pub allow_revisits: bool,

    /// Close the tour with a leg back to the origin
    pub return_to_origin: bool,

    /// Defaults to an iteration budget only, which keeps tours reproducible
    pub termination: Vec<Termination>,

    /// Largest graph a tour is computed over. A tour needs a cost matrix with one entry per
    /// pair of waypoints, built before any termination budget applies.
    pub max_tour_waypoints: usize,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        OptimizerParams {
            average_speed: Kmh::new(40.0),
            allow_revisits: false,
            return_to_origin: false,
            termination: vec![Termination::Iterations(10_000)],
            max_tour_waypoints: MAX_TOUR_WAYPOINTS,
        }
    }
}
