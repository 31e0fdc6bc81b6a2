use serde::Serialize;

use crate::{define_index_newtype, meters::Meters};

use super::waypoint::WaypointId;

define_index_newtype!(EdgeId, Edge);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    from: WaypointId,
    to: WaypointId,

    /// Cost used by the optimizer, produced by the graph's weight function
    weight: f64,

    /// Great-circle length, independent of the weight function
    distance: Meters,
}

impl Edge {
    pub fn new(from: WaypointId, to: WaypointId, weight: f64, distance: Meters) -> Self {
        Edge {
            from,
            to,
            weight,
            distance,
        }
    }

    pub fn from(&self) -> WaypointId {
        self.from
    }

    pub fn to(&self) -> WaypointId {
        self.to
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn distance(&self) -> Meters {
        self.distance
    }

    /// The other end of the edge when leaving from `node`.
    pub fn adj_node(&self, node: WaypointId) -> WaypointId {
        if self.from == node { self.to } else { self.from }
    }

    pub(crate) fn keep_cheapest(&mut self, weight: f64, distance: Meters) {
        if weight < self.weight {
            self.weight = weight;
            self.distance = distance;
        }
    }
}
