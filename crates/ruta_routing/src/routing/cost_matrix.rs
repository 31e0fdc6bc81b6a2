use rayon::prelude::*;

use crate::{
    graph::{RouteGraph, WaypointId},
    meters::Meters,
    timer_debug,
};

use super::dijkstra::dijkstra;

/// Pairwise shortest-path costs between all waypoints of a graph.
///
/// Tables are flat and row-major: the entry for `(from, to)` lives at
/// `from * size + to`. Each row is the result of one Dijkstra run from `from`.
pub struct CostMatrix {
    size: usize,
    costs: Vec<f64>,
    distances: Vec<Meters>,

    /// Predecessor of `to` on the shortest path from `from`
    parents: Vec<Option<WaypointId>>,

    symmetric: bool,
}

impl CostMatrix {
    pub fn from_graph(graph: &RouteGraph) -> Self {
        let size = graph.len();

        let rows = timer_debug!(
            "Compute cost matrix",
            (0..size)
                .into_par_iter()
                .map(|from| dijkstra(graph, WaypointId::new(from), None).into_parts())
                .collect::<Vec<_>>()
        );

        let mut costs = Vec::with_capacity(size * size);
        let mut distances = Vec::with_capacity(size * size);
        let mut parents = Vec::with_capacity(size * size);

        for (row_costs, row_distances, row_parents) in rows {
            costs.extend(row_costs);
            distances.extend(row_distances);
            parents.extend(row_parents);
        }

        CostMatrix {
            size,
            costs,
            distances,
            parents,
            symmetric: !graph.is_directed(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    #[inline(always)]
    fn index(&self, from: WaypointId, to: WaypointId) -> usize {
        from.get() * self.size + to.get()
    }

    #[inline(always)]
    pub fn cost(&self, from: WaypointId, to: WaypointId) -> f64 {
        self.costs[self.index(from, to)]
    }

    pub fn distance(&self, from: WaypointId, to: WaypointId) -> Meters {
        self.distances[self.index(from, to)]
    }

    /// Full waypoint path from `from` to `to`, both included.
    pub fn path(&self, from: WaypointId, to: WaypointId) -> Option<Vec<WaypointId>> {
        if !self.cost(from, to).is_finite() {
            return None;
        }

        let mut path = vec![to];
        let mut current = to;
        while let Some(parent) = self.parents[self.index(from, current)] {
            path.push(parent);
            current = parent;
        }

        path.reverse();
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::square_graph;

    use super::*;

    #[test]
    fn test_rows_follow_waypoint_order() {
        let graph = square_graph();
        let matrix = CostMatrix::from_graph(&graph);

        assert_eq!(matrix.size(), 4);
        for i in 0..4 {
            let id = WaypointId::new(i);
            assert_eq!(matrix.cost(id, id), 0.0);
            assert_eq!(matrix.path(id, id), Some(vec![id]));
        }

        let a = WaypointId::new(0);
        let c = WaypointId::new(2);
        assert_eq!(matrix.cost(a, c), matrix.cost(c, a));
        assert_eq!(matrix.path(a, c).map(|path| path.len()), Some(3));
    }
}
