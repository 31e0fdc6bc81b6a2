use std::{cmp::Ordering, collections::BinaryHeap};

use fixedbitset::FixedBitSet;

use crate::{
    graph::{RouteGraph, WaypointId},
    meters::Meters,
};

#[derive(Copy, Clone, Debug)]
struct HeapItem {
    node: WaypointId,

    /// Cheapest known weight from the origin to `node`
    cost: f64,

    /// Number of edges on that path
    hops: usize,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &HeapItem) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &HeapItem) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Flipped to make this a min-heap, lower ids are popped first on ties
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.hops.cmp(&self.hops))
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Single-source shortest paths from `origin`.
///
/// Among paths of equal weight the one with fewer edges wins. Remaining ties keep the
/// first path found, which follows heap order then adjacency insertion order.
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    origin: WaypointId,
    costs: Vec<f64>,
    hops: Vec<usize>,
    distances: Vec<Meters>,
    parents: Vec<Option<WaypointId>>,
}

impl ShortestPathTree {
    pub fn origin(&self) -> WaypointId {
        self.origin
    }

    /// `f64::INFINITY` when `target` cannot be reached.
    pub fn cost(&self, target: WaypointId) -> f64 {
        self.costs.get(target.get()).copied().unwrap_or(f64::INFINITY)
    }

    pub fn is_reachable(&self, target: WaypointId) -> bool {
        self.cost(target).is_finite()
    }

    pub fn hops(&self, target: WaypointId) -> Option<usize> {
        self.is_reachable(target).then(|| self.hops[target.get()])
    }

    /// Great-circle length of the edges on the path to `target`.
    pub fn distance(&self, target: WaypointId) -> Option<Meters> {
        self.is_reachable(target)
            .then(|| self.distances[target.get()])
    }

    pub fn parent(&self, target: WaypointId) -> Option<WaypointId> {
        self.parents.get(target.get()).copied().flatten()
    }

    /// Waypoints from the origin to `target`, both included.
    pub fn path_to(&self, target: WaypointId) -> Option<Vec<WaypointId>> {
        if !self.is_reachable(target) {
            return None;
        }

        let mut path = vec![target];
        let mut current = target;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }

        path.reverse();
        Some(path)
    }

    pub(crate) fn into_parts(self) -> (Vec<f64>, Vec<Meters>, Vec<Option<WaypointId>>) {
        (self.costs, self.distances, self.parents)
    }
}

/// Runs Dijkstra from `origin`. With a `target` the search stops as soon as it is settled,
/// entries for waypoints that were not settled yet are then not final.
pub fn dijkstra(
    graph: &RouteGraph,
    origin: WaypointId,
    target: Option<WaypointId>,
) -> ShortestPathTree {
    let num_waypoints = graph.len();

    let mut tree = ShortestPathTree {
        origin,
        costs: vec![f64::INFINITY; num_waypoints],
        hops: vec![usize::MAX; num_waypoints],
        distances: vec![Meters::ZERO; num_waypoints],
        parents: vec![None; num_waypoints],
    };

    if !graph.contains(origin) {
        return tree;
    }

    let mut settled = FixedBitSet::with_capacity(num_waypoints);
    let mut heap = BinaryHeap::with_capacity(num_waypoints);

    tree.costs[origin.get()] = 0.0;
    tree.hops[origin.get()] = 0;
    heap.push(HeapItem {
        node: origin,
        cost: 0.0,
        hops: 0,
    });

    while let Some(HeapItem { node, cost, hops }) = heap.pop() {
        if settled.contains(node.get()) {
            continue;
        }

        settled.insert(node.get());

        if target == Some(node) {
            break;
        }

        for (adj_node, edge) in graph.neighbors(node) {
            if settled.contains(adj_node.get()) {
                continue;
            }

            let adj = adj_node.get();
            let new_cost = cost + edge.weight();
            let new_hops = hops + 1;

            let improves = new_cost < tree.costs[adj]
                || (new_cost == tree.costs[adj] && new_hops < tree.hops[adj]);

            if improves {
                tree.costs[adj] = new_cost;
                tree.hops[adj] = new_hops;
                tree.distances[adj] = tree.distances[node.get()] + edge.distance();
                tree.parents[adj] = Some(node);

                heap.push(HeapItem {
                    node: adj_node,
                    cost: new_cost,
                    hops: new_hops,
                });
            }
        }
    }

    tree
}

#[cfg(test)]
mod tests {
    use crate::{
        geopoint::GeoPoint,
        graph::{Waypoint, WaypointId},
    };

    use super::*;

    fn line_graph(links: Vec<(usize, usize, f64)>, num_waypoints: usize) -> RouteGraph {
        let waypoints = (0..num_waypoints)
            .map(|i| {
                Waypoint::new(
                    WaypointId::new(i),
                    GeoPoint::new(0.0, i as f64 * 0.001),
                    None,
                )
            })
            .collect();

        RouteGraph::from_parts(
            waypoints,
            links
                .into_iter()
                .map(|(from, to, weight)| (WaypointId::new(from), WaypointId::new(to), weight)),
            false,
        )
    }

    #[test]
    fn test_shortest_path() {
        let graph = line_graph(vec![(0, 1, 1.0), (1, 2, 1.0), (0, 2, 5.0), (2, 3, 1.0)], 4);
        let tree = dijkstra(&graph, WaypointId::new(0), None);

        assert_eq!(tree.cost(WaypointId::new(3)), 3.0);
        assert_eq!(
            tree.path_to(WaypointId::new(3)).unwrap(),
            [0, 1, 2, 3].map(WaypointId::new).to_vec()
        );
    }

    #[test]
    fn test_equal_cost_prefers_fewer_edges() {
        // 0 -> 1 -> 3 and 0 -> 2 -> 4 -> 3 both cost 4
        let graph = line_graph(
            vec![
                (0, 2, 1.0),
                (2, 4, 1.0),
                (4, 3, 2.0),
                (0, 1, 2.0),
                (1, 3, 2.0),
            ],
            5,
        );
        let tree = dijkstra(&graph, WaypointId::new(0), None);

        assert_eq!(tree.cost(WaypointId::new(3)), 4.0);
        assert_eq!(tree.hops(WaypointId::new(3)), Some(2));
        assert_eq!(
            tree.path_to(WaypointId::new(3)).unwrap(),
            [0, 1, 3].map(WaypointId::new).to_vec()
        );
    }

    #[test]
    fn test_unreachable() {
        let graph = line_graph(vec![(0, 1, 1.0)], 3);
        let tree = dijkstra(&graph, WaypointId::new(0), None);

        assert!(!tree.is_reachable(WaypointId::new(2)));
        assert_eq!(tree.path_to(WaypointId::new(2)), None);
        assert_eq!(tree.distance(WaypointId::new(2)), None);
    }

    #[test]
    fn test_stops_at_target() {
        let graph = line_graph(vec![(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)], 4);
        let tree = dijkstra(&graph, WaypointId::new(0), Some(WaypointId::new(1)));

        assert_eq!(tree.cost(WaypointId::new(1)), 1.0);
        assert!(!tree.is_reachable(WaypointId::new(3)));
    }
}
