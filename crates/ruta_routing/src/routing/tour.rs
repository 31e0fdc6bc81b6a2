use fixedbitset::FixedBitSet;

use crate::{graph::WaypointId, meters::Meters};

use super::{cost_matrix::CostMatrix, routing_error::RoutingError};

/// Visiting order over the cost matrix, `stops[0]` is the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    stops: Vec<WaypointId>,

    /// The last stop travels back to the origin
    closed: bool,
}

impl Tour {
    pub fn new(stops: Vec<WaypointId>, closed: bool) -> Self {
        Tour { stops, closed }
    }

    /// Greedy construction: always move to the cheapest unvisited waypoint, ties go to the
    /// lower id.
    pub fn nearest_neighbor(
        matrix: &CostMatrix,
        origin: WaypointId,
        closed: bool,
    ) -> Result<Tour, RoutingError> {
        let size = matrix.size();
        let mut visited = FixedBitSet::with_capacity(size);
        let mut stops = Vec::with_capacity(size);

        visited.insert(origin.get());
        stops.push(origin);

        let mut current = origin;
        while stops.len() < size {
            let mut best: Option<(f64, WaypointId)> = None;

            for candidate in visited.zeroes().map(WaypointId::new) {
                let cost = matrix.cost(current, candidate);
                if !cost.is_finite() {
                    continue;
                }

                if best.is_none_or(|(best_cost, _)| cost < best_cost) {
                    best = Some((cost, candidate));
                }
            }

            let Some((_, next)) = best else {
                let to = visited
                    .zeroes()
                    .next()
                    .map(WaypointId::new)
                    .unwrap_or(current);
                return Err(RoutingError::UnreachableTarget { from: current, to });
            };

            visited.insert(next.get());
            stops.push(next);
            current = next;
        }

        if closed && !matrix.cost(current, origin).is_finite() {
            return Err(RoutingError::UnreachableTarget {
                from: current,
                to: origin,
            });
        }

        Ok(Tour { stops, closed })
    }

    pub fn stops(&self) -> &[WaypointId] {
        &self.stops
    }

    pub(crate) fn stops_mut(&mut self) -> &mut Vec<WaypointId> {
        &mut self.stops
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn origin(&self) -> Option<WaypointId> {
        self.stops.first().copied()
    }

    /// Stop after position `index`, wrapping to the origin on closed tours.
    pub fn next_stop(&self, index: usize) -> Option<WaypointId> {
        match self.stops.get(index + 1) {
            Some(&stop) => Some(stop),
            None if self.closed && index + 1 == self.stops.len() => self.origin(),
            None => None,
        }
    }

    /// Consecutive legs, including the closing one.
    pub fn legs(&self) -> impl Iterator<Item = (WaypointId, WaypointId)> + '_ {
        (0..self.stops.len())
            .filter_map(|index| self.next_stop(index).map(|next| (self.stops[index], next)))
    }

    pub fn cost(&self, matrix: &CostMatrix) -> f64 {
        self.legs().map(|(from, to)| matrix.cost(from, to)).sum()
    }

    pub fn distance(&self, matrix: &CostMatrix) -> Meters {
        self.legs().map(|(from, to)| matrix.distance(from, to)).sum()
    }

    /// Stops in travel order, ending with the origin again when closed.
    pub fn into_sequence(self) -> Vec<WaypointId> {
        let mut stops = self.stops;
        if self.closed && stops.len() > 1 {
            stops.push(stops[0]);
        }
        stops
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::square_graph;

    use super::*;

    #[test]
    fn test_nearest_neighbor_visits_all_once() {
        let graph = square_graph();
        let matrix = CostMatrix::from_graph(&graph);

        let tour = Tour::nearest_neighbor(&matrix, WaypointId::new(0), false).unwrap();

        let mut stops = tour.stops().to_vec();
        stops.sort();
        assert_eq!(stops, [0, 1, 2, 3].map(WaypointId::new).to_vec());
        assert_eq!(tour.origin(), Some(WaypointId::new(0)));
    }

    #[test]
    fn test_closed_tour_returns_to_origin() {
        let graph = square_graph();
        let matrix = CostMatrix::from_graph(&graph);

        let tour = Tour::nearest_neighbor(&matrix, WaypointId::new(0), true).unwrap();
        assert_eq!(tour.legs().count(), 4);

        let sequence = tour.into_sequence();
        assert_eq!(sequence.first(), sequence.last());
    }

    #[test]
    fn test_equal_costs_pick_lower_id() {
        let graph = square_graph();
        let matrix = CostMatrix::from_graph(&graph);

        // Waypoints 1 and 3 are both one side away from 0
        let tour = Tour::nearest_neighbor(&matrix, WaypointId::new(0), false).unwrap();
        assert_eq!(tour.stops()[1], WaypointId::new(1));
    }
}
