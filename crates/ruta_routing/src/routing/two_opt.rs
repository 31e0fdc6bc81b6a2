use jiff::Timestamp;
use tracing::debug;

use crate::graph::WaypointId;

use super::{cost_matrix::CostMatrix, optimizer_params::Termination, tour::Tour};

/// Moves must lower the tour cost by more than this to be applied
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Evaluated moves between two wall clock checks
const CLOCK_CHECK_INTERVAL: usize = 256;

/// **2-Opt**
///
/// Reverses the stops between positions `from` and `to` (inclusive). The origin at
/// position 0 never moves.
///
/// ```text
/// BEFORE:
///    ... (prev) --x--> [from] -> ... -> [to] --x--> (next) ...
///
/// AFTER:
///    ... (prev) -----> [to] -> ... -> [from] -----> (next) ...
/// ```
///
/// On open tours the last stop has no `next`.
#[derive(Debug, Clone, Copy)]
struct TwoOptMove {
    from: usize,
    to: usize,
}

impl TwoOptMove {
    fn symmetric_delta(&self, tour: &Tour, matrix: &CostMatrix) -> f64 {
        let stops = tour.stops();

        let prev = stops[self.from - 1];
        let from = stops[self.from];
        let to = stops[self.to];
        let next = tour.next_stop(self.to);

        let next_cost = |a: WaypointId| next.map_or(0.0, |next| matrix.cost(a, next));

        let current_cost = matrix.cost(prev, from) + next_cost(to);
        let new_cost = matrix.cost(prev, to) + next_cost(from);

        new_cost - current_cost
    }

    /// Costs of the reversed stretch change as well when the matrix is asymmetric.
    fn asymmetric_delta(&self, tour: &Tour, matrix: &CostMatrix) -> f64 {
        let stops = tour.stops();

        let prev = stops[self.from - 1];
        let next = tour.next_stop(self.to);

        let mut current_cost = matrix.cost(prev, stops[self.from]);
        let mut new_cost = matrix.cost(prev, stops[self.to]);

        for i in self.from..self.to {
            current_cost += matrix.cost(stops[i], stops[i + 1]);
            new_cost += matrix.cost(stops[i + 1], stops[i]);
        }

        if let Some(next) = next {
            current_cost += matrix.cost(stops[self.to], next);
            new_cost += matrix.cost(stops[self.from], next);
        }

        if !new_cost.is_finite() {
            return f64::INFINITY;
        }

        new_cost - current_cost
    }

    fn delta(&self, tour: &Tour, matrix: &CostMatrix) -> f64 {
        if matrix.is_symmetric() {
            self.symmetric_delta(tour, matrix)
        } else {
            self.asymmetric_delta(tour, matrix)
        }
    }

    fn apply(&self, tour: &mut Tour) {
        tour.stops_mut()[self.from..=self.to].reverse();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TwoOptStatistics {
    pub iterations: usize,
    pub applied_moves: usize,
    pub evaluated_moves: usize,
}

struct SearchState {
    start: Timestamp,
    iteration: usize,
}

fn check_termination(state: &SearchState, termination: &Termination) -> bool {
    match *termination {
        Termination::Iterations(max_iterations) => state.iteration >= max_iterations,
        Termination::Duration(max_duration) => {
            Timestamp::now().duration_since(state.start) > max_duration
        }
    }
}

fn should_terminate(state: &SearchState, terminations: &[Termination]) -> bool {
    terminations.iter().any(|termination| {
        if check_termination(state, termination) {
            debug!(
                "2-opt termination condition met: {:?} at iteration {}",
                termination, state.iteration
            );
            true
        } else {
            false
        }
    })
}

fn clock_exhausted(state: &SearchState, terminations: &[Termination]) -> bool {
    terminations.iter().any(|termination| {
        matches!(termination, Termination::Duration(_)) && check_termination(state, termination)
    })
}

/// Improves `tour` in place with first-improvement 2-opt.
///
/// Each iteration scans every move in a fixed order and applies the strictly improving
/// ones as they are found. The search stops when a full pass finds nothing or when the
/// budget is spent, the tour always holds the best order found so far.
pub fn improve_tour(
    tour: &mut Tour,
    matrix: &CostMatrix,
    terminations: &[Termination],
) -> TwoOptStatistics {
    let mut statistics = TwoOptStatistics::default();

    let len = tour.stops().len();
    if len < 3 {
        return statistics;
    }

    let mut state = SearchState {
        start: Timestamp::now(),
        iteration: 0,
    };

    'search: while !should_terminate(&state, terminations) {
        let mut improved = false;

        for from in 1..len - 1 {
            for to in (from + 1)..len {
                statistics.evaluated_moves += 1;
                if statistics.evaluated_moves % CLOCK_CHECK_INTERVAL == 0
                    && clock_exhausted(&state, terminations)
                {
                    break 'search;
                }

                let op = TwoOptMove { from, to };
                if op.delta(tour, matrix) < -IMPROVEMENT_EPSILON {
                    op.apply(tour);
                    statistics.applied_moves += 1;
                    improved = true;
                }
            }
        }

        state.iteration += 1;
        if !improved {
            break;
        }
    }

    statistics.iterations = state.iteration;
    statistics
}
