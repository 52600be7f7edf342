//! Local search over complete assignments: one slot per event.
//!
//! Cost is the number of violated hard constraints plus, when the strategy
//! carries an objective, the objective scaled into `[0, 1)` so that it can
//! only break ties between assignments with equal violation counts.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::SlotIndex;
use crate::model::Model;
use crate::solver::{Algorithm, Infeasible, Objective, SolveRequest};

const INITIAL_TEMPERATURE: f64 = 1.0;
const MIN_TEMPERATURE: f64 = 1e-3;

struct Landscape<'a> {
    model: &'a Model,
    candidates: Vec<Vec<SlotIndex>>,
    objective: Option<Objective>,
    objective_scale: f64,
}

impl<'a> Landscape<'a> {
    fn new(model: &'a Model, objective: Option<Objective>) -> Self {
        let total_capacity: f64 = model.slots.iter().map(|s| f64::from(s.capacity)).sum();
        Self {
            model,
            candidates: model.candidates(),
            objective,
            objective_scale: (total_capacity * model.events.len() as f64).max(1.0) + 1.0,
        }
    }

    fn violations(&self, assignment: &[SlotIndex]) -> usize {
        let model = self.model;
        let mut occupancy = vec![0usize; model.slots.len()];
        let mut count = 0;
        for (event, &slot) in assignment.iter().enumerate() {
            occupancy[slot] += 1;
            if !model.admissible(event, slot) {
                count += 1;
            }
            for &other in model.clashes.get(event) {
                let other_slot = assignment[other];
                if other_slot == slot || model.concurrency[slot].contains(&other_slot) {
                    count += 1;
                }
            }
        }
        count + occupancy.iter().map(|&n| n.saturating_sub(1)).sum::<usize>()
    }

    fn objective(&self, assignment: &[SlotIndex]) -> f64 {
        match self.objective {
            None => 0.0,
            Some(Objective::CapacityDemandDifference) => assignment
                .iter()
                .enumerate()
                .map(|(event, &slot)| {
                    let capacity = f64::from(self.model.slots[slot].capacity);
                    capacity - f64::from(self.model.events[event].demand)
                })
                .sum(),
        }
    }

    fn cost(&self, assignment: &[SlotIndex]) -> f64 {
        self.violations(assignment) as f64 + self.objective(assignment) / self.objective_scale
    }

    /// Prefer admissible slots, falling back to any slot.
    fn random_slot(&self, event: usize, rng: &mut StdRng) -> SlotIndex {
        let candidates = &self.candidates[event];
        if candidates.is_empty() {
            rng.random_range(0..self.model.slots.len())
        } else {
            candidates[rng.random_range(0..candidates.len())]
        }
    }

    fn initial(&self, rng: &mut StdRng) -> Vec<SlotIndex> {
        (0..self.model.events.len())
            .map(|event| self.random_slot(event, rng))
            .collect()
    }
}

pub fn solve(
    request: &SolveRequest<'_>,
    algorithm: Algorithm,
) -> Result<Vec<SlotIndex>, Infeasible> {
    let model = request.model;
    if model.events.is_empty() {
        return Ok(Vec::new());
    }
    if model.slots.is_empty() {
        return Err(Infeasible::new("there are no slots to schedule into"));
    }
    info!(
        "Running {:?} over {} events and {} slots for {} iterations...",
        algorithm,
        model.events.len(),
        model.slots.len(),
        request.tuning.iterations
    );

    let landscape = Landscape::new(model, request.strategy.objective);
    let mut rng = StdRng::seed_from_u64(request.tuning.seed);
    let iterations = request.tuning.iterations.max(1);
    let cooling = (MIN_TEMPERATURE / INITIAL_TEMPERATURE).powf(1.0 / iterations as f64);

    let mut current = landscape.initial(&mut rng);
    let mut current_cost = landscape.cost(&current);
    let mut best = current.clone();
    let mut best_cost = current_cost;
    let mut temperature = INITIAL_TEMPERATURE;

    for iteration in 0..iterations {
        if landscape.objective.is_none() && landscape.violations(&best) == 0 {
            debug!("Feasible assignment reached after {} iterations", iteration);
            break;
        }

        let event = rng.random_range(0..current.len());
        let mut neighbour = current.clone();
        neighbour[event] = landscape.random_slot(event, &mut rng);
        let neighbour_cost = landscape.cost(&neighbour);
        let delta = neighbour_cost - current_cost;

        let accept = match algorithm {
            Algorithm::HillClimber => delta <= 0.0,
            Algorithm::SimulatedAnnealing => {
                delta <= 0.0 || rng.random::<f64>() < (-delta / temperature).exp()
            }
        };
        if accept {
            current = neighbour;
            current_cost = neighbour_cost;
            if current_cost < best_cost {
                best = current.clone();
                best_cost = current_cost;
            }
        }
        temperature *= cooling;
    }

    match landscape.violations(&best) {
        0 => Ok(best),
        remaining => Err(Infeasible::new(format!(
            "No valid solution found: best assignment still violates {} constraints",
            remaining
        ))),
    }
}
