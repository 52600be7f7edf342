use crate::data::{EventIndex, SlotIndex};
use crate::solver::{Infeasible, Objective, SolveRequest};
use good_lp::variable;
use good_lp::{
    Expression, ProblemVariables, Solution, SolverModel, Variable, constraint, default_solver,
};
use itertools::Itertools;
use log::{debug, info, trace};
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

/// solves the timetabling model using the HiGHS ILP solver.
pub fn solve(request: &SolveRequest<'_>) -> Result<Vec<SlotIndex>, Infeasible> {
    let start_time = Instant::now();
    let model = request.model;

    //model setup
    info!(
        "Setting up ILP model with {} events and {} slots...",
        model.events.len(),
        model.slots.len()
    );
    let mut problem = ProblemVariables::new();

    // x_es =  1 if event e is in slot s
    //         0 otherwise

    // unavailable and unsuitable pairs never get a variable
    let candidates = model.candidates();
    if let Some(event) = candidates.iter().position(Vec::is_empty) {
        return Err(Infeasible::new(format!(
            "event '{}' has no admissible slot",
            model.events[event].title
        )));
    }
    let all_possible_assignments: Vec<(EventIndex, SlotIndex)> = candidates
        .iter()
        .enumerate()
        .flat_map(|(event, slots)| slots.iter().map(move |&slot| (event, slot)))
        .collect();
    trace!(
        "Generated {} potential assignment variables out of a theoretical maximum of {}.",
        all_possible_assignments.len(),
        model.events.len() * model.slots.len()
    );

    // decision map
    let assignment_vars_vec =
        problem.add_vector(variable().binary(), all_possible_assignments.len());
    let assignment_vars_map: HashMap<(EventIndex, SlotIndex), Variable> = all_possible_assignments
        .iter()
        .copied()
        .zip(assignment_vars_vec.iter().copied())
        .collect();

    let objective: Expression = match request.strategy.objective {
        None => Expression::from(0.0),
        Some(Objective::CapacityDemandDifference) => assignment_vars_map
            .iter()
            .map(|(&(event, slot), &var)| {
                let capacity = f64::from(model.slots[slot].capacity);
                (capacity - f64::from(model.events[event].demand)) * var
            })
            .sum(),
    };
    debug!("Objective: {:?}", request.strategy.objective);

    let seed = i32::try_from(request.tuning.seed % i32::MAX as u64).unwrap_or_default();
    let mut lp = problem
        .minimise(objective)
        .using(default_solver)
        .set_option("threads", 1) // limit to 1 thread for reproducibility
        .set_option("random_seed", seed)
        .set_option("log_to_console", "false");

    // begin hard constraints
    info!("Adding 'event scheduled once' constraints...");
    let by_event = assignment_vars_map
        .iter()
        .map(|(&(event, _), &var)| (event, var))
        .into_group_map();
    for vars in by_event.values() {
        let scheduled_once: Expression = vars.iter().copied().sum();
        lp.add_constraint(constraint!(scheduled_once == 1));
    }

    info!("Adding 'no slot double-booking' constraints...");
    let by_slot = assignment_vars_map
        .iter()
        .map(|(&(_, slot), &var)| (slot, var))
        .into_group_map();
    for vars in by_slot.values().filter(|vars| vars.len() > 1) {
        let slot_occupied: Expression = vars.iter().copied().sum();
        lp.add_constraint(constraint!(slot_occupied <= 1));
    }

    // clashing events cannot run concurrently, whichever side declared it
    info!("Adding 'no concurrent clashes' constraints...");
    let clash_pairs: BTreeSet<(EventIndex, EventIndex)> = model
        .clashes
        .iter()
        .flat_map(|(event, others)| {
            others
                .iter()
                .map(move |&other| (event.min(other), event.max(other)))
        })
        .collect();
    let mut clash_constraints = 0usize;
    for &(first, second) in &clash_pairs {
        for &slot in &candidates[first] {
            let first_var = assignment_vars_map[&(first, slot)];
            for &concurrent in &model.concurrency[slot] {
                if let Some(&second_var) = assignment_vars_map.get(&(second, concurrent)) {
                    lp.add_constraint(constraint!(first_var + second_var <= 1));
                    clash_constraints += 1;
                }
            }
        }
    }
    trace!(
        "Added {} clash constraints for {} clashing pairs.",
        clash_constraints,
        clash_pairs.len()
    );

    //solve
    info!("Starting ILP solver...");
    let solution = match lp.solve() {
        Ok(s) => s,
        Err(e) => {
            return Err(Infeasible::new(format!(
                "No solution found. The problem might be too constrained. Solver error: {}",
                e
            )));
        }
    };
    info!("ILP solved in {:.2?}", start_time.elapsed());

    // get assignments from solution
    let mut assignment = vec![None; model.events.len()];
    for (&(event, slot), &var) in &assignment_vars_map {
        if solution.value(var) > 0.9 {
            assignment[event] = Some(slot);
        }
    }
    assignment
        .into_iter()
        .enumerate()
        .map(|(event, slot)| {
            slot.ok_or_else(|| {
                Infeasible::new(format!("solver left event {} unscheduled", event))
            })
        })
        .collect()
}
