//! Strategy registry and the orchestrator that dispatches a model to an
//! optimisation capability.

use std::time::Instant;

use log::{info, trace};
use serde::Serialize;
use thiserror::Error;

use crate::data::{EventIndex, SlotIndex};
use crate::error::{IndexKind, Result, SchedulerError};
use crate::model::Model;
use crate::{heuristic, ilp};

/// Objective hook a strategy optimises once all hard constraints hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Minimise seats left empty: slot capacity minus event demand.
    CapacityDemandDifference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    HillClimber,
    SimulatedAnnealing,
}

/// Which optimisation capability a strategy invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "algorithm")]
pub enum CapabilityKind {
    /// Exact integer programming.
    Exact,
    LocalSearch(Algorithm),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Strategy {
    pub name: &'static str,
    pub capability: CapabilityKind,
    pub objective: Option<Objective>,
}

/// Every strategy the orchestrator knows about.
pub const STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "highs",
        capability: CapabilityKind::Exact,
        objective: None,
    },
    Strategy {
        name: "highs_efficiency",
        capability: CapabilityKind::Exact,
        objective: Some(Objective::CapacityDemandDifference),
    },
    Strategy {
        name: "hill_climber",
        capability: CapabilityKind::LocalSearch(Algorithm::HillClimber),
        objective: None,
    },
    Strategy {
        name: "simulated_annealing",
        capability: CapabilityKind::LocalSearch(Algorithm::SimulatedAnnealing),
        objective: None,
    },
];

/// Look up a registered strategy by name.
pub fn strategy(name: &str) -> Result<&'static Strategy> {
    STRATEGIES
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| SchedulerError::UnknownStrategy(name.to_owned()))
}

/// Knobs shared by every run, independent of the chosen strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuning {
    /// Seed for the MIP solver and the local-search RNG.
    pub seed: u64,
    /// Local-search iteration budget.
    pub iterations: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            seed: 1234,
            iterations: 20_000,
        }
    }
}

/// Everything a capability receives: the model, the strategy's fixed
/// parameters and the run tuning.
#[derive(Debug, Clone, Copy)]
pub struct SolveRequest<'a> {
    pub model: &'a Model,
    pub strategy: &'a Strategy,
    pub tuning: Tuning,
}

/// No assignment satisfies the hard constraints, as far as the capability
/// could tell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct Infeasible {
    pub reason: String,
}

impl Infeasible {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The uniform call contract of an optimisation capability.
///
/// Implementations must honour the unavailability, clash and unsuitability
/// tables of the model and return exactly one slot index per event.
pub trait Capability: Send + Sync {
    fn solve(&self, request: &SolveRequest<'_>) -> std::result::Result<Vec<SlotIndex>, Infeasible>;
}

/// Why a solve produced no timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub strategy: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// One `(event, slot)` pair per event, in event order.
    Scheduled(Vec<(EventIndex, SlotIndex)>),
    /// The constraints could not be satisfied. This is an expected outcome.
    NoSolution(Diagnostic),
}

/// Dispatches models to a capability by strategy name.
pub struct Orchestrator<C> {
    capability: C,
    tuning: Tuning,
}

impl<C: Capability> Orchestrator<C> {
    pub fn new(capability: C) -> Self {
        Self::with_tuning(capability, Tuning::default())
    }

    pub fn with_tuning(capability: C, tuning: Tuning) -> Self {
        Self { capability, tuning }
    }

    /// Solve `model` with the named strategy.
    ///
    /// Unknown names fail before the capability is invoked. Infeasibility is
    /// returned as [`SolveOutcome::NoSolution`] and left to the caller to
    /// report.
    pub fn solve(&self, model: &Model, strategy_name: &str) -> Result<SolveOutcome> {
        let strategy = strategy(strategy_name)?;
        info!("Scheduling conference using {} strategy...", strategy.name);
        trace!(
            "Dispatching {} events and {} slots to {:?}",
            model.events.len(),
            model.slots.len(),
            strategy.capability
        );

        let start_time = Instant::now();
        let request = SolveRequest {
            model,
            strategy,
            tuning: self.tuning,
        };
        let assignment = match self.capability.solve(&request) {
            Ok(assignment) => assignment,
            Err(infeasible) => {
                return Ok(SolveOutcome::NoSolution(Diagnostic {
                    strategy: strategy.name.to_owned(),
                    reason: infeasible.reason,
                }));
            }
        };
        info!("Solution found in {:.2?}", start_time.elapsed());

        validate(model, &assignment)?;
        Ok(SolveOutcome::Scheduled(assignment.into_iter().enumerate().collect()))
    }
}

fn validate(model: &Model, assignment: &[SlotIndex]) -> Result<()> {
    if assignment.len() != model.events.len() {
        return Err(SchedulerError::IndexOutOfBounds {
            kind: IndexKind::Event,
            index: assignment.len().min(model.events.len()),
            len: model.events.len(),
        });
    }
    match assignment.iter().find(|&&slot| slot >= model.slots.len()) {
        Some(&slot) => Err(SchedulerError::IndexOutOfBounds {
            kind: IndexKind::Slot,
            index: slot,
            len: model.slots.len(),
        }),
        None => Ok(()),
    }
}

/// The bundled capability: HiGHS for exact strategies, in-process local
/// search for heuristic ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine;

impl Capability for Engine {
    fn solve(&self, request: &SolveRequest<'_>) -> std::result::Result<Vec<SlotIndex>, Infeasible> {
        match request.strategy.capability {
            CapabilityKind::Exact => ilp::solve(request),
            CapabilityKind::LocalSearch(algorithm) => heuristic::solve(request, algorithm),
        }
    }
}
