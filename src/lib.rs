//! Constraint model builder and solver orchestration for conference
//! timetabling.
//!
//! Raw venue and event definitions are normalised into index-addressed slot
//! and event lists ([`normalise`]), from which the hard-constraint tables are
//! derived ([`constraints`], bundled as a [`Model`]). An [`Orchestrator`]
//! hands the model to an optimisation [`Capability`] chosen by strategy name,
//! and the resulting index pairs are resolved into [`Allocation`]s
//! ([`allocation`]).

#![forbid(unsafe_code)]

pub mod allocation;
pub mod config;
pub mod constraints;
pub mod data;
pub mod error;
pub mod heuristic;
pub mod ilp;
pub mod model;
pub mod normalise;
pub mod server;
pub mod solver;

pub use data::{Allocation, Event, Slot};
pub use error::{IndexKind, SchedulerError};
pub use model::Model;
pub use solver::{Capability, Diagnostic, Engine, Orchestrator, SolveOutcome, Tuning};
