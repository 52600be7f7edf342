//! Errors raised while building the constraint model or dispatching a solve.

use thiserror::Error;

/// Which list an out-of-range index was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Event,
    Slot,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::Event => f.write_str("event"),
            IndexKind::Slot => f.write_str("slot"),
        }
    }
}

/// Fatal errors of the scheduling core.
///
/// Infeasibility is deliberately absent: it is reported as
/// [`crate::solver::SolveOutcome::NoSolution`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// An input record lacks a required field.
    #[error("record {record} is missing required field `{field}`")]
    MalformedRecord {
        /// Position of the offending record in its input list.
        record: usize,
        /// Name of the missing field.
        field: &'static str,
    },
    /// The requested strategy is not registered.
    #[error("unknown solving strategy `{0}`")]
    UnknownStrategy(String),
    /// An index produced by an optimisation capability does not exist.
    #[error("{kind} index {index} is out of bounds for {len} entries")]
    IndexOutOfBounds {
        kind: IndexKind,
        index: usize,
        len: usize,
    },
}

impl SchedulerError {
    pub(crate) fn missing(record: usize, field: &'static str) -> Self {
        SchedulerError::MalformedRecord { record, field }
    }
}

/// Alias for results of the scheduling core.
pub type Result<T, E = SchedulerError> = std::result::Result<T, E>;
