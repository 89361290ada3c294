// Backend contract: the flattened problem handed to a solver and the raw
// answer it produces. Any solver implementation must follow this interface,
// which lets us swap backends without touching the modeling layer.

use super::value_objects::{Direction, SolutionStatus, VariableType};

/// Error types for the solving pipeline
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("solver backend not available: {0}")]
    BackendUnavailable(String),

    #[error("solver backend failed: {0}")]
    BackendFailure(String),

    #[error("solve cancelled before the backend completed")]
    Cancelled,

    #[error("solve deadline exceeded before the backend completed")]
    DeadlineExceeded,
}

pub type Result<T> = std::result::Result<T, SolveError>;

/// One backend column: a variable in model order.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Objective-function coefficient
    pub objective: f64,
}

/// One backend row: a constraint in model order, with its coefficients as
/// sparse (column index, weight) pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub coefficients: Vec<(usize, f64)>,
}

/// A model serialized into the positional arrays a backend consumes.
///
/// Owns all of its data; a `FlatProblem` stays valid after the model it was
/// flattened from is mutated or dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatProblem {
    pub name: String,
    pub direction: Direction,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl FlatProblem {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// The backend's raw output, still keyed by column position.
#[derive(Debug, Clone)]
pub struct RawSolution {
    pub status: SolutionStatus,
    pub objective_value: f64,
    pub column_values: Vec<f64>,
}

impl RawSolution {
    pub fn optimal(objective_value: f64, column_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            objective_value,
            column_values,
        }
    }

    pub fn infeasible() -> Self {
        Self {
            status: SolutionStatus::Infeasible,
            objective_value: 0.0,
            column_values: Vec::new(),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            status: SolutionStatus::Unbounded,
            objective_value: 0.0,
            column_values: Vec::new(),
        }
    }
}

/// Interface for optimization solver backends.
///
/// Implementations are assumed blocking and non-reentrant: the call does not
/// return until the solver finishes, there is no way to interrupt it, and two
/// overlapping invocations corrupt the solver's shared internal state even
/// when they belong to unrelated problems. The orchestrator serializes every
/// invocation behind a process-wide gate; implementations never need their
/// own locking.
///
/// `Infeasible` and `Unbounded` come back as a [`RawSolution`]; an undefined
/// or error status from the underlying solver must be reported as
/// [`SolveError::BackendFailure`].
pub trait SolverBackend: Send + Sync {
    /// Solve a flattened problem, blocking until the solver finishes.
    fn solve(&self, problem: &FlatProblem) -> Result<RawSolution>;

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Check if this solver supports mixed-integer programming
    fn supports_mip(&self) -> bool;
}
