//! Modeling layer for linear and mixed-integer linear programs.
//!
//! Build a [`Model`] incrementally out of variables, bounds, an objective and
//! linear constraints, then solve it and read per-variable results:
//!
//! ```
//! use lpmodel::{Direction, Model, VariableType};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut model = Model::new("production", Direction::Maximize);
//! let x = model.add_variable("x");
//! let y = model.add_defined_variable("y", VariableType::Integer, 0.0, 0.0, 10.0)?;
//! model.set_objective_function(&[3.0, 2.0], &[x, y])?;
//! model.add_constraint(0.0, 14.0, &[x, y], &[2.0, 1.0])?;
//! # #[cfg(feature = "highs")]
//! # {
//! let solution = model.solve().await?;
//! println!("{}: {}", solution.status(), solution.objective_value());
//! # }
//! # Ok(())
//! # }
//! ```
//!
//! Solver backends are external, blocking, and non-reentrant; every solve in
//! the process is serialized behind one gate, and cancellation abandons (but
//! cannot stop) a call already handed to the backend.

// Domain layer: modeling types, backend contract
pub mod domain;

// Application layer: flattening, result mapping, solve orchestration
pub mod application;

// Solver adapters: concrete implementations of SolverBackend
pub mod solver;

// Re-export commonly used types
pub use domain::{
    BackendKind, Column, Direction, FlatProblem, Model, ModelError, ModelId, RawSolution, Row,
    SolutionStatus, SolveError, Solution, SolverBackend, Variable, VariableSpec, VariableType,
};

pub use application::{
    flatten, map_solution, solve_model, solve_model_with_cancel, solve_model_with_timeout,
    BackendGate,
};

#[cfg(feature = "coin_cbc")]
pub use solver::CbcBackend;
#[cfg(feature = "highs")]
pub use solver::HighsBackend;
pub use solver::SolverFactory;
