// Domain value objects representing core modeling concepts

use std::fmt;

/// Type of decision variable in the optimization problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// Continuous real number (x ∈ ℝ)
    Continuous,
    /// Integer number (x ∈ ℤ)
    Integer,
    /// Binary variable (x ∈ {0, 1})
    Binary,
}

impl VariableType {
    pub fn is_integer(self) -> bool {
        matches!(self, VariableType::Integer | VariableType::Binary)
    }
}

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Minimize the objective function
    Minimize,
    /// Maximize the objective function
    Maximize,
}

/// Status of the optimization solution
///
/// `Infeasible` and `Unbounded` are legitimate outcomes, not errors; callers
/// must check the status before reading objective or variable values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Found optimal solution
    Optimal,
    /// Problem has no feasible solution
    Infeasible,
    /// Objective can be improved infinitely
    Unbounded,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Unbounded => write!(f, "Unbounded"),
        }
    }
}

/// Solver backend to use for a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Automatically select the best compiled-in solver
    #[default]
    Auto,
    /// HiGHS solver
    Highs,
    /// COIN-OR CBC solver
    CoinCbc,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Auto => write!(f, "Auto"),
            BackendKind::Highs => write!(f, "HiGHS"),
            BackendKind::CoinCbc => write!(f, "COIN-OR CBC"),
        }
    }
}
