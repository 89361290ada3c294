// Domain models: the incrementally-built optimization model and its solution.
//
// Variables and constraints are arena-allocated inside their owning `Model`
// and addressed by positional index. The index order is load-bearing: it is
// the column/row order handed to the backend and used to map results back.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::backend::{SolveError, SolverBackend};
use super::value_objects::{BackendKind, Direction, SolutionStatus, VariableType};
use crate::application;
use crate::solver::SolverFactory;

/// Errors raised while building a model. A failed operation never leaves a
/// partially-applied change behind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid bounds: lower bound {lower} exceeds upper bound {upper}")]
    InvalidBounds { lower: f64, upper: f64 },

    #[error("Dimension mismatch: {coefficients} coefficients for {variables} variables")]
    DimensionMismatch {
        coefficients: usize,
        variables: usize,
    },

    #[error("Variable does not belong to this model")]
    ForeignVariable,

    #[error("Constraint must reference at least one variable")]
    EmptyConstraint,
}

/// Identifier of a model lineage, shared between a model and its clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(u64);

impl ModelId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        ModelId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a decision variable owned by a [`Model`].
///
/// Handles are cheap `Copy` values; the variable's data lives in the model's
/// arena. Identity is positional, never the name: several variables in one
/// model may share a name. A handle stays valid for the owning model and for
/// its clones, which are positionally identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable {
    model: ModelId,
    index: usize,
}

impl Variable {
    /// Column position of this variable within its model.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Stored attributes of a decision variable.
#[derive(Debug, Clone)]
pub struct VariableSpec {
    pub name: String,
    pub variable_type: VariableType,
    /// Objective-function coefficient
    pub coefficient: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl VariableSpec {
    /// Bounds as a (lower, upper) pair.
    pub fn bounds(&self) -> (f64, f64) {
        (self.lower_bound, self.upper_bound)
    }
}

/// A linear constraint: `lower_bound <= sum(coefficient * variable) <= upper_bound`.
///
/// Immutable once added. The same variable may appear in several terms;
/// the flattener accumulates such coefficients additively.
#[derive(Debug, Clone)]
pub struct ConstraintSpec {
    pub(crate) lower_bound: f64,
    pub(crate) upper_bound: f64,
    pub(crate) terms: Vec<(usize, f64)>,
}

impl ConstraintSpec {
    /// Row bounds as a (lower, upper) pair.
    pub fn bounds(&self) -> (f64, f64) {
        (self.lower_bound, self.upper_bound)
    }
}

/// An ordered collection of variables and constraints plus an optimization
/// direction; the unit of cloning and the unit submitted for solving.
///
/// Cloning performs a deep copy: the clone shares no mutable state with the
/// original, only the process-wide backend gate once solved. Because a clone
/// is positionally identical, variable handles are interchangeable between a
/// model and its clones at the same indices. Cloning before solving
/// concurrently is the supported way to run structurally-identical problems
/// in parallel.
#[derive(Debug, Clone)]
pub struct Model {
    id: ModelId,
    name: String,
    direction: Direction,
    backend: BackendKind,
    variables: Vec<VariableSpec>,
    constraints: Vec<ConstraintSpec>,
}

impl Model {
    pub fn new(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            id: ModelId::next(),
            name: name.into(),
            direction,
            backend: BackendKind::Auto,
            variables: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Select the solver backend used by [`Model::solve`].
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn set_backend(&mut self, backend: BackendKind) {
        self.backend = backend;
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.variables.iter().any(|v| v.variable_type.is_integer())
    }

    /// Append a continuous variable with bounds `[0, +inf)` and objective
    /// coefficient 0.
    pub fn add_variable(&mut self, name: impl Into<String>) -> Variable {
        self.push_variable(VariableSpec {
            name: name.into(),
            variable_type: VariableType::Continuous,
            coefficient: 0.0,
            lower_bound: 0.0,
            upper_bound: f64::INFINITY,
        })
    }

    /// Append an integer variable with bounds `[0, +inf)` and objective
    /// coefficient 0.
    pub fn add_integer_variable(&mut self, name: impl Into<String>) -> Variable {
        self.push_variable(VariableSpec {
            name: name.into(),
            variable_type: VariableType::Integer,
            coefficient: 0.0,
            lower_bound: 0.0,
            upper_bound: f64::INFINITY,
        })
    }

    /// Append a variable with every attribute given explicitly. Bounds may be
    /// infinite; `lower > upper` is rejected.
    pub fn add_defined_variable(
        &mut self,
        name: impl Into<String>,
        variable_type: VariableType,
        coefficient: f64,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<Variable, ModelError> {
        check_bounds(lower_bound, upper_bound)?;
        Ok(self.push_variable(VariableSpec {
            name: name.into(),
            variable_type,
            coefficient,
            lower_bound,
            upper_bound,
        }))
    }

    fn push_variable(&mut self, spec: VariableSpec) -> Variable {
        let index = self.variables.len();
        self.variables.push(spec);
        Variable {
            model: self.id,
            index,
        }
    }

    /// Handle for the variable at a column position, if any.
    pub fn variable(&self, index: usize) -> Option<Variable> {
        (index < self.variables.len()).then_some(Variable {
            model: self.id,
            index,
        })
    }

    /// Handles of all variables in column order.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        let model = self.id;
        (0..self.variables.len()).map(move |index| Variable { model, index })
    }

    /// Stored attributes of a variable, or `None` for a foreign handle.
    pub fn variable_spec(&self, variable: Variable) -> Option<&VariableSpec> {
        if !self.owns(variable) {
            return None;
        }
        self.variables.get(variable.index)
    }

    pub fn set_variable_type(
        &mut self,
        variable: Variable,
        variable_type: VariableType,
    ) -> Result<(), ModelError> {
        let spec = self.spec_mut(variable)?;
        spec.variable_type = variable_type;
        Ok(())
    }

    pub fn set_coefficient(
        &mut self,
        variable: Variable,
        coefficient: f64,
    ) -> Result<(), ModelError> {
        let spec = self.spec_mut(variable)?;
        spec.coefficient = coefficient;
        Ok(())
    }

    pub fn set_bounds(
        &mut self,
        variable: Variable,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ModelError> {
        check_bounds(lower_bound, upper_bound)?;
        let spec = self.spec_mut(variable)?;
        spec.lower_bound = lower_bound;
        spec.upper_bound = upper_bound;
        Ok(())
    }

    /// Set the objective coefficient of each variable in `variables` to the
    /// matching entry of `coefficients`. Validates fully before applying, so
    /// an error leaves every coefficient untouched.
    pub fn set_objective_function(
        &mut self,
        coefficients: &[f64],
        variables: &[Variable],
    ) -> Result<(), ModelError> {
        if coefficients.len() != variables.len() {
            return Err(ModelError::DimensionMismatch {
                coefficients: coefficients.len(),
                variables: variables.len(),
            });
        }
        if variables.iter().any(|v| !self.owns(*v)) {
            return Err(ModelError::ForeignVariable);
        }
        for (variable, &coefficient) in variables.iter().zip(coefficients) {
            self.variables[variable.index].coefficient = coefficient;
        }
        Ok(())
    }

    /// Append the constraint `lower_bound <= sum(coefficients[i] * variables[i])
    /// <= upper_bound`. Equal bounds express an equality; an infinite bound
    /// leaves that side open.
    pub fn add_constraint(
        &mut self,
        lower_bound: f64,
        upper_bound: f64,
        variables: &[Variable],
        coefficients: &[f64],
    ) -> Result<(), ModelError> {
        if variables.len() != coefficients.len() {
            return Err(ModelError::DimensionMismatch {
                coefficients: coefficients.len(),
                variables: variables.len(),
            });
        }
        if variables.is_empty() {
            return Err(ModelError::EmptyConstraint);
        }
        check_bounds(lower_bound, upper_bound)?;
        if variables.iter().any(|v| !self.owns(*v)) {
            return Err(ModelError::ForeignVariable);
        }
        self.constraints.push(ConstraintSpec {
            lower_bound,
            upper_bound,
            terms: variables
                .iter()
                .zip(coefficients)
                .map(|(v, &c)| (v.index, c))
                .collect(),
        });
        Ok(())
    }

    /// Constraints in row order.
    pub fn constraints(&self) -> &[ConstraintSpec] {
        &self.constraints
    }

    pub(crate) fn variable_specs(&self) -> &[VariableSpec] {
        &self.variables
    }

    fn owns(&self, variable: Variable) -> bool {
        variable.model == self.id && variable.index < self.variables.len()
    }

    fn spec_mut(&mut self, variable: Variable) -> Result<&mut VariableSpec, ModelError> {
        if !self.owns(variable) {
            return Err(ModelError::ForeignVariable);
        }
        Ok(&mut self.variables[variable.index])
    }

    /// Solve with the model's selected backend, blocking the task until the
    /// solver finishes. All solves in the process are serialized; this call
    /// may queue behind solves of unrelated models.
    pub async fn solve(&self) -> Result<Solution, SolveError> {
        application::solve_model(self, self.resolve_backend()?).await
    }

    /// Like [`Model::solve`], but gives up as soon as `cancel` resolves.
    ///
    /// Cancellation is best-effort at the boundary: the backend call cannot
    /// be interrupted, so an abandoned solve keeps running (and keeps the
    /// process-wide solver gate) until it finishes on its own.
    pub async fn solve_with_cancel(
        &self,
        cancel: impl Future<Output = ()>,
    ) -> Result<Solution, SolveError> {
        application::solve_model_with_cancel(self, self.resolve_backend()?, cancel).await
    }

    /// Like [`Model::solve`], but fails with [`SolveError::DeadlineExceeded`]
    /// when the limit expires first. See [`Model::solve_with_cancel`] for the
    /// fate of the abandoned backend call.
    pub async fn solve_with_timeout(&self, limit: Duration) -> Result<Solution, SolveError> {
        application::solve_model_with_timeout(self, self.resolve_backend()?, limit).await
    }

    fn resolve_backend(&self) -> Result<Arc<dyn SolverBackend>, SolveError> {
        SolverFactory::create(self.backend, self.is_mixed_integer())
    }
}

fn check_bounds(lower: f64, upper: f64) -> Result<(), ModelError> {
    if lower > upper {
        return Err(ModelError::InvalidBounds { lower, upper });
    }
    Ok(())
}

/// Solved values mapped back to variable identities.
///
/// Holds copies of the backend's output; it stays valid after the model is
/// mutated or dropped. `objective_value` and per-variable values are only
/// meaningful when [`Solution::status`] is [`SolutionStatus::Optimal`].
#[derive(Debug, Clone)]
pub struct Solution {
    model: ModelId,
    status: SolutionStatus,
    objective_value: f64,
    values: Vec<f64>,
}

impl Solution {
    pub(crate) fn new(
        model: ModelId,
        status: SolutionStatus,
        objective_value: f64,
        values: Vec<f64>,
    ) -> Self {
        Self {
            model,
            status,
            objective_value,
            values,
        }
    }

    pub fn status(&self) -> SolutionStatus {
        self.status
    }

    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    /// Solved value of a variable.
    ///
    /// Returns `None` for a handle of another model, or for a variable added
    /// after the solved snapshot was flattened; both are caller errors, not
    /// values to guess at.
    pub fn value(&self, variable: Variable) -> Option<f64> {
        if variable.model != self.model {
            return None;
        }
        self.values.get(variable.index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instantiation_keeps_name_and_direction() {
        let model = Model::new("test model 1", Direction::Maximize);
        assert_eq!(model.name(), "test model 1");
        assert_eq!(model.direction(), Direction::Maximize);
        assert_eq!(model.variable_count(), 0);
        assert_eq!(model.constraint_count(), 0);
    }

    #[test]
    fn defined_variable_keeps_attributes() {
        let mut model = Model::new("test", Direction::Maximize);
        let v1 = model
            .add_defined_variable("x", VariableType::Binary, 3.1416, 0.0, 1.0)
            .unwrap();
        let spec = model.variable_spec(v1).unwrap();
        assert_eq!(spec.name, "x");
        assert_eq!(spec.variable_type, VariableType::Binary);
        assert_eq!(spec.coefficient, 3.1416);
        assert_eq!(spec.bounds(), (0.0, 1.0));

        let v2 = model
            .add_defined_variable("y", VariableType::Continuous, -1.0, f64::NEG_INFINITY, 5.0)
            .unwrap();
        let spec = model.variable_spec(v2).unwrap();
        assert_eq!(spec.bounds(), (f64::NEG_INFINITY, 5.0));
    }

    #[test]
    fn crossed_bounds_are_rejected_without_mutation() {
        let mut model = Model::new("test", Direction::Minimize);
        let err = model
            .add_defined_variable("x", VariableType::Continuous, 1.0, 2.0, 1.0)
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidBounds {
                lower: 2.0,
                upper: 1.0
            }
        );
        assert_eq!(model.variable_count(), 0);
    }

    #[test]
    fn infinite_bounds_pass_in_the_permitting_direction() {
        let mut model = Model::new("test", Direction::Minimize);
        assert!(model
            .add_defined_variable(
                "free",
                VariableType::Continuous,
                0.0,
                f64::NEG_INFINITY,
                f64::INFINITY
            )
            .is_ok());
        // fixed variable: equal bounds are fine
        assert!(model
            .add_defined_variable("fixed", VariableType::Continuous, 0.0, 7.0, 7.0)
            .is_ok());
    }

    #[test]
    fn duplicate_names_are_allowed_and_identity_stays_positional() {
        let mut model = Model::new("test", Direction::Maximize);
        let a = model.add_variable("y");
        let b = model.add_variable("y");
        assert_ne!(a, b);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(model.variable_spec(a).unwrap().name, "y");
        assert_eq!(model.variable_spec(b).unwrap().name, "y");
    }

    #[test]
    fn objective_function_sets_each_coefficient() {
        let mut model = Model::new("test", Direction::Maximize);
        let v1 = model.add_variable("x");
        let v2 = model.add_variable("y");
        model.set_variable_type(v2, VariableType::Integer).unwrap();
        let v3 = model.add_variable("y");
        model.set_variable_type(v3, VariableType::Binary).unwrap();

        let vars = [v1, v2, v3];
        let coefs = [1.3, 2.7182, 3.1416];
        model.set_objective_function(&coefs, &vars).unwrap();
        for (var, coef) in vars.iter().zip(coefs) {
            assert_eq!(model.variable_spec(*var).unwrap().coefficient, coef);
        }
        assert!(model.is_mixed_integer());
    }

    #[test]
    fn objective_function_validates_before_applying() {
        let mut model = Model::new("test", Direction::Maximize);
        let v1 = model.add_variable("x");
        let mut other = Model::new("other", Direction::Maximize);
        let foreign = other.add_variable("x");

        let err = model
            .set_objective_function(&[1.0, 2.0], &[v1])
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::DimensionMismatch {
                coefficients: 2,
                variables: 1
            }
        );

        let err = model
            .set_objective_function(&[1.0, 2.0], &[v1, foreign])
            .unwrap_err();
        assert_eq!(err, ModelError::ForeignVariable);
        // nothing applied, v1 keeps its default coefficient
        assert_eq!(model.variable_spec(v1).unwrap().coefficient, 0.0);
    }

    #[test]
    fn constraint_validation() {
        let mut model = Model::new("test", Direction::Maximize);
        let x = model.add_variable("x");
        let mut other = Model::new("other", Direction::Maximize);
        let foreign = other.add_variable("x");

        assert_eq!(
            model.add_constraint(0.0, 10.0, &[x], &[1.0, 2.0]),
            Err(ModelError::DimensionMismatch {
                coefficients: 2,
                variables: 1
            })
        );
        assert_eq!(
            model.add_constraint(0.0, 10.0, &[], &[]),
            Err(ModelError::EmptyConstraint)
        );
        assert_eq!(
            model.add_constraint(5.0, 1.0, &[x], &[1.0]),
            Err(ModelError::InvalidBounds {
                lower: 5.0,
                upper: 1.0
            })
        );
        assert_eq!(
            model.add_constraint(0.0, 10.0, &[foreign], &[1.0]),
            Err(ModelError::ForeignVariable)
        );
        assert_eq!(model.constraint_count(), 0);

        model.add_constraint(0.0, 10.0, &[x, x], &[1.0, 2.5]).unwrap();
        assert_eq!(model.constraint_count(), 1);
        assert_eq!(model.constraints()[0].bounds(), (0.0, 10.0));
    }

    #[test]
    fn one_sided_constraints_accept_an_infinite_bound() {
        let mut model = Model::new("test", Direction::Maximize);
        let x = model.add_variable("x");
        model
            .add_constraint(f64::NEG_INFINITY, 20.0, &[x], &[2.0])
            .unwrap();
        model
            .add_constraint(3.0, f64::INFINITY, &[x], &[1.0])
            .unwrap();
        assert_eq!(model.constraint_count(), 2);
    }

    #[test]
    fn clone_is_deep_and_handles_are_interchangeable() {
        let mut model = Model::new("test", Direction::Maximize);
        let x = model.add_variable("x");
        let y = model.add_integer_variable("y");
        model.set_objective_function(&[1.0, 2.0], &[x, y]).unwrap();
        model.add_constraint(0.0, 4.0, &[x, y], &[1.0, 1.0]).unwrap();

        let mut clone = model.clone();
        assert_eq!(clone.variable_count(), 2);
        assert_eq!(clone.constraint_count(), 1);
        assert_eq!(clone.variables().collect::<Vec<_>>(), vec![x, y]);

        // handles minted by the original resolve on the clone
        assert_eq!(clone.variable_spec(x).unwrap().name, "x");
        clone.set_coefficient(x, 9.0).unwrap();
        clone.set_bounds(y, 1.0, 2.0).unwrap();
        clone.add_constraint(0.0, 1.0, &[x], &[1.0]).unwrap();

        // and mutating the clone never touches the original
        assert_eq!(model.variable_spec(x).unwrap().coefficient, 1.0);
        assert_eq!(model.variable_spec(y).unwrap().bounds(), (0.0, f64::INFINITY));
        assert_eq!(model.constraint_count(), 1);

        // clone handles resolve on the original at the same index
        let cx = clone.variable(0).unwrap();
        assert_eq!(model.variable_spec(cx).unwrap().name, "x");
    }

    #[test]
    fn unrelated_models_reject_each_others_handles() {
        let mut a = Model::new("a", Direction::Maximize);
        let mut b = Model::new("b", Direction::Maximize);
        let va = a.add_variable("x");
        let _vb = b.add_variable("x");
        assert_eq!(
            b.set_coefficient(va, 1.0),
            Err(ModelError::ForeignVariable)
        );
        assert!(b.variable_spec(va).is_none());
    }

    #[test]
    fn solution_maps_values_by_identity() {
        let mut model = Model::new("test", Direction::Maximize);
        let x = model.add_variable("x");
        let y = model.add_variable("y");
        let solution = Solution::new(
            model.id(),
            SolutionStatus::Optimal,
            3.0,
            vec![1.0, 2.0],
        );
        assert_eq!(solution.value(x), Some(1.0));
        assert_eq!(solution.value(y), Some(2.0));

        // variable added after the solved snapshot: caller error, not a guess
        let late = model.add_variable("late");
        assert_eq!(solution.value(late), None);

        let mut other = Model::new("other", Direction::Maximize);
        let foreign = other.add_variable("x");
        assert_eq!(solution.value(foreign), None);
    }
}
