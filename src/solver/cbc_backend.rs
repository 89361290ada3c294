// COIN-OR CBC backend adapter, going through good_lp.
//
// good_lp constraints are single-sided, so a ranged row expands into a
// leq/geq pair and equal bounds become an equality.

use crate::domain::backend::{FlatProblem, RawSolution, Result, SolveError, SolverBackend};
use crate::domain::value_objects::{Direction, VariableType};
use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ResolutionError,
    Solution as GoodLpSolution, SolverModel, Variable as GoodLpVariable,
};

pub struct CbcBackend;

impl CbcBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CbcBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverBackend for CbcBackend {
    fn solve(&self, problem: &FlatProblem) -> Result<RawSolution> {
        let mut vars = variables!();
        let mut lp_variables: Vec<GoodLpVariable> = Vec::with_capacity(problem.column_count());

        for column in &problem.columns {
            let mut definition = variable().min(column.lower_bound).max(column.upper_bound);
            if matches!(
                column.variable_type,
                VariableType::Integer | VariableType::Binary
            ) {
                definition = definition.integer();
            }
            lp_variables.push(vars.add(definition));
        }

        let mut objective: Expression = 0.into();
        for (column, lp_var) in problem.columns.iter().zip(&lp_variables) {
            if column.objective != 0.0 {
                objective += column.objective * *lp_var;
            }
        }

        let mut lp_model = match problem.direction {
            Direction::Maximize => vars.maximise(objective).using(coin_cbc::coin_cbc),
            Direction::Minimize => vars.minimise(objective).using(coin_cbc::coin_cbc),
        };

        for row in &problem.rows {
            let mut lhs: Expression = 0.into();
            for &(index, weight) in &row.coefficients {
                lhs += weight * lp_variables[index];
            }

            if row.lower_bound == row.upper_bound && row.lower_bound.is_finite() {
                lp_model = lp_model.with(lhs.eq(row.upper_bound));
            } else {
                if row.upper_bound.is_finite() {
                    lp_model = lp_model.with(lhs.clone().leq(row.upper_bound));
                }
                if row.lower_bound.is_finite() {
                    lp_model = lp_model.with(lhs.geq(row.lower_bound));
                }
            }
        }

        match lp_model.solve() {
            Ok(solved) => {
                let column_values: Vec<f64> = lp_variables
                    .iter()
                    .map(|lp_var| solved.value(*lp_var))
                    .collect();
                let objective = problem
                    .columns
                    .iter()
                    .zip(&column_values)
                    .map(|(column, value)| column.objective * value)
                    .sum();
                Ok(RawSolution::optimal(objective, column_values))
            }
            Err(ResolutionError::Infeasible) => Ok(RawSolution::infeasible()),
            Err(ResolutionError::Unbounded) => Ok(RawSolution::unbounded()),
            Err(err) => Err(SolveError::BackendFailure(format!(
                "CBC failed: {:?}",
                err
            ))),
        }
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
