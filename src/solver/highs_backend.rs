// HiGHS backend adapter: translates a flattened problem to the HiGHS API.

use crate::domain::backend::{FlatProblem, RawSolution, Result, SolveError, SolverBackend};
use crate::domain::value_objects::{Direction, VariableType};

pub struct HighsBackend;

impl HighsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverBackend for HighsBackend {
    fn solve(&self, problem: &FlatProblem) -> Result<RawSolution> {
        use highs::{HighsModelStatus, RowProblem, Sense};

        let mut pb = RowProblem::default();
        let mut cols = Vec::with_capacity(problem.column_count());

        for column in &problem.columns {
            let bounds = column.lower_bound..=column.upper_bound;
            let col = match column.variable_type {
                VariableType::Integer | VariableType::Binary => {
                    pb.add_integer_column(column.objective, bounds)
                }
                VariableType::Continuous => pb.add_column(column.objective, bounds),
            };
            cols.push(col);
        }

        for row in &problem.rows {
            let terms: Vec<_> = row
                .coefficients
                .iter()
                .map(|&(index, weight)| (cols[index], weight))
                .collect();
            pb.add_row(row.lower_bound..=row.upper_bound, &terms);
        }

        let sense = match problem.direction {
            Direction::Maximize => Sense::Maximise,
            Direction::Minimize => Sense::Minimise,
        };

        let solved = pb.optimise(sense).solve();

        match solved.status() {
            HighsModelStatus::Optimal => {
                let column_values = solved.get_solution().columns().to_vec();
                // recompute from our own coefficients rather than trusting
                // the solver's reported objective
                let objective = problem
                    .columns
                    .iter()
                    .zip(&column_values)
                    .map(|(column, value)| column.objective * value)
                    .sum();
                Ok(RawSolution::optimal(objective, column_values))
            }
            HighsModelStatus::Infeasible => Ok(RawSolution::infeasible()),
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                Ok(RawSolution::unbounded())
            }
            status => Err(SolveError::BackendFailure(format!(
                "HiGHS returned status: {:?}",
                status
            ))),
        }
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
