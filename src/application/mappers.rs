// Mappers: convert between the domain model and the backend's positional
// representation. This keeps backend-facing array layouts isolated from the
// modeling layer.

use crate::domain::backend::{Column, FlatProblem, RawSolution, Row};
use crate::domain::models::{Model, Solution};

/// Serialize a model into the positional arrays a backend consumes.
///
/// Deterministic and side-effect-free: variable order defines column order,
/// constraint order defines row order, and a variable referenced twice within
/// one constraint has its coefficients accumulated additively. The returned
/// problem owns all of its data and retains no reference into the model.
pub fn flatten(model: &Model) -> FlatProblem {
    let columns = model
        .variable_specs()
        .iter()
        .map(|spec| Column {
            variable_type: spec.variable_type,
            lower_bound: spec.lower_bound,
            upper_bound: spec.upper_bound,
            objective: spec.coefficient,
        })
        .collect();

    let rows = model
        .constraints()
        .iter()
        .map(|constraint| {
            let mut coefficients: Vec<(usize, f64)> = Vec::with_capacity(constraint.terms.len());
            for &(index, weight) in &constraint.terms {
                match coefficients.iter_mut().find(|(j, _)| *j == index) {
                    Some((_, accumulated)) => *accumulated += weight,
                    None => coefficients.push((index, weight)),
                }
            }
            Row {
                lower_bound: constraint.lower_bound,
                upper_bound: constraint.upper_bound,
                coefficients,
            }
        })
        .collect();

    FlatProblem {
        name: model.name().to_string(),
        direction: model.direction(),
        columns,
        rows,
    }
}

/// Zip the backend's per-column values back to variable identities, using the
/// column order of the model snapshot that produced the flattened problem.
///
/// The model must be the snapshot used for flattening (or an
/// equivalently-ordered clone); variables added afterwards have no
/// corresponding column and resolve to `None` on the solution.
pub fn map_solution(model: &Model, raw: RawSolution) -> Solution {
    Solution::new(model.id(), raw.status, raw.objective_value, raw.column_values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Direction, SolutionStatus, VariableType};

    fn sample_model() -> Model {
        let mut model = Model::new("sample", Direction::Maximize);
        let x = model.add_variable("x");
        let y = model.add_integer_variable("y");
        let z = model
            .add_defined_variable("z", VariableType::Continuous, -3.0, 5.0, 11.0)
            .unwrap();
        model.set_objective_function(&[1.0, 2.0, -3.0], &[x, y, z]).unwrap();
        model
            .add_constraint(0.0, 10.0, &[x, y, z], &[-1.0, 1.0, 5.3])
            .unwrap();
        model
            .add_constraint(f64::NEG_INFINITY, 20.0, &[x, y], &[2.0, -5.0])
            .unwrap();
        model
    }

    #[test]
    fn column_and_row_order_follow_creation_order() {
        let flat = flatten(&sample_model());
        assert_eq!(flat.column_count(), 3);
        assert_eq!(flat.row_count(), 2);
        assert_eq!(flat.columns[0].objective, 1.0);
        assert_eq!(flat.columns[1].variable_type, VariableType::Integer);
        assert_eq!(flat.columns[2].lower_bound, 5.0);
        assert_eq!(flat.columns[2].upper_bound, 11.0);
        assert_eq!(flat.rows[0].coefficients, vec![(0, -1.0), (1, 1.0), (2, 5.3)]);
        assert_eq!(flat.rows[1].lower_bound, f64::NEG_INFINITY);
    }

    #[test]
    fn flattening_is_idempotent() {
        let model = sample_model();
        assert_eq!(flatten(&model), flatten(&model));
    }

    #[test]
    fn duplicate_terms_accumulate_additively() {
        let mut model = Model::new("dup", Direction::Minimize);
        let x = model.add_variable("x");
        let y = model.add_variable("y");
        model
            .add_constraint(0.0, 8.0, &[x, y, x], &[1.0, 2.0, 0.5])
            .unwrap();
        let flat = flatten(&model);
        assert_eq!(flat.rows[0].coefficients, vec![(0, 1.5), (1, 2.0)]);
    }

    #[test]
    fn mapped_solution_is_keyed_by_variable_identity() {
        let model = sample_model();
        let raw = RawSolution::optimal(7.0, vec![1.0, 2.0, 5.0]);
        let solution = map_solution(&model, raw);
        assert_eq!(solution.status(), SolutionStatus::Optimal);
        assert_eq!(solution.objective_value(), 7.0);
        let x = model.variable(0).unwrap();
        let z = model.variable(2).unwrap();
        assert_eq!(solution.value(x), Some(1.0));
        assert_eq!(solution.value(z), Some(5.0));
    }

    #[test]
    fn infeasible_solution_has_no_values() {
        let model = sample_model();
        let solution = map_solution(&model, RawSolution::infeasible());
        assert_eq!(solution.status(), SolutionStatus::Infeasible);
        let x = model.variable(0).unwrap();
        assert_eq!(solution.value(x), None);
    }
}
