//! Implements a solver interface for the microlp simplex solver
use indexmap::IndexMap;
use microlp::{ComparisonOp, OptimizationDirection};

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Dense simplex backend, exact enough for the fixed-objective solves of pFBA
///
/// microlp has no tolerance or time limit settings, so [`SolverTolerances`] are
/// not passed on and a solve always runs to completion.
///
/// [`SolverTolerances`]: crate::optimize::solvers::SolverTolerances
#[derive(Clone, Debug, Default)]
pub struct MicroLpSolver {}

impl MicroLpSolver {
    pub fn new() -> Self {
        Self {}
    }
}

impl Solver for MicroLpSolver {
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let direction = match problem.objective().sense() {
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
        };
        let mut lp = microlp::Problem::new(direction);
        let mut columns = IndexMap::with_capacity(problem.num_variables());
        for var in problem.variables() {
            let column = lp.add_var(
                problem.objective().coefficient(&var.id),
                (var.lower_bound, var.upper_bound),
            );
            columns.insert(var.id.clone(), column);
        }

        for (id, constraint) in problem.constraints() {
            let (lower_bound, upper_bound) = constraint.bounds();
            let terms = constraint
                .terms()
                .iter()
                .filter(|t| t.coefficient != 0.)
                .map(|t| {
                    columns
                        .get(&t.variable)
                        .map(|column| (*column, t.coefficient))
                        .ok_or_else(|| {
                            SolverError::Backend(format!(
                                "constraint {} references unknown variable {}",
                                id, t.variable
                            ))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if terms.is_empty() {
                // An empty row is either trivially satisfied or infeasible
                if lower_bound > 0. || upper_bound < 0. {
                    return Ok(ProblemSolution::failed(OptimizationStatus::Infeasible));
                }
                continue;
            }
            if lower_bound == upper_bound {
                lp.add_constraint(terms.as_slice(), ComparisonOp::Eq, lower_bound);
                continue;
            }
            if lower_bound.is_finite() {
                lp.add_constraint(terms.as_slice(), ComparisonOp::Ge, lower_bound);
            }
            if upper_bound.is_finite() {
                lp.add_constraint(terms.as_slice(), ComparisonOp::Le, upper_bound);
            }
        }

        match lp.solve() {
            Ok(solution) => {
                let variable_values = columns
                    .iter()
                    .map(|(id, column)| (id.clone(), solution[*column]))
                    .collect::<IndexMap<_, _>>();
                Ok(ProblemSolution {
                    status: OptimizationStatus::Optimal,
                    objective_value: Some(solution.objective()),
                    variable_values: Some(variable_values),
                })
            }
            Err(microlp::Error::Infeasible) => {
                Ok(ProblemSolution::failed(OptimizationStatus::Infeasible))
            }
            Err(microlp::Error::Unbounded) => {
                Ok(ProblemSolution::failed(OptimizationStatus::Unbounded))
            }
            #[allow(unreachable_patterns)]
            Err(err) => {
                log::debug!("microlp failed to solve the problem: {}", err);
                Ok(ProblemSolution::failed(OptimizationStatus::NumericalError))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_problem() -> Problem {
        // maximize 3x + 2y subject to x + y <= 4, x + 3y <= 6, x <= 3
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", 0., 3.).unwrap();
        problem.add_new_variable("y", 0., f64::INFINITY).unwrap();
        problem
            .add_new_inequality_constraint_by_id("c1", &["x", "y"], &[1., 1.], f64::NEG_INFINITY, 4.)
            .unwrap();
        problem
            .add_new_inequality_constraint_by_id("c2", &["x", "y"], &[1., 3.], f64::NEG_INFINITY, 6.)
            .unwrap();
        problem.add_new_linear_objective_term_by_id("x", 3.).unwrap();
        problem.add_new_linear_objective_term_by_id("y", 2.).unwrap();
        problem
    }

    #[test]
    fn solves_small_lp() {
        let solution = MicroLpSolver::new().solve(&small_problem()).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        assert!((solution.objective_value.unwrap() - 11.).abs() < 1e-8);
        let values = solution.variable_values.unwrap();
        assert!((values["x"] - 3.).abs() < 1e-8);
        assert!((values["y"] - 1.).abs() < 1e-8);
    }

    #[test]
    fn reports_infeasible() {
        let mut problem = small_problem();
        problem
            .add_new_equality_constraint_by_id("conflict", &["x", "y"], &[1., 1.], 10.)
            .unwrap();
        let solution = MicroLpSolver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
        assert!(solution.objective_value.is_none());
    }

    #[test]
    fn reports_unbounded() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", 0., f64::INFINITY).unwrap();
        problem.add_new_linear_objective_term_by_id("x", 1.).unwrap();
        let solution = MicroLpSolver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Unbounded);
    }
}
