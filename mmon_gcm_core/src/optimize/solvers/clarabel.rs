//! Implements a solver interface for Clarabel
//!
//! Clarabel solves `min 1/2 x'Px + q'x  s.t.  Ax + s = b, s in K`. Equality rows
//! go into the zero cone, every finite side of an inequality or variable bound
//! becomes a row of the nonnegative cone.
use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use indexmap::IndexMap;
use nalgebra_sparse::coo::CooMatrix;

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError, SolverTolerances};
use crate::optimize::{OptimizationStatus, ProblemSolution};

#[derive(Clone, Debug)]
pub struct ClarabelSolver {
    tolerances: SolverTolerances,
}

impl ClarabelSolver {
    pub fn new(tolerances: SolverTolerances) -> Self {
        Self { tolerances }
    }
}

/// Rows of the constraint matrix, before assembly
#[derive(Default)]
struct Rows {
    /// (column, coefficient) terms of each row
    terms: Vec<Vec<(usize, f64)>>,
    /// Right hand side of each row
    rhs: Vec<f64>,
}

impl Rows {
    fn push(&mut self, terms: Vec<(usize, f64)>, rhs: f64) {
        self.terms.push(terms);
        self.rhs.push(rhs);
    }

    fn len(&self) -> usize {
        self.rhs.len()
    }
}

impl Solver for ClarabelSolver {
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let n = problem.num_variables();
        let columns: IndexMap<&str, usize> = problem
            .variables()
            .map(|var| (var.id.as_str(), var.index))
            .collect();
        let mut zero_rows = Rows::default();
        let mut nonnegative_rows = Rows::default();

        for (id, constraint) in problem.constraints() {
            let (lower_bound, upper_bound) = constraint.bounds();
            let mut terms = Vec::with_capacity(constraint.terms().len());
            for term in constraint.terms() {
                let column = columns.get(term.variable.as_str()).ok_or_else(|| {
                    SolverError::Backend(format!(
                        "constraint {} references unknown variable {}",
                        id, term.variable
                    ))
                })?;
                terms.push((*column, term.coefficient));
            }
            if lower_bound == upper_bound {
                zero_rows.push(terms, upper_bound);
                continue;
            }
            if upper_bound.is_finite() {
                nonnegative_rows.push(terms.clone(), upper_bound);
            }
            if lower_bound.is_finite() {
                let negated = terms.iter().map(|(c, v)| (*c, -v)).collect();
                nonnegative_rows.push(negated, -lower_bound);
            }
        }
        for var in problem.variables() {
            if var.lower_bound == var.upper_bound {
                zero_rows.push(vec![(var.index, 1.)], var.upper_bound);
                continue;
            }
            if var.upper_bound.is_finite() {
                nonnegative_rows.push(vec![(var.index, 1.)], var.upper_bound);
            }
            if var.lower_bound.is_finite() {
                nonnegative_rows.push(vec![(var.index, -1.)], -var.lower_bound);
            }
        }

        let m = zero_rows.len() + nonnegative_rows.len();
        let mut coo = CooMatrix::new(m, n);
        for (row, terms) in zero_rows
            .terms
            .iter()
            .chain(nonnegative_rows.terms.iter())
            .enumerate()
        {
            for (column, value) in terms {
                coo.push(row, *column, *value);
            }
        }
        let csc = nalgebra_sparse::csc::CscMatrix::from(&coo);
        let a = CscMatrix::new(
            m,
            n,
            csc.col_offsets().to_vec(),
            csc.row_indices().to_vec(),
            csc.values().to_vec(),
        );
        let b: Vec<f64> = zero_rows
            .rhs
            .iter()
            .chain(nonnegative_rows.rhs.iter())
            .copied()
            .collect();
        let mut cones = Vec::new();
        if zero_rows.len() > 0 {
            cones.push(SupportedConeT::ZeroConeT(zero_rows.len()));
        }
        if nonnegative_rows.len() > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(nonnegative_rows.len()));
        }

        // Clarabel only minimizes
        let sign = match problem.objective().sense() {
            ObjectiveSense::Minimize => 1.,
            ObjectiveSense::Maximize => -1.,
        };
        let q: Vec<f64> = problem
            .variables()
            .map(|var| sign * problem.objective().coefficient(&var.id))
            .collect();
        let p = CscMatrix::<f64>::zeros((n, n));

        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .tol_feas(self.tolerances.feasibility)
            .time_limit(self.tolerances.time_limit.unwrap_or(f64::INFINITY))
            .build()
            .map_err(|err| SolverError::InvalidSettings(err.to_string()))?;
        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = match solver.solution.status {
            SolverStatus::Solved => OptimizationStatus::Optimal,
            SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                OptimizationStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                OptimizationStatus::Unbounded
            }
            SolverStatus::MaxIterations
            | SolverStatus::MaxTime
            | SolverStatus::InsufficientProgress => OptimizationStatus::SolverHalted,
            _ => OptimizationStatus::NumericalError,
        };
        if !status.is_usable() {
            return Ok(ProblemSolution::failed(status));
        }
        let variable_values = problem
            .variables()
            .map(|var| (var.id.clone(), solver.solution.x[var.index]))
            .collect::<IndexMap<_, _>>();
        Ok(ProblemSolution {
            status,
            objective_value: Some(sign * solver.solution.obj_val),
            variable_values: Some(variable_values),
        })
    }
}
