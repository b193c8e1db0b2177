//! LP backends used to solve [`Problem`]s
use cfg_if::cfg_if;
use thiserror::Error;

use crate::optimize::problem::Problem;
use crate::optimize::ProblemSolution;

pub mod clarabel;
#[cfg(feature = "microlp")]
pub mod microlp;

/// Interface shared by all LP backends
pub trait Solver {
    /// Solve the problem
    ///
    /// Infeasible or unbounded problems are reported through the status of the
    /// returned [`ProblemSolution`], errors are reserved for problems the backend
    /// could not even attempt.
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

/// Numeric tolerances and limits handed to the backend
///
/// Only Clarabel reads these, microlp exposes no tolerance or time limit settings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SolverTolerances {
    /// Primal feasibility tolerance
    pub feasibility: f64,
    /// Integrality tolerance (unused by purely continuous backends)
    pub integrality: f64,
    /// Wall clock limit in seconds, a solve that runs out reports `SolverHalted`
    pub time_limit: Option<f64>,
}

impl Default for SolverTolerances {
    fn default() -> Self {
        let config = crate::configuration::current();
        Self {
            feasibility: config.feasibility_tolerance,
            integrality: config.integrality_tolerance,
            time_limit: config.solver_time_limit,
        }
    }
}

/// Enum used to specify which backend solves a model
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SolverBackend {
    /// Use the Clarabel interior point solver
    Clarabel,
    /// Use the microlp simplex solver, requires the microlp feature to be enabled
    #[cfg(feature = "microlp")]
    MicroLp,
}

impl Default for SolverBackend {
    fn default() -> Self {
        cfg_if! {
            if #[cfg(feature = "microlp")] {
                SolverBackend::MicroLp
            } else {
                SolverBackend::Clarabel
            }
        }
    }
}

impl SolverBackend {
    /// Solve a problem with this backend
    pub fn solve(
        &self,
        problem: &Problem,
        tolerances: SolverTolerances,
    ) -> Result<ProblemSolution, SolverError> {
        match self {
            SolverBackend::Clarabel => clarabel::ClarabelSolver::new(tolerances).solve(problem),
            #[cfg(feature = "microlp")]
            SolverBackend::MicroLp => microlp::MicroLpSolver::new().solve(problem),
        }
    }
}

/// Errors raised by a backend before a status could be determined
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Backend settings could not be built
    #[error("Invalid solver settings: {0}")]
    InvalidSettings(String),
    /// Backend failed in a way that is not a solve status
    #[error("Solver backend failed: {0}")]
    Backend(String),
}
