use std::sync::{LazyLock, RwLock};

use crate::optimize::solvers::SolverBackend;

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Process wide defaults used when building reactions, models and solves
#[derive(Clone, Debug)]
pub struct Configuration {
    /// Default lower flux bound for new reactions
    pub lower_bound: f64,
    /// Default upper flux bound for new reactions
    pub upper_bound: f64,
    /// Fractional slack used when fixing objectives during pFBA and FVA
    pub tolerance: f64,
    /// Primal feasibility tolerance handed to the solver, also the absolute
    /// floor for objective slack
    pub feasibility_tolerance: f64,
    /// Integrality tolerance, only used by mixed integer capable backends
    pub integrality_tolerance: f64,
    /// Wall clock limit in seconds for a single solve, None for no limit
    pub solver_time_limit: Option<f64>,
    /// Backend used for new models
    pub solver: SolverBackend,
    /// Default worker count for batch drivers
    pub processes: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            // 1e-9 takes a long time to solve on the full supermodel
            feasibility_tolerance: 1e-08,
            integrality_tolerance: 1e-05,
            solver_time_limit: None,
            solver: SolverBackend::default(),
            processes: 1,
        }
    }
}

/// Read a copy of the current configuration, falling back to the inner value if
/// the lock is poisoned
pub fn current() -> Configuration {
    match CONFIGURATION.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}
