//! Weighted parsimonious FBA followed by flux variability analysis
//!
//! The model is split into irreversible reactions so that the weighted sum of
//! fluxes is a weighted sum of absolute fluxes. The biological objective is
//! optimized and fixed, the weighted sum is minimized and fixed, and finally the
//! range of every reaction consistent with both is found.
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::split::net_fluxes;
use crate::optimize::constraint::Constraint;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Weight applied to reactions missing from a [`WeightingVector`]
pub const DEFAULT_WEIGHT: f64 = 1.;

const BIOLOGICAL_OBJECTIVE_CONSTRAINT: &str = "biological_objective";
const WEIGHTED_OBJECTIVE_CONSTRAINT: &str = "weighted_objective";

/// Reaction id (of the split model) to weight
pub type WeightingVector = IndexMap<String, f64>;

/// Range of a flux across alternative optima
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FluxRange {
    #[serde(with = "crate::utils::non_finite")]
    pub minimum: f64,
    #[serde(with = "crate::utils::non_finite")]
    pub maximum: f64,
}

impl FluxRange {
    pub fn contains(&self, flux: f64, tolerance: f64) -> bool {
        flux >= self.minimum - tolerance && flux <= self.maximum + tolerance
    }
}

/// Result of one weighted pFBA + FVA solve
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub status: OptimizationStatus,
    /// Optimum of the weighted sum of fluxes
    pub objective_value: Option<f64>,
    /// Optimum of the model objective
    pub biological_objective: Option<f64>,
    /// Flux of every reaction of the split model
    pub fluxes: IndexMap<String, f64>,
    /// Flux range of every reaction of the split model
    pub variability: IndexMap<String, FluxRange>,
}

impl SolutionRecord {
    fn failed(status: OptimizationStatus) -> Self {
        Self {
            status,
            objective_value: None,
            biological_objective: None,
            fluxes: IndexMap::new(),
            variability: IndexMap::new(),
        }
    }

    /// Net flux of every reaction of the unsplit model
    pub fn net_fluxes(&self) -> IndexMap<String, f64> {
        net_fluxes(&self.fluxes)
    }

    /// Sum of all (split, hence non-negative) fluxes
    pub fn sum_of_fluxes(&self) -> f64 {
        self.fluxes.values().sum()
    }

    /// Reactions whose pFBA flux lies outside their FVA range
    pub fn inconsistent_reactions(&self, tolerance: f64) -> Vec<&str> {
        self.fluxes
            .iter()
            .filter(|(id, flux)| {
                self.variability
                    .get(id.as_str())
                    .is_some_and(|range| !range.contains(**flux, tolerance))
            })
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// Slack used when fixing an objective at its optimum
fn objective_slack(value: f64, tolerance: f64, feasibility: f64) -> f64 {
    (tolerance * value.abs()).max(feasibility)
}

fn validate_weightings(weightings: &WeightingVector) -> Result<(), SolvingError> {
    match weightings
        .iter()
        .find(|(_, weight)| !weight.is_finite() || **weight < 0.)
    {
        Some((id, weight)) => Err(SolvingError::InvalidWeighting {
            id: id.clone(),
            weight: *weight,
        }),
        None => Ok(()),
    }
}

/// Run weighted pFBA and FVA on a model
///
/// `tolerance` is the fractional slack allowed when fixing each objective,
/// the model's feasibility tolerance is used as an absolute floor. Statuses other
/// than optimal are returned in the record rather than as errors.
pub fn solve(
    model: &Model,
    weightings: &WeightingVector,
    tolerance: f64,
) -> Result<SolutionRecord, SolvingError> {
    validate_weightings(weightings)?;
    let split = model.split_reversible()?;
    let feasibility = split.tolerances.feasibility;
    let mut problem = split.to_problem()?;

    // Biological optimum
    let biological = split.solve_problem(&problem)?;
    let Some(optimum) = usable_objective(&biological) else {
        debug!("Biological objective could not be optimized: {}", biological.status);
        return Ok(SolutionRecord::failed(biological.status));
    };
    let mut status = biological.status;
    let objective_terms: Vec<(&str, f64)> = problem
        .objective()
        .terms()
        .filter(|(_, coefficient)| *coefficient != 0.)
        .collect();
    if !objective_terms.is_empty() {
        let slack = objective_slack(optimum, tolerance, feasibility);
        let (ids, coefficients): (Vec<&str>, Vec<f64>) = objective_terms.into_iter().unzip();
        let fixed = Constraint::new_inequality(&ids, &coefficients, optimum - slack, optimum + slack);
        problem.add_constraint(BIOLOGICAL_OBJECTIVE_CONSTRAINT, fixed)?;
    }

    // Weighted pFBA
    for id in weightings.keys() {
        if problem.variable(id).is_none() {
            debug!("Ignoring weighting for {}, which is not in the model", id);
        }
    }
    problem.remove_all_objective_terms();
    problem.update_objective_sense(ObjectiveSense::Minimize);
    let variable_ids: Vec<String> = problem.variables().map(|var| var.id.clone()).collect();
    for id in &variable_ids {
        let weight = weightings.get(id).copied().unwrap_or(DEFAULT_WEIGHT);
        if weight != 0. {
            problem.add_new_linear_objective_term_by_id(id, weight)?;
        }
    }
    let parsimonious = split.solve_problem(&problem)?;
    let (Some(weighted), Some(fluxes)) = (
        usable_objective(&parsimonious),
        parsimonious.variable_values.clone(),
    ) else {
        debug!("Weighted objective could not be optimized: {}", parsimonious.status);
        return Ok(SolutionRecord {
            biological_objective: Some(optimum),
            ..SolutionRecord::failed(parsimonious.status)
        });
    };
    status = worst(status, parsimonious.status);
    let weighted_terms: Vec<(String, f64)> = problem
        .objective()
        .terms()
        .map(|(id, coefficient)| (id.to_string(), coefficient))
        .collect();
    if !weighted_terms.is_empty() {
        let slack = objective_slack(weighted, tolerance, feasibility);
        let ids: Vec<&str> = weighted_terms.iter().map(|(id, _)| id.as_str()).collect();
        let coefficients: Vec<f64> = weighted_terms.iter().map(|(_, c)| *c).collect();
        let fixed = Constraint::new_inequality(&ids, &coefficients, weighted - slack, weighted + slack);
        problem.add_constraint(WEIGHTED_OBJECTIVE_CONSTRAINT, fixed)?;
    }

    // FVA
    let mut record = SolutionRecord {
        status,
        objective_value: Some(weighted),
        biological_objective: Some(optimum),
        fluxes,
        variability: IndexMap::with_capacity(variable_ids.len()),
    };
    for id in &variable_ids {
        let minimum = match extreme(&split, &mut problem, id, ObjectiveSense::Minimize)? {
            Ok(value) => value,
            Err(failed) => return Ok(abandon_fva(record, id, failed)),
        };
        let maximum = match extreme(&split, &mut problem, id, ObjectiveSense::Maximize)? {
            Ok(value) => value,
            Err(failed) => return Ok(abandon_fva(record, id, failed)),
        };
        record.variability.insert(id.clone(), FluxRange { minimum, maximum });
    }
    let inconsistent = record.inconsistent_reactions(feasibility.max(tolerance));
    if !inconsistent.is_empty() {
        warn!(
            "pFBA fluxes of {} reactions lie outside their FVA range: {:?}",
            inconsistent.len(),
            inconsistent
        );
    }
    Ok(record)
}

fn usable_objective(solution: &ProblemSolution) -> Option<f64> {
    if solution.is_usable() {
        solution.objective_value
    } else {
        None
    }
}

/// Almost optimal taints the whole record
fn worst(current: OptimizationStatus, next: OptimizationStatus) -> OptimizationStatus {
    if current == OptimizationStatus::Optimal {
        next
    } else {
        current
    }
}

/// Optimize a single flux in one direction, an unbounded direction is reported as ±∞
fn extreme(
    model: &Model,
    problem: &mut Problem,
    id: &str,
    sense: ObjectiveSense,
) -> Result<Result<f64, OptimizationStatus>, SolvingError> {
    problem.set_single_variable_objective(id, sense)?;
    let solution = model.solve_problem(problem)?;
    if let Some(value) = usable_objective(&solution) {
        return Ok(Ok(value));
    }
    Ok(match (solution.status, sense) {
        (OptimizationStatus::Unbounded, ObjectiveSense::Minimize) => Ok(f64::NEG_INFINITY),
        (OptimizationStatus::Unbounded, ObjectiveSense::Maximize) => Ok(f64::INFINITY),
        (status, _) => Err(status),
    })
}

fn abandon_fva(record: SolutionRecord, id: &str, status: OptimizationStatus) -> SolutionRecord {
    warn!("Flux variability analysis failed on {}: {}", id, status);
    SolutionRecord {
        status,
        variability: IndexMap::new(),
        ..record
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolvingError {
    #[error("Weight {weight} for {id} is not a finite non-negative number")]
    InvalidWeighting { id: String, weight: f64 },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Unable to build optimization problem: {0}")]
    Problem(#[from] ProblemError),
}
