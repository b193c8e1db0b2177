//! This module provides the Model struct for representing an entire metabolic model
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::solvers::{SolverBackend, SolverError, SolverTolerances};
use crate::optimize::ProblemSolution;

/// Represents a Genome Scale Metabolic Model
#[derive(Clone, Debug)]
pub struct Model {
    /// Map of reaction ids to Reaction Objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of metabolite ids to Metabolite Objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
    /// Backend used by [`Model::optimize`]
    pub solver: SolverBackend,
    /// Numeric tolerances handed to the backend
    pub tolerances: SolverTolerances,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            id: None,
            compartments: None,
            version: None,
            solver: crate::configuration::current().solver,
            tolerances: SolverTolerances::default(),
        }
    }

    /// Add a reaction to the model, replacing any reaction with the same id
    ///
    /// # Examples
    /// ```rust
    /// use mmon_gcm_core::metabolic_model::model::Model;
    /// use mmon_gcm_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty();
    /// let new_reaction = ReactionBuilder::default().id("new_reaction".to_string()).build().unwrap();
    /// model.add_reaction(new_reaction);
    /// assert!(model.reaction("new_reaction").is_ok());
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a metabolite to the model, replacing any metabolite with the same id
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Look up a reaction
    pub fn reaction(&self, id: &str) -> Result<&Reaction, ModelError> {
        self.reactions
            .get(id)
            .ok_or_else(|| ModelError::ReactionNotFound(id.to_string()))
    }

    /// Set both bounds of a reaction
    pub fn set_bounds(&mut self, id: &str, lower_bound: f64, upper_bound: f64) -> Result<(), ModelError> {
        if lower_bound > upper_bound || lower_bound.is_nan() || upper_bound.is_nan() {
            return Err(ModelError::InvalidBounds {
                id: id.to_string(),
                lower_bound,
                upper_bound,
            });
        }
        let reaction = self
            .reactions
            .get_mut(id)
            .ok_or_else(|| ModelError::ReactionNotFound(id.to_string()))?;
        reaction.lower_bound = lower_bound;
        reaction.upper_bound = upper_bound;
        Ok(())
    }

    /// Objective coefficient of a reaction, zero when it is not in the objective
    pub fn objective_coefficient(&self, id: &str) -> f64 {
        self.objective.get(id).copied().unwrap_or(0.)
    }

    /// Ids of the per-phase copies of a reaction, i.e. `{prefix}_{phase number}`
    ///
    /// # Examples
    /// ```rust
    /// use mmon_gcm_core::metabolic_model::model::Model;
    /// use mmon_gcm_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty();
    /// for id in ["Photon_tx_gc_1", "Photon_tx_gc_2", "Photon_tx_gc_linker"] {
    ///     model.add_reaction(ReactionBuilder::default().id(id.to_string()).build().unwrap());
    /// }
    /// assert_eq!(model.phase_reactions("Photon_tx_gc"), vec!["Photon_tx_gc_1", "Photon_tx_gc_2"]);
    /// ```
    pub fn phase_reactions(&self, prefix: &str) -> Vec<String> {
        self.reactions
            .keys()
            .filter(|id| {
                id.strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .is_some_and(|phase| !phase.is_empty() && phase.chars().all(|c| c.is_ascii_digit()))
            })
            .cloned()
            .collect()
    }

    /// Every metabolite taking part in a reaction, in order of first appearance
    fn balanced_metabolites(&self) -> IndexSet<&str> {
        let mut metabolites: IndexSet<&str> =
            self.metabolites.keys().map(|id| id.as_str()).collect();
        for reaction in self.reactions.values() {
            metabolites.extend(reaction.metabolites.keys().map(|id| id.as_str()));
        }
        metabolites
    }

    /// Build the flux balance problem: one variable per reaction, a steady state
    /// mass balance per metabolite, and the model objective (maximized)
    pub fn to_problem(&self) -> Result<Problem, ModelError> {
        let mut problem = Problem::new_maximization();
        for reaction in self.reactions.values() {
            problem.add_new_variable(&reaction.id, reaction.lower_bound, reaction.upper_bound)?;
        }
        let mut rows: IndexMap<&str, (Vec<&str>, Vec<f64>)> = self
            .balanced_metabolites()
            .into_iter()
            .map(|id| (id, (Vec::new(), Vec::new())))
            .collect();
        for reaction in self.reactions.values() {
            for (metabolite, coefficient) in &reaction.metabolites {
                if let Some((variables, coefficients)) = rows.get_mut(metabolite.as_str()) {
                    variables.push(reaction.id.as_str());
                    coefficients.push(*coefficient);
                }
            }
        }
        for (metabolite, (variables, coefficients)) in rows {
            if variables.is_empty() {
                continue;
            }
            problem.add_new_equality_constraint_by_id(metabolite, &variables, &coefficients, 0.)?;
        }
        for (id, coefficient) in &self.objective {
            if *coefficient != 0. {
                problem.add_new_linear_objective_term_by_id(id, *coefficient)?;
            }
        }
        Ok(problem)
    }

    /// Solve a problem built from this model with the model's backend
    pub fn solve_problem(&self, problem: &Problem) -> Result<ProblemSolution, ModelError> {
        Ok(self.solver.solve(problem, self.tolerances)?)
    }

    /// Run flux balance analysis on the model objective
    pub fn optimize(&self) -> Result<ProblemSolution, ModelError> {
        let problem = self.to_problem()?;
        self.solve_problem(&problem)
    }
}

/// Errors raised when working with a [`Model`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Reaction {0} is not in the model")]
    ReactionNotFound(String),
    #[error("Invalid bounds [{lower_bound}, {upper_bound}] for reaction {id}")]
    InvalidBounds {
        id: String,
        lower_bound: f64,
        upper_bound: f64,
    },
    #[error("Splitting would create reaction {0}, which already exists")]
    DuplicateReactionId(String),
    #[error("Unable to build optimization problem: {0}")]
    Problem(#[from] ProblemError),
    #[error("Unable to solve optimization problem: {0}")]
    Solver(#[from] SolverError),
}
