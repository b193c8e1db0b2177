//! Provides struct for representing an optimization problem's objective

use indexmap::IndexMap;

/// Represents the linear objective of an optimization problem
#[derive(Debug, Clone, Default)]
pub struct Objective {
    /// Coefficients of the objective, keyed by variable id
    terms: IndexMap<String, f64>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    pub(crate) sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            terms: IndexMap::new(),
            sense,
        }
    }

    /// Create a new empty maximization objective
    pub fn new_maximize() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new empty minimization objective
    pub fn new_minimize() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }

    /// Change the sense of the objective
    pub fn set_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }

    /// Sense of the objective
    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// Add a new linear term to the objective, terms on the same variable accumulate
    pub fn add_linear_term(&mut self, variable_id: &str, coefficient: f64) {
        *self.terms.entry(variable_id.to_string()).or_insert(0.) += coefficient;
    }

    /// Coefficient of a variable, zero if it is not part of the objective
    pub fn coefficient(&self, variable_id: &str) -> f64 {
        self.terms.get(variable_id).copied().unwrap_or(0.)
    }

    /// Iterate over the (variable id, coefficient) terms
    pub fn terms(&self) -> impl Iterator<Item = (&str, f64)> {
        self.terms.iter().map(|(id, coef)| (id.as_str(), *coef))
    }

    /// Remove all terms, keeping the sense
    pub fn remove_all_terms(&mut self) {
        self.terms.clear();
    }

    /// Whether the objective has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    #[default]
    Maximize,
}
