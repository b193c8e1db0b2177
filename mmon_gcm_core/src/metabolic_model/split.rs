//! Rewriting reversible reactions as pairs of irreversible reactions
//!
//! A reaction `r` with a negative lower bound is restricted to its forward half
//! and paired with `r_reverse`, which carries the negated stoichiometry and
//! objective coefficient. The net flux of the original reaction is the forward
//! flux minus the reverse flux.
use indexmap::IndexMap;

use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::Reaction;

/// Suffix appended to the id of the reverse half of a split reaction
pub const REVERSE_SUFFIX: &str = "_reverse";

/// Id of the reaction a (possibly split) reaction id belongs to
///
/// # Examples
/// ```rust
/// use mmon_gcm_core::metabolic_model::split::real_reaction_id;
/// assert_eq!(real_reaction_id("PGI_reverse"), "PGI");
/// assert_eq!(real_reaction_id("PGI"), "PGI");
/// ```
pub fn real_reaction_id(id: &str) -> &str {
    id.strip_suffix(REVERSE_SUFFIX).unwrap_or(id)
}

/// Fold a flux map of a split model back onto the reactions of the unsplit model
///
/// Entries keep the order in which real reaction ids first appear.
pub fn net_fluxes(fluxes: &IndexMap<String, f64>) -> IndexMap<String, f64> {
    let mut net: IndexMap<String, f64> = IndexMap::with_capacity(fluxes.len());
    for (id, flux) in fluxes {
        match id.strip_suffix(REVERSE_SUFFIX) {
            Some(real) => *net.entry(real.to_string()).or_insert(0.) -= flux,
            None => *net.entry(id.clone()).or_insert(0.) += flux,
        }
    }
    net
}

impl Model {
    /// Whether every reaction in the model has a non-negative lower bound
    pub fn is_irreversible(&self) -> bool {
        self.reactions.values().all(|r| !r.is_reversible())
    }

    /// Ids of the reactions of the unsplit model, in model order
    pub fn real_reaction_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.reactions.len());
        for id in self.reactions.keys() {
            let real = real_reaction_id(id);
            if !ids.iter().any(|seen| seen == real) {
                ids.push(real.to_string());
            }
        }
        ids
    }

    /// Create an equivalent model where every reaction carries flux in one direction only
    ///
    /// Splitting a model without reversible reactions returns an unchanged copy, so
    /// re-splitting is a no-op.
    ///
    /// # Examples
    /// ```rust
    /// use mmon_gcm_core::metabolic_model::model::Model;
    /// use mmon_gcm_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty();
    /// model.add_reaction(
    ///     ReactionBuilder::default()
    ///         .id("r".to_string())
    ///         .lower_bound(-5.)
    ///         .upper_bound(10.)
    ///         .build()
    ///         .unwrap(),
    /// );
    /// let split = model.split_reversible().unwrap();
    /// let reverse = split.reaction("r_reverse").unwrap();
    /// assert_eq!((reverse.lower_bound, reverse.upper_bound), (0., 5.));
    /// ```
    pub fn split_reversible(&self) -> Result<Model, ModelError> {
        let mut split = self.clone();
        if self.is_irreversible() {
            return Ok(split);
        }
        let mut reactions: IndexMap<String, Reaction> =
            IndexMap::with_capacity(self.reactions.len() * 2);
        for (id, reaction) in &self.reactions {
            if !reaction.is_reversible() {
                reactions.insert(id.clone(), reaction.clone());
                continue;
            }
            let reverse_id = format!("{}{}", id, REVERSE_SUFFIX);
            if self.reactions.contains_key(&reverse_id) {
                return Err(ModelError::DuplicateReactionId(reverse_id));
            }
            let mut forward = reaction.clone();
            forward.lower_bound = reaction.get_forward_lower_bound();
            forward.upper_bound = reaction.get_forward_upper_bound();

            let mut reverse = reaction.clone();
            reverse.id = reverse_id.clone();
            reverse.lower_bound = reaction.get_reverse_lower_bound();
            reverse.upper_bound = reaction.get_reverse_upper_bound();
            reverse.metabolites = reaction
                .metabolites
                .iter()
                .map(|(met, coef)| (met.clone(), -coef))
                .collect();

            if let Some(coefficient) = self.objective.get(id) {
                split.objective.insert(reverse_id.clone(), -coefficient);
            }
            reactions.insert(id.clone(), forward);
            reactions.insert(reverse_id, reverse);
        }
        split.reactions = reactions;
        Ok(split)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::reaction::ReactionBuilder;

    fn reaction(id: &str, metabolites: &[(&str, f64)], lower_bound: f64, upper_bound: f64) -> Reaction {
        ReactionBuilder::default()
            .id(id.to_string())
            .metabolites(
                metabolites
                    .iter()
                    .map(|(m, c)| (m.to_string(), *c))
                    .collect(),
            )
            .lower_bound(lower_bound)
            .upper_bound(upper_bound)
            .build()
            .unwrap()
    }

    /// Uptake of A, a reversible A <-> B, and secretion of B which is the objective
    fn small_model() -> Model {
        let mut model = Model::new_empty();
        model.add_reaction(reaction("EX_a", &[("a", 1.)], -10., 10.));
        model.add_reaction(reaction("AB", &[("a", -1.), ("b", 1.)], -1000., 1000.));
        model.add_reaction(reaction("EX_b", &[("b", -1.)], 0., 1000.));
        model.add_reaction(reaction("Back", &[("b", -1.)], -8., -2.));
        model.objective.insert("AB".to_string(), 1.);
        model
    }

    #[test]
    fn splits_reversible_reactions() {
        let split = small_model().split_reversible().unwrap();
        let ids: Vec<&str> = split.reactions.keys().map(|id| id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["EX_a", "EX_a_reverse", "AB", "AB_reverse", "EX_b", "Back", "Back_reverse"]
        );
        let ab_reverse = split.reaction("AB_reverse").unwrap();
        assert_eq!(ab_reverse.metabolites["a"], 1.);
        assert_eq!(ab_reverse.metabolites["b"], -1.);
        assert_eq!(split.objective_coefficient("AB_reverse"), -1.);

        let back = split.reaction("Back").unwrap();
        assert_eq!((back.lower_bound, back.upper_bound), (0., 0.));
        let back_reverse = split.reaction("Back_reverse").unwrap();
        assert_eq!((back_reverse.lower_bound, back_reverse.upper_bound), (2., 8.));
        assert!(split.is_irreversible());
    }

    #[test]
    fn resplit_is_noop() {
        let split = small_model().split_reversible().unwrap();
        let resplit = split.split_reversible().unwrap();
        assert_eq!(split.reactions, resplit.reactions);
        assert_eq!(split.objective, resplit.objective);
    }

    #[test]
    fn duplicate_reverse_id() {
        let mut model = small_model();
        model.add_reaction(reaction("AB_reverse", &[], 0., 1.));
        assert_eq!(
            model.split_reversible().unwrap_err(),
            ModelError::DuplicateReactionId("AB_reverse".to_string())
        );
    }

    #[test]
    fn net_flux_round_trip() {
        let model = small_model();
        let original = model.optimize().unwrap();
        let split = model.split_reversible().unwrap();
        let solution = split.optimize().unwrap();
        assert!(
            (original.objective_value.unwrap() - solution.objective_value.unwrap()).abs() < 1e-8
        );
        let net = net_fluxes(&solution.variable_values.unwrap());
        assert_eq!(net.keys().collect::<Vec<_>>(), model.reactions.keys().collect::<Vec<_>>());
        assert!((net["AB"] - 10.).abs() < 1e-8);
        assert_eq!(split.real_reaction_ids(), vec!["EX_a", "AB", "EX_b", "Back"]);
    }
}
