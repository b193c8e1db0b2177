//! The supermodel: a stoichiometric model split into cell types and diel phases,
//! together with the physiological parameters used to constrain it
//!
//! Reactions of the supermodel follow the naming scheme `<base>_<cell>_<phase>`,
//! for example `Photon_tx_gc_2` is photon uptake by the guard cell in phase 2.
//! Every constraint is applied by intersecting the requested range with the
//! current bounds of a reaction, so bounds only ever tighten.
pub mod conditions;
pub mod parameters;
pub mod phased;

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info};
use thiserror::Error;

use crate::metabolic_model::model::{Model, ModelError};
use crate::supermodel::parameters::ParameterTable;
use crate::supermodel::phased::{Phased, Unconstrained};

/// Guard cell tag
pub const GUARD_CELL: &str = "gc";
/// Mesophyll cell tag
pub const MESOPHYLL: &str = "me";
/// Cell types of the standard supermodel
pub const DEFAULT_CELL_TYPES: [&str; 2] = [GUARD_CELL, MESOPHYLL];
/// Molar gas constant, J K-1 mol-1
pub const GAS_CONSTANT: f64 = 8.314462618;

const PHOTON_TX: &str = "Photon_tx";
const OSMOLYTE_TX: &str = "Osmolyte_tx";
const ATPASE_TX: &str = "ATPase_tx";
const NADPH_OXIDASE_TX: &str = "NADPHoxidase_tx";

/// Id of the copy of a reaction in one cell type and phase
///
/// # Examples
/// ```rust
/// use mmon_gcm_core::supermodel::reaction_id;
/// assert_eq!(reaction_id("Photon_tx", "gc", 2), "Photon_tx_gc_2");
/// ```
pub fn reaction_id(base: &str, cell: &str, phase: usize) -> String {
    format!("{}_{}_{}", base, cell, phase)
}

/// One diel phase
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Phase {
    /// 1-based phase number, the suffix of the phase's reaction ids
    pub number: usize,
    /// Length of the phase in hours
    pub length: f64,
    /// Light level, zero for a dark phase
    pub light: f64,
}

impl Phase {
    pub fn is_lit(&self) -> bool {
        self.light > 0.
    }
}

/// Geometry of one cell type, per cell and per m² of leaf
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub name: String,
    /// Volume of one cell, µm³
    pub volume: f64,
    /// Surface area of one cell, µm²
    pub surface_area: f64,
    /// Cells per m² of leaf
    pub count: f64,
    /// Baseline osmolarity, mM
    pub osmolarity: f64,
}

impl Cell {
    /// Total volume of this cell type, L m⁻² leaf
    pub fn total_volume(&self) -> f64 {
        self.volume * self.count * 1e-15
    }

    /// Total membrane area of this cell type, m² m⁻² leaf
    pub fn membrane_area(&self) -> f64 {
        self.surface_area * self.count * 1e-12
    }
}

/// A model together with the parameters used to constrain it
#[derive(Clone, Debug)]
pub struct SuperModel {
    model: Model,
    parameters: Arc<ParameterTable>,
    cells: Vec<Cell>,
    phases: Vec<Phase>,
    osmolarity_applied: bool,
    photon_total: Option<f64>,
    maintenance_applied: bool,
}

impl SuperModel {
    /// Create a supermodel with guard cell and mesophyll cell types
    pub fn new(
        parameters: impl Into<Arc<ParameterTable>>,
        model: Model,
    ) -> Result<Self, SuperModelError> {
        Self::with_cell_types(parameters, model, &DEFAULT_CELL_TYPES)
    }

    /// Create a supermodel with the given cell types
    ///
    /// Phases and cell geometry are read from the parameter table here, so every
    /// getter is defined once this returns.
    pub fn with_cell_types(
        parameters: impl Into<Arc<ParameterTable>>,
        model: Model,
        cell_types: &[&str],
    ) -> Result<Self, SuperModelError> {
        let parameters = parameters.into();
        let phases = read_phases(&parameters)?;
        let cells = cell_types
            .iter()
            .map(|name| read_cell(&parameters, name))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Supermodel has {} cell types and {} phases",
            cells.len(),
            phases.len()
        );
        Ok(Self {
            model,
            parameters,
            cells,
            phases,
            osmolarity_applied: false,
            photon_total: None,
            maintenance_applied: false,
        })
    }

    /// Start the typed constraint sequence
    pub fn phased(self) -> Phased<Unconstrained> {
        Phased::new(self)
    }

    // region Accessors
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    pub fn parameters(&self) -> &ParameterTable {
        &self.parameters
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn is_osmolarity_applied(&self) -> bool {
        self.osmolarity_applied
    }

    /// Total photon flux passed to [`SuperModel::constrain_photons`], if it was called
    pub fn photon_total(&self) -> Option<f64> {
        self.photon_total
    }

    pub fn is_maintenance_applied(&self) -> bool {
        self.maintenance_applied
    }
    // endregion Accessors

    // region Constraints
    /// Limit osmolyte import so that no cell type can exceed its maximum turgor
    ///
    /// The maximum osmolarity follows from van 't Hoff, `C = P / (φRT)`. The room
    /// between that and the baseline osmolarity, times the cell volume, is the
    /// amount of osmolyte a cell type can take up. Spread over a phase this gives
    /// a rate, which is further capped by the membrane permeability.
    pub fn constrain_osmolarity(&mut self) -> Result<(), SuperModelError> {
        let temperature = positive(&self.parameters, "temperature")?;
        let mut updates = Vec::new();
        for cell in &self.cells {
            let turgor = self.parameters.get(&format!("turgor_max_{}", cell.name))?;
            let coefficient =
                positive(&self.parameters, &format!("osmotic_coefficient_{}", cell.name))?;
            let permeability =
                non_negative(&self.parameters, &format!("solute_permeability_{}", cell.name))?;
            // MPa -> Pa, mol m-3 is mM
            let maximum = turgor * 1e6 / (coefficient * GAS_CONSTANT * temperature);
            let headroom = maximum - cell.osmolarity;
            if headroom < 0. {
                return Err(SuperModelError::InfeasibleParameter(format!(
                    "osmolarity_{} is {} mM but turgor_max_{} only allows {:.3} mM",
                    cell.name, cell.osmolarity, cell.name, maximum
                )));
            }
            // µmol m-2 leaf
            let capacity = headroom * cell.total_volume() * 1000.;
            let permeability_limit = permeability * cell.membrane_area();
            for phase in &self.phases {
                let rate = capacity / (phase.length * 3600.);
                updates.push((
                    reaction_id(OSMOLYTE_TX, &cell.name, phase.number),
                    f64::NEG_INFINITY,
                    rate.min(permeability_limit),
                ));
            }
        }
        self.apply(updates)?;
        self.osmolarity_applied = true;
        info!("Osmolarity constraints applied");
        Ok(())
    }

    /// Share a total photon flux between cell types in every lit phase
    ///
    /// The share of a cell type is proportional to its photon weight,
    /// `photon_weight_<cell>_<phase>` if present, otherwise `photon_weight_<cell>`.
    /// Dark phases get no photons.
    pub fn constrain_photons(&mut self, total: f64) -> Result<(), SuperModelError> {
        if !self.osmolarity_applied {
            return Err(SuperModelError::OrderingViolation {
                operation: "constrain_photons",
                requires: "constrain_osmolarity",
            });
        }
        if !total.is_finite() || total < 0. {
            return Err(SuperModelError::InfeasibleParameter(format!(
                "photon total must be finite and non-negative, got {}",
                total
            )));
        }
        let mut updates = Vec::new();
        for phase in &self.phases {
            if !phase.is_lit() {
                for cell in &self.cells {
                    updates.push((reaction_id(PHOTON_TX, &cell.name, phase.number), 0., 0.));
                }
                continue;
            }
            let shares = self.photon_shares(phase.number, total)?;
            for (cell, share) in self.cells.iter().zip(shares) {
                let id = reaction_id(PHOTON_TX, &cell.name, phase.number);
                let current = self.model.reaction(&id).map_err(|_| {
                    SuperModelError::MissingReactionTemplate(id.clone())
                })?;
                // a clipped share would break the partition of the total
                if share > current.upper_bound {
                    return Err(SuperModelError::InfeasibleParameter(format!(
                        "photon share {} of {} exceeds its upper bound {}",
                        share, id, current.upper_bound
                    )));
                }
                updates.push((id, 0., share));
            }
        }
        self.apply(updates)?;
        self.photon_total = Some(total);
        info!("Photon constraints applied, {} in total", total);
        Ok(())
    }

    fn photon_shares(&self, phase: usize, total: f64) -> Result<Vec<f64>, SuperModelError> {
        let weights = self
            .cells
            .iter()
            .map(|cell| {
                let name = format!("photon_weight_{}_{}", cell.name, phase);
                match self.parameters.get_optional(&name) {
                    Some(weight) => Ok((name, weight)),
                    None => {
                        let name = format!("photon_weight_{}", cell.name);
                        self.parameters.get(&name).map(|weight| (name, weight))
                    }
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        if let Some((name, weight)) = weights
            .iter()
            .find(|(_, weight)| !weight.is_finite() || *weight < 0.)
        {
            return Err(SuperModelError::InfeasibleParameter(format!(
                "{} must be finite and non-negative, got {}",
                name, weight
            )));
        }
        let sum: f64 = weights.iter().map(|(_, weight)| weight).sum();
        if sum <= 0. {
            return Err(SuperModelError::InfeasibleParameter(format!(
                "photon weights of phase {} sum to zero",
                phase
            )));
        }
        Ok(weights
            .iter()
            .map(|(_, weight)| total * weight / sum)
            .collect())
    }

    /// Fix the maintenance ATP demand of every cell type in every phase
    ///
    /// Maintenance scales with cell volume. Where the model has an NADPH oxidase
    /// drain it is fixed at a third of the ATP demand.
    pub fn add_maintenance(&mut self) -> Result<(), SuperModelError> {
        let cost = non_negative(&self.parameters, "maintenance_cost")?;
        let mut updates = Vec::new();
        for cell in &self.cells {
            let demand = cost * cell.total_volume();
            for phase in &self.phases {
                updates.push((reaction_id(ATPASE_TX, &cell.name, phase.number), demand, demand));
                let nadph = reaction_id(NADPH_OXIDASE_TX, &cell.name, phase.number);
                if self.model.reactions.contains_key(&nadph) {
                    updates.push((nadph, demand / 3., demand / 3.));
                }
            }
        }
        self.apply(updates)?;
        self.maintenance_applied = true;
        info!("Maintenance costs applied");
        Ok(())
    }

    /// Upper bound for the guard cell plasma membrane H+-ATPase
    ///
    /// Scales with guard cell membrane area and with light up to
    /// `photon_saturation`, and never exceeds the guard cell osmolyte import
    /// bound. Only defined after [`SuperModel::constrain_photons`].
    pub fn get_atpase_constraint_value(&self, factor: f64) -> Result<f64, SuperModelError> {
        let total = self
            .photon_total
            .ok_or(SuperModelError::OrderingViolation {
                operation: "get_atpase_constraint_value",
                requires: "constrain_photons",
            })?;
        self.atpase_value(total, factor)
    }

    pub(crate) fn atpase_value(&self, total: f64, factor: f64) -> Result<f64, SuperModelError> {
        if !factor.is_finite() || factor < 0. {
            return Err(SuperModelError::InfeasibleParameter(format!(
                "ATPase factor must be finite and non-negative, got {}",
                factor
            )));
        }
        let saturation = positive(&self.parameters, "photon_saturation")?;
        let area = self.parameters.get(&format!("surface_area_{}", GUARD_CELL))?
            * self.parameters.get(&format!("cell_count_{}", GUARD_CELL))?
            * 1e-12;
        let template = format!("{}_{}", OSMOLYTE_TX, GUARD_CELL);
        let cap = self
            .model
            .phase_reactions(&template)
            .iter()
            .filter_map(|id| self.model.reactions.get(id))
            .map(|reaction| reaction.upper_bound)
            .reduce(f64::max)
            .ok_or(SuperModelError::MissingReactionTemplate(template))?;
        let value = factor * area * (total / saturation).min(1.);
        Ok(value.min(cap))
    }
    // endregion Constraints

    // region Bound edits
    /// Intersect the bounds of a reaction with `[lower_bound, upper_bound]`
    pub fn restrict_bounds(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), SuperModelError> {
        let reaction = self
            .model
            .reactions
            .get(id)
            .ok_or_else(|| SuperModelError::MissingReactionTemplate(id.to_string()))?;
        let lower = reaction.lower_bound.max(lower_bound);
        let upper = reaction.upper_bound.min(upper_bound);
        if lower > upper || lower.is_nan() || upper.is_nan() {
            return Err(SuperModelError::InfeasibleParameter(format!(
                "[{}, {}] does not intersect the bounds [{}, {}] of {}",
                lower_bound, upper_bound, reaction.lower_bound, reaction.upper_bound, id
            )));
        }
        self.model.set_bounds(id, lower, upper)?;
        debug!("Bounds of {} set to [{}, {}]", id, lower, upper);
        Ok(())
    }

    /// Restrict every phase copy of a reaction, e.g. `PROTON_ATPase_c_gc` matches
    /// `PROTON_ATPase_c_gc_1`, `PROTON_ATPase_c_gc_2`, ...
    ///
    /// Returns the number of reactions edited.
    pub fn restrict_bounds_multi(
        &mut self,
        prefix: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<usize, SuperModelError> {
        let ids = self.model.phase_reactions(prefix);
        if ids.is_empty() {
            return Err(SuperModelError::MissingReactionTemplate(prefix.to_string()));
        }
        for id in &ids {
            self.restrict_bounds(id, lower_bound, upper_bound)?;
        }
        Ok(ids.len())
    }

    fn apply(&mut self, updates: Vec<(String, f64, f64)>) -> Result<(), SuperModelError> {
        for (id, lower_bound, upper_bound) in updates {
            self.restrict_bounds(&id, lower_bound, upper_bound)?;
        }
        Ok(())
    }
    // endregion Bound edits

    // region Getters
    /// Baseline osmolarity of each cell type, mM
    pub fn get_osmolarities(&self) -> IndexMap<String, f64> {
        self.cells
            .iter()
            .map(|cell| (cell.name.clone(), cell.osmolarity))
            .collect()
    }

    /// Total volume of each cell type, L m⁻² leaf
    pub fn get_volumes(&self) -> IndexMap<String, f64> {
        self.cells
            .iter()
            .map(|cell| (cell.name.clone(), cell.total_volume()))
            .collect()
    }

    /// Current upper bound of every photon uptake reaction
    pub fn get_photons(&self) -> IndexMap<String, f64> {
        let mut photons = IndexMap::new();
        for cell in &self.cells {
            for phase in &self.phases {
                let id = reaction_id(PHOTON_TX, &cell.name, phase.number);
                if let Some(reaction) = self.model.reactions.get(&id) {
                    photons.insert(id, reaction.upper_bound);
                }
            }
        }
        photons
    }

    /// Guard cell share of the total cell volume, zero without a guard cell type
    pub fn get_prop_gc(&self) -> f64 {
        let total: f64 = self.cells.iter().map(|cell| cell.total_volume()).sum();
        self.cells
            .iter()
            .find(|cell| cell.name == GUARD_CELL)
            .map(|cell| cell.total_volume() / total)
            .unwrap_or(0.)
    }
    // endregion Getters
}

fn read_phases(parameters: &ParameterTable) -> Result<Vec<Phase>, SuperModelError> {
    // phase_length_1 is always required
    parameters.get("phase_length_1")?;
    let mut phases = Vec::new();
    let mut number = 1;
    while parameters.contains(&format!("phase_length_{}", number)) {
        let length = positive(parameters, &format!("phase_length_{}", number))?;
        let light = non_negative(parameters, &format!("phase_light_{}", number))?;
        phases.push(Phase {
            number,
            length,
            light,
        });
        number += 1;
    }
    Ok(phases)
}

fn read_cell(parameters: &ParameterTable, name: &str) -> Result<Cell, SuperModelError> {
    Ok(Cell {
        name: name.to_string(),
        volume: positive(parameters, &format!("volume_{}", name))?,
        surface_area: positive(parameters, &format!("surface_area_{}", name))?,
        count: positive(parameters, &format!("cell_count_{}", name))?,
        osmolarity: non_negative(parameters, &format!("osmolarity_{}", name))?,
    })
}

fn positive(parameters: &ParameterTable, name: &str) -> Result<f64, SuperModelError> {
    let value = parameters.get(name)?;
    if value.is_finite() && value > 0. {
        Ok(value)
    } else {
        Err(SuperModelError::InfeasibleParameter(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

fn non_negative(parameters: &ParameterTable, name: &str) -> Result<f64, SuperModelError> {
    let value = parameters.get(name)?;
    if value.is_finite() && value >= 0. {
        Ok(value)
    } else {
        Err(SuperModelError::InfeasibleParameter(format!(
            "{} must be non-negative, got {}",
            name, value
        )))
    }
}

/// Errors raised while deriving supermodel constraints, all fatal for a run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SuperModelError {
    #[error("Parameter {0} is missing from the parameter table")]
    MissingParameter(String),
    #[error("No reaction matching {0} in the model")]
    MissingReactionTemplate(String),
    #[error("{operation} requires {requires} to be applied first")]
    OrderingViolation {
        operation: &'static str,
        requires: &'static str,
    },
    #[error("Infeasible parameter: {0}")]
    InfeasibleParameter(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{toy_model, toy_parameters};

    fn toy() -> SuperModel {
        SuperModel::new(toy_parameters(), toy_model()).unwrap()
    }

    fn upper(supermodel: &SuperModel, id: &str) -> f64 {
        supermodel.model().reaction(id).unwrap().upper_bound
    }

    #[test]
    fn reads_phases_and_cells() {
        let supermodel = toy();
        assert_eq!(supermodel.phases().len(), 2);
        assert!(!supermodel.phases()[0].is_lit());
        assert!(supermodel.phases()[1].is_lit());
        let volumes = supermodel.get_volumes();
        assert!((volumes["gc"] - 1.5e-4).abs() < 1e-15);
        assert!((volumes["me"] - 3e-4).abs() < 1e-15);
        assert!((supermodel.get_prop_gc() - 1. / 3.).abs() < 1e-12);
        assert_eq!(supermodel.get_osmolarities()["gc"], 300.);
    }

    #[test]
    fn construction_requires_geometry() {
        let parameters = toy_parameters();
        let mut values: Vec<(String, f64)> = parameters
            .names()
            .filter(|name| *name != "volume_me")
            .map(|name| (name.to_string(), parameters.get(name).unwrap()))
            .collect();
        values.sort_by(|a, b| a.0.cmp(&b.0));
        let result = SuperModel::new(ParameterTable::from_values(values), toy_model());
        assert_eq!(
            result.unwrap_err(),
            SuperModelError::MissingParameter("volume_me".to_string())
        );
    }

    #[test]
    fn osmolarity_bounds() {
        let mut supermodel = toy();
        supermodel.constrain_osmolarity().unwrap();
        let maximum = 3e6 / (GAS_CONSTANT * 298.15);
        let expected = (maximum - 300.) * 1.5e-4 * 1000. / (12. * 3600.);
        assert!((upper(&supermodel, "Osmolyte_tx_gc_1") - expected).abs() < 1e-12);
        assert!((upper(&supermodel, "Osmolyte_tx_gc_2") - expected).abs() < 1e-12);
        assert!(upper(&supermodel, "Osmolyte_tx_me_1") < upper(&supermodel, "Osmolyte_tx_gc_1"));
    }

    #[test]
    fn osmolarity_above_turgor_is_infeasible() {
        let overrides: IndexMap<String, f64> =
            [("osmolarity_gc".to_string(), 2000.)].into_iter().collect();
        let parameters = toy_parameters().with_overrides(&overrides);
        let mut supermodel = SuperModel::new(parameters, toy_model()).unwrap();
        assert!(matches!(
            supermodel.constrain_osmolarity(),
            Err(SuperModelError::InfeasibleParameter(_))
        ));
    }

    #[test]
    fn photons_split_equally() {
        let mut supermodel = toy();
        supermodel.constrain_osmolarity().unwrap();
        supermodel.constrain_photons(150.).unwrap();
        let photons = supermodel.get_photons();
        assert!((photons["Photon_tx_gc_2"] - 75.).abs() < 1e-9);
        assert!((photons["Photon_tx_me_2"] - 75.).abs() < 1e-9);
        assert_eq!(photons["Photon_tx_gc_1"], 0.);
        assert_eq!(photons["Photon_tx_me_1"], 0.);
        assert_eq!(supermodel.photon_total(), Some(150.));
    }

    #[test]
    fn photon_share_above_reaction_bound() {
        let mut supermodel = toy();
        supermodel.constrain_osmolarity().unwrap();
        // each share is 1500, photon uptake is capped at 1000
        assert!(matches!(
            supermodel.constrain_photons(3000.),
            Err(SuperModelError::InfeasibleParameter(_))
        ));
        assert_eq!(supermodel.photon_total(), None);
        assert_eq!(upper(&supermodel, "Photon_tx_gc_2"), 1000.);
        assert_eq!(upper(&supermodel, "Photon_tx_gc_1"), 1000.);
        // exactly at the cap still partitions the total
        supermodel.constrain_photons(2000.).unwrap();
        let photons = supermodel.get_photons();
        assert!((photons["Photon_tx_gc_2"] + photons["Photon_tx_me_2"] - 2000.).abs() < 1e-9);
    }

    #[test]
    fn phase_specific_photon_weight() {
        let overrides: IndexMap<String, f64> =
            [("photon_weight_gc_2".to_string(), 0.5)].into_iter().collect();
        let parameters = toy_parameters().with_overrides(&overrides);
        let mut supermodel = SuperModel::new(parameters, toy_model()).unwrap();
        supermodel.constrain_osmolarity().unwrap();
        supermodel.constrain_photons(150.).unwrap();
        assert!((upper(&supermodel, "Photon_tx_gc_2") - 50.).abs() < 1e-9);
        assert!((upper(&supermodel, "Photon_tx_me_2") - 100.).abs() < 1e-9);
    }

    #[test]
    fn ordering_is_enforced() {
        let mut supermodel = toy();
        assert!(matches!(
            supermodel.constrain_photons(150.),
            Err(SuperModelError::OrderingViolation { .. })
        ));
        assert!(matches!(
            supermodel.get_atpase_constraint_value(7.48),
            Err(SuperModelError::OrderingViolation { .. })
        ));
        supermodel.constrain_osmolarity().unwrap();
        assert!(supermodel.constrain_photons(-1.).is_err());
        assert!(supermodel.constrain_photons(f64::NAN).is_err());
    }

    #[test]
    fn atpase_value_is_capped_by_osmolyte_import() {
        let mut supermodel = toy();
        supermodel.constrain_osmolarity().unwrap();
        supermodel.constrain_photons(150.).unwrap();
        let cap = upper(&supermodel, "Osmolyte_tx_gc_1");
        assert!((supermodel.get_atpase_constraint_value(7.48).unwrap() - cap).abs() < 1e-15);
        // 0.01 * 0.075 m2 * 0.5
        let small = supermodel.get_atpase_constraint_value(0.01).unwrap();
        assert!((small - 0.000375).abs() < 1e-12);
        assert_eq!(supermodel.get_atpase_constraint_value(0.).unwrap(), 0.);
    }

    #[test]
    fn maintenance_fixes_atpase_drains() {
        let mut supermodel = toy();
        supermodel.add_maintenance().unwrap();
        for phase in 1..=2 {
            let gc = supermodel.model().reaction(&reaction_id("ATPase_tx", "gc", phase)).unwrap();
            assert!((gc.lower_bound - 1.5).abs() < 1e-9);
            assert_eq!(gc.lower_bound, gc.upper_bound);
            let me = supermodel.model().reaction(&reaction_id("ATPase_tx", "me", phase)).unwrap();
            assert!((me.upper_bound - 3.).abs() < 1e-9);
        }
        assert!(supermodel.is_maintenance_applied());
    }

    #[test]
    fn missing_template() {
        let mut model = toy_model();
        model.reactions.shift_remove("Osmolyte_tx_me_2");
        let mut supermodel = SuperModel::new(toy_parameters(), model).unwrap();
        assert_eq!(
            supermodel.constrain_osmolarity().unwrap_err(),
            SuperModelError::MissingReactionTemplate("Osmolyte_tx_me_2".to_string())
        );
        assert_eq!(
            supermodel.restrict_bounds_multi("Nonexistent_tx", 0., 0.).unwrap_err(),
            SuperModelError::MissingReactionTemplate("Nonexistent_tx".to_string())
        );
    }

    #[test]
    fn restrict_bounds_intersects() {
        let mut supermodel = toy();
        supermodel.restrict_bounds("Transfer_atp_gc_me_1", -5., 2000.).unwrap();
        let reaction = supermodel.model().reaction("Transfer_atp_gc_me_1").unwrap();
        assert_eq!((reaction.lower_bound, reaction.upper_bound), (-5., 1000.));
        assert!(matches!(
            supermodel.restrict_bounds("Transfer_atp_gc_me_1", 10., 20.),
            Ok(())
        ));
        assert!(matches!(
            supermodel.restrict_bounds("Transfer_atp_gc_me_1", 30., 40.),
            Err(SuperModelError::InfeasibleParameter(_))
        ));
        assert_eq!(supermodel.restrict_bounds_multi("RXN_1827_p_gc", 0., 0.).unwrap(), 2);
    }

    #[test]
    fn constraints_only_tighten() {
        let mut supermodel = toy();
        let mut previous = supermodel.model().reactions.clone();
        let steps: Vec<Box<dyn Fn(&mut SuperModel) -> Result<(), SuperModelError>>> = vec![
            Box::new(|s: &mut SuperModel| s.constrain_osmolarity()),
            Box::new(|s: &mut SuperModel| s.constrain_photons(150.)),
            Box::new(|s: &mut SuperModel| {
                let value = s.get_atpase_constraint_value(7.48)?;
                s.restrict_bounds_multi("PROTON_ATPase_c_gc", 0., value).map(|_| ())
            }),
            Box::new(|s: &mut SuperModel| s.add_maintenance()),
        ];
        for step in steps {
            step(&mut supermodel).unwrap();
            for (id, reaction) in &supermodel.model().reactions {
                let before = &previous[id];
                assert!(reaction.upper_bound <= before.upper_bound, "{}", id);
                assert!(reaction.lower_bound >= before.lower_bound, "{}", id);
            }
            previous = supermodel.model().reactions.clone();
        }
    }
}
