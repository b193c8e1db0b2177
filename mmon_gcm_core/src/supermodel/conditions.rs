//! Physiological conditions applied on top of a constrained supermodel
//!
//! Conditions are always applied in the same order: light, then the guard cell
//! H+-ATPase bound, then the starch knockout.
use std::fmt;
use std::str::FromStr;

use log::info;
use thiserror::Error;

use std::sync::Arc;

use crate::metabolic_model::model::Model;
use crate::supermodel::parameters::ParameterTable;
use crate::supermodel::phased::{Phased, PhotonsApplied};
use crate::supermodel::{reaction_id, SuperModel, SuperModelError};

/// Phase in which blue light opens the stomata
pub const BLUE_LIGHT_PHASE: usize = 2;
/// Photon total used by the batch binaries
pub const DEFAULT_PHOTON_TOTAL: f64 = 150.;
/// ATPase activity factor used when the ATPase constraint is switched on
pub const DEFAULT_ATPASE_FACTOR: f64 = 7.48;

const PHOTON_TX: &str = "Photon_tx";
const GUARD_CELL_PHOTON_TX: &str = "Photon_tx_gc";
const GUARD_CELL_PROTON_ATPASE: &str = "PROTON_ATPase_c_gc";
const GUARD_CELL_STARCH_DEGRADATION: &str = "RXN_1827_p_gc";

/// Light the leaf is exposed to
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LightColour {
    /// Blue light: no photosynthesis in the opening phase
    Blue,
    /// White light: no additional constraint
    White,
    /// White light but no photosynthesis in the guard cell
    NoPhotosynthesisGc,
}

impl FromStr for LightColour {
    type Err = ValidationError;

    /// # Examples
    /// ```rust
    /// use mmon_gcm_core::supermodel::conditions::LightColour;
    /// assert_eq!("nops".parse::<LightColour>().unwrap(), LightColour::NoPhotosynthesisGc);
    /// assert!("purple".parse::<LightColour>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blue" => Ok(LightColour::Blue),
            "white" => Ok(LightColour::White),
            "nops" => Ok(LightColour::NoPhotosynthesisGc),
            other => Err(ValidationError::LightColour(other.to_string())),
        }
    }
}

impl fmt::Display for LightColour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LightColour::Blue => "blue",
            LightColour::White => "white",
            LightColour::NoPhotosynthesisGc => "nops",
        };
        write!(f, "{}", s)
    }
}

/// Parse the `True`/`False` switches of the command line
pub fn parse_switch(name: &str, value: &str) -> Result<bool, ValidationError> {
    match value {
        "True" => Ok(true),
        "False" => Ok(false),
        other => Err(ValidationError::Switch {
            name: name.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Parse the worker count of the command line
pub fn parse_processes(value: &str) -> Result<usize, ValidationError> {
    match value.trim().parse::<usize>() {
        Ok(processes) if processes > 0 => Ok(processes),
        _ => Err(ValidationError::Processes(value.to_string())),
    }
}

/// Invalid values at the command line boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please specify either 'blue' or 'white' or 'nops' for light, not {0}")]
    LightColour(String),
    #[error("Please specify True or False for the {name}, not {value}")]
    Switch { name: String, value: String },
    #[error("Please specify a positive number of cores, not {0}")]
    Processes(String),
}

/// Light, ATPase and starch settings of one run
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhysiologicalConditions {
    pub light: LightColour,
    /// ATPase activity factor, None leaves the ATPase unconstrained
    pub atpase: Option<f64>,
    pub starch_knockout: bool,
}

impl Default for PhysiologicalConditions {
    fn default() -> Self {
        Self {
            light: LightColour::White,
            atpase: None,
            starch_knockout: false,
        }
    }
}

impl PhysiologicalConditions {
    /// Build a supermodel and constrain it fully: osmolarity, photons,
    /// maintenance, then these conditions
    pub fn constrain_model(
        &self,
        parameters: impl Into<Arc<ParameterTable>>,
        model: Model,
        photon_total: f64,
    ) -> Result<Model, SuperModelError> {
        let mut phased = SuperModel::new(parameters, model)?
            .phased()
            .constrain_osmolarity()?
            .constrain_photons(photon_total)?
            .add_maintenance()?;
        self.apply(&mut phased)?;
        Ok(phased.into_inner().into_model())
    }

    /// Apply the conditions, returns the ATPase bound if one was applied
    pub fn apply(
        &self,
        supermodel: &mut Phased<PhotonsApplied>,
    ) -> Result<Option<f64>, SuperModelError> {
        match self.light {
            LightColour::Blue => {
                let cells: Vec<String> = supermodel
                    .supermodel()
                    .cells()
                    .iter()
                    .map(|cell| cell.name.clone())
                    .collect();
                for cell in cells {
                    let id = reaction_id(PHOTON_TX, &cell, BLUE_LIGHT_PHASE);
                    supermodel.restrict_bounds(&id, f64::NEG_INFINITY, 0.)?;
                }
                info!("Model constrained with blue light");
            }
            LightColour::NoPhotosynthesisGc => {
                supermodel.restrict_bounds_multi(GUARD_CELL_PHOTON_TX, 0., 0.)?;
                info!("Photosynthesis prevented in guard cell");
            }
            LightColour::White => info!("Model constrained with white light"),
        }

        let atpase = match self.atpase {
            Some(factor) => {
                let value = supermodel.atpase_constraint_value(factor)?;
                supermodel.restrict_bounds_multi(GUARD_CELL_PROTON_ATPASE, 0., value)?;
                info!("Model ATPase constrained to {}", value);
                Some(value)
            }
            None => {
                info!("Model ATPase left unconstrained");
                None
            }
        };

        if self.starch_knockout {
            supermodel.restrict_bounds_multi(GUARD_CELL_STARCH_DEGRADATION, 0., 0.)?;
            info!("Model starch knocked out");
        } else {
            info!("Model starch left unconstrained");
        }
        Ok(atpase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{toy_model, toy_parameters};

    fn constrained() -> Phased<PhotonsApplied> {
        SuperModel::new(toy_parameters(), toy_model())
            .unwrap()
            .phased()
            .constrain_osmolarity()
            .unwrap()
            .constrain_photons(DEFAULT_PHOTON_TOTAL)
            .unwrap()
            .add_maintenance()
            .unwrap()
    }

    fn bounds(phased: &Phased<PhotonsApplied>, id: &str) -> (f64, f64) {
        let reaction = phased.supermodel().model().reaction(id).unwrap();
        (reaction.lower_bound, reaction.upper_bound)
    }

    #[test]
    fn parse_light_colour() {
        assert_eq!("blue".parse::<LightColour>().unwrap(), LightColour::Blue);
        assert_eq!("white".parse::<LightColour>().unwrap(), LightColour::White);
        assert_eq!(
            "purple".parse::<LightColour>().unwrap_err(),
            ValidationError::LightColour("purple".to_string())
        );
        assert_eq!(LightColour::NoPhotosynthesisGc.to_string(), "nops");
    }

    #[test]
    fn parse_switches() {
        assert!(parse_switch("starch knockout", "True").unwrap());
        assert!(!parse_switch("starch knockout", "False").unwrap());
        assert!(parse_switch("starch knockout", "true").is_err());
        assert_eq!(parse_processes("4").unwrap(), 4);
        assert_eq!(
            parse_processes("0").unwrap_err(),
            ValidationError::Processes("0".to_string())
        );
        assert!(parse_processes("-2").is_err());
    }

    #[test]
    fn blue_light() {
        let mut phased = constrained();
        let conditions = PhysiologicalConditions {
            light: LightColour::Blue,
            ..Default::default()
        };
        assert_eq!(conditions.apply(&mut phased).unwrap(), None);
        assert_eq!(bounds(&phased, "Photon_tx_gc_2"), (0., 0.));
        assert_eq!(bounds(&phased, "Photon_tx_me_2"), (0., 0.));
    }

    #[test]
    fn no_guard_cell_photosynthesis() {
        let mut phased = constrained();
        let conditions = PhysiologicalConditions {
            light: LightColour::NoPhotosynthesisGc,
            ..Default::default()
        };
        conditions.apply(&mut phased).unwrap();
        assert_eq!(bounds(&phased, "Photon_tx_gc_2"), (0., 0.));
        assert!((bounds(&phased, "Photon_tx_me_2").1 - 75.).abs() < 1e-9);
    }

    #[test]
    fn atpase_and_starch() {
        let mut phased = constrained();
        let expected = phased.atpase_constraint_value(DEFAULT_ATPASE_FACTOR).unwrap();
        let conditions = PhysiologicalConditions {
            light: LightColour::White,
            atpase: Some(DEFAULT_ATPASE_FACTOR),
            starch_knockout: true,
        };
        assert_eq!(conditions.apply(&mut phased).unwrap(), Some(expected));
        assert_eq!(bounds(&phased, "PROTON_ATPase_c_gc_1"), (0., expected));
        assert_eq!(bounds(&phased, "PROTON_ATPase_c_gc_2"), (0., expected));
        assert_eq!(bounds(&phased, "RXN_1827_p_gc_1"), (0., 0.));
        assert_eq!(bounds(&phased, "RXN_1827_p_gc_2"), (0., 0.));
    }

    #[test]
    fn constrain_model_matches_manual_sequence() {
        let conditions = PhysiologicalConditions {
            light: LightColour::Blue,
            atpase: Some(DEFAULT_ATPASE_FACTOR),
            starch_knockout: false,
        };
        let model = conditions
            .constrain_model(toy_parameters(), toy_model(), DEFAULT_PHOTON_TOTAL)
            .unwrap();
        let mut phased = constrained();
        conditions.apply(&mut phased).unwrap();
        let manual = phased.into_inner().into_model();
        for (id, reaction) in &manual.reactions {
            let built = model.reaction(id).unwrap();
            assert_eq!((built.lower_bound, built.upper_bound), (reaction.lower_bound, reaction.upper_bound));
        }
    }
}
