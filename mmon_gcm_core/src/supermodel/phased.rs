//! Typed constraint sequence for a [`SuperModel`]
//!
//! Osmolarity has to be constrained before photons, and the ATPase bound can only
//! be derived once photons are constrained. `Phased` tracks how far along that
//! sequence a supermodel is in its type, so calling things out of order does
//! not compile.
//!
//! ```rust,no_run
//! # use mmon_gcm_core::supermodel::{SuperModel, SuperModelError};
//! # fn run(supermodel: SuperModel) -> Result<(), SuperModelError> {
//! let constrained = supermodel
//!     .phased()
//!     .constrain_osmolarity()?
//!     .constrain_photons(150.)?
//!     .add_maintenance()?;
//! let atpase = constrained.atpase_constraint_value(7.48)?;
//! # Ok(())
//! # }
//! ```
use std::marker::PhantomData;

use crate::supermodel::{SuperModel, SuperModelError};

/// No constraints applied yet
#[derive(Debug)]
pub struct Unconstrained;
/// Osmolarity constrained
#[derive(Debug)]
pub struct OsmolarityApplied;
/// Osmolarity and photons constrained
#[derive(Debug)]
pub struct PhotonsApplied;

#[derive(Debug)]
pub struct Phased<S> {
    supermodel: SuperModel,
    stage: PhantomData<S>,
}

impl<S> Phased<S> {
    fn advance<T>(self) -> Phased<T> {
        Phased {
            supermodel: self.supermodel,
            stage: PhantomData,
        }
    }

    pub fn supermodel(&self) -> &SuperModel {
        &self.supermodel
    }

    pub fn into_inner(self) -> SuperModel {
        self.supermodel
    }

    /// Fix maintenance demand, allowed at any stage
    pub fn add_maintenance(mut self) -> Result<Self, SuperModelError> {
        self.supermodel.add_maintenance()?;
        Ok(self)
    }

    /// Ad hoc bound edit, see [`SuperModel::restrict_bounds`]
    pub fn restrict_bounds(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), SuperModelError> {
        self.supermodel.restrict_bounds(id, lower_bound, upper_bound)
    }

    /// Ad hoc bound edit, see [`SuperModel::restrict_bounds_multi`]
    pub fn restrict_bounds_multi(
        &mut self,
        prefix: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<usize, SuperModelError> {
        self.supermodel
            .restrict_bounds_multi(prefix, lower_bound, upper_bound)
    }
}

impl Phased<Unconstrained> {
    pub fn new(supermodel: SuperModel) -> Self {
        Phased {
            supermodel,
            stage: PhantomData,
        }
    }

    pub fn constrain_osmolarity(mut self) -> Result<Phased<OsmolarityApplied>, SuperModelError> {
        self.supermodel.constrain_osmolarity()?;
        Ok(self.advance())
    }
}

impl Phased<OsmolarityApplied> {
    pub fn constrain_photons(mut self, total: f64) -> Result<Phased<PhotonsApplied>, SuperModelError> {
        self.supermodel.constrain_photons(total)?;
        Ok(self.advance())
    }
}

impl Phased<PhotonsApplied> {
    /// Total photon flux the supermodel was constrained with
    pub fn photon_total(&self) -> f64 {
        self.supermodel.photon_total().unwrap_or_default()
    }

    /// See [`SuperModel::get_atpase_constraint_value`]
    pub fn atpase_constraint_value(&self, factor: f64) -> Result<f64, SuperModelError> {
        self.supermodel.atpase_value(self.photon_total(), factor)
    }
}
