//! Core of mmon-gcm, flux analysis of guard cell and mesophyll supermodels.
//!
//! A [`supermodel::SuperModel`] derives osmolarity, photon and maintenance
//! constraints from a parameter table. [`solving::solve`] runs weighted
//! parsimonious FBA and flux variability analysis on the constrained model, and
//! the [`alternative_modes`] and [`constraint_scan`] drivers run many such solves
//! as resumable parallel batches.

pub mod alternative_modes;
pub mod batch;
pub mod configuration;
pub mod constraint_scan;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
pub mod solving;
pub mod supermodel;
pub mod utils;

#[cfg(test)]
mod test_utils;
