//! Alternative flux modes: one weighted pFBA + FVA solve per weighting row
//!
//! Every row of a weighting table gives a different weight to each reaction, so
//! each solve lands on a different flux distribution among those that reach the
//! same biological optimum.
use indexmap::IndexMap;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::batch::checkpoint::CheckpointStore;
use crate::batch::pool::WorkerPool;
use crate::batch::{run_batch, BatchError, BatchOutcome};
use crate::io::tables::IndexedTable;
use crate::metabolic_model::model::{Model, ModelError};
use crate::solving::{solve, SolvingError, WeightingVector};

/// Range weights are drawn from when none is given
pub const DEFAULT_WEIGHT_RANGE: (f64, f64) = (0.5, 1.5);

/// Solve the model once per weighting row, resuming from any stored solutions
///
/// The model is split once up front, every row then solves against its own copy.
pub fn run_alternative_modes(
    model: &Model,
    weightings: &IndexedTable,
    store: &CheckpointStore,
    pool: &WorkerPool,
    tolerance: f64,
) -> Result<BatchOutcome, AlternativeModesError> {
    let split = model.split_reversible()?;
    info!(
        "Solving {} weighting rows over {} reactions",
        weightings.len(),
        split.reactions.len()
    );
    run_batch(weightings, store, pool, |_, weights: &WeightingVector| {
        Ok(solve(&split, weights, tolerance)?)
    })
}

/// Generate a table of random weightings, reproducible for a given seed
///
/// # Examples
/// ```rust
/// use mmon_gcm_core::alternative_modes::{generate_weightings, DEFAULT_WEIGHT_RANGE};
/// let table = generate_weightings(&["A", "B"], 4, DEFAULT_WEIGHT_RANGE, 42).unwrap();
/// assert_eq!(table.len(), 4);
/// assert!(table[&3]["B"] >= 0.5 && table[&3]["B"] <= 1.5);
/// ```
pub fn generate_weightings<S: AsRef<str>>(
    reaction_ids: &[S],
    rows: usize,
    range: (f64, f64),
    seed: u64,
) -> Result<IndexedTable, AlternativeModesError> {
    let (minimum, maximum) = range;
    if !minimum.is_finite() || !maximum.is_finite() || minimum < 0. || minimum > maximum {
        return Err(AlternativeModesError::InvalidRange { minimum, maximum });
    }
    let mut rng = StdRng::seed_from_u64(seed);
    Ok((0..rows)
        .map(|row| {
            let weights: IndexMap<String, f64> = reaction_ids
                .iter()
                .map(|id| (id.as_ref().to_string(), rng.gen_range(minimum..=maximum)))
                .collect();
            (row, weights)
        })
        .collect())
}

#[derive(Error, Debug)]
pub enum AlternativeModesError {
    #[error("Weights must be drawn from a non-negative range, got [{minimum}, {maximum}]")]
    InvalidRange { minimum: f64, maximum: f64 },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Solving(#[from] SolvingError),
    #[error(transparent)]
    Batch(#[from] BatchError),
}
