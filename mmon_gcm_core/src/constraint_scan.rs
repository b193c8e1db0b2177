//! Scans over constraint values
//!
//! A scan table holds one raw value in `[0, 1]` per dimension and row. Each raw
//! value is mapped onto the physical range of its dimension, the supermodel is
//! rebuilt and constrained for that point and solved with uniform weights.
use indexmap::IndexMap;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::batch::checkpoint::CheckpointStore;
use crate::batch::pool::WorkerPool;
use crate::batch::{run_batch, BatchError, BatchOutcome};
use crate::io::tables::{DimensionColumns, IndexedTable};
use crate::metabolic_model::model::Model;
use crate::solving::{solve, SolutionRecord, SolvingError, WeightingVector};
use crate::supermodel::conditions::{PhysiologicalConditions, DEFAULT_PHOTON_TOTAL};
use crate::supermodel::parameters::ParameterTable;
use crate::supermodel::SuperModelError;

/// Column of the total photon flux
pub const LIGHT: &str = "light";
/// Column of the guard cell ATPase activity factor
pub const ATPASE: &str = "atpase";

const PHOTON_FLUX_PARAMETER: &str = "photon_flux";
const ATPASE_PARAMETER: &str = "atpase_activity";

/// Map a raw value in `[0, 1]` linearly onto `[minimum, maximum]`
///
/// # Examples
/// ```rust
/// use mmon_gcm_core::constraint_scan::normalise_within_bounds;
/// assert_eq!(normalise_within_bounds(0.25, (0., 200.)).unwrap(), 50.);
/// assert!(normalise_within_bounds(1.5, (0., 200.)).is_err());
/// ```
pub fn normalise_within_bounds(raw: f64, bounds: (f64, f64)) -> Result<f64, ScanError> {
    let (minimum, maximum) = bounds;
    if !(0. ..=1.).contains(&raw) || minimum.is_nan() || maximum.is_nan() || minimum > maximum {
        return Err(ScanError::OutOfRange {
            value: raw,
            minimum,
            maximum,
        });
    }
    Ok(minimum + raw * (maximum - minimum))
}

/// One axis of a scan
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScanDimension {
    /// Total photon flux, ranged by `photon_flux`
    Light,
    /// ATPase activity factor, ranged by `atpase_activity`
    Atpase,
    /// Any other parameter, overridden in the parameter table
    Parameter(String),
}

impl ScanDimension {
    pub fn from_column(column: &str) -> Self {
        match column {
            LIGHT => ScanDimension::Light,
            ATPASE => ScanDimension::Atpase,
            other => ScanDimension::Parameter(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ScanDimension::Light => LIGHT,
            ScanDimension::Atpase => ATPASE,
            ScanDimension::Parameter(name) => name,
        }
    }

    fn range_parameter(&self) -> &str {
        match self {
            ScanDimension::Light => PHOTON_FLUX_PARAMETER,
            ScanDimension::Atpase => ATPASE_PARAMETER,
            ScanDimension::Parameter(name) => name,
        }
    }

    /// Physical range from the `Min`/`Max` columns of the parameter table
    pub fn range(&self, parameters: &ParameterTable) -> Result<(f64, f64), ScanError> {
        parameters
            .range(self.range_parameter())
            .ok_or_else(|| ScanError::MissingRange(self.range_parameter().to_string()))
    }
}

/// Physical values of one scan row
#[derive(Clone, Debug, PartialEq)]
pub struct ScanPoint {
    /// Total photon flux
    pub light: f64,
    /// ATPase activity factor, None leaves the ATPase unconstrained
    pub atpase: Option<f64>,
    /// Parameter values replacing those of the parameter table
    pub overrides: IndexMap<String, f64>,
}

impl ScanPoint {
    /// Map a raw row onto physical values
    ///
    /// Light defaults to the `photon_flux` value of the parameter table when
    /// it is not scanned.
    pub fn from_raw(
        raw: &IndexMap<String, f64>,
        parameters: &ParameterTable,
    ) -> Result<Self, ScanError> {
        let mut point = ScanPoint {
            light: parameters
                .get_optional(PHOTON_FLUX_PARAMETER)
                .unwrap_or(DEFAULT_PHOTON_TOTAL),
            atpase: None,
            overrides: IndexMap::new(),
        };
        for (column, value) in raw {
            let dimension = ScanDimension::from_column(column);
            let value = normalise_within_bounds(*value, dimension.range(parameters)?)?;
            match dimension {
                ScanDimension::Light => point.light = value,
                ScanDimension::Atpase => point.atpase = Some(value),
                ScanDimension::Parameter(name) => {
                    point.overrides.insert(name, value);
                }
            }
        }
        Ok(point)
    }

    /// Values written next to each result row
    pub fn columns(&self) -> IndexMap<String, Option<f64>> {
        let mut columns = IndexMap::with_capacity(self.overrides.len() + 2);
        columns.insert(LIGHT.to_string(), Some(self.light));
        columns.insert(ATPASE.to_string(), self.atpase);
        for (name, value) in &self.overrides {
            columns.insert(name.clone(), Some(*value));
        }
        columns
    }
}

/// Raw table covering every combination of `levels` evenly spaced values per dimension
///
/// The last dimension varies fastest. A single level sits at the middle of the range.
pub fn full_factorial<S: AsRef<str>>(dimensions: &[S], levels: usize) -> IndexedTable {
    let values: Vec<f64> = match levels {
        0 => Vec::new(),
        1 => vec![0.5],
        _ => (0..levels)
            .map(|level| level as f64 / (levels - 1) as f64)
            .collect(),
    };
    let mut rows: Vec<IndexMap<String, f64>> = vec![IndexMap::new()];
    for dimension in dimensions {
        rows = rows
            .into_iter()
            .flat_map(|row| {
                values.iter().map(move |value| {
                    let mut row = row.clone();
                    row.insert(dimension.as_ref().to_string(), *value);
                    row
                })
            })
            .collect();
    }
    if dimensions.is_empty() {
        return IndexedTable::new();
    }
    rows.into_iter().enumerate().collect()
}

/// Raw table of uniformly random rows, reproducible for a given seed
pub fn random_samples<S: AsRef<str>>(dimensions: &[S], rows: usize, seed: u64) -> IndexedTable {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..rows)
        .map(|row| {
            let values = dimensions
                .iter()
                .map(|dimension| (dimension.as_ref().to_string(), rng.gen_range(0. ..=1.)))
                .collect();
            (row, values)
        })
        .collect()
}

/// Constrain a copy of the model for one point and solve it with uniform weights
///
/// The ATPase setting of `conditions` is replaced by that of the point.
pub fn solve_point(
    model: &Model,
    parameters: &ParameterTable,
    point: &ScanPoint,
    conditions: &PhysiologicalConditions,
    tolerance: f64,
) -> Result<SolutionRecord, ScanError> {
    let conditions = PhysiologicalConditions {
        atpase: point.atpase,
        ..*conditions
    };
    let constrained = conditions.constrain_model(
        parameters.with_overrides(&point.overrides),
        model.clone(),
        point.light,
    )?;
    Ok(solve(&constrained, &WeightingVector::new(), tolerance)?)
}

#[derive(Debug)]
pub struct ScanOutcome {
    pub batch: BatchOutcome,
    /// Physical value of every dimension, per row
    pub dimensions: DimensionColumns,
}

/// Solve every row of a raw scan table, resuming from any stored solutions
///
/// All rows are mapped onto physical values before any solve starts, so an out
/// of range value stops the run before work is done.
pub fn run_constraint_scan(
    model: &Model,
    parameters: &ParameterTable,
    raw: &IndexedTable,
    conditions: &PhysiologicalConditions,
    store: &CheckpointStore,
    pool: &WorkerPool,
    tolerance: f64,
) -> Result<ScanOutcome, ScanError> {
    let points = raw
        .iter()
        .map(|(key, row)| Ok((*key, ScanPoint::from_raw(row, parameters)?)))
        .collect::<Result<IndexMap<usize, ScanPoint>, ScanError>>()?;
    info!(
        "Scanning {} points with {} light and starch knockout {}",
        points.len(),
        conditions.light,
        conditions.starch_knockout
    );
    let batch = run_batch(&points, store, pool, |_, point: &ScanPoint| {
        solve_point(model, parameters, point, conditions, tolerance)
    })?;
    let dimensions = points
        .iter()
        .map(|(key, point)| (*key, point.columns()))
        .collect();
    Ok(ScanOutcome { batch, dimensions })
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Raw value {value} is outside [0, 1] or the range [{minimum}, {maximum}] is invalid")]
    OutOfRange {
        value: f64,
        minimum: f64,
        maximum: f64,
    },
    #[error("Parameter {0} has no Min/Max range to scan over")]
    MissingRange(String),
    #[error(transparent)]
    SuperModel(#[from] SuperModelError),
    #[error(transparent)]
    Solving(#[from] SolvingError),
    #[error(transparent)]
    Batch(#[from] BatchError),
}
