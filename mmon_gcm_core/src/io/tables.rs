//! CSV tables: parameters, weightings, constraint scans and results
//!
//! Every table has a header row and an index column. Empty cells are treated as
//! missing values.
use std::fs::File;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::metabolic_model::split::net_fluxes;
use crate::solving::SolutionRecord;
use crate::supermodel::parameters::ParameterTable;

/// Row key to (column name to value)
pub type IndexedTable = IndexMap<usize, IndexMap<String, f64>>;

const VALUE_COLUMN: &str = "Value";
const MIN_COLUMN: &str = "Min";
const MAX_COLUMN: &str = "Max";

fn parse_number(cell: &str, row: usize, column: &str) -> Result<Option<f64>, TableError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .map_err(|_| TableError::InvalidNumber {
            row,
            column: column.to_string(),
            value: cell.to_string(),
        })
}

/// Read a parameter table
///
/// The first column holds the parameter name, the `Value` column its value.
/// Optional `Min` and `Max` columns declare scan ranges, any other column is
/// ignored.
pub fn read_parameter_table<P: AsRef<Path>>(path: P) -> Result<ParameterTable, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let value_column = column(VALUE_COLUMN)
        .ok_or_else(|| TableError::MissingColumn(VALUE_COLUMN.to_string()))?;
    let min_column = column(MIN_COLUMN);
    let max_column = column(MAX_COLUMN);

    let mut table = ParameterTable::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let name = record.get(0).unwrap_or_default().trim();
        if name.is_empty() {
            continue;
        }
        let value = parse_number(record.get(value_column).unwrap_or_default(), row, VALUE_COLUMN)?
            .ok_or_else(|| TableError::MissingValue {
                row,
                column: VALUE_COLUMN.to_string(),
            })?;
        table.insert(name, value);
        let bound = |index: Option<usize>, label: &str| match index {
            Some(index) => parse_number(record.get(index).unwrap_or_default(), row, label),
            None => Ok(None),
        };
        if let (Some(minimum), Some(maximum)) = (bound(min_column, MIN_COLUMN)?, bound(max_column, MAX_COLUMN)?) {
            table.set_range(name, minimum, maximum);
        }
    }
    Ok(table)
}

/// Read a table of numbers with an integer index column, e.g. weightings
pub fn read_indexed_table<P: AsRef<Path>>(path: P) -> Result<IndexedTable, TableError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut table = IndexedTable::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let index = record.get(0).unwrap_or_default().trim();
        let key = index.parse::<usize>().map_err(|_| TableError::InvalidIndex {
            row,
            value: index.to_string(),
        })?;
        let mut values = IndexMap::with_capacity(headers.len().saturating_sub(1));
        for (column, cell) in headers.iter().zip(record.iter()).skip(1) {
            if let Some(value) = parse_number(cell, row, column)? {
                values.insert(column.clone(), value);
            }
        }
        if table.insert(key, values).is_some() {
            return Err(TableError::DuplicateIndex(key));
        }
    }
    Ok(table)
}

/// Write a table with an integer index column, columns in order of first appearance
pub fn write_indexed_table<P: AsRef<Path>>(path: P, table: &IndexedTable) -> Result<(), TableError> {
    let columns: IndexSet<&str> = table
        .values()
        .flat_map(|row| row.keys().map(|k| k.as_str()))
        .collect();
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(std::iter::once("").chain(columns.iter().copied()))?;
    for (key, row) in table {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(key.to_string());
        for column in &columns {
            record.push(row.get(*column).map(|v| v.to_string()).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Extra per row columns written between the objective values and the fluxes
pub type DimensionColumns = IndexMap<usize, IndexMap<String, Option<f64>>>;

/// Write aggregated solution records
///
/// Columns are `index, status, objective_value, biological_objective`, then the
/// dimension columns (if any), the net flux of every real reaction, and finally
/// `<id>_min` and `<id>_max` for every reaction of the split model.
pub fn write_results<P: AsRef<Path>>(
    path: P,
    results: &IndexMap<usize, SolutionRecord>,
    dimensions: Option<&DimensionColumns>,
) -> Result<(), TableError> {
    let dimension_columns: IndexSet<&str> = dimensions
        .into_iter()
        .flat_map(|rows| rows.values())
        .flat_map(|row| row.keys().map(|k| k.as_str()))
        .collect();
    let net: IndexMap<usize, IndexMap<String, f64>> = results
        .iter()
        .map(|(key, record)| (*key, net_fluxes(&record.fluxes)))
        .collect();
    let flux_columns: IndexSet<&str> = net
        .values()
        .flat_map(|row| row.keys().map(|k| k.as_str()))
        .collect();
    let range_columns: IndexSet<&str> = results
        .values()
        .flat_map(|record| record.variability.keys().map(|k| k.as_str()))
        .collect();

    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    let mut header: Vec<String> = ["index", "status", "objective_value", "biological_objective"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(dimension_columns.iter().map(|c| c.to_string()));
    header.extend(flux_columns.iter().map(|c| c.to_string()));
    for id in &range_columns {
        header.push(format!("{}_min", id));
        header.push(format!("{}_max", id));
    }
    writer.write_record(&header)?;

    let format = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    for (key, record) in results {
        let mut row: Vec<String> = Vec::with_capacity(header.len());
        row.push(key.to_string());
        row.push(record.status.to_string());
        row.push(format(record.objective_value));
        row.push(format(record.biological_objective));
        let point = dimensions.and_then(|rows| rows.get(key));
        for column in &dimension_columns {
            row.push(format(point.and_then(|p| p.get(*column).copied().flatten())));
        }
        let fluxes = &net[key];
        for column in &flux_columns {
            row.push(format(fluxes.get(*column).copied()));
        }
        for id in &range_columns {
            let range = record.variability.get(*id);
            row.push(format(range.map(|r| r.minimum)));
            row.push(format(range.map(|r| r.maximum)));
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Unable to read or write table: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unable to access table file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Table has no {0} column")]
    MissingColumn(String),
    #[error("Row {row} has no value in column {column}")]
    MissingValue { row: usize, column: String },
    #[error("Row {row}, column {column}: {value} is not a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
    #[error("Row {row}: index {value} is not a non-negative integer")]
    InvalidIndex { row: usize, value: String },
    #[error("Index {0} appears more than once")]
    DuplicateIndex(usize),
}
