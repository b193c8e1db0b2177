//! Named scalar parameters used to derive supermodel constraints
use indexmap::IndexMap;

use crate::supermodel::SuperModelError;

/// Parameter name to value, with an optional scan range per parameter
///
/// Tables are never mutated once loaded, per scan point overrides produce a new
/// table through [`ParameterTable::with_overrides`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterTable {
    values: IndexMap<String, f64>,
    ranges: IndexMap<String, (f64, f64)>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from (name, value) pairs
    ///
    /// # Examples
    /// ```rust
    /// use mmon_gcm_core::supermodel::parameters::ParameterTable;
    /// let table = ParameterTable::from_values([("volume_gc", 3000.), ("volume_me", 30000.)]);
    /// assert_eq!(table.get("volume_gc").unwrap(), 3000.);
    /// assert!(table.get("volume_xx").is_err());
    /// ```
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ranges: IndexMap::new(),
        }
    }

    /// Add or replace a value, used while loading a table
    pub fn insert(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    /// Attach a scan range to a parameter
    pub fn set_range(&mut self, name: &str, minimum: f64, maximum: f64) {
        self.ranges.insert(name.to_string(), (minimum, maximum));
    }

    /// Value of a parameter, [`SuperModelError::MissingParameter`] if it is absent
    pub fn get(&self, name: &str) -> Result<f64, SuperModelError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| SuperModelError::MissingParameter(name.to_string()))
    }

    pub fn get_optional(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Scan range of a parameter, if one was declared
    pub fn range(&self, name: &str) -> Option<(f64, f64)> {
        self.ranges.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy of the table with some values replaced (or added)
    pub fn with_overrides(&self, overrides: &IndexMap<String, f64>) -> Self {
        let mut table = self.clone();
        for (name, value) in overrides {
            table.values.insert(name.clone(), *value);
        }
        table
    }
}
