//! Fixtures shared by unit tests
use std::path::PathBuf;

use crate::io::tables::read_parameter_table;
use crate::metabolic_model::model::Model;
use crate::supermodel::parameters::ParameterTable;

pub(crate) fn test_data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join(name)
}

/// Two cell types (gc, me), a dark phase 1 and a lit phase 2
pub(crate) fn toy_model() -> Model {
    Model::read_json(test_data("toy_supermodel.json")).unwrap()
}

pub(crate) fn toy_parameters() -> ParameterTable {
    read_parameter_table(test_data("toy_parameters.csv")).unwrap()
}
