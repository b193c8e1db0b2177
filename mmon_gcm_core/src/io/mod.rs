//! Module for reading and writing models and tables
pub mod json;
pub mod tables;
