//! Small helpers shared across modules
pub mod non_finite;
