//! Field arithmetic and generator parameter sets

pub mod field;
pub mod params;
