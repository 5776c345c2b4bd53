//! Python bindings
//!
//! Only compiled with the `pyo3` feature.

pub mod engine;
pub mod types;
