//! MIXMAX Core - Rust Engine
//!
//! Matrix pseudo-random number generators over the field GF(2^61 - 1), with
//! guaranteed non-overlapping streams for parallel simulations.
//!
//! # Architecture
//!
//! - **core**: Field arithmetic and the supported parameter sets
//! - **rng**: The recurrence, skip-ahead tables and the engine itself
//! - **checkpoint**: Saving and restoring generator state
//! - **stream**: Configuration and runtime choice of parameter set
//!
//! # Critical Invariants
//!
//! 1. The checksum always equals the sum of the state vector mod 2^61 - 1
//! 2. Outputs are fully determined by (parameter set, stream identifiers)
//! 3. Distinct identifier tuples never share a subsequence
//! 4. FFI boundary is minimal and safe

// Module declarations
pub mod checkpoint;
pub mod core;
pub mod rng;
pub mod stream;

// Re-exports for convenience
pub use checkpoint::{MixmaxSnapshot, StateError, STATE_HEADER};
pub use crate::core::field;
pub use crate::core::params::{
    ConfigError, Mixmax17, Mixmax240, Mixmax256, Mixmax256Special, MixmaxParams, MixmaxVariant,
    Special,
};
pub use rng::{MixmaxEngine, SkipTable, StreamIds};
pub use stream::{AnyMixmax, StreamConfig, StreamError};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn mixmax_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::engine::PyMixmax>()?;
    Ok(())
}
