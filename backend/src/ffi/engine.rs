//! PyO3 wrapper for the MIXMAX engine
//!
//! This module provides the Python interface to [`AnyMixmax`].

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::types::parse_stream_config;
use crate::core::params::MixmaxVariant;
use crate::rng::StreamIds;
use crate::stream::AnyMixmax;

/// Python wrapper for a MIXMAX stream
///
/// # Example (from Python)
///
/// ```python
/// from mixmax_core_rs import Mixmax
///
/// rng = Mixmax(n=240, run_id=3, stream_id=7)
/// u = rng.next_float()
/// saved = rng.to_state_string()
/// same = Mixmax.from_state_string(saved, n=240)
/// ```
#[pyclass(name = "Mixmax")]
pub struct PyMixmax {
    inner: AnyMixmax,
}

fn resolve(n: usize, special: Option<i64>) -> PyResult<MixmaxVariant> {
    MixmaxVariant::resolve(n, special).map_err(|e| PyValueError::new_err(e.to_string()))
}

#[pymethods]
impl PyMixmax {
    /// Create the generator for one stream
    ///
    /// # Errors
    ///
    /// Raises ValueError if `n`/`special` name an unsupported generator
    #[new]
    #[pyo3(signature = (n=240, cluster_id=0, machine_id=0, run_id=0, stream_id=1, special=None))]
    fn new(
        n: usize,
        cluster_id: u32,
        machine_id: u32,
        run_id: u32,
        stream_id: u32,
        special: Option<i64>,
    ) -> PyResult<Self> {
        let variant = resolve(n, special)?;
        let ids = StreamIds::new(cluster_id, machine_id, run_id, stream_id);
        Ok(PyMixmax {
            inner: AnyMixmax::new(variant, ids),
        })
    }

    /// Create a generator from a configuration dict
    #[staticmethod]
    fn from_config(config: &Bound<'_, PyDict>) -> PyResult<Self> {
        let config = parse_stream_config(config)?;
        let inner =
            AnyMixmax::from_config(&config).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(PyMixmax { inner })
    }

    /// Restore a generator from its text state
    ///
    /// # Errors
    ///
    /// Raises RuntimeError if the state is malformed or inconsistent
    #[staticmethod]
    #[pyo3(signature = (text, n=240, special=None))]
    fn from_state_string(text: &str, n: usize, special: Option<i64>) -> PyResult<Self> {
        let variant = resolve(n, special)?;
        let inner = AnyMixmax::from_state_str(variant, text).map_err(|e| {
            PyRuntimeError::new_err(format!("Failed to restore state: {}", e))
        })?;
        Ok(PyMixmax { inner })
    }

    /// Next raw output in `[0, 2^61 - 2]`
    fn next_value(&mut self) -> u64 {
        self.inner.next_value()
    }

    /// Next output in `(0, 1]`
    fn next_float(&mut self) -> f64 {
        self.inner.next_float()
    }

    /// Draw `count` floats at once
    fn floats(&mut self, count: usize) -> Vec<f64> {
        let mut out = vec![0.0; count];
        self.inner.fill_floats(&mut out);
        out
    }

    /// Split off a daughter stream; this generator is perturbed as the mother
    fn branch(&mut self) -> Self {
        PyMixmax {
            inner: self.inner.branch(),
        }
    }

    /// Perturb this generator into a daughter stream at distance `b`
    fn branch_daughter(&mut self, b: u32) -> PyResult<()> {
        if !(5..=60).contains(&b) {
            return Err(PyValueError::new_err(format!(
                "branch distance b must be in [5, 60], got {}",
                b
            )));
        }
        self.inner.branch_daughter(b);
        Ok(())
    }

    fn branch_mother(&mut self) {
        self.inner.branch_mother();
    }

    fn to_state_string(&self) -> String {
        self.inner.to_state_string()
    }

    /// SHA256 of the current state
    fn fingerprint(&self) -> String {
        self.inner.fingerprint()
    }

    #[getter]
    fn n(&self) -> usize {
        self.inner.dimension()
    }

    fn __repr__(&self) -> String {
        format!("Mixmax({})", self.inner.variant())
    }
}
