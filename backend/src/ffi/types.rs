//! Type conversion utilities for FFI boundary
//!
//! Converts Python dictionaries into [`StreamConfig`] values.

use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::rng::StreamIds;
use crate::stream::StreamConfig;

/// Extract an optional field from a Python dict.
///
/// # Returns
/// `Some(value)` if field exists, `None` if missing
///
/// # Errors
/// Returns error only if type conversion fails (not if field is missing)
fn extract_optional<T>(dict: &Bound<'_, PyDict>, key: &str) -> PyResult<Option<T>>
where
    for<'py> T: FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) if !value.is_none() => Ok(Some(value.extract().map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                "Field '{}' has the wrong type: {}",
                key, e
            ))
        })?)),
        _ => Ok(None),
    }
}

/// Build a stream configuration from a dict such as
/// `{"n": 240, "run_id": 3, "stream_id": 7}`.
///
/// Missing fields take the same defaults as the JSON form.
pub fn parse_stream_config(dict: &Bound<'_, PyDict>) -> PyResult<StreamConfig> {
    let defaults = StreamIds::default();
    let config = StreamConfig {
        n: extract_optional(dict, "n")?.unwrap_or(StreamConfig::default().n),
        special: extract_optional(dict, "special")?,
        ids: StreamIds::new(
            extract_optional(dict, "cluster_id")?.unwrap_or(defaults.cluster_id),
            extract_optional(dict, "machine_id")?.unwrap_or(defaults.machine_id),
            extract_optional(dict, "run_id")?.unwrap_or(defaults.run_id),
            extract_optional(dict, "stream_id")?.unwrap_or(defaults.stream_id),
        ),
    };

    config
        .variant()
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;
    Ok(config)
}
