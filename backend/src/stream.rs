//! Stream configuration and runtime dispatch
//!
//! Simulations usually pick the generator from a configuration file rather
//! than at compile time. [`StreamConfig`] is that configuration, and
//! [`AnyMixmax`] wraps the four statically-typed engines behind one enum so
//! callers can hold whichever variant the configuration selected.
//!
//! # Example
//! ```
//! use mixmax_core_rs::{AnyMixmax, StreamConfig};
//!
//! let config = StreamConfig::from_json(r#"{"n": 17, "run_id": 3, "stream_id": 8}"#).unwrap();
//! let mut rng = AnyMixmax::from_config(&config).unwrap();
//! assert_eq!(rng.dimension(), 17);
//! let u = rng.next_float();
//! assert!(u > 0.0 && u <= 1.0);
//! ```

use crate::checkpoint::{MixmaxSnapshot, StateError};
use crate::core::params::{
    ConfigError, Mixmax17, Mixmax240, Mixmax256, Mixmax256Special, MixmaxVariant,
};
use crate::rng::{MixmaxEngine, StreamIds};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors raised while building a stream from configuration
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Invalid stream configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Which generator to run and which stream of it to draw from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Vector size (17, 240 or 256)
    #[serde(default = "default_dimension")]
    pub n: usize,

    /// Special matrix entry; only needed to pick between the N=256 variants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special: Option<i64>,

    /// Stream identifiers
    #[serde(flatten)]
    pub ids: StreamIds,
}

fn default_dimension() -> usize {
    240
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            n: default_dimension(),
            special: None,
            ids: StreamIds::default(),
        }
    }
}

impl StreamConfig {
    /// Parse a configuration from JSON and check that it names a supported
    /// generator.
    pub fn from_json(json: &str) -> Result<Self, StreamError> {
        let config: StreamConfig = serde_json::from_str(json)?;
        config.variant()?;
        Ok(config)
    }

    /// The parameter set this configuration selects
    pub fn variant(&self) -> Result<MixmaxVariant, ConfigError> {
        MixmaxVariant::resolve(self.n, self.special)
    }

    /// SHA256 of the JSON form, as lowercase hex. Equal configurations hash
    /// equal regardless of how the source JSON was laid out.
    pub fn config_hash(&self) -> Result<String, StreamError> {
        let json = serde_json::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// A MIXMAX engine of any supported parameter set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", content = "state", rename_all = "snake_case")]
pub enum AnyMixmax {
    N17(MixmaxEngine<Mixmax17>),
    N240(MixmaxEngine<Mixmax240>),
    N256(MixmaxEngine<Mixmax256>),
    N256Special(MixmaxEngine<Mixmax256Special>),
}

macro_rules! dispatch {
    ($self:expr, $engine:ident => $body:expr) => {
        match $self {
            AnyMixmax::N17($engine) => $body,
            AnyMixmax::N240($engine) => $body,
            AnyMixmax::N256($engine) => $body,
            AnyMixmax::N256Special($engine) => $body,
        }
    };
}

macro_rules! dispatch_wrap {
    ($self:expr, $engine:ident => $body:expr) => {
        match $self {
            AnyMixmax::N17($engine) => AnyMixmax::N17($body),
            AnyMixmax::N240($engine) => AnyMixmax::N240($body),
            AnyMixmax::N256($engine) => AnyMixmax::N256($body),
            AnyMixmax::N256Special($engine) => AnyMixmax::N256Special($body),
        }
    };
}

impl AnyMixmax {
    /// Seed stream `ids` of the given variant
    pub fn new(variant: MixmaxVariant, ids: StreamIds) -> Self {
        match variant {
            MixmaxVariant::N17 => AnyMixmax::N17(MixmaxEngine::from_ids(ids)),
            MixmaxVariant::N240 => AnyMixmax::N240(MixmaxEngine::from_ids(ids)),
            MixmaxVariant::N256 => AnyMixmax::N256(MixmaxEngine::from_ids(ids)),
            MixmaxVariant::N256Special => {
                AnyMixmax::N256Special(MixmaxEngine::from_ids(ids))
            }
        }
    }

    /// Build the engine a configuration describes
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the configuration names an unsupported
    /// vector size or special parameter.
    pub fn from_config(config: &StreamConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.variant()?, config.ids))
    }

    /// Restore a saved state for the given variant
    pub fn from_snapshot(
        variant: MixmaxVariant,
        snapshot: MixmaxSnapshot,
    ) -> Result<Self, StateError> {
        Ok(match variant {
            MixmaxVariant::N17 => AnyMixmax::N17(MixmaxEngine::from_snapshot(snapshot)?),
            MixmaxVariant::N240 => AnyMixmax::N240(MixmaxEngine::from_snapshot(snapshot)?),
            MixmaxVariant::N256 => AnyMixmax::N256(MixmaxEngine::from_snapshot(snapshot)?),
            MixmaxVariant::N256Special => {
                AnyMixmax::N256Special(MixmaxEngine::from_snapshot(snapshot)?)
            }
        })
    }

    /// Parse and validate a saved text state for the given variant
    pub fn from_state_str(variant: MixmaxVariant, text: &str) -> Result<Self, StateError> {
        Self::from_snapshot(variant, text.parse()?)
    }

    pub fn variant(&self) -> MixmaxVariant {
        dispatch!(self, e => e.variant())
    }

    pub fn dimension(&self) -> usize {
        dispatch!(self, e => e.dimension())
    }

    pub fn next_value(&mut self) -> u64 {
        dispatch!(self, e => e.next_value())
    }

    pub fn next_float(&mut self) -> f64 {
        dispatch!(self, e => e.next_float())
    }

    pub fn fill_floats(&mut self, out: &mut [f64]) {
        dispatch!(self, e => e.fill_floats(out))
    }

    /// See [`MixmaxEngine::branch`]
    pub fn branch(&mut self) -> Self {
        dispatch_wrap!(self, e => e.branch())
    }

    /// See [`MixmaxEngine::branch_daughter`]
    pub fn branch_daughter(&mut self, b: u32) {
        dispatch!(self, e => e.branch_daughter(b))
    }

    pub fn branch_mother(&mut self) {
        dispatch!(self, e => e.branch_mother())
    }

    pub fn snapshot(&self) -> MixmaxSnapshot {
        dispatch!(self, e => e.snapshot())
    }

    pub fn to_state_string(&self) -> String {
        dispatch!(self, e => e.to_state_string())
    }

    pub fn fingerprint(&self) -> String {
        dispatch!(self, e => e.fingerprint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = StreamConfig::from_json("{}").unwrap();
        assert_eq!(config, StreamConfig::default());
        assert_eq!(config.n, 240);
        assert_eq!(config.ids, StreamIds::new(0, 0, 0, 1));
    }

    #[test]
    fn test_config_rejects_unsupported_dimension() {
        let err = StreamConfig::from_json(r#"{"n": 64}"#).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Config(ConfigError::UnsupportedDimension(64))
        ));
    }

    #[test]
    fn test_config_rejects_bad_json() {
        let err = StreamConfig::from_json(r#"{"n": "many"}"#).unwrap_err();
        assert!(matches!(err, StreamError::Parse(_)));
    }

    #[test]
    fn test_from_config_matches_typed_engine() {
        let config = StreamConfig {
            n: 17,
            special: None,
            ids: StreamIds::new(1, 2, 3, 4),
        };
        let mut any = AnyMixmax::from_config(&config).unwrap();
        let mut typed = MixmaxEngine::<Mixmax17>::new(1, 2, 3, 4);
        for _ in 0..50 {
            assert_eq!(any.next_value(), typed.next_value());
        }
    }

    #[test]
    fn test_config_hash_stable() {
        let a = StreamConfig::default();
        let b = StreamConfig::default();
        let mut c = StreamConfig::default();
        c.ids.run_id = 9;
        assert_eq!(a.config_hash().unwrap(), b.config_hash().unwrap());
        assert_ne!(a.config_hash().unwrap(), c.config_hash().unwrap());
    }

    #[test]
    fn test_config_hash_ignores_source_layout() {
        let a = StreamConfig::from_json(r#"{"n": 17, "stream_id": 3}"#).unwrap();
        let b = StreamConfig::from_json(
            r#"{ "stream_id": 3, "run_id": 0,
                 "n": 17 }"#,
        )
        .unwrap();
        assert_eq!(a.config_hash().unwrap(), b.config_hash().unwrap());

        let special = StreamConfig::from_json(r#"{"n": 256, "special": -1}"#).unwrap();
        let plain = StreamConfig::from_json(r#"{"n": 256}"#).unwrap();
        assert_ne!(special.config_hash().unwrap(), plain.config_hash().unwrap());
    }

    #[test]
    fn test_any_branch_keeps_variant() {
        let mut any = AnyMixmax::new(MixmaxVariant::N17, StreamIds::default());
        let daughter = any.branch();
        assert_eq!(daughter.variant(), MixmaxVariant::N17);
        assert_ne!(daughter.snapshot(), any.snapshot());
    }

    #[test]
    fn test_any_serde_roundtrip() {
        let mut any = AnyMixmax::new(MixmaxVariant::N17, StreamIds::new(0, 0, 1, 1));
        any.next_value();
        let json = serde_json::to_string(&any).unwrap();
        let mut restored: AnyMixmax = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, any);
        assert_eq!(restored.next_value(), any.next_value());
    }
}
