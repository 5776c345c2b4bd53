//! Checkpoint - Save/Load Generator State
//!
//! Enables pausing a stream and resuming it later, in the same or another
//! process, with bit-identical continuation.
//!
//! # Text format
//!
//! ```text
//! mixmax state, file version 1.0
//! N=17; V[N]={v0, v1, ..., v16}; counter=5; sumtot=1234567;
//! ```
//!
//! # Critical Invariants
//!
//! - **Dimension**: the vector length equals the engine's `N`
//! - **Cursor**: `0 < counter <= N`
//! - **Checksum**: the stored `sumtot` equals the recomputed sum of `V`
//!
//! Every violation is reported as its own [`StateError`] variant.

use crate::core::field::{reduce, sum, MERSENNE_61};
use crate::core::params::MixmaxParams;
use crate::rng::MixmaxEngine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::marker::PhantomData;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// First line of every state record
pub const STATE_HEADER: &str = "mixmax state, file version 1.0";

/// Largest value a state element may hold (lazily reduced representatives)
const MAX_REPRESENTATIVE: u64 = MERSENNE_61 + 7;

/// Errors raised when restoring persisted state
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Unreadable state file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing state header (expected '{}')", STATE_HEADER)]
    MissingHeader,

    #[error("Malformed state record: {0}")]
    Malformed(String),

    #[error("State is for N={found}, engine expects N={expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("State vector has {found} elements, expected {expected}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Counter {counter} out of range (must satisfy 0 < counter <= {n})")]
    CounterOutOfRange { counter: usize, n: usize },

    #[error("State element V[{index}] = {value} is not a field element")]
    ElementOutOfRange { index: usize, value: u64 },

    #[error("Checksum mismatch: stored sumtot {stored}, recomputed {computed}")]
    ChecksumMismatch { stored: u64, computed: u64 },
}

// ============================================================================
// Snapshot
// ============================================================================

/// Complete, unvalidated generator state
///
/// This is the serialized form of a [`MixmaxEngine`]; converting back into an
/// engine runs [`MixmaxSnapshot::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixmaxSnapshot {
    /// Vector size
    pub n: usize,
    /// State vector
    pub v: Vec<u64>,
    /// Index of the next element to be returned
    pub counter: usize,
    /// Checksum of `v`
    pub sumtot: u64,
}

impl MixmaxSnapshot {
    /// Check the snapshot against an engine of size `expected_n`
    pub fn validate(&self, expected_n: usize) -> Result<(), StateError> {
        if self.n != expected_n {
            return Err(StateError::DimensionMismatch {
                expected: expected_n,
                found: self.n,
            });
        }
        if self.v.len() != self.n {
            return Err(StateError::LengthMismatch {
                expected: self.n,
                found: self.v.len(),
            });
        }
        if self.counter == 0 || self.counter > self.n {
            return Err(StateError::CounterOutOfRange {
                counter: self.counter,
                n: self.n,
            });
        }
        if let Some((index, &value)) = self
            .v
            .iter()
            .enumerate()
            .find(|(_, &value)| value > MAX_REPRESENTATIVE)
        {
            return Err(StateError::ElementOutOfRange { index, value });
        }

        let computed = sum(&self.v);
        if self.sumtot > MAX_REPRESENTATIVE || reduce(self.sumtot) != computed {
            return Err(StateError::ChecksumMismatch {
                stored: self.sumtot,
                computed,
            });
        }
        Ok(())
    }

    /// SHA256 of the text form, as lowercase hex
    ///
    /// Equal fingerprints mean identical state records. Records holding
    /// different representatives of the same field elements continue with
    /// the same sequence but fingerprint differently.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl fmt::Display for MixmaxSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", STATE_HEADER)?;
        write!(f, "N={}; V[N]={{", self.n)?;
        for (i, value) in self.v.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        writeln!(f, "}}; counter={}; sumtot={};", self.counter, self.sumtot)
    }
}

impl FromStr for MixmaxSnapshot {
    type Err = StateError;

    /// Parse the text form. Only the syntax is checked here.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut lines = text.lines().skip_while(|line| line.trim().is_empty());
        match lines.next() {
            Some(line) if line.trim() == STATE_HEADER => {}
            _ => return Err(StateError::MissingHeader),
        }
        let body: String = lines.collect::<Vec<_>>().join(" ");

        let (n, rest) = take_field(&body, "N=")?;
        let n = parse_number::<usize>(n, "N")?;

        let rest = expect_prefix(rest, "V[N]={")?;
        let close = rest
            .find('}')
            .ok_or_else(|| StateError::Malformed("unterminated state vector".to_string()))?;
        let v = rest[..close]
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| parse_number::<u64>(item, "vector element"))
            .collect::<Result<Vec<_>, _>>()?;
        let rest = expect_prefix(&rest[close + 1..], ";")?;

        let (counter, rest) = take_field(rest, "counter=")?;
        let counter = parse_number::<usize>(counter, "counter")?;

        let (sumtot, rest) = take_field(rest, "sumtot=")?;
        let sumtot = parse_number::<u64>(sumtot, "sumtot")?;

        if !rest.trim().is_empty() {
            return Err(StateError::Malformed(format!(
                "unexpected trailing text '{}'",
                rest.trim()
            )));
        }

        Ok(MixmaxSnapshot {
            n,
            v,
            counter,
            sumtot,
        })
    }
}

fn expect_prefix<'a>(text: &'a str, prefix: &str) -> Result<&'a str, StateError> {
    text.trim_start()
        .strip_prefix(prefix)
        .ok_or_else(|| StateError::Malformed(format!("expected '{}'", prefix)))
}

/// Split `key=value;` off the front of `text`, returning the value and the rest
fn take_field<'a>(text: &'a str, key: &str) -> Result<(&'a str, &'a str), StateError> {
    let rest = expect_prefix(text, key)?;
    let end = rest
        .find(';')
        .ok_or_else(|| StateError::Malformed(format!("missing ';' after '{}'", key)))?;
    Ok((rest[..end].trim(), &rest[end + 1..]))
}

fn parse_number<T>(text: &str, what: &str) -> Result<T, StateError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    text.parse::<T>()
        .map_err(|e| StateError::Malformed(format!("invalid {} '{}': {}", what, text, e)))
}

// ============================================================================
// Engine save/load
// ============================================================================

impl<P: MixmaxParams> MixmaxEngine<P> {
    /// Capture the complete state
    pub fn snapshot(&self) -> MixmaxSnapshot {
        MixmaxSnapshot {
            n: P::N,
            v: self.v.clone(),
            counter: self.counter,
            sumtot: self.sumtot,
        }
    }

    /// Restore an engine from a validated snapshot
    pub fn from_snapshot(snapshot: MixmaxSnapshot) -> Result<Self, StateError> {
        snapshot.validate(P::N)?;
        Ok(Self {
            v: snapshot.v,
            sumtot: snapshot.sumtot,
            counter: snapshot.counter,
            params: PhantomData,
        })
    }

    /// Text form of the state
    ///
    /// # Example
    /// ```
    /// use mixmax_core_rs::{Mixmax17, MixmaxEngine};
    ///
    /// let mut rng = MixmaxEngine::<Mixmax17>::new(0, 0, 0, 1);
    /// let saved = rng.to_state_string();
    /// let mut restored = MixmaxEngine::<Mixmax17>::from_state_str(&saved).unwrap();
    /// assert_eq!(rng.next_value(), restored.next_value());
    /// ```
    pub fn to_state_string(&self) -> String {
        self.snapshot().to_string()
    }

    /// Parse and validate the text form
    pub fn from_state_str(text: &str) -> Result<Self, StateError> {
        Self::from_snapshot(text.parse()?)
    }

    /// Write the text form to `writer`
    pub fn write_state<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writer.write_all(self.to_state_string().as_bytes())
    }

    /// Read and validate the text form from `reader`
    pub fn read_state<R: Read>(mut reader: R) -> Result<Self, StateError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_state_str(&text)
    }

    /// Save the text form to a file, replacing it if present
    pub fn save_to_file<Q: AsRef<Path>>(&self, path: Q) -> std::io::Result<()> {
        fs::write(path, self.to_state_string())
    }

    /// Load and validate the text form from a file
    pub fn load_from_file<Q: AsRef<Path>>(path: Q) -> Result<Self, StateError> {
        let text = fs::read_to_string(path)?;
        Self::from_state_str(&text)
    }

    /// SHA256 fingerprint of the current state
    pub fn fingerprint(&self) -> String {
        self.snapshot().fingerprint()
    }
}

impl<P: MixmaxParams> Serialize for MixmaxEngine<P> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de, P: MixmaxParams> Deserialize<'de> for MixmaxEngine<P> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snapshot = MixmaxSnapshot::deserialize(deserializer)?;
        Self::from_snapshot(snapshot).map_err(serde::de::Error::custom)
    }
}
