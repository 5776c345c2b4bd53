//! Generator parameter sets
//!
//! A MIXMAX generator is fixed by its matrix size `N`, an optional *special*
//! coefficient added into the third element on every step, and a secondary
//! multiplier `2^SPECIALMUL` folded into the running sum. Only four
//! combinations are supported:
//!
//! | Type                 | N   | SPECIAL              | SPECIALMUL | steps per refill |
//! |----------------------|-----|----------------------|------------|------------------|
//! | [`Mixmax17`]         | 17  | 0                    | 36         | 1                |
//! | [`Mixmax240`]        | 240 | 487013230256099140   | 51         | 1                |
//! | [`Mixmax256`]        | 256 | -1                   | 0          | 3                |
//! | [`Mixmax256Special`] | 256 | 487013230256099064   | 0          | 1                |
//!
//! Each parameter set is a zero-sized type implementing [`MixmaxParams`], so
//! the engine dispatches at compile time. [`MixmaxVariant`] is the runtime
//! mirror used when the parameters come from configuration or a state file.

use crate::rng::skip::{SkipTable, STREAM_STRIDE_LOG2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// The special coefficient applied to the saved `V[1]` on every step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Special {
    /// No special entry in the matrix
    None,
    /// `SPECIAL = -1`: the saved value is negated
    Negate,
    /// The saved value is multiplied by this field element
    Multiply(u64),
}

impl Special {
    /// The signed value used in the published parameter tables
    pub const fn as_i64(self) -> i64 {
        match self {
            Special::None => 0,
            Special::Negate => -1,
            Special::Multiply(m) => m as i64,
        }
    }
}

/// Compile-time description of one supported generator.
pub trait MixmaxParams: Copy + Clone + fmt::Debug + Default + Send + Sync + 'static {
    /// Vector size
    const N: usize;
    /// Special matrix entry
    const SPECIAL: Special;
    /// Exponent of the secondary multiplier, 0 when unused
    const SPECIALMUL: u32;
    /// Recurrence steps applied on each buffer refill
    const STEPS_PER_REFILL: usize;
    /// Runtime tag for this parameter set
    const VARIANT: MixmaxVariant;

    /// The process-wide skip table for this parameter set, built on first use.
    fn skip_table() -> &'static SkipTable;
}

macro_rules! mixmax_params {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $n:expr, $special:expr, $specialmul:expr, $steps:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl MixmaxParams for $name {
            const N: usize = $n;
            const SPECIAL: Special = $special;
            const SPECIALMUL: u32 = $specialmul;
            const STEPS_PER_REFILL: usize = $steps;
            const VARIANT: MixmaxVariant = MixmaxVariant::$variant;

            fn skip_table() -> &'static SkipTable {
                static TABLE: OnceLock<SkipTable> = OnceLock::new();
                TABLE.get_or_init(|| SkipTable::build::<$name>(STREAM_STRIDE_LOG2))
            }
        }
    };
}

mixmax_params!(
    /// N = 17, the smallest and fastest generator
    Mixmax17, N17, 17, Special::None, 36, 1
);
mixmax_params!(
    /// N = 240, the recommended generator (highest entropy)
    Mixmax240, N240, 240, Special::Multiply(487_013_230_256_099_140), 51, 1
);
mixmax_params!(
    /// N = 256 with `SPECIAL = -1`; discards two buffers on every refill
    Mixmax256, N256, 256, Special::Negate, 0, 3
);
mixmax_params!(
    /// N = 256 with the multiplicative special entry
    Mixmax256Special, N256Special, 256, Special::Multiply(487_013_230_256_099_064), 0, 1
);

/// Errors raised when a requested generator configuration is not supported
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported vector size N={0} (supported: 17, 240, 256)")]
    UnsupportedDimension(usize),

    #[error("Unsupported special parameter {special} for N={n}")]
    UnsupportedSpecial { n: usize, special: i64 },
}

/// Runtime tag naming one of the supported parameter sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixmaxVariant {
    N17,
    N240,
    N256,
    N256Special,
}

impl MixmaxVariant {
    pub const ALL: [MixmaxVariant; 4] = [
        MixmaxVariant::N17,
        MixmaxVariant::N240,
        MixmaxVariant::N256,
        MixmaxVariant::N256Special,
    ];

    /// Select the parameter set for a vector size and optional special value.
    ///
    /// Without an explicit special value, N=256 resolves to the `SPECIAL = -1`
    /// generator.
    ///
    /// # Example
    /// ```
    /// use mixmax_core_rs::{ConfigError, MixmaxVariant};
    ///
    /// assert_eq!(MixmaxVariant::resolve(240, None), Ok(MixmaxVariant::N240));
    /// assert_eq!(
    ///     MixmaxVariant::resolve(256, Some(487013230256099064)),
    ///     Ok(MixmaxVariant::N256Special)
    /// );
    /// assert_eq!(
    ///     MixmaxVariant::resolve(100, None),
    ///     Err(ConfigError::UnsupportedDimension(100))
    /// );
    /// ```
    pub fn resolve(n: usize, special: Option<i64>) -> Result<Self, ConfigError> {
        let candidates: Vec<MixmaxVariant> = Self::ALL
            .into_iter()
            .filter(|variant| variant.dimension() == n)
            .collect();
        let Some(&default) = candidates.first() else {
            return Err(ConfigError::UnsupportedDimension(n));
        };
        match special {
            None => Ok(default),
            Some(special) => candidates
                .into_iter()
                .find(|variant| variant.special().as_i64() == special)
                .ok_or(ConfigError::UnsupportedSpecial { n, special }),
        }
    }

    pub const fn dimension(self) -> usize {
        match self {
            MixmaxVariant::N17 => Mixmax17::N,
            MixmaxVariant::N240 => Mixmax240::N,
            MixmaxVariant::N256 => Mixmax256::N,
            MixmaxVariant::N256Special => Mixmax256Special::N,
        }
    }

    pub const fn special(self) -> Special {
        match self {
            MixmaxVariant::N17 => Mixmax17::SPECIAL,
            MixmaxVariant::N240 => Mixmax240::SPECIAL,
            MixmaxVariant::N256 => Mixmax256::SPECIAL,
            MixmaxVariant::N256Special => Mixmax256Special::SPECIAL,
        }
    }

    pub const fn special_mul(self) -> u32 {
        match self {
            MixmaxVariant::N17 => Mixmax17::SPECIALMUL,
            MixmaxVariant::N240 => Mixmax240::SPECIALMUL,
            MixmaxVariant::N256 => Mixmax256::SPECIALMUL,
            MixmaxVariant::N256Special => Mixmax256Special::SPECIALMUL,
        }
    }
}

impl fmt::Display for MixmaxVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MIXMAX N={} SPECIAL={} SPECIALMUL={}",
            self.dimension(),
            self.special().as_i64(),
            self.special_mul()
        )
    }
}
