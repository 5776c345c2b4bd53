//! Deterministic random number generation
//!
//! MIXMAX generators over GF(2^61 - 1). CRITICAL: all randomness handed to a
//! simulation must come from an engine seeded with a unique identifier tuple.

pub mod mixmax;
pub mod recurrence;
pub mod skip;

pub use mixmax::MixmaxEngine;
pub use skip::{SkipTable, StreamIds, SKIP_ROWS, STREAM_STRIDE_LOG2};
