//! The MIXMAX state transition
//!
//! One call to [`iterate`] multiplies the state vector by the MIXMAX matrix
//! without ever materialising it: the new vector is built from running
//! partial sums of the old one. The caller supplies the checksum of the old
//! vector (it becomes the new `V[0]`) and receives the checksum of the new one.
//!
//! # Overflow accounting
//!
//! The running total of the new elements is accumulated in plain wrapping
//! 64-bit arithmetic. Every wrap discards `2^64 ≡ 8 (mod 2^61 - 1)`, so the
//! number of wraps is counted and `wraps << 3` is added back before the final
//! reduction. Replacing this with a per-element modular sum changes the lazily
//! reduced representatives and therefore the output sequence.

use crate::core::field::{fold, mod_add, mul_mod_add, mul_pow2, reduce, MERSENNE_61};
use crate::core::params::{MixmaxParams, Special};

/// Apply the recurrence once to `v` in place and return the new checksum.
///
/// `sumtot` must be congruent to the sum of the elements of `v`.
pub fn iterate<P: MixmaxParams>(v: &mut [u64], sumtot: u64) -> u64 {
    debug_assert_eq!(v.len(), P::N, "state vector has the wrong length");

    let saved = v[1];
    v[0] = sumtot;
    let mut value = sumtot;
    let mut partial = 0u64;
    let mut total = sumtot;
    let mut wraps = 0u64;

    for elem in v.iter_mut().skip(1) {
        if P::SPECIALMUL != 0 {
            let shifted = mul_pow2(partial, P::SPECIALMUL);
            partial = mod_add(partial, *elem);
            value = fold(value + partial + shifted);
        } else {
            partial = mod_add(partial, *elem);
            value = mod_add(value, partial);
        }
        *elem = value;
        wraps += accumulate(&mut total, value);
    }

    if let Some(extra) = special_term::<P>(saved) {
        v[2] = mod_add(v[2], extra);
        wraps += accumulate(&mut total, extra);
    }

    fold(fold(total) + (wraps << 3))
}

/// Apply the recurrence `steps` times.
pub fn iterate_n<P: MixmaxParams>(v: &mut [u64], mut sumtot: u64, steps: usize) -> u64 {
    for _ in 0..steps {
        sumtot = iterate::<P>(v, sumtot);
    }
    sumtot
}

#[inline(always)]
fn accumulate(total: &mut u64, value: u64) -> u64 {
    let (sum, wrapped) = total.overflowing_add(value);
    *total = sum;
    wrapped as u64
}

/// The contribution of the special matrix entry, if the variant has one.
#[inline]
fn special_term<P: MixmaxParams>(saved: u64) -> Option<u64> {
    match P::SPECIAL {
        Special::None => None,
        Special::Negate => Some(MERSENNE_61 - reduce(saved)),
        Special::Multiply(m) => Some(mul_mod_add(0, m, reduce(saved))),
    }
}
