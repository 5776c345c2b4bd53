//! Arithmetic in the Galois field GF(2^61 - 1)
//!
//! Every element of the generator state lives in this field. The modulus is a
//! Mersenne prime, so reduction never divides: any bit at position 61 or
//! above is worth the same as that bit shifted down by 61, and is folded back
//! in by addition.
//!
//! # Representatives
//!
//! The folding helpers return *lazily reduced* values: congruent to the exact
//! result and below 2^61 + 8, but not necessarily below the modulus. The
//! recurrence relies on this to stay cheap. Use [`reduce`] wherever a
//! canonical value in `[0, MERSENNE_61)` is needed (outputs, comparisons).

/// Number of bits in the field modulus
pub const BITS: u32 = 61;

/// The Mersenne prime 2^61 - 1
pub const MERSENNE_61: u64 = (1u64 << BITS) - 1;

/// 1 / (2^61 - 1), used to turn field elements into doubles
pub const INV_MERSENNE_61: f64 = 0.43368086899420177360298E-18;

const MASK32: u64 = 0xFFFF_FFFF;

/// Fold bits 61..63 back into the low 61 bits.
///
/// The result is congruent to `k` and at most `MERSENNE_61 + 7`.
#[inline(always)]
pub fn fold(k: u64) -> u64 {
    (k & MERSENNE_61) + (k >> BITS)
}

/// Map any representative to its canonical value in `[0, MERSENNE_61)`.
///
/// # Example
/// ```
/// use mixmax_core_rs::core::field::{reduce, MERSENNE_61};
///
/// assert_eq!(reduce(MERSENNE_61), 0);
/// assert_eq!(reduce(MERSENNE_61 + 5), 5);
/// assert_eq!(reduce(42), 42);
/// ```
#[inline]
pub fn reduce(k: u64) -> u64 {
    let k = fold(k);
    if k >= MERSENNE_61 {
        k - MERSENNE_61
    } else {
        k
    }
}

/// `(a + b) mod (2^61 - 1)`, lazily reduced.
///
/// # Example
/// ```
/// use mixmax_core_rs::core::field::{mod_add, reduce, MERSENNE_61};
///
/// assert_eq!(mod_add(2, 3), 5);
/// assert_eq!(reduce(mod_add(MERSENNE_61 - 1, 2)), 1);
/// ```
#[inline(always)]
pub fn mod_add(a: u64, b: u64) -> u64 {
    debug_assert!(
        a <= MERSENNE_61 + 7 && b <= MERSENNE_61 + 7,
        "mod_add operand outside the field: {a}, {b}"
    );
    fold(a + b)
}

/// `(acc + x * y) mod (2^61 - 1)` using a native 128-bit product.
///
/// The 122-bit product is split at bit 64: the high half is worth `8` per
/// unit (`2^64 ≡ 8`), bits 61..63 of the low half are worth `1` per unit, and
/// a final fold absorbs the carry from that sum.
///
/// # Example
/// ```
/// use mixmax_core_rs::core::field::{mul_mod_add, reduce, MERSENNE_61};
///
/// // (p - 1)^2 ≡ 1
/// assert_eq!(reduce(mul_mod_add(0, MERSENNE_61 - 1, MERSENNE_61 - 1)), 1);
/// assert_eq!(reduce(mul_mod_add(10, 3, 4)), 22);
/// ```
#[inline(always)]
pub fn mul_mod_add(acc: u64, x: u64, y: u64) -> u64 {
    debug_assert!(
        x < MERSENNE_61 && y < MERSENNE_61,
        "mul_mod_add factor outside the field: {x}, {y}"
    );
    debug_assert!(acc <= MERSENNE_61 + 7, "mul_mod_add accumulator too large: {acc}");
    let wide = (x as u128) * (y as u128) + acc as u128;
    let lo = wide as u64;
    let hi = (wide >> 64) as u64;
    fold((lo & MERSENNE_61) + (hi << 3) + (lo >> BITS))
}

/// `(acc + x * y) mod (2^61 - 1)` using only 64-bit multiplies.
///
/// Splits both factors into 32-bit halves and assembles the bits of the
/// product above position 61 by hand. Kept alongside [`mul_mod_add`] so the
/// two can be checked against each other; see `tests/test_field.rs`.
#[inline]
pub fn mul_mod_add_split(acc: u64, x: u64, y: u64) -> u64 {
    debug_assert!(
        x < MERSENNE_61 && y < MERSENNE_61,
        "mul_mod_add_split factor outside the field: {x}, {y}"
    );
    debug_assert!(acc <= MERSENNE_61 + 7, "mul_mod_add_split accumulator too large: {acc}");
    let xh = x >> 32;
    let xl = x & MASK32;
    let yh = y >> 32;
    let yl = y & MASK32;

    // low 61 bits of the product, plus everything above bit 61 shifted down
    let mut o = x.wrapping_mul(y) & MERSENNE_61;
    o += (xh * yh) << 3;
    o += (yh * xl + yl * xh + ((yl * xl) >> 32)) >> 29;
    o += acc;
    fold(o)
}

/// Multiply by `2^shift` for `0 < shift < 61`: a rotation within 61 bits.
///
/// This is the cheap Galois-style doubling transform used by variants with a
/// nonzero secondary multiplier.
#[inline(always)]
pub fn mul_pow2(k: u64, shift: u32) -> u64 {
    debug_assert!(shift > 0 && shift < BITS);
    ((k << shift) & MERSENNE_61) | (k >> (BITS - shift))
}

/// `(a - b) mod (2^61 - 1)` for canonical or lazily reduced inputs.
#[inline]
pub fn mod_sub(a: u64, b: u64) -> u64 {
    mod_add(reduce(a), MERSENNE_61 - reduce(b))
}

/// Canonical sum of a slice of field elements.
pub fn sum(values: &[u64]) -> u64 {
    reduce(values.iter().fold(0, |acc, &v| mod_add(acc, reduce(v))))
}

/// Multiplicative inverse by Fermat's little theorem. `a` must be nonzero.
pub fn inverse(a: u64) -> u64 {
    let a = reduce(a);
    assert!(a != 0, "zero has no inverse in GF(2^61 - 1)");
    let mut result = 1u64;
    let mut base = a;
    let mut exp = MERSENNE_61 - 2;
    while exp > 0 {
        if exp & 1 == 1 {
            result = reduce(mul_mod_add(0, result, base));
        }
        base = reduce(mul_mod_add(0, base, base));
        exp >>= 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_carries_bit_61() {
        assert_eq!(fold(1u64 << 61), 1);
        assert_eq!(fold(MERSENNE_61), MERSENNE_61);
        assert_eq!(reduce(MERSENNE_61), 0);
    }

    #[test]
    fn test_mod_add_wraps_at_modulus() {
        assert_eq!(reduce(mod_add(MERSENNE_61 - 1, 1)), 0);
        assert_eq!(reduce(mod_add(MERSENNE_61 - 1, MERSENNE_61 - 1)), MERSENNE_61 - 2);
    }

    #[test]
    fn test_mul_mod_add_small_values() {
        assert_eq!(mul_mod_add(0, 6, 7), 42);
        assert_eq!(mul_mod_add(1, 6, 7), 43);
        assert_eq!(mul_mod_add_split(1, 6, 7), 43);
    }

    #[test]
    fn test_mul_pow2_matches_multiplication() {
        let k = 0x1234_5678_9abc_def0 & MERSENNE_61;
        for shift in [1, 36, 51, 60] {
            let expected = reduce(mul_mod_add(0, reduce(k), 1u64 << shift));
            assert_eq!(reduce(mul_pow2(k, shift)), expected, "shift {shift}");
        }
    }

    #[test]
    fn test_mod_sub() {
        assert_eq!(reduce(mod_sub(5, 7)), MERSENNE_61 - 2);
        assert_eq!(reduce(mod_sub(7, 5)), 2);
        assert_eq!(reduce(mod_sub(3, 3)), 0);
    }

    #[test]
    fn test_inverse() {
        for a in [1u64, 2, 3, 12345, MERSENNE_61 - 1] {
            assert_eq!(reduce(mul_mod_add(0, a, inverse(a))), 1, "a = {a}");
        }
    }

    #[test]
    #[should_panic(expected = "zero has no inverse")]
    fn test_inverse_of_zero_panics() {
        inverse(MERSENNE_61);
    }
}
