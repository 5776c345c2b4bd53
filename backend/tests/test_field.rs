//! Tests for GF(2^61 - 1) arithmetic
//!
//! Every helper is checked against plain u128 arithmetic on canonical values.

use mixmax_core_rs::field::{
    fold, inverse, mod_add, mod_sub, mul_mod_add, mul_mod_add_split, mul_pow2, reduce, sum,
    MERSENNE_61,
};
use proptest::prelude::*;

const P: u128 = MERSENNE_61 as u128;

fn element() -> impl Strategy<Value = u64> {
    0..MERSENNE_61
}

fn lazy_element() -> impl Strategy<Value = u64> {
    0..=MERSENNE_61 + 7
}

#[test]
fn test_reduce_edges() {
    assert_eq!(reduce(0), 0);
    assert_eq!(reduce(MERSENNE_61), 0);
    assert_eq!(reduce(MERSENNE_61 + 1), 1);
    assert_eq!(reduce(MERSENNE_61 + 7), 7);
    assert_eq!(reduce(u64::MAX), (u64::MAX as u128 % P) as u64);
}

#[test]
fn test_fold_bounds() {
    // fold keeps values within the lazily reduced range
    assert!(fold(u64::MAX) <= MERSENNE_61 + 7);
    assert_eq!(fold(MERSENNE_61 - 1), MERSENNE_61 - 1);
}

#[test]
fn test_inverse_known_values() {
    assert_eq!(inverse(1), 1);
    assert_eq!(inverse(MERSENNE_61 - 1), MERSENNE_61 - 1);
    assert_eq!(reduce(mul_mod_add(0, 2, inverse(2))), 1);
}

#[test]
#[should_panic(expected = "zero has no inverse")]
fn test_inverse_of_zero_panics() {
    inverse(MERSENNE_61);
}

#[test]
fn test_sum_of_slice() {
    assert_eq!(sum(&[]), 0);
    assert_eq!(sum(&[MERSENNE_61 - 1, 1, 5]), 5);
}

proptest! {
    #[test]
    fn prop_mod_add_matches_wide(a in lazy_element(), b in lazy_element()) {
        let expected = ((a as u128 + b as u128) % P) as u64;
        let result = mod_add(a, b);
        prop_assert!(result <= MERSENNE_61 + 7);
        prop_assert_eq!(reduce(result), expected);
    }

    #[test]
    fn prop_mul_mod_add_matches_wide(acc in lazy_element(), x in element(), y in element()) {
        let expected = ((acc as u128 + x as u128 * y as u128) % P) as u64;
        prop_assert_eq!(reduce(mul_mod_add(acc, x, y)), expected);
    }

    #[test]
    fn prop_split_multiply_matches_wide(acc in lazy_element(), x in element(), y in element()) {
        prop_assert_eq!(
            reduce(mul_mod_add_split(acc, x, y)),
            reduce(mul_mod_add(acc, x, y))
        );
    }

    #[test]
    fn prop_mul_pow2_is_rotation(k in element(), shift in 1u32..61) {
        let expected = ((k as u128) << shift) % P;
        prop_assert_eq!(reduce(mul_pow2(k, shift)) as u128, expected);
    }

    #[test]
    fn prop_mod_sub_inverts_add(a in element(), b in element()) {
        prop_assert_eq!(reduce(mod_sub(mod_add(a, b), b)), a);
    }

    #[test]
    fn prop_inverse(a in 1..MERSENNE_61) {
        prop_assert_eq!(reduce(mul_mod_add(0, a, inverse(a))), 1);
    }
}
