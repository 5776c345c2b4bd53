//! Skip-ahead Tests
//!
//! Critical invariants tested:
//! - A jump by row r equals 2^r literal recurrence steps (unit stride tables)
//! - Row r+1 equals applying row r twice
//! - Stream derivation composes identifier bits additively
//! - Production tables are built once and agree with the stride constant

use mixmax_core_rs::field::{reduce, sum};
use mixmax_core_rs::rng::recurrence::iterate_n;
use mixmax_core_rs::rng::skip::{characteristic_polynomial, SKIP_ROWS, STREAM_STRIDE_LOG2};
use mixmax_core_rs::{
    Mixmax17, Mixmax240, Mixmax256, Mixmax256Special, MixmaxEngine, MixmaxParams, SkipTable,
    StreamIds,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn unit_vector(n: usize) -> Vec<u64> {
    let mut v = vec![0u64; n];
    v[0] = 1;
    v
}

fn canonical(v: &[u64]) -> Vec<u64> {
    v.iter().map(|&x| reduce(x)).collect()
}

/// A state that is not a unit vector
fn scrambled<P: MixmaxParams>() -> (Vec<u64>, u64) {
    let mut v = unit_vector(P::N);
    let sumtot = iterate_n::<P>(&mut v, 1, 7);
    (v, sumtot)
}

fn check_rows_match_iteration<P: MixmaxParams>(rows: usize) {
    let table = SkipTable::build::<P>(0);
    for r in 0..rows {
        let (mut jumped, sumtot) = scrambled::<P>();
        let jumped_sum = table.jump::<P>(r, &mut jumped, sumtot);

        let (mut literal, sumtot) = scrambled::<P>();
        let literal_sum = iterate_n::<P>(&mut literal, sumtot, 1 << r);

        assert_eq!(canonical(&jumped), canonical(&literal), "N={} row {}", P::N, r);
        assert_eq!(reduce(jumped_sum), reduce(literal_sum));
        assert_eq!(reduce(jumped_sum), sum(&jumped));
    }
}

// ============================================================================
// Unit-stride tables against literal iteration
// ============================================================================

#[test]
fn test_rows_match_iteration_n17() {
    check_rows_match_iteration::<Mixmax17>(10);
}

#[test]
fn test_rows_match_iteration_n240() {
    check_rows_match_iteration::<Mixmax240>(6);
}

#[test]
fn test_rows_match_iteration_n256() {
    check_rows_match_iteration::<Mixmax256>(6);
}

#[test]
fn test_rows_match_iteration_n256_special() {
    check_rows_match_iteration::<Mixmax256Special>(6);
}

#[test]
fn test_characteristic_polynomials_have_full_degree() {
    fn check<P: MixmaxParams>() {
        let chi = characteristic_polynomial::<P>();
        assert_eq!(chi.len(), P::N + 1);
        assert_eq!(chi[P::N], 1, "characteristic polynomial must be monic");
    }
    check::<Mixmax17>();
    check::<Mixmax240>();
    check::<Mixmax256>();
    check::<Mixmax256Special>();
}

// ============================================================================
// Production tables
// ============================================================================

#[test]
fn test_production_table_shape() {
    let table = Mixmax17::skip_table();
    assert_eq!(table.dimension(), 17);
    assert_eq!(table.stride_log2(), STREAM_STRIDE_LOG2);
    assert_eq!(table.row(SKIP_ROWS - 1).len(), 17);
    // built once per process
    assert!(std::ptr::eq(table, Mixmax17::skip_table()));
}

#[test]
fn test_row_doubling() {
    let table = Mixmax17::skip_table();
    for r in [0, 1, 31, 32, 100] {
        let (mut twice, sumtot) = scrambled::<Mixmax17>();
        let s = table.jump::<Mixmax17>(r, &mut twice, sumtot);
        table.jump::<Mixmax17>(r, &mut twice, s);

        let (mut once, sumtot) = scrambled::<Mixmax17>();
        table.jump::<Mixmax17>(r + 1, &mut once, sumtot);

        assert_eq!(canonical(&twice), canonical(&once), "row {}", r);
    }
}

#[test]
#[should_panic(expected = "skip table row 128 out of range")]
fn test_row_out_of_range() {
    Mixmax17::skip_table().row(SKIP_ROWS);
}

// ============================================================================
// Stream derivation
// ============================================================================

#[test]
fn test_identifier_bits_compose() {
    // stream 3 = jump(row 0) then jump(row 1)
    let table = Mixmax17::skip_table();
    let mut manual = unit_vector(17);
    let s = table.jump::<Mixmax17>(0, &mut manual, 1);
    table.jump::<Mixmax17>(1, &mut manual, s);

    let derived = MixmaxEngine::<Mixmax17>::new(0, 0, 0, 3);
    assert_eq!(canonical(derived.state()), canonical(&manual));
}

#[test]
fn test_levels_use_distinct_rows() {
    // run_id bit 0 is row 32
    let table = Mixmax17::skip_table();
    let mut manual = unit_vector(17);
    table.jump::<Mixmax17>(32, &mut manual, 1);

    let derived = MixmaxEngine::<Mixmax17>::new(0, 0, 1, 0);
    assert_eq!(canonical(derived.state()), canonical(&manual));
}

#[test]
fn test_zero_ids_leave_mother_unchanged() {
    let rng = MixmaxEngine::<Mixmax17>::new(0, 0, 0, 0);
    assert_eq!(canonical(rng.state()), unit_vector(17));
    assert_eq!(rng.counter(), 1);
}

#[test]
fn test_from_mother_matches_unit_vector_seeding() {
    let mother = MixmaxEngine::<Mixmax240>::from_unit_vector(0);
    let ids = StreamIds::new(0, 3, 0, 11);
    let a = MixmaxEngine::from_mother(&mother, ids);
    let b = MixmaxEngine::<Mixmax240>::from_ids(ids);
    assert_eq!(canonical(a.state()), canonical(b.state()));
    assert_eq!(reduce(a.sumtot()), reduce(b.sumtot()));
}

#[test]
fn test_from_mother_other_state() {
    let mut mother = MixmaxEngine::<Mixmax17>::from_unit_vector(3);
    mother.next_value();
    let a = MixmaxEngine::from_mother(&mother, StreamIds::new(0, 0, 0, 1));
    let b = MixmaxEngine::from_mother(&mother, StreamIds::new(0, 0, 0, 2));
    assert_ne!(a.state(), b.state());
    assert_eq!(reduce(a.sumtot()), sum(a.state()));
}

#[test]
fn test_seed_unique_stream_resets_cursor() {
    let mut rng = MixmaxEngine::<Mixmax17>::new(0, 0, 0, 1);
    for _ in 0..5 {
        rng.next_value();
    }
    rng.seed_unique_stream(StreamIds::new(0, 0, 0, 1));
    assert_eq!(rng, MixmaxEngine::<Mixmax17>::new(0, 0, 0, 1));
}
