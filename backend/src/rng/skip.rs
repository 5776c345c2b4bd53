//! Skip-ahead tables and unique-stream seeding
//!
//! Jumping a MIXMAX state forward by `k` steps is multiplication by `A^k`,
//! where `A` is the (never materialised) recurrence matrix. By Cayley–Hamilton,
//! `A^k = q(A)` for `q(x) = x^k mod χ(x)`, with `χ` the characteristic
//! polynomial of `A`. `q` has `N` coefficients, so a jump of any length costs
//! `N` recurrence steps plus `N²` multiply-accumulates.
//!
//! A [`SkipTable`] holds 128 such polynomials. Row `r` jumps by `2^r` strides
//! of `2^stride_log2` steps each. The production tables use
//! [`STREAM_STRIDE_LOG2`], so two streams whose identifiers differ in any bit
//! start at least `2^336 > 10^101` steps apart and cannot overlap for any
//! feasible number of draws.
//!
//! Tables are derived, not stored: `χ` is recovered from `2N` iterates of the
//! unit vector with Berlekamp–Massey, then each row is obtained by squaring the
//! previous one modulo `χ`.

use crate::core::field::{inverse, mod_sub, mul_mod_add, reduce, sum, MERSENNE_61};
use crate::core::params::MixmaxParams;
use crate::rng::recurrence::iterate;
use serde::{Deserialize, Serialize};

/// Number of rows in a skip table: 32 identifier bits on each of 4 levels
pub const SKIP_ROWS: usize = 128;

/// log2 of the number of recurrence steps between adjacent streams
pub const STREAM_STRIDE_LOG2: u32 = 336;

/// The four-level identifier of a stream, least significant level first in
/// [`StreamIds::levels`].
///
/// Missing fields deserialize to the [`Default`] tuple `(0, 0, 0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamIds {
    pub cluster_id: u32,
    pub machine_id: u32,
    pub run_id: u32,
    pub stream_id: u32,
}

impl StreamIds {
    pub fn new(cluster_id: u32, machine_id: u32, run_id: u32, stream_id: u32) -> Self {
        Self {
            cluster_id,
            machine_id,
            run_id,
            stream_id,
        }
    }

    /// Identifiers ordered from least to most significant level
    pub fn levels(&self) -> [u32; 4] {
        [self.stream_id, self.run_id, self.machine_id, self.cluster_id]
    }
}

impl Default for StreamIds {
    /// Stream 1 of run 0: the all-zero tuple would leave the mother state
    /// unjumped.
    fn default() -> Self {
        Self::new(0, 0, 0, 1)
    }
}

/// Jump polynomials for one parameter set.
#[derive(Debug, Clone)]
pub struct SkipTable {
    n: usize,
    stride_log2: u32,
    rows: Vec<u64>,
}

impl SkipTable {
    /// Build the table for `P` with rows jumping `2^(stride_log2 + r)` steps.
    ///
    /// # Panics
    ///
    /// Panics if the recovered characteristic polynomial does not have degree
    /// `N`, meaning the parameter set does not describe a full-rank generator.
    pub fn build<P: MixmaxParams>(stride_log2: u32) -> Self {
        let charpoly = characteristic_polynomial::<P>();
        let n = P::N;
        let neg_low: Vec<u64> = charpoly[..n]
            .iter()
            .map(|&c| reduce(MERSENNE_61 - c))
            .collect();

        let mut power = vec![0u64; n];
        power[1] = 1;
        for _ in 0..stride_log2 {
            power = square_mod(&power, &neg_low);
        }

        let mut rows = Vec::with_capacity(SKIP_ROWS * n);
        rows.extend_from_slice(&power);
        for _ in 1..SKIP_ROWS {
            power = square_mod(&power, &neg_low);
            rows.extend_from_slice(&power);
        }

        if std::env::var("MIXMAX_DEBUG").is_ok() {
            eprintln!(
                "[MIXMAX DEBUG] Built skip table for {}: {} rows, stride 2^{}",
                P::VARIANT,
                SKIP_ROWS,
                stride_log2
            );
        }

        Self {
            n,
            stride_log2,
            rows,
        }
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    pub fn stride_log2(&self) -> u32 {
        self.stride_log2
    }

    /// Coefficients of row `r`, lowest degree first
    pub fn row(&self, r: usize) -> &[u64] {
        assert!(r < SKIP_ROWS, "skip table row {r} out of range");
        &self.rows[r * self.n..(r + 1) * self.n]
    }

    /// Jump `v` forward by `2^(stride_log2 + r)` steps and return its checksum.
    pub fn jump<P: MixmaxParams>(&self, r: usize, v: &mut [u64], mut sumtot: u64) -> u64 {
        assert_eq!(self.n, P::N, "skip table built for a different vector size");
        let mut scratch = v.to_vec();
        v.fill(0);
        for &coeff in self.row(r) {
            for (acc, &y) in v.iter_mut().zip(&scratch) {
                *acc = mul_mod_add(*acc, coeff, reduce(y));
            }
            sumtot = iterate::<P>(&mut scratch, sumtot);
        }
        sum(v)
    }

    /// Derive the state of stream `ids` from the mother vector `v` in place.
    ///
    /// Every set bit `r` of the identifier at level `l` applies row
    /// `r + 32 l`, so the total jump is `Σ 2^(r + 32 l)` strides. Returns the
    /// checksum of the derived vector.
    pub fn apply<P: MixmaxParams>(&self, v: &mut [u64], ids: &StreamIds) -> u64 {
        let mut sumtot = sum(v);
        for (level, id) in ids.levels().into_iter().enumerate() {
            for bit in 0..u32::BITS as usize {
                if (id >> bit) & 1 == 1 {
                    sumtot = self.jump::<P>(bit + 32 * level, v, sumtot);
                }
            }
        }
        sumtot
    }
}

/// Recover the monic characteristic polynomial of the recurrence for `P`,
/// coefficients lowest degree first (length `N + 1`).
pub fn characteristic_polynomial<P: MixmaxParams>() -> Vec<u64> {
    let n = P::N;
    let mut v = vec![0u64; n];
    v[0] = 1;
    let mut sumtot = 1;
    let mut sequence = Vec::with_capacity(2 * n);
    for _ in 0..2 * n {
        sequence.push(reduce(v[1]));
        sumtot = iterate::<P>(&mut v, sumtot);
    }

    let connection = berlekamp_massey(&sequence);
    let degree = connection.len() - 1;
    assert!(
        degree == n,
        "MIXMAX configuration error: recurrence for {} has a characteristic polynomial of degree {degree}, expected {n}",
        P::VARIANT
    );

    // χ(x) = x^L + c1 x^(L-1) + ... + cL
    connection.into_iter().rev().collect()
}

/// Shortest linear recurrence generating `s` over GF(2^61 - 1).
///
/// Returns the connection polynomial `C` with `C[0] = 1` and
/// `Σ C[i] s[k - i] = 0` for every `k ≥ len(C) - 1`.
pub fn berlekamp_massey(s: &[u64]) -> Vec<u64> {
    let mut c = vec![1u64];
    let mut b = vec![1u64];
    let mut len = 0usize;
    let mut gap = 1usize;
    let mut last_discrepancy = 1u64;

    for k in 0..s.len() {
        let mut d = reduce(s[k]);
        for i in 1..=len {
            d = reduce(mul_mod_add(d, c[i], reduce(s[k - i])));
        }
        if d == 0 {
            gap += 1;
            continue;
        }

        let coef = reduce(mul_mod_add(0, d, inverse(last_discrepancy)));
        let previous = c.clone();
        if c.len() < b.len() + gap {
            c.resize(b.len() + gap, 0);
        }
        for (i, &bi) in b.iter().enumerate() {
            let term = reduce(mul_mod_add(0, coef, bi));
            c[i + gap] = reduce(mod_sub(c[i + gap], term));
        }

        if 2 * len <= k {
            len = k + 1 - len;
            b = previous;
            last_discrepancy = d;
            gap = 1;
        } else {
            gap += 1;
        }
    }

    c.resize(len + 1, 0);
    c
}

/// `a² mod χ`, where `neg_low[k] = -χ[k]` for the `N` low coefficients of the
/// monic `χ`.
fn square_mod(a: &[u64], neg_low: &[u64]) -> Vec<u64> {
    let n = neg_low.len();
    let mut prod = vec![0u64; 2 * n - 1];
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0 {
            continue;
        }
        for (j, &aj) in a.iter().enumerate() {
            prod[i + j] = reduce(mul_mod_add(prod[i + j], ai, aj));
        }
    }

    // x^d = x^(d-N) * Σ neg_low[k] x^k
    for d in (n..2 * n - 1).rev() {
        let top = prod[d];
        if top == 0 {
            continue;
        }
        prod[d] = 0;
        for (k, &coeff) in neg_low.iter().enumerate() {
            let slot = d - n + k;
            prod[slot] = reduce(mul_mod_add(prod[slot], top, coeff));
        }
    }

    prod.truncate(n);
    prod
}
