//! MIXMAX engine: state, draw buffer, seeding and branching
//!
//! # Algorithm
//!
//! The state is a vector `V` of `N` elements of GF(2^61 - 1) together with
//! its checksum `sumtot = Σ V[i]`. Each refill applies the MIXMAX matrix to
//! `V` (see [`crate::rng::recurrence`]); the elements `V[1..N]` are then
//! handed out one at a time. `V[0]` is internal carry state and is never
//! returned.
//!
//! # Streams
//!
//! Independent streams come from [`MixmaxEngine::new`]: the four identifiers
//! select a jump of `Σ 2^(bit + 32 level)` strides from a common mother state,
//! so distinct identifier tuples give non-overlapping sequences. Use a
//! different `stream_id` for every thread and a different `run_id` every
//! time the simulation is repeated.

use crate::core::field::{mod_add, mod_sub, reduce, BITS, INV_MERSENNE_61};
use crate::core::params::{MixmaxParams, MixmaxVariant};
use crate::rng::recurrence::{iterate, iterate_n};
use crate::rng::skip::StreamIds;
use std::marker::PhantomData;

/// Deterministic MIXMAX generator for the parameter set `P`
///
/// # Example
/// ```
/// use mixmax_core_rs::{Mixmax17, MixmaxEngine};
///
/// let mut rng = MixmaxEngine::<Mixmax17>::new(0, 0, 0, 1);
/// let value = rng.next_value();
/// assert!(value < (1u64 << 61) - 1);
///
/// let u = rng.next_float();
/// assert!(u > 0.0 && u <= 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixmaxEngine<P: MixmaxParams> {
    pub(crate) v: Vec<u64>,
    pub(crate) sumtot: u64,
    pub(crate) counter: usize,
    pub(crate) params: PhantomData<P>,
}

impl<P: MixmaxParams> MixmaxEngine<P> {
    /// Create the generator for one stream
    ///
    /// # Arguments
    /// * `cluster_id` - Most significant identifier level
    /// * `machine_id` - Machine within the cluster
    /// * `run_id` - Run of the simulation
    /// * `stream_id` - Least significant level, typically the thread
    ///
    /// The all-zero tuple applies no jump: the engine holds the unit-vector
    /// mother state and its first `N - 1` draws are exactly zero.
    pub fn new(cluster_id: u32, machine_id: u32, run_id: u32, stream_id: u32) -> Self {
        Self::from_ids(StreamIds::new(cluster_id, machine_id, run_id, stream_id))
    }

    /// Create the generator for a stream of the unit-vector mother state
    pub fn from_ids(ids: StreamIds) -> Self {
        let mut engine = Self::from_unit_vector(0);
        engine.seed_unique_stream(ids);
        engine
    }

    /// Derive stream `ids` from an arbitrary mother state.
    ///
    /// Streams are only guaranteed disjoint when derived from the *same*
    /// mother. Never derive from a state that was itself derived.
    pub fn from_mother(mother: &Self, ids: StreamIds) -> Self {
        let mut v = mother.v.clone();
        let sumtot = P::skip_table().apply::<P>(&mut v, &ids);
        Self {
            v,
            sumtot,
            counter: 1,
            params: PhantomData,
        }
    }

    /// Seed with the `index`-th unit vector; the first draw refills the buffer.
    ///
    /// Intended for testing: unit vectors produce long runs of small values.
    ///
    /// # Panics
    /// Panics if `index >= N`.
    pub fn from_unit_vector(index: usize) -> Self {
        assert!(
            index < P::N,
            "unit vector index {} out of range for N={}",
            index,
            P::N
        );
        let mut v = vec![0u64; P::N];
        v[index] = 1;
        Self {
            v,
            sumtot: 1,
            counter: P::N,
            params: PhantomData,
        }
    }

    /// Reseed in place with stream `ids` of the unit-vector mother state
    pub fn seed_unique_stream(&mut self, ids: StreamIds) {
        self.v.fill(0);
        self.v[0] = 1;
        self.sumtot = P::skip_table().apply::<P>(&mut self.v, &ids);
        self.counter = 1;
    }

    /// Reseed from a single 64-bit value: the high half becomes the run and
    /// the low half the stream identifier.
    pub fn seed_u64(&mut self, seed: u64) {
        self.seed_unique_stream(StreamIds::new(0, 0, (seed >> 32) as u32, seed as u32));
    }

    /// Next output, a field element in `[0, 2^61 - 2]`
    ///
    /// Only the low 61 bits carry entropy.
    #[inline]
    pub fn next_value(&mut self) -> u64 {
        if self.counter < P::N {
            let value = self.v[self.counter];
            self.counter += 1;
            return reduce(value);
        }
        self.sumtot = iterate_n::<P>(&mut self.v, self.sumtot, P::STEPS_PER_REFILL);
        self.counter = 2;
        reduce(self.v[1])
    }

    /// Next output scaled to a double in `(0, 1]`
    ///
    /// Zero is only returned by an unjumped state, such as `new(0, 0, 0, 0)`
    /// or [`from_unit_vector`](Self::from_unit_vector), until its first refill.
    #[inline]
    pub fn next_float(&mut self) -> f64 {
        self.next_value() as f64 * INV_MERSENNE_61
    }

    /// Fill `out` with consecutive [`next_float`](Self::next_float) values
    pub fn fill_floats(&mut self, out: &mut [f64]) {
        for slot in out.iter_mut() {
            *slot = self.next_float();
        }
    }

    /// Split off a daughter stream.
    ///
    /// The daughter is a copy of this engine perturbed with
    /// [`branch_daughter(5)`](Self::branch_daughter); this engine is perturbed
    /// with [`branch_mother`](Self::branch_mother). Both remain ordinary
    /// generators afterwards.
    ///
    /// # Example
    /// ```
    /// use mixmax_core_rs::{Mixmax17, MixmaxEngine};
    ///
    /// let mut mother = MixmaxEngine::<Mixmax17>::new(0, 0, 0, 1);
    /// let daughter = mother.branch();
    /// assert_ne!(mother.state(), daughter.state());
    /// ```
    pub fn branch(&mut self) -> Self {
        let mut daughter = self.clone();
        self.branch_mother();
        daughter.branch_daughter(5);
        daughter
    }

    /// Perturb this state into a daughter stream.
    ///
    /// Toggles bit `61 - b` of the last element, forces its lowest bit to 1
    /// and applies one recurrence step. The engine the daughter was copied
    /// from must get [`branch_mother`](Self::branch_mother), or the two
    /// streams collide.
    ///
    /// # Panics
    /// Panics unless `5 <= b <= 60`.
    pub fn branch_daughter(&mut self, b: u32) {
        assert!(
            (5..=60).contains(&b),
            "branch distance b must be in [5, 60], got {b}"
        );
        self.perturb(b);
    }

    /// Perturb the state that a daughter was branched from
    pub fn branch_mother(&mut self) {
        self.perturb(4);
    }

    fn perturb(&mut self, b: u32) {
        let last = P::N - 1;
        let old = reduce(self.v[last]);
        let new = (old ^ (1u64 << (BITS - b))) | 1;
        self.v[last] = new;
        self.sumtot = mod_add(mod_sub(self.sumtot, old), new);
        self.sumtot = iterate::<P>(&mut self.v, self.sumtot);

        if std::env::var("MIXMAX_DEBUG").is_ok() {
            eprintln!(
                "[MIXMAX DEBUG] Branch b={}: V[{}] {} -> {}, sumtot now {}",
                b, last, old, new, self.sumtot
            );
        }
    }

    /// Vector size `N`
    pub fn dimension(&self) -> usize {
        P::N
    }

    /// Special matrix entry as listed in the parameter tables
    pub fn special(&self) -> i64 {
        P::SPECIAL.as_i64()
    }

    /// Exponent of the secondary multiplier
    pub fn special_mul(&self) -> u32 {
        P::SPECIALMUL
    }

    pub fn variant(&self) -> MixmaxVariant {
        P::VARIANT
    }

    /// The raw state vector
    pub fn state(&self) -> &[u64] {
        &self.v
    }

    /// Checksum of the state vector (possibly a lazily reduced representative)
    pub fn sumtot(&self) -> u64 {
        self.sumtot
    }

    /// Index of the next element to be returned
    pub fn counter(&self) -> usize {
        self.counter
    }
}

impl<P: MixmaxParams> Default for MixmaxEngine<P> {
    /// Stream `(0, 0, 0, 1)`, the conventional default
    fn default() -> Self {
        Self::from_ids(StreamIds::default())
    }
}
