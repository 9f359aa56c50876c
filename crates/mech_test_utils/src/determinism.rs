//! Determinism testing utilities.
//!
//! Combat results are replicated to every client as records, and logs are
//! replayed from a dice seed. Both only work if resolution is a pure
//! function of unit state and the dice stream.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism guarded against:
//!
//! - **Floating-point math**: hex lines use [`mech_core::math::Fixed`].
//! - **HashMap iteration order**: units keep their locations in a
//!   `BTreeMap`; calculators never iterate the map's hex table.
//! - **System randomness**: every roll goes through a
//!   [`DiceRoller`](mech_core::dice::DiceRoller); production uses a seeded
//!   ChaCha stream.
//!
//! Results are compared by hashing their bincode encoding, so any field
//! that differs between runs shows up.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use mech_core::dice::SeededDiceRoller;
use serde::Serialize;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Seed the runs shared.
    pub seed: u64,
}

impl DeterminismResult {
    /// All distinct hashes (exactly one when deterministic).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            panic!(
                "Resolution is non-deterministic!\n\
                 Runs: {}\n\
                 Seed: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.seed,
                self.unique_hashes().len(),
                self.hashes
            );
        }
    }
}

/// Hash of a value's bincode encoding.
///
/// # Panics
///
/// Panics if the value cannot be encoded.
pub fn state_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = bincode::serialize(value).expect("result records must encode");
    compute_hash(&bytes)
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Run `resolve` `runs` times, each with a fresh roller seeded from
/// `seed`, and check the results encode identically.
///
/// # Example
///
/// ```ignore
/// use mech_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(42, 5, |dice| {
///     calculator.for_structure_damage(&unit, &damage, dice)
/// });
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<T, F>(seed: u64, runs: usize, resolve: F) -> DeterminismResult
where
    T: Serialize,
    F: Fn(&mut SeededDiceRoller) -> T,
{
    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let mut dice = SeededDiceRoller::new(seed);
            state_hash(&resolve(&mut dice))
        })
        .collect();
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    tracing::trace!(seed, runs, is_deterministic, "Determinism check");
    DeterminismResult {
        is_deterministic,
        hashes,
        seed,
    }
}

/// Like [`verify_determinism`] but each run happens on its own scoped
/// thread, to catch state leaking between runs.
pub fn verify_parallel_determinism<T, F>(seed: u64, runs: usize, resolve: F) -> DeterminismResult
where
    T: Serialize,
    F: Fn(&mut SeededDiceRoller) -> T + Sync,
{
    let resolve = &resolve;
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| {
                s.spawn(move || {
                    let mut dice = SeededDiceRoller::new(seed);
                    state_hash(&resolve(&mut dice))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("resolution thread panicked"))
            .collect()
    });
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        seed,
    }
}

/// Proptest strategies for combat inputs.
pub mod strategies {
    use mech_core::map::{Facing, HexCoord};
    use mech_core::rules::HitDirection;
    use mech_core::unit::PartLocation;
    use proptest::prelude::*;

    /// Any body location.
    pub fn arb_location() -> impl Strategy<Value = PartLocation> {
        proptest::sample::select(PartLocation::ALL.to_vec())
    }

    /// Any hit direction.
    pub fn arb_hit_direction() -> impl Strategy<Value = HitDirection> {
        prop_oneof![
            Just(HitDirection::Front),
            Just(HitDirection::Left),
            Just(HitDirection::Right),
            Just(HitDirection::Rear),
        ]
    }

    /// Tonnage from the structure table (20-100 in steps of 5).
    pub fn arb_tonnage() -> impl Strategy<Value = u32> {
        (4u32..=20).prop_map(|step| step * 5)
    }

    /// Damage values (1-200).
    pub fn arb_damage() -> impl Strategy<Value = i32> {
        1i32..=200
    }

    /// Heat values (0-40).
    pub fn arb_heat() -> impl Strategy<Value = i32> {
        0i32..=40
    }

    /// A single die face.
    pub fn arb_face() -> impl Strategy<Value = u8> {
        1u8..=6
    }

    /// A script of die faces.
    pub fn arb_faces(len: usize) -> impl Strategy<Value = Vec<u8>> {
        proptest::collection::vec(arb_face(), len)
    }

    /// Any facing.
    pub fn arb_facing() -> impl Strategy<Value = Facing> {
        (0u8..6).prop_map(Facing::new)
    }

    /// Coordinates within a 30-hex radius of the origin.
    pub fn arb_hex_coord() -> impl Strategy<Value = HexCoord> {
        (-30i32..=30, -30i32..=30).prop_map(|(q, r)| HexCoord::new(q, r))
    }

    /// A hit group: location, damage and direction.
    pub fn arb_hit() -> impl Strategy<Value = (PartLocation, i32, HitDirection)> {
        (arb_location(), arb_damage(), arb_hit_direction())
    }
}
