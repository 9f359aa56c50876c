//! Dice rolling behind an injectable trait.
//!
//! Every calculator draws its randomness from a [`DiceRoller`] passed in by
//! the caller, so a fixed roll sequence always produces the same result.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Target numbers at or above this value cannot be rolled on 2d6.
pub const IMPOSSIBLE_ROLL: i32 = 13;

/// Whether a 2d6 target number is out of reach.
#[must_use]
pub const fn is_impossible(target: i32) -> bool {
    target >= IMPOSSIBLE_ROLL
}

/// Chance in percent that 2d6 meets or beats `target`.
///
/// Targets of 2 or less always succeed, impossible targets never do.
#[must_use]
pub fn success_percent(target: i32) -> f64 {
    if target <= 2 {
        return 100.0;
    }
    if is_impossible(target) {
        return 0.0;
    }
    let ways: u32 = (target..=12).map(|total| ways_to_roll(total as u8)).sum();
    f64::from(ways) * 100.0 / 36.0
}

/// Number of the 36 2d6 combinations that sum to `total`.
const fn ways_to_roll(total: u8) -> u32 {
    match total {
        2..=7 => (total - 1) as u32,
        8..=12 => (13 - total) as u32,
        _ => 0,
    }
}

/// A single 2d6 roll with both faces kept for replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceRoll {
    /// First die face (1-6).
    pub first: u8,
    /// Second die face (1-6).
    pub second: u8,
}

impl DiceRoll {
    /// Create a roll from two faces.
    #[must_use]
    pub const fn new(first: u8, second: u8) -> Self {
        Self { first, second }
    }

    /// Sum of both dice.
    #[must_use]
    pub const fn total(&self) -> i32 {
        self.first as i32 + self.second as i32
    }

    /// Whether this roll meets or beats the target number.
    #[must_use]
    pub const fn meets(&self, target: i32) -> bool {
        self.total() >= target
    }
}

/// Source of d6 results.
///
/// Implementations must only ever return faces in 1..=6.
pub trait DiceRoller {
    /// Roll a single six-sided die.
    fn roll_d6(&mut self) -> u8;

    /// Roll two six-sided dice.
    fn roll_2d6(&mut self) -> DiceRoll {
        let first = self.roll_d6();
        let second = self.roll_d6();
        DiceRoll::new(first, second)
    }
}

/// Production roller backed by a seeded ChaCha stream.
#[derive(Debug, Clone)]
pub struct SeededDiceRoller {
    rng: ChaCha8Rng,
}

impl SeededDiceRoller {
    /// Create a roller from a 64-bit seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl DiceRoller for SeededDiceRoller {
    fn roll_d6(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }
}

/// Roller that replays a fixed sequence of die faces.
///
/// Used to replay a recorded combat log and to pin outcomes in tests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDiceRoller {
    faces: VecDeque<u8>,
    rolled: usize,
}

impl ScriptedDiceRoller {
    /// Create a roller that yields `faces` in order.
    ///
    /// # Panics
    ///
    /// Panics if any face lies outside 1..=6.
    #[must_use]
    pub fn new(faces: impl IntoIterator<Item = u8>) -> Self {
        let faces: VecDeque<u8> = faces.into_iter().collect();
        assert!(
            faces.iter().all(|f| (1..=6).contains(f)),
            "scripted die faces must be 1-6: {faces:?}"
        );
        Self { faces, rolled: 0 }
    }

    /// Build a script from 2d6 totals, splitting each into two faces.
    ///
    /// # Panics
    ///
    /// Panics if any total lies outside 2..=12.
    #[must_use]
    pub fn from_totals(totals: impl IntoIterator<Item = u8>) -> Self {
        let faces = totals.into_iter().flat_map(|total| {
            assert!((2..=12).contains(&total), "2d6 total out of range: {total}");
            let first = total.saturating_sub(1).min(6);
            [first, total - first]
        });
        Self::new(faces)
    }

    /// Faces not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }

    /// Number of faces consumed so far.
    #[must_use]
    pub const fn rolled(&self) -> usize {
        self.rolled
    }
}

impl DiceRoller for ScriptedDiceRoller {
    fn roll_d6(&mut self) -> u8 {
        let face = self
            .faces
            .pop_front()
            .unwrap_or_else(|| panic!("dice script exhausted after {} rolls", self.rolled));
        self.rolled += 1;
        face
    }
}
