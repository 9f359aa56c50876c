//! Pilot consciousness checks after wounds.

use serde::{Deserialize, Serialize};

use crate::dice::{DiceRoll, DiceRoller};
use crate::rules::RulesProvider;
use crate::unit::Pilot;

/// One consciousness roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsciousnessRollResult {
    /// Target number.
    pub target: i32,
    /// Dice rolled.
    pub roll: DiceRoll,
    /// Whether the pilot stayed (or came back) awake.
    pub success: bool,
    /// Recovery roll by an unconscious pilot rather than a wound check.
    pub is_recovery: bool,
}

/// Rolls consciousness checks for pilots.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsciousnessCalculator;

impl ConsciousnessCalculator {
    /// Create the calculator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Roll the pilot's queued wound checks in order, stopping at the
    /// first failure.
    ///
    /// Nothing is rolled for a pilot who is already unconscious, dead or
    /// has no checks queued. The queue itself is left untouched; fold the
    /// results back with [`Pilot::apply_consciousness_results`], which
    /// clears it.
    pub fn make_consciousness_rolls(&self, pilot: &Pilot, dice: &mut dyn DiceRoller) -> Vec<ConsciousnessRollResult> {
        if !pilot.is_conscious || pilot.is_dead {
            return Vec::new();
        }

        let mut results = Vec::with_capacity(pilot.pending_consciousness_rolls.len());
        for &target in &pilot.pending_consciousness_rolls {
            let roll = dice.roll_2d6();
            let success = roll.meets(target);
            tracing::debug!(pilot = %pilot.name, target, roll = roll.total(), success, "Consciousness roll");
            results.push(ConsciousnessRollResult {
                target,
                roll,
                success,
                is_recovery: false,
            });
            if !success {
                break;
            }
        }
        results
    }

    /// Roll for an unconscious pilot to wake up, against the consciousness
    /// number for their current wounds. `None` when conscious or dead.
    pub fn make_recovery_consciousness_roll(
        &self,
        pilot: &Pilot,
        rules: &dyn RulesProvider,
        dice: &mut dyn DiceRoller,
    ) -> Option<ConsciousnessRollResult> {
        if pilot.is_conscious || pilot.is_dead {
            return None;
        }
        let target = pilot.consciousness_number(rules)?;
        let roll = dice.roll_2d6();
        let success = roll.meets(target);
        tracing::debug!(pilot = %pilot.name, target, roll = roll.total(), success, "Recovery roll");
        Some(ConsciousnessRollResult {
            target,
            roll,
            success,
            is_recovery: true,
        })
    }
}
