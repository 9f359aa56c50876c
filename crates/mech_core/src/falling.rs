//! Falling damage and post-fall facing.

use serde::{Deserialize, Serialize};

use crate::dice::{DiceRoll, DiceRoller};
use crate::error::{CombatError, Result};
use crate::map::Facing;
use crate::math::ceil_div;
use crate::psr::PsrBreakdown;
use crate::rules::{HitDirection, RulesProvider};
use crate::unit::{PartLocation, Unit, UnitKind};

/// One packet of falling damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallCluster {
    /// Damage in the packet.
    pub damage: i32,
    /// 2d6 hit-location roll.
    pub roll: DiceRoll,
    /// Location struck.
    pub location: PartLocation,
}

/// Everything a fall does to a mech and its pilot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallingDamageData {
    /// Total damage from the fall.
    pub total_damage: i32,
    /// 1d6 facing roll.
    pub facing_roll: u8,
    /// Facing after the fall.
    pub new_facing: Facing,
    /// Side the mech lands on; selects the hit-location table.
    pub hit_direction: HitDirection,
    /// Damage packets, in roll order.
    pub clusters: Vec<FallCluster>,
    /// Pilot damage roll; absent when the check was impossible.
    pub pilot_damage_roll: Option<DiceRoll>,
    /// Whether the pilot is injured.
    pub pilot_takes_damage: bool,
}

/// Side a mech lands on for a 1d6 facing roll.
#[must_use]
pub const fn landing_side(facing_roll: u8) -> HitDirection {
    match facing_roll {
        1 => HitDirection::Front,
        2 | 3 => HitDirection::Right,
        4 => HitDirection::Rear,
        _ => HitDirection::Left,
    }
}

/// Computes falling damage.
pub struct FallingDamageCalculator<'a> {
    rules: &'a dyn RulesProvider,
}

impl<'a> FallingDamageCalculator<'a> {
    /// Create a calculator over the given rules.
    #[must_use]
    pub fn new(rules: &'a dyn RulesProvider) -> Self {
        Self { rules }
    }

    /// Total damage for a fall, before clustering.
    #[must_use]
    pub fn total_damage(&self, tonnage: u32, levels_fallen: u32, is_jumping: bool) -> i32 {
        let tonnage = i32::try_from(tonnage).unwrap_or(i32::MAX);
        let base = ceil_div(tonnage, 10).saturating_mul(self.rules.fall_damage_per_ten_tons());
        if is_jumping {
            base
        } else {
            let levels = i32::try_from(levels_fallen).unwrap_or(i32::MAX - 1);
            base.saturating_mul(levels.saturating_add(1))
        }
    }

    /// Resolve a fall.
    ///
    /// Rolls 1d6 for the new facing first, then 2d6 per damage cluster on
    /// the table for the side landed on, then the pilot check: 2d6 against
    /// the breakdown's target, with damage when the roll exceeds it. An
    /// impossible breakdown injures the pilot without rolling.
    pub fn calculate(
        &self,
        unit: &Unit,
        levels_fallen: u32,
        is_jumping: bool,
        psr: &PsrBreakdown,
        dice: &mut dyn DiceRoller,
    ) -> Result<FallingDamageData> {
        if unit.kind != UnitKind::Mech {
            return Err(CombatError::NotAMech(unit.id));
        }
        if !unit.is_deployed() {
            return Err(CombatError::NotDeployed(unit.id));
        }

        let total_damage = self.total_damage(unit.tonnage, levels_fallen, is_jumping);

        let facing_roll = dice.roll_d6();
        let new_facing = unit.facing.rotated(facing_roll - 1);
        let hit_direction = landing_side(facing_roll);

        let cluster_size = self.rules.fall_cluster_size().max(1);
        let mut clusters = Vec::new();
        let mut remaining = total_damage;
        while remaining > 0 {
            let damage = remaining.min(cluster_size);
            let roll = dice.roll_2d6();
            clusters.push(FallCluster {
                damage,
                roll,
                location: self.rules.hit_location(hit_direction, roll.total()),
            });
            remaining -= damage;
        }

        let (pilot_damage_roll, pilot_takes_damage) = if psr.is_impossible {
            (None, true)
        } else {
            let roll = dice.roll_2d6();
            (Some(roll), roll.total() > psr.modified_skill)
        };

        tracing::debug!(
            unit = %unit.id,
            total_damage,
            clusters = clusters.len(),
            facing = new_facing.index(),
            pilot_takes_damage,
            "Falling damage resolved"
        );

        Ok(FallingDamageData {
            total_damage,
            facing_roll,
            new_facing,
            hit_direction,
            clusters,
            pilot_damage_roll,
            pilot_takes_damage,
        })
    }
}
