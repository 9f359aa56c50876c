//! Heat-driven shutdown, restart and ammunition cook-off.

use serde::{Deserialize, Serialize};

use crate::dice::{DiceRoll, DiceRoller};
use crate::rules::{RulesProvider, ShutdownThreshold};
use crate::unit::{Component, PartLocation, Unit, UnitId};

/// Outcome of a heat shutdown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownCheck {
    /// Unit checked.
    pub unit_id: UnitId,
    /// Turn of the check.
    pub turn: u32,
    /// Heat at the time of the check.
    pub heat: i32,
    /// Avoid number; `None` for an automatic shutdown.
    pub avoid_number: Option<i32>,
    /// Avoidance roll, when one was made.
    pub roll: Option<DiceRoll>,
    /// Shutdown happened without a roll.
    pub automatic: bool,
    /// The unit shuts down.
    pub shutdown: bool,
}

/// Outcome of a heat ammunition explosion check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoExplosionCheck {
    /// Unit checked.
    pub unit_id: UnitId,
    /// Turn of the check.
    pub turn: u32,
    /// Heat at the time of the check.
    pub heat: i32,
    /// Avoid number for the heat band.
    pub avoid_number: i32,
    /// Avoidance roll.
    pub roll: DiceRoll,
    /// Bin that cooks off on a failed roll.
    pub location: PartLocation,
    /// First slot of that bin.
    pub slot: u8,
    /// Name of that bin.
    pub component_name: String,
    /// Damage the bin would deal.
    pub damage: i32,
    /// The roll failed and the bin explodes.
    pub exploded: bool,
}

/// Evaluates heat effects for one unit at a time.
pub struct HeatEffectsCalculator<'a> {
    rules: &'a dyn RulesProvider,
}

impl<'a> HeatEffectsCalculator<'a> {
    /// Create a calculator over the given rules.
    #[must_use]
    pub fn new(rules: &'a dyn RulesProvider) -> Self {
        Self { rules }
    }

    /// Check for heat shutdown.
    ///
    /// `None` below the first shutdown band. Only a conscious pilot may
    /// roll to avoid; without one the unit shuts down automatically.
    pub fn check_for_heat_shutdown(&self, unit: &Unit, turn: u32, dice: &mut dyn DiceRoller) -> Option<ShutdownCheck> {
        let heat = unit.heat;
        let avoid_number = match self.rules.shutdown_threshold(heat) {
            ShutdownThreshold::None => return None,
            ShutdownThreshold::Automatic => None,
            ShutdownThreshold::Avoid(number) => Some(number),
        };

        let check = match avoid_number {
            Some(number) if unit.has_active_pilot() => {
                let roll = dice.roll_2d6();
                ShutdownCheck {
                    unit_id: unit.id,
                    turn,
                    heat,
                    avoid_number: Some(number),
                    roll: Some(roll),
                    automatic: false,
                    shutdown: !roll.meets(number),
                }
            }
            _ => ShutdownCheck {
                unit_id: unit.id,
                turn,
                heat,
                avoid_number,
                roll: None,
                automatic: true,
                shutdown: true,
            },
        };

        tracing::debug!(
            unit = %unit.id,
            turn,
            heat,
            avoid = ?check.avoid_number,
            roll = check.roll.map(|r| r.total()),
            shutdown = check.shutdown,
            "Heat shutdown check"
        );
        Some(check)
    }

    /// Whether a shut-down unit restarts without a roll.
    #[must_use]
    pub fn should_auto_restart(&self, unit: &Unit) -> bool {
        unit.heat < self.rules.auto_restart_below()
    }

    /// Check whether heat cooks off an ammunition bin.
    ///
    /// `None` when heat is below the first explosion band or the unit
    /// carries no live ammunition. The bin at risk is the one that would
    /// deal the most damage; ties go to the first in body order.
    pub fn check_for_ammo_explosion(
        &self,
        unit: &Unit,
        turn: u32,
        dice: &mut dyn DiceRoller,
    ) -> Option<AmmoExplosionCheck> {
        let avoid_number = self.rules.ammo_explosion_avoid(unit.heat)?;

        let mut worst: Option<(PartLocation, &Component, i32)> = None;
        for (location, component) in unit.components() {
            if component.ammo.is_none() {
                continue;
            }
            let Some(damage) = component.pending_explosion_damage() else {
                continue;
            };
            if worst.map_or(true, |(_, _, best)| damage > best) {
                worst = Some((location, component, damage));
            }
        }
        let (location, component, damage) = worst?;

        let roll = dice.roll_2d6();
        let exploded = !roll.meets(avoid_number);
        tracing::debug!(
            unit = %unit.id,
            turn,
            heat = unit.heat,
            avoid = avoid_number,
            roll = roll.total(),
            bin = %component.name,
            exploded,
            "Ammo explosion check"
        );

        Some(AmmoExplosionCheck {
            unit_id: unit.id,
            turn,
            heat: unit.heat,
            avoid_number,
            roll,
            location,
            slot: component.first_slot,
            component_name: component.name.clone(),
            damage,
            exploded,
        })
    }
}
