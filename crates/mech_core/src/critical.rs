//! Critical hits on internal components and the explosions they set off.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::damage::{DamageResult, DamageTransferCalculator};
use crate::dice::DiceRoller;
use crate::error::{CombatError, Result};
use crate::rules::RulesProvider;
use crate::unit::{ComponentKind, Part, PartLocation, Unit};

/// One slot struck by a critical hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalHit {
    /// Slot index within the location.
    pub slot: u8,
    /// Kind of component in the slot, if any.
    pub component: Option<ComponentKind>,
    /// Name of the component in the slot, if any.
    pub component_name: Option<String>,
}

/// An explosion triggered by a critical hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosionResult {
    /// Kind of the exploding component.
    pub component: ComponentKind,
    /// Name of the exploding component.
    pub component_name: String,
    /// Slot the exploding component was hit in.
    pub slot: u8,
    /// Total explosion damage.
    pub damage: i32,
    /// Where that damage landed, armor bypassed.
    pub distribution: Vec<DamageResult>,
}

/// Critical hit resolution for one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalHitResult {
    /// Location checked.
    pub location: PartLocation,
    /// The 2d6 determination roll; 0 when the hit was forced.
    pub roll: i32,
    /// Critical hits scored.
    pub hit_count: u8,
    /// Slots struck.
    pub hits: Vec<CriticalHit>,
    /// Explosions set off.
    pub explosions: Vec<ExplosionResult>,
}

impl CriticalHitResult {
    /// Kinds of every component struck.
    pub fn hit_kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.hits.iter().filter_map(|hit| hit.component)
    }
}

/// Decides which components a damaged location loses.
pub struct CriticalHitsCalculator<'a> {
    rules: &'a dyn RulesProvider,
    transfer: DamageTransferCalculator,
}

impl<'a> CriticalHitsCalculator<'a> {
    /// Create a calculator over the given rules.
    #[must_use]
    pub fn new(rules: &'a dyn RulesProvider) -> Self {
        Self {
            rules,
            transfer: DamageTransferCalculator::new(),
        }
    }

    /// Roll for critical hits in every location that took structure damage.
    ///
    /// Call after the damage behind `structure_damage` has been applied to
    /// `unit`: explosions spread through the structure the unit has left.
    /// Locations are processed in body order, and each explosion accounts
    /// for the earlier explosions in the same call.
    pub fn for_structure_damage(
        &self,
        unit: &Unit,
        structure_damage: &BTreeMap<PartLocation, i32>,
        dice: &mut dyn DiceRoller,
    ) -> Vec<CriticalHitResult> {
        let mut applied: Vec<DamageResult> = Vec::new();
        let mut exploded = BTreeSet::new();
        let mut results = Vec::new();

        for (&location, &damage) in structure_damage {
            if damage <= 0 {
                continue;
            }
            let Some(part) = unit.part(location) else {
                continue;
            };

            let roll = dice.roll_2d6().total();
            let hit_count = self.rules.critical_hit_count(roll);
            tracing::debug!(unit = %unit.id, ?location, roll, hit_count, "Critical hit determination");

            let mut result = CriticalHitResult {
                location,
                roll,
                hit_count,
                hits: Vec::new(),
                explosions: Vec::new(),
            };
            for _ in 0..hit_count {
                let slot = roll_slot(part, dice);
                self.strike_slot(unit, part, slot, &mut result, &mut applied, &mut exploded);
            }
            results.push(result);
        }
        results
    }

    /// Force a single hit on the component in `slot`, as when heat cooks
    /// off an ammunition bin. The recorded roll is 0.
    pub fn for_heat_explosion(&self, unit: &Unit, location: PartLocation, slot: u8) -> Result<CriticalHitResult> {
        let part = unit.part(location).ok_or(CombatError::UnknownLocation {
            unit: unit.id,
            location,
        })?;
        if part.component_at(slot).is_none() {
            return Err(CombatError::UnknownComponent {
                unit: unit.id,
                location,
                slot,
            });
        }

        let mut result = CriticalHitResult {
            location,
            roll: 0,
            hit_count: 1,
            hits: Vec::new(),
            explosions: Vec::new(),
        };
        self.strike_slot(unit, part, slot, &mut result, &mut Vec::new(), &mut BTreeSet::new());
        Ok(result)
    }

    fn strike_slot(
        &self,
        unit: &Unit,
        part: &Part,
        slot: u8,
        result: &mut CriticalHitResult,
        applied: &mut Vec<DamageResult>,
        exploded: &mut BTreeSet<(PartLocation, u8)>,
    ) {
        let component = part.component_at(slot);
        tracing::debug!(
            unit = %unit.id,
            location = ?part.location,
            slot,
            component = component.map(|c| c.name.as_str()),
            "Critical slot struck"
        );
        result.hits.push(CriticalHit {
            slot,
            component: component.map(|c| c.kind),
            component_name: component.map(|c| c.name.clone()),
        });

        let Some(component) = component else {
            return;
        };
        let key = (part.location, component.first_slot);
        if exploded.contains(&key) {
            return;
        }
        let Some(damage) = component.pending_explosion_damage() else {
            return;
        };
        exploded.insert(key);

        let distribution = self
            .transfer
            .calculate_explosion(unit, part.location, damage, applied);
        applied.extend(distribution.iter().copied());
        tracing::debug!(unit = %unit.id, component = %component.name, damage, "Component exploded");

        result.explosions.push(ExplosionResult {
            component: component.kind,
            component_name: component.name.clone(),
            slot,
            damage,
            distribution,
        });
    }
}

/// Pick a slot with 1d6; locations with more than six slots first roll a
/// 1d6 block (1-3 upper, 4-6 lower).
fn roll_slot(part: &Part, dice: &mut dyn DiceRoller) -> u8 {
    let block = if part.slot_count > 6 {
        if dice.roll_d6() <= 3 {
            0
        } else {
            6
        }
    } else {
        0
    };
    block + dice.roll_d6() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDiceRoller;
    use crate::rules::StandardRules;
    use crate::unit::{Component, UnitBuilder, UnitId};

    fn mech_with_ammo(rules: &StandardRules) -> Unit {
        UnitBuilder::mech(UnitId(3), "Hunchback", 50, rules)
            .with_standard_internals()
            .with_component(PartLocation::LeftTorso, Component::ammo("AC/20 Ammo", 0, 2, 20))
            .with_component(PartLocation::RightTorso, Component::new("Medium Laser", ComponentKind::Weapon, 0, 1))
            .build()
    }

    fn damage_at(location: PartLocation, amount: i32) -> BTreeMap<PartLocation, i32> {
        BTreeMap::from([(location, amount)])
    }

    #[test]
    fn test_low_roll_no_hits() {
        let rules = StandardRules::default();
        let unit = mech_with_ammo(&rules);
        let calc = CriticalHitsCalculator::new(&rules);
        let mut dice = ScriptedDiceRoller::from_totals([7]);
        let results = calc.for_structure_damage(&unit, &damage_at(PartLocation::RightTorso, 3), &mut dice);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].roll, 7);
        assert_eq!(results[0].hit_count, 0);
        assert!(results[0].hits.is_empty());
    }

    #[test]
    fn test_zero_structure_damage_skipped() {
        let rules = StandardRules::default();
        let unit = mech_with_ammo(&rules);
        let calc = CriticalHitsCalculator::new(&rules);
        let mut dice = ScriptedDiceRoller::new([]);
        let results = calc.for_structure_damage(&unit, &damage_at(PartLocation::RightTorso, 0), &mut dice);
        assert!(results.is_empty());
        assert_eq!(dice.rolled(), 0);
    }

    #[test]
    fn test_single_hit_identifies_component() {
        let rules = StandardRules::default();
        let unit = mech_with_ammo(&rules);
        let calc = CriticalHitsCalculator::new(&rules);
        // 2d6 = 8 (one hit), block roll 2 (upper), slot roll 1.
        let mut dice = ScriptedDiceRoller::new([4, 4, 2, 1]);
        let results = calc.for_structure_damage(&unit, &damage_at(PartLocation::RightTorso, 2), &mut dice);
        assert_eq!(results[0].hit_count, 1);
        assert_eq!(results[0].hits[0].slot, 0);
        assert_eq!(results[0].hits[0].component, Some(ComponentKind::Weapon));
        assert!(results[0].explosions.is_empty());
    }

    #[test]
    fn test_ammo_hit_explodes_through_structure() {
        let rules = StandardRules::default();
        let mut unit = mech_with_ammo(&rules);
        unit.part_mut(PartLocation::LeftTorso).unwrap().structure -= 3;
        let calc = CriticalHitsCalculator::new(&rules);
        // Roll 8, upper block, slot 1: the AC/20 bin (2 shots x 20).
        let mut dice = ScriptedDiceRoller::new([4, 4, 1, 1]);
        let results = calc.for_structure_damage(&unit, &damage_at(PartLocation::LeftTorso, 3), &mut dice);
        let explosion = &results[0].explosions[0];
        assert_eq!(explosion.damage, 40);
        // Left torso has 9 of 12 structure left: 9 there, 16 in the
        // center torso, the rest is lost.
        assert_eq!(explosion.distribution[0].location, PartLocation::LeftTorso);
        assert_eq!(explosion.distribution[0].structure_damage, 9);
        assert_eq!(explosion.distribution[1].location, PartLocation::CenterTorso);
        assert_eq!(explosion.distribution[1].structure_damage, 16);
        assert!(explosion
            .distribution
            .iter()
            .all(|d| d.armor_damage == 0 && !d.is_rear_armor));
    }

    #[test]
    fn test_same_bin_hit_twice_explodes_once() {
        let rules = StandardRules::default();
        let unit = mech_with_ammo(&rules);
        let calc = CriticalHitsCalculator::new(&rules);
        // Roll 10 (two hits), both on upper block slot 1.
        let mut dice = ScriptedDiceRoller::new([5, 5, 1, 1, 3, 1]);
        let results = calc.for_structure_damage(&unit, &damage_at(PartLocation::LeftTorso, 1), &mut dice);
        assert_eq!(results[0].hit_count, 2);
        assert_eq!(results[0].hits.len(), 2);
        assert_eq!(results[0].explosions.len(), 1);
    }

    #[test]
    fn test_exploded_component_does_not_explode_again() {
        let rules = StandardRules::default();
        let mut unit = mech_with_ammo(&rules);
        let bin = &mut unit.part_mut(PartLocation::LeftTorso).unwrap().components[0];
        bin.is_destroyed = true;
        bin.has_exploded = true;
        let calc = CriticalHitsCalculator::new(&rules);
        let mut dice = ScriptedDiceRoller::new([4, 4, 1, 1]);
        let results = calc.for_structure_damage(&unit, &damage_at(PartLocation::LeftTorso, 1), &mut dice);
        assert_eq!(results[0].hits[0].component, Some(ComponentKind::Ammo));
        assert!(results[0].explosions.is_empty());
    }

    #[test]
    fn test_six_slot_location_skips_block_roll() {
        let rules = StandardRules::default();
        let unit = mech_with_ammo(&rules);
        let calc = CriticalHitsCalculator::new(&rules);
        // Roll 12 (three hits) in a leg: three slot rolls only.
        let mut dice = ScriptedDiceRoller::new([6, 6, 1, 2, 6]);
        let results = calc.for_structure_damage(&unit, &damage_at(PartLocation::LeftLeg, 1), &mut dice);
        let kinds: Vec<_> = results[0].hits.iter().map(|h| h.component).collect();
        assert_eq!(
            kinds,
            vec![Some(ComponentKind::Hip), Some(ComponentKind::UpperLegActuator), None]
        );
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    fn test_forced_heat_explosion() {
        let rules = StandardRules::default();
        let unit = mech_with_ammo(&rules);
        let calc = CriticalHitsCalculator::new(&rules);
        let result = calc.for_heat_explosion(&unit, PartLocation::LeftTorso, 0).unwrap();
        assert_eq!(result.roll, 0);
        assert_eq!(result.hit_count, 1);
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.explosions[0].damage, 40);
        assert_eq!(result.explosions[0].distribution[0].structure_damage, 12);
    }

    #[test]
    fn test_forced_hit_on_empty_slot_is_an_error() {
        let rules = StandardRules::default();
        let unit = mech_with_ammo(&rules);
        let calc = CriticalHitsCalculator::new(&rules);
        assert!(matches!(
            calc.for_heat_explosion(&unit, PartLocation::LeftTorso, 11),
            Err(CombatError::UnknownComponent { .. })
        ));
    }
}
