//! Piloting skill roll (PSR) target numbers.

use serde::{Deserialize, Serialize};

use crate::dice::{is_impossible, DiceRoll, DiceRoller};
use crate::error::{CombatError, Result};
use crate::map::{BattleMap, Terrain};
use crate::rules::{PsrModifierKind, RulesProvider};
use crate::unit::{ComponentKind, Unit};

/// Reason a piloting roll is being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PsrRollType {
    /// Gyro struck by a critical hit.
    GyroHit,
    /// Hip actuator struck by a critical hit.
    HipActuatorHit,
    /// Upper/lower leg or foot actuator struck by a critical hit.
    LegActuatorHit,
    /// Damage in one phase reached the heavy damage threshold.
    HeavyDamage,
    /// Avoiding pilot injury after a fall.
    FallPilotDamage {
        /// Levels fallen.
        levels: u32,
    },
}

impl PsrRollType {
    /// Component the unit must have for this roll to make sense.
    #[must_use]
    pub const fn required_component(self) -> Option<ComponentKind> {
        match self {
            PsrRollType::GyroHit => Some(ComponentKind::Gyro),
            PsrRollType::HipActuatorHit => Some(ComponentKind::Hip),
            PsrRollType::LegActuatorHit => Some(ComponentKind::LowerLegActuator),
            PsrRollType::HeavyDamage | PsrRollType::FallPilotDamage { .. } => None,
        }
    }
}

/// One named contribution to a PSR target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsrModifier {
    /// Category.
    pub kind: PsrModifierKind,
    /// Human-readable label.
    pub name: String,
    /// Signed contribution.
    pub value: i32,
}

/// Itemized piloting skill roll target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsrBreakdown {
    /// Roll types the breakdown covers.
    pub roll_types: Vec<PsrRollType>,
    /// Pilot's piloting skill.
    pub base_skill: i32,
    /// Modifiers applied on top.
    pub modifiers: Vec<PsrModifier>,
    /// Base plus every modifier.
    pub modified_skill: i32,
    /// Target cannot be rolled on 2d6.
    pub is_impossible: bool,
}

impl PsrBreakdown {
    /// Build from a base and modifier list, computing the total.
    #[must_use]
    pub fn new(roll_types: Vec<PsrRollType>, base_skill: i32, modifiers: Vec<PsrModifier>) -> Self {
        let modified_skill = modifiers
            .iter()
            .fold(base_skill, |total, m| total.saturating_add(m.value));
        Self {
            roll_types,
            base_skill,
            modifiers,
            modified_skill,
            is_impossible: is_impossible(modified_skill),
        }
    }

    /// Sum of modifier values.
    #[must_use]
    pub fn modifier_total(&self) -> i32 {
        self.modifiers.iter().map(|m| m.value).sum()
    }
}

/// A rolled (or automatically failed) PSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsrOutcome {
    /// Target rolled against.
    pub target: i32,
    /// Dice, absent when the target was impossible.
    pub roll: Option<DiceRoll>,
    /// Whether the roll met the target.
    pub success: bool,
}

impl PsrOutcome {
    /// Roll against a breakdown; impossible targets fail without rolling.
    pub fn roll(breakdown: &PsrBreakdown, dice: &mut dyn DiceRoller) -> Self {
        if breakdown.is_impossible {
            return Self {
                target: breakdown.modified_skill,
                roll: None,
                success: false,
            };
        }
        let roll = dice.roll_2d6();
        Self {
            target: breakdown.modified_skill,
            roll: Some(roll),
            success: roll.meets(breakdown.modified_skill),
        }
    }
}

/// Builds PSR breakdowns from unit state and roll reasons.
pub struct PilotingSkillCalculator<'a> {
    rules: &'a dyn RulesProvider,
}

impl<'a> PilotingSkillCalculator<'a> {
    /// Create a calculator over the given rules.
    #[must_use]
    pub fn new(rules: &'a dyn RulesProvider) -> Self {
        Self { rules }
    }

    /// Target number for a PSR covering `roll_types`.
    ///
    /// Standing damage (gyro, leg actuators, legs, pilot wounds) always
    /// applies; each requested roll type adds its own modifier once.
    /// `map` supplies terrain under the unit and `damage` scales the heavy
    /// damage modifier per full threshold reached.
    ///
    /// `unit` is expected to already carry this step's critical hits. The
    /// component behind a requested hit roll type (gyro, hip, leg actuator)
    /// is charged by that roll type only, so one destroyed component of
    /// that kind is left out of the standing damage.
    pub fn get_psr_breakdown(
        &self,
        unit: &Unit,
        roll_types: &[PsrRollType],
        map: Option<&BattleMap>,
        damage: Option<i32>,
    ) -> Result<PsrBreakdown> {
        let pilot = unit.pilot.as_ref().ok_or(CombatError::MissingPilot(unit.id))?;

        for &roll_type in roll_types {
            if let Some(component) = roll_type.required_component() {
                let present = match roll_type {
                    PsrRollType::LegActuatorHit => unit.components().any(|(_, c)| {
                        c.kind.is_leg_actuator() && c.kind != ComponentKind::Hip
                    }),
                    _ => unit.has_component(component),
                };
                if !present {
                    return Err(CombatError::MissingComponent {
                        unit: unit.id,
                        roll_type,
                        component,
                    });
                }
            }
        }

        let mut modifiers = Vec::new();
        self.standing_modifiers(unit, roll_types, &mut modifiers);

        let mut seen = Vec::with_capacity(roll_types.len());
        for &roll_type in roll_types {
            if seen.contains(&roll_type) {
                continue;
            }
            seen.push(roll_type);
            self.roll_type_modifier(roll_type, damage, &mut modifiers);
        }

        if let (Some(map), Some(position)) = (map, unit.position) {
            match map.hex(position).terrain {
                Terrain::Rough => self.push(&mut modifiers, PsrModifierKind::RoughTerrain, "Rough terrain", 1),
                Terrain::Rubble => self.push(&mut modifiers, PsrModifierKind::Rubble, "Rubble", 1),
                _ => {}
            }
        }

        let breakdown = PsrBreakdown::new(seen, pilot.piloting, modifiers);
        tracing::debug!(
            unit = %unit.id,
            base = breakdown.base_skill,
            target = breakdown.modified_skill,
            impossible = breakdown.is_impossible,
            "PSR breakdown"
        );
        Ok(breakdown)
    }

    fn standing_modifiers(&self, unit: &Unit, roll_types: &[PsrRollType], modifiers: &mut Vec<PsrModifier>) {
        let current = |roll_type: PsrRollType| u32::from(roll_types.contains(&roll_type));

        let gyros = unit
            .destroyed_count(ComponentKind::Gyro)
            .saturating_sub(current(PsrRollType::GyroHit));
        if gyros > 0 {
            self.push(modifiers, PsrModifierKind::DamagedGyro, "Damaged gyro", 1);
        }
        let hips = unit
            .destroyed_count(ComponentKind::Hip)
            .saturating_sub(current(PsrRollType::HipActuatorHit));
        if hips > 0 {
            self.push(modifiers, PsrModifierKind::DestroyedHip, "Destroyed hip actuator", hips as i32);
        }
        let actuators = (unit
            .components()
            .filter(|(_, c)| c.is_destroyed && c.kind.is_leg_actuator() && c.kind != ComponentKind::Hip)
            .count() as u32)
            .saturating_sub(current(PsrRollType::LegActuatorHit)) as i32;
        if actuators > 0 {
            self.push(
                modifiers,
                PsrModifierKind::DestroyedLegActuator,
                "Destroyed leg actuator",
                actuators,
            );
        }
        let legs = unit
            .parts
            .values()
            .filter(|p| p.location.is_leg() && p.is_destroyed())
            .count() as i32;
        if legs > 0 {
            self.push(modifiers, PsrModifierKind::DestroyedLeg, "Destroyed leg", legs);
        }
        if let Some(pilot) = &unit.pilot {
            if pilot.wounds > 0 {
                self.push(modifiers, PsrModifierKind::PilotWound, "Pilot wounds", i32::from(pilot.wounds));
            }
        }
    }

    fn roll_type_modifier(&self, roll_type: PsrRollType, damage: Option<i32>, modifiers: &mut Vec<PsrModifier>) {
        match roll_type {
            PsrRollType::GyroHit => self.push(modifiers, PsrModifierKind::GyroHit, "Gyro hit", 1),
            PsrRollType::HipActuatorHit => self.push(modifiers, PsrModifierKind::HipHit, "Hip actuator hit", 1),
            PsrRollType::LegActuatorHit => {
                self.push(modifiers, PsrModifierKind::LegActuatorHit, "Leg actuator hit", 1);
            }
            PsrRollType::HeavyDamage => {
                let threshold = self.rules.heavy_damage_threshold().max(1);
                let times = damage.map_or(1, |d| (d / threshold).max(1));
                self.push(modifiers, PsrModifierKind::HeavyDamage, "Heavy damage", times);
            }
            PsrRollType::FallPilotDamage { levels } => {
                if levels > 0 {
                    let levels = i32::try_from(levels).unwrap_or(i32::MAX);
                    self.push(modifiers, PsrModifierKind::FallLevel, "Levels fallen", levels);
                }
            }
        }
    }

    /// Append `times` occurrences of `kind`, skipping zero-valued rules.
    fn push(&self, modifiers: &mut Vec<PsrModifier>, kind: PsrModifierKind, name: &str, times: i32) {
        let value = self.rules.psr_modifier(kind).saturating_mul(times);
        if value != 0 {
            modifiers.push(PsrModifier {
                kind,
                name: name.to_string(),
                value,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDiceRoller;
    use crate::map::{Facing, Hex, HexCoord};
    use crate::rules::StandardRules;
    use crate::unit::{Pilot, Part, PartLocation, UnitBuilder, UnitId, UnitKind};

    fn mech(rules: &StandardRules, piloting: i32) -> Unit {
        UnitBuilder::mech(UnitId(1), "Wolverine", 55, rules)
            .with_standard_internals()
            .with_pilot(Pilot::new("Grayson", 4, piloting))
            .deployed_at(HexCoord::new(0, 0), Facing::NORTH)
            .build()
    }

    #[test]
    fn test_gyro_hit_target() {
        let rules = StandardRules::default();
        let calc = PilotingSkillCalculator::new(&rules);
        let unit = mech(&rules, 4);
        let breakdown = calc
            .get_psr_breakdown(&unit, &[PsrRollType::GyroHit], None, None)
            .unwrap();
        assert_eq!(breakdown.base_skill, 4);
        assert_eq!(breakdown.modifier_total(), 3);
        assert_eq!(breakdown.modified_skill, 7);
        assert!(!breakdown.is_impossible);

        let fail = PsrOutcome::roll(&breakdown, &mut ScriptedDiceRoller::from_totals([6]));
        assert!(!fail.success);
        let pass = PsrOutcome::roll(&breakdown, &mut ScriptedDiceRoller::from_totals([8]));
        assert!(pass.success);
    }

    #[test]
    fn test_gyro_hit_already_applied_not_charged_twice() {
        let rules = StandardRules::default();
        let calc = PilotingSkillCalculator::new(&rules);
        let mut unit = mech(&rules, 4);
        for part in unit.parts.values_mut() {
            for component in &mut part.components {
                if component.kind == ComponentKind::Gyro {
                    component.is_destroyed = true;
                }
            }
        }

        let breakdown = calc
            .get_psr_breakdown(&unit, &[PsrRollType::GyroHit], None, None)
            .unwrap();
        assert_eq!(breakdown.modified_skill, 7);
        assert_eq!(breakdown.modifiers.len(), 1);
        assert_eq!(breakdown.modifiers[0].kind, PsrModifierKind::GyroHit);

        // Any other roll still feels the damaged gyro.
        let breakdown = calc
            .get_psr_breakdown(&unit, &[PsrRollType::HeavyDamage], None, Some(20))
            .unwrap();
        assert_eq!(breakdown.modified_skill, 4 + 3 + 1);
    }

    #[test]
    fn test_hip_hit_already_applied_not_charged_twice() {
        let rules = StandardRules::default();
        let calc = PilotingSkillCalculator::new(&rules);
        let mut unit = mech(&rules, 5);
        for part in unit.parts.values_mut() {
            for component in &mut part.components {
                if component.kind == ComponentKind::Hip {
                    component.is_destroyed = true;
                }
            }
        }
        let breakdown = calc
            .get_psr_breakdown(&unit, &[PsrRollType::HipActuatorHit], None, None)
            .unwrap();
        // Hip hit +2, plus the other leg's earlier hip +2.
        assert_eq!(breakdown.modified_skill, 5 + 2 + 2);
    }

    #[test]
    fn test_missing_gyro_is_an_error() {
        let rules = StandardRules::default();
        let calc = PilotingSkillCalculator::new(&rules);
        let unit = UnitBuilder::mech(UnitId(2), "Bare", 55, &rules)
            .with_pilot(Pilot::new("P", 4, 5))
            .build();
        let err = calc
            .get_psr_breakdown(&unit, &[PsrRollType::GyroHit], None, None)
            .unwrap_err();
        assert!(matches!(
            err,
            CombatError::MissingComponent {
                component: ComponentKind::Gyro,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_pilot_is_an_error() {
        let rules = StandardRules::default();
        let calc = PilotingSkillCalculator::new(&rules);
        let unit = UnitBuilder::blank(UnitId(3), "Drone", UnitKind::Vehicle, 20).build();
        assert!(matches!(
            calc.get_psr_breakdown(&unit, &[PsrRollType::HeavyDamage], None, None),
            Err(CombatError::MissingPilot(_))
        ));
    }

    #[test]
    fn test_standing_damage_applies_to_every_roll() {
        let rules = StandardRules::default();
        let calc = PilotingSkillCalculator::new(&rules);
        let mut unit = mech(&rules, 5);
        for part in unit.parts.values_mut() {
            for component in &mut part.components {
                if component.kind == ComponentKind::FootActuator && part.location == PartLocation::LeftLeg {
                    component.is_destroyed = true;
                }
            }
        }
        unit.parts.insert(PartLocation::RightLeg, {
            let mut leg = Part::new(PartLocation::RightLeg, 0, 0, 13);
            leg.structure = 0;
            leg
        });
        unit.pilot.as_mut().unwrap().wounds = 2;

        let breakdown = calc
            .get_psr_breakdown(&unit, &[PsrRollType::HeavyDamage], None, Some(20))
            .unwrap();
        // foot +1, leg +5, wounds +2, heavy damage +1
        assert_eq!(breakdown.modified_skill, 5 + 1 + 5 + 2 + 1);
        assert!(breakdown.is_impossible);
        let outcome = PsrOutcome::roll(&breakdown, &mut ScriptedDiceRoller::new([]));
        assert!(outcome.roll.is_none());
        assert!(!outcome.success);
    }

    #[test]
    fn test_heavy_damage_scales_with_damage() {
        let rules = StandardRules::default();
        let calc = PilotingSkillCalculator::new(&rules);
        let unit = mech(&rules, 5);
        let breakdown = calc
            .get_psr_breakdown(&unit, &[PsrRollType::HeavyDamage], None, Some(45))
            .unwrap();
        assert_eq!(breakdown.modifier_total(), 2);
    }

    #[test]
    fn test_duplicate_roll_types_counted_once() {
        let rules = StandardRules::default();
        let calc = PilotingSkillCalculator::new(&rules);
        let unit = mech(&rules, 5);
        let breakdown = calc
            .get_psr_breakdown(&unit, &[PsrRollType::GyroHit, PsrRollType::GyroHit], None, None)
            .unwrap();
        assert_eq!(breakdown.modified_skill, 8);
        assert_eq!(breakdown.roll_types, vec![PsrRollType::GyroHit]);
    }

    #[test]
    fn test_terrain_under_unit() {
        let rules = StandardRules::default();
        let calc = PilotingSkillCalculator::new(&rules);
        let unit = mech(&rules, 5);
        let map = BattleMap::new().with_hex(HexCoord::new(0, 0), Hex::new(Terrain::Rough, 0));
        let breakdown = calc
            .get_psr_breakdown(&unit, &[PsrRollType::LegActuatorHit], Some(&map), None)
            .unwrap();
        assert_eq!(breakdown.modified_skill, 7);
    }

    #[test]
    fn test_fall_pilot_damage_levels() {
        let rules = StandardRules::default();
        let calc = PilotingSkillCalculator::new(&rules);
        let unit = mech(&rules, 5);
        let breakdown = calc
            .get_psr_breakdown(&unit, &[PsrRollType::FallPilotDamage { levels: 2 }], None, None)
            .unwrap();
        assert_eq!(breakdown.modified_skill, 7);
    }
}
