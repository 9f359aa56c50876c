//! To-hit target numbers for weapon attacks.
//!
//! A [`ToHitBreakdown`] keeps every modifier separately so the client can
//! show the player why a shot is hard. The total is the 2d6 number the
//! attack must meet; [`IMPOSSIBLE_ROLL`](crate::dice::IMPOSSIBLE_ROLL) or
//! more, no line of sight, or a target out of range means an automatic
//! miss.

use serde::{Deserialize, Serialize};

use crate::dice::{is_impossible, success_percent};
use crate::error::{CombatError, Result};
use crate::map::{Arc, BattleMap, HexCoord, Terrain};
use crate::rules::{RangeBracket, RulesProvider};
use crate::unit::{ComponentKind, MovementMode, PartLocation, Unit};

/// Ranged weapon profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    /// Display name.
    pub name: String,
    /// Minimum range; 0 when the weapon has none.
    pub min_range: i32,
    /// Last hex of short range.
    pub short_range: i32,
    /// Last hex of medium range.
    pub medium_range: i32,
    /// Last hex of long range.
    pub long_range: i32,
    /// Damage per hit.
    pub damage: i32,
    /// Heat generated when fired.
    pub heat: i32,
}

impl Weapon {
    /// Range band for a shot at `distance` hexes.
    #[must_use]
    pub const fn bracket(&self, distance: i32) -> RangeBracket {
        if distance <= self.short_range {
            RangeBracket::Short
        } else if distance <= self.medium_range {
            RangeBracket::Medium
        } else if distance <= self.long_range {
            RangeBracket::Long
        } else {
            RangeBracket::OutOfRange
        }
    }

    /// Penalty for firing inside minimum range.
    #[must_use]
    pub const fn minimum_range_modifier(&self, distance: i32) -> i32 {
        if self.min_range > 0 && distance <= self.min_range {
            self.min_range - distance + 1
        } else {
            0
        }
    }
}

/// A declared weapon attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackDeclaration {
    /// Weapon fired.
    pub weapon: Weapon,
    /// Location the shot is aimed at, if any.
    pub aimed_location: Option<PartLocation>,
    /// Target is not the attacker's primary target this turn.
    pub is_secondary: bool,
}

/// Modifier from terrain in one hex along the line of fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainModifier {
    /// Hex the terrain is in.
    pub coord: HexCoord,
    /// Terrain found.
    pub terrain: Terrain,
    /// Signed contribution.
    pub value: i32,
}

/// A situational modifier with a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToHitModifier {
    /// Label.
    pub name: String,
    /// Signed contribution.
    pub value: i32,
}

/// Itemized to-hit number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToHitBreakdown {
    /// Attacker's gunnery skill.
    pub gunnery: i32,
    /// Attacker's movement this turn.
    pub attacker_movement: i32,
    /// Target's movement this turn.
    pub target_movement: i32,
    /// Hex distance to the target.
    pub distance: i32,
    /// Range band.
    pub range_bracket: RangeBracket,
    /// Range band modifier; 0 when out of range.
    pub range: i32,
    /// Minimum range penalty.
    pub minimum_range: i32,
    /// One entry per woods hex along the line, target hex included.
    pub terrain: Vec<TerrainModifier>,
    /// Attacker heat penalty.
    pub heat: i32,
    /// Damaged sensors penalty.
    pub sensor_damage: i32,
    /// Secondary target penalty.
    pub secondary_target: i32,
    /// Aimed shot modifier.
    pub aimed_shot: i32,
    /// Prone, immobile and jumping adjustments.
    pub other: Vec<ToHitModifier>,
    /// Sum of everything above.
    pub total: i32,
    /// Attack misses automatically.
    pub is_impossible: bool,
    /// Attacker can see the target.
    pub has_line_of_sight: bool,
}

impl ToHitBreakdown {
    /// Chance in percent that the attack hits.
    #[must_use]
    pub fn hit_probability(&self) -> f64 {
        if self.is_impossible {
            0.0
        } else {
            success_percent(self.total)
        }
    }
}

/// Builds to-hit breakdowns.
pub struct ToHitCalculator<'a> {
    rules: &'a dyn RulesProvider,
}

impl<'a> ToHitCalculator<'a> {
    /// Create a calculator over the given rules.
    #[must_use]
    pub fn new(rules: &'a dyn RulesProvider) -> Self {
        Self { rules }
    }

    /// To-hit number for `attacker` firing `attack` at `target`.
    ///
    /// Fails when the attacker has no pilot or either unit is off the map.
    pub fn calculate(
        &self,
        attacker: &Unit,
        target: &Unit,
        attack: &AttackDeclaration,
        map: &BattleMap,
    ) -> Result<ToHitBreakdown> {
        let pilot = attacker
            .pilot
            .as_ref()
            .ok_or(CombatError::MissingPilot(attacker.id))?;
        let from = attacker.position.ok_or(CombatError::NotDeployed(attacker.id))?;
        let to = target.position.ok_or(CombatError::NotDeployed(target.id))?;
        let t = self.rules.to_hit();

        let has_line_of_sight = map.has_line_of_sight(from, to);
        let distance = from.distance(to);
        let range_bracket = attack.weapon.bracket(distance);
        let range = self.rules.range_modifier(range_bracket).unwrap_or(0);
        let minimum_range = attack.weapon.minimum_range_modifier(distance);

        let terrain: Vec<TerrainModifier> = map
            .intervening_hexes(from, to)
            .into_iter()
            .filter_map(|(coord, hex)| {
                let value = self.rules.terrain_modifier(hex.terrain);
                (value != 0).then_some(TerrainModifier {
                    coord,
                    terrain: hex.terrain,
                    value,
                })
            })
            .collect();

        let sensor_hits = i32::try_from(attacker.destroyed_count(ComponentKind::Sensors)).unwrap_or(i32::MAX);
        let sensor_damage = sensor_hits.saturating_mul(t.sensor_hit).min(t.sensor_cap);

        let secondary_target = if attack.is_secondary {
            match from.arc_to(attacker.facing, to) {
                Arc::Front => t.secondary_front_arc,
                _ => t.secondary_other_arc,
            }
        } else {
            0
        };

        let aimed_shot = match attack.aimed_location {
            Some(PartLocation::Head) => t.aimed_head,
            Some(_) => t.aimed_other,
            None => 0,
        };

        let mut other = Vec::new();
        if attacker.is_prone {
            push(&mut other, "Attacker prone", t.attacker_prone);
        }
        if target.is_shutdown || !target.has_active_pilot() {
            push(&mut other, "Target immobile", t.target_immobile);
        }
        if target.movement.mode == MovementMode::Jumped {
            push(&mut other, "Target jumped", t.target_jumped);
        }
        if target.is_prone {
            if distance <= 1 {
                push(&mut other, "Target prone (adjacent)", t.target_prone_adjacent);
            } else {
                push(&mut other, "Target prone", t.target_prone_ranged);
            }
        }

        let attacker_movement = self.rules.attacker_movement_modifier(attacker.movement.mode);
        let target_movement = self.rules.target_movement_modifier(target.movement.hexes_moved);
        let heat = self.rules.heat_to_hit_modifier(attacker.heat);

        let total = [
            pilot.gunnery,
            attacker_movement,
            target_movement,
            range,
            minimum_range,
            heat,
            sensor_damage,
            secondary_target,
            aimed_shot,
        ]
        .into_iter()
        .chain(terrain.iter().map(|m| m.value))
        .chain(other.iter().map(|m| m.value))
        .fold(0_i32, i32::saturating_add);

        let impossible =
            !has_line_of_sight || range_bracket == RangeBracket::OutOfRange || is_impossible(total);

        tracing::debug!(
            attacker = %attacker.id,
            target = %target.id,
            weapon = %attack.weapon.name,
            distance,
            total,
            los = has_line_of_sight,
            impossible,
            "To-hit calculated"
        );

        Ok(ToHitBreakdown {
            gunnery: pilot.gunnery,
            attacker_movement,
            target_movement,
            distance,
            range_bracket,
            range,
            minimum_range,
            terrain,
            heat,
            sensor_damage,
            secondary_target,
            aimed_shot,
            other,
            total,
            is_impossible: impossible,
            has_line_of_sight,
        })
    }
}

fn push(modifiers: &mut Vec<ToHitModifier>, name: &str, value: i32) {
    if value != 0 {
        modifiers.push(ToHitModifier {
            name: name.to_string(),
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Facing, Hex};
    use crate::rules::StandardRules;
    use crate::unit::{Component, Pilot, UnitBuilder, UnitId};

    fn medium_laser() -> Weapon {
        Weapon {
            name: "Medium Laser".into(),
            min_range: 0,
            short_range: 3,
            medium_range: 6,
            long_range: 9,
            damage: 5,
            heat: 3,
        }
    }

    fn lrm() -> Weapon {
        Weapon {
            name: "LRM-10".into(),
            min_range: 6,
            short_range: 7,
            medium_range: 14,
            long_range: 21,
            damage: 1,
            heat: 4,
        }
    }

    fn shot(weapon: Weapon) -> AttackDeclaration {
        AttackDeclaration {
            weapon,
            aimed_location: None,
            is_secondary: false,
        }
    }

    fn pair(rules: &StandardRules, target_at: HexCoord) -> (Unit, Unit) {
        let attacker = UnitBuilder::mech(UnitId(1), "Attacker", 50, rules)
            .with_pilot(Pilot::new("A", 4, 5))
            .deployed_at(HexCoord::new(0, 0), Facing::NORTH)
            .build();
        let target = UnitBuilder::mech(UnitId(2), "Target", 50, rules)
            .with_pilot(Pilot::new("B", 4, 5))
            .deployed_at(target_at, Facing::new(3))
            .build();
        (attacker, target)
    }

    #[test]
    fn test_basic_short_range_shot() {
        let rules = StandardRules::default();
        let calc = ToHitCalculator::new(&rules);
        let (attacker, target) = pair(&rules, HexCoord::new(0, -3));
        let breakdown = calc.calculate(&attacker, &target, &shot(medium_laser()), &BattleMap::new()).unwrap();
        assert_eq!(breakdown.total, 4);
        assert_eq!(breakdown.range_bracket, RangeBracket::Short);
        assert!(!breakdown.is_impossible);
        assert!((breakdown.hit_probability() - 91.666).abs() < 0.01);
    }

    #[test]
    fn test_modifiers_stack() {
        let rules = StandardRules::default();
        let calc = ToHitCalculator::new(&rules);
        let (mut attacker, mut target) = pair(&rules, HexCoord::new(0, -5));
        attacker.movement.mode = MovementMode::Walked;
        attacker.heat = 13;
        target.movement.hexes_moved = 5;

        let mut attack = shot(medium_laser());
        attack.is_secondary = true;
        let breakdown = calc.calculate(&attacker, &target, &attack, &BattleMap::new()).unwrap();
        // 4 gunnery + 1 walked + 2 target + 2 medium + 2 heat + 1 secondary (front)
        assert_eq!(breakdown.secondary_target, 1);
        assert_eq!(breakdown.total, 12);
        assert!(!breakdown.is_impossible);
    }

    #[test]
    fn test_terrain_counts_every_hex() {
        let rules = StandardRules::default();
        let calc = ToHitCalculator::new(&rules);
        let (attacker, target) = pair(&rules, HexCoord::new(0, -3));
        let map = BattleMap::new()
            .with_hex(HexCoord::new(0, -1), Hex::new(Terrain::LightWoods, 0))
            .with_hex(HexCoord::new(0, -3), Hex::new(Terrain::LightWoods, 0));
        let breakdown = calc.calculate(&attacker, &target, &shot(medium_laser()), &map).unwrap();
        assert_eq!(breakdown.terrain.len(), 2);
        assert_eq!(breakdown.total, 6);
        assert!(breakdown.has_line_of_sight);
    }

    #[test]
    fn test_blocked_line_of_sight_is_impossible() {
        let rules = StandardRules::default();
        let calc = ToHitCalculator::new(&rules);
        let (attacker, target) = pair(&rules, HexCoord::new(0, -3));
        let map = BattleMap::new().with_hex(HexCoord::new(0, -1), Hex::new(Terrain::Clear, 3));
        let breakdown = calc.calculate(&attacker, &target, &shot(medium_laser()), &map).unwrap();
        assert!(!breakdown.has_line_of_sight);
        assert!(breakdown.is_impossible);
        assert_eq!(breakdown.hit_probability(), 0.0);
    }

    #[test]
    fn test_out_of_range_and_minimum_range() {
        let rules = StandardRules::default();
        let calc = ToHitCalculator::new(&rules);

        let (attacker, target) = pair(&rules, HexCoord::new(0, -10));
        let breakdown = calc.calculate(&attacker, &target, &shot(medium_laser()), &BattleMap::new()).unwrap();
        assert_eq!(breakdown.range_bracket, RangeBracket::OutOfRange);
        assert!(breakdown.is_impossible);

        let (attacker, target) = pair(&rules, HexCoord::new(0, -2));
        let breakdown = calc.calculate(&attacker, &target, &shot(lrm()), &BattleMap::new()).unwrap();
        assert_eq!(breakdown.minimum_range, 5);
        assert_eq!(breakdown.total, 9);
    }

    #[test]
    fn test_aimed_shots_and_sensors() {
        let rules = StandardRules::default();
        let calc = ToHitCalculator::new(&rules);
        let (_, target) = pair(&rules, HexCoord::new(0, -2));
        let mut attacker = UnitBuilder::mech(UnitId(1), "Attacker", 50, &rules)
            .with_component(PartLocation::Head, Component::new("Sensors", ComponentKind::Sensors, 1, 1))
            .with_component(PartLocation::Head, Component::new("Sensors", ComponentKind::Sensors, 4, 1))
            .with_pilot(Pilot::new("A", 4, 5))
            .deployed_at(HexCoord::new(0, 0), Facing::NORTH)
            .build();
        for component in &mut attacker.part_mut(PartLocation::Head).unwrap().components {
            component.is_destroyed = true;
        }

        let mut attack = shot(medium_laser());
        attack.aimed_location = Some(PartLocation::Head);
        let breakdown = calc.calculate(&attacker, &target, &attack, &BattleMap::new()).unwrap();
        assert_eq!(breakdown.sensor_damage, 4);
        assert_eq!(breakdown.aimed_shot, 3);
        assert_eq!(breakdown.total, 11);

        attack.aimed_location = Some(PartLocation::LeftArm);
        let breakdown = calc.calculate(&attacker, &target, &attack, &BattleMap::new()).unwrap();
        assert_eq!(breakdown.aimed_shot, -4);
    }

    #[test]
    fn test_prone_and_immobile_targets() {
        let rules = StandardRules::default();
        let calc = ToHitCalculator::new(&rules);
        let (attacker, mut target) = pair(&rules, HexCoord::new(0, -1));
        target.is_prone = true;
        target.is_shutdown = true;
        let breakdown = calc.calculate(&attacker, &target, &shot(medium_laser()), &BattleMap::new()).unwrap();
        // 4 - 4 immobile - 2 adjacent prone
        assert_eq!(breakdown.total, -2);
        assert_eq!(breakdown.other.len(), 2);
        assert_eq!(breakdown.hit_probability(), 100.0);
    }

    #[test]
    fn test_missing_pilot_is_fatal() {
        let rules = StandardRules::default();
        let calc = ToHitCalculator::new(&rules);
        let (mut attacker, target) = pair(&rules, HexCoord::new(0, -2));
        attacker.pilot = None;
        let err = calc
            .calculate(&attacker, &target, &shot(medium_laser()), &BattleMap::new())
            .unwrap_err();
        assert!(matches!(err, CombatError::MissingPilot(UnitId(1))));
    }
}
