//! Damage transfer through a unit's body.
//!
//! Damage consumes armor, then structure. Whatever a destroyed location
//! cannot hold flows along [`PartLocation::transfer_location`] until it
//! reaches the center torso, where any remainder is dropped.
//!
//! Several hits can land on one location in the same resolution step before
//! the orchestrator applies any of them. Callers pass the results already
//! produced in the step so armor is never spent twice.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::map::{Arc, HexCoord};
use crate::rules::HitDirection;
use crate::unit::{PartLocation, Unit};

/// Damage applied to one location by one resolution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageResult {
    /// Location struck.
    pub location: PartLocation,
    /// Armor points removed.
    pub armor_damage: i32,
    /// Structure points removed.
    pub structure_damage: i32,
    /// Whether the armor removed was rear armor.
    pub is_rear_armor: bool,
    /// Whether this damage leaves the location with no structure.
    pub is_location_destroyed: bool,
}

impl DamageResult {
    /// Armor plus structure damage.
    #[must_use]
    pub const fn total(&self) -> i32 {
        self.armor_damage.saturating_add(self.structure_damage)
    }
}

/// Side of `target` facing an attacker at `attacker_position`.
#[must_use]
pub fn hit_direction(target: &Unit, attacker_position: HexCoord) -> HitDirection {
    let Some(position) = target.position else {
        return HitDirection::Front;
    };
    match position.arc_to(target.facing, attacker_position) {
        Arc::Front => HitDirection::Front,
        Arc::Left => HitDirection::Left,
        Arc::Right => HitDirection::Right,
        Arc::Rear => HitDirection::Rear,
    }
}

/// Structure damage per location, summed over `results`.
#[must_use]
pub fn structure_damage_by_location(results: &[DamageResult]) -> BTreeMap<PartLocation, i32> {
    let mut totals = BTreeMap::new();
    for result in results.iter().filter(|r| r.structure_damage > 0) {
        *totals.entry(result.location).or_insert(0) += result.structure_damage;
    }
    totals
}

/// Stateless damage transfer resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct DamageTransferCalculator;

impl DamageTransferCalculator {
    /// Create the calculator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolve a weapon or physical hit.
    ///
    /// Returns one entry per location that absorbed damage, in the order
    /// visited. Empty for non-positive damage or a location the unit lacks.
    #[must_use]
    pub fn calculate(
        &self,
        unit: &Unit,
        location: PartLocation,
        damage: i32,
        direction: HitDirection,
        already_applied: &[DamageResult],
    ) -> Vec<DamageResult> {
        let rear = direction == HitDirection::Rear;
        self.resolve(unit, location, damage, Some(rear), already_applied)
    }

    /// Resolve an internal explosion: armor is bypassed everywhere along
    /// the chain.
    #[must_use]
    pub fn calculate_explosion(
        &self,
        unit: &Unit,
        location: PartLocation,
        damage: i32,
        already_applied: &[DamageResult],
    ) -> Vec<DamageResult> {
        self.resolve(unit, location, damage, None, already_applied)
    }

    /// `armor_side` is `None` for explosions, otherwise whether rear armor
    /// takes the hit.
    fn resolve(
        &self,
        unit: &Unit,
        start: PartLocation,
        damage: i32,
        armor_side: Option<bool>,
        already_applied: &[DamageResult],
    ) -> Vec<DamageResult> {
        let mut results = Vec::new();
        if damage <= 0 {
            return results;
        }

        let mut remaining = damage;
        let mut current = Some(start);

        while let Some(location) = current {
            let Some(part) = unit.part(location) else {
                tracing::trace!(unit = %unit.id, ?location, "Location missing, damage dropped");
                break;
            };

            let uses_rear = armor_side == Some(true) && location.has_rear_armor();
            let (prior_armor, prior_structure) = prior_damage(already_applied, location, uses_rear);

            let effective_structure = part.structure.saturating_sub(prior_structure).max(0);
            if effective_structure == 0 {
                tracing::trace!(unit = %unit.id, ?location, remaining, "Location already destroyed, transferring");
                current = location.transfer_location();
                continue;
            }

            let effective_armor = match armor_side {
                Some(_) => part.armor_facing(uses_rear).saturating_sub(prior_armor).max(0),
                None => 0,
            };

            let armor_damage = remaining.min(effective_armor);
            let past_armor = remaining - armor_damage;
            let structure_damage = past_armor.min(effective_structure);
            let excess = past_armor - structure_damage;
            let destroyed = structure_damage == effective_structure;

            results.push(DamageResult {
                location,
                armor_damage,
                structure_damage,
                is_rear_armor: uses_rear,
                is_location_destroyed: destroyed,
            });

            tracing::trace!(
                unit = %unit.id,
                ?location,
                armor_damage,
                structure_damage,
                destroyed,
                excess,
                "Damage applied to location"
            );

            if !destroyed || excess <= 0 {
                break;
            }
            remaining = excess;
            current = location.transfer_location();
        }

        if current.is_none() && !results.is_empty() {
            tracing::debug!(unit = %unit.id, "Damage reached the center torso sink");
        }
        results
    }
}

/// Armor (matching side) and structure already spent on `location` this step.
fn prior_damage(already_applied: &[DamageResult], location: PartLocation, rear: bool) -> (i32, i32) {
    already_applied
        .iter()
        .filter(|r| r.location == location)
        .fold((0i32, 0i32), |(armor, structure), r| {
            let armor = if r.is_rear_armor == rear {
                armor.saturating_add(r.armor_damage)
            } else {
                armor
            };
            (armor, structure.saturating_add(r.structure_damage))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Facing;
    use crate::unit::{Part, UnitBuilder, UnitId, UnitKind};

    fn test_unit() -> Unit {
        UnitBuilder::blank(UnitId(7), "Target", UnitKind::Mech, 50)
            .with_part(Part::new(PartLocation::CenterTorso, 2, 4, 8))
            .with_part(Part::new(PartLocation::LeftTorso, 3, 2, 5))
            .with_part(Part::new(PartLocation::LeftArm, 2, 0, 3))
            .build()
    }

    #[test]
    fn test_non_positive_damage_is_empty() {
        let calc = DamageTransferCalculator::new();
        let unit = test_unit();
        assert!(calc.calculate(&unit, PartLocation::CenterTorso, 0, HitDirection::Front, &[]).is_empty());
        assert!(calc.calculate(&unit, PartLocation::CenterTorso, -4, HitDirection::Front, &[]).is_empty());
    }

    #[test]
    fn test_missing_location_is_empty() {
        let calc = DamageTransferCalculator::new();
        let unit = test_unit();
        assert!(calc.calculate(&unit, PartLocation::RightLeg, 5, HitDirection::Front, &[]).is_empty());
    }

    #[test]
    fn test_armor_absorbs_first() {
        let calc = DamageTransferCalculator::new();
        let unit = test_unit();
        let results = calc.calculate(&unit, PartLocation::CenterTorso, 2, HitDirection::Front, &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].armor_damage, 2);
        assert_eq!(results[0].structure_damage, 0);
        assert!(!results[0].is_location_destroyed);
    }

    #[test]
    fn test_same_step_hits_do_not_double_spend_armor() {
        let calc = DamageTransferCalculator::new();
        let unit = test_unit();
        let first = calc.calculate(&unit, PartLocation::CenterTorso, 5, HitDirection::Front, &[]);
        let second = calc.calculate(&unit, PartLocation::CenterTorso, 4, HitDirection::Front, &first);

        assert_eq!(first[0].armor_damage, 2);
        assert_eq!(first[0].structure_damage, 3);
        assert_eq!(second[0].armor_damage, 0);
        assert_eq!(second[0].structure_damage, 4);

        let armor: i32 = first.iter().chain(&second).map(|r| r.armor_damage).sum();
        let structure: i32 = first.iter().chain(&second).map(|r| r.structure_damage).sum();
        assert_eq!((armor, structure), (2, 7));
    }

    #[test]
    fn test_rear_hit_uses_rear_armor_on_torso_only() {
        let calc = DamageTransferCalculator::new();
        let unit = test_unit();
        let torso = calc.calculate(&unit, PartLocation::CenterTorso, 3, HitDirection::Rear, &[]);
        assert!(torso[0].is_rear_armor);
        assert_eq!(torso[0].armor_damage, 3);

        let arm = calc.calculate(&unit, PartLocation::LeftArm, 1, HitDirection::Rear, &[]);
        assert!(!arm[0].is_rear_armor);
    }

    #[test]
    fn test_rear_damage_does_not_consume_front_armor_budget() {
        let calc = DamageTransferCalculator::new();
        let unit = test_unit();
        let rear = calc.calculate(&unit, PartLocation::CenterTorso, 4, HitDirection::Rear, &[]);
        let front = calc.calculate(&unit, PartLocation::CenterTorso, 2, HitDirection::Front, &rear);
        assert_eq!(front[0].armor_damage, 2);
        assert_eq!(front[0].structure_damage, 0);
    }

    #[test]
    fn test_transfer_chain_to_center_torso() {
        let calc = DamageTransferCalculator::new();
        let unit = test_unit();
        // Arm 2+3, torso 3+5, center 2+8 = 23 capacity; 30 leaves 7 dropped.
        let results = calc.calculate(&unit, PartLocation::LeftArm, 30, HitDirection::Front, &[]);
        let locations: Vec<_> = results.iter().map(|r| r.location).collect();
        assert_eq!(
            locations,
            vec![PartLocation::LeftArm, PartLocation::LeftTorso, PartLocation::CenterTorso]
        );
        assert!(results.iter().all(|r| r.is_location_destroyed));
        let total: i32 = results.iter().map(DamageResult::total).sum();
        assert_eq!(total, 23);
    }

    #[test]
    fn test_destroyed_location_forwards_full_damage() {
        let calc = DamageTransferCalculator::new();
        let mut unit = test_unit();
        unit.part_mut(PartLocation::LeftArm).unwrap().structure = 0;
        let results = calc.calculate(&unit, PartLocation::LeftArm, 4, HitDirection::Front, &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].location, PartLocation::LeftTorso);
        assert_eq!(results[0].armor_damage, 3);
        assert_eq!(results[0].structure_damage, 1);
    }

    #[test]
    fn test_location_destroyed_earlier_in_step_forwards() {
        let calc = DamageTransferCalculator::new();
        let unit = test_unit();
        let first = calc.calculate(&unit, PartLocation::LeftArm, 5, HitDirection::Front, &[]);
        assert!(first[0].is_location_destroyed);
        let second = calc.calculate(&unit, PartLocation::LeftArm, 2, HitDirection::Front, &first);
        assert_eq!(second[0].location, PartLocation::LeftTorso);
    }

    #[test]
    fn test_explosion_bypasses_armor() {
        let calc = DamageTransferCalculator::new();
        let unit = test_unit();
        let results = calc.calculate_explosion(&unit, PartLocation::LeftTorso, 9, &[]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].structure_damage, 5);
        assert_eq!(results[1].location, PartLocation::CenterTorso);
        assert_eq!(results[1].structure_damage, 4);
        assert!(results.iter().all(|r| r.armor_damage == 0 && !r.is_rear_armor));
    }

    #[test]
    fn test_saturating_damage_clamps_to_capacity() {
        let calc = DamageTransferCalculator::new();
        let unit = test_unit();
        let results = calc.calculate(&unit, PartLocation::CenterTorso, i32::MAX, HitDirection::Front, &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].armor_damage, 2);
        assert_eq!(results[0].structure_damage, 8);
        assert!(results[0].is_location_destroyed);
    }

    #[test]
    fn test_hit_direction_from_positions() {
        let rules = crate::rules::StandardRules::default();
        let target = UnitBuilder::mech(UnitId(1), "T", 50, &rules)
            .deployed_at(HexCoord::new(0, 0), Facing::NORTH)
            .build();
        assert_eq!(hit_direction(&target, HexCoord::new(0, -5)), HitDirection::Front);
        assert_eq!(hit_direction(&target, HexCoord::new(0, 5)), HitDirection::Rear);
        assert_eq!(hit_direction(&target, HexCoord::new(3, -1)), HitDirection::Right);
        assert_eq!(hit_direction(&target, HexCoord::new(-3, 1)), HitDirection::Left);
    }
}
