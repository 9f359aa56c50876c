//! Fall resolution from critical hits and heavy damage.
//!
//! [`FallProcessor`] ties the piloting, falling-damage and transfer
//! calculators together. It walks a small state machine and records every
//! state it visits so a replay can show exactly how far resolution got:
//!
//! ```text
//! Idle -> TriggerCheck -> PsrRoll -> Done                       (PSR passed)
//! Idle -> TriggerCheck -> PsrRoll -> ApplyFallDamage
//!      -> PilotDamagePsr -> Done                                (unit fell)
//! ```

use serde::{Deserialize, Serialize};

use crate::damage::{DamageResult, DamageTransferCalculator};
use crate::dice::DiceRoller;
use crate::error::Result;
use crate::falling::{FallingDamageCalculator, FallingDamageData};
use crate::map::BattleMap;
use crate::psr::{PilotingSkillCalculator, PsrBreakdown, PsrOutcome, PsrRollType};
use crate::rules::RulesProvider;
use crate::unit::{ComponentKind, MovementMode, Unit, UnitId};

/// States of fall resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FallState {
    /// Nothing evaluated yet.
    Idle,
    /// Looking for a fall trigger.
    TriggerCheck,
    /// Rolling the piloting skill check.
    PsrRoll,
    /// The check failed; the unit is falling.
    ApplyFallDamage,
    /// Rolling to avoid pilot injury.
    PilotDamagePsr,
    /// Resolution finished.
    Done,
}

/// Cause of a piloting check, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FallTrigger {
    /// Gyro critical.
    GyroHit,
    /// Hip actuator critical.
    HipActuatorHit,
    /// Upper leg, lower leg or foot actuator critical.
    LegActuatorHit,
    /// Damage this phase reached the heavy damage threshold.
    HeavyDamage,
}

impl FallTrigger {
    /// Trigger raised by a critical hit on `kind`, if any.
    #[must_use]
    pub const fn from_component(kind: ComponentKind) -> Option<Self> {
        match kind {
            ComponentKind::Gyro => Some(Self::GyroHit),
            ComponentKind::Hip => Some(Self::HipActuatorHit),
            ComponentKind::UpperLegActuator | ComponentKind::LowerLegActuator | ComponentKind::FootActuator => {
                Some(Self::LegActuatorHit)
            }
            _ => None,
        }
    }

    /// Roll type requested for this trigger.
    #[must_use]
    pub const fn roll_type(self) -> PsrRollType {
        match self {
            Self::GyroHit => PsrRollType::GyroHit,
            Self::HipActuatorHit => PsrRollType::HipActuatorHit,
            Self::LegActuatorHit => PsrRollType::LegActuatorHit,
            Self::HeavyDamage => PsrRollType::HeavyDamage,
        }
    }
}

/// Everything that happened while deciding whether a unit falls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallResult {
    /// Game the fall belongs to.
    pub game_id: String,
    /// Unit checked.
    pub unit_id: UnitId,
    /// States visited, in order.
    pub states: Vec<FallState>,
    /// Trigger that forced the check.
    pub trigger: FallTrigger,
    /// Target of the piloting check.
    pub psr: PsrBreakdown,
    /// Result of the piloting check.
    pub psr_outcome: PsrOutcome,
    /// Falling damage, when the check failed.
    pub falling_damage: Option<FallingDamageData>,
    /// Where each falling-damage cluster landed.
    pub damage: Vec<DamageResult>,
    /// Target of the pilot injury check, when the unit fell.
    pub pilot_damage_psr: Option<PsrBreakdown>,
    /// Result of the pilot injury check, when the unit fell.
    pub pilot_damage_outcome: Option<PsrOutcome>,
}

impl FallResult {
    /// Whether the unit fell.
    #[must_use]
    pub fn fell(&self) -> bool {
        !self.psr_outcome.success
    }

    /// Whether the pilot is injured by the fall.
    #[must_use]
    pub fn pilot_takes_damage(&self) -> bool {
        self.falling_damage.as_ref().is_some_and(|f| f.pilot_takes_damage)
    }
}

/// Decides falls from critical hits and damage totals.
pub struct FallProcessor<'a> {
    rules: &'a dyn RulesProvider,
    psr: PilotingSkillCalculator<'a>,
    falling: FallingDamageCalculator<'a>,
    transfer: DamageTransferCalculator,
}

impl<'a> FallProcessor<'a> {
    /// Create a processor over the given rules.
    #[must_use]
    pub fn new(rules: &'a dyn RulesProvider) -> Self {
        Self {
            rules,
            psr: PilotingSkillCalculator::new(rules),
            falling: FallingDamageCalculator::new(rules),
            transfer: DamageTransferCalculator::new(),
        }
    }

    /// Highest-priority trigger for the given hits and damage, if any.
    #[must_use]
    pub fn trigger_for(&self, component_hits: &[ComponentKind], total_damage_dealt: i32) -> Option<FallTrigger> {
        let from_hits = component_hits.iter().filter_map(|&kind| FallTrigger::from_component(kind)).min();
        from_hits.or_else(|| {
            (total_damage_dealt >= self.rules.heavy_damage_threshold()).then_some(FallTrigger::HeavyDamage)
        })
    }

    /// Decide whether `unit` falls after taking `component_hits` and
    /// `total_damage_dealt` this phase.
    ///
    /// `unit` is expected to already carry this step's damage and critical
    /// hits; the components in `component_hits` are charged once, by their
    /// roll type (see [`PilotingSkillCalculator::get_psr_breakdown`]).
    ///
    /// Returns `Ok(None)` when nothing forces a check, including a gyro hit
    /// reported for a unit that has no gyro. Dice are consumed in order:
    /// the piloting check, then (on a fall) the facing roll, one roll per
    /// damage cluster and the pilot injury roll.
    pub fn process_potential_fall(
        &self,
        unit: &Unit,
        map: Option<&BattleMap>,
        component_hits: &[ComponentKind],
        total_damage_dealt: i32,
        game_id: &str,
        dice: &mut dyn DiceRoller,
    ) -> Result<Option<FallResult>> {
        let mut states = vec![FallState::Idle, FallState::TriggerCheck];

        let Some(trigger) = self.trigger_for(component_hits, total_damage_dealt) else {
            tracing::trace!(unit = %unit.id, "No fall trigger");
            return Ok(None);
        };
        if trigger == FallTrigger::GyroHit && !unit.has_component(ComponentKind::Gyro) {
            tracing::debug!(unit = %unit.id, "Gyro hit reported on a unit without a gyro; ignoring");
            return Ok(None);
        }

        states.push(FallState::PsrRoll);
        let damage = (trigger == FallTrigger::HeavyDamage).then_some(total_damage_dealt);
        let psr = self.psr.get_psr_breakdown(unit, &[trigger.roll_type()], map, damage)?;
        let psr_outcome = PsrOutcome::roll(&psr, dice);
        tracing::debug!(
            unit = %unit.id,
            ?trigger,
            target = psr.modified_skill,
            roll = psr_outcome.roll.map(|r| r.total()),
            success = psr_outcome.success,
            "Fall PSR"
        );

        let mut result = FallResult {
            game_id: game_id.to_string(),
            unit_id: unit.id,
            states,
            trigger,
            psr,
            psr_outcome,
            falling_damage: None,
            damage: Vec::new(),
            pilot_damage_psr: None,
            pilot_damage_outcome: None,
        };

        if psr_outcome.success {
            result.states.push(FallState::Done);
            return Ok(Some(result));
        }

        result.states.push(FallState::ApplyFallDamage);
        let levels = 0;
        let is_jumping = unit.movement.mode == MovementMode::Jumped;
        let pilot_psr =
            self.psr
                .get_psr_breakdown(unit, &[PsrRollType::FallPilotDamage { levels }], map, None)?;
        let falling = self.falling.calculate(unit, levels, is_jumping, &pilot_psr, dice)?;

        let mut applied = Vec::new();
        for cluster in &falling.clusters {
            let step = self
                .transfer
                .calculate(unit, cluster.location, cluster.damage, falling.hit_direction, &applied);
            applied.extend(step);
        }

        result.states.push(FallState::PilotDamagePsr);
        result.pilot_damage_outcome = Some(PsrOutcome {
            target: pilot_psr.modified_skill,
            roll: falling.pilot_damage_roll,
            success: !falling.pilot_takes_damage,
        });
        result.pilot_damage_psr = Some(pilot_psr);
        result.falling_damage = Some(falling);
        result.damage = applied;
        result.states.push(FallState::Done);

        tracing::debug!(
            game = game_id,
            unit = %unit.id,
            damage = result.falling_damage.as_ref().map_or(0, |f| f.total_damage),
            pilot_hit = result.pilot_takes_damage(),
            "Unit fell"
        );
        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDiceRoller;
    use crate::error::CombatError;
    use crate::map::{Facing, HexCoord};
    use crate::rules::StandardRules;
    use crate::unit::{Pilot, UnitBuilder};

    fn mech(rules: &StandardRules) -> Unit {
        UnitBuilder::mech(UnitId(3), "Hunchback", 50, rules)
            .with_standard_internals()
            .with_pilot(Pilot::new("Kell", 4, 4))
            .deployed_at(HexCoord::new(0, 0), Facing::NORTH)
            .build()
    }

    #[test]
    fn test_no_trigger_returns_none() {
        let rules = StandardRules::default();
        let processor = FallProcessor::new(&rules);
        let unit = mech(&rules);
        let mut dice = ScriptedDiceRoller::new([]);
        let result = processor
            .process_potential_fall(&unit, None, &[ComponentKind::HeatSink], 19, "g1", &mut dice)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_gyro_hit_without_gyro_is_ignored() {
        let rules = StandardRules::default();
        let processor = FallProcessor::new(&rules);
        let unit = UnitBuilder::mech(UnitId(3), "Bare", 50, &rules)
            .with_pilot(Pilot::new("Kell", 4, 4))
            .deployed_at(HexCoord::new(0, 0), Facing::NORTH)
            .build();
        let mut dice = ScriptedDiceRoller::new([]);
        let result = processor
            .process_potential_fall(&unit, None, &[ComponentKind::Gyro], 0, "g1", &mut dice)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_trigger_priority() {
        let rules = StandardRules::default();
        let processor = FallProcessor::new(&rules);
        assert_eq!(
            processor.trigger_for(&[ComponentKind::FootActuator, ComponentKind::Gyro], 30),
            Some(FallTrigger::GyroHit)
        );
        assert_eq!(
            processor.trigger_for(&[ComponentKind::LowerLegActuator, ComponentKind::Hip], 0),
            Some(FallTrigger::HipActuatorHit)
        );
        assert_eq!(processor.trigger_for(&[], 20), Some(FallTrigger::HeavyDamage));
        assert_eq!(processor.trigger_for(&[], 19), None);
    }

    #[test]
    fn test_passed_psr_stops_after_roll() {
        let rules = StandardRules::default();
        let processor = FallProcessor::new(&rules);
        let unit = mech(&rules);
        // target 4 + 3 = 7, roll 8
        let mut dice = ScriptedDiceRoller::new([4, 4]);
        let result = processor
            .process_potential_fall(&unit, None, &[ComponentKind::Gyro], 0, "g1", &mut dice)
            .unwrap()
            .unwrap();
        assert!(!result.fell());
        assert_eq!(result.psr.modified_skill, 7);
        assert_eq!(
            result.states,
            vec![FallState::Idle, FallState::TriggerCheck, FallState::PsrRoll, FallState::Done]
        );
        assert!(result.falling_damage.is_none());
        assert_eq!(result.unit_id, UnitId(3));
        assert_eq!(result.game_id, "g1");
    }

    #[test]
    fn test_failed_psr_runs_full_fall() {
        let rules = StandardRules::default();
        let processor = FallProcessor::new(&rules);
        let unit = mech(&rules);
        // PSR 6 vs 7 fails; facing 1; one 5-point cluster on CT (7); pilot 2 vs 4
        let mut dice = ScriptedDiceRoller::new([3, 3, 1, 3, 4, 1, 1]);
        let result = processor
            .process_potential_fall(&unit, None, &[ComponentKind::Gyro], 0, "g7", &mut dice)
            .unwrap()
            .unwrap();
        assert!(result.fell());
        assert_eq!(
            result.states,
            vec![
                FallState::Idle,
                FallState::TriggerCheck,
                FallState::PsrRoll,
                FallState::ApplyFallDamage,
                FallState::PilotDamagePsr,
                FallState::Done,
            ]
        );
        let falling = result.falling_damage.as_ref().unwrap();
        assert_eq!(falling.total_damage, 5);
        assert_eq!(result.damage.iter().map(DamageResult::total).sum::<i32>(), 5);
        assert!(!result.pilot_takes_damage());
        assert_eq!(result.pilot_damage_psr.as_ref().unwrap().modified_skill, 4);
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    fn test_heavy_damage_scales_modifier() {
        let rules = StandardRules::default();
        let processor = FallProcessor::new(&rules);
        let unit = mech(&rules);
        let mut dice = ScriptedDiceRoller::new([6, 6]);
        let result = processor
            .process_potential_fall(&unit, None, &[], 45, "g1", &mut dice)
            .unwrap()
            .unwrap();
        assert_eq!(result.trigger, FallTrigger::HeavyDamage);
        assert_eq!(result.psr.modified_skill, 6);
    }

    #[test]
    fn test_missing_pilot_propagates() {
        let rules = StandardRules::default();
        let processor = FallProcessor::new(&rules);
        let mut unit = mech(&rules);
        unit.pilot = None;
        let mut dice = ScriptedDiceRoller::new([]);
        let err = processor
            .process_potential_fall(&unit, None, &[ComponentKind::Hip], 0, "g1", &mut dice)
            .unwrap_err();
        assert!(matches!(err, CombatError::MissingPilot(_)));
    }
}
