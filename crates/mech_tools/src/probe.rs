//! One-off calculator runs against a generated mech.
//!
//! Each probe builds a standard mech from the rules' structure table, sets
//! up the requested situation and runs one calculator with a seeded
//! roller, so the same arguments always print the same result.

use serde::Serialize;

use mech_core::dice::SeededDiceRoller;
use mech_core::falling::{FallingDamageCalculator, FallingDamageData};
use mech_core::heat::{HeatEffectsCalculator, ShutdownCheck};
use mech_core::map::{BattleMap, Facing, Hex, HexCoord, Terrain};
use mech_core::psr::{PilotingSkillCalculator, PsrRollType};
use mech_core::rules::RulesProvider;
use mech_core::to_hit::{AttackDeclaration, ToHitBreakdown, ToHitCalculator, Weapon};
use mech_core::unit::{MovementMode, PartLocation, Pilot, Unit, UnitBuilder, UnitId};

use crate::{Result, ToolError};

/// Parameters for a fall probe.
#[derive(Debug, Clone)]
pub struct FallProbe {
    /// Mech tonnage.
    pub tonnage: u32,
    /// Levels fallen.
    pub levels: u32,
    /// Fall happened during a jump.
    pub jumping: bool,
    /// Pilot's piloting skill.
    pub piloting: i32,
    /// Dice seed.
    pub seed: u64,
}

/// Parameters for a heat probe.
#[derive(Debug, Clone)]
pub struct HeatProbe {
    /// Current heat.
    pub heat: i32,
    /// Pilot is unconscious.
    pub unconscious: bool,
    /// Turn number.
    pub turn: u32,
    /// Dice seed.
    pub seed: u64,
}

/// Heat probe output.
#[derive(Debug, Clone, Serialize)]
pub struct HeatReport {
    /// Shutdown check, if heat was high enough to need one.
    pub shutdown: Option<ShutdownCheck>,
    /// Whether a shut-down mech would restart on its own at this heat.
    pub auto_restart: bool,
}

/// Parameters for a to-hit probe.
#[derive(Debug, Clone)]
pub struct ToHitProbe {
    /// Hexes between attacker and target.
    pub distance: i32,
    /// Attacker gunnery.
    pub gunnery: i32,
    /// Attacker movement.
    pub attacker_movement: MovementMode,
    /// Hexes the target moved.
    pub target_moved: u32,
    /// Attacker heat.
    pub heat: i32,
    /// Light woods hexes on the line of fire, nearest the target.
    pub light_woods: u32,
    /// Weapon fired.
    pub weapon: Weapon,
}

fn probe_mech(rules: &dyn RulesProvider, id: u32, tonnage: u32, pilot: Pilot, position: HexCoord) -> Result<Unit> {
    if rules.internal_structure(tonnage, PartLocation::CenterTorso).is_none() {
        return Err(ToolError::InvalidProbe(format!("no structure row for {tonnage} tons")));
    }
    Ok(UnitBuilder::mech(UnitId(id), format!("Probe {id}"), tonnage, rules)
        .with_standard_internals()
        .with_pilot(pilot)
        .deployed_at(position, Facing::NORTH)
        .build())
}

/// Resolve falling damage for a mech falling `levels` levels.
///
/// # Errors
///
/// Returns an error if the tonnage is not in the rules' structure table.
pub fn simulate_fall(rules: &dyn RulesProvider, probe: &FallProbe) -> Result<FallingDamageData> {
    let unit = probe_mech(
        rules,
        1,
        probe.tonnage,
        Pilot::new("Probe", 4, probe.piloting),
        HexCoord::new(0, 0),
    )?;
    let psr = PilotingSkillCalculator::new(rules).get_psr_breakdown(
        &unit,
        &[PsrRollType::FallPilotDamage { levels: probe.levels }],
        None,
        None,
    )?;
    let mut dice = SeededDiceRoller::new(probe.seed);
    let data = FallingDamageCalculator::new(rules).calculate(&unit, probe.levels, probe.jumping, &psr, &mut dice)?;
    tracing::info!(total = data.total_damage, clusters = data.clusters.len(), "Fall simulated");
    Ok(data)
}

/// Check heat shutdown and restart for a mech at `heat`.
///
/// # Errors
///
/// Returns an error if the probe mech cannot be built.
pub fn heat_check(rules: &dyn RulesProvider, probe: &HeatProbe) -> Result<HeatReport> {
    let mut pilot = Pilot::new("Probe", 4, 5);
    pilot.is_conscious = !probe.unconscious;
    let mut unit = probe_mech(rules, 1, 50, pilot, HexCoord::new(0, 0))?;
    unit.heat = probe.heat;

    let calc = HeatEffectsCalculator::new(rules);
    let mut dice = SeededDiceRoller::new(probe.seed);
    Ok(HeatReport {
        shutdown: calc.check_for_heat_shutdown(&unit, probe.turn, &mut dice),
        auto_restart: calc.should_auto_restart(&unit),
    })
}

/// To-hit breakdown for a straight shot due north.
///
/// # Errors
///
/// Returns an error if the distance is not positive or the probe mechs
/// cannot be built.
pub fn to_hit(rules: &dyn RulesProvider, probe: &ToHitProbe) -> Result<ToHitBreakdown> {
    if probe.distance <= 0 {
        return Err(ToolError::InvalidProbe("distance must be positive".to_string()));
    }
    let mut attacker = probe_mech(rules, 1, 50, Pilot::new("Shooter", probe.gunnery, 5), HexCoord::new(0, 0))?;
    attacker.movement.mode = probe.attacker_movement;
    attacker.heat = probe.heat;

    let target_at = HexCoord::new(0, -probe.distance);
    let mut target = probe_mech(rules, 2, 50, Pilot::new("Target", 4, 5), target_at)?;
    target.movement.hexes_moved = probe.target_moved;

    let mut map = BattleMap::new();
    let woods = i32::try_from(probe.light_woods).unwrap_or(i32::MAX).min(probe.distance);
    for step in 0..woods {
        map.set(HexCoord::new(0, -probe.distance + step), Hex::new(Terrain::LightWoods, 0));
    }

    let attack = AttackDeclaration {
        weapon: probe.weapon.clone(),
        aimed_location: None,
        is_secondary: false,
    };
    Ok(ToHitCalculator::new(rules).calculate(&attacker, &target, &attack, &map)?)
}
