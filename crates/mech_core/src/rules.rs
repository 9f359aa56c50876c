//! Rule constants behind the [`RulesProvider`] seam.
//!
//! [`RulesConfig`] holds every table the calculators consult. Its
//! `Default` is the standard ruleset; a RON file may override any subset
//! of fields. [`StandardRules`] wraps a validated config and answers the
//! provider queries.
//!
//! # Example RON
//!
//! ```ron
//! (
//!     heavy_damage_threshold: 20,
//!     shutdown: [(from: 14, value: 4), (from: 18, value: 6)],
//!     automatic_shutdown_heat: 30,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CombatError, Result};
use crate::map::Terrain;
use crate::unit::{MovementMode, PartLocation};

/// Side of a unit an attack or fall strikes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HitDirection {
    /// Struck from the front.
    #[default]
    Front,
    /// Struck from the left side.
    Left,
    /// Struck from the right side.
    Right,
    /// Struck from behind; torsos use rear armor.
    Rear,
}

/// Range band of a weapon shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeBracket {
    /// Short range.
    Short,
    /// Medium range.
    Medium,
    /// Long range.
    Long,
    /// Beyond long range; the shot cannot be taken.
    OutOfRange,
}

/// Outcome band for heat-induced shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShutdownThreshold {
    /// Heat too low to matter.
    None,
    /// Shutdown unless 2d6 meets the avoid number.
    Avoid(i32),
    /// Shutdown with no roll.
    Automatic,
}

/// Piloting-skill modifier categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PsrModifierKind {
    /// Gyro took a critical hit this phase.
    GyroHit,
    /// Gyro already damaged.
    DamagedGyro,
    /// Hip actuator took a critical hit this phase.
    HipHit,
    /// Non-hip leg actuator took a critical hit this phase.
    LegActuatorHit,
    /// Each previously destroyed hip.
    DestroyedHip,
    /// Each previously destroyed non-hip leg actuator.
    DestroyedLegActuator,
    /// Each destroyed leg.
    DestroyedLeg,
    /// Heavy damage in a single phase.
    HeavyDamage,
    /// Each wound the pilot carries.
    PilotWound,
    /// Each level fallen, for pilot damage avoidance.
    FallLevel,
    /// Unit stands in rough ground.
    RoughTerrain,
    /// Unit stands in rubble.
    Rubble,
}

/// Lower-bounded step table entry: applies from `from` upward until the
/// next entry begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    /// First value this entry covers.
    pub from: i32,
    /// Value the entry yields.
    pub value: i32,
}

impl Bracket {
    /// Create a bracket entry.
    #[must_use]
    pub const fn new(from: i32, value: i32) -> Self {
        Self { from, value }
    }
}

/// Look up the entry covering `x` in an ascending bracket table.
#[must_use]
pub fn bracket_value(table: &[Bracket], x: i32) -> Option<i32> {
    table
        .iter()
        .take_while(|bracket| bracket.from <= x)
        .last()
        .map(|bracket| bracket.value)
}

/// Internal structure for one tonnage class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRow {
    /// Unit tonnage.
    pub tonnage: u32,
    /// Center torso structure.
    pub center_torso: i32,
    /// Left/right torso structure.
    pub side_torso: i32,
    /// Arm structure.
    pub arm: i32,
    /// Leg structure.
    pub leg: i32,
}

const fn row(tonnage: u32, center_torso: i32, side_torso: i32, arm: i32, leg: i32) -> StructureRow {
    StructureRow {
        tonnage,
        center_torso,
        side_torso,
        arm,
        leg,
    }
}

/// Hit-location tables keyed by 2d6 (index 0 is a roll of 2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitTables {
    /// Attacks from the front.
    pub front: Vec<PartLocation>,
    /// Attacks from the rear.
    pub rear: Vec<PartLocation>,
    /// Attacks from the left.
    pub left: Vec<PartLocation>,
    /// Attacks from the right.
    pub right: Vec<PartLocation>,
}

impl Default for HitTables {
    fn default() -> Self {
        use PartLocation::*;
        let front = vec![
            CenterTorso, RightArm, RightArm, RightLeg, RightTorso, CenterTorso, LeftTorso,
            LeftLeg, LeftArm, LeftArm, Head,
        ];
        Self {
            rear: front.clone(),
            front,
            left: vec![
                LeftTorso, LeftLeg, LeftArm, LeftArm, LeftLeg, LeftTorso, CenterTorso,
                RightTorso, RightArm, RightLeg, Head,
            ],
            right: vec![
                RightTorso, RightLeg, RightArm, RightArm, RightLeg, RightTorso, CenterTorso,
                LeftTorso, LeftArm, LeftLeg, Head,
            ],
        }
    }
}

/// To-hit modifier tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToHitModifiers {
    /// Attacker did not move.
    pub attacker_stationary: i32,
    /// Attacker walked.
    pub attacker_walked: i32,
    /// Attacker ran.
    pub attacker_ran: i32,
    /// Attacker jumped.
    pub attacker_jumped: i32,
    /// Attacker is prone.
    pub attacker_prone: i32,
    /// Target movement by hexes moved.
    pub target_movement: Vec<Bracket>,
    /// Extra modifier when the target jumped.
    pub target_jumped: i32,
    /// Prone target attacked from an adjacent hex.
    pub target_prone_adjacent: i32,
    /// Prone target attacked from further away.
    pub target_prone_ranged: i32,
    /// Shutdown target or target with an unconscious pilot.
    pub target_immobile: i32,
    /// Short range band.
    pub short_range: i32,
    /// Medium range band.
    pub medium_range: i32,
    /// Long range band.
    pub long_range: i32,
    /// Light woods in an intervening or target hex.
    pub light_woods: i32,
    /// Heavy woods in an intervening or target hex.
    pub heavy_woods: i32,
    /// Attacker heat brackets.
    pub heat: Vec<Bracket>,
    /// Per sensor critical.
    pub sensor_hit: i32,
    /// Maximum total sensor penalty.
    pub sensor_cap: i32,
    /// Secondary target in the front arc.
    pub secondary_front_arc: i32,
    /// Secondary target in any other arc.
    pub secondary_other_arc: i32,
    /// Aimed shot at the head.
    pub aimed_head: i32,
    /// Aimed shot at any other location.
    pub aimed_other: i32,
}

impl Default for ToHitModifiers {
    fn default() -> Self {
        Self {
            attacker_stationary: 0,
            attacker_walked: 1,
            attacker_ran: 2,
            attacker_jumped: 3,
            attacker_prone: 2,
            target_movement: vec![
                Bracket::new(0, 0),
                Bracket::new(3, 1),
                Bracket::new(5, 2),
                Bracket::new(7, 3),
                Bracket::new(10, 4),
                Bracket::new(18, 5),
                Bracket::new(25, 6),
            ],
            target_jumped: 1,
            target_prone_adjacent: -2,
            target_prone_ranged: 1,
            target_immobile: -4,
            short_range: 0,
            medium_range: 2,
            long_range: 4,
            light_woods: 1,
            heavy_woods: 2,
            heat: vec![
                Bracket::new(8, 1),
                Bracket::new(13, 2),
                Bracket::new(17, 3),
                Bracket::new(24, 4),
            ],
            sensor_hit: 2,
            sensor_cap: 4,
            secondary_front_arc: 1,
            secondary_other_arc: 2,
            aimed_head: 3,
            aimed_other: -4,
        }
    }
}

/// Piloting skill roll modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsrModifiers {
    /// Gyro critical this phase.
    pub gyro_hit: i32,
    /// Previously damaged gyro.
    pub damaged_gyro: i32,
    /// Hip critical this phase.
    pub hip_hit: i32,
    /// Other leg actuator critical this phase.
    pub leg_actuator_hit: i32,
    /// Per destroyed hip.
    pub destroyed_hip: i32,
    /// Per destroyed non-hip leg actuator.
    pub destroyed_leg_actuator: i32,
    /// Per destroyed leg.
    pub destroyed_leg: i32,
    /// Heavy damage in one phase.
    pub heavy_damage: i32,
    /// Per pilot wound.
    pub pilot_wound: i32,
    /// Per level fallen, for pilot damage avoidance.
    pub fall_level: i32,
    /// Standing in rough ground.
    pub rough_terrain: i32,
    /// Standing in rubble.
    pub rubble: i32,
}

impl Default for PsrModifiers {
    fn default() -> Self {
        Self {
            gyro_hit: 3,
            damaged_gyro: 3,
            hip_hit: 2,
            leg_actuator_hit: 1,
            destroyed_hip: 2,
            destroyed_leg_actuator: 1,
            destroyed_leg: 5,
            heavy_damage: 1,
            pilot_wound: 1,
            fall_level: 1,
            rough_terrain: 1,
            rubble: 0,
        }
    }
}

/// Complete, serializable rule tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Head structure, independent of tonnage.
    pub head_structure: i32,
    /// Structure by tonnage, ascending.
    pub structure: Vec<StructureRow>,
    /// Hit-location tables.
    pub hit_tables: HitTables,
    /// Minimum 2d6 roll for 1, 2 and 3 critical hits.
    pub critical_hits: Vec<Bracket>,
    /// To-hit modifiers.
    pub to_hit: ToHitModifiers,
    /// Piloting skill modifiers.
    pub psr: PsrModifiers,
    /// Damage in one phase that forces a piloting roll.
    pub heavy_damage_threshold: i32,
    /// Shutdown avoid numbers by heat.
    pub shutdown: Vec<Bracket>,
    /// Heat at which shutdown needs no roll.
    pub automatic_shutdown_heat: i32,
    /// Heat below which a shutdown unit restarts on its own.
    pub auto_restart_below: i32,
    /// Ammunition explosion avoid numbers by heat.
    pub ammo_explosion: Vec<Bracket>,
    /// Falling damage per started ten tons.
    pub fall_damage_per_ten_tons: i32,
    /// Damage per falling-damage cluster.
    pub fall_cluster_size: i32,
    /// Consciousness target by wound count (index 0 is one wound).
    pub consciousness_numbers: Vec<i32>,
    /// Wounds that kill the pilot outright.
    pub lethal_wounds: u8,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            head_structure: 3,
            structure: vec![
                row(20, 6, 5, 3, 4),
                row(25, 8, 6, 4, 6),
                row(30, 10, 7, 5, 7),
                row(35, 11, 8, 6, 8),
                row(40, 12, 10, 6, 10),
                row(45, 14, 11, 7, 11),
                row(50, 16, 12, 8, 12),
                row(55, 18, 13, 9, 13),
                row(60, 20, 14, 10, 14),
                row(65, 21, 15, 10, 15),
                row(70, 22, 15, 11, 15),
                row(75, 23, 16, 12, 16),
                row(80, 25, 17, 13, 17),
                row(85, 27, 18, 14, 18),
                row(90, 29, 19, 15, 19),
                row(95, 30, 20, 16, 20),
                row(100, 31, 21, 17, 21),
            ],
            hit_tables: HitTables::default(),
            critical_hits: vec![Bracket::new(8, 1), Bracket::new(10, 2), Bracket::new(12, 3)],
            to_hit: ToHitModifiers::default(),
            psr: PsrModifiers::default(),
            heavy_damage_threshold: 20,
            shutdown: vec![
                Bracket::new(14, 4),
                Bracket::new(18, 6),
                Bracket::new(22, 8),
                Bracket::new(26, 10),
            ],
            automatic_shutdown_heat: 30,
            auto_restart_below: 14,
            ammo_explosion: vec![Bracket::new(19, 4), Bracket::new(23, 6), Bracket::new(28, 8)],
            fall_damage_per_ten_tons: 1,
            fall_cluster_size: 5,
            consciousness_numbers: vec![3, 5, 7, 10, 11],
            lethal_wounds: 6,
        }
    }
}

impl RulesConfig {
    /// Parse a (possibly partial) config from RON text.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| CombatError::RulesParse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| CombatError::RulesIo {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = ron::from_str(&source).map_err(|e| CombatError::RulesParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded rules config");
        Ok(config)
    }

    /// Check table shapes and ordering.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        for (name, table) in [
            ("front", &self.hit_tables.front),
            ("rear", &self.hit_tables.rear),
            ("left", &self.hit_tables.left),
            ("right", &self.hit_tables.right),
        ] {
            if table.len() != 11 {
                errors.push(format!("{name} hit table has {} entries, need 11", table.len()));
            }
        }

        for (name, table) in [
            ("critical_hits", &self.critical_hits),
            ("target_movement", &self.to_hit.target_movement),
            ("heat", &self.to_hit.heat),
            ("shutdown", &self.shutdown),
            ("ammo_explosion", &self.ammo_explosion),
        ] {
            if !table.windows(2).all(|w| w[0].from < w[1].from) {
                errors.push(format!("{name} brackets are not strictly ascending"));
            }
        }

        if self.critical_hits.iter().any(|b| !(2..=12).contains(&b.from)) {
            errors.push("critical_hits thresholds must lie in 2..=12".to_string());
        }
        if !self.structure.windows(2).all(|w| w[0].tonnage < w[1].tonnage) {
            errors.push("structure rows are not strictly ascending by tonnage".to_string());
        }
        if self.fall_cluster_size <= 0 {
            errors.push("fall_cluster_size must be positive".to_string());
        }
        if self
            .shutdown
            .last()
            .is_some_and(|b| b.from >= self.automatic_shutdown_heat)
        {
            errors.push("shutdown brackets overlap automatic_shutdown_heat".to_string());
        }
        if self.consciousness_numbers.len() + 1 < usize::from(self.lethal_wounds) {
            errors.push("consciousness_numbers must cover every survivable wound".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CombatError::InvalidRules(errors.join("; ")))
        }
    }
}

/// Read-only access to rule constants.
pub trait RulesProvider {
    /// Internal structure for a location of a unit of the given tonnage.
    /// `None` when the tonnage is not in the table.
    fn internal_structure(&self, tonnage: u32, location: PartLocation) -> Option<i32>;

    /// Location struck for a 2d6 roll from the given direction.
    fn hit_location(&self, direction: HitDirection, roll: i32) -> PartLocation;

    /// Number of critical hits a 2d6 roll produces.
    fn critical_hit_count(&self, roll: i32) -> u8;

    /// Modifier for the attacker's own movement.
    fn attacker_movement_modifier(&self, mode: MovementMode) -> i32;

    /// Modifier for how far the target moved.
    fn target_movement_modifier(&self, hexes_moved: u32) -> i32;

    /// Raw to-hit modifier tables.
    fn to_hit(&self) -> &ToHitModifiers;

    /// Modifier for a range bracket; `None` when out of range.
    fn range_modifier(&self, bracket: RangeBracket) -> Option<i32>;

    /// To-hit modifier for terrain in an intervening or target hex.
    fn terrain_modifier(&self, terrain: Terrain) -> i32;

    /// To-hit penalty from the attacker's heat.
    fn heat_to_hit_modifier(&self, heat: i32) -> i32;

    /// Piloting modifier for one occurrence of `kind`.
    fn psr_modifier(&self, kind: PsrModifierKind) -> i32;

    /// Damage in one phase that forces a piloting roll.
    fn heavy_damage_threshold(&self) -> i32;

    /// Shutdown band for the given heat.
    fn shutdown_threshold(&self, heat: i32) -> ShutdownThreshold;

    /// Heat below which a shutdown unit restarts automatically.
    fn auto_restart_below(&self) -> i32;

    /// Ammunition explosion avoid number for the given heat.
    fn ammo_explosion_avoid(&self, heat: i32) -> Option<i32>;

    /// Damage per started ten tons when falling.
    fn fall_damage_per_ten_tons(&self) -> i32;

    /// Damage per falling-damage cluster.
    fn fall_cluster_size(&self) -> i32;

    /// Consciousness target for a pilot with `wounds` wounds; `None` once
    /// the wounds are lethal or when unwounded.
    fn consciousness_number(&self, wounds: u8) -> Option<i32>;

    /// Wound count that kills the pilot.
    fn lethal_wounds(&self) -> u8;
}

/// Standard ruleset backed by a validated [`RulesConfig`].
#[derive(Debug, Clone, Default)]
pub struct StandardRules {
    config: RulesConfig,
}

impl StandardRules {
    /// Wrap a config after validating it.
    pub fn new(config: RulesConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Load rules from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            config: RulesConfig::load(path)?,
        })
    }

    /// Underlying tables.
    #[must_use]
    pub const fn config(&self) -> &RulesConfig {
        &self.config
    }
}

impl RulesProvider for StandardRules {
    fn internal_structure(&self, tonnage: u32, location: PartLocation) -> Option<i32> {
        if location == PartLocation::Head {
            return Some(self.config.head_structure);
        }
        let row = self.config.structure.iter().find(|r| r.tonnage == tonnage)?;
        Some(match location {
            PartLocation::Head => self.config.head_structure,
            PartLocation::CenterTorso => row.center_torso,
            PartLocation::LeftTorso | PartLocation::RightTorso => row.side_torso,
            PartLocation::LeftArm | PartLocation::RightArm => row.arm,
            PartLocation::LeftLeg | PartLocation::RightLeg => row.leg,
        })
    }

    fn hit_location(&self, direction: HitDirection, roll: i32) -> PartLocation {
        let table = match direction {
            HitDirection::Front => &self.config.hit_tables.front,
            HitDirection::Rear => &self.config.hit_tables.rear,
            HitDirection::Left => &self.config.hit_tables.left,
            HitDirection::Right => &self.config.hit_tables.right,
        };
        let index = (roll.clamp(2, 12) - 2) as usize;
        table
            .get(index)
            .copied()
            .unwrap_or(PartLocation::CenterTorso)
    }

    fn critical_hit_count(&self, roll: i32) -> u8 {
        bracket_value(&self.config.critical_hits, roll).map_or(0, |hits| hits as u8)
    }

    fn attacker_movement_modifier(&self, mode: MovementMode) -> i32 {
        let t = &self.config.to_hit;
        match mode {
            MovementMode::Stationary => t.attacker_stationary,
            MovementMode::Walked => t.attacker_walked,
            MovementMode::Ran => t.attacker_ran,
            MovementMode::Jumped => t.attacker_jumped,
        }
    }

    fn target_movement_modifier(&self, hexes_moved: u32) -> i32 {
        let hexes = i32::try_from(hexes_moved).unwrap_or(i32::MAX);
        bracket_value(&self.config.to_hit.target_movement, hexes).unwrap_or(0)
    }

    fn to_hit(&self) -> &ToHitModifiers {
        &self.config.to_hit
    }

    fn range_modifier(&self, bracket: RangeBracket) -> Option<i32> {
        let t = &self.config.to_hit;
        match bracket {
            RangeBracket::Short => Some(t.short_range),
            RangeBracket::Medium => Some(t.medium_range),
            RangeBracket::Long => Some(t.long_range),
            RangeBracket::OutOfRange => None,
        }
    }

    fn terrain_modifier(&self, terrain: Terrain) -> i32 {
        match terrain {
            Terrain::LightWoods => self.config.to_hit.light_woods,
            Terrain::HeavyWoods => self.config.to_hit.heavy_woods,
            _ => 0,
        }
    }

    fn heat_to_hit_modifier(&self, heat: i32) -> i32 {
        bracket_value(&self.config.to_hit.heat, heat).unwrap_or(0)
    }

    fn psr_modifier(&self, kind: PsrModifierKind) -> i32 {
        let p = &self.config.psr;
        match kind {
            PsrModifierKind::GyroHit => p.gyro_hit,
            PsrModifierKind::DamagedGyro => p.damaged_gyro,
            PsrModifierKind::HipHit => p.hip_hit,
            PsrModifierKind::LegActuatorHit => p.leg_actuator_hit,
            PsrModifierKind::DestroyedHip => p.destroyed_hip,
            PsrModifierKind::DestroyedLegActuator => p.destroyed_leg_actuator,
            PsrModifierKind::DestroyedLeg => p.destroyed_leg,
            PsrModifierKind::HeavyDamage => p.heavy_damage,
            PsrModifierKind::PilotWound => p.pilot_wound,
            PsrModifierKind::FallLevel => p.fall_level,
            PsrModifierKind::RoughTerrain => p.rough_terrain,
            PsrModifierKind::Rubble => p.rubble,
        }
    }

    fn heavy_damage_threshold(&self) -> i32 {
        self.config.heavy_damage_threshold
    }

    fn shutdown_threshold(&self, heat: i32) -> ShutdownThreshold {
        if heat >= self.config.automatic_shutdown_heat {
            return ShutdownThreshold::Automatic;
        }
        bracket_value(&self.config.shutdown, heat)
            .map_or(ShutdownThreshold::None, ShutdownThreshold::Avoid)
    }

    fn auto_restart_below(&self) -> i32 {
        self.config.auto_restart_below
    }

    fn ammo_explosion_avoid(&self, heat: i32) -> Option<i32> {
        bracket_value(&self.config.ammo_explosion, heat)
    }

    fn fall_damage_per_ten_tons(&self) -> i32 {
        self.config.fall_damage_per_ten_tons
    }

    fn fall_cluster_size(&self) -> i32 {
        self.config.fall_cluster_size
    }

    fn consciousness_number(&self, wounds: u8) -> Option<i32> {
        if wounds == 0 || wounds >= self.config.lethal_wounds {
            return None;
        }
        self.config
            .consciousness_numbers
            .get(usize::from(wounds) - 1)
            .copied()
    }

    fn lethal_wounds(&self) -> u8 {
        self.config.lethal_wounds
    }
}
