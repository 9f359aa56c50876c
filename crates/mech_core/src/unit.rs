//! Units, their body locations, mounted components and pilots.
//!
//! A [`Unit`] exclusively owns its [`Part`]s. Calculators only read this
//! state; the `apply_*` methods are how an orchestrator folds result
//! records back in, once per event.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consciousness::ConsciousnessRollResult;
use crate::critical::CriticalHitResult;
use crate::damage::DamageResult;
use crate::fall::FallResult;
use crate::map::{Facing, HexCoord};
use crate::rules::RulesProvider;

/// Unique identifier for a unit within one battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Broad unit class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UnitKind {
    /// Bipedal battle mech.
    #[default]
    Mech,
    /// Tracked or wheeled vehicle.
    Vehicle,
    /// Battle armor or infantry.
    Infantry,
}

/// Body location of a mech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PartLocation {
    /// Head.
    Head,
    /// Center torso; the final damage sink.
    CenterTorso,
    /// Left torso.
    LeftTorso,
    /// Right torso.
    RightTorso,
    /// Left arm.
    LeftArm,
    /// Right arm.
    RightArm,
    /// Left leg.
    LeftLeg,
    /// Right leg.
    RightLeg,
}

impl PartLocation {
    /// Every mech location.
    pub const ALL: [PartLocation; 8] = [
        PartLocation::Head,
        PartLocation::CenterTorso,
        PartLocation::LeftTorso,
        PartLocation::RightTorso,
        PartLocation::LeftArm,
        PartLocation::RightArm,
        PartLocation::LeftLeg,
        PartLocation::RightLeg,
    ];

    /// Next location to absorb damage once this one is destroyed.
    ///
    /// Limbs feed their side torso, side torsos and the head feed the
    /// center torso, and the center torso is the sink.
    #[must_use]
    pub const fn transfer_location(self) -> Option<PartLocation> {
        match self {
            PartLocation::LeftArm | PartLocation::LeftLeg => Some(PartLocation::LeftTorso),
            PartLocation::RightArm | PartLocation::RightLeg => Some(PartLocation::RightTorso),
            PartLocation::Head | PartLocation::LeftTorso | PartLocation::RightTorso => {
                Some(PartLocation::CenterTorso)
            }
            PartLocation::CenterTorso => None,
        }
    }

    /// Whether the location carries separate rear armor.
    #[must_use]
    pub const fn has_rear_armor(self) -> bool {
        matches!(
            self,
            PartLocation::CenterTorso | PartLocation::LeftTorso | PartLocation::RightTorso
        )
    }

    /// Whether the location is a leg.
    #[must_use]
    pub const fn is_leg(self) -> bool {
        matches!(self, PartLocation::LeftLeg | PartLocation::RightLeg)
    }

    /// Critical slots in the location.
    #[must_use]
    pub const fn slot_count(self) -> u8 {
        match self {
            PartLocation::Head | PartLocation::LeftLeg | PartLocation::RightLeg => 6,
            _ => 12,
        }
    }
}

/// What a component is, as far as combat rules care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Fusion engine.
    Engine,
    /// Gyroscope.
    Gyro,
    /// Cockpit.
    Cockpit,
    /// Life support.
    LifeSupport,
    /// Sensors.
    Sensors,
    /// Shoulder actuator.
    Shoulder,
    /// Upper arm actuator.
    UpperArmActuator,
    /// Lower arm actuator.
    LowerArmActuator,
    /// Hand actuator.
    HandActuator,
    /// Hip actuator.
    Hip,
    /// Upper leg actuator.
    UpperLegActuator,
    /// Lower leg actuator.
    LowerLegActuator,
    /// Foot actuator.
    FootActuator,
    /// Heat sink.
    HeatSink,
    /// Jump jet.
    JumpJet,
    /// Weapon.
    Weapon,
    /// Ammunition bin.
    Ammo,
}

impl ComponentKind {
    /// Any leg actuator, hip included.
    #[must_use]
    pub const fn is_leg_actuator(self) -> bool {
        matches!(
            self,
            ComponentKind::Hip
                | ComponentKind::UpperLegActuator
                | ComponentKind::LowerLegActuator
                | ComponentKind::FootActuator
        )
    }
}

/// Remaining rounds in an ammunition bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoBin {
    /// Shots left.
    pub remaining_shots: u32,
    /// Damage each shot deals.
    pub damage_per_shot: i32,
}

/// Equipment mounted in a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Display name.
    pub name: String,
    /// Rules category.
    pub kind: ComponentKind,
    /// First slot occupied.
    pub first_slot: u8,
    /// Contiguous slots occupied.
    pub slot_count: u8,
    /// Destroyed by a critical hit.
    pub is_destroyed: bool,
    /// Switched on.
    pub is_active: bool,
    /// Usable this turn.
    pub is_available: bool,
    /// Ammunition carried, for explodable bins.
    pub ammo: Option<AmmoBin>,
    /// Fixed explosion damage for components that burst without ammo.
    pub explosion_damage: Option<i32>,
    /// Already exploded.
    pub has_exploded: bool,
}

impl Component {
    /// Create an intact component.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ComponentKind, first_slot: u8, slot_count: u8) -> Self {
        Self {
            name: name.into(),
            kind,
            first_slot,
            slot_count: slot_count.max(1),
            is_destroyed: false,
            is_active: true,
            is_available: true,
            ammo: None,
            explosion_damage: None,
            has_exploded: false,
        }
    }

    /// Create an ammunition bin.
    #[must_use]
    pub fn ammo(name: impl Into<String>, first_slot: u8, remaining_shots: u32, damage_per_shot: i32) -> Self {
        let mut component = Self::new(name, ComponentKind::Ammo, first_slot, 1);
        component.ammo = Some(AmmoBin {
            remaining_shots,
            damage_per_shot,
        });
        component
    }

    /// Builder: make the component burst for a fixed amount when hit.
    #[must_use]
    pub fn with_explosion_damage(mut self, damage: i32) -> Self {
        self.explosion_damage = Some(damage);
        self
    }

    /// Whether the component occupies `slot`.
    #[must_use]
    pub fn occupies(&self, slot: u8) -> bool {
        slot >= self.first_slot && slot < self.first_slot.saturating_add(self.slot_count)
    }

    /// Whether the component can explode at all.
    #[must_use]
    pub const fn is_explodable(&self) -> bool {
        self.ammo.is_some() || self.explosion_damage.is_some()
    }

    /// Damage an explosion of this component would deal right now.
    ///
    /// `None` when it cannot explode: not explodable, already exploded,
    /// or an empty bin.
    #[must_use]
    pub fn pending_explosion_damage(&self) -> Option<i32> {
        if self.has_exploded {
            return None;
        }
        if let Some(bin) = self.ammo {
            let shots = i32::try_from(bin.remaining_shots).unwrap_or(i32::MAX);
            let damage = shots.saturating_mul(bin.damage_per_shot);
            return (damage > 0).then_some(damage);
        }
        self.explosion_damage.filter(|damage| *damage > 0)
    }
}

/// One body location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Which location this is.
    pub location: PartLocation,
    /// Current front armor.
    pub armor: i32,
    /// Maximum front armor.
    pub max_armor: i32,
    /// Current rear armor (torsos only).
    pub rear_armor: i32,
    /// Maximum rear armor (torsos only).
    pub max_rear_armor: i32,
    /// Current internal structure.
    pub structure: i32,
    /// Maximum internal structure.
    pub max_structure: i32,
    /// Critical slots.
    pub slot_count: u8,
    /// Mounted equipment.
    pub components: Vec<Component>,
}

impl Part {
    /// Create an undamaged location.
    #[must_use]
    pub fn new(location: PartLocation, armor: i32, rear_armor: i32, structure: i32) -> Self {
        let rear_armor = if location.has_rear_armor() { rear_armor.max(0) } else { 0 };
        Self {
            location,
            armor: armor.max(0),
            max_armor: armor.max(0),
            rear_armor,
            max_rear_armor: rear_armor,
            structure: structure.max(0),
            max_structure: structure.max(0),
            slot_count: location.slot_count(),
            components: Vec::new(),
        }
    }

    /// Whether internal structure is gone.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.structure <= 0
    }

    /// Current armor on the struck side.
    #[must_use]
    pub const fn armor_facing(&self, rear: bool) -> i32 {
        if rear && self.location.has_rear_armor() {
            self.rear_armor
        } else {
            self.armor
        }
    }

    /// Index of the component occupying `slot`.
    #[must_use]
    pub fn component_index_at(&self, slot: u8) -> Option<usize> {
        self.components.iter().position(|c| c.occupies(slot))
    }

    /// Component occupying `slot`.
    #[must_use]
    pub fn component_at(&self, slot: u8) -> Option<&Component> {
        self.component_index_at(slot).map(|i| &self.components[i])
    }
}

/// How a unit moved this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MovementMode {
    /// Did not move.
    #[default]
    Stationary,
    /// Walked.
    Walked,
    /// Ran.
    Ran,
    /// Jumped.
    Jumped,
}

/// Movement declared for the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MovementState {
    /// Movement type used.
    pub mode: MovementMode,
    /// Hexes entered.
    pub hexes_moved: u32,
}

/// MechWarrior at the controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pilot {
    /// Callsign.
    pub name: String,
    /// Gunnery skill; base to-hit number.
    pub gunnery: i32,
    /// Piloting skill; base PSR number.
    pub piloting: i32,
    /// Wounds taken.
    pub wounds: u8,
    /// Awake and in control.
    pub is_conscious: bool,
    /// Killed.
    pub is_dead: bool,
    /// Consciousness targets still to be rolled, oldest first.
    pub pending_consciousness_rolls: VecDeque<i32>,
}

impl Pilot {
    /// Create an unwounded pilot.
    #[must_use]
    pub fn new(name: impl Into<String>, gunnery: i32, piloting: i32) -> Self {
        Self {
            name: name.into(),
            gunnery,
            piloting,
            wounds: 0,
            is_conscious: true,
            is_dead: false,
            pending_consciousness_rolls: VecDeque::new(),
        }
    }

    /// Current consciousness target number.
    #[must_use]
    pub fn consciousness_number(&self, rules: &dyn RulesProvider) -> Option<i32> {
        rules.consciousness_number(self.wounds)
    }

    /// Record `hits` new wounds, queueing one consciousness roll per wound.
    pub fn apply_hits(&mut self, hits: u8, rules: &dyn RulesProvider) {
        if self.is_dead {
            return;
        }
        for _ in 0..hits {
            self.wounds = self.wounds.saturating_add(1);
            if self.wounds >= rules.lethal_wounds() {
                self.is_dead = true;
                self.is_conscious = false;
                self.pending_consciousness_rolls.clear();
                tracing::debug!(pilot = %self.name, "Pilot killed");
                return;
            }
            if let Some(target) = rules.consciousness_number(self.wounds) {
                self.pending_consciousness_rolls.push_back(target);
            }
        }
    }

    /// Fold consciousness roll results back in.
    ///
    /// The pending queue is cleared; a failed roll knocks the pilot out, a
    /// successful recovery roll wakes them.
    pub fn apply_consciousness_results(&mut self, results: &[ConsciousnessRollResult]) {
        for result in results {
            if result.is_recovery {
                if result.success {
                    self.is_conscious = true;
                }
            } else if !result.success {
                self.is_conscious = false;
            }
        }
        if results.iter().any(|r| !r.is_recovery) {
            self.pending_consciousness_rolls.clear();
        }
    }
}

/// A combat unit and everything the engine reads from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier.
    pub id: UnitId,
    /// Display name.
    pub name: String,
    /// Unit class.
    pub kind: UnitKind,
    /// Mass in tons.
    pub tonnage: u32,
    /// Body locations.
    pub parts: BTreeMap<PartLocation, Part>,
    /// Current heat.
    pub heat: i32,
    /// Pilot, if any.
    pub pilot: Option<Pilot>,
    /// Board position; `None` until deployed.
    pub position: Option<HexCoord>,
    /// Facing.
    pub facing: Facing,
    /// Movement this turn.
    pub movement: MovementState,
    /// Lying on the ground.
    pub is_prone: bool,
    /// Reactor shut down.
    pub is_shutdown: bool,
    /// Declared weapon targets (weapon name → target).
    pub weapon_targets: BTreeMap<String, UnitId>,
    /// Damage taken so far this phase.
    pub damage_this_phase: i32,
}

impl Unit {
    /// Create an empty unit with no parts.
    #[must_use]
    pub fn new(id: UnitId, name: impl Into<String>, kind: UnitKind, tonnage: u32) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            tonnage,
            parts: BTreeMap::new(),
            heat: 0,
            pilot: None,
            position: None,
            facing: Facing::NORTH,
            movement: MovementState::default(),
            is_prone: false,
            is_shutdown: false,
            weapon_targets: BTreeMap::new(),
            damage_this_phase: 0,
        }
    }

    /// Whether the unit is on the map.
    #[must_use]
    pub const fn is_deployed(&self) -> bool {
        self.position.is_some()
    }

    /// Location by name.
    #[must_use]
    pub fn part(&self, location: PartLocation) -> Option<&Part> {
        self.parts.get(&location)
    }

    /// Mutable location by name.
    pub fn part_mut(&mut self, location: PartLocation) -> Option<&mut Part> {
        self.parts.get_mut(&location)
    }

    /// Every mounted component with its location.
    pub fn components(&self) -> impl Iterator<Item = (PartLocation, &Component)> {
        self.parts
            .values()
            .flat_map(|part| part.components.iter().map(move |c| (part.location, c)))
    }

    /// Whether any component of `kind` is installed, destroyed or not.
    #[must_use]
    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.components().any(|(_, c)| c.kind == kind)
    }

    /// Destroyed components of `kind`; a multi-slot component counts once.
    #[must_use]
    pub fn destroyed_count(&self, kind: ComponentKind) -> u32 {
        self.components()
            .filter(|(_, c)| c.kind == kind && c.is_destroyed)
            .count() as u32
    }

    /// Pilot able to act: aboard, alive and conscious.
    #[must_use]
    pub fn has_active_pilot(&self) -> bool {
        self.pilot.as_ref().is_some_and(|p| p.is_conscious && !p.is_dead)
    }

    /// Target the first declared weapon is aimed at.
    #[must_use]
    pub fn primary_target(&self) -> Option<UnitId> {
        self.weapon_targets.values().next().copied()
    }

    /// Apply a damage transfer result list.
    pub fn apply_damage(&mut self, results: &[DamageResult]) {
        for result in results {
            let Some(part) = self.parts.get_mut(&result.location) else {
                tracing::warn!(unit = %self.id, location = ?result.location, "Damage for missing location");
                continue;
            };
            if result.is_rear_armor {
                part.rear_armor = (part.rear_armor - result.armor_damage).max(0);
            } else {
                part.armor = (part.armor - result.armor_damage).max(0);
            }
            part.structure = (part.structure - result.structure_damage).max(0);
            self.damage_this_phase = self
                .damage_this_phase
                .saturating_add(result.armor_damage)
                .saturating_add(result.structure_damage);
        }
        #[cfg(feature = "debug-validation")]
        self.check_invariants();
    }

    #[cfg(feature = "debug-validation")]
    fn check_invariants(&self) {
        for part in self.parts.values() {
            assert!(
                (0..=part.max_armor).contains(&part.armor)
                    && (0..=part.max_rear_armor).contains(&part.rear_armor)
                    && (0..=part.max_structure).contains(&part.structure),
                "unit {} {:?} out of bounds: {part:?}",
                self.id,
                part.location
            );
        }
    }

    /// Apply critical-hit results: destroy hit components, spend exploded
    /// ammunition and apply explosion damage.
    pub fn apply_critical_hits(&mut self, results: &[CriticalHitResult]) {
        for result in results {
            if let Some(part) = self.parts.get_mut(&result.location) {
                for hit in &result.hits {
                    if let Some(i) = part.component_index_at(hit.slot) {
                        part.components[i].is_destroyed = true;
                        part.components[i].is_active = false;
                        part.components[i].is_available = false;
                    }
                }
                for explosion in &result.explosions {
                    if let Some(i) = part.component_index_at(explosion.slot) {
                        let component = &mut part.components[i];
                        component.has_exploded = true;
                        if let Some(bin) = component.ammo.as_mut() {
                            bin.remaining_shots = 0;
                        }
                    }
                }
            }
            for explosion in &result.explosions {
                self.apply_damage(&explosion.distribution);
            }
        }
    }

    /// Apply a resolved fall: the unit goes prone at its new facing, takes
    /// the cluster damage and its pilot takes a wound if the injury check
    /// failed. A fall result for a passed check changes nothing.
    pub fn apply_fall(&mut self, result: &FallResult, rules: &dyn RulesProvider) {
        let Some(falling) = &result.falling_damage else {
            return;
        };
        self.is_prone = true;
        self.facing = falling.new_facing;
        self.apply_damage(&result.damage);
        if falling.pilot_takes_damage {
            if let Some(pilot) = self.pilot.as_mut() {
                pilot.apply_hits(1, rules);
            }
        }
    }

    /// Reset per-phase bookkeeping.
    pub fn start_phase(&mut self) {
        self.damage_this_phase = 0;
    }
}

/// Builder for fully armored mechs using the rules' structure table.
#[derive(Debug, Clone)]
pub struct UnitBuilder {
    unit: Unit,
}

impl UnitBuilder {
    /// Start a mech of the given tonnage with structure from `rules` and
    /// armor equal to twice its structure (torsos split 3:1 front/rear,
    /// head capped at 9). Tonnages missing from the table get no parts.
    #[must_use]
    pub fn mech(id: UnitId, name: impl Into<String>, tonnage: u32, rules: &dyn RulesProvider) -> Self {
        let mut unit = Unit::new(id, name, UnitKind::Mech, tonnage);
        for location in PartLocation::ALL {
            let Some(structure) = rules.internal_structure(tonnage, location) else {
                continue;
            };
            let armor = if location == PartLocation::Head { 9 } else { structure * 2 };
            let part = if location.has_rear_armor() {
                let rear = armor / 4;
                Part::new(location, armor - rear, rear, structure)
            } else {
                Part::new(location, armor, 0, structure)
            };
            unit.parts.insert(location, part);
        }
        Self { unit }
    }

    /// Start a unit of any kind with no parts.
    #[must_use]
    pub fn blank(id: UnitId, name: impl Into<String>, kind: UnitKind, tonnage: u32) -> Self {
        Self {
            unit: Unit::new(id, name, kind, tonnage),
        }
    }

    /// Replace a location outright.
    #[must_use]
    pub fn with_part(mut self, part: Part) -> Self {
        self.unit.parts.insert(part.location, part);
        self
    }

    /// Override a location's armor.
    #[must_use]
    pub fn with_armor(mut self, location: PartLocation, armor: i32, rear_armor: i32) -> Self {
        if let Some(part) = self.unit.parts.get_mut(&location) {
            part.armor = armor;
            part.max_armor = armor;
            if location.has_rear_armor() {
                part.rear_armor = rear_armor;
                part.max_rear_armor = rear_armor;
            }
        }
        self
    }

    /// Mount a component.
    #[must_use]
    pub fn with_component(mut self, location: PartLocation, component: Component) -> Self {
        if let Some(part) = self.unit.parts.get_mut(&location) {
            part.components.push(component);
        }
        self
    }

    /// Mount engine, gyro, cockpit, sensors, life support and actuators in
    /// their standard slots.
    #[must_use]
    pub fn with_standard_internals(self) -> Self {
        use ComponentKind::*;
        use PartLocation::*;
        let mut builder = self
            .with_component(Head, Component::new("Life Support", LifeSupport, 0, 1))
            .with_component(Head, Component::new("Sensors", Sensors, 1, 1))
            .with_component(Head, Component::new("Cockpit", Cockpit, 2, 1))
            .with_component(Head, Component::new("Sensors", Sensors, 4, 1))
            .with_component(Head, Component::new("Life Support", LifeSupport, 5, 1))
            .with_component(CenterTorso, Component::new("Engine", Engine, 0, 3))
            .with_component(CenterTorso, Component::new("Gyro", Gyro, 3, 4))
            .with_component(CenterTorso, Component::new("Engine", Engine, 7, 3));
        for arm in [LeftArm, RightArm] {
            builder = builder
                .with_component(arm, Component::new("Shoulder", Shoulder, 0, 1))
                .with_component(arm, Component::new("Upper Arm Actuator", UpperArmActuator, 1, 1))
                .with_component(arm, Component::new("Lower Arm Actuator", LowerArmActuator, 2, 1))
                .with_component(arm, Component::new("Hand Actuator", HandActuator, 3, 1));
        }
        for leg in [LeftLeg, RightLeg] {
            builder = builder
                .with_component(leg, Component::new("Hip", Hip, 0, 1))
                .with_component(leg, Component::new("Upper Leg Actuator", UpperLegActuator, 1, 1))
                .with_component(leg, Component::new("Lower Leg Actuator", LowerLegActuator, 2, 1))
                .with_component(leg, Component::new("Foot Actuator", FootActuator, 3, 1));
        }
        builder
    }

    /// Seat a pilot.
    #[must_use]
    pub fn with_pilot(mut self, pilot: Pilot) -> Self {
        self.unit.pilot = Some(pilot);
        self
    }

    /// Place the unit on the map.
    #[must_use]
    pub fn deployed_at(mut self, position: HexCoord, facing: Facing) -> Self {
        self.unit.position = Some(position);
        self.unit.facing = facing;
        self
    }

    /// Set this turn's movement.
    #[must_use]
    pub fn moved(mut self, mode: MovementMode, hexes_moved: u32) -> Self {
        self.unit.movement = MovementState { mode, hexes_moved };
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Unit {
        self.unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::StandardRules;

    #[test]
    fn test_transfer_chain_reaches_center_torso() {
        for location in PartLocation::ALL {
            let mut current = location;
            let mut steps = 0;
            while let Some(next) = current.transfer_location() {
                current = next;
                steps += 1;
                assert!(steps <= 2, "{location:?} chain too long");
            }
            assert_eq!(current, PartLocation::CenterTorso);
        }
    }

    #[test]
    fn test_builder_uses_structure_table() {
        let rules = StandardRules::default();
        let mech = UnitBuilder::mech(UnitId(1), "Test", 50, &rules).build();
        let ct = mech.part(PartLocation::CenterTorso).unwrap();
        assert_eq!(ct.max_structure, 16);
        assert_eq!(ct.armor + ct.rear_armor, 32);
        let arm = mech.part(PartLocation::LeftArm).unwrap();
        assert_eq!(arm.rear_armor, 0);
        assert_eq!(mech.part(PartLocation::Head).unwrap().armor, 9);
    }

    #[test]
    fn test_component_slots() {
        let rules = StandardRules::default();
        let mech = UnitBuilder::mech(UnitId(1), "Test", 50, &rules)
            .with_standard_internals()
            .build();
        let ct = mech.part(PartLocation::CenterTorso).unwrap();
        assert_eq!(ct.component_at(4).map(|c| c.kind), Some(ComponentKind::Gyro));
        assert_eq!(ct.component_at(9).map(|c| c.kind), Some(ComponentKind::Engine));
        assert!(ct.component_at(10).is_none());
        assert!(mech.has_component(ComponentKind::Gyro));
    }

    #[test]
    fn test_ammo_explosion_damage() {
        let mut bin = Component::ammo("AC/20 Ammo", 0, 5, 20);
        assert!(bin.is_explodable());
        assert_eq!(bin.pending_explosion_damage(), Some(100));
        bin.ammo = Some(AmmoBin {
            remaining_shots: 0,
            damage_per_shot: 20,
        });
        assert_eq!(bin.pending_explosion_damage(), None);

        let mut gauss = Component::new("Gauss Rifle", ComponentKind::Weapon, 0, 7).with_explosion_damage(20);
        assert_eq!(gauss.pending_explosion_damage(), Some(20));
        gauss.has_exploded = true;
        assert_eq!(gauss.pending_explosion_damage(), None);
    }

    #[test]
    fn test_pilot_wounds_queue_consciousness_rolls() {
        let rules = StandardRules::default();
        let mut pilot = Pilot::new("Natasha", 3, 4);
        pilot.apply_hits(2, &rules);
        assert_eq!(pilot.wounds, 2);
        assert_eq!(pilot.pending_consciousness_rolls, VecDeque::from(vec![3, 5]));

        pilot.apply_hits(4, &rules);
        assert!(pilot.is_dead);
        assert!(!pilot.is_conscious);
        assert!(pilot.pending_consciousness_rolls.is_empty());
    }

    #[test]
    fn test_apply_damage_respects_rear_flag() {
        let rules = StandardRules::default();
        let mut mech = UnitBuilder::mech(UnitId(1), "Test", 50, &rules)
            .with_armor(PartLocation::CenterTorso, 20, 10)
            .build();
        mech.apply_damage(&[DamageResult {
            location: PartLocation::CenterTorso,
            armor_damage: 4,
            structure_damage: 0,
            is_rear_armor: true,
            is_location_destroyed: false,
        }]);
        let ct = mech.part(PartLocation::CenterTorso).unwrap();
        assert_eq!(ct.armor, 20);
        assert_eq!(ct.rear_armor, 6);
        assert_eq!(mech.damage_this_phase, 4);
    }
}
