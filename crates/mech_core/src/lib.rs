//! # Mech Core
//!
//! Deterministic combat resolution for hex-map mech battles.
//!
//! This crate contains **only** rules logic:
//! - No rendering
//! - No networking
//! - No system randomness (dice come from an injected [`dice::DiceRoller`])
//! - No floating-point geometry (hex lines use fixed-point)
//!
//! Every calculator reads a [`unit::Unit`] snapshot and returns a result
//! record. The caller applies records back to its units, once each, and
//! may log them in a [`record::CombatLog`] for replication.
//!
//! ## Crate Structure
//!
//! - [`to_hit`] - Attack target numbers
//! - [`damage`] - Armor, structure and transfer chains
//! - [`critical`] - Component critical hits and explosions
//! - [`psr`] - Piloting skill roll targets
//! - [`falling`] - Falling damage and facing
//! - [`fall`] - Fall decision state machine
//! - [`heat`] - Shutdown, restart and ammunition cook-off
//! - [`consciousness`] - Pilot consciousness checks
//! - [`rules`] - Rule tables behind the [`rules::RulesProvider`] trait
//! - [`map`] - Hex geometry, terrain and line of sight

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod consciousness;
pub mod critical;
pub mod damage;
pub mod dice;
pub mod error;
pub mod fall;
pub mod falling;
pub mod heat;
pub mod map;
pub mod math;
pub mod psr;
pub mod record;
pub mod rules;
pub mod to_hit;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::consciousness::{ConsciousnessCalculator, ConsciousnessRollResult};
    pub use crate::critical::{CriticalHit, CriticalHitResult, CriticalHitsCalculator, ExplosionResult};
    pub use crate::damage::{hit_direction, structure_damage_by_location, DamageResult, DamageTransferCalculator};
    pub use crate::dice::{DiceRoll, DiceRoller, ScriptedDiceRoller, SeededDiceRoller, IMPOSSIBLE_ROLL};
    pub use crate::error::{CombatError, Result};
    pub use crate::fall::{FallProcessor, FallResult, FallState, FallTrigger};
    pub use crate::falling::{FallCluster, FallingDamageCalculator, FallingDamageData};
    pub use crate::heat::{AmmoExplosionCheck, HeatEffectsCalculator, ShutdownCheck};
    pub use crate::map::{Arc, BattleMap, Facing, Hex, HexCoord, Terrain};
    pub use crate::math::Fixed;
    pub use crate::psr::{PilotingSkillCalculator, PsrBreakdown, PsrOutcome, PsrRollType};
    pub use crate::record::{CombatEvent, CombatLog};
    pub use crate::rules::{HitDirection, RangeBracket, RulesConfig, RulesProvider, StandardRules};
    pub use crate::to_hit::{AttackDeclaration, ToHitBreakdown, ToHitCalculator, Weapon};
    pub use crate::unit::{
        Component, ComponentKind, MovementMode, Part, PartLocation, Pilot, Unit, UnitBuilder, UnitId,
        UnitKind,
    };
}
