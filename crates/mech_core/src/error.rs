//! Error types for the combat resolution engine.
//!
//! Only fatal preconditions surface here. Benign "no data" situations
//! (non-positive damage, no pending rolls, no fall trigger) are reported
//! as empty collections or `None` by the calculators themselves.

use thiserror::Error;

use crate::psr::PsrRollType;
use crate::unit::{ComponentKind, PartLocation, UnitId};

/// Result type alias using [`CombatError`].
pub type Result<T> = std::result::Result<T, CombatError>;

/// Top-level error type for all combat resolution errors.
#[derive(Debug, Error)]
pub enum CombatError {
    /// Attack declared by a unit with no pilot aboard.
    #[error("Unit {0} has no pilot")]
    MissingPilot(UnitId),

    /// A roll type was requested whose prerequisite component is absent.
    #[error("Unit {unit} cannot make a {roll_type:?} roll: no {component:?} installed")]
    MissingComponent {
        /// Unit the roll was requested for.
        unit: UnitId,
        /// Requested roll type.
        roll_type: PsrRollType,
        /// Component the roll type depends on.
        component: ComponentKind,
    },

    /// Operation only applies to mechs.
    #[error("Unit {0} is not a mech")]
    NotAMech(UnitId),

    /// Operation requires the unit to be on the map.
    #[error("Unit {0} is not deployed")]
    NotDeployed(UnitId),

    /// Location is not part of the unit's body.
    #[error("Unit {unit} has no {location:?} location")]
    UnknownLocation {
        /// Unit queried.
        unit: UnitId,
        /// Missing location.
        location: PartLocation,
    },

    /// Slot does not hold a component.
    #[error("Unit {unit} has no component in {location:?} slot {slot}")]
    UnknownComponent {
        /// Unit queried.
        unit: UnitId,
        /// Location queried.
        location: PartLocation,
        /// Slot index within the location.
        slot: u8,
    },

    /// Failed to read a rules file.
    #[error("Failed to read rules file '{path}': {source}")]
    RulesIo {
        /// Path to the rules file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Rules file could not be parsed.
    #[error("Failed to parse rules file '{path}': {message}")]
    RulesParse {
        /// Path (or `<inline>`) of the rules source.
        path: String,
        /// Parser message.
        message: String,
    },

    /// Rules parsed but the tables are inconsistent.
    #[error("Invalid rules: {0}")]
    InvalidRules(String),

    /// Combat log could not be encoded.
    #[error("Failed to encode combat log: {0}")]
    LogEncode(String),

    /// Combat log bytes could not be decoded.
    #[error("Failed to decode combat log: {0}")]
    LogDecode(String),

    /// Combat log was written by an incompatible version.
    #[error("Combat log version mismatch: expected {expected}, got {found}")]
    LogVersionMismatch {
        /// Version this build understands.
        expected: u32,
        /// Version found in the log.
        found: u32,
    },
}
