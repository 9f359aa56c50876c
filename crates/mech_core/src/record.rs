//! Combat log for replicating engine results.
//!
//! The orchestrator appends each result record it applies, tagged with the
//! turn, and ships the encoded log to clients. Replaying a log applies the
//! same records in the same order, so every client ends in the same state.

use serde::{Deserialize, Serialize};

use crate::consciousness::ConsciousnessRollResult;
use crate::critical::CriticalHitResult;
use crate::damage::DamageResult;
use crate::dice::DiceRoll;
use crate::error::{CombatError, Result};
use crate::fall::FallResult;
use crate::heat::{AmmoExplosionCheck, ShutdownCheck};
use crate::to_hit::ToHitBreakdown;
use crate::unit::UnitId;

/// Combat log format version.
pub const COMBAT_LOG_VERSION: u32 = 1;

/// One engine result, as applied by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// Weapon attack resolution.
    Attack {
        /// Attacking unit.
        attacker: UnitId,
        /// Target unit.
        target: UnitId,
        /// To-hit number.
        breakdown: ToHitBreakdown,
        /// Attack roll; absent for automatic misses.
        roll: Option<DiceRoll>,
    },
    /// Damage landed on a unit.
    Damage {
        /// Unit damaged.
        unit: UnitId,
        /// Per-location results.
        results: Vec<DamageResult>,
    },
    /// Critical hits on a unit.
    CriticalHits {
        /// Unit struck.
        unit: UnitId,
        /// Per-location results.
        results: Vec<CriticalHitResult>,
    },
    /// Fall check and its consequences.
    Fall(FallResult),
    /// Heat shutdown check.
    HeatShutdown(ShutdownCheck),
    /// Heat ammunition explosion check.
    AmmoExplosion(AmmoExplosionCheck),
    /// Pilot consciousness rolls.
    Consciousness {
        /// Unit whose pilot rolled.
        unit: UnitId,
        /// Rolls made.
        results: Vec<ConsciousnessRollResult>,
    },
}

/// A logged event with the turn it happened in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRecord {
    /// Game turn.
    pub turn: u32,
    /// The event.
    pub event: CombatEvent,
}

/// Ordered record of every result applied in one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatLog {
    /// Log format version.
    pub version: u32,
    /// Game identifier.
    pub game_id: String,
    /// Dice seed, when the game used a seeded roller.
    pub seed: Option<u64>,
    /// Events in application order.
    pub records: Vec<CombatRecord>,
}

impl CombatLog {
    /// Start an empty log.
    #[must_use]
    pub fn new(game_id: impl Into<String>, seed: Option<u64>) -> Self {
        Self {
            version: COMBAT_LOG_VERSION,
            game_id: game_id.into(),
            seed,
            records: Vec::new(),
        }
    }

    /// Append an event.
    pub fn record(&mut self, turn: u32, event: CombatEvent) {
        self.records.push(CombatRecord { turn, event });
    }

    /// Events logged for `turn`.
    #[must_use]
    pub fn events_in_turn(&self, turn: u32) -> Vec<&CombatEvent> {
        self.records
            .iter()
            .filter(|record| record.turn == turn)
            .map(|record| &record.event)
            .collect()
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Encode for transmission.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CombatError::LogEncode(e.to_string()))
    }

    /// Decode a log, rejecting other format versions.
    ///
    /// # Errors
    /// Returns an error if the bytes are not a log or the version differs.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let log: Self = bincode::deserialize(bytes).map_err(|e| CombatError::LogDecode(e.to_string()))?;
        if log.version != COMBAT_LOG_VERSION {
            return Err(CombatError::LogVersionMismatch {
                expected: COMBAT_LOG_VERSION,
                found: log.version,
            });
        }
        Ok(log)
    }
}
