//! # Mech Development Tools
//!
//! Command-line helpers for rules authors and engine developers:
//! - Rules file validation
//! - Single-calculator probes (falls, heat, to-hit) with seeded dice

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod probe;
pub mod validate;

use thiserror::Error;

/// Errors surfaced by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Engine or rules error.
    #[error(transparent)]
    Combat(#[from] mech_core::error::CombatError),

    /// Failed to list a directory.
    #[error("Failed to read directory '{path}': {source}")]
    Io {
        /// Directory path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to render JSON output.
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Probe parameters make no sense.
    #[error("Invalid probe: {0}")]
    InvalidProbe(String),
}

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;
