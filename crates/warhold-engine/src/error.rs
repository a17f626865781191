//! Error types for the engine daemon.
//!
//! Uses `thiserror` for typed errors that surface through the submission
//! path and the resolution tick: rate limiting, validation, core resolution,
//! concurrency conflicts, and storage failures.

use warhold_core::error::BattleError;
use warhold_db::DbError;

/// Errors that can occur in the submission and resolution pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A sliding-window cap refused the command. The caller should retry
    /// after the window rolls over, not immediately.
    #[error("rate limit exceeded: {detail}")]
    RateLimitExceeded {
        /// Which cap refused the command.
        detail: String,
    },

    /// The submitted command is structurally invalid.
    #[error("validation error: {context}")]
    Validation {
        /// What was wrong with the command.
        context: String,
    },

    /// The core resolver rejected or failed on a command.
    #[error("resolution error: {0}")]
    Resolution(#[from] BattleError),

    /// An optimistic write kept losing to concurrent writers.
    #[error("concurrency conflict: {context}")]
    Conflict {
        /// Which entity was contended.
        context: String,
    },

    /// The database is unreachable or a query failed.
    #[error("storage error: {0}")]
    Storage(#[from] DbError),

    /// Configuration is invalid or missing.
    #[error("config error: {context}")]
    Config {
        /// What was wrong with the configuration.
        context: String,
    },
}
