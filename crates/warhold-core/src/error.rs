//! Error types for the core resolution logic.

/// Errors that can occur while resolving a battle.
///
/// `MalformedComposition` is terminal: the persisted command data needs
/// operator attention and the command must not be retried. Treating a
/// missing composition as zero units would silently corrupt loss accounting.
#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    /// The command's unit composition is empty or all-zero.
    #[error("malformed unit composition: {context}")]
    MalformedComposition {
        /// What was wrong with the composition.
        context: String,
    },

    /// A fixed-point computation overflowed or was undefined.
    #[error("arithmetic failure: {context}")]
    Arithmetic {
        /// Which computation failed.
        context: String,
    },

    /// The conquest engine failed.
    #[error("conquest error: {0}")]
    Conquest(#[from] ConquestError),
}

/// Errors that can occur inside a conquest engine.
#[derive(Debug, thiserror::Error)]
pub enum ConquestError {
    /// A fixed-point computation overflowed or was undefined.
    #[error("arithmetic failure: {context}")]
    Arithmetic {
        /// Which computation failed.
        context: String,
    },
}
