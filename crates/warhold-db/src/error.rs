//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] errors with additional context about which operation failed.
//! Optimistic write-back failures surface as [`DbError::Conflict`] so the
//! resolver can retry them distinctly from hard storage faults.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A persisted value could not be decoded into its Rust type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// An optimistic version check failed; the row changed underneath us.
    #[error("Concurrency conflict: {0}")]
    Conflict(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
