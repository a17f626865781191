//! `PostgreSQL` data layer for the Warhold resolution engine.
//!
//! The database is the single source of truth and the coordination point
//! between submitters and resolver workers:
//!
//! ```text
//! Submission                     Resolution tick
//!     |                              |
//!     +-- RateLimitStore  (check+record, one tx)
//!     +-- CommandStore    (sequence + insert)
//!                                    |
//!                                    +-- CommandStore   (reclaim, due, claim)
//!                                    +-- one transaction per command:
//!                                        |-- VillageStore (optimistic write-back)
//!                                        |-- ReportStore  (idempotent reports + metrics)
//!                                        |-- ConquestLog  (append-only audit)
//!                                        +-- CommandStore (acknowledge with token)
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool, configuration, migrations.
//! - [`command_store`] -- The durable command queue with claim fencing.
//! - [`village_store`] -- Village state with optimistic versioning.
//! - [`report_store`] -- Write-once reports and metrics.
//! - [`conquest_log`] -- Append-only conquest audit log.
//! - [`rate_limit_store`] -- Sliding-window submission tracking.
//! - [`codec`] -- Enum and JSONB wire conversions.
//! - [`error`] -- Shared error types.

pub mod codec;
pub mod command_store;
pub mod conquest_log;
pub mod error;
pub mod postgres;
pub mod rate_limit_store;
pub mod report_store;
pub mod village_store;

// Re-export primary types for convenience.
pub use command_store::{CommandRow, CommandStore};
pub use conquest_log::{AttemptRow, ConquestLog};
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
pub use rate_limit_store::RateLimitStore;
pub use report_store::{ReportRow, ReportStore};
pub use village_store::{VillageRow, VillageStore};
