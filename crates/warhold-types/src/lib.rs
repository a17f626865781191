//! Shared type definitions for the Warhold battle and conquest engine.
//!
//! This crate is the single source of truth for all types used across the
//! Warhold workspace: identifiers, closed enumerations, and the entity
//! structs flowing between the core resolver, the data layer, and the
//! engine binary.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Enumeration types (units, commands, outcomes, conquest)
//! - [`structs`] -- Core entity structs (commands, villages, reports, audit)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    BattleOutcome, BuildingKind, CommandStatus, CommandType, ConquestMode, IntelLevel,
    Perspective, ReasonCode, ResourceKind, UnitCategory, UnitKind,
};
pub use ids::{BattleId, CommandId, PlayerId, ReportId, VillageId, WorldId};
pub use structs::{
    BattleMetrics, BattleModifiers, BattleReport, Command, ConquestAttempt, ResourceAmount,
    SideBreakdown, UnitCount, VillageState, REPORT_VERSION,
};
