//! Deterministic battle, conquest, and scheduling rules for Warhold worlds.
//!
//! Everything in this crate is pure: no I/O, no clocks, no global state.
//! Randomness enters only through a seed derived from the world seed and the
//! command id, so resolving the same command over the same data always
//! produces the same battle.
//!
//! # Modules
//!
//! - [`config`] -- Per-world YAML configuration with typed defaults.
//! - [`units`] -- Static unit stat tables.
//! - [`power`] -- Attack/defense power computation and modifiers.
//! - [`losses`] -- The continuous loss-ratio curve.
//! - [`draw`] -- Seeded fixed-point random draws.
//! - [`conquest`] -- The allegiance and control meter strategies.
//! - [`battle`] -- The pure battle resolver.
//! - [`report`] -- Assembly of report, metrics, and audit artifacts.
//! - [`order`] -- Resolution ordering and the command lifecycle.
//! - [`rate_limit`] -- Pure rate-limit verdicts.
//! - [`error`] -- Error types for battle and conquest math.

pub mod battle;
pub mod config;
pub mod conquest;
pub mod draw;
pub mod error;
pub mod losses;
pub mod order;
pub mod power;
pub mod rate_limit;
pub mod report;
pub mod units;
