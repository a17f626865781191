//! Command pipeline for Warhold worlds: submission and resolution.
//!
//! The library half exposes the two entry points of the pipeline:
//!
//! - [`submit::Submitter`] validates, rate-limits, and enqueues player
//!   commands synchronously
//! - [`resolver::Resolver`] runs the asynchronous resolution tick that
//!   claims due commands, resolves them through `warhold-core`, and
//!   commits every artifact atomically
//!
//! The `warhold-engine` binary wraps the resolver in a fixed-interval
//! tick loop.

pub mod error;
pub mod resolver;
pub mod submit;

pub use error::EngineError;
pub use resolver::{Resolver, TickSummary};
pub use submit::Submitter;
