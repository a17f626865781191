//! Command submission: validation, rate limiting, durable enqueue.
//!
//! Submission is the synchronous half of the pipeline. A command is checked
//! structurally, pushed through the sliding-window rate limiter, and only
//! then written to the queue with its world sequence number. Anything the
//! limiter or validator refuses never touches the `commands` table.

use sqlx::PgPool;
use tracing::info;

use warhold_core::config::WorldConfig;
use warhold_core::rate_limit::RateLimitDecision;
use warhold_db::{CommandStore, RateLimitStore};
use warhold_types::{Command, CommandType};

use crate::error::EngineError;

/// Accepts player commands into the durable queue.
pub struct Submitter<'a> {
    pool: &'a PgPool,
}

impl<'a> Submitter<'a> {
    /// Create a new submitter bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Validate, rate-limit, and enqueue one command.
    ///
    /// Returns the world sequence number assigned to the command. The
    /// limiter serializes same-player checks on an advisory lock and records
    /// the command in the same transaction that counts it, so concurrent
    /// submissions cannot slip under a cap together. A
    /// limiter storage failure refuses the command rather than waving it
    /// through.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] for a malformed command,
    /// [`EngineError::RateLimitExceeded`] when a window cap is hit, or
    /// [`EngineError::Storage`] if persistence fails.
    pub async fn submit(
        &self,
        command: &Command,
        config: &WorldConfig,
    ) -> Result<u64, EngineError> {
        validate(command)?;

        let limiter = RateLimitStore::new(self.pool);
        let decision = limiter
            .check_and_record(
                command.world_id,
                command.attacker_id,
                command.target_village_id,
                command.command_type,
                command.sent_at,
                &config.rate_limits,
            )
            .await?;
        match decision {
            RateLimitDecision::Allowed => {}
            RateLimitDecision::PlayerCapExceeded { cap } => {
                return Err(EngineError::RateLimitExceeded {
                    detail: format!(
                        "player cap of {cap} {} commands per window",
                        command_type_name(command.command_type)
                    ),
                });
            }
            RateLimitDecision::TargetCapExceeded { cap } => {
                return Err(EngineError::RateLimitExceeded {
                    detail: format!("per-target cap of {cap} commands per window"),
                });
            }
        }

        let sequence = CommandStore::new(self.pool).submit(command).await?;
        info!(
            command_id = %command.id,
            world_id = %command.world_id,
            command_type = command_type_name(command.command_type),
            sequence,
            arrival_at = %command.arrival_at,
            "Command accepted"
        );
        Ok(sequence)
    }
}

/// Structural checks that need no storage access.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] describing the first failed check.
pub fn validate(command: &Command) -> Result<(), EngineError> {
    if command.total_units() == 0 {
        return Err(EngineError::Validation {
            context: String::from("command carries no units"),
        });
    }
    if command.source_village_id == command.target_village_id {
        return Err(EngineError::Validation {
            context: String::from("source and target village are the same"),
        });
    }
    if command.arrival_at <= command.sent_at {
        return Err(EngineError::Validation {
            context: String::from("arrival must be after dispatch"),
        });
    }
    if command.command_type == CommandType::Scout
        && command
            .units
            .keys()
            .any(|kind| *kind != warhold_types::UnitKind::Scout)
    {
        return Err(EngineError::Validation {
            context: String::from("scout commands may only carry scouts"),
        });
    }
    if command.command_type != CommandType::Attack && command.envoy_count() > 0 {
        return Err(EngineError::Validation {
            context: String::from("envoys may only travel with attacks"),
        });
    }
    Ok(())
}

const fn command_type_name(command_type: CommandType) -> &'static str {
    match command_type {
        CommandType::Attack => "attack",
        CommandType::Support => "support",
        CommandType::Scout => "scout",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::{Duration, Utc};
    use warhold_types::{
        CommandId, CommandStatus, PlayerId, UnitCount, UnitKind, VillageId, WorldId,
    };

    use super::*;

    fn make_command(command_type: CommandType, units: UnitCount) -> Command {
        let now = Utc::now();
        Command {
            id: CommandId::new(),
            world_id: WorldId::new(),
            attacker_id: PlayerId::new(),
            defender_id: PlayerId::new(),
            source_village_id: VillageId::new(),
            target_village_id: VillageId::new(),
            command_type,
            units,
            sent_at: now,
            arrival_at: now + Duration::minutes(30),
            sequence: 0,
            target_building: None,
            status: CommandStatus::Pending,
            is_fake: false,
            correlation_id: None,
        }
    }

    fn units_of(kind: UnitKind, count: u32) -> UnitCount {
        let mut units = UnitCount::new();
        units.insert(kind, count);
        units
    }

    #[test]
    fn well_formed_attack_passes() {
        let command = make_command(CommandType::Attack, units_of(UnitKind::AxeFighter, 50));
        assert!(validate(&command).is_ok());
    }

    #[test]
    fn empty_composition_is_rejected() {
        let command = make_command(CommandType::Attack, UnitCount::new());
        assert!(matches!(
            validate(&command),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn all_zero_composition_is_rejected() {
        let command = make_command(CommandType::Attack, units_of(UnitKind::AxeFighter, 0));
        assert!(matches!(
            validate(&command),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn self_targeting_is_rejected() {
        let mut command = make_command(CommandType::Attack, units_of(UnitKind::AxeFighter, 50));
        command.target_village_id = command.source_village_id;
        assert!(matches!(
            validate(&command),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn arrival_before_dispatch_is_rejected() {
        let mut command = make_command(CommandType::Attack, units_of(UnitKind::AxeFighter, 50));
        command.arrival_at = command.sent_at - Duration::seconds(1);
        assert!(matches!(
            validate(&command),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn scouts_travel_alone() {
        let mut units = units_of(UnitKind::Scout, 10);
        units.insert(UnitKind::AxeFighter, 5);
        let command = make_command(CommandType::Scout, units);
        assert!(matches!(
            validate(&command),
            Err(EngineError::Validation { .. })
        ));

        let pure = make_command(CommandType::Scout, units_of(UnitKind::Scout, 10));
        assert!(validate(&pure).is_ok());
    }

    #[test]
    fn envoys_require_an_attack() {
        let command = make_command(CommandType::Support, units_of(UnitKind::Envoy, 2));
        assert!(matches!(
            validate(&command),
            Err(EngineError::Validation { .. })
        ));
    }
}
