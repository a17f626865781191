//! Command queue operations.
//!
//! The `commands` table is the durable scheduler queue: submission assigns a
//! per-world monotonic sequence, resolution claims a due command atomically
//! with a fencing token, and acknowledgement requires presenting that token
//! back, so a worker that lost its claim cannot commit a stale resolution.
//! Commands are never deleted; terminal rows stay as audit history.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use warhold_types::{Command, CommandId, WorldId};

use crate::codec::{
    building_from_db, building_to_db, command_status_from_db, command_type_from_db,
    command_type_to_db,
};
use crate::error::DbError;

/// Operations on the `commands` and `world_sequences` tables.
pub struct CommandStore<'a> {
    pool: &'a PgPool,
}

impl<'a> CommandStore<'a> {
    /// Create a new command store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a newly submitted command, assigning its per-world sequence.
    ///
    /// The sequence counter bump and the insert share one transaction, so
    /// sequences are gapless in the absence of rollbacks and strictly
    /// monotonic always. Returns the assigned sequence.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails (including a
    /// duplicate command id) or [`DbError::Serialization`] if the
    /// composition cannot be encoded.
    pub async fn submit(&self, command: &Command) -> Result<u64, DbError> {
        let units = serde_json::to_value(&command.units)?;
        let mut tx = self.pool.begin().await?;

        let (sequence,): (i64,) = sqlx::query_as(
            r"INSERT INTO world_sequences (world_id, next_seq) VALUES ($1, 1)
              ON CONFLICT (world_id) DO UPDATE SET next_seq = world_sequences.next_seq + 1
              RETURNING next_seq",
        )
        .bind(command.world_id.into_inner())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"INSERT INTO commands
                (id, world_id, attacker_id, defender_id, source_village_id, target_village_id,
                 command_type, units, sent_at, arrival_at, sequence, target_building,
                 status, is_fake, correlation_id)
              VALUES ($1, $2, $3, $4, $5, $6, $7::command_type, $8, $9, $10, $11, $12,
                      'pending', $13, $14)",
        )
        .bind(command.id.into_inner())
        .bind(command.world_id.into_inner())
        .bind(command.attacker_id.into_inner())
        .bind(command.defender_id.into_inner())
        .bind(command.source_village_id.into_inner())
        .bind(command.target_village_id.into_inner())
        .bind(command_type_to_db(command.command_type))
        .bind(units)
        .bind(command.sent_at)
        .bind(command.arrival_at)
        .bind(sequence)
        .bind(command.target_building.map(building_to_db))
        .bind(command.is_fake)
        .bind(command.correlation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(command_id = %command.id, sequence, "Command submitted");
        Ok(u64::try_from(sequence).unwrap_or(0))
    }

    /// Fetch one command by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails or
    /// [`DbError::Decode`] if the row cannot be decoded.
    pub async fn fetch(&self, id: CommandId) -> Result<Option<Command>, DbError> {
        let row = sqlx::query_as::<_, CommandRow>(
            r"SELECT id, world_id, attacker_id, defender_id, source_village_id,
                     target_village_id, command_type::TEXT AS command_type, units,
                     sent_at, arrival_at, sequence, target_building,
                     status::TEXT AS status, is_fake, correlation_id
              FROM commands WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        row.map(CommandRow::into_command).transpose()
    }

    /// Fetch the pending commands of one world that are due at `now`, in
    /// authoritative resolution order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails or
    /// [`DbError::Decode`] if a row cannot be decoded.
    pub async fn due_before(
        &self,
        world_id: WorldId,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Command>, DbError> {
        let rows = sqlx::query_as::<_, CommandRow>(
            r"SELECT id, world_id, attacker_id, defender_id, source_village_id,
                     target_village_id, command_type::TEXT AS command_type, units,
                     sent_at, arrival_at, sequence, target_building,
                     status::TEXT AS status, is_fake, correlation_id
              FROM commands
              WHERE world_id = $1 AND status = 'pending' AND arrival_at <= $2
              ORDER BY arrival_at, sequence
              LIMIT $3",
        )
        .bind(world_id.into_inner())
        .bind(now)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(CommandRow::into_command).collect()
    }

    /// Atomically claim a pending command for resolution.
    ///
    /// Returns `false` if another worker claimed it first (or it was
    /// canceled); exactly one claimer can win.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn claim(
        &self,
        id: CommandId,
        claim_token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"UPDATE commands
              SET status = 'in_progress', claim_token = $2, claimed_at = $3
              WHERE id = $1 AND status = 'pending'",
        )
        .bind(id.into_inner())
        .bind(claim_token)
        .bind(now)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Cancel a pending command, if it is still strictly before arrival.
    ///
    /// Returns `false` when the cancel lost the race: the command is already
    /// due, claimed, or terminal.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn cancel(&self, id: CommandId, now: DateTime<Utc>) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"UPDATE commands SET status = 'canceled'
              WHERE id = $1 AND status = 'pending' AND arrival_at > $2",
        )
        .bind(id.into_inner())
        .bind(now)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Return expired claims to the pending state.
    ///
    /// A claim whose `claimed_at` is at or before `cutoff` belongs to a
    /// worker presumed dead; the command becomes claimable again and the old
    /// token is discarded so the dead worker's acknowledge can never land.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn reclaim_expired(
        &self,
        world_id: WorldId,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let result = sqlx::query(
            r"UPDATE commands
              SET status = 'pending', claim_token = NULL, claimed_at = NULL
              WHERE world_id = $1 AND status = 'in_progress' AND claimed_at <= $2",
        )
        .bind(world_id.into_inner())
        .bind(cutoff)
        .execute(self.pool)
        .await?;
        let reclaimed = result.rows_affected();
        if reclaimed > 0 {
            tracing::warn!(world_id = %world_id, reclaimed, "Reclaimed expired command claims");
        }
        Ok(reclaimed)
    }

    /// Mark a claimed command resolved, inside the caller's transaction.
    ///
    /// The fencing token must match the claim; a reclaimed-and-reassigned
    /// command rejects the stale worker's acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn acknowledge_in(
        conn: &mut PgConnection,
        id: CommandId,
        claim_token: Uuid,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"UPDATE commands SET status = 'resolved'
              WHERE id = $1 AND claim_token = $2 AND status = 'in_progress'",
        )
        .bind(id.into_inner())
        .bind(claim_token)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Mark a claimed command terminally failed, recording why.
    ///
    /// Same fencing rule as [`CommandStore::acknowledge_in`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn fail(
        &self,
        id: CommandId,
        claim_token: Uuid,
        reason: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"UPDATE commands SET status = 'failed', failure_reason = $3
              WHERE id = $1 AND claim_token = $2 AND status = 'in_progress'",
        )
        .bind(id.into_inner())
        .bind(claim_token)
        .bind(reason)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

/// A row from the `commands` table.
///
/// Uses runtime types rather than compile-time checked types to avoid
/// requiring a live database during builds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommandRow {
    /// Command id.
    pub id: Uuid,
    /// World id.
    pub world_id: Uuid,
    /// Issuing player.
    pub attacker_id: Uuid,
    /// Target owner at dispatch time.
    pub defender_id: Uuid,
    /// Source village.
    pub source_village_id: Uuid,
    /// Target village.
    pub target_village_id: Uuid,
    /// Command type as a string (cast from the `PostgreSQL` enum).
    pub command_type: String,
    /// Unit composition as JSONB.
    pub units: serde_json::Value,
    /// Dispatch timestamp.
    pub sent_at: DateTime<Utc>,
    /// Arrival timestamp.
    pub arrival_at: DateTime<Utc>,
    /// Per-world sequence.
    pub sequence: i64,
    /// Catapult target, if any.
    pub target_building: Option<String>,
    /// Status as a string (cast from the `PostgreSQL` enum).
    pub status: String,
    /// Feint flag.
    pub is_fake: bool,
    /// Wave correlation id.
    pub correlation_id: Option<Uuid>,
}

impl CommandRow {
    /// Decode the row into the typed command.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] or [`DbError::Serialization`] if any
    /// persisted value is not valid.
    pub fn into_command(self) -> Result<Command, DbError> {
        Ok(Command {
            id: CommandId::from(self.id),
            world_id: WorldId::from(self.world_id),
            attacker_id: self.attacker_id.into(),
            defender_id: self.defender_id.into(),
            source_village_id: self.source_village_id.into(),
            target_village_id: self.target_village_id.into(),
            command_type: command_type_from_db(&self.command_type)?,
            units: serde_json::from_value(self.units)?,
            sent_at: self.sent_at,
            arrival_at: self.arrival_at,
            sequence: u64::try_from(self.sequence).unwrap_or(0),
            target_building: self
                .target_building
                .as_deref()
                .map(building_from_db)
                .transpose()?,
            status: command_status_from_db(&self.status)?,
            is_fake: self.is_fake,
            correlation_id: self.correlation_id,
        })
    }
}
