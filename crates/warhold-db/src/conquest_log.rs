//! Append-only conquest audit log.
//!
//! One row per resolved command that carried envoys, captured or not. The
//! store exposes append and query only; rows are never updated or deleted,
//! and the append is idempotent per `command_id` so a replayed resolution
//! cannot double-log. `resolution_order` carries the command's scheduler
//! sequence, which together with `occurred_at` lets the whole conquest
//! history of a village be replayed deterministically.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use warhold_types::{ConquestAttempt, PlayerId, VillageId, WorldId};

use crate::codec::{reason_from_db, reason_to_db};
use crate::error::DbError;

/// Operations on the `conquest_attempts` table.
pub struct ConquestLog<'a> {
    pool: &'a PgPool,
}

impl<'a> ConquestLog<'a> {
    /// Create a new conquest log bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append one attempt inside the caller's transaction.
    ///
    /// Idempotent per `command_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails or
    /// [`DbError::Serialization`] if the modifiers cannot be encoded.
    pub async fn append_in(
        conn: &mut PgConnection,
        attempt: &ConquestAttempt,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO conquest_attempts
                (command_id, world_id, attacker_id, defender_id, village_id, surviving_envoys,
                 meter_before, meter_after, drop_amount, captured, reason_code, wall_level,
                 modifiers, resolution_order, occurred_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
              ON CONFLICT (command_id) DO NOTHING",
        )
        .bind(attempt.command_id.into_inner())
        .bind(attempt.world_id.into_inner())
        .bind(attempt.attacker_id.into_inner())
        .bind(attempt.defender_id.into_inner())
        .bind(attempt.village_id.into_inner())
        .bind(i64::from(attempt.surviving_envoys))
        .bind(attempt.meter_before)
        .bind(attempt.meter_after)
        .bind(attempt.drop_amount)
        .bind(attempt.captured)
        .bind(reason_to_db(attempt.reason_code))
        .bind(i32::try_from(attempt.wall_level).unwrap_or(i32::MAX))
        .bind(serde_json::to_value(&attempt.modifiers)?)
        .bind(i64::try_from(attempt.resolution_order).unwrap_or(i64::MAX))
        .bind(attempt.occurred_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Attempts against one village inside a time range, in replay order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails or
    /// [`DbError::Decode`] if a row cannot be decoded.
    pub async fn for_village(
        &self,
        village_id: VillageId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ConquestAttempt>, DbError> {
        let rows = sqlx::query_as::<_, AttemptRow>(
            r"SELECT command_id, world_id, attacker_id, defender_id, village_id,
                     surviving_envoys, meter_before, meter_after, drop_amount, captured,
                     reason_code, wall_level, modifiers, resolution_order, occurred_at
              FROM conquest_attempts
              WHERE village_id = $1 AND occurred_at >= $2 AND occurred_at < $3
              ORDER BY occurred_at, resolution_order",
        )
        .bind(village_id.into_inner())
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(AttemptRow::into_attempt).collect()
    }

    /// Attempts made by one attacker, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails or
    /// [`DbError::Decode`] if a row cannot be decoded.
    pub async fn by_attacker(
        &self,
        attacker_id: PlayerId,
        limit: i64,
    ) -> Result<Vec<ConquestAttempt>, DbError> {
        let rows = sqlx::query_as::<_, AttemptRow>(
            r"SELECT command_id, world_id, attacker_id, defender_id, village_id,
                     surviving_envoys, meter_before, meter_after, drop_amount, captured,
                     reason_code, wall_level, modifiers, resolution_order, occurred_at
              FROM conquest_attempts
              WHERE attacker_id = $1
              ORDER BY occurred_at DESC
              LIMIT $2",
        )
        .bind(attacker_id.into_inner())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(AttemptRow::into_attempt).collect()
    }

    /// Successful captures in one world, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails or
    /// [`DbError::Decode`] if a row cannot be decoded.
    pub async fn captures(
        &self,
        world_id: WorldId,
        limit: i64,
    ) -> Result<Vec<ConquestAttempt>, DbError> {
        let rows = sqlx::query_as::<_, AttemptRow>(
            r"SELECT command_id, world_id, attacker_id, defender_id, village_id,
                     surviving_envoys, meter_before, meter_after, drop_amount, captured,
                     reason_code, wall_level, modifiers, resolution_order, occurred_at
              FROM conquest_attempts
              WHERE world_id = $1 AND captured
              ORDER BY occurred_at DESC
              LIMIT $2",
        )
        .bind(world_id.into_inner())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(AttemptRow::into_attempt).collect()
    }
}

/// A row from the `conquest_attempts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttemptRow {
    /// Triggering command.
    pub command_id: Uuid,
    /// World id.
    pub world_id: Uuid,
    /// Attacking player.
    pub attacker_id: Uuid,
    /// Defending player at resolution.
    pub defender_id: Uuid,
    /// Contested village.
    pub village_id: Uuid,
    /// Envoys that survived the battle.
    pub surviving_envoys: i64,
    /// Meter before.
    pub meter_before: Decimal,
    /// Meter after.
    pub meter_after: Decimal,
    /// Applied drop or gain.
    pub drop_amount: Decimal,
    /// Capture flag.
    pub captured: bool,
    /// Reason string.
    pub reason_code: String,
    /// Wall level at resolution.
    pub wall_level: i32,
    /// Modifier set as JSONB.
    pub modifiers: serde_json::Value,
    /// Scheduler sequence of the command.
    pub resolution_order: i64,
    /// When the attempt resolved.
    pub occurred_at: DateTime<Utc>,
}

impl AttemptRow {
    /// Decode the row into the typed attempt.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] or [`DbError::Serialization`] if any
    /// persisted value is not valid.
    pub fn into_attempt(self) -> Result<ConquestAttempt, DbError> {
        Ok(ConquestAttempt {
            command_id: self.command_id.into(),
            world_id: self.world_id.into(),
            attacker_id: self.attacker_id.into(),
            defender_id: self.defender_id.into(),
            village_id: self.village_id.into(),
            surviving_envoys: u32::try_from(self.surviving_envoys).unwrap_or(0),
            meter_before: self.meter_before,
            meter_after: self.meter_after,
            drop_amount: self.drop_amount,
            captured: self.captured,
            reason_code: reason_from_db(&self.reason_code)?,
            wall_level: u32::try_from(self.wall_level).unwrap_or(0),
            modifiers: serde_json::from_value(self.modifiers)?,
            resolution_order: u64::try_from(self.resolution_order).unwrap_or(0),
            occurred_at: self.occurred_at,
        })
    }
}
