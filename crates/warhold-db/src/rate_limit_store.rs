//! Sliding-window rate limit tracking.
//!
//! Each accepted submission writes one tracking row; the check counts rows
//! inside the configured windows and judges them with the pure verdict in
//! [`warhold_core::rate_limit`]. Check and record share one transaction that
//! opens by taking a `(world, player)` advisory lock, so concurrent
//! submissions from the same player serialize: two checks racing at one
//! below the cap cannot both count the pre-insert window and both pass.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use warhold_core::config::RateLimitConfig;
use warhold_core::rate_limit::{evaluate, RateLimitDecision};
use warhold_types::{CommandType, PlayerId, VillageId, WorldId};

use crate::codec::command_type_to_db;
use crate::error::DbError;

/// Operations on the `rate_limit_tracking` table.
pub struct RateLimitStore<'a> {
    pool: &'a PgPool,
}

impl<'a> RateLimitStore<'a> {
    /// Create a new rate limit store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Judge one submission against the windows and, if allowed, record it.
    ///
    /// Returns the verdict; nothing is recorded for a denied submission.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the counts or the insert fail. The
    /// caller must treat an error as a denial: rate limiting fails closed.
    pub async fn check_and_record(
        &self,
        world_id: WorldId,
        player_id: PlayerId,
        target_village_id: VillageId,
        command_type: CommandType,
        now: DateTime<Utc>,
        cfg: &RateLimitConfig,
    ) -> Result<RateLimitDecision, DbError> {
        let player_cutoff = window_start(now, cfg.window_secs);
        let target_cutoff = window_start(now, cfg.per_target_window_secs);

        let mut tx = self.pool.begin().await?;

        // Held until commit/rollback: checks for the same (world, player)
        // run one at a time, so the counts below include every concurrent
        // submission that was accepted first.
        sqlx::query(r"SELECT pg_advisory_xact_lock(hashtext($1::TEXT), hashtext($2::TEXT))")
            .bind(world_id.into_inner())
            .bind(player_id.into_inner())
            .execute(&mut *tx)
            .await?;

        let (player_count,): (i64,) = sqlx::query_as(
            r"SELECT COUNT(*) FROM rate_limit_tracking
              WHERE world_id = $1 AND player_id = $2 AND command_type = $3::command_type
                AND recorded_at > $4",
        )
        .bind(world_id.into_inner())
        .bind(player_id.into_inner())
        .bind(command_type_to_db(command_type))
        .bind(player_cutoff)
        .fetch_one(&mut *tx)
        .await?;

        let (target_count,): (i64,) = sqlx::query_as(
            r"SELECT COUNT(*) FROM rate_limit_tracking
              WHERE world_id = $1 AND player_id = $2 AND target_village_id = $3
                AND recorded_at > $4",
        )
        .bind(world_id.into_inner())
        .bind(player_id.into_inner())
        .bind(target_village_id.into_inner())
        .bind(target_cutoff)
        .fetch_one(&mut *tx)
        .await?;

        // Saturating to the cap side: a miscounted window denies, never allows.
        let decision = evaluate(
            command_type,
            u32::try_from(player_count).unwrap_or(u32::MAX),
            u32::try_from(target_count).unwrap_or(u32::MAX),
            cfg,
        );

        if decision.is_allowed() {
            sqlx::query(
                r"INSERT INTO rate_limit_tracking
                    (world_id, player_id, target_village_id, command_type, recorded_at)
                  VALUES ($1, $2, $3, $4::command_type, $5)",
            )
            .bind(world_id.into_inner())
            .bind(player_id.into_inner())
            .bind(target_village_id.into_inner())
            .bind(command_type_to_db(command_type))
            .bind(now)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
        }

        Ok(decision)
    }

    /// Delete tracking rows older than every window.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the delete fails.
    pub async fn prune_expired(
        &self,
        now: DateTime<Utc>,
        cfg: &RateLimitConfig,
    ) -> Result<u64, DbError> {
        let oldest_window = cfg.window_secs.max(cfg.per_target_window_secs);
        let cutoff = window_start(now, oldest_window);
        let result = sqlx::query(r"DELETE FROM rate_limit_tracking WHERE recorded_at <= $1")
            .bind(cutoff)
            .execute(self.pool)
            .await?;
        let pruned = result.rows_affected();
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned expired rate limit rows");
        }
        Ok(pruned)
    }
}

fn window_start(now: DateTime<Utc>, window_secs: u64) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::seconds(
        i64::try_from(window_secs).unwrap_or(i64::MAX),
    ))
    .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
