//! Village state persistence with optimistic concurrency.
//!
//! Every village row carries a `version` counter. Reads return the counter;
//! writes assert it unchanged and bump it, so two resolutions racing on the
//! same village cannot silently overwrite each other. Within one world the
//! single resolver worker makes conflicts rare, but the check still guards
//! against operator tooling and any future sharding.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use warhold_types::{VillageId, VillageState};

use crate::error::DbError;

/// Operations on the `villages` table.
pub struct VillageStore<'a> {
    pool: &'a PgPool,
}

impl<'a> VillageStore<'a> {
    /// Create a new village store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch one village with its current version.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails or
    /// [`DbError::Serialization`] if a JSONB column cannot be decoded.
    pub async fn fetch(&self, id: VillageId) -> Result<Option<VillageState>, DbError> {
        let row = sqlx::query_as::<_, VillageRow>(
            r"SELECT id, world_id, owner_id, points, garrison, wall_level, building_levels,
                     resources, meter, meter_updated_at, uptime_started_at,
                     capture_cooldown_until, anti_snipe_until, allegiance_floor, is_capital,
                     conquered_at, version
              FROM villages WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        row.map(VillageRow::into_village).transpose()
    }

    /// Insert a new village row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails or
    /// [`DbError::Serialization`] if a composition cannot be encoded.
    pub async fn insert(&self, village: &VillageState) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO villages
                (id, world_id, owner_id, points, garrison, wall_level, building_levels,
                 resources, meter, meter_updated_at, uptime_started_at,
                 capture_cooldown_until, anti_snipe_until, allegiance_floor, is_capital,
                 conquered_at, version)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(village.id.into_inner())
        .bind(village.world_id.into_inner())
        .bind(village.owner_id.into_inner())
        .bind(i64::from(village.points))
        .bind(serde_json::to_value(&village.garrison)?)
        .bind(i32::try_from(village.wall_level).unwrap_or(i32::MAX))
        .bind(serde_json::to_value(&village.building_levels)?)
        .bind(serde_json::to_value(&village.resources)?)
        .bind(village.meter)
        .bind(village.meter_updated_at)
        .bind(village.uptime_started_at)
        .bind(village.capture_cooldown_until)
        .bind(village.anti_snipe_until)
        .bind(village.allegiance_floor)
        .bind(village.is_capital)
        .bind(village.conquered_at)
        .bind(village.version)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Sum a player's village points in one world. Morale input.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn player_points(
        &self,
        world_id: warhold_types::WorldId,
        player_id: warhold_types::PlayerId,
    ) -> Result<u32, DbError> {
        let (total,): (i64,) = sqlx::query_as(
            r"SELECT COALESCE(SUM(points), 0) FROM villages
              WHERE world_id = $1 AND owner_id = $2",
        )
        .bind(world_id.into_inner())
        .bind(player_id.into_inner())
        .fetch_one(self.pool)
        .await?;
        Ok(u32::try_from(total).unwrap_or(u32::MAX))
    }

    /// Write back a mutated village inside the caller's transaction.
    ///
    /// `village.version` must be the version the caller read; the write
    /// asserts it is unchanged and bumps it by one. A mismatch means another
    /// writer got there first and surfaces as [`DbError::Conflict`]; the
    /// caller re-reads and retries.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] on a version mismatch,
    /// [`DbError::Postgres`] if the update fails, or
    /// [`DbError::Serialization`] if a composition cannot be encoded.
    pub async fn update_in(
        conn: &mut PgConnection,
        village: &VillageState,
    ) -> Result<(), DbError> {
        let result = sqlx::query(
            r"UPDATE villages
              SET owner_id = $2, points = $3, garrison = $4, wall_level = $5,
                  building_levels = $6, resources = $7, meter = $8, meter_updated_at = $9,
                  uptime_started_at = $10, capture_cooldown_until = $11,
                  anti_snipe_until = $12, allegiance_floor = $13, conquered_at = $14,
                  version = version + 1
              WHERE id = $1 AND version = $15",
        )
        .bind(village.id.into_inner())
        .bind(village.owner_id.into_inner())
        .bind(i64::from(village.points))
        .bind(serde_json::to_value(&village.garrison)?)
        .bind(i32::try_from(village.wall_level).unwrap_or(i32::MAX))
        .bind(serde_json::to_value(&village.building_levels)?)
        .bind(serde_json::to_value(&village.resources)?)
        .bind(village.meter)
        .bind(village.meter_updated_at)
        .bind(village.uptime_started_at)
        .bind(village.capture_cooldown_until)
        .bind(village.anti_snipe_until)
        .bind(village.allegiance_floor)
        .bind(village.conquered_at)
        .bind(village.version)
        .execute(conn)
        .await?;

        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(DbError::Conflict(format!(
                "village {} changed since version {}",
                village.id, village.version
            )))
        }
    }
}

/// A row from the `villages` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VillageRow {
    /// Village id.
    pub id: Uuid,
    /// World id.
    pub world_id: Uuid,
    /// Current owner.
    pub owner_id: Uuid,
    /// Defender points.
    pub points: i64,
    /// Garrison composition as JSONB.
    pub garrison: serde_json::Value,
    /// Wall level.
    pub wall_level: i32,
    /// Building levels as JSONB.
    pub building_levels: serde_json::Value,
    /// Stored resources as JSONB.
    pub resources: serde_json::Value,
    /// Conquest meter.
    pub meter: Decimal,
    /// Last meter regen/decay instant.
    pub meter_updated_at: DateTime<Utc>,
    /// Control-mode uptime window start.
    pub uptime_started_at: Option<DateTime<Utc>>,
    /// Capture cooldown expiry.
    pub capture_cooldown_until: Option<DateTime<Utc>>,
    /// Anti-snipe window expiry.
    pub anti_snipe_until: Option<DateTime<Utc>>,
    /// Post-capture meter floor.
    pub allegiance_floor: Decimal,
    /// Capital flag.
    pub is_capital: bool,
    /// Last ownership change.
    pub conquered_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency counter.
    pub version: i64,
}

impl VillageRow {
    /// Decode the row into the typed village state.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if a JSONB column is not valid.
    pub fn into_village(self) -> Result<VillageState, DbError> {
        Ok(VillageState {
            id: VillageId::from(self.id),
            world_id: self.world_id.into(),
            owner_id: self.owner_id.into(),
            points: u32::try_from(self.points).unwrap_or(0),
            garrison: serde_json::from_value(self.garrison)?,
            wall_level: u32::try_from(self.wall_level).unwrap_or(0),
            building_levels: serde_json::from_value(self.building_levels)?,
            resources: serde_json::from_value(self.resources)?,
            meter: self.meter,
            meter_updated_at: self.meter_updated_at,
            uptime_started_at: self.uptime_started_at,
            capture_cooldown_until: self.capture_cooldown_until,
            anti_snipe_until: self.anti_snipe_until,
            allegiance_floor: self.allegiance_floor,
            is_capital: self.is_capital,
            conquered_at: self.conquered_at,
            version: self.version,
        })
    }
}
