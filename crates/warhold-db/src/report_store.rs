//! Battle report and metrics persistence.
//!
//! Reports are write-once and idempotent: the unique key on
//! `(command_id, perspective)` plus `ON CONFLICT DO NOTHING` means a
//! re-resolved command (after a worker crash) lands exactly the same rows
//! and the duplicates vanish. Metrics follow the same rule keyed on
//! `command_id` alone.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use warhold_types::{BattleMetrics, BattleReport, PlayerId};

use crate::codec::{
    building_from_db, building_to_db, intel_from_db, intel_to_db, outcome_from_db, outcome_to_db,
    perspective_from_db, perspective_to_db,
};
use crate::error::DbError;

/// Operations on the `battle_reports` and `battle_metrics` tables.
pub struct ReportStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportStore<'a> {
    /// Create a new report store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert one report row inside the caller's transaction.
    ///
    /// Idempotent per `(command_id, perspective)`: replaying the same
    /// resolution is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails or
    /// [`DbError::Serialization`] if a payload cannot be encoded.
    pub async fn insert_in(conn: &mut PgConnection, report: &BattleReport) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO battle_reports
                (id, battle_id, command_id, perspective, recipient_id, outcome, attacker,
                 defender, modifiers, wall_before, wall_after, building_target,
                 building_before, building_after, plunder, vault_protected, meter_before,
                 meter_after, village_captured, is_fake, defender_intel, report_version,
                 created_at)
              VALUES ($1, $2, $3, $4::battle_perspective, $5, $6::battle_outcome, $7, $8, $9,
                      $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
              ON CONFLICT (command_id, perspective) DO NOTHING",
        )
        .bind(report.id.into_inner())
        .bind(report.battle_id.into_inner())
        .bind(report.command_id.into_inner())
        .bind(perspective_to_db(report.perspective))
        .bind(report.recipient_id.into_inner())
        .bind(outcome_to_db(report.outcome))
        .bind(serde_json::to_value(&report.attacker)?)
        .bind(
            report
                .defender
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        )
        .bind(serde_json::to_value(&report.modifiers)?)
        .bind(i32::try_from(report.wall_before).unwrap_or(i32::MAX))
        .bind(i32::try_from(report.wall_after).unwrap_or(i32::MAX))
        .bind(report.building_target.map(building_to_db))
        .bind(report.building_before.map(|v| i32::try_from(v).unwrap_or(i32::MAX)))
        .bind(report.building_after.map(|v| i32::try_from(v).unwrap_or(i32::MAX)))
        .bind(serde_json::to_value(&report.plunder)?)
        .bind(serde_json::to_value(&report.vault_protected)?)
        .bind(report.meter_before)
        .bind(report.meter_after)
        .bind(report.village_captured)
        .bind(report.is_fake)
        .bind(intel_to_db(report.defender_intel))
        .bind(i16::from(report.report_version))
        .bind(report.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Insert the metrics row inside the caller's transaction.
    ///
    /// Idempotent per `command_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert_metrics_in(
        conn: &mut PgConnection,
        metrics: &BattleMetrics,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO battle_metrics
                (battle_id, command_id, world_id, attack_power, defense_power, attacker_sent,
                 attacker_lost, defender_sent, defender_lost, plunder_total, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
              ON CONFLICT (command_id) DO NOTHING",
        )
        .bind(metrics.battle_id.into_inner())
        .bind(metrics.command_id.into_inner())
        .bind(metrics.world_id.into_inner())
        .bind(metrics.attack_power)
        .bind(metrics.defense_power)
        .bind(i64::from(metrics.attacker_sent))
        .bind(i64::from(metrics.attacker_lost))
        .bind(i64::from(metrics.defender_sent))
        .bind(i64::from(metrics.defender_lost))
        .bind(i64::from(metrics.plunder_total))
        .bind(metrics.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Fetch the most recent reports delivered to one player.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails or
    /// [`DbError::Decode`] if a row cannot be decoded.
    pub async fn for_recipient(
        &self,
        recipient_id: PlayerId,
        limit: i64,
    ) -> Result<Vec<BattleReport>, DbError> {
        let rows = sqlx::query_as::<_, ReportRow>(
            r"SELECT id, battle_id, command_id, perspective::TEXT AS perspective, recipient_id,
                     outcome::TEXT AS outcome, attacker, defender, modifiers, wall_before,
                     wall_after, building_target, building_before, building_after, plunder,
                     vault_protected, meter_before, meter_after, village_captured, is_fake,
                     defender_intel, report_version, created_at
              FROM battle_reports
              WHERE recipient_id = $1
              ORDER BY created_at DESC
              LIMIT $2",
        )
        .bind(recipient_id.into_inner())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(ReportRow::into_report).collect()
    }
}

/// A row from the `battle_reports` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportRow {
    /// Report row id.
    pub id: Uuid,
    /// Shared battle id.
    pub battle_id: Uuid,
    /// Resolved command.
    pub command_id: Uuid,
    /// Perspective as a string (cast from the `PostgreSQL` enum).
    pub perspective: String,
    /// Recipient player.
    pub recipient_id: Uuid,
    /// Outcome as a string (cast from the `PostgreSQL` enum).
    pub outcome: String,
    /// Attacker breakdown as JSONB.
    pub attacker: serde_json::Value,
    /// Defender breakdown as JSONB, if visible.
    pub defender: Option<serde_json::Value>,
    /// Modifier set as JSONB.
    pub modifiers: serde_json::Value,
    /// Wall before.
    pub wall_before: i32,
    /// Wall after.
    pub wall_after: i32,
    /// Catapult target.
    pub building_target: Option<String>,
    /// Target level before.
    pub building_before: Option<i32>,
    /// Target level after.
    pub building_after: Option<i32>,
    /// Plunder as JSONB.
    pub plunder: serde_json::Value,
    /// Vault-protected share as JSONB.
    pub vault_protected: serde_json::Value,
    /// Meter before, when envoys were present.
    pub meter_before: Option<Decimal>,
    /// Meter after, when envoys were present.
    pub meter_after: Option<Decimal>,
    /// Capture flag.
    pub village_captured: bool,
    /// Feint flag carried from the command.
    pub is_fake: bool,
    /// Intel level string.
    pub defender_intel: String,
    /// Schema version.
    pub report_version: i16,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ReportRow {
    /// Decode the row into the typed report.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] or [`DbError::Serialization`] if any
    /// persisted value is not valid.
    pub fn into_report(self) -> Result<BattleReport, DbError> {
        Ok(BattleReport {
            id: self.id.into(),
            battle_id: self.battle_id.into(),
            command_id: self.command_id.into(),
            perspective: perspective_from_db(&self.perspective)?,
            recipient_id: self.recipient_id.into(),
            outcome: outcome_from_db(&self.outcome)?,
            attacker: serde_json::from_value(self.attacker)?,
            defender: self.defender.map(serde_json::from_value).transpose()?,
            modifiers: serde_json::from_value(self.modifiers)?,
            wall_before: u32::try_from(self.wall_before).unwrap_or(0),
            wall_after: u32::try_from(self.wall_after).unwrap_or(0),
            building_target: self
                .building_target
                .as_deref()
                .map(building_from_db)
                .transpose()?,
            building_before: self.building_before.map(|v| u32::try_from(v).unwrap_or(0)),
            building_after: self.building_after.map(|v| u32::try_from(v).unwrap_or(0)),
            plunder: serde_json::from_value(self.plunder)?,
            vault_protected: serde_json::from_value(self.vault_protected)?,
            meter_before: self.meter_before,
            meter_after: self.meter_after,
            village_captured: self.village_captured,
            is_fake: self.is_fake,
            defender_intel: intel_from_db(&self.defender_intel)?,
            report_version: self.report_version,
            created_at: self.created_at,
        })
    }
}
