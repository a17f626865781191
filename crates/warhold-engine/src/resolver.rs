//! The resolution tick: claim due commands, resolve them, persist the
//! results atomically.
//!
//! One resolver serializes one world. Every tick it first returns expired
//! claims to the queue, then walks the due commands in `(arrival_at,
//! sequence)` order. Each command is claimed with a fresh fencing token,
//! resolved by the pure core, and committed in a single transaction that
//! covers the village writes, both report perspectives, the metrics row,
//! the audit log entry, and the acknowledge. A crash anywhere before the
//! commit leaves the command claimed; the claim times out, the command is
//! reclaimed, and the deterministic re-resolution produces the same rows,
//! which the idempotent artifact writes absorb.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use warhold_core::battle::{self, BattleResolution};
use warhold_core::config::WorldConfig;
use warhold_core::conquest::{engine_for, ConquestEngine};
use warhold_core::error::BattleError;
use warhold_core::report;
use warhold_db::{CommandStore, ConquestLog, DbError, ReportStore, VillageStore};
use warhold_types::{Command, CommandType, VillageState, WorldId};

use crate::error::EngineError;

/// What one tick accomplished.
#[derive(Debug, Default, Clone, Copy)]
pub struct TickSummary {
    /// Expired claims returned to the queue.
    pub reclaimed: u64,
    /// Commands resolved and acknowledged.
    pub resolved: u64,
    /// Commands marked failed (terminal).
    pub failed: u64,
    /// Commands skipped (claimed elsewhere or fenced out mid-flight).
    pub skipped: u64,
}

/// How one command left the pipeline.
enum Disposition {
    Resolved,
    Failed,
    Skipped,
}

/// Resolves due commands for a single world.
pub struct Resolver {
    pool: PgPool,
    config: WorldConfig,
    engine: Box<dyn ConquestEngine>,
    world_id: WorldId,
}

impl Resolver {
    /// Create a resolver for one world. The conquest engine is chosen from
    /// the configured mode.
    pub fn new(pool: PgPool, config: WorldConfig, world_id: WorldId) -> Self {
        let engine = engine_for(&config.conquest);
        Self {
            pool,
            config,
            engine,
            world_id,
        }
    }

    /// Run one resolution tick at the given instant.
    ///
    /// A failure on one command is logged and does not stop the rest of
    /// the batch.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] if the reclaim sweep or the due
    /// query itself fails.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickSummary, EngineError> {
        let commands = CommandStore::new(&self.pool);
        let mut summary = TickSummary::default();

        let claim_timeout =
            Duration::seconds(i64::try_from(self.config.scheduler.claim_timeout_secs).unwrap_or(60));
        let cutoff = now.checked_sub_signed(claim_timeout).unwrap_or(now);
        summary.reclaimed = commands.reclaim_expired(self.world_id, cutoff).await?;

        let due = commands
            .due_before(self.world_id, now, self.config.scheduler.batch_limit)
            .await?;

        for command in &due {
            match self.process(command, now).await {
                Ok(Disposition::Resolved) => summary.resolved = summary.resolved.saturating_add(1),
                Ok(Disposition::Failed) => summary.failed = summary.failed.saturating_add(1),
                Ok(Disposition::Skipped) => summary.skipped = summary.skipped.saturating_add(1),
                Err(err) => {
                    // The claim is left in place; the timeout sweep will
                    // return the command to the queue for a later tick.
                    error!(
                        command_id = %command.id,
                        error = %err,
                        "Command resolution failed, leaving claim to expire"
                    );
                }
            }
        }
        Ok(summary)
    }

    /// Claim and resolve one command.
    async fn process(
        &self,
        command: &Command,
        now: DateTime<Utc>,
    ) -> Result<Disposition, EngineError> {
        let commands = CommandStore::new(&self.pool);
        let token = Uuid::new_v4();
        if !commands.claim(command.id, token, now).await? {
            // Another worker won the claim, or the command was canceled.
            return Ok(Disposition::Skipped);
        }

        match command.command_type {
            CommandType::Support => self.resolve_support(command, token).await,
            CommandType::Attack | CommandType::Scout => {
                self.resolve_battle(command, token, now).await
            }
        }
    }

    /// Merge a support command's units into the target garrison.
    async fn resolve_support(
        &self,
        command: &Command,
        token: Uuid,
    ) -> Result<Disposition, EngineError> {
        let villages = VillageStore::new(&self.pool);

        for _ in 0..=self.config.scheduler.max_conflict_retries {
            let Some(mut village) = villages.fetch(command.target_village_id).await? else {
                return self.fail(command, token, "target village missing").await;
            };
            battle::apply_support(&mut village, &command.units);

            let mut tx = self.pool.begin().await.map_err(DbError::from)?;
            match VillageStore::update_in(&mut *tx, &village).await {
                Ok(()) => {}
                Err(DbError::Conflict(detail)) => {
                    tx.rollback().await.map_err(DbError::from)?;
                    warn!(command_id = %command.id, detail, "Support write conflicted, retrying");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
            if !CommandStore::acknowledge_in(&mut *tx, command.id, token).await? {
                tx.rollback().await.map_err(DbError::from)?;
                return Ok(Disposition::Skipped);
            }
            tx.commit().await.map_err(DbError::from)?;

            info!(
                command_id = %command.id,
                village_id = %command.target_village_id,
                units = command.total_units(),
                "Support stationed"
            );
            return Ok(Disposition::Resolved);
        }
        Err(EngineError::Conflict {
            context: format!("support write on village {}", command.target_village_id),
        })
    }

    /// Resolve an attack or scout command and commit all artifacts.
    async fn resolve_battle(
        &self,
        command: &Command,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Disposition, EngineError> {
        let villages = VillageStore::new(&self.pool);
        let attacker_points = villages
            .player_points(self.world_id, command.attacker_id)
            .await?;

        for _ in 0..=self.config.scheduler.max_conflict_retries {
            let Some(target) = villages.fetch(command.target_village_id).await? else {
                return self.fail(command, token, "target village missing").await;
            };

            let resolution = match battle::resolve(
                command,
                attacker_points,
                &target,
                &self.config,
                self.engine.as_ref(),
                self.config.world.seed,
            ) {
                Ok(resolution) => resolution,
                Err(BattleError::MalformedComposition { context }) => {
                    return self.fail(command, token, &context).await;
                }
                Err(err) => return Err(err.into()),
            };

            // The source village is credited in the same transaction, so
            // its version is read fresh on every retry too.
            let source = self.credited_source(command, &resolution).await?;

            let reports = report::build_reports(command, &resolution, now);
            let metrics = report::build_metrics(command, &resolution, now);
            let attempt = report::build_attempt(command, &resolution);

            let mut tx = self.pool.begin().await.map_err(DbError::from)?;
            let villages_written = async {
                VillageStore::update_in(&mut *tx, &resolution.updated_village).await?;
                if let Some(source) = &source {
                    VillageStore::update_in(&mut *tx, source).await?;
                }
                Ok::<_, DbError>(())
            }
            .await;
            match villages_written {
                Ok(()) => {}
                Err(DbError::Conflict(detail)) => {
                    tx.rollback().await.map_err(DbError::from)?;
                    warn!(command_id = %command.id, detail, "Battle write conflicted, retrying");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }

            for battle_report in &reports {
                ReportStore::insert_in(&mut *tx, battle_report).await?;
            }
            ReportStore::insert_metrics_in(&mut *tx, &metrics).await?;
            if let Some(attempt) = &attempt {
                ConquestLog::append_in(&mut *tx, attempt).await?;
            }
            if !CommandStore::acknowledge_in(&mut *tx, command.id, token).await? {
                // Fenced out: the claim expired and was reclaimed while we
                // were resolving. Drop everything; the next holder redoes it.
                tx.rollback().await.map_err(DbError::from)?;
                warn!(command_id = %command.id, "Claim fenced out before commit");
                return Ok(Disposition::Skipped);
            }
            tx.commit().await.map_err(DbError::from)?;

            let captured = resolution.conquest.is_some_and(|c| c.captured);
            info!(
                command_id = %command.id,
                battle_id = %resolution.battle_id,
                outcome = ?resolution.outcome,
                attacker_lost = resolution.attacker.total_lost(),
                defender_lost = resolution.defender.total_lost(),
                captured,
                "Battle resolved"
            );
            return Ok(Disposition::Resolved);
        }
        Err(EngineError::Conflict {
            context: format!("battle write on village {}", command.target_village_id),
        })
    }

    /// Source village with returning survivors and plunder merged in, when
    /// there is anything to credit and the village still exists.
    async fn credited_source(
        &self,
        command: &Command,
        resolution: &BattleResolution,
    ) -> Result<Option<VillageState>, EngineError> {
        let has_returns = !resolution.returning_units.is_empty();
        let has_plunder = resolution.plunder.values().any(|amount| *amount > 0);
        if !has_returns && !has_plunder {
            return Ok(None);
        }

        let villages = VillageStore::new(&self.pool);
        let Some(mut source) = villages.fetch(command.source_village_id).await? else {
            warn!(
                command_id = %command.id,
                village_id = %command.source_village_id,
                "Source village missing, survivors and plunder are lost"
            );
            return Ok(None);
        };
        battle::apply_support(&mut source, &resolution.returning_units);
        for (&kind, &amount) in &resolution.plunder {
            let entry = source.resources.entry(kind).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
        Ok(Some(source))
    }

    /// Mark a command terminally failed.
    async fn fail(
        &self,
        command: &Command,
        token: Uuid,
        reason: &str,
    ) -> Result<Disposition, EngineError> {
        let commands = CommandStore::new(&self.pool);
        if commands.fail(command.id, token, reason).await? {
            warn!(command_id = %command.id, reason, "Command failed terminally");
            Ok(Disposition::Failed)
        } else {
            Ok(Disposition::Skipped)
        }
    }
}
