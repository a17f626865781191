//! Engine daemon entry point for a Warhold world.
//!
//! The engine owns the asynchronous half of the command pipeline: it wakes
//! on a fixed tick, returns expired claims to the queue, and resolves every
//! command whose arrival instant has passed. Submission happens elsewhere;
//! the daemon only ever reads the durable queue.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `warhold.yaml` (or the first CLI argument)
//! 3. Connect to PostgreSQL and run migrations
//! 4. Run the resolution tick loop until Ctrl-C

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use warhold_core::config::WorldConfig;
use warhold_db::{PostgresConfig, PostgresPool};
use warhold_types::WorldId;

use warhold_engine::{EngineError, Resolver};

/// Application entry point for the engine daemon.
///
/// # Errors
///
/// Returns an error if configuration loading, database connectivity, or
/// migrations fail. Tick failures are logged and do not stop the daemon.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("warhold-engine starting");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("warhold.yaml"));
    let config = WorldConfig::from_file(Path::new(&config_path))?;
    let world_id = config
        .world
        .world_id
        .map(WorldId::from)
        .ok_or_else(|| EngineError::Config {
            context: String::from("world.world_id must be set"),
        })?;
    info!(
        world_name = config.world.name,
        world_id = %world_id,
        seed = config.world.seed,
        conquest_mode = ?config.conquest.mode,
        tick_interval_ms = config.scheduler.tick_interval_ms,
        "Configuration loaded"
    );

    let pool =
        PostgresPool::connect(&PostgresConfig::from_infrastructure(&config.infrastructure)).await?;
    pool.run_migrations().await?;
    info!("PostgreSQL connected, migrations applied");

    let tick_interval = Duration::from_millis(config.scheduler.tick_interval_ms);
    let resolver = Resolver::new(pool.pool().clone(), config, world_id);

    let mut interval = tokio::time::interval(tick_interval);
    info!("Entering resolution loop");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match resolver.tick(Utc::now()).await {
                    Ok(summary) => {
                        if summary.resolved > 0 || summary.failed > 0 || summary.reclaimed > 0 {
                            info!(
                                resolved = summary.resolved,
                                failed = summary.failed,
                                reclaimed = summary.reclaimed,
                                skipped = summary.skipped,
                                "Tick complete"
                            );
                        }
                    }
                    Err(err) => error!(error = %err, "Tick failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    pool.close().await;
    info!("warhold-engine stopped");
    Ok(())
}
