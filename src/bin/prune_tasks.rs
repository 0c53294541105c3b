//! Deletes task records older than the retention age.
//!
//! Usage:
//!
//! ```text
//! prune_tasks [max-age-seconds]
//! ```
//!
//! Without an argument the age comes from `TASKS_MAX_AGE_SECONDS` (one day
//! by default). The database is chosen by `TASKS_DATABASE` and its URL
//! variable, see [`tasktrail::config`]. Log verbosity follows `RUST_LOG`.
//!
//! The binary performs a single pass and exits; schedule it with cron or a
//! systemd timer.

use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use std::process::ExitCode;
use std::sync::Arc;
use tasktrail::config::{ConfigError, TaskTrackingConfig};
use tasktrail::task::{
    adapters::postgres::{PostgresTaskRecordRepository, TaskPgPool},
    services::{TaskManager, TaskManagerError},
};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Boxed error type for pool construction failures.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during a retention run.
#[derive(Debug, Error)]
enum PruneError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build connection pool: {0}")]
    Pool(#[source] BoxError),
    #[error(transparent)]
    Manager(#[from] TaskManagerError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run().await {
        Ok(deleted) => {
            info!(deleted, "retention run finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "retention run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<u64, PruneError> {
    let config = TaskTrackingConfig::from_env()?;
    let max_age = parse_max_age(std::env::args().skip(1), config.max_task_age_secs())?;
    let url = config.database_url()?;
    info!(
        database = config.database_label(),
        max_age, "pruning task records"
    );

    let pool: TaskPgPool = Pool::builder()
        .max_size(1)
        .build(ConnectionManager::new(url))
        .map_err(|err| PruneError::Pool(Box::new(err)))?;
    let manager = TaskManager::new(
        Arc::new(PostgresTaskRecordRepository::new(pool)),
        Arc::new(DefaultClock),
        &config,
    )
    .await?;

    Ok(manager.delete_old_tasks(max_age).await?)
}

fn parse_max_age(
    mut args: impl Iterator<Item = String>,
    configured: u64,
) -> Result<u64, PruneError> {
    let Some(raw) = args.next() else {
        return Ok(configured);
    };
    if args.next().is_some() {
        return Err(PruneError::InvalidArgs(
            "expected at most one argument, the maximum age in seconds".into(),
        ));
    }
    raw.trim().parse().map_err(|err| {
        PruneError::InvalidArgs(format!("max age '{raw}' is not a number of seconds: {err}"))
    })
}
