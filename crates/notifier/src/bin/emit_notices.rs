//! `emit-notices`: flush every queued notice once and exit.
//!
//! Intended to be run periodically (cron, systemd timer). Overlapping runs are
//! harmless: a run that finds the emit lock taken exits immediately.

use herald_common::config::AppConfig;
use herald_common::db;
use herald_common::redis_pool::create_redis_pool;
use herald_notifier::Notifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald_notifier=info,herald_engine=info".into()),
        )
        .json()
        .init();

    tracing::info!("Emitting queued notices...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to database and Redis
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    db::run_migrations(&pool).await?;
    let mut redis = create_redis_pool(&config.redis_url).await?;

    let notifier = Notifier::new(pool, config.queue_all);

    match notifier
        .send_all(&mut redis, config.emit_lock_timeout_secs)
        .await
    {
        Ok(Some(report)) => {
            tracing::info!(
                sent = report.sent,
                batches = report.batches,
                "Emission finished"
            );
        }
        Ok(None) => {
            tracing::info!("Another emission run is in progress");
        }
        Err(e) => {
            tracing::error!(error = %e, "Emission failed");
            return Err(e);
        }
    }

    Ok(())
}
