//! Startup and shutdown.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::application::AppContext;
use crate::config::AppConfig;
use crate::db;
use crate::dao::UserDao;
use crate::repository::UserRepository;
use crate::seed::{self, DirectorySemesters, EmbeddedSemesters, SemesterSource};

const DEFAULT_LOG_FILTER: &str = "sqlx=warn,avalia=debug,info";

/// Initialize logging with tracing_subscriber. `RUST_LOG` wins over
/// `filter`, which wins over the built-in default.
pub fn init_logging(filter: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter.unwrap_or(DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // A second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .compact()
        .with_target(false)
        .with_ansi(true)
        .try_init();
}

/// Brings the database up and builds the application context:
/// - connects and migrates (dropping the old file on `reload_database`)
/// - loads the configured semesters
/// - grants the configured administrator flags
pub async fn setup(config: &AppConfig) -> Result<AppContext> {
    let pool = db::init_db(&config.database)
        .await
        .context("failed to init db")?;

    let semesters = config.database.semesters()?;
    if !semesters.is_empty() {
        let source: Box<dyn SemesterSource> = match &config.database.seed_dir {
            Some(dir) => Box::new(DirectorySemesters::new(dir.clone())),
            None => Box::new(EmbeddedSemesters),
        };
        let reports = seed::seed_semesters(&pool, source.as_ref(), &semesters).await?;
        let added: usize = reports.iter().map(|r| r.classes_added).sum();
        tracing::info!("Catalogue ready: {} semester(s), {} new classes", reports.len(), added);
    }

    let users = UserRepository::new(UserDao::new(pool.clone()));
    for registration_number in &config.database.administrators {
        let granted = users
            .set_administrator(registration_number, true)
            .await
            .with_context(|| format!("failed to grant administrator to {registration_number}"))?;
        if !granted {
            tracing::warn!("Administrator {} is not registered", registration_number);
        }
    }

    Ok(AppContext::new(pool))
}

/// Closes the pool so the WAL is checkpointed.
pub async fn shutdown(ctx: AppContext) {
    tracing::info!("Shutting down");
    ctx.pool().close().await;
}
