use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

use crate::config::DatabaseConfig;

/// Configure SQLite pragmas for every new connection.
async fn configure_sqlite_pragmas(conn: &mut sqlx::SqliteConnection) -> Result<(), sqlx::Error> {
    use sqlx::Executor;

    conn.execute("PRAGMA journal_mode = WAL").await?;
    conn.execute("PRAGMA synchronous = NORMAL").await?;
    // Prevents "database locked" while a background load and a write overlap
    conn.execute("PRAGMA busy_timeout = 5000").await?;
    // Cascades for reviews/reports depend on this
    conn.execute("PRAGMA foreign_keys = ON").await?;

    Ok(())
}

/// Connect to the database file and bring the schema up to date.
pub async fn init_db(config: &DatabaseConfig) -> Result<SqlitePool> {
    let db_path = config.path.as_path();

    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create data dir: {}", dir.display()))?;
    }

    if config.reload_database {
        remove_database_files(db_path)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::info!("Database URL: {}", db_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                configure_sqlite_pragmas(conn).await?;
                Ok(())
            })
        })
        .connect(&db_url)
        .await
        .with_context(|| format!("failed to connect to database at {}", db_path.display()))?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    tracing::info!("Database initialized at {}", db_path.display());
    Ok(pool)
}

/// Removes the database file and its WAL side files, if present.
fn remove_database_files(db_path: &Path) -> Result<()> {
    let mut removed = false;
    for suffix in ["", "-wal", "-shm"] {
        let mut file = db_path.as_os_str().to_owned();
        file.push(suffix);
        let file = Path::new(&file);
        if file.exists() {
            std::fs::remove_file(file)
                .with_context(|| format!("failed to remove {}", file.display()))?;
            removed = true;
        }
    }
    if removed {
        tracing::warn!("Reloading database: removed {}", db_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::UserDao;
    use crate::test_utils::fixtures;

    fn config_for(dir: &Path) -> DatabaseConfig {
        DatabaseConfig {
            path: dir.join("nested").join("avalia.db"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_init_db_creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        let pool = init_db(&config).await.expect("init failed");
        assert!(config.path.exists());

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' AND name <> 'sqlite_sequence' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(
            tables,
            vec!["classes", "departments", "reports", "reviews", "semesters", "subjects", "teachers", "users"]
        );
        pool.close().await;
    }

    #[tokio::test]
    async fn test_data_survives_reconnect_and_reload_clears_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(dir.path());

        let pool = init_db(&config).await.unwrap();
        UserDao::new(pool.clone())
            .insert_user(&fixtures::student("123456789"))
            .await
            .unwrap();
        pool.close().await;

        let pool = init_db(&config).await.unwrap();
        assert!(UserDao::new(pool.clone())
            .is_registration_number_in_use("123456789")
            .await
            .unwrap());
        pool.close().await;

        config.reload_database = true;
        let pool = init_db(&config).await.unwrap();
        assert!(!UserDao::new(pool.clone())
            .is_registration_number_in_use("123456789")
            .await
            .unwrap());
        pool.close().await;
    }
}
