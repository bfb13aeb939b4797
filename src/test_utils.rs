use sqlx::SqlitePool;

use crate::seed::{self, EmbeddedSemesters};

/// In-memory database with migrations applied and every built-in semester
/// loaded. Used by the benchmarks and integration tests.
pub async fn seeded_memory_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    seed::seed_semesters(&pool, &EmbeddedSemesters, &EmbeddedSemesters::available())
        .await
        .expect("Failed to seed built-in semesters");
    pool
}
