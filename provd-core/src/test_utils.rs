use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Helper to create an in-memory test database with migrations applied.
///
/// The pool is capped at one connection: every new connection to
/// `sqlite::memory:` opens its own empty database, so a larger pool would
/// hand out schemas the migrations never touched.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}
