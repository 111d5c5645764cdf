//! PostgreSQL pool factory and migration runner.
//!
//! The pool is built once during bootstrap and handed to the repositories
//! that need it; nothing in the workspace keeps a process-wide handle.

use std::time::Duration;

use anyhow::Context;
use shelf_kernel::settings::DatabaseSettings;
use shelf_kernel::Migration;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

/// Connection options derived from the database settings.
///
/// `statement_timeout` is set per session so the server aborts statements
/// that outlive the budget; dropping a query future client-side does not.
pub fn connect_options(settings: &DatabaseSettings) -> PgConnectOptions {
    let mut options = PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .database(&settings.name)
        .options([(
            "statement_timeout",
            format!("{}ms", settings.statement_timeout_ms),
        )]);

    if let Some(password) = settings.password.as_deref() {
        options = options.password(password);
    }

    options
}

/// Open a connection pool and verify the server answers.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    tracing::info!(
        target: "shelf-db",
        host = %settings.host,
        port = settings.port,
        database = %settings.name,
        "connecting to database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_millis(settings.statement_timeout_ms))
        .connect_with(connect_options(settings))
        .await
        .with_context(|| {
            format!(
                "failed to connect to postgres at {}:{}",
                settings.host, settings.port
            )
        })?;

    ping(&pool).await.context("database did not answer ping")?;

    tracing::info!(target: "shelf-db", "database connected");
    Ok(pool)
}

/// Round-trip a trivial statement.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
}

/// Apply module migrations in the given order.
///
/// Migrations are expected to be idempotent (`CREATE ... IF NOT EXISTS`);
/// they run on every startup and are not tracked.
pub async fn run_migrations(pool: &PgPool, migrations: &[(String, Migration)]) -> anyhow::Result<()> {
    for (module, migration) in migrations {
        tracing::info!(
            target: "shelf-db",
            module = %module,
            migration = migration.id,
            "applying migration"
        );

        sqlx::raw_sql(migration.up)
            .execute(pool)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
    }

    tracing::info!(target: "shelf-db", count = migrations.len(), "migrations applied");
    Ok(())
}
