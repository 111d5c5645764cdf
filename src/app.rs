//! Process bootstrap: storage, migrations, module lifecycle and the HTTP server.

use std::sync::Arc;

use anyhow::Context;
use shelf_kernel::settings::{DatabaseBackend, Settings};
use shelf_kernel::{InitCtx, ModuleRegistry};
use sqlx::PgPool;

use crate::modules;
use crate::modules::books::repository::{
    BookRepository, InMemoryBookRepository, PgBookRepository,
};

/// Storage selected by `database.backend`.
#[derive(Clone)]
pub enum Storage {
    Postgres(PgPool),
    Memory(Arc<InMemoryBookRepository>),
}

impl Storage {
    /// Connect to the configured backend.
    pub async fn connect(settings: &Settings) -> anyhow::Result<Self> {
        match settings.database.backend {
            DatabaseBackend::Postgres => {
                let pool = shelf_db::connect(&settings.database).await?;
                Ok(Storage::Postgres(pool))
            }
            DatabaseBackend::Memory => {
                tracing::warn!("using in-memory storage; books are lost on shutdown");
                Ok(Storage::Memory(Arc::new(InMemoryBookRepository::new())))
            }
        }
    }

    /// Repository handle for the books module.
    pub fn book_repository(&self) -> Arc<dyn BookRepository> {
        match self {
            Storage::Postgres(pool) => Arc::new(PgBookRepository::new(pool.clone())),
            Storage::Memory(repository) => repository.clone(),
        }
    }

    /// Apply every module's migrations. The memory backend has no schema.
    pub async fn migrate(&self, registry: &ModuleRegistry) -> anyhow::Result<()> {
        match self {
            Storage::Postgres(pool) => {
                shelf_db::run_migrations(pool, &registry.collect_migrations()).await
            }
            Storage::Memory(_) => Ok(()),
        }
    }

    pub async fn close(&self) {
        if let Storage::Postgres(pool) = self {
            pool.close().await;
        }
    }
}

async fn bootstrap(settings: &Settings) -> anyhow::Result<(Storage, ModuleRegistry)> {
    let storage = Storage::connect(settings)
        .await
        .context("failed to open storage")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, settings, &storage)?;

    storage
        .migrate(&registry)
        .await
        .context("failed to apply migrations")?;

    Ok((storage, registry))
}

/// Run the service until a shutdown signal arrives.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let (storage, registry) = bootstrap(&settings).await?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;
    tracing::info!(modules = registry.len(), "shelf bootstrap complete");

    let served =
        shelf_http::start_server(&registry, &settings.server, shelf_http::shutdown_signal()).await;

    shutdown(&registry, &storage, served).await
}

/// Stop modules and close storage. Storage is closed even when a module
/// fails to stop; a server error is reported ahead of the stop failure.
async fn shutdown(
    registry: &ModuleRegistry,
    storage: &Storage,
    served: anyhow::Result<()>,
) -> anyhow::Result<()> {
    let stopped = registry.stop_modules().await;
    storage.close().await;

    match (served, stopped) {
        (Err(err), Err(stop_err)) => {
            Err(err.context(format!("modules also failed to stop: {stop_err:#}")))
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(()), stopped) => stopped.context("failed to stop modules"),
    }
}

/// Apply migrations and exit.
pub async fn migrate(settings: Settings) -> anyhow::Result<()> {
    let (storage, registry) = bootstrap(&settings).await?;
    tracing::info!(
        migrations = registry.collect_migrations().len(),
        "migrations complete"
    );
    storage.close().await;
    Ok(())
}
