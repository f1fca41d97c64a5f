//! STACKS library catalog application.
//!
//! Wires the catalog modules onto the kernel, database and HTTP crates.

pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use sqlx::SqlitePool;
use stacks_kernel::settings::Settings;
use stacks_kernel::{InitCtx, ModuleRegistry};

use modules::books::catalog::Catalog;
use modules::books::isbn::GoogleBooksClient;
use modules::books::store::SqliteBookStore;

/// Catalog backed by the given pool and the configured ISBN service.
pub fn build_catalog(settings: &Settings, pool: &SqlitePool) -> anyhow::Result<Arc<Catalog>> {
    let isbn = GoogleBooksClient::new(&settings.isbn).context("failed to build ISBN client")?;

    Ok(Arc::new(Catalog::new(
        Arc::new(SqliteBookStore::new(pool.clone())),
        Arc::new(isbn),
        settings.catalog.clone(),
    )))
}

/// Registry holding every application module.
pub fn build_registry(settings: &Settings, pool: &SqlitePool) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, build_catalog(settings, pool)?);
    Ok(registry)
}

/// Apply pending migrations for all modules; returns how many ran.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let pool = stacks_db::connect(&settings.database).await?;
    let registry = build_registry(settings, &pool)?;

    let applied = stacks_db::migrate(&pool, &registry.collect_migrations()).await?;
    tracing::info!(applied, "migrations complete");

    pool.close().await;
    Ok(applied)
}

/// Connect, migrate, start every module and serve until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "stacks bootstrap starting"
    );

    let pool = stacks_db::connect(&settings.database).await?;
    let registry = build_registry(&settings, &pool)?;
    tracing::info!(modules = registry.module_count(), "modules registered");

    let applied = stacks_db::migrate(&pool, &registry.collect_migrations()).await?;
    tracing::info!(applied, "migrations complete");

    let ctx = InitCtx {
        settings: &settings,
        db: &pool,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = stacks_http::start_server(&registry, &settings).await;

    // Stop modules and close the pool even if the server failed
    let stopped = registry.stop_modules().await;
    pool.close().await;

    served?;
    stopped?;
    tracing::info!("stacks shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registry_contributes_book_migrations() {
        let pool = stacks_db::connect_in_memory().await.unwrap();
        let registry = build_registry(&Settings::default(), &pool).unwrap();

        assert_eq!(registry.module_count(), 1);
        assert!(registry.get_module("books").is_some());

        let migrations = registry.collect_migrations();
        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].0, "books");

        assert_eq!(stacks_db::migrate(&pool, &migrations).await.unwrap(), 1);
        assert_eq!(stacks_db::migrate(&pool, &migrations).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn migrate_creates_database_file() {
        let dir = std::env::temp_dir().join(format!("stacks-migrate-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("library.db");
        let _ = std::fs::remove_file(&path);

        let mut settings = Settings::default();
        settings.database.url = format!("sqlite://{}", path.display());

        assert_eq!(migrate(&settings).await.unwrap(), 1);
        assert!(path.exists());
        assert_eq!(migrate(&settings).await.unwrap(), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
