use async_trait::async_trait;
use axum::Router;
use sqlx::SqlitePool;

/// Shared state handed to modules at startup.
///
/// The pool is already migrated by the time a module sees it.
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
    pub db: &'a SqlitePool,
}

/// One schema step. `id` is unique within its module and sorts in apply order.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// A feature area mounted into the application: its routes, its tables and
/// its API description.
///
/// Startup runs, for every registered module:
/// 1. `migrations`, collected and applied before anything else
/// 2. `init`, then `start`, in registration order
///
/// `stop` runs in reverse order once the server has drained.
#[async_trait]
pub trait Module: Sync + Send {
    /// Stable name; also the key of this module's rows in the migration ledger.
    fn name(&self) -> &'static str;

    /// Check configuration and prepare state. Runs after every migration has
    /// been applied, so tables can be queried here. An error aborts startup.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes merged into the root router without a prefix.
    ///
    /// Paths must not collide with other modules or with `/healthz`, `/docs`
    /// and `/swagger-ui`. State is attached by the module, so the returned
    /// router needs none.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI `paths` and `components.schemas` to merge into the served
    /// document. Later modules win on duplicate keys.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Runs after `init` succeeded for every module.
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Release resources on shutdown.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
