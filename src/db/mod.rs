pub(crate) mod models;
pub(crate) mod types;

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};

use crate::core::config::{Settings, StoreBackend};
use crate::repositories::memory::MemoryStore;
use crate::repositories::postgres::PgStore;
use crate::repositories::Store;

pub(crate) async fn init_pool(settings: &Settings) -> Result<PgPool, sqlx::Error> {
    let database_url = settings.database().database_url();
    let mut connect_options: PgConnectOptions = database_url.parse()?;

    connect_options = connect_options
        .application_name("taskdesk")
        .log_statements(tracing::log::LevelFilter::Off);

    PgPoolOptions::new()
        .max_connections(settings.database().max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await
}

pub(crate) async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Builds the store selected by `TASKDESK_STORE`.
pub(crate) async fn connect_store(settings: &Settings) -> anyhow::Result<Arc<dyn Store>> {
    match settings.database().backend {
        StoreBackend::Postgres => {
            let pool = init_pool(settings).await?;
            run_migrations(&pool).await?;
            tracing::info!("Database migrations applied");
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; all data is lost on shutdown");
            Ok(Arc::new(MemoryStore::default()))
        }
    }
}
