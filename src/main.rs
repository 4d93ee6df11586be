use std::sync::Arc;

use anyhow::Result;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use medshare::{
    api::images,
    infra::{
        app_state::AppState,
        bootstrap::{self, bootstrap},
        config::{self, StoreBackend},
        db,
    },
    routes,
    store::{MarketplaceStore, MemoryStore, PgStore},
};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let config = config::load()?;

    let store: Arc<dyn MarketplaceStore> = match config.store {
        StoreBackend::Postgres => {
            tracing::info!("Running migrations...");
            let migrations_count =
                db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
            tracing::info!("Run {} new migrations successfully", migrations_count);

            Arc::new(PgStore::new(db::create_pool(&config.database).await?))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store, images::from_config(&config.images)?);
    let app = routes::app(state);

    tracing::info!("Bootstrapping...");
    bootstrap("MedShare", app, &config.server).await?;
    Ok(())
}
