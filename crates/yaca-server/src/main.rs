mod config;

use std::sync::Arc;

use tracing::info;

use yaca_api::password::CredentialHasher;
use yaca_api::{AppStateInner, ServiceOptions};
use yaca_db::{MemoryStorage, SqliteStorage, Storage};

use crate::config::{Config, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yaca=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Storage backend, fixed for the lifetime of the process
    let storage: Arc<dyn Storage> = match &config.storage {
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        StorageBackend::Sqlite { path } => Arc::new(SqliteStorage::new(path)),
    };
    storage.connect().await?;
    if config.reset_storage {
        storage.init().await?;
        info!("Storage reset at startup");
    }

    let options = ServiceOptions {
        jwt_secret: config.jwt_secret.clone(),
        token_ttl: config.token_ttl,
        hasher: CredentialHasher::new(config.argon2_memory_kib, config.argon2_iterations)?,
        gateway_access: config.gateway_access,
    };
    let state = AppStateInner::build(storage.clone(), options);
    let app = yaca_api::router(state);

    info!(
        "YACA server listening on {} ({:?} storage, gateway {:?})",
        config.addr, config.storage, config.gateway_access
    );

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    storage.close().await?;
    info!("YACA server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
