mod config;
mod error;
mod routes;

use std::sync::Arc;

use config::AppConfig;
use fadi_core::{CacheStore, CatalogService, SyncSettings};
use routes::{app_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fadi_api=info".parse()?)
                .add_directive("fadi_core=info".parse()?),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting fadi-api with config: {:?}", config);

    let service = Arc::new(CatalogService::new(
        config.catalog.build_source()?,
        Arc::new(CacheStore::new()),
        SyncSettings::from_config(&config.catalog),
    ));
    if !config.catalog.is_configured() {
        tracing::warn!("WooCommerce credentials missing; catalog routes will serve empty lists");
    }

    let warm = service.clone();
    tokio::spawn(async move {
        if let Err(error) = warm.get_catalog().await {
            tracing::warn!("Initial catalog load failed; will retry on first request: {error}");
        }
    });

    let state = AppState::new(service, config.admin_token.clone());
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("fadi-api listening on {}", config.bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
