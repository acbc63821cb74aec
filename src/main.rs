//! pogom-server entry point.
//!
//! Loads configuration, prepares the store, and serves the map API.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pogom_server::api;
use pogom_server::app_state::AppState;
use pogom_server::config::ScannerConfig;
use pogom_server::persistence::MapStore;
use pogom_server::service::{IngestService, MapQueryService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ScannerConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, "starting pogom-server");

    // Build persistence layer
    let store = MapStore::connect(&config)
        .await
        .context("opening the map store")?;
    store
        .create_tables()
        .await
        .context("creating the map schema")?;
    let backend = store.pool().backend();
    tracing::info!(
        backend,
        batch_size = config.upsert_batch_size,
        china_coordinates = config.china_coordinates,
        allowed_species = config.allow_list.len(),
        "store ready"
    );

    // Build service layer
    let ingest = Arc::new(IngestService::from_config(store.clone(), &config));
    let queries = Arc::new(MapQueryService::from_config(store, &config));

    // Build application state
    let app_state = AppState {
        ingest,
        queries,
        backend,
    };

    // Build router
    let app = Router::new().merge(api::build_router());
    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::openapi::ApiDoc::openapi()),
        )
    };
    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
