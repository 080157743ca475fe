use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use savings_wallet_api::config::Config;
use savings_wallet_api::handlers::{self, AppState};
use savings_wallet_api::logging;

/// Main entry point for the application.
///
/// Loads configuration, installs tracing, builds the backend client and
/// services, and serves the JSON API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration first: it decides how verbose logging is
    let config = Config::from_env()?;
    logging::init(config.log_settings());
    tracing::info!("Configuration loaded successfully");
    tracing::debug!("Backend URL: {}", config.supabase_url);
    tracing::debug!("Server port: {}", config.port);

    let port = config.port;
    let state = Arc::new(AppState::new(&config)?);
    tracing::info!("Backend client initialized");

    // 10 requests/second per IP, burst of 20. Keeps PIN guessing slow.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let protected_routes = handlers::api_routes().layer(
        ServiceBuilder::new()
            // Forms are small; 1MB is plenty
            .layer(RequestBodyLimitLayer::new(1024 * 1024))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
