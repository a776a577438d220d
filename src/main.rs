use axum::{routing::get, Router};
use gstin_credibility_api::config::Config;
use gstin_credibility_api::handlers::{self, AppState};
use gstin_credibility_api::lookups::LookupStore;
use gstin_credibility_api::narrative::NarrativeEnricher;
use gstin_credibility_api::router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - The narrative enricher (language model client, circuit breaker, narrative cache).
/// - The lookup store.
/// - HTTP routes and middleware (CORS, Rate Limiting).
///
/// It then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gstin_credibility_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // The language model client is built here and injected; nothing global
    let enricher = NarrativeEnricher::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize narrative enricher: {}", e))?;
    tracing::info!("Narrative enricher initialized ({})", enricher.generator_name());

    // Lookups expire after 30 minutes
    let lookups = LookupStore::default();
    tracing::info!("Lookup store initialized (30m TTL, 10k capacity)");

    let app_state = Arc::new(AppState {
        config: config.clone(),
        enricher,
        lookups,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let protected_routes = router::api_routes().layer(
        ServiceBuilder::new()
            // Request bodies are a single GSTIN
            .layer(RequestBodyLimitLayer::new(64 * 1024))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // SmartIpKeyExtractor falls back to the peer address
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
