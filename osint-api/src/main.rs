//! OSINT Search Dashboard API Server
//!
//! HTTP API server that fans searches out to OSINT vendors and serves
//! normalized results.

mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use osint_normalize::Registry;
use osint_services::{Aggregator, AggregatorConfig, SearchSession};
use osint_vendors::{HttpVendorClient, VendorCredentials, VendorFetcher};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: &'static Registry,
    pub fetcher: Arc<dyn VendorFetcher>,
    pub aggregator: Aggregator,
    pub session: Arc<SearchSession>,
}

impl AppState {
    pub fn new(fetcher: Arc<dyn VendorFetcher>, config: AggregatorConfig) -> Self {
        let aggregator = Aggregator::new(Arc::clone(&fetcher), config);
        Self {
            registry: Registry::builtin(),
            fetcher,
            session: Arc::new(SearchSession::new(aggregator.clone())),
            aggregator,
        }
    }
}

/// Build the full application router
pub fn app(state: AppState) -> Router {
    // Configure CORS for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,osint_api=debug")),
        )
        .init();

    info!("Starting OSINT Search Dashboard API");

    let credentials = VendorCredentials::from_env();
    let configured = credentials.configured_vendors();
    info!(
        "{} of {} vendors configured",
        configured.len(),
        Registry::builtin().len()
    );

    let config = AggregatorConfig::from_env();
    info!(
        "Vendor timeout {}s, max concurrency {}",
        config.vendor_timeout.as_secs(),
        config
            .max_concurrency
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unbounded".to_string())
    );

    let client = HttpVendorClient::new(credentials);
    let state = AppState::new(Arc::new(client), config);

    // Start server
    let port = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
