use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::Method;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Level};

use gelt_tracker_backend::domain::hebcal::{HebcalClient, HebrewCalendar, NullHebrewCalendar};
use gelt_tracker_backend::rest::{api_router, AppState};
use gelt_tracker_backend::Backend;

/// Data directory: `GELT_TRACKER_DATA_DIR` when set, otherwise a
/// `gelt-tracker` folder under the platform data directory.
fn data_directory() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("GELT_TRACKER_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    Ok(dirs::data_dir()
        .context("Could not determine platform data directory")?
        .join("gelt-tracker"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let data_dir = data_directory()?;
    info!("Using data directory {:?}", data_dir);

    // Offline mode skips the Hebrew date conversion; entries are stored
    // without enrichment.
    let calendar: Arc<dyn HebrewCalendar> = if std::env::var("GELT_TRACKER_OFFLINE").is_ok() {
        info!("Offline mode: Hebrew calendar lookups disabled");
        Arc::new(NullHebrewCalendar)
    } else {
        Arc::new(HebcalClient::new())
    };

    let backend = Arc::new(Backend::new(&data_dir, calendar)?);
    let state = AppState::new(backend);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api", api_router())
        .layer(cors)
        .with_state(state);

    let port = std::env::var("GELT_TRACKER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000u16);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
