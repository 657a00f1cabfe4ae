pub mod client;
pub mod config;
pub mod index;
pub mod protocol;
pub mod res;
pub mod rooms;

use axum::{Router, extract::FromRef, routing::get};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use rooms::Relay;

#[derive(Clone, Default, FromRef)]
pub struct AppState {
    pub relay: Relay,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index::index))
        .route("/ws", get(rooms::room_ws))
        .nest("/r", rooms::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Logs to stderr, filtered by `RUST_LOG` (default `kllchat=info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kllchat=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
