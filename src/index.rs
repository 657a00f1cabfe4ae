use axum::{debug_handler, extract::State};

use crate::rooms::Relay;

#[debug_handler(state = crate::AppState)]
pub async fn index(State(relay): State<Relay>) -> String {
    let stats = relay.stats().await;
    format!(
        "kllchat relay: {} connections, {} rooms\n",
        stats.connections, stats.rooms
    )
}
