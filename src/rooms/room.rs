use axum::{
    Json, debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::res;

use super::relay::Relay;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn room(State(relay): State<Relay>, Path(room_id): Path<String>) -> Response {
    match relay.snapshot(&room_id).await {
        Some(snapshot) => Json(snapshot).into_response(),
        None => res::sorry("room"),
    }
}
