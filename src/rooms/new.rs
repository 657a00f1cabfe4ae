use axum::{Json, debug_handler};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewRoom {
    room_id: String,
}

/// Mints a room token. The room itself comes into being on its first join.
#[debug_handler]
pub(crate) async fn new_room() -> Json<NewRoom> {
    Json(NewRoom {
        room_id: Uuid::now_v7().simple().to_string(),
    })
}
