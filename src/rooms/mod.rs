mod msg;
mod new;
pub mod relay;
mod room;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use relay::{Relay, RelayError, RoomSnapshot};
pub use ws::room_ws;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", post(new::new_room))
        .route("/{room_id}", get(room::room))
}
