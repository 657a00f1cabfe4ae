use crate::protocol::{ChatPayload, ClientEvent, ConnectionId, RoomRef};

use super::relay::{Relay, RelayError};

/// Applies one client event on behalf of `conn`.
///
/// The relay trusts the username recorded at join time, so the `username`
/// carried by chat, leave and kill events is only informational.
pub(crate) async fn dispatch(
    relay: &Relay,
    conn: ConnectionId,
    event: ClientEvent,
) -> Result<(), RelayError> {
    match event {
        ClientEvent::JoinRoom(RoomRef { room_id, username }) => {
            relay.join(conn, &room_id, &username).await
        }
        ClientEvent::ChatMessage(ChatPayload { room_id, message, .. }) => {
            relay.chat(conn, &room_id, message).await
        }
        ClientEvent::LeaveRoom(RoomRef { room_id, .. }) => relay.leave(conn, &room_id).await,
        ClientEvent::KillChat(RoomRef { room_id, .. }) => relay.kill(conn, &room_id).await,
    }
}
