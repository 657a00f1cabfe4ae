//! Event frames exchanged over the room socket.
//!
//! Every frame is a JSON text frame shaped like a socket.io event:
//! `{"event": "chatMessage", "data": {...}}`. Unit events carry no `data`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-assigned identity of one socket connection.
pub type ConnectionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRef {
    pub room_id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    pub room_id: String,
    pub username: String,
    pub message: String,
}

/// Events a client emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    JoinRoom(RoomRef),
    ChatMessage(ChatPayload),
    LeaveRoom(RoomRef),
    KillChat(RoomRef),
}

/// Events the relay pushes to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// First frame on every connection.
    Connected { connection_id: ConnectionId },
    Message {
        username: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_id: Option<ConnectionId>,
    },
    SystemMessage(String),
    ChatKilled,
    RoomData { users: Vec<String> },
}

impl ClientEvent {
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_frame(frame: &str) -> serde_json::Result<Self> {
        serde_json::from_str(frame)
    }

    pub fn room_id(&self) -> &str {
        match self {
            ClientEvent::JoinRoom(r) | ClientEvent::LeaveRoom(r) | ClientEvent::KillChat(r) => {
                &r.room_id
            }
            ClientEvent::ChatMessage(p) => &p.room_id,
        }
    }
}

impl ServerEvent {
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_frame(frame: &str) -> serde_json::Result<Self> {
        serde_json::from_str(frame)
    }
}
