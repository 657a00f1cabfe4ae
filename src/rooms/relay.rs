use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{
    Mutex,
    mpsc::{self, error::TrySendError},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::{ConnectionId, ServerEvent};

pub const MAX_ROOM_ID_LEN: usize = 64;
pub const MAX_USERNAME_LEN: usize = 32;

/// Events buffered per connection before it counts as lagging and is dropped.
pub const OUTBOX_CAPACITY: usize = 64;

/// Killed room ids remembered so they cannot be revived. Oldest are forgotten first.
pub const MAX_TOMBSTONES: usize = 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    #[error("not a member of room {0}")]
    NotAMember(String),

    #[error("room {0} has been killed")]
    RoomKilled(String),

    #[error("invalid room id {0:?}")]
    InvalidRoomId(String),

    #[error("invalid username {0:?}")]
    InvalidUsername(String),
}

pub type Outbox = mpsc::Sender<ServerEvent>;
pub type Inbox = mpsc::Receiver<ServerEvent>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Membership {
    room_id: String,
    username: String,
}

struct Connection {
    outbox: Outbox,
    membership: Option<Membership>,
}

#[derive(Default)]
struct Room {
    // join order
    members: Vec<(ConnectionId, String)>,
}

impl Room {
    fn users(&self) -> Vec<String> {
        self.members.iter().map(|(_, name)| name.clone()).collect()
    }

    fn member_ids(&self) -> Vec<ConnectionId> {
        self.members.iter().map(|(id, _)| *id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: String,
    pub users: Vec<String>,
    pub live: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelayStats {
    pub connections: usize,
    pub rooms: usize,
}

#[derive(Default)]
struct Tombstones {
    order: VecDeque<String>,
    ids: HashSet<String>,
}

impl Tombstones {
    fn contains(&self, room_id: &str) -> bool {
        self.ids.contains(room_id)
    }

    fn insert(&mut self, room_id: String) {
        if !self.ids.insert(room_id.clone()) {
            return;
        }
        self.order.push_back(room_id);
        if self.order.len() > MAX_TOMBSTONES {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

#[derive(Default)]
struct Directory {
    connections: HashMap<ConnectionId, Connection>,
    // live rooms only
    rooms: HashMap<String, Room>,
    killed: Tombstones,
    lagging: Vec<ConnectionId>,
}

impl Directory {
    fn membership(&self, conn: ConnectionId) -> Result<Option<&Membership>, RelayError> {
        self.connections
            .get(&conn)
            .map(|c| c.membership.as_ref())
            .ok_or(RelayError::UnknownConnection(conn))
    }

    /// Membership of `conn` in exactly `room_id`.
    fn member_of(&self, conn: ConnectionId, room_id: &str) -> Result<Membership, RelayError> {
        match self.membership(conn)? {
            Some(m) if m.room_id == room_id.trim() => Ok(m.clone()),
            _ => Err(RelayError::NotAMember(room_id.to_owned())),
        }
    }

    fn send(&mut self, conn: ConnectionId, event: ServerEvent) {
        let Some(c) = self.connections.get(&conn) else {
            return;
        };
        match c.outbox.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.lagging.push(conn),
            // receiver gone means the socket is closing; disconnect cleans up
            Err(TrySendError::Closed(_)) => {}
        }
    }

    fn broadcast(&mut self, room_id: &str, event: &ServerEvent) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        for id in room.member_ids() {
            self.send(id, event.clone());
        }
    }

    fn room_data(&mut self, room_id: &str) {
        if let Some(room) = self.rooms.get(room_id) {
            let event = ServerEvent::RoomData { users: room.users() };
            self.broadcast(room_id, &event);
        }
    }

    /// Drops the current membership of `conn`, if any, and tells the rest of the room.
    fn detach(&mut self, conn: ConnectionId) -> Option<Membership> {
        let membership = self.connections.get_mut(&conn)?.membership.take()?;

        let Some(room) = self.rooms.get_mut(&membership.room_id) else {
            return Some(membership);
        };
        room.members.retain(|(id, _)| *id != conn);

        if room.members.is_empty() {
            self.rooms.remove(&membership.room_id);
            debug!(room_id = %membership.room_id, "room empty, removed");
        } else {
            self.broadcast(
                &membership.room_id,
                &ServerEvent::SystemMessage(format!("{} has left the chat", membership.username)),
            );
            self.room_data(&membership.room_id);
        }

        Some(membership)
    }

    /// Drops connections whose outbox overflowed. Their sockets close once the
    /// writer sees the outbox end.
    fn evict_lagging(&mut self) {
        while let Some(conn) = self.lagging.pop() {
            if !self.connections.contains_key(&conn) {
                continue;
            }
            let membership = self.detach(conn);
            self.connections.remove(&conn);
            warn!(
                connection_id = %conn,
                room_id = membership.as_ref().map(|m| m.room_id.as_str()),
                "outbox full, connection dropped"
            );
        }
    }
}

/// Connection registry and room directory behind one lock.
#[derive(Clone, Default)]
pub struct Relay {
    inner: Arc<Mutex<Directory>>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection. The returned inbox already holds its `connected` event.
    pub async fn connect(&self) -> (ConnectionId, Inbox) {
        let id = Uuid::now_v7();
        let (outbox, inbox) = mpsc::channel(OUTBOX_CAPACITY);
        let _ = outbox.try_send(ServerEvent::Connected { connection_id: id });

        self.inner.lock().await.connections.insert(
            id,
            Connection {
                outbox,
                membership: None,
            },
        );
        debug!(connection_id = %id, "connected");

        (id, inbox)
    }

    pub async fn join(
        &self,
        conn: ConnectionId,
        room_id: &str,
        username: &str,
    ) -> Result<(), RelayError> {
        let room_id = validate(room_id, MAX_ROOM_ID_LEN)
            .ok_or_else(|| RelayError::InvalidRoomId(room_id.to_owned()))?;
        let username = validate(username, MAX_USERNAME_LEN)
            .ok_or_else(|| RelayError::InvalidUsername(username.to_owned()))?;

        let mut dir = self.inner.lock().await;

        let wanted = Membership {
            room_id: room_id.clone(),
            username: username.clone(),
        };
        if dir.membership(conn)? == Some(&wanted) {
            dir.room_data(&room_id);
            dir.evict_lagging();
            return Ok(());
        }
        if dir.killed.contains(&room_id) {
            return Err(RelayError::RoomKilled(room_id));
        }

        dir.detach(conn);

        // existing members only, the joiner is not in the room yet
        dir.broadcast(
            &room_id,
            &ServerEvent::SystemMessage(format!("{username} has joined the chat")),
        );
        dir.rooms
            .entry(room_id.clone())
            .or_default()
            .members
            .push((conn, username.clone()));
        if let Some(c) = dir.connections.get_mut(&conn) {
            c.membership = Some(wanted);
        }
        dir.room_data(&room_id);
        dir.evict_lagging();

        info!(%room_id, %username, connection_id = %conn, "joined");
        Ok(())
    }

    /// Relays `message` to every member of `room_id`, the sender included.
    pub async fn chat(
        &self,
        conn: ConnectionId,
        room_id: &str,
        message: String,
    ) -> Result<(), RelayError> {
        let mut dir = self.inner.lock().await;
        let membership = dir.member_of(conn, room_id)?;

        dir.broadcast(
            &membership.room_id,
            &ServerEvent::Message {
                username: membership.username,
                message,
                sender_id: Some(conn),
            },
        );
        dir.evict_lagging();
        Ok(())
    }

    pub async fn leave(&self, conn: ConnectionId, room_id: &str) -> Result<(), RelayError> {
        let mut dir = self.inner.lock().await;
        dir.member_of(conn, room_id)?;

        if let Some(m) = dir.detach(conn) {
            info!(room_id = %m.room_id, username = %m.username, connection_id = %conn, "left");
        }
        dir.evict_lagging();
        Ok(())
    }

    /// Terminates `room_id` for all of its members. Any member may do this.
    ///
    /// The room is dropped at once; only its id is kept, so it cannot be
    /// joined again.
    pub async fn kill(&self, conn: ConnectionId, room_id: &str) -> Result<(), RelayError> {
        let mut dir = self.inner.lock().await;
        let membership = dir.member_of(conn, room_id)?;
        let room_id = membership.room_id;

        let Some(room) = dir.rooms.remove(&room_id) else {
            return Err(RelayError::RoomKilled(room_id));
        };
        dir.killed.insert(room_id.clone());

        for (id, _) in &room.members {
            if let Some(c) = dir.connections.get_mut(id) {
                c.membership = None;
            }
            dir.send(*id, ServerEvent::ChatKilled);
        }
        dir.evict_lagging();

        info!(%room_id, username = %membership.username, members = room.members.len(), "room killed");
        Ok(())
    }

    /// Forgets the connection, leaving its room first.
    pub async fn disconnect(&self, conn: ConnectionId) {
        let mut dir = self.inner.lock().await;
        if let Some(m) = dir.detach(conn) {
            info!(room_id = %m.room_id, username = %m.username, connection_id = %conn, "dropped");
        }
        dir.connections.remove(&conn);
        dir.evict_lagging();
        debug!(connection_id = %conn, "disconnected");
    }

    pub async fn snapshot(&self, room_id: &str) -> Option<RoomSnapshot> {
        let dir = self.inner.lock().await;
        if let Some(room) = dir.rooms.get(room_id) {
            return Some(RoomSnapshot {
                room_id: room_id.to_owned(),
                users: room.users(),
                live: true,
            });
        }
        dir.killed.contains(room_id).then(|| RoomSnapshot {
            room_id: room_id.to_owned(),
            users: Vec::new(),
            live: false,
        })
    }

    pub async fn stats(&self) -> RelayStats {
        let dir = self.inner.lock().await;
        RelayStats {
            connections: dir.connections.len(),
            rooms: dir.rooms.len(),
        }
    }
}

fn validate(value: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty() && trimmed.chars().count() <= max_len).then(|| trimmed.to_owned())
}
