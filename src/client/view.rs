//! Client-side model of one chat page: the message list, the member list and
//! where the page is in its life.

use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::Instant;

use crate::protocol::{ConnectionId, ServerEvent};

pub const KILLED_NOTICE: &str = "This chat has been killed. You will be redirected shortly.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    Joined,
    Active,
    /// Terminal. The page goes home at `redirect_at`.
    Killed { redirect_at: Instant },
    /// Terminal.
    Left,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Killed { .. } | Phase::Left)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Chat { username: String, own: bool },
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    pub text: String,
    /// Local receipt time; the relay does not stamp messages.
    pub received_at: OffsetDateTime,
}

impl Entry {
    fn new(kind: EntryKind, text: String) -> Self {
        Self {
            kind,
            text,
            received_at: OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()),
        }
    }

    pub fn is_system(&self) -> bool {
        self.kind == EntryKind::System
    }

    pub fn is_own(&self) -> bool {
        matches!(self.kind, EntryKind::Chat { own: true, .. })
    }

    /// `hh:mm AM`
    pub fn time_label(&self) -> String {
        let (hour, minute) = (self.received_at.hour(), self.received_at.minute());
        let period = if hour < 12 { "AM" } else { "PM" };
        let hour = match hour % 12 {
            0 => 12,
            h => h,
        };
        format!("{hour:02}:{minute:02} {period}")
    }
}

#[derive(Debug)]
pub struct ChatView {
    username: String,
    connection_id: Option<ConnectionId>,
    entries: Vec<Entry>,
    users: Vec<String>,
    phase: Phase,
    redirect_delay: Duration,
}

impl ChatView {
    pub fn new(username: impl Into<String>, redirect_delay: Duration) -> Self {
        Self {
            username: username.into(),
            connection_id: None,
            entries: Vec::new(),
            users: Vec::new(),
            phase: Phase::Connecting,
            redirect_delay,
        }
    }

    /// Folds one server event into the page. Returns whether anything changed.
    pub fn apply(&mut self, event: ServerEvent, now: Instant) -> bool {
        if self.phase.is_terminal() {
            return false;
        }

        match event {
            ServerEvent::Connected { connection_id } => {
                self.connection_id = Some(connection_id);
                if self.phase == Phase::Connecting {
                    self.phase = Phase::Joined;
                }
            }
            ServerEvent::Message {
                username,
                message,
                sender_id,
            } => {
                let own = self.is_own(&username, sender_id);
                self.entries
                    .push(Entry::new(EntryKind::Chat { username, own }, message));
            }
            ServerEvent::SystemMessage(text) => {
                self.entries.push(Entry::new(EntryKind::System, text));
            }
            ServerEvent::ChatKilled => {
                self.entries
                    .push(Entry::new(EntryKind::System, KILLED_NOTICE.to_owned()));
                self.phase = Phase::Killed {
                    redirect_at: now + self.redirect_delay,
                };
            }
            ServerEvent::RoomData { users } => {
                self.users = users;
                self.phase = Phase::Active;
            }
        }
        true
    }

    fn is_own(&self, username: &str, sender_id: Option<ConnectionId>) -> bool {
        match (self.connection_id, sender_id) {
            (Some(me), Some(sender)) => me == sender,
            _ => username == self.username,
        }
    }

    pub fn leave(&mut self) {
        self.phase = Phase::Left;
    }

    pub fn redirect_at(&self) -> Option<Instant> {
        match self.phase {
            Phase::Killed { redirect_at } => Some(redirect_at),
            _ => None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection_id
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}
