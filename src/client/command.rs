use crate::protocol::{ChatPayload, ClientEvent, RoomRef};

/// Typing this (any ASCII case) into the message box kills the room.
pub const KILL_COMMAND: &str = "/kllchat";

/// What the composer hands to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Plain(String),
    Kill,
}

/// Turns the message box contents into something to send, if anything.
///
/// Blank input sends nothing. Plain messages keep their original, untrimmed
/// text.
pub fn compose(input: &str) -> Option<Outgoing> {
    if input.trim().is_empty() {
        return None;
    }
    if input.eq_ignore_ascii_case(KILL_COMMAND) {
        return Some(Outgoing::Kill);
    }
    Some(Outgoing::Plain(input.to_owned()))
}

impl Outgoing {
    pub fn into_event(self, room_id: &str, username: &str) -> ClientEvent {
        match self {
            Outgoing::Plain(message) => ClientEvent::ChatMessage(ChatPayload {
                room_id: room_id.to_owned(),
                username: username.to_owned(),
                message,
            }),
            Outgoing::Kill => ClientEvent::KillChat(RoomRef {
                room_id: room_id.to_owned(),
                username: username.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_sends_nothing() {
        assert_eq!(compose(""), None);
        assert_eq!(compose(" \t\n"), None);
    }

    #[test]
    fn keeps_surrounding_whitespace() {
        assert_eq!(compose("  hi  "), Some(Outgoing::Plain("  hi  ".to_owned())));
    }

    #[test]
    fn kill_command_is_case_insensitive() {
        assert_eq!(compose("/kllchat"), Some(Outgoing::Kill));
        assert_eq!(compose("/KllChat"), Some(Outgoing::Kill));
    }

    #[test]
    fn near_misses_are_plain_text() {
        for text in ["/kllchat now", " /kllchat", "/killchat", "kllchat"] {
            assert_eq!(compose(text), Some(Outgoing::Plain(text.to_owned())), "{text}");
        }
    }

    #[test]
    fn kill_becomes_kill_chat() {
        assert_eq!(
            Outgoing::Kill.into_event("r1", "ann"),
            ClientEvent::KillChat(RoomRef {
                room_id: "r1".to_owned(),
                username: "ann".to_owned(),
            })
        );
    }
}
