use std::time::Duration;

use tokio::time::Instant;

use crate::protocol::{ClientEvent, RoomRef, ServerEvent};

use super::{
    command::{self, Outgoing},
    view::ChatView,
};

/// Fire-and-forget side of a room connection.
pub trait Transport {
    fn emit(&mut self, event: &ClientEvent);
    fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigate {
    /// Back to the landing page.
    Root,
}

/// One mounted chat page: owns the connection for as long as it lives.
pub struct ChatSession<T: Transport> {
    transport: Option<T>,
    room_id: String,
    input: String,
    view: ChatView,
}

impl<T: Transport> ChatSession<T> {
    /// Takes ownership of the connection and joins the room right away.
    pub fn mount(
        mut transport: T,
        room_id: impl Into<String>,
        username: impl Into<String>,
        redirect_delay: Duration,
    ) -> Self {
        let room_id = room_id.into();
        let view = ChatView::new(username, redirect_delay);

        transport.emit(&ClientEvent::JoinRoom(RoomRef {
            room_id: room_id.clone(),
            username: view.username().to_owned(),
        }));

        Self {
            transport: Some(transport),
            room_id,
            input: String::new(),
            view,
        }
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Sends whatever is in the message box and clears it.
    ///
    /// Blank input is left untouched and nothing is emitted.
    pub fn send(&mut self) -> Option<Outgoing> {
        let outgoing = command::compose(&self.input)?;
        self.input.clear();
        self.emit_outgoing(outgoing.clone());
        Some(outgoing)
    }

    /// Shorthand for `set_input` followed by `send`.
    pub fn submit(&mut self, input: impl Into<String>) -> Option<Outgoing> {
        self.set_input(input);
        self.send()
    }

    pub fn kill(&mut self) {
        self.emit_outgoing(Outgoing::Kill);
    }

    pub fn leave(&mut self) -> Navigate {
        let event = ClientEvent::LeaveRoom(RoomRef {
            room_id: self.room_id.clone(),
            username: self.view.username().to_owned(),
        });
        self.emit(&event);
        self.view.leave();
        Navigate::Root
    }

    pub fn handle(&mut self, event: ServerEvent, now: Instant) -> bool {
        self.view.apply(event, now)
    }

    /// Where the page should go at `now`, if anywhere.
    pub fn navigation(&self, now: Instant) -> Option<Navigate> {
        self.view
            .redirect_at()
            .filter(|redirect_at| now >= *redirect_at)
            .map(|_| Navigate::Root)
    }

    pub fn redirect_at(&self) -> Option<Instant> {
        self.view.redirect_at()
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn view(&self) -> &ChatView {
        &self.view
    }

    /// Releases the connection and hands back the closed transport, so the
    /// caller can wait for it to flush.
    pub fn unmount(mut self) -> Option<T> {
        let mut transport = self.transport.take()?;
        transport.close();
        Some(transport)
    }

    fn emit_outgoing(&mut self, outgoing: Outgoing) {
        let event = outgoing.into_event(&self.room_id, self.view.username());
        self.emit(&event);
    }

    fn emit(&mut self, event: &ClientEvent) {
        if let Some(transport) = self.transport.as_mut() {
            transport.emit(event);
        }
    }

    fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }
}

impl<T: Transport> Drop for ChatSession<T> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use crate::{
        client::view::{KILLED_NOTICE, Phase},
        protocol::ChatPayload,
    };

    use super::*;

    #[derive(Default)]
    struct Recorded {
        emitted: Vec<ClientEvent>,
        closes: usize,
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Recorded>>);

    impl Recorder {
        fn emitted(&self) -> Vec<ClientEvent> {
            self.0.lock().unwrap().emitted.clone()
        }

        fn closes(&self) -> usize {
            self.0.lock().unwrap().closes
        }
    }

    impl Transport for Recorder {
        fn emit(&mut self, event: &ClientEvent) {
            self.0.lock().unwrap().emitted.push(event.clone());
        }

        fn close(&mut self) {
            self.0.lock().unwrap().closes += 1;
        }
    }

    fn mounted() -> (ChatSession<Recorder>, Recorder) {
        let recorder = Recorder::default();
        let session = ChatSession::mount(recorder.clone(), "r1", "ann", Duration::from_secs(5));
        (session, recorder)
    }

    fn room_ref() -> RoomRef {
        RoomRef {
            room_id: "r1".to_owned(),
            username: "ann".to_owned(),
        }
    }

    #[test]
    fn mount_joins_immediately() {
        let (_session, recorder) = mounted();
        assert_eq!(recorder.emitted(), vec![ClientEvent::JoinRoom(room_ref())]);
    }

    #[test]
    fn send_emits_one_chat_message_and_clears_input() {
        let (mut session, recorder) = mounted();

        session.set_input("  hello there ");
        session.send();

        assert_eq!(
            &recorder.emitted()[1..],
            &[ClientEvent::ChatMessage(ChatPayload {
                room_id: "r1".to_owned(),
                username: "ann".to_owned(),
                message: "  hello there ".to_owned(),
            })]
        );
        assert_eq!(session.input(), "");
    }

    #[test]
    fn blank_input_emits_nothing() {
        let (mut session, recorder) = mounted();

        assert_eq!(session.submit("   "), None);
        assert_eq!(recorder.emitted().len(), 1);
        assert_eq!(session.input(), "   ");
    }

    #[test]
    fn kill_command_emits_kill_instead_of_chat() {
        let (mut session, recorder) = mounted();

        assert_eq!(session.submit("/KLLCHAT"), Some(Outgoing::Kill));

        assert_eq!(&recorder.emitted()[1..], &[ClientEvent::KillChat(room_ref())]);
        assert_eq!(session.input(), "");
    }

    #[test]
    fn kill_button_emits_kill() {
        let (mut session, recorder) = mounted();
        session.kill();
        assert_eq!(&recorder.emitted()[1..], &[ClientEvent::KillChat(room_ref())]);
    }

    #[test]
    fn leave_emits_and_navigates_at_once() {
        let (mut session, recorder) = mounted();

        assert_eq!(session.leave(), Navigate::Root);
        assert_eq!(&recorder.emitted()[1..], &[ClientEvent::LeaveRoom(room_ref())]);
        assert_eq!(session.view().phase(), Phase::Left);
    }

    #[test]
    fn chat_killed_redirects_after_five_seconds_and_not_before() {
        let (mut session, _recorder) = mounted();
        let killed_at = Instant::now();

        session.handle(ServerEvent::ChatKilled, killed_at);

        let notices: Vec<_> = session
            .view()
            .entries()
            .iter()
            .filter(|e| e.is_system() && e.text == KILLED_NOTICE)
            .collect();
        assert_eq!(notices.len(), 1);
        assert_eq!(session.navigation(killed_at), None);
        assert_eq!(
            session.navigation(killed_at + Duration::from_millis(4_999)),
            None
        );
        assert_eq!(
            session.navigation(killed_at + Duration::from_secs(5)),
            Some(Navigate::Root)
        );
    }

    #[test]
    fn unmount_closes_exactly_once() {
        let (session, recorder) = mounted();
        session.unmount();
        assert_eq!(recorder.closes(), 1);
    }

    #[test]
    fn unmount_hands_back_the_closed_transport() {
        let (session, recorder) = mounted();

        let transport = session.unmount();

        assert!(transport.is_some());
        assert_eq!(recorder.closes(), 1);
        drop(transport);
        assert_eq!(recorder.closes(), 1);
    }

    #[test]
    fn slash_words_other_than_the_kill_command_are_chat() {
        let (mut session, recorder) = mounted();

        session.submit("/leave");
        session.submit("  /kill ");

        let chat = |message: &str| {
            ClientEvent::ChatMessage(ChatPayload {
                room_id: "r1".to_owned(),
                username: "ann".to_owned(),
                message: message.to_owned(),
            })
        };
        assert_eq!(&recorder.emitted()[1..], &[chat("/leave"), chat("  /kill ")]);
        assert_eq!(session.view().phase(), Phase::Connecting);
    }

    #[test]
    fn dropping_a_session_closes_it() {
        let (session, recorder) = mounted();
        drop(session);
        assert_eq!(recorder.closes(), 1);
    }
}
