//! The chat page, minus the pixels: composer, view model, session and the
//! socket it talks through.

pub mod command;
pub mod session;
pub mod view;
pub mod ws;

pub use command::{KILL_COMMAND, Outgoing, compose};
pub use session::{ChatSession, Navigate, Transport};
pub use view::{ChatView, Entry, EntryKind, Phase};
pub use ws::{ClientError, WsTransport};
