//! Terminal chat page: joins a room and relays stdin to it.
//!
//! Every line is sent as typed; `/kllchat` kills the room. End of input or
//! Ctrl-C leaves it.

use std::time::Duration;

use clap::Parser;
use kllchat::{
    client::{ChatSession, EntryKind, Navigate, WsTransport},
    config::ClientConfig,
    protocol::ServerEvent,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::{Instant, sleep_until},
};

#[derive(Debug, Parser)]
#[command(about = "Join a kllchat room from the terminal")]
struct Args {
    room_id: String,
    username: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    kllchat::init_tracing();

    let args = Args::parse();
    let config = ClientConfig::from_env()?;

    let (transport, mut events) = WsTransport::connect(&config.backend_url).await?;
    let mut session = ChatSession::mount(
        transport,
        args.room_id,
        args.username,
        config.redirect_delay,
    );
    println!("# {}", session.room_id());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut rendered = 0;

    loop {
        let redirect_at = session.redirect_at();

        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::warn!("connection to relay lost");
                    break;
                };
                let roster = matches!(event, ServerEvent::RoomData { .. });
                if session.handle(event, Instant::now()) && roster {
                    let users = session.view().users();
                    println!("-- {} here: {}", users.len(), users.join(", "));
                }
                rendered = render(&session, rendered);
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    session.leave();
                    break;
                };
                session.submit(line);
            }
            _ = tokio::signal::ctrl_c() => {
                session.leave();
                break;
            }
            _ = sleep_until(redirect_at.unwrap_or_else(Instant::now)), if redirect_at.is_some() => {
                if session.navigation(Instant::now()) == Some(Navigate::Root) {
                    break;
                }
            }
        }
    }

    if let Some(transport) = session.unmount() {
        if !transport.finished(Duration::from_secs(1)).await {
            tracing::warn!("relay did not take the last frames in time");
        }
    }
    Ok(())
}

fn render<T: kllchat::client::Transport>(session: &ChatSession<T>, from: usize) -> usize {
    let entries = session.view().entries();
    for entry in &entries[from..] {
        match &entry.kind {
            EntryKind::Chat { username, own } => {
                let marker = if *own { "*" } else { " " };
                println!("{} {marker}{username}: {}", entry.time_label(), entry.text);
            }
            EntryKind::System => println!("{} -- {}", entry.time_label(), entry.text),
        }
    }
    entries.len()
}
