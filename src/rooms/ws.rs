use axum::{
    debug_handler,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::protocol::ClientEvent;

use super::{msg, relay::Relay};

#[debug_handler(state = crate::AppState)]
pub async fn room_ws(State(relay): State<Relay>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |stream| serve_socket(relay, stream))
}

async fn serve_socket(relay: Relay, stream: WebSocket) {
    let (connection_id, mut inbox) = relay.connect().await;
    let (mut sender, mut receiver) = stream.split();

    let mut outbox_task = tokio::spawn(async move {
        while let Some(event) = inbox.recv().await {
            let frame = match event.to_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("dropping unencodable event: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            frame = receiver.next() => {
                let Some(Ok(frame)) = frame else {
                    break;
                };
                let text = match frame {
                    Message::Text(text) => text,
                    Message::Close(_) => break,
                    _ => continue,
                };

                let event = match ClientEvent::from_frame(text.as_str()) {
                    Ok(event) => event,
                    Err(e) => {
                        debug!(%connection_id, "ignoring malformed frame: {e}");
                        continue;
                    }
                };

                let room_id = event.room_id().to_owned();
                if let Err(e) = msg::dispatch(&relay, connection_id, event).await {
                    warn!(%connection_id, %room_id, "rejected event: {e}");
                }
            }
            _ = &mut outbox_task => break,
        }
    }

    relay.disconnect(connection_id).await;
    outbox_task.abort();
}
