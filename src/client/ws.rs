use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use crate::protocol::{ClientEvent, ServerEvent};

use super::session::Transport;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach relay: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Socket to the relay's `/ws` endpoint. No reconnects: once the socket
/// drops, the event stream ends.
pub struct WsTransport {
    outgoing: mpsc::UnboundedSender<Message>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl WsTransport {
    /// Connects to `<backend_url>/ws` and returns the transport with the
    /// stream of events the relay pushes.
    pub async fn connect(
        backend_url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ServerEvent>), ClientError> {
        let url = format!("{}/ws", backend_url.trim_end_matches('/'));
        debug!("connecting to {url}");
        let (stream, _) = connect_async(url.as_str()).await?;
        let (mut write, mut read) = stream.split();

        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let (incoming_tx, incoming) = mpsc::unbounded_channel();

        let writer = tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = write.send(message).await {
                    debug!("send failed: {e}");
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("connection lost: {e}");
                        break;
                    }
                };
                match ServerEvent::from_frame(text.as_str()) {
                    Ok(event) => {
                        if incoming_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => debug!("ignoring malformed frame: {e}"),
                }
            }
        });

        Ok((
            Self {
                outgoing,
                writer,
                reader,
            },
            incoming,
        ))
    }
}

impl WsTransport {
    /// Waits up to `limit` for everything emitted before `close`, the close
    /// frame included, to be written. `false` if the writer did not get there.
    pub async fn finished(self, limit: Duration) -> bool {
        matches!(tokio::time::timeout(limit, self.writer).await, Ok(Ok(())))
    }
}

impl Transport for WsTransport {
    fn emit(&mut self, event: &ClientEvent) {
        match event.to_frame() {
            Ok(frame) => {
                if self.outgoing.send(Message::Text(frame.into())).is_err() {
                    debug!("socket closed, dropping {event:?}");
                }
            }
            Err(e) => warn!("could not encode {event:?}: {e}"),
        }
    }

    fn close(&mut self) {
        let _ = self.outgoing.send(Message::Close(None));
        self.reader.abort();
    }
}
