//! Rosbridge v2 transport over a websocket.
//!
//! Outgoing `subscribe`/`unsubscribe` ops go through a writer task so
//! that unsubscribe and close stay synchronous. Incoming `publish` ops
//! become [`TransportEvent::Message`]. `status` ops report a single
//! request (an unknown type, a bad topic) and are only logged; the
//! connection state changes on socket errors and close alone.

use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use super::transport::{Transport, TransportError, TransportEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Websocket client speaking the rosbridge JSON protocol.
#[derive(Default)]
pub struct RosbridgeTransport {
    outgoing: Option<mpsc::UnboundedSender<Message>>,
    incoming: Option<SplitStream<WsStream>>,
    writer: Option<JoinHandle<()>>,
}

impl RosbridgeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn send(&self, op: Value) -> Result<(), TransportError> {
        let tx = self.outgoing.as_ref().ok_or(TransportError::NotConnected)?;
        tx.send(Message::Text(op.to_string()))
            .map_err(|_| TransportError::Send("writer task has stopped".to_string()))
    }
}

fn subscription_id(topic: &str) -> String {
    format!("subscribe:{}", topic)
}

impl Transport for RosbridgeTransport {
    async fn connect(&mut self, url: &str) -> Result<(), TransportError> {
        let (ws, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let (mut sink, stream) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        let writer = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if let Err(e) = sink.send(msg).await {
                    debug!(error = %e, "Rosbridge write failed, stopping writer");
                    break;
                }
                if closing {
                    break;
                }
            }
            if let Err(e) = sink.close().await {
                debug!(error = %e, "Rosbridge close failed");
            }
        });

        self.outgoing = Some(tx);
        self.incoming = Some(stream);
        self.writer = Some(writer);
        debug!(url, "Rosbridge connected");
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str, message_type: &str) -> Result<(), TransportError> {
        self.send(json!({
            "op": "subscribe",
            "id": subscription_id(topic),
            "topic": topic,
            "type": message_type,
        }))
        .map_err(|e| TransportError::Subscribe {
            topic: topic.to_string(),
            reason: e.to_string(),
        })
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.send(json!({
            "op": "unsubscribe",
            "id": subscription_id(topic),
            "topic": topic,
        }))
    }

    fn close(&mut self) {
        if let Some(tx) = self.outgoing.take() {
            let _ = tx.send(Message::Close(None));
        }
        // The writer finishes the close handshake on its own.
        self.writer.take();
        self.incoming = None;
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        loop {
            let stream = self.incoming.as_mut()?;
            let next = stream.next().await;
            match next {
                Some(Ok(Message::Text(text))) => {
                    if let Some(event) = parse_frame(&text) {
                        return Some(event);
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.incoming = None;
                    return Some(TransportEvent::Closed);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    self.incoming = None;
                    return Some(TransportEvent::Error(e.to_string()));
                }
            }
        }
    }
}

/// Translate one rosbridge frame. Frames that carry nothing for us yield `None`.
pub(super) fn parse_frame(text: &str) -> Option<TransportEvent> {
    let frame: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            trace!(error = %e, "Ignoring non-JSON rosbridge frame");
            return None;
        }
    };

    match frame.get("op").and_then(Value::as_str) {
        Some("publish") => {
            let topic = frame.get("topic")?.as_str()?.to_string();
            let payload = frame.get("msg").cloned().unwrap_or(Value::Null);
            Some(TransportEvent::Message { topic, payload })
        }
        Some("status") => {
            let level = frame.get("level").and_then(Value::as_str).unwrap_or("info");
            let msg = frame.get("msg").and_then(Value::as_str).unwrap_or("");
            let id = frame.get("id").and_then(Value::as_str).unwrap_or("");
            match level {
                "error" | "warning" => warn!(level, id, msg, "Rosbridge request status"),
                _ => debug!(level, id, msg, "Rosbridge request status"),
            }
            None
        }
        _ => None,
    }
}
