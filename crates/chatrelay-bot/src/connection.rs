//! Per-connection handler: greet the bridge, then feed its messages to the
//! dispatcher and stream replies back.

use std::net::SocketAddr;
use std::sync::Arc;

use chatrelay_common::new_id;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::dispatcher::Dispatcher;
use crate::messenger::{BridgeMessenger, Messenger};
use crate::protocol::{BridgeFrame, BridgeResponse};

type WsStream = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

/// Handle a single bridge WebSocket connection.
pub async fn handle_connection(ws: WsStream, addr: SocketAddr, dispatcher: Dispatcher) {
    let (mut sink, mut stream) = ws.split();

    // 1. The first frame must be a hello.
    let self_name = match read_hello(&mut stream, addr).await {
        Some(v) => v,
        None => return,
    };

    // 2. Outbound channel shared by every reply task of this connection.
    let (tx, mut rx) = mpsc::channel::<String>(256);
    let messenger: Arc<dyn Messenger> = Arc::new(BridgeMessenger::new(tx));

    let bridge_id = new_id();
    if send_response(
        &mut sink,
        &BridgeResponse::Ready {
            bridge_id: bridge_id.clone(),
        },
    )
    .await
    .is_err()
    {
        return;
    }

    tracing::info!(
        peer = %addr,
        bridge = %bridge_id,
        self_name = ?self_name,
        "Bridge connected"
    );

    // 3. Event loop.
    loop {
        tokio::select! {
            // Replies queued by reply tasks → this bridge's WebSocket
            Some(reply) = rx.recv() => {
                if sink.send(Message::Text(reply.into())).await.is_err() {
                    break;
                }
            }

            // Frames from the bridge → dispatcher
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<BridgeFrame>(&text) {
                            Ok(BridgeFrame::Message(message)) => {
                                dispatcher.dispatch(message, self_name.as_deref(), messenger.clone());
                            }
                            Ok(BridgeFrame::Hello { .. }) => {
                                let _ = send_response(
                                    &mut sink,
                                    &BridgeResponse::Error { message: "already greeted".into() },
                                )
                                .await;
                            }
                            Err(e) => {
                                tracing::warn!(bridge = %bridge_id, error = %e, "Invalid bridge frame");
                                let _ = send_response(
                                    &mut sink,
                                    &BridgeResponse::Error { message: format!("invalid frame: {e}") },
                                )
                                .await;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::info!(peer = %addr, bridge = %bridge_id, "Bridge disconnected");
}

/// Read and parse the first frame as a hello. Returns the bot's own
/// nickname if the bridge supplied one.
async fn read_hello(
    stream: &mut futures_util::stream::SplitStream<WsStream>,
    addr: SocketAddr,
) -> Option<Option<String>> {
    // Wait up to 10 seconds for the hello message.
    let frame = tokio::time::timeout(std::time::Duration::from_secs(10), stream.next()).await;

    match frame {
        Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str::<BridgeFrame>(&text) {
            Ok(BridgeFrame::Hello { self_name }) => Some(self_name),
            Ok(BridgeFrame::Message(_)) => {
                tracing::warn!(peer = %addr, "Message received before hello");
                None
            }
            Err(e) => {
                tracing::warn!(peer = %addr, error = %e, "Invalid hello message");
                None
            }
        },
        Ok(Some(Ok(_))) => {
            tracing::warn!(peer = %addr, "Expected text hello, got binary");
            None
        }
        Ok(Some(Err(e))) => {
            tracing::warn!(peer = %addr, error = %e, "WS error during hello");
            None
        }
        Ok(None) => {
            tracing::debug!(peer = %addr, "Connection closed before hello");
            None
        }
        Err(_) => {
            tracing::warn!(peer = %addr, "Hello timeout (10s)");
            None
        }
    }
}

/// Send a BridgeResponse as a JSON text frame.
async fn send_response(
    sink: &mut futures_util::stream::SplitSink<WsStream, Message>,
    response: &BridgeResponse,
) -> Result<(), tungstenite::Error> {
    let json = serde_json::to_string(response).map_err(|e| tungstenite::Error::Io(e.into()))?;
    sink.send(Message::Text(json.into())).await
}
