//! Outbound side of the messaging platform: delivering replies.

use async_trait::async_trait;
use chatrelay_common::{IncomingMessage, RelayError};
use tokio::sync::mpsc;

use crate::protocol::BridgeResponse;

/// Delivers reply text to the conversation a message came from.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn relay(&self, message: &IncomingMessage, text: &str) -> Result<(), RelayError>;
}

/// Queues replies onto a bridge connection's outbound channel.
#[derive(Clone)]
pub struct BridgeMessenger {
    tx: mpsc::Sender<String>,
}

impl BridgeMessenger {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Messenger for BridgeMessenger {
    async fn relay(&self, message: &IncomingMessage, text: &str) -> Result<(), RelayError> {
        let reply = BridgeResponse::Reply {
            message_id: message.id.clone(),
            to: message.sender_id.clone(),
            text: text.to_string(),
        };
        let json =
            serde_json::to_string(&reply).map_err(|e| RelayError::Transport(e.to_string()))?;
        self.tx
            .send(json)
            .await
            .map_err(|_| RelayError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn relay_queues_reply_frame() {
        let (tx, mut rx) = mpsc::channel(4);
        let messenger = BridgeMessenger::new(tx);
        let msg = IncomingMessage::direct("alice", "hello");

        messenger.relay(&msg, "hi there").await.unwrap();

        let frame: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["type"], "reply");
        assert_eq!(frame["message_id"], msg.id.as_str());
        assert_eq!(frame["to"], "alice");
        assert_eq!(frame["text"], "hi there");
    }

    #[tokio::test]
    async fn closed_channel_is_relay_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let messenger = BridgeMessenger::new(tx);

        let err = messenger
            .relay(&IncomingMessage::direct("alice", "hello"), "hi")
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::ChannelClosed));
    }
}
