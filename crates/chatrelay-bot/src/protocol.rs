//! Bridge wire protocol. The messaging-platform bridge greets once, then
//! streams inbound messages; the bot answers with replies.

use chatrelay_common::IncomingMessage;
use serde::{Deserialize, Serialize};

/// Frames the bridge sends to the bot.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeFrame {
    /// First frame on a connection. `self_name` is the nickname of the
    /// account the bridge is logged in as.
    #[serde(rename = "bridge_hello")]
    Hello {
        #[serde(default)]
        self_name: Option<String>,
    },

    #[serde(rename = "message")]
    Message(IncomingMessage),
}

/// Frames the bot sends back to the bridge.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum BridgeResponse {
    #[serde(rename = "ready")]
    Ready { bridge_id: String },

    #[serde(rename = "reply")]
    Reply {
        message_id: String,
        to: String,
        text: String,
    },

    #[serde(rename = "error")]
    Error { message: String },
}
