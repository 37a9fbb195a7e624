use serde::{Deserialize, Serialize};

use crate::id::new_id;

/// Whether a message arrived in a one-to-one chat or in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Direct,
    Group,
}

/// An inbound chat message as delivered by the messaging platform.
///
/// For group messages `sender_id` names the group and `group_sender_id`
/// names the member who wrote the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    #[serde(default = "new_id")]
    pub id: String,
    pub scope: Scope,
    pub sender_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_sender_id: Option<String>,
    #[serde(default)]
    pub is_mentioned: bool,
    #[serde(default = "default_is_text")]
    pub is_text: bool,
    #[serde(default)]
    pub content: String,
}

fn default_is_text() -> bool {
    true
}

impl IncomingMessage {
    pub fn direct(sender_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            scope: Scope::Direct,
            sender_id: sender_id.into(),
            group_sender_id: None,
            is_mentioned: false,
            is_text: true,
            content: content.into(),
        }
    }

    pub fn group(
        group_id: impl Into<String>,
        member_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            scope: Scope::Group,
            sender_id: group_id.into(),
            group_sender_id: Some(member_id.into()),
            is_mentioned: false,
            is_text: true,
            content: content.into(),
        }
    }

    pub fn with_mention(mut self, mentioned: bool) -> Self {
        self.is_mentioned = mentioned;
        self
    }

    pub fn with_text(mut self, is_text: bool) -> Self {
        self.is_text = is_text;
        self
    }
}
