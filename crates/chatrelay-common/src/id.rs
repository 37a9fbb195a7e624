use std::fmt;

use crate::events::Scope;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn new_correlation_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    let bytes = uuid.as_bytes();
    format!(
        "{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}

/// Identity of one conversational context.
///
/// Scope is part of the identity: a person talking to the bot directly and
/// the same person talking in a group never share history, and neither do
/// two members of the same group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConversationKey {
    Direct { sender: String },
    Group { group: String, member: String },
}

impl ConversationKey {
    pub fn direct(sender: impl Into<String>) -> Self {
        Self::Direct {
            sender: sender.into(),
        }
    }

    pub fn group(group: impl Into<String>, member: impl Into<String>) -> Self {
        Self::Group {
            group: group.into(),
            member: member.into(),
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Self::Direct { .. } => Scope::Direct,
            Self::Group { .. } => Scope::Group,
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct { sender } => write!(f, "direct:{sender}"),
            Self::Group { group, member } => write!(f, "group:{group}/{member}"),
        }
    }
}
