//! Channel activity models

use serde::{Deserialize, Serialize};

use crate::state::ConversationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityKind {
    Message,
    ConversationUpdate,
}

/// An event delivered by the hosting channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundActivity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub conversation: ConversationId,
    pub text: Option<String>,
    /// The bot's own account on the channel
    pub recipient_id: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

impl InboundActivity {
    pub fn message(conversation: ConversationId, recipient_id: &str, text: &str) -> Self {
        Self {
            kind: ActivityKind::Message,
            conversation,
            text: Some(text.to_string()),
            recipient_id: recipient_id.to_string(),
            member_ids: Vec::new(),
        }
    }

    pub fn conversation_update(
        conversation: ConversationId,
        recipient_id: &str,
        member_ids: Vec<String>,
    ) -> Self {
        Self {
            kind: ActivityKind::ConversationUpdate,
            conversation,
            text: None,
            recipient_id: recipient_id.to_string(),
            member_ids,
        }
    }

    /// Members that joined, excluding the bot itself
    pub fn added_members(&self) -> impl Iterator<Item = &str> {
        self.member_ids
            .iter()
            .map(String::as_str)
            .filter(move |id| *id != self.recipient_id)
    }
}

/// A message the bot sends back on the channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundActivity {
    pub text: String,
    /// When present the next inbound text must be one of these labels
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub choices: Option<Vec<String>>,
}

impl OutboundActivity {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choices: None,
        }
    }

    pub fn with_choices(text: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            text: text.into(),
            choices: Some(choices),
        }
    }
}
