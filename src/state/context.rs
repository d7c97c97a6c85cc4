//! Conversation context management
//!
//! This module holds the per-conversation dialog stack: which flows are active,
//! where each one is within its steps, and the values gathered so far.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::dialogs::Prompt;

/// Identifies one conversation on one channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationId {
    pub channel_id: String,
    pub conversation_id: String,
}

impl ConversationId {
    pub fn new(channel_id: &str, conversation_id: &str) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            conversation_id: conversation_id.to_string(),
        }
    }

    /// Storage and locking key
    pub fn key(&self) -> String {
        format!("{}:{}", self.channel_id, self.conversation_id)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel_id, self.conversation_id)
    }
}

/// A value accumulated by a flow's steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameValue {
    Int(i64),
    Text(String),
}

impl FrameValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FrameValue::Text(text) => Some(text),
            FrameValue::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FrameValue::Int(value) => Some(*value),
            FrameValue::Text(_) => None,
        }
    }
}

impl From<String> for FrameValue {
    fn from(value: String) -> Self {
        FrameValue::Text(value)
    }
}

impl From<&str> for FrameValue {
    fn from(value: &str) -> Self {
        FrameValue::Text(value.to_string())
    }
}

impl From<i64> for FrameValue {
    fn from(value: i64) -> Self {
        FrameValue::Int(value)
    }
}

impl fmt::Display for FrameValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameValue::Int(value) => write!(f, "{}", value),
            FrameValue::Text(text) => f.write_str(text),
        }
    }
}

/// One activation of a flow on the dialog stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Flow this frame runs
    pub dialog_name: String,
    /// Step that receives the next result
    pub step_index: usize,
    /// Values written by earlier steps of this activation
    #[serde(default)]
    pub values: BTreeMap<String, FrameValue>,
    /// Prompt the user still has to answer, if the frame is suspended on one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<Prompt>,
}

impl Frame {
    /// Fresh frame positioned at the first step
    pub fn new(dialog_name: &str) -> Self {
        Self {
            dialog_name: dialog_name.to_string(),
            step_index: 0,
            values: BTreeMap::new(),
            pending: None,
        }
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<FrameValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(FrameValue::as_text)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(FrameValue::as_int)
    }

    pub fn is_suspended(&self) -> bool {
        self.pending.is_some()
    }
}

/// Persisted dialog stack of one conversation, outermost frame first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogState {
    pub conversation: ConversationId,
    pub frames: Vec<Frame>,
    pub updated_at: DateTime<Utc>,
}

impl DialogState {
    pub fn new(conversation: ConversationId, frames: Vec<Frame>) -> Self {
        Self {
            conversation,
            frames,
            updated_at: Utc::now(),
        }
    }

    /// A conversation is in dialog while at least one frame is on the stack
    pub fn in_dialog(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Active flow and step, for logging
    pub fn current_state(&self) -> (Option<&str>, Option<usize>) {
        match self.frames.last() {
            Some(frame) => (Some(frame.dialog_name.as_str()), Some(frame.step_index)),
            None => (None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame() {
        let frame = Frame::new("resource");
        assert_eq!(frame.dialog_name, "resource");
        assert_eq!(frame.step_index, 0);
        assert!(frame.values.is_empty());
        assert!(!frame.is_suspended());
    }

    #[test]
    fn test_frame_values() {
        let mut frame = Frame::new("resource_group");
        frame.set_value("name", "rg1");
        frame.set_value("attempts", 2);

        assert_eq!(frame.get_string("name"), Some("rg1"));
        assert_eq!(frame.get_i64("attempts"), Some(2));
        assert_eq!(frame.get_string("attempts"), None);
        assert_eq!(frame.get_string("missing"), None);
    }

    #[test]
    fn test_frame_record_shape() {
        let mut frame = Frame::new("resource_group");
        frame.step_index = 1;
        frame.set_value("name", "rg1");
        frame.set_value("count", 3);

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "dialogName": "resource_group",
                "stepIndex": 1,
                "values": { "count": 3, "name": "rg1" }
            })
        );

        let back: Frame = serde_json::from_value(value).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn test_conversation_key() {
        let id = ConversationId::new("telegram", "-100123");
        assert_eq!(id.key(), "telegram:-100123");
        assert_eq!(id.to_string(), id.key());
    }

    #[test]
    fn test_current_state() {
        let mut state = DialogState::new(ConversationId::new("console", "local"), vec![]);
        assert!(!state.in_dialog());
        assert_eq!(state.current_state(), (None, None));

        state.frames.push(Frame::new("resource"));
        assert!(state.in_dialog());
        assert_eq!(state.current_state(), (Some("resource"), Some(0)));
    }
}
