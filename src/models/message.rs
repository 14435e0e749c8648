//! Message-related models

use chrono::NaiveDateTime;
use serde::de::{self, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::{ChatId, UserId};

/// Message kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    #[serde(alias = "attachment")]
    File,
    /// Any kind this client does not know about.
    #[serde(other)]
    Other,
}

/// A validated chat message.
///
/// `content`, `sender_id` and `chat_id` are always present and `content` is
/// non-empty. On the wire the sender is `user_id` and the attachment is
/// `file_path`; the descriptive names are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub chat_id: ChatId,
    #[serde(rename = "user_id")]
    pub sender_id: UserId,
    pub content: String,
    #[serde(rename = "file_path", skip_serializing_if = "Option::is_none")]
    pub attachment_path: Option<String>,
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

/// Why a message-shaped record was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("missing mandatory field `{0}`")]
    MissingField(&'static str),
    #[error("message content is empty")]
    EmptyContent,
}

/// Message-shaped record before validation. Every field is optional so that
/// a missing mandatory field is reported as such instead of as a parse error.
#[derive(Debug, Default, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub chat_id: Option<ChatId>,
    #[serde(default, alias = "sender_id")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, alias = "attachment_path")]
    pub file_path: Option<String>,
    #[serde(default)]
    pub message_type: Option<MessageType>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl RawMessage {
    /// Decode from a JSON value. Only objects are message-shaped; serde would
    /// otherwise also accept an array in field order.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if value.is_object() {
            return serde_json::from_value(value);
        }
        let unexpected = match &value {
            Value::Array(_) => Unexpected::Seq,
            Value::String(s) => Unexpected::Str(s),
            Value::Number(_) => Unexpected::Other("number"),
            Value::Bool(b) => Unexpected::Bool(*b),
            Value::Null => Unexpected::Unit,
            Value::Object(_) => Unexpected::Map,
        };
        Err(de::Error::invalid_type(unexpected, &"a message object"))
    }
}

impl TryFrom<RawMessage> for ChatMessage {
    type Error = MessageError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let content = raw.content.ok_or(MessageError::MissingField("content"))?;
        if content.is_empty() {
            return Err(MessageError::EmptyContent);
        }
        let sender_id = raw.user_id.ok_or(MessageError::MissingField("sender_id"))?;
        let chat_id = raw.chat_id.ok_or(MessageError::MissingField("chat_id"))?;

        Ok(Self {
            id: raw.id,
            chat_id,
            sender_id,
            content,
            attachment_path: raw.file_path.filter(|p| !p.is_empty()),
            message_type: raw.message_type.unwrap_or_default(),
            created_at: raw.created_at,
        })
    }
}
