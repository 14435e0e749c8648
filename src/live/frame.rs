//! Live channel wire frames
//!
//! One JSON object per WebSocket text frame, shaped like a message record:
//! `{"chat_id":7,"user_id":1,"content":"yo","message_type":"text","file_path":null}`.
//! Outbound file messages additionally carry `file_data` as a base64 data URL.

use serde::Serialize;
use thiserror::Error;

use crate::models::{ChatId, ChatMessage, MessageError, MessageType, RawMessage, UserId};

/// Why an inbound frame was dropped.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("undecodable frame: {0}")]
    Undecodable(#[from] serde_json::Error),

    #[error("invalid message: {0}")]
    Invalid(#[from] MessageError),
}

pub fn decode(text: &str) -> Result<ChatMessage, FrameError> {
    decode_bytes(text.as_bytes())
}

pub fn decode_bytes(bytes: &[u8]) -> Result<ChatMessage, FrameError> {
    let raw = RawMessage::from_value(serde_json::from_slice(bytes)?)?;
    Ok(ChatMessage::try_from(raw)?)
}

/// File carried inline with an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Path the server stores the file under.
    pub path: String,
    /// `data:<mime>;base64,<payload>`
    pub data_url: String,
}

/// What the user wants to send; the room fills in chat and sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub content: String,
    pub attachment: Option<Attachment>,
}

impl MessageDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(content: impl Into<String>, attachment: Attachment) -> Self {
        Self {
            content: content.into(),
            attachment: Some(attachment),
        }
    }
}

/// Outbound frame as the server expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundFrame {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub content: String,
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,
}

impl OutboundFrame {
    pub fn new(chat_id: ChatId, user_id: UserId, draft: MessageDraft) -> Self {
        let (message_type, file_path, file_data) = match draft.attachment {
            Some(a) => (MessageType::File, Some(a.path), Some(a.data_url)),
            None => (MessageType::Text, None, None),
        };
        Self {
            chat_id,
            user_id,
            content: draft.content,
            message_type,
            file_path,
            file_data,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_server_broadcast() {
        // Shape the server echoes back after saving a message.
        let msg = decode(
            r#"{"chat_id":7,"user_id":1,"content":"yo","file_data":null,"file_path":null,"message_type":"text"}"#,
        )
        .unwrap();
        assert_eq!(msg.chat_id, ChatId(7));
        assert_eq!(msg.sender_id, UserId(1));
        assert_eq!(msg.content, "yo");
        assert_eq!(msg.attachment_path, None);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(decode("{not json"), Err(FrameError::Undecodable(_))));
        assert!(matches!(decode("[1,2]"), Err(FrameError::Undecodable(_))));
        assert!(matches!(
            decode(r#"[null,7,2,"hi"]"#),
            Err(FrameError::Undecodable(_))
        ));
        assert!(matches!(decode("\"hi\""), Err(FrameError::Undecodable(_))));
        assert!(matches!(
            decode(r#"{"chat_id":7,"user_id":1}"#),
            Err(FrameError::Invalid(MessageError::MissingField("content")))
        ));
        assert!(matches!(
            decode(r#"{"chat_id":"x","user_id":1,"content":"a"}"#),
            Err(FrameError::Undecodable(_))
        ));
    }

    #[test]
    fn test_outbound_text_frame() {
        let frame = OutboundFrame::new(ChatId(7), UserId(1), MessageDraft::text("hello"));
        let v: serde_json::Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"chat_id":7,"user_id":1,"content":"hello","message_type":"text"})
        );
    }

    #[test]
    fn test_outbound_file_frame() {
        let draft = MessageDraft::with_attachment(
            "a.png",
            Attachment {
                path: "uploads/a.png".to_string(),
                data_url: "data:image/png;base64,AAAA".to_string(),
            },
        );
        let frame = OutboundFrame::new(ChatId(7), UserId(1), draft);
        assert_eq!(frame.message_type, MessageType::File);
        let v: serde_json::Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();
        assert_eq!(v["message_type"], "file");
        assert_eq!(v["file_path"], "uploads/a.png");
        assert_eq!(v["file_data"], "data:image/png;base64,AAAA");
    }
}
