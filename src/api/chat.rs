//! Chat endpoints of the chat service
//!
//! `chats/{id}`, `chats/{id}/messages/all`, `chats/user/{user_id}` and
//! `POST chats`.

use super::client::ChatClient;
use super::ChatStore;
use crate::error::StoreError;
use crate::models::{Chat, ChatId, ChatMessage, RawMessage, UserId};

impl ChatStore for ChatClient {
    async fn get_chat_by_id(&self, chat_id: ChatId) -> Result<Chat, StoreError> {
        self.get_json(&format!("chats/{}", chat_id)).await
    }

    async fn get_messages_by_chat(&self, chat_id: ChatId) -> Result<Vec<ChatMessage>, StoreError> {
        let records: Vec<serde_json::Value> = self
            .get_json(&format!("chats/{}/messages/all", chat_id))
            .await?;
        Ok(decode_history(chat_id, records))
    }
}

/// Validate history records one by one, dropping the malformed ones.
///
/// Order is preserved; the server returns oldest first.
pub fn decode_history(chat_id: ChatId, records: Vec<serde_json::Value>) -> Vec<ChatMessage> {
    let total = records.len();
    let messages: Vec<ChatMessage> = records
        .into_iter()
        .filter_map(|record| {
            let raw = match RawMessage::from_value(record) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Dropping undecodable history record in chat {}: {}", chat_id, e);
                    return None;
                }
            };
            match ChatMessage::try_from(raw) {
                Ok(msg) => Some(msg),
                Err(e) => {
                    tracing::warn!("Dropping invalid history record in chat {}: {}", chat_id, e);
                    None
                }
            }
        })
        .collect();

    tracing::debug!(
        "Loaded {} of {} history records for chat {}",
        messages.len(),
        total,
        chat_id
    );
    messages
}

/// Chats the user participates in, newest first.
pub async fn list_chats_data(client: &ChatClient, user: UserId) -> Result<Vec<Chat>, StoreError> {
    client.get_json(&format!("chats/user/{}", user)).await
}

/// Open a pairwise chat. The server identifies both participants by email
/// and refuses a second chat between the same pair.
pub async fn create_chat_data(
    client: &ChatClient,
    my_email: &str,
    peer_email: &str,
) -> Result<Chat, StoreError> {
    let body = serde_json::json!({ "user1_email": my_email, "user2_email": peer_email });
    client.post_json("chats", &body).await
}

/// The `message` field of a JSON error body, if the server sent one.
pub fn server_message(err: &StoreError) -> Option<String> {
    let StoreError::Status { body, .. } = err else {
        return None;
    };
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("message")?.as_str().map(str::to_string)
}

/// Print the chat list for `user`.
pub fn print_chats(chats: &[Chat], user: UserId) {
    println!("\nYour Chats:");
    println!("{:-<60}", "");

    if chats.is_empty() {
        println!("  (no chats found)");
        return;
    }

    for chat in chats {
        let peer = chat.peer_email(user).unwrap_or("[unknown]");
        println!("{}", peer);
        println!("  ID: {}", chat.id);
        if let Some(ref created) = chat.created_at {
            println!("  Since: {}", created.format("%Y-%m-%d %H:%M"));
        }
        println!();
    }
}
