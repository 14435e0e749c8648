//! In-memory chat store for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::oneshot;

use super::ChatStore;
use crate::error::StoreError;
use crate::models::{Chat, ChatId, ChatMessage, MessageType, UserId};

#[derive(Default)]
pub struct MemoryStore {
    chats: Mutex<HashMap<ChatId, Chat>>,
    history: Mutex<HashMap<ChatId, Vec<ChatMessage>>>,
    fail_chat_lookup: bool,
    fail_history: bool,
    history_gate: Mutex<Option<oneshot::Receiver<()>>>,
    lookup_gate: Mutex<Option<oneshot::Receiver<()>>>,
    chat_lookups: AtomicUsize,
    history_loads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat(self, id: i32, a: i32, b: i32) -> Self {
        let chat = Chat {
            id: ChatId(id),
            participant_a: UserId(a),
            participant_b: UserId(b),
            user1_email: None,
            user2_email: None,
            created_at: None,
        };
        self.chats.lock().unwrap().insert(chat.id, chat);
        self
    }

    pub fn with_history(self, id: i32, messages: Vec<ChatMessage>) -> Self {
        self.history.lock().unwrap().insert(ChatId(id), messages);
        self
    }

    pub fn failing_chat_lookup(mut self) -> Self {
        self.fail_chat_lookup = true;
        self
    }

    pub fn failing_history(mut self) -> Self {
        self.fail_history = true;
        self
    }

    /// Hold the next history response until the returned sender fires.
    pub fn gate_history(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.history_gate.lock().unwrap() = Some(rx);
        tx
    }

    /// Hold the next chat lookup until the returned sender fires.
    pub fn gate_chat_lookup(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.lookup_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn remove_chat(&self, id: i32) {
        self.chats.lock().unwrap().remove(&ChatId(id));
    }

    pub fn chat_lookups(&self) -> usize {
        self.chat_lookups.load(Ordering::SeqCst)
    }

    pub fn history_loads(&self) -> usize {
        self.history_loads.load(Ordering::SeqCst)
    }
}

impl ChatStore for MemoryStore {
    async fn get_chat_by_id(&self, chat_id: ChatId) -> Result<Chat, StoreError> {
        self.chat_lookups.fetch_add(1, Ordering::SeqCst);
        let gate = self.lookup_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail_chat_lookup {
            return Err(StoreError::Status {
                status: 500,
                body: "Failed to fetch chat".to_string(),
            });
        }
        self.chats
            .lock()
            .unwrap()
            .get(&chat_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_messages_by_chat(&self, chat_id: ChatId) -> Result<Vec<ChatMessage>, StoreError> {
        self.history_loads.fetch_add(1, Ordering::SeqCst);
        let gate = self.history_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail_history {
            return Err(StoreError::Status {
                status: 500,
                body: "Failed to fetch messages".to_string(),
            });
        }
        Ok(self
            .history
            .lock()
            .unwrap()
            .get(&chat_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Shorthand for a text message.
pub fn text(chat: i32, sender: i32, content: &str) -> ChatMessage {
    ChatMessage {
        id: None,
        chat_id: ChatId(chat),
        sender_id: UserId(sender),
        content: content.to_string(),
        attachment_path: None,
        message_type: MessageType::Text,
        created_at: None,
    }
}

/// Text message carrying a storage id.
pub fn stored(id: i32, chat: i32, sender: i32, content: &str) -> ChatMessage {
    ChatMessage {
        id: Some(id),
        ..text(chat, sender, content)
    }
}
