//! Ordered, room-scoped, duplicate-free message list.

use std::collections::HashSet;

use crate::models::{ChatId, ChatMessage};

/// What happened to a message offered to the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Appended,
    /// Held until the history snapshot lands.
    Buffered,
    Duplicate,
    OutOfScope,
}

/// Messages of one chat room in arrival order.
///
/// Until [`Timeline::apply_snapshot`] is called, live messages are held
/// back so that everything from the snapshot comes first.
#[derive(Debug)]
pub struct Timeline {
    chat_id: ChatId,
    messages: Vec<ChatMessage>,
    seen_ids: HashSet<i32>,
    pending: Option<Vec<ChatMessage>>,
    anomalies: u64,
}

impl Timeline {
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            messages: Vec::new(),
            seen_ids: HashSet::new(),
            pending: Some(Vec::new()),
            anomalies: 0,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Messages from other rooms that were refused.
    pub fn anomalies(&self) -> u64 {
        self.anomalies
    }

    /// Live messages waiting for the snapshot.
    pub fn pending(&self) -> usize {
        self.pending.as_ref().map_or(0, Vec::len)
    }

    fn check_scope(&mut self, msg: &ChatMessage) -> bool {
        if msg.chat_id == self.chat_id {
            return true;
        }
        self.anomalies += 1;
        tracing::warn!(
            "Dropping message for chat {} received in chat {}",
            msg.chat_id,
            self.chat_id
        );
        false
    }

    /// Offer a message from the live stream.
    pub fn receive_live(&mut self, msg: ChatMessage) -> Admission {
        if !self.check_scope(&msg) {
            return Admission::OutOfScope;
        }
        match self.pending {
            Some(ref mut pending) => {
                pending.push(msg);
                Admission::Buffered
            }
            None => self.append(msg),
        }
    }

    /// Seed with the history snapshot, then append whatever arrived live in
    /// the meantime. A failed history load is an empty snapshot.
    ///
    /// Only the first call has an effect; returns whether it was applied.
    pub fn apply_snapshot(&mut self, history: Vec<ChatMessage>) -> bool {
        let Some(pending) = self.pending.take() else {
            tracing::debug!("Ignoring second snapshot for chat {}", self.chat_id);
            return false;
        };

        for msg in history {
            if self.check_scope(&msg) {
                self.append(msg);
            }
        }

        // Without an id a buffered message cannot be told apart from an
        // identical stored one, so it is always kept.
        for msg in pending {
            self.append(msg);
        }
        true
    }

    fn append(&mut self, msg: ChatMessage) -> Admission {
        if let Some(id) = msg.id {
            if !self.seen_ids.insert(id) {
                tracing::debug!("Duplicate message {} in chat {}", id, self.chat_id);
                return Admission::Duplicate;
            }
        }
        self.messages.push(msg);
        Admission::Appended
    }
}
