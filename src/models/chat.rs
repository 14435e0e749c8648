//! Chat-related models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{ChatId, UserId};

/// Pairwise chat room record as returned by the chat service.
///
/// Exactly two participant slots; membership is fixed for the life of the
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(rename = "user1_id")]
    pub participant_a: UserId,
    #[serde(rename = "user2_id")]
    pub participant_b: UserId,
    #[serde(default)]
    pub user1_email: Option<String>,
    #[serde(default)]
    pub user2_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl Chat {
    pub fn has_participant(&self, user: UserId) -> bool {
        self.participant_a == user || self.participant_b == user
    }

    /// Email of the participant that is not `me`, if the server sent it.
    pub fn peer_email(&self, me: UserId) -> Option<&str> {
        if self.participant_a == me {
            self.user2_email.as_deref()
        } else {
            self.user1_email.as_deref()
        }
    }
}
