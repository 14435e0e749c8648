//! Read-only session context handed to the guards.

use super::tokens::{StoredToken, TokenStore};
use crate::models::UserId;

/// What the guards may ask about the current session.
pub trait SessionContext {
    fn has_valid_credential(&self) -> bool;
    fn current_user_id(&self) -> Option<UserId>;
}

/// Snapshot of the session taken when a command starts.
#[derive(Debug, Clone, Default)]
pub struct Session {
    credential: Option<StoredToken>,
    user_id: Option<UserId>,
}

impl Session {
    pub fn new(credential: Option<StoredToken>, user_id: Option<UserId>) -> Self {
        Self {
            credential,
            user_id,
        }
    }

    pub fn from_store(store: &impl TokenStore) -> Self {
        Self::new(store.get_access_token(), store.get_user().map(|u| u.id))
    }
}

impl SessionContext for Session {
    fn has_valid_credential(&self) -> bool {
        self.credential.as_ref().is_some_and(|t| !t.is_expired())
    }

    fn current_user_id(&self) -> Option<UserId> {
        self.user_id
    }
}
