//! Entry gates: the authentication check and the chat access authorizer.

use super::session::SessionContext;
use crate::api::ChatStore;
use crate::models::{ChatId, UserId};
use crate::router::{Navigation, Route};

/// Proof that `caller` was found to be a participant of `chat_id`.
///
/// Only [`authorize`] hands these out, so anything that takes a `RoomPass`
/// cannot run before authorization succeeded for that room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomPass {
    chat_id: ChatId,
    caller: UserId,
}

impl RoomPass {
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn caller(&self) -> UserId {
        self.caller
    }
}

/// Outcome of the membership check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow(RoomPass),
    Deny,
}

pub fn is_authenticated(session: &impl SessionContext) -> bool {
    session.has_valid_credential()
}

/// First gate on every chat-scoped route.
pub fn auth_guard(session: &impl SessionContext) -> Navigation {
    if is_authenticated(session) {
        Navigation::Proceed(())
    } else {
        Navigation::Redirect(Route::Home)
    }
}

/// Decide whether `caller` may enter `chat_id`.
///
/// Always fetches the chat record; any lookup failure denies.
pub async fn authorize<S: ChatStore + ?Sized>(store: &S, chat_id: ChatId, caller: UserId) -> Access {
    match store.get_chat_by_id(chat_id).await {
        Ok(chat) if chat.has_participant(caller) => {
            tracing::debug!("User {} allowed into chat {}", caller, chat_id);
            Access::Allow(RoomPass { chat_id, caller })
        }
        Ok(_) => {
            tracing::info!("User {} is not a participant of chat {}", caller, chat_id);
            Access::Deny
        }
        Err(e) => {
            tracing::warn!("Chat {} lookup failed, denying access: {}", chat_id, e);
            Access::Deny
        }
    }
}

/// Second gate on the chat room route. Denial sends the caller back to the
/// chat list.
pub async fn chat_access_guard<S: ChatStore + ?Sized>(
    store: &S,
    session: &impl SessionContext,
    chat_id: ChatId,
) -> Navigation<RoomPass> {
    let Some(caller) = session.current_user_id() else {
        tracing::warn!("No current user in session, denying access to chat {}", chat_id);
        return Navigation::Redirect(Route::Chats);
    };

    match authorize(store, chat_id, caller).await {
        Access::Allow(pass) => Navigation::Proceed(pass),
        Access::Deny => Navigation::Redirect(Route::Chats),
    }
}
