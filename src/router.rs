//! Navigation outcomes for the chat routes.
//!
//! Guards never render or navigate themselves; they return a [`Navigation`]
//! and the caller decides what showing a route means.

use std::fmt;

use crate::api::ChatStore;
use crate::auth::guard::{auth_guard, chat_access_guard};
use crate::auth::{RoomPass, SessionContext};
use crate::models::{ChatId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Chats,
    ChatRoom(ChatId),
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::Login => "login",
            Route::Chats => "chats",
            Route::ChatRoom(_) => "chat-room",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::ChatRoom(id) => write!(f, "{}/{}", self.name(), id),
            _ => f.write_str(self.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation<T = ()> {
    Proceed(T),
    Redirect(Route),
}

/// Enter the chat list: authentication only.
pub fn enter_chat_list(session: &impl SessionContext) -> Navigation<UserId> {
    if let Navigation::Redirect(route) = auth_guard(session) {
        return Navigation::Redirect(route);
    }
    match session.current_user_id() {
        Some(user) => Navigation::Proceed(user),
        None => Navigation::Redirect(Route::Login),
    }
}

/// Enter a chat room: authentication, then membership.
pub async fn enter_room<S: ChatStore + ?Sized>(
    store: &S,
    session: &impl SessionContext,
    chat_id: ChatId,
) -> Navigation<RoomPass> {
    if let Navigation::Redirect(route) = auth_guard(session) {
        tracing::debug!("Unauthenticated entry to {}, redirecting to {}", Route::ChatRoom(chat_id), route);
        return Navigation::Redirect(route);
    }
    chat_access_guard(store, session, chat_id).await
}
