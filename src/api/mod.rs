//! Chat service API: the storage collaborator and account endpoints

pub mod chat;
pub mod client;
#[cfg(test)]
pub mod memory;
mod users;

use std::future::Future;

use anyhow::{bail, Context, Result};

use crate::auth::Session;
use crate::config::Config;
use crate::error::StoreError;
use crate::models::{Chat, ChatId, ChatMessage, UserId};
use crate::router::{self, Navigation};
use client::ChatClient;

pub use chat::{create_chat_data, list_chats_data, print_chats, server_message};
pub use users::{login, LoginOutcome};

/// Read-only access to chat records and message history.
pub trait ChatStore: Send + Sync {
    fn get_chat_by_id(
        &self,
        chat_id: ChatId,
    ) -> impl Future<Output = Result<Chat, StoreError>> + Send;

    /// Messages of `chat_id`, oldest first.
    fn get_messages_by_chat(
        &self,
        chat_id: ChatId,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, StoreError>> + Send;
}

/// Signed-in user for the account-level commands, or a printed redirect.
fn signed_in_user(config: &Config) -> Option<UserId> {
    match router::enter_chat_list(&Session::from_store(config)) {
        Navigation::Proceed(user) => Some(user),
        Navigation::Redirect(route) => {
            println!("Not signed in (redirected to {}). Run `pairchat login` first.", route);
            None
        }
    }
}

/// List the signed-in user's chats (prints to stdout).
pub async fn list_chats(config: &Config) -> Result<()> {
    let Some(user) = signed_in_user(config) else {
        return Ok(());
    };

    let client = ChatClient::from_config(config);
    let chats = list_chats_data(&client, user)
        .await
        .context("Failed to fetch chats")?;
    print_chats(&chats, user);
    Ok(())
}

/// List the people a chat can be opened with.
pub async fn list_users(config: &Config) -> Result<()> {
    let Some(me) = signed_in_user(config) else {
        return Ok(());
    };

    let client = ChatClient::from_config(config);
    let users = users::list_users_data(&client)
        .await
        .context("Failed to fetch users")?;
    users::print_users(&users, me);
    Ok(())
}

/// Open a pairwise chat with `peer`.
pub async fn new_chat(config: &Config, peer: UserId) -> Result<()> {
    let Some(me) = signed_in_user(config) else {
        return Ok(());
    };
    if peer == me {
        bail!("A chat needs two different people.");
    }
    let my_email = config
        .user
        .as_ref()
        .map(|u| u.email.clone())
        .context("Stored session has no email, run `pairchat login` again")?;

    let client = ChatClient::from_config(config);
    let peer_info = users::get_user(&client, peer)
        .await
        .with_context(|| format!("Failed to look up user {}", peer))?;

    let chat = match create_chat_data(&client, &my_email, &peer_info.email).await {
        Ok(chat) => chat,
        Err(e) => match server_message(&e) {
            Some(message) => bail!("{}", message),
            None => return Err(e).context("Failed to create chat"),
        },
    };

    println!("Opened chat {} with {}.", chat.id, peer_info.email);
    println!("Join it with `pairchat room {}`.", chat.id);
    Ok(())
}
